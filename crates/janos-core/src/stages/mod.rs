//! Built-in pipeline stages, one module per §4.4-§4.19 component.

pub mod assets;
pub mod cname;
pub mod collections;
pub mod content_decoder;
pub mod coordination;
pub mod css_urls;
pub mod excerpts;
pub mod feeds;
pub mod inline_source;
pub mod layouts;
pub mod manifest;
pub mod pagination;
pub mod permalinks;
pub mod publish;
pub mod responsive_images;
pub mod robots;
pub mod sitemap;
pub mod tag_pages;
pub mod tags;
pub mod webmentions;

use crate::value::Value;
use std::cmp::Ordering;

/// Shared `sortBy` comparator used by collections and tag pages, per §4.7
/// step 5: date arithmetic for Date values, numeric compare for numbers,
/// `localeCompare`-equivalent (`Ord` on `String`) for strings, missing
/// values sort last.
pub fn collections_sort_key(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Date(da)), Some(Value::Date(db))) => da.cmp(db),
        (Some(a), Some(b)) if a.as_f64().is_some() && b.as_f64().is_some() => a
            .as_f64()
            .unwrap()
            .partial_cmp(&b.as_f64().unwrap())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(sa)), Some(Value::String(sb))) => sa.cmp(sb),
        _ => Ordering::Equal,
    }
}
