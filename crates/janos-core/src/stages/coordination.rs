//! The coordination stage, per §4.9 and the §9 design note: after
//! path-rewriting stages run, collection items (snapshotted before
//! permalinks moved anything) must have their `path`/`permalink` patched to
//! the final keys. Kept as its own named stage rather than folded into
//! permalinks, per the explicit instruction in §9.

use crate::context::Context;
use crate::error::PluginError;
use crate::stage::Stage;
use crate::store::FileStore;
use crate::value::Value;
use std::collections::HashMap;

/// Patches collection item `path`/`permalink` fields to reflect the final,
/// post-permalink file keys.
#[derive(Debug, Clone, Default)]
pub struct CoordinationStage;

impl Stage for CoordinationStage {
    fn name(&self) -> &str {
        "coordination"
    }

    fn apply(&self, files: &mut FileStore, ctx: &mut Context) -> Result<(), PluginError> {
        // Fallback sourcePath/old-key -> current key, for files whose path
        // changed through something other than a recorded rename.
        let mut by_source: HashMap<String, String> = HashMap::new();
        for (key, file) in files.iter() {
            if let Some(source) = &file.source_path {
                by_source.insert(source.clone(), key.clone());
            }
            by_source.insert(key.clone(), key.clone());
        }
        let renames = ctx.renames.clone();

        for items in ctx.collections.values_mut() {
            for item in items.iter_mut() {
                let Value::Map(map) = item else { continue };
                // Navigation items carrying `navpath` keep that value
                // untouched, per §4.9.
                if map.contains_key("navpath") {
                    continue;
                }
                let Some(old_path) = map.get("path").and_then(Value::as_str).map(String::from) else {
                    continue;
                };
                // Follow the full content-decoder -> permalinks rename
                // chain first; only a snapshot's immediate source_path is
                // unreliable once two stages have renamed the same file.
                let chased = crate::context::chase_rename_chain(&renames, &old_path);
                let new_path = if files.get(&chased).is_some() {
                    Some(chased)
                } else {
                    by_source.get(&old_path).cloned()
                };
                let Some(new_path) = new_path else {
                    continue;
                };
                map.insert("path".to_string(), Value::from(new_path.as_str()));
                if let Some(file) = files.get(&new_path) {
                    if let Some(permalink) = file.metadata.get("permalink") {
                        map.insert("permalink".to_string(), permalink.clone());
                    }
                }
            }
        }

        // Mirror collections as top-level global-metadata keys, so
        // `navigation` is reachable as both `collections.navigation` and
        // `navigation` in templates.
        for (name, items) in &ctx.collections {
            ctx.extra.insert(name.clone(), Value::List(items.clone()));
        }

        Ok(())
    }
}
