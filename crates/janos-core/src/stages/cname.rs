//! The CNAME stage (supplemented feature): writes a `CNAME` file from
//! `site.cname` for GitHub-Pages-style custom domains.

use crate::context::Context;
use crate::error::PluginError;
use crate::file::VirtualFile;
use crate::stage::Stage;
use crate::store::FileStore;
use crate::value::Value;

/// Emits a `CNAME` file when `site.cname` is set.
#[derive(Debug, Clone, Default)]
pub struct CnameStage;

impl Stage for CnameStage {
    fn name(&self) -> &str {
        "cname"
    }

    fn apply(&self, files: &mut FileStore, ctx: &mut Context) -> Result<(), PluginError> {
        let Some(cname) = ctx.site.extra.get("cname").and_then(Value::as_str) else {
            return Ok(());
        };
        if cname.is_empty() {
            return Ok(());
        }
        let mut file = VirtualFile::new("CNAME", cname.as_bytes().to_vec());
        file.metadata.insert("layout".to_string(), Value::Bool(false));
        files.set("CNAME", file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BuildMode, SiteConfig};

    #[test]
    fn writes_cname_when_set() {
        let mut files = FileStore::new();
        let mut site = SiteConfig::default();
        site.extra.insert("cname".to_string(), Value::from("example.com"));
        let mut ctx = Context::new(site, BuildMode::Production);
        CnameStage.apply(&mut files, &mut ctx).unwrap();
        assert_eq!(files.get("CNAME").unwrap().contents_str().unwrap(), "example.com");
    }

    #[test]
    fn no_file_when_unset() {
        let mut files = FileStore::new();
        let mut ctx = Context::new(SiteConfig::default(), BuildMode::Production);
        CnameStage.apply(&mut files, &mut ctx).unwrap();
        assert!(files.get("CNAME").is_none());
    }
}
