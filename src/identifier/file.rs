use std::path::Path;

use anyhow::Context;
use url::Url;

use crate::{page::Page, report::Report, resolver::Session};

/// A publication page saved to disk.
pub struct LocalFile<'a> {
    path: &'a Path,
}

impl<'a> LocalFile<'a> {
    pub fn new(path: &'a Path) -> Self {
        LocalFile { path }
    }

    pub fn resolve(&self, session: &Session, report: &mut Report) -> anyhow::Result<()> {
        let bytes = std::fs::read(self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let html = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "page is not valid UTF-8; decoding lossily");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        let url = Url::from_file_path(self.path)
            .map_err(|_| anyhow::anyhow!("cannot build a URL for {}", self.path.display()))?;
        let page = Page::parse(&html, url);
        report.success(session.convert(&page)?);
        Ok(())
    }
}
