//! Batch mode: every publication listed on an author's page.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::{
    identifier::{Identifier, item::item_url},
    page::Page,
    report::Report,
    resolver::{IdFamily, Session},
};

static AUTHOR_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://[^/]+/author_(?:items|profile)\.asp\?(?:.*&)?(?:authorid|id)=(\d+)(?:[&#].*)?$")
        .unwrap()
});
static AUTHOR_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^author:(\d+)$").unwrap());
static ITEM_LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"item\.asp\?(?:.*&)?id=(\d+)").unwrap());

/// An author's publication list, given as an `author_items`/`author_profile` URL or `author:<id>`.
pub struct AuthorList<'a> {
    id: &'a str,
}

impl<'a> AuthorList<'a> {
    /// Treat a bare number as an author id.
    pub fn from_id(id: &'a str) -> Option<Box<Self>> {
        let id = id.trim();
        (!id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
            .then(|| Box::new(AuthorList { id }))
    }

    fn list_url(&self, domain: &str) -> anyhow::Result<Url> {
        let mut url = Url::parse(domain)?.join("author_items.asp")?;
        url.query_pairs_mut().append_pair("authorid", self.id);
        Ok(url)
    }
}

impl<'a> Identifier<'a> for AuthorList<'a> {
    fn parse(identifier: &'a str) -> Option<Box<Self>> {
        let s = identifier.trim();
        let caps = AUTHOR_ID_RE
            .captures(s)
            .or_else(|| AUTHOR_URL_RE.captures(s))?;
        Some(Box::new(AuthorList {
            id: caps.get(1)?.as_str(),
        }))
    }

    fn resolve(&self, session: &Session, report: &mut Report) -> anyhow::Result<()> {
        let list_url = self.list_url(&session.config().domain)?;
        let body = session.fetcher().get(&list_url)?;
        let page = Page::parse(&body, list_url.clone());
        let ids = discover_items(&page);
        tracing::info!(author = self.id, count = ids.len(), "publications found");
        if ids.is_empty() {
            anyhow::bail!("no publications listed at {list_url}");
        }

        let bar = report.progress(ids.len() as u64);
        for id in &ids {
            bar.set_message(format!("item {id}"));
            let outcome =
                item_url(&session.config().domain, id).and_then(|url| session.convert_url(&url));
            match outcome {
                Ok(entry) => report.success(entry),
                Err(e) => report.failure(id, &e),
            }
            bar.inc(1);
        }
        bar.finish_and_clear();
        Ok(())
    }
}

impl IdFamily for AuthorList<'_> {
    type For<'a> = AuthorList<'a>;
}

/// Publication ids linked from `page`, first appearance order, without repeats.
pub fn discover_items(page: &Page) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for href in page.hrefs() {
        if let Some(c) = ITEM_LINK_RE.captures(href) {
            let id = &c[1];
            if !ids.iter().any(|seen| seen == id) {
                ids.push(id.to_string());
            }
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_author_targets() {
        let a = AuthorList::parse("https://elibrary.ru/author_items.asp?authorid=123").unwrap();
        assert_eq!(a.id, "123");
        let a = AuthorList::parse("https://elibrary.ru/author_profile.asp?id=77").unwrap();
        assert_eq!(a.id, "77");
        let a = AuthorList::parse("author:9").unwrap();
        assert_eq!(a.id, "9");
        assert!(AuthorList::parse("https://elibrary.ru/item.asp?id=1").is_none());
        assert!(AuthorList::parse("9").is_none());
        assert_eq!(AuthorList::from_id("9").unwrap().id, "9");
        assert!(AuthorList::from_id("x9").is_none());
    }

    #[test]
    fn list_url_uses_domain() {
        let a = AuthorList::from_id("5").unwrap();
        assert_eq!(
            a.list_url("https://elibrary.ru").unwrap().as_str(),
            "https://elibrary.ru/author_items.asp?authorid=5"
        );
    }

    #[test]
    fn discovers_items_in_order_without_repeats() {
        let html = r#"<html><body>
            <a href="/item.asp?id=30">A</a>
            <a href="/author_profile.asp?id=1">me</a>
            <a href="item.asp?id=10">B</a>
            <a href="/item.asp?id=30">A again</a>
            <a href="https://elibrary.ru/item.asp?selid=2&id=20">C</a>
        </body></html>"#;
        let url = Url::parse("https://elibrary.ru/author_items.asp?authorid=1").unwrap();
        let page = Page::parse(html, url);
        assert_eq!(discover_items(&page), vec!["30", "10", "20"]);
    }
}
