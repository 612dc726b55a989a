use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::{
    identifier::Identifier,
    report::Report,
    resolver::{IdFamily, Session},
};

static ITEM_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://[^/]+/item\.asp\?(?:.*&)?id=(\d+)(?:[&#].*)?$").unwrap());
static BARE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:item:)?(\d+)$").unwrap());

/// A single publication page, given as its URL or its numeric id.
pub struct Item<'a> {
    id: &'a str,
    url: Option<Url>,
}

impl<'a> Identifier<'a> for Item<'a> {
    fn parse(identifier: &'a str) -> Option<Box<Self>> {
        let s = identifier.trim();
        if let Some(c) = BARE_ID_RE.captures(s) {
            return Some(Box::new(Item {
                id: c.get(1)?.as_str(),
                url: None,
            }));
        }
        let c = ITEM_URL_RE.captures(s)?;
        Some(Box::new(Item {
            id: c.get(1)?.as_str(),
            url: Some(Url::parse(s).ok()?),
        }))
    }

    fn resolve(&self, session: &Session, report: &mut Report) -> anyhow::Result<()> {
        let url = match &self.url {
            Some(u) => u.clone(),
            None => item_url(&session.config().domain, self.id)?,
        };
        report.success(session.convert_url(&url)?);
        Ok(())
    }
}

impl IdFamily for Item<'_> {
    type For<'a> = Item<'a>;
}

/// `<domain>/item.asp?id=<id>`
pub fn item_url(domain: &str, id: &str) -> anyhow::Result<Url> {
    let base = Url::parse(domain)?;
    let mut url = base.join("item.asp")?;
    url.query_pairs_mut().append_pair("id", id);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_urls_and_ids() {
        let i = Item::parse("https://elibrary.ru/item.asp?id=41234567").expect("url");
        assert_eq!(i.id, "41234567");
        assert!(i.url.is_some());
        let i = Item::parse("https://www.elibrary.ru/item.asp?selid=1&id=99#abs").expect("url");
        assert_eq!(i.id, "99");
        let i = Item::parse(" 41234567 ").expect("bare id");
        assert_eq!(i.id, "41234567");
        assert!(i.url.is_none());
        assert!(Item::parse("item:5").is_some());
    }

    #[test]
    fn rejects_other_pages() {
        assert!(Item::parse("https://elibrary.ru/author_items.asp?authorid=1").is_none());
        assert!(Item::parse("https://elibrary.ru/item.asp?selid=3").is_none());
        assert!(Item::parse("10.1000/182").is_none());
        assert!(Item::parse("").is_none());
    }

    #[test]
    fn builds_item_url() {
        let u = item_url("https://elibrary.ru", "42").unwrap();
        assert_eq!(u.as_str(), "https://elibrary.ru/item.asp?id=42");
    }
}
