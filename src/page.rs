//! A parsed publication page, seen as the flat list of `<table>` blocks the site lays it out in.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector, node::Node};
use url::Url;

static TABLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static CELL_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());
static LINK_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static VALUE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("a, font").unwrap());
static TOKEN_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("font, sup").unwrap());

pub struct Page {
    html: Html,
    url: Url,
}

/// A value node together with the text that labels it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labelled {
    pub label: String,
    pub value: String,
    pub href: Option<String>,
}

#[derive(Clone, Copy)]
pub struct Table<'a> {
    el: ElementRef<'a>,
}

impl Page {
    pub fn parse(html: &str, url: Url) -> Self {
        Page {
            html: Html::parse_document(html),
            url,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Every table in document order, nested ones included.
    pub fn tables(&self) -> Vec<Table<'_>> {
        self.html.select(&TABLE_SEL).map(|el| Table { el }).collect()
    }

    /// Every link target on the page, in document order.
    pub fn hrefs(&self) -> Vec<&str> {
        self.html
            .select(&LINK_SEL)
            .filter_map(|a| a.value().attr("href"))
            .collect()
    }

    pub fn absolutise(&self, cand: &str) -> Option<Url> {
        self.url.join(cand.trim()).ok()
    }
}

impl<'a> Table<'a> {
    /// Text of the `n`-th cell, if there is one.
    pub fn cell_text(&self, n: usize) -> Option<String> {
        self.el
            .select(&CELL_SEL)
            .nth(n)
            .map(|td| normalize_ws(&td.text().collect::<String>()))
    }

    /// Text of the first element matching `css`.
    pub fn first_text(&self, css: &str) -> Option<String> {
        let sel = Selector::parse(css).ok()?;
        self.el
            .select(&sel)
            .next()
            .map(|e| normalize_ws(&e.text().collect::<String>()))
            .filter(|s| !s.is_empty())
    }

    /// Own text of every `font`/`sup` element, in document order, blanks dropped.
    pub fn tokens(&self) -> Vec<String> {
        self.el
            .select(&TOKEN_SEL)
            .map(own_text)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Every outermost `a`/`font` element with its preceding label text.
    pub fn values(&self) -> Vec<Labelled> {
        self.el
            .select(&VALUE_SEL)
            .filter(|e| !inside_value(e, &self.el))
            .map(|e| Labelled {
                label: label_of(&e),
                value: normalize_ws(&e.text().collect::<String>()),
                href: e.value().attr("href").map(str::to_string),
            })
            .collect()
    }

    /// Every link with its preceding label text.
    pub fn links(&self) -> Vec<Labelled> {
        self.values()
            .into_iter()
            .filter(|v| v.href.is_some())
            .collect()
    }
}

fn own_text(el: ElementRef<'_>) -> String {
    let raw: String = el
        .children()
        .filter_map(|c| c.value().as_text().map(|t| String::from(&**t)))
        .collect();
    normalize_ws(&raw)
}

fn is_value_element(name: &str) -> bool {
    matches!(name, "a" | "font")
}

fn inside_value(el: &ElementRef<'_>, root: &ElementRef<'_>) -> bool {
    el.ancestors()
        .take_while(|n| n.id() != root.id())
        .filter_map(ElementRef::wrap)
        .any(|p| is_value_element(p.value().name()))
}

/// Nearest non-blank text before `el` among its siblings. Stops at another value node.
fn label_of(el: &ElementRef<'_>) -> String {
    for sib in el.prev_siblings() {
        match sib.value() {
            Node::Text(t) => {
                let t = normalize_ws(t);
                if !t.is_empty() {
                    return t;
                }
            }
            Node::Element(e) => {
                if is_value_element(e.name()) {
                    return String::new();
                }
                if let Some(er) = ElementRef::wrap(sib) {
                    let t = normalize_ws(&er.text().collect::<String>());
                    if !t.is_empty() {
                        return t;
                    }
                }
            }
            _ => {}
        }
    }
    String::new()
}

pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> Page {
        let html = format!("<html><body>{body}</body></html>");
        Page::parse(&html, Url::parse("https://elibrary.ru/item.asp?id=1").unwrap())
    }

    #[test]
    fn lists_nested_tables_in_order() {
        let p = page("<table><tr><td>a<table><tr><td>b</td></tr></table></td></tr></table><table><tr><td>c</td></tr></table>");
        let texts: Vec<_> = p.tables().iter().filter_map(|t| t.cell_text(0)).collect();
        assert_eq!(texts, vec!["ab", "b", "c"]);
    }

    #[test]
    fn values_carry_preceding_label() {
        let p = page(
            "<table><tr><td>Том: <font>12</font> Номер: <a href='/contents.asp?id=5'><font>3</font></a><br>Год: <font>2020</font></td></tr></table>",
        );
        let values = p.tables()[0].values();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0].label, "Том:");
        assert_eq!(values[0].value, "12");
        assert_eq!(values[1].label, "Номер:");
        assert_eq!(values[1].value, "3");
        assert_eq!(values[1].href.as_deref(), Some("/contents.asp?id=5"));
        assert_eq!(values[2].label, "Год:");
    }

    #[test]
    fn adjacent_values_have_no_label() {
        let p = page("<table><tr><td><font>a</font><font>b</font></td></tr></table>");
        let values = p.tables()[0].values();
        assert_eq!(values[1].label, "");
    }

    #[test]
    fn tokens_use_own_text_only() {
        let p = page(
            "<table><tr><td><font>Иванов И.И.<sup>1</sup></font>, <font>Петров П.П.</font><sup>2</sup></td></tr></table>",
        );
        assert_eq!(
            p.tables()[0].tokens(),
            vec!["Иванов И.И.", "1", "Петров П.П.", "2"]
        );
    }

    #[test]
    fn absolutises_against_page_url() {
        let p = page("");
        assert_eq!(
            p.absolutise("/abcdef").unwrap().as_str(),
            "https://elibrary.ru/abcdef"
        );
    }

    #[test]
    fn normalize_ws_collapses() {
        assert_eq!(normalize_ws("  a \n\t b  "), "a b");
    }
}
