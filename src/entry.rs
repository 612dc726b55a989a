//! [`PublicationMetadata`] → BibTeX entry.
//!
//! All entry kinds share one field table; articles and proceedings append their own fields after
//! it, while program registrations use a separate `@Patent` field set.

use std::fmt;

use anyhow::anyhow;
use biblatex::{Bibliography, Entry};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    authors::{surname, to_bibtex_name},
    error::EntryError,
    metadata::{EntryKind, PublicationMetadata},
    translit::transliterate,
};

pub const PATENT_HEADING: &str = "Свидетельство о государственной регистрации программы для ЭВМ";

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(1[89]\d{2}|20\d{2})\b").unwrap());

impl EntryKind {
    pub fn entry_type(self) -> &'static str {
        match self {
            EntryKind::Article => "article",
            EntryKind::Conference => "inproceedings",
            EntryKind::PatentProgram => "Patent",
        }
    }
}

/// A rendered-ready entry: kind, citation key and non-empty fields in output order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibEntry {
    kind: EntryKind,
    key: String,
    fields: Vec<(&'static str, String)>,
}

impl BibEntry {
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push('@');
        out.push_str(self.kind.entry_type());
        out.push('{');
        out.push_str(&self.key);
        out.push_str(",\n");
        for (name, value) in &self.fields {
            out.push_str("  ");
            out.push_str(name);
            out.push_str(" = {");
            out.push_str(value);
            out.push_str("},\n");
        }
        out.push('}');
        out
    }

    /// Re-read the rendered text with `biblatex`, e.g. to print it in BibLaTeX style.
    pub fn to_biblatex(&self) -> anyhow::Result<Entry> {
        let bib = Bibliography::parse(&self.render())
            .map_err(|e| anyhow!("failed to parse constructed BibTeX: {e}"))?;
        bib.iter()
            .next()
            .cloned()
            .ok_or_else(|| anyhow!("empty bibliography for key {}", self.key))
    }
}

impl fmt::Display for BibEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

pub struct Formatter {
    prefix: String,
    with_abstract: bool,
}

impl Formatter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Formatter {
            prefix: prefix.into(),
            with_abstract: false,
        }
    }

    /// Append the abstract (when the page had one) after the kind-specific fields.
    pub fn with_abstract(mut self, yes: bool) -> Self {
        self.with_abstract = yes;
        self
    }

    pub fn format(&self, meta: &PublicationMetadata) -> Result<BibEntry, EntryError> {
        if meta.authors.is_empty() {
            return Err(EntryError::NoAuthors);
        }
        let kind = meta
            .kind()
            .ok_or_else(|| EntryError::Unclassified(meta.type_.clone()))?;

        let mut fields = Fields::default();
        match kind {
            EntryKind::PatentProgram => {
                fields.push("heading", PATENT_HEADING);
                fields.push("author", &author_field(&meta.authors));
                fields.push("title", &meta.title);
                fields.push("holder", &meta.holder);
                fields.push("requestnumber", &meta.request_number);
                fields.push("publicationdate", &meta.publication_date);
                fields.push("registrationdate", &meta.registration_date);
                fields.push("certificatenumber", &meta.certificate_number);
                fields.push("url", &meta.url);
                fields.push("language", &meta.language);
                fields.push("authorprogram", "yes");
            }
            EntryKind::Article | EntryKind::Conference => {
                fields.push("author", &author_field(&meta.authors));
                fields.push("title", &meta.title);
                fields.push("year", &meta.year);
                fields.push("doi", &meta.doi);
                if meta.doi.trim().is_empty() {
                    fields.push("url", &meta.url);
                }
                fields.push("language", &meta.language);
                fields.push("publisher", &meta.publisher);
                if kind == EntryKind::Article {
                    fields.push("journal", &meta.journal);
                    fields.push("volume", &meta.volume);
                    fields.push("number", &meta.number);
                } else {
                    fields.push("booktitle", &meta.journal);
                }
                fields.push("pages", &meta.pages);
            }
        }
        if self.with_abstract {
            fields.push("abstract", &meta.abstract_text);
        }

        Ok(BibEntry {
            kind,
            key: self.citation_key(meta)?,
            fields: fields.0,
        })
    }

    /// `<prefix><Surname>[_and<N>_]<year>_<TitleWord>`, transliterated.
    pub fn citation_key(&self, meta: &PublicationMetadata) -> Result<String, EntryError> {
        let first = meta.authors.first().ok_or(EntryError::NoAuthors)?;
        let mut key = self.prefix.clone();
        key.push_str(&key_safe(&transliterate(surname(first))));
        if meta.authors.len() > 1 {
            key.push_str(&format!("_and{}_", meta.authors.len() - 1));
        }
        key.push_str(&year_of(meta));
        let word = meta
            .title
            .split_whitespace()
            .next()
            .unwrap_or("")
            .trim_matches(|c: char| !c.is_alphanumeric());
        if !word.is_empty() {
            key.push('_');
            key.push_str(&key_safe(&transliterate(word)));
        }
        Ok(key)
    }
}

/// Drop everything BibTeX would read as the end of a key or as markup.
fn key_safe(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | ':'))
        .collect()
}

/// Publication year, or for registrations the year of the registration/publication date.
fn year_of(meta: &PublicationMetadata) -> String {
    if !meta.year.trim().is_empty() {
        return meta.year.trim().to_string();
    }
    [&meta.registration_date, &meta.publication_date]
        .into_iter()
        .find_map(|d| YEAR_RE.captures(d).map(|c| c[1].to_string()))
        .unwrap_or_default()
}

fn author_field(authors: &[String]) -> String {
    authors
        .iter()
        .map(|a| format!("{{{}}}", escape_braces(&to_bibtex_name(a))))
        .collect::<Vec<_>>()
        .join(" and ")
}

#[derive(Default)]
struct Fields(Vec<(&'static str, String)>);

impl Fields {
    /// Blank values are dropped; no field is ever rendered as `{}`.
    fn push(&mut self, name: &'static str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let value = if name == "author" {
            value.to_string()
        } else {
            escape_braces(value)
        };
        self.0.push((name, value));
    }
}

fn escape_braces(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            // a bare backslash would escape the closing brace
            '\\' => out.push_str("\\textbackslash{}"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> PublicationMetadata {
        PublicationMetadata {
            url: "https://elibrary.ru/ABCDEF".into(),
            title: "Test Title".into(),
            authors: vec!["Ivanov I.I.".into()],
            type_: "статья в журнале - научная статья".into(),
            year: "2020".into(),
            ..Default::default()
        }
    }

    #[test]
    fn key_for_single_author() {
        let key = Formatter::new("").citation_key(&article()).unwrap();
        assert_eq!(key, "Ivanov2020_Test");
        let key = Formatter::new("rsci:").citation_key(&article()).unwrap();
        assert_eq!(key, "rsci:Ivanov2020_Test");
    }

    #[test]
    fn key_counts_coauthors_and_transliterates() {
        let meta = PublicationMetadata {
            title: "«Цифровая» экономика".into(),
            authors: vec![
                "Щукин А.А.".into(),
                "Петров П.П.".into(),
                "Сидоров С.С.".into(),
            ],
            year: "2021".into(),
            ..Default::default()
        };
        let key = Formatter::new("").citation_key(&meta).unwrap();
        assert_eq!(key, "SCHukin_and2_2021_TSifrovaya");
    }

    #[test]
    fn renders_article() {
        let mut meta = article();
        meta.journal = "Journal".into();
        meta.volume = "12".into();
        meta.number = "3".into();
        meta.pages = "10-20".into();
        meta.language = "english".into();
        let entry = Formatter::new("").format(&meta).unwrap();
        assert_eq!(entry.kind(), EntryKind::Article);
        assert_eq!(
            entry.render(),
            "@article{Ivanov2020_Test,\n  author = {{Ivanov, I.I.}},\n  title = {Test Title},\n  year = {2020},\n  url = {https://elibrary.ru/ABCDEF},\n  language = {english},\n  journal = {Journal},\n  volume = {12},\n  number = {3},\n  pages = {10-20},\n}"
        );
    }

    #[test]
    fn doi_replaces_url() {
        let mut meta = article();
        meta.doi = "10.1234/abc".into();
        let entry = Formatter::new("").format(&meta).unwrap();
        assert_eq!(entry.get("doi"), Some("10.1234/abc"));
        assert_eq!(entry.get("url"), None);

        meta.type_ = "статья в сборнике трудов конференции".into();
        let entry = Formatter::new("").format(&meta).unwrap();
        assert_eq!(entry.get("url"), None);
    }

    #[test]
    fn url_kept_without_doi() {
        let entry = Formatter::new("").format(&article()).unwrap();
        assert_eq!(entry.get("url"), Some("https://elibrary.ru/ABCDEF"));
    }

    #[test]
    fn conference_uses_booktitle() {
        let mut meta = article();
        meta.type_ = "статья в сборнике трудов конференции".into();
        meta.journal = "Proceedings".into();
        meta.volume = "1".into();
        meta.pages = "5-6".into();
        let entry = Formatter::new("").format(&meta).unwrap();
        assert!(entry.render().starts_with("@inproceedings{Ivanov2020_Test,\n"));
        assert_eq!(entry.get("booktitle"), Some("Proceedings"));
        assert_eq!(entry.get("journal"), None);
        assert_eq!(entry.get("volume"), None);
        assert_eq!(entry.get("pages"), Some("5-6"));
    }

    #[test]
    fn patent_field_set() {
        let meta = PublicationMetadata {
            url: "https://elibrary.ru/XYZ".into(),
            doi: "10.1/ignored".into(),
            title: "Программа учёта".into(),
            authors: vec!["Иванов И.И.".into(), "Петров П.П.".into()],
            type_: "свидетельство о государственной регистрации программы для ЭВМ".into(),
            language: "russian".into(),
            journal: "ignored".into(),
            holder: "ООО Ромашка".into(),
            request_number: "2021610001".into(),
            registration_date: "01.02.2021".into(),
            certificate_number: "2021612345".into(),
            ..Default::default()
        };
        let entry = Formatter::new("").format(&meta).unwrap();
        let names: Vec<_> = entry.fields().iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                "heading",
                "author",
                "title",
                "holder",
                "requestnumber",
                "registrationdate",
                "certificatenumber",
                "url",
                "language",
                "authorprogram",
            ]
        );
        assert_eq!(entry.get("authorprogram"), Some("yes"));
        assert_eq!(entry.get("author"), Some("{Иванов, И.И.} and {Петров, П.П.}"));
        assert_eq!(entry.key(), "Ivanov_and1_2021_Programma");
        assert!(entry.render().starts_with("@Patent{"));
    }

    #[test]
    fn unclassified_type_gives_no_entry() {
        let mut meta = article();
        meta.type_ = "диссертация".into();
        assert_eq!(
            Formatter::new("").format(&meta),
            Err(EntryError::Unclassified("диссертация".into()))
        );
    }

    #[test]
    fn empty_authors_fail() {
        let mut meta = article();
        meta.authors.clear();
        assert_eq!(Formatter::new("").format(&meta), Err(EntryError::NoAuthors));
    }

    #[test]
    fn braces_in_values_are_escaped() {
        let mut meta = article();
        meta.title = "Set {x}".into();
        let entry = Formatter::new("").format(&meta).unwrap();
        assert_eq!(entry.get("title"), Some("Set \\{x\\}"));
    }

    #[test]
    fn trailing_backslash_still_parses() {
        let mut meta = article();
        meta.title = "Путь C:\\".into();
        let entry = Formatter::new("").format(&meta).unwrap();
        assert_eq!(entry.get("title"), Some("Путь C:\\textbackslash{}"));
        assert!(entry.to_biblatex().is_ok(), "{}", entry.render());
    }

    #[test]
    fn key_drops_punctuation_inside_title_word() {
        let mut meta = article();
        meta.title = "Модели,алгоритмы и методы".into();
        let entry = Formatter::new("").format(&meta).unwrap();
        assert!(entry.key().starts_with("Ivanov2020_Modeli"), "{}", entry.key());
        assert!(!entry.key().contains(','));
        let parsed = entry.to_biblatex().expect("parse");
        assert_eq!(parsed.key, entry.key());
    }

    #[test]
    fn abstract_is_opt_in() {
        let mut meta = article();
        meta.abstract_text = "Summary.".into();
        assert_eq!(Formatter::new("").format(&meta).unwrap().get("abstract"), None);
        let entry = Formatter::new("").with_abstract(true).format(&meta).unwrap();
        assert_eq!(entry.fields().last().map(|(n, _)| *n), Some("abstract"));
    }

    #[test]
    fn parses_back_with_biblatex() {
        let mut meta = article();
        meta.journal = "Journal".into();
        let entry = Formatter::new("").format(&meta).unwrap();
        let parsed = entry.to_biblatex().expect("parse");
        assert_eq!(parsed.key, "Ivanov2020_Test");
        assert!(parsed.get("journal").is_some());
    }

    #[test]
    fn no_empty_fields_and_idempotent() {
        proptest::proptest!(|(
            title in "[A-Za-zА-Яа-я ]{0,24}",
            year in "(19|20)[0-9]{2}|",
            volume in "[0-9]{0,3}",
            doi in "(10\\.[0-9]{4}/[a-z0-9]{1,8})?",
            conference in proptest::bool::ANY
        )| {
            let mut meta = article();
            meta.title = title;
            meta.year = year;
            meta.volume = volume;
            meta.doi = doi;
            if conference {
                meta.type_ = "статья в сборнике трудов конференции".into();
            }
            let formatter = Formatter::new("p:");
            let a = formatter.format(&meta).unwrap().render();
            let b = formatter.format(&meta).unwrap().render();
            proptest::prop_assert_eq!(&a, &b);
            proptest::prop_assert!(!a.contains("= {}"), "empty field rendered");
            proptest::prop_assert_eq!(a.contains("  url = "), meta.doi.is_empty());
        })
    }
}
