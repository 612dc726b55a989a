//! Publication page → [`PublicationMetadata`].
//!
//! The site renders every publication as a long run of `<table>` blocks. Which block holds what is
//! only known from its index (see [`Layout`]), so extraction goes block by block, skipping optional
//! ones that are missing and failing on a missing title or author list.

use crate::{
    authors::split_authors,
    config::Layout,
    error::ExtractError,
    metadata::{PublicationMetadata, translate_language},
    page::{Labelled, Page, Table},
};

/// Metadata fields a bibliographic label can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Type,
    Language,
    Volume,
    Number,
    Year,
    Pages,
    Holder,
    RequestNumber,
    PublicationDate,
    RegistrationDate,
    CertificateNumber,
}

/// Label substrings and the field they fill. The first match wins, so longer labels that contain a
/// shorter one ("Номер заявки" vs "Номер") come first.
pub const LABELS: &[(&str, Field)] = &[
    ("Номер заявки", Field::RequestNumber),
    ("Номер свидетельства", Field::CertificateNumber),
    ("Дата публикации", Field::PublicationDate),
    ("Дата регистрации", Field::RegistrationDate),
    ("Правообладател", Field::Holder),
    ("Патентообладател", Field::Holder),
    ("Тип", Field::Type),
    ("Язык", Field::Language),
    ("Том", Field::Volume),
    ("Номер", Field::Number),
    ("Год", Field::Year),
    ("Страницы", Field::Pages),
];

const SOURCE_CAPTIONS: &[&str] = &["ЖУРНАЛ", "ИСТОЧНИК", "КОНФЕРЕНЦИЯ"];
const PUBLISHER_LABEL: &str = "Издательство";
const ABSTRACT_CAPTION: &str = "АННОТАЦИЯ";

impl Field {
    pub fn for_label(label: &str) -> Option<Field> {
        LABELS
            .iter()
            .find(|(marker, _)| label.contains(marker))
            .map(|(_, f)| *f)
    }

    fn assign(self, meta: &mut PublicationMetadata, value: String) {
        let slot = match self {
            Field::Type => &mut meta.type_,
            Field::Language => {
                meta.language = translate_language(&value);
                return;
            }
            Field::Volume => &mut meta.volume,
            Field::Number => &mut meta.number,
            Field::Year => &mut meta.year,
            Field::Pages => &mut meta.pages,
            Field::Holder => &mut meta.holder,
            Field::RequestNumber => &mut meta.request_number,
            Field::PublicationDate => &mut meta.publication_date,
            Field::RegistrationDate => &mut meta.registration_date,
            Field::CertificateNumber => &mut meta.certificate_number,
        };
        *slot = value;
    }
}

pub struct Extractor {
    layout: Layout,
}

impl Extractor {
    pub fn new(layout: Layout) -> Self {
        Extractor { layout }
    }

    pub fn extract(&self, page: &Page) -> Result<PublicationMetadata, ExtractError> {
        let tables = page.tables();
        let mut meta = PublicationMetadata {
            url: page.url().to_string(),
            ..Default::default()
        };

        match tables.get(self.layout.identifiers) {
            Some(t) => read_identifiers(page, t, &mut meta),
            None => tracing::warn!(
                index = self.layout.identifiers,
                tables = tables.len(),
                "identifiers block missing; using page URL"
            ),
        }

        meta.title = required(&tables, self.layout.title, "title")?
            .first_text(".bigtext")
            .ok_or_else(|| {
                let e = ExtractError::mismatch("title", "no .bigtext element");
                tracing::warn!("{e}");
                e
            })?;

        let tokens = required(&tables, self.layout.authors, "authors")?.tokens();
        let (authors, affiliations) = split_authors(&tokens);
        if authors.is_empty() {
            tracing::warn!(title = %meta.title, "author block is empty");
            return Err(ExtractError::NoAuthors);
        }
        meta.authors = authors;
        meta.affiliations = affiliations;

        match tables.get(self.layout.bibliographic) {
            Some(t) => read_bibliographic(t, &mut meta),
            None => tracing::warn!(
                index = self.layout.bibliographic,
                "bibliographic block missing"
            ),
        }

        match tables.get(self.layout.source) {
            Some(t) => read_source(t, &mut meta),
            None => tracing::debug!(index = self.layout.source, "no source block"),
        }

        for idx in [self.layout.source + 1, self.layout.source + 2] {
            if let Some(t) = tables.get(idx)
                && t.cell_text(0).is_some_and(|c| c.contains(ABSTRACT_CAPTION))
                && let Some(text) = t.cell_text(2)
            {
                meta.abstract_text = text;
            }
        }

        Ok(meta)
    }
}

fn required<'p, 'a>(
    tables: &'p [Table<'a>],
    index: usize,
    block: &'static str,
) -> Result<&'p Table<'a>, ExtractError> {
    tables.get(index).ok_or_else(|| {
        let e = ExtractError::mismatch(
            block,
            format!("expected table #{index}, page has {}", tables.len()),
        );
        tracing::warn!("{e}");
        e
    })
}

fn read_identifiers(page: &Page, table: &Table<'_>, meta: &mut PublicationMetadata) {
    let links = table.links();

    if let Some(doi) = links.iter().find_map(doi_of) {
        meta.doi = doi;
    }

    // EDN links are the short persistent form of the page URL
    if let Some(edn) = links
        .iter()
        .find(|l| l.label.to_uppercase().contains("EDN"))
        .and_then(|l| l.href.as_deref())
        .and_then(|href| page.absolutise(href))
    {
        meta.url = edn.to_string();
    }
}

fn doi_of(link: &Labelled) -> Option<String> {
    let href = link.href.as_deref()?;
    if let Some(idx) = href.find("doi.org/") {
        let doi = href[idx + "doi.org/".len()..].trim();
        if !doi.is_empty() {
            return Some(doi.to_string());
        }
    }
    if link.label.to_uppercase().contains("DOI") && link.value.starts_with("10.") {
        return Some(link.value.clone());
    }
    None
}

fn read_bibliographic(table: &Table<'_>, meta: &mut PublicationMetadata) {
    for Labelled { label, value, .. } in table.values() {
        if value.is_empty() {
            continue;
        }
        match Field::for_label(&label) {
            Some(field) => field.assign(meta, value),
            None => tracing::debug!(%label, %value, "unrecognised bibliographic label"),
        }
    }
}

fn read_source(table: &Table<'_>, meta: &mut PublicationMetadata) {
    let caption = table.cell_text(0).unwrap_or_default().to_uppercase();
    if !SOURCE_CAPTIONS.iter().any(|c| caption.contains(c)) {
        tracing::debug!(%caption, "source block has no journal caption");
        return;
    }
    let values = table.values();
    if let Some(journal) = values.iter().find(|v| v.href.is_some() && !v.value.is_empty()) {
        meta.journal = journal.value.clone();
    }
    if let Some(publisher) = values.iter().find(|v| v.label.contains(PUBLISHER_LABEL)) {
        meta.publisher = publisher.value.clone();
    }
}
