/// Shape of the bibliography record a publication maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Article,
    Conference,
    PatentProgram,
}

/// Markers looked for (case-insensitively) in the publication type, in priority order.
const KIND_MARKERS: &[(&str, EntryKind)] = &[
    ("конференц", EntryKind::Conference),
    ("журнал", EntryKind::Article),
    ("свидетельство о государственной регистрации", EntryKind::PatentProgram),
];

const LANGUAGES: &[(&str, &str)] = &[("русский", "russian"), ("английский", "english")];

/// Everything scraped from a single publication page. Empty strings mean "not present".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicationMetadata {
    pub url: String,
    pub doi: String,
    pub title: String,
    pub authors: Vec<String>,
    /// `(author name, affiliation)`; names match entries of `authors` by string only.
    pub affiliations: Vec<(String, String)>,
    pub type_: String,
    pub language: String,
    pub volume: String,
    pub number: String,
    pub year: String,
    pub pages: String,
    pub journal: String,
    pub publisher: String,
    pub abstract_text: String,

    pub holder: String,
    pub request_number: String,
    pub publication_date: String,
    pub registration_date: String,
    pub certificate_number: String,
}

impl PublicationMetadata {
    /// Classify from the publication type text; `None` if no marker matches.
    pub fn kind(&self) -> Option<EntryKind> {
        classify(&self.type_)
    }
}

pub fn classify(type_: &str) -> Option<EntryKind> {
    let t = type_.to_lowercase();
    KIND_MARKERS
        .iter()
        .find(|(marker, _)| t.contains(marker))
        .map(|(_, kind)| *kind)
}

/// Russian language names as shown on the site → BibTeX language names.
pub fn translate_language(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    LANGUAGES
        .iter()
        .find(|(ru, _)| lower == *ru)
        .map(|(_, en)| en.to_string())
        .unwrap_or_else(|| raw.trim().to_string())
}
