use anyhow::anyhow;
use url::Url;

use crate::{
    cache::Cache,
    cli::{OutputFormat, Source},
    config::Config,
    entry::Formatter,
    extract::Extractor,
    fetch::Fetcher,
    identifier::{Identifier, author::AuthorList, file::LocalFile, item::Item},
    page::Page,
    report::Report,
};

type ParserFn = for<'a> fn(&'a str) -> Option<Box<dyn Resolve + 'a>>;

/// Object-safe face of [`Identifier`].
pub trait Resolve {
    fn resolve(&self, session: &Session, report: &mut Report) -> anyhow::Result<()>;
}

impl<'a, T: Identifier<'a>> Resolve for T {
    fn resolve(&self, session: &Session, report: &mut Report) -> anyhow::Result<()> {
        <T as Identifier<'a>>::resolve(self, session, report)
    }
}

/// List of parsers to iterate over.
///
/// NOTE: Ordering is important here, as it signifies priority. If two parsers are able to parse a
/// given identifier, the first one to show up in this list will be used.
static PARSERS: &[ParserFn] = &[erase::<Item>(), erase::<AuthorList>()];

// Use GAT because we don't have higher-kinded types in Rust (sad)
pub trait IdFamily {
    type For<'a>: Identifier<'a>;
}

/// Get the parser method of a given identifier `F` and erase its type.
const fn erase<F: IdFamily>() -> ParserFn {
    fn call<'a, G: IdFamily>(s: &'a str) -> Option<Box<dyn Resolve + 'a>> {
        <G::For<'a> as Identifier<'a>>::parse(s).map(|x| x as Box<dyn Resolve + 'a>)
    }

    let f: ParserFn = call::<F>;
    f
}

/// Guess what type `identifier` is
pub fn parse<'a>(identifier: &'a str) -> Option<Box<dyn Resolve + 'a>> {
    PARSERS.iter().find_map(|f| f(identifier))
}

/// Everything a resolver needs: configuration, the fetcher, and the extract → format pipeline.
pub struct Session {
    config: Config,
    fetcher: Fetcher,
    extractor: Extractor,
    formatter: Formatter,
    format: OutputFormat,
}

impl Session {
    pub fn new(config: Config, format: OutputFormat, with_abstract: bool) -> Self {
        let cache = if config.cache.enabled {
            Cache::new(config.cache_dir(), config.cache.ttl_hours)
        } else {
            Cache::disabled()
        };
        Session {
            fetcher: Fetcher::new(&config.http, cache),
            extractor: Extractor::new(config.layout),
            formatter: Formatter::new(config.prefix.clone()).with_abstract(with_abstract),
            format,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Extract and format one publication page.
    pub fn convert(&self, page: &Page) -> anyhow::Result<String> {
        let meta = self.extractor.extract(page)?;
        let entry = self.formatter.format(&meta).map_err(|e| {
            tracing::warn!(url = %page.url(), "no entry produced: {e}");
            e
        })?;
        tracing::debug!(
            key = entry.key(),
            kind = ?entry.kind(),
            fields = entry.fields().len(),
            "entry built"
        );
        match self.format {
            OutputFormat::Bibtex => Ok(entry.render()),
            OutputFormat::Biblatex => Ok(entry.to_biblatex()?.to_biblatex_string()),
        }
    }

    /// Fetch (or read from cache) and convert the publication page at `url`.
    pub fn convert_url(&self, url: &Url) -> anyhow::Result<String> {
        let body = self.fetcher.get(url)?;
        self.convert(&Page::parse(&body, url.clone()))
    }
}

/// Resolve one command-line source, counting a failure if it yields nothing.
pub fn resolve_source(source: &Source, session: &Session, report: &mut Report) {
    let outcome = match source {
        Source::File(path) => LocalFile::new(path).resolve(session, report),
        Source::Identifier(id) => parse(id)
            .ok_or_else(|| anyhow!("unrecognised identifier: {id}"))
            .and_then(|target| target.resolve(session, report)),
    };
    if let Err(e) = outcome {
        report.failure(&source.to_string(), &e);
    }
}

/// Resolve an author's publication list; bare numbers are author ids here.
pub fn resolve_author(source: &Source, session: &Session, report: &mut Report) {
    let outcome = match source {
        Source::Identifier(id) => AuthorList::from_id(id)
            .or_else(|| <AuthorList<'_> as Identifier<'_>>::parse(id))
            .ok_or_else(|| anyhow!("unrecognised author: {id}"))
            .and_then(|author| Identifier::resolve(author.as_ref(), session, report)),
        Source::File(path) => Err(anyhow!(
            "author lists cannot be read from files: {}",
            path.display()
        )),
    };
    if let Err(e) = outcome {
        report.failure(&source.to_string(), &e);
    }
}
