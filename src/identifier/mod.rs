use crate::{report::Report, resolver::Session};

pub mod author;
pub mod file;
pub mod item;

pub trait Identifier<'a>: Sized + 'a {
    fn parse(identifier: &'a str) -> Option<Box<Self>>;
    /// Resolve into one or more entries, recording each outcome in `report`. An `Err` means the
    /// target as a whole produced nothing.
    fn resolve(&self, session: &Session, report: &mut Report) -> anyhow::Result<()>;
}
