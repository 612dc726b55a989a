use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Prefix prepended to every citation key
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    /// Site root used to expand bare publication and author ids
    #[arg(long, global = true, value_name = "URL")]
    pub domain: Option<String>,

    /// Always go to the network and do not store fetched pages
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output style
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Bibtex)]
    pub format: OutputFormat,

    /// Append the publication abstract to each entry
    #[arg(long = "abstract", global = true)]
    pub with_abstract: bool,

    /// More logging (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert one or more publication pages
    Fetch {
        #[arg(value_name = "SRC", required = true)]
        from: Vec<Source>,
    },
    /// Convert every publication on one or more authors' publication lists
    Author {
        #[arg(value_name = "AUTHOR", required = true)]
        from: Vec<Source>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The entry exactly as built
    Bibtex,
    /// Re-serialized through the `biblatex` crate
    Biblatex,
}

impl Cli {
    /// Command-line flags win over the configuration file.
    pub fn apply(&self, config: &mut Config) {
        if let Some(p) = &self.prefix {
            config.prefix = p.clone();
        }
        if let Some(d) = &self.domain {
            config.domain = d.clone();
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
    }
}

#[derive(Clone, Debug)]
/// Defines where we can get publication pages from, which can either be
///
/// - a single identifier (publication URL or id, author list URL), or
/// - a saved page on disk.
pub enum Source {
    Identifier(String),
    File(PathBuf),
}

impl FromStr for Source {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let path = Path::new(raw.strip_prefix("file://").unwrap_or(raw));
        match fs::canonicalize(path) {
            Ok(p) if p.is_file() => Ok(Source::File(p)),
            _ if raw.is_empty() => Err("empty source".to_string()),
            _ => Ok(Source::Identifier(raw.to_string())),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Identifier(id) => f.write_str(id),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}
