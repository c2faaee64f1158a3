use std::{fs, path::PathBuf, str::FromStr};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch metadata and documents for one or more URIs
    Fetch {
        #[arg(value_name = "SRC", required = true)]
        from: Vec<Source>,
    },
    /// Print the detected type of local files
    Sniff {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Clone, Debug)]
/// Where URIs come from, which can either be
///
/// - a single URI or identifier, or
/// - a file listing one URI per line.
pub enum Source {
    Identifier(String),
    File(PathBuf),
}

impl Source {
    /// The URIs this source stands for. Blank lines and `#` comments in files are
    /// ignored.
    pub fn uris(&self) -> std::io::Result<Vec<String>> {
        match self {
            Source::Identifier(id) => Ok(vec![id.clone()]),
            Source::File(path) => Ok(fs::read_to_string(path)?
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(String::from)
                .collect()),
        }
    }
}

impl FromStr for Source {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // An existing path is a list of URIs, anything else is taken as a URI.
        if let Ok(path) = fs::canonicalize(s)
            && path.is_file()
        {
            Ok(Source::File(path))
        } else {
            Ok(Source::Identifier(s.to_string()))
        }
    }
}
