//! Command-line surface.
//!
//! `hashtag-harvest` with no arguments compresses old logs.
//! `hashtag-harvest -query bluebottle -limit 50` runs a fetch.

use clap::Parser;

use crate::services::pipeline::FetchRequest;

/// Hashtag Harvest - Graph API hashtag and business-discovery collector
#[derive(Debug, Parser)]
#[command(name = "hashtag-harvest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Hashtag to collect (without `#`)
    #[arg(long)]
    pub query: Option<String>,

    /// Maximum number of media items per request
    #[arg(long)]
    pub limit: Option<u32>,

    /// Business-discovery account (defaults to the query)
    #[arg(long)]
    pub username: Option<String>,

    /// Compress old logs and prune the oldest beyond the configured count
    #[arg(long)]
    pub rotate: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Mode {
    /// No arguments: compress logs.
    Archive,

    Rotate,

    Fetch(FetchRequest),

    /// Some but not all of `query` / `limit` were given.
    MissingArgument,
}

impl Cli {
    /// Parses process arguments, accepting `-query` as well as `--query`.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_args(std::env::args()))
    }

    #[must_use]
    pub fn mode(self) -> Mode {
        match (self.query, self.limit) {
            (Some(query), Some(limit)) => {
                let request = FetchRequest::new(query, limit);
                Mode::Fetch(match self.username {
                    Some(username) => request.with_username(username),
                    None => request,
                })
            }
            (None, None) if self.username.is_none() => {
                if self.rotate {
                    Mode::Rotate
                } else {
                    Mode::Archive
                }
            }
            _ => Mode::MissingArgument,
        }
    }
}

/// Rewrites single-dash long flags (`-query`) to the double-dash form clap
/// expects. Short flags and values are left untouched.
pub fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            let is_single_dash_long =
                i > 0 && arg.len() > 2 && arg.starts_with('-') && !arg.starts_with("--");
            if is_single_dash_long && arg[1..].chars().all(|c| c.is_ascii_alphabetic()) {
                format!("-{arg}")
            } else {
                arg
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode_of(args: &[&str]) -> Mode {
        let args = normalize_args(args.iter().map(|s| (*s).to_string()));
        Cli::try_parse_from(args).unwrap().mode()
    }

    #[test]
    fn test_no_arguments_archives_logs() {
        assert_eq!(mode_of(&["hashtag-harvest"]), Mode::Archive);
        assert_eq!(mode_of(&["hashtag-harvest", "--rotate"]), Mode::Rotate);
    }

    #[test]
    fn test_single_dash_flags_run_fetch() {
        assert_eq!(
            mode_of(&["hashtag-harvest", "-query", "bluebottle", "-limit", "50"]),
            Mode::Fetch(FetchRequest::new("bluebottle", 50))
        );
    }

    #[test]
    fn test_username_override() {
        assert_eq!(
            mode_of(&[
                "hashtag-harvest",
                "--query",
                "bluebottle",
                "--limit",
                "5",
                "--username",
                "bluebottlecoffee"
            ]),
            Mode::Fetch(FetchRequest::new("bluebottle", 5).with_username("bluebottlecoffee"))
        );
    }

    #[test]
    fn test_partial_arguments_are_rejected() {
        assert_eq!(
            mode_of(&["hashtag-harvest", "-query", "bluebottle"]),
            Mode::MissingArgument
        );
        assert_eq!(mode_of(&["hashtag-harvest", "-limit", "50"]), Mode::MissingArgument);
    }

    #[test]
    fn test_normalize_keeps_values() {
        let args = normalize_args(
            ["bin", "-query", "-x", "-limit", "50"]
                .iter()
                .map(|s| (*s).to_string()),
        );
        assert_eq!(args, vec!["bin", "--query", "-x", "--limit", "50"]);
    }
}
