//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use url::Url;

/// Run follow, like, comment and scrape actions under browser session cookies.
///
/// Each `--cookie` value (or line of `--cookies-file`) is one account. The
/// action runs once per selected account.
#[derive(Parser, Debug)]
#[command(name = "socialctl")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub session: SessionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Account and request tuning flags shared by every subcommand.
#[derive(ClapArgs, Debug, Default, Clone)]
pub struct SessionArgs {
    /// Raw cookie string of one logged-in session (repeatable)
    #[arg(long = "cookie", value_name = "RAW", global = true)]
    pub cookies: Vec<String>,

    /// File with one cookie string per line ("-" reads stdin)
    #[arg(long, value_name = "PATH", global = true)]
    pub cookies_file: Option<PathBuf>,

    /// Only act as these accounts (label such as account-2, or ds_user value)
    #[arg(long = "account", value_name = "LABEL|USER", global = true)]
    pub accounts: Vec<String>,

    /// Maximum accounts acting at once (1-100)
    #[arg(short = 'c', long, global = true, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: Option<u8>,

    /// Maximum attempts per account for transient failures (0-10)
    #[arg(short = 'r', long, global = true, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub max_retries: Option<u8>,

    /// Minimum delay between requests of one account in milliseconds (0 to disable, max 60000)
    #[arg(short = 'l', long, global = true, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub rate_limit: Option<u64>,

    /// Platform origin to talk to (for testing against a mock)
    #[arg(long, value_name = "URL", global = true)]
    pub base_url: Option<Url>,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Follow a user from every selected account
    Follow {
        /// Username to follow (leading @ allowed)
        username: String,
    },
    /// Like a post from every selected account
    Like {
        /// Post URL or bare short code
        post: String,
    },
    /// Comment on a post from every selected account
    Comment {
        /// Post URL or bare short code
        post: String,
        /// Comment text
        text: String,
    },
    /// Print a user's public profile as JSON
    Scrape {
        /// Username to look up
        username: String,
    },
    /// Decode post short codes or URLs to media ids (no network)
    Decode {
        /// Short codes or post URLs
        #[arg(required = true)]
        targets: Vec<String>,
    },
    /// List the registered accounts and their display identifiers
    Accounts,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_follow_parses_with_defaults() {
        let args = Args::try_parse_from(["socialctl", "follow", "janedoe"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert_eq!(
            args.command,
            Command::Follow {
                username: "janedoe".to_string()
            }
        );
        assert!(args.session.cookies.is_empty());
        assert_eq!(args.session.concurrency, None);
        assert_eq!(args.session.max_retries, None);
        assert_eq!(args.session.rate_limit, None);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["socialctl", "-vv", "accounts"]).unwrap();
        assert_eq!(args.verbose, 2);

        let args = Args::try_parse_from(["socialctl", "accounts", "--verbose"]).unwrap();
        assert_eq!(args.verbose, 1);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["socialctl", "-q", "accounts"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_repeatable_cookie_and_account() {
        let args = Args::try_parse_from([
            "socialctl",
            "like",
            "https://www.instagram.com/p/BA/",
            "--cookie",
            "csrftoken=a; ds_user=one",
            "--cookie",
            "csrftoken=b; ds_user=two",
            "--account",
            "two",
        ])
        .unwrap();
        assert_eq!(args.session.cookies.len(), 2);
        assert_eq!(args.session.accounts, vec!["two".to_string()]);
    }

    #[test]
    fn test_cli_comment_takes_post_and_text() {
        let args = Args::try_parse_from(["socialctl", "comment", "BA", "great shot"]).unwrap();
        assert_eq!(
            args.command,
            Command::Comment {
                post: "BA".to_string(),
                text: "great shot".to_string()
            }
        );
    }

    #[test]
    fn test_cli_decode_requires_a_target() {
        let err = Args::try_parse_from(["socialctl", "decode"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let args = Args::try_parse_from(["socialctl", "decode", "BA", "Bz"]).unwrap();
        assert_eq!(
            args.command,
            Command::Decode {
                targets: vec!["BA".to_string(), "Bz".to_string()]
            }
        );
    }

    #[test]
    fn test_cli_subcommand_is_required() {
        let err = Args::try_parse_from(["socialctl"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingSubcommand);
    }

    #[test]
    fn test_cli_help_and_version() {
        let err = Args::try_parse_from(["socialctl", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        let err = Args::try_parse_from(["socialctl", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_concurrency_bounds() {
        let args = Args::try_parse_from(["socialctl", "accounts", "-c", "100"]).unwrap();
        assert_eq!(args.session.concurrency, Some(100));
        for bad in ["0", "101"] {
            let err = Args::try_parse_from(["socialctl", "accounts", "-c", bad]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn test_cli_max_retries_bounds() {
        let args = Args::try_parse_from(["socialctl", "accounts", "-r", "0"]).unwrap();
        assert_eq!(args.session.max_retries, Some(0));
        let err = Args::try_parse_from(["socialctl", "accounts", "-r", "11"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_rate_limit_bounds() {
        let args = Args::try_parse_from(["socialctl", "accounts", "-l", "0"]).unwrap();
        assert_eq!(args.session.rate_limit, Some(0));
        let err = Args::try_parse_from(["socialctl", "accounts", "-l", "60001"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_base_url_must_be_a_url() {
        let args = Args::try_parse_from([
            "socialctl",
            "scrape",
            "jane",
            "--base-url",
            "http://127.0.0.1:8080/",
        ])
        .unwrap();
        assert_eq!(
            args.session.base_url.unwrap().as_str(),
            "http://127.0.0.1:8080/"
        );
        let err =
            Args::try_parse_from(["socialctl", "scrape", "jane", "--base-url", "not a url"])
                .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
