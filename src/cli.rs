//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Fetch a page from a site that requires a form login.
///
/// Session cookies are cached on disk, so repeated invocations reuse the
/// login until its cookies expire.
#[derive(Parser, Debug)]
#[command(name = "session-client")]
#[command(author, version, about)]
pub struct Args {
    /// URL to fetch
    pub url: String,

    /// URL of the page holding the login form
    #[arg(short = 'L', long)]
    pub login_url: String,

    /// Credential posted with the login form, as name=value (repeatable)
    #[arg(short = 'f', long = "field", value_name = "NAME=VALUE", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// JSON file with client options (camelCase keys)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for the session cache (default: ~/.config/session-client/cache)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Attempts per request, overriding the config file (1-20)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_retries: Option<u32>,

    /// Minimum delay between requests in milliseconds, overriding the config file (max 60000)
    #[arg(short = 'i', long, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub interval_ms: Option<u64>,

    /// Send the request without logging in first
    #[arg(long)]
    pub no_login: bool,

    /// Print the status line and response headers before the body
    #[arg(short = 'I', long)]
    pub include_headers: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BASE: [&str; 4] = ["session-client", "https://host/data", "--login-url", "https://host/login"];

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(BASE.iter().chain(extra.iter()))
    }

    #[test]
    fn test_cli_minimal_args_parse() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.url, "https://host/data");
        assert_eq!(args.login_url, "https://host/login");
        assert!(args.fields.is_empty());
        assert_eq!(args.config, None);
        assert_eq!(args.max_retries, None);
        assert_eq!(args.interval_ms, None);
        assert!(!args.no_login);
        assert!(!args.include_headers);
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_login_url_is_required() {
        let result = Args::try_parse_from(["session-client", "https://host/data"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_fields_repeat_and_split_on_first_equals() {
        let args = parse(&["-f", "user=alice", "--field", "pass=a=b"]).unwrap();
        assert_eq!(
            args.fields,
            vec![
                ("user".to_string(), "alice".to_string()),
                ("pass".to_string(), "a=b".to_string())
            ]
        );
    }

    #[test]
    fn test_cli_field_without_equals_rejected() {
        let result = parse(&["--field", "user"]);
        assert_eq!(result.unwrap_err().kind(), clap::error::ErrorKind::ValueValidation);

        let result = parse(&["--field", "=value"]);
        assert_eq!(result.unwrap_err().kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_max_retries_range() {
        assert_eq!(parse(&["-r", "2"]).unwrap().max_retries, Some(2));
        assert_eq!(
            parse(&["-r", "0"]).unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
        assert_eq!(
            parse(&["--max-retries", "21"]).unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
    }

    #[test]
    fn test_cli_interval_range() {
        assert_eq!(parse(&["--interval-ms", "0"]).unwrap().interval_ms, Some(0));
        assert_eq!(
            parse(&["-i", "60001"]).unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
    }

    #[test]
    fn test_cli_flags() {
        let args = parse(&["--no-login", "-I", "-vv", "--cache-dir", "/tmp/c", "-c", "cfg.json"]).unwrap();
        assert!(args.no_login);
        assert!(args.include_headers);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.cache_dir, Some(PathBuf::from("/tmp/c")));
        assert_eq!(args.config, Some(PathBuf::from("cfg.json")));
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["session-client", "--help"]);
        assert_eq!(result.unwrap_err().kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let result = Args::try_parse_from(["session-client", "--version"]);
        assert_eq!(result.unwrap_err().kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
