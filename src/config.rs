//! Configuration and CLI argument handling

use chrono::{DateTime, TimeDelta, Utc};
use clap::Parser;

use crate::{
    render::{DisplayOptions, TimeLabels, TimeUnit},
    target::{parse_target, TargetError},
};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "until")]
#[command(about = "Count down to a moment in time")]
#[command(version = "1.0.0")]
pub struct Config {
    /// Target instant (RFC 3339, or local `YYYY-MM-DD HH:MM[:SS]`)
    #[arg(short, long, conflicts_with = "seconds", required_unless_present = "seconds")]
    pub until: Option<String>,

    /// Count down this many seconds from now
    #[arg(short = 'i', long = "in")]
    pub seconds: Option<u64>,

    /// Keep the countdown accurate across process suspension (SIGSTOP/SIGCONT)
    #[arg(short, long)]
    pub background: bool,

    /// Units to show, comma separated
    #[arg(long, value_delimiter = ',', default_value = "D,H,M,S")]
    pub show: Vec<TimeUnit>,

    /// Print `:` between neighbouring units
    #[arg(long)]
    pub separator: bool,

    /// Omit unit labels
    #[arg(long)]
    pub no_labels: bool,

    /// Emit one JSON event per line instead of text
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Resolve the target instant relative to `now`
    pub fn target(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, TargetError> {
        match (&self.until, self.seconds) {
            (Some(raw), _) => parse_target(raw),
            (None, Some(seconds)) => {
                let seconds = i64::try_from(seconds)
                    .map_err(|_| TargetError::Unparseable(seconds.to_string()))?;
                TimeDelta::try_seconds(seconds)
                    .and_then(|delta| now.checked_add_signed(delta))
                    .ok_or_else(|| TargetError::Unparseable(seconds.to_string()))
            }
            (None, None) => Err(TargetError::Empty),
        }
    }

    /// Layout for text rendering
    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            units: self.show.clone(),
            labels: (!self.no_labels).then(TimeLabels::default),
            separator: self.separator,
        }
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("until").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_relative_target() {
        let config = parse(&["--in", "90"]);
        let now = Utc::now();
        assert_eq!(config.target(now), Ok(now + TimeDelta::seconds(90)));
        assert!(!config.background);
    }

    #[test]
    fn test_absolute_target_and_flags() {
        let config = parse(&[
            "--until",
            "2030-01-01T00:00:00Z",
            "--background",
            "--show",
            "H,M,S",
            "--separator",
            "--no-labels",
        ]);

        assert_eq!(
            config.target(Utc::now()).unwrap().to_rfc3339(),
            "2030-01-01T00:00:00+00:00"
        );
        assert!(config.background);

        let options = config.display_options();
        assert_eq!(
            options.units,
            vec![TimeUnit::Hours, TimeUnit::Minutes, TimeUnit::Seconds]
        );
        assert!(options.labels.is_none());
        assert!(options.separator);
    }

    #[test]
    fn test_target_is_required() {
        let result = Config::try_parse_from(["until"]);
        assert!(result.is_err());

        let result = Config::try_parse_from(["until", "--in", "5", "--until", "2030-01-01"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_level() {
        assert_eq!(parse(&["--in", "1"]).log_level(), "info");
        assert_eq!(parse(&["--in", "1", "-v"]).log_level(), "debug");
    }
}
