use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;

use crate::args::Args;

/// Separates id and value in a `--set` flag.
pub const OVERRIDE_DELIM: char = '=';

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid override '{0}' (should be formatted 'ID=VALUE')")]
    InvalidOverride(String),
    #[error("Manifest file {0:?} doesn't exist")]
    ConfigNotFound(PathBuf),
    #[error("Invalid config path has no parent (should not happen)")]
    ConfigHasNoParent,
    #[error("Polling interval must be at least 1ms")]
    ZeroInterval,
}

/// Settings are like Args, except all the logic has
/// been applied so e.g. defaults are added in.
#[derive(Debug)]
pub struct Settings {
    pub config: PathBuf,
    pub output: PathBuf,
    /// empty means every step in the manifest
    pub steps: Vec<String>,
    /// (input id, text value) from `--set`
    pub overrides: Vec<(String, String)>,
    pub flat: bool,
    pub yes: bool,
    pub verbose: u8,
    pub dry_run: bool,
    pub interval: Duration,
}

impl Settings {
    /// Get canonicalized parent dir of config file:
    pub fn config_parent_dir(&self) -> Result<&Path, Error> {
        let parent_dir = self.config.parent().ok_or(Error::ConfigHasNoParent)?;
        Ok(parent_dir)
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

impl TryFrom<Args> for Settings {
    type Error = anyhow::Error;
    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let mut overrides = Vec::with_capacity(args.overrides.len());
        for arg in args.overrides {
            let (k, v) = arg
                .split_once(OVERRIDE_DELIM)
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| Error::InvalidOverride(arg.clone()))?;
            overrides.push((k.trim().to_owned(), v.to_owned()));
        }

        if args.interval == 0 {
            return Err(Error::ZeroInterval.into());
        }

        let config = PathBuf::from(&args.config);
        if !config.exists() {
            return Err(Error::ConfigNotFound(config).into());
        }
        let config = config.canonicalize()?;
        let output = PathBuf::from(&args.output);

        Ok(Self {
            config,
            output,
            steps: args.steps,
            overrides,
            flat: args.flat,
            yes: args.yes,
            verbose: args.verbose,
            dry_run: args.dry_run,
            interval: Duration::from_millis(args.interval),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str], config: &Path) -> Args {
        let mut argv = vec!["pf", "-c", config.to_str().unwrap_or_default()];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_overrides_and_verbosity() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = dir.path().join("pipeline.toml");
        std::fs::write(&config, "")?;

        let settings = Settings::try_from(args(
            &["-D", "gain=2.5", "--set", "label = a=b", "-vv", "-f"],
            &config,
        ))?;
        assert_eq!(
            settings.overrides,
            vec![
                ("gain".to_owned(), "2.5".to_owned()),
                ("label".to_owned(), " a=b".to_owned())
            ]
        );
        assert_eq!(settings.log_level(), log::LevelFilter::Debug);
        assert!(settings.flat);
        assert_eq!(settings.interval, Duration::from_millis(100));
        assert_eq!(settings.config_parent_dir()?, dir.path().canonicalize()?);
        Ok(())
    }

    #[test]
    fn test_bad_settings() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = dir.path().join("pipeline.toml");
        assert!(Settings::try_from(args(&[], &config)).is_err());

        std::fs::write(&config, "")?;
        assert!(Settings::try_from(args(&["-D", "=3"], &config)).is_err());
        assert!(Settings::try_from(args(&["-D", "gain"], &config)).is_err());
        assert!(Settings::try_from(args(&["-i", "0"], &config)).is_err());
        Ok(())
    }
}
