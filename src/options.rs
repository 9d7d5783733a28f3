//! Persisted per-speaker options.
//!
//! Options are stored as TOML:
//!
//! ```toml
//! scan_interval = 30
//! log_level = "info"
//!
//! [available_inputs.googlecast]
//! service_id = "googlecast"
//! name = "Google Cast"
//! type = "googlecast"
//! ```

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    nsdk::InputSet,
};

/// Set once the maximum log level was chosen on the command line or through
/// `RUST_LOG`.
static MAX_LEVEL_FIXED: AtomicBool = AtomicBool::new(false);

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Applies this level to the global logger.
    ///
    /// Does nothing after [`LogLevel::fix_max_level`]. Returns whether the
    /// level was applied.
    pub fn apply(self) -> bool {
        if MAX_LEVEL_FIXED.load(Ordering::Relaxed) {
            return false;
        }

        log::set_max_level(self.into());
        true
    }

    /// Keeps the current maximum log level for the rest of the process,
    /// ignoring stored log levels from then on.
    pub fn fix_max_level() {
        MAX_LEVEL_FIXED.store(true, Ordering::Relaxed);
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(Error::invalid_argument(format!(
                "log level \"{other}\" should be one of debug, info, warning, error"
            ))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(level)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Seconds between polls.
    scan_interval: u64,
    pub log_level: LogLevel,
    pub available_inputs: InputSet,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            scan_interval: Self::DEFAULT_SCAN_INTERVAL,
            log_level: LogLevel::default(),
            available_inputs: InputSet::default(),
        }
    }
}

impl Options {
    pub const DEFAULT_SCAN_INTERVAL: u64 = 30;
    pub const MIN_SCAN_INTERVAL: u64 = 10;
    pub const MAX_SCAN_INTERVAL: u64 = 300;

    /// Default options with `inputs` as the available inputs.
    #[must_use]
    pub fn with_inputs(inputs: InputSet) -> Self {
        Self {
            available_inputs: inputs,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }

    /// # Errors
    ///
    /// Will return `Err` if `seconds` is outside 10 through 300.
    pub fn set_scan_interval(&mut self, seconds: u64) -> Result<()> {
        Self::check_scan_interval(seconds)?;
        self.scan_interval = seconds;
        Ok(())
    }

    fn check_scan_interval(seconds: u64) -> Result<()> {
        if !(Self::MIN_SCAN_INTERVAL..=Self::MAX_SCAN_INTERVAL).contains(&seconds) {
            return Err(Error::invalid_argument(format!(
                "scan interval should be between {} and {} seconds but is {seconds}",
                Self::MIN_SCAN_INTERVAL,
                Self::MAX_SCAN_INTERVAL
            )));
        }
        Ok(())
    }

    /// Parses options from TOML.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the TOML is invalid or holds an out-of-range
    /// scan interval.
    pub fn from_toml(s: &str) -> Result<Self> {
        let options: Self = toml::from_str(s)?;
        Self::check_scan_interval(options.scan_interval)?;
        Ok(options)
    }

    /// # Errors
    ///
    /// Will return `Err` if the options cannot be serialized.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(Into::into)
    }
}

/// Options of one speaker, optionally backed by a file.
#[derive(Clone, Debug)]
pub struct OptionsStore {
    path: Option<PathBuf>,
    options: Options,
}

impl OptionsStore {
    /// Upper bound for an options file; discovered inputs never come near.
    const MAX_FILE_SIZE: u64 = 64 * 1024;

    /// Options that live in memory only.
    #[must_use]
    pub fn memory(options: Options) -> Self {
        Self {
            path: None,
            options,
        }
    }

    /// Loads options from `path`, or starts from defaults if it does not
    /// exist yet.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let options = match fs::metadata(&path) {
            Ok(attributes) => {
                // Prevent out-of-memory condition: options file should be small.
                if attributes.len() > Self::MAX_FILE_SIZE {
                    return Err(Error::invalid_argument(format!(
                        "{} is too large",
                        path.display()
                    )));
                }
                Options::from_toml(&fs::read_to_string(&path)?)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} does not exist yet, using defaults", path.display());
                Options::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: Some(path),
            options,
        })
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Re-reads the backing file, if any.
    ///
    /// # Errors
    ///
    /// As [`Self::open`]. The current options are kept on error.
    pub fn reload(&mut self) -> Result<&Options> {
        if let Some(path) = self.path.clone() {
            *self = Self::open(path)?;
        }
        Ok(&self.options)
    }

    /// Replaces the options and persists them.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the file cannot be written. The new options are
    /// kept in memory regardless.
    pub fn update(&mut self, options: Options) -> Result<()> {
        self.options = options;
        self.save()
    }

    /// # Errors
    ///
    /// Will return `Err` if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let contents = self.options.to_toml()?;
        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, path)?;
        debug!("saved options to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nsdk::InputDescriptor;

    #[test]
    fn defaults() {
        let options = Options::from_toml("").unwrap();
        assert_eq!(options.scan_interval(), Duration::from_secs(30));
        assert_eq!(options.log_level, LogLevel::Info);
        assert!(options.available_inputs.is_empty());
    }

    #[test]
    fn rejects_out_of_range_scan_interval() {
        assert!(Options::from_toml("scan_interval = 5").is_err());
        assert!(Options::from_toml("scan_interval = 301").is_err());
        assert!(Options::default().set_scan_interval(10).is_ok());
    }

    #[test]
    fn parses_log_levels() {
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!(LevelFilter::from(LogLevel::Warning), LevelFilter::Warn);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn fixed_max_level_ignores_stored_level() {
        assert!(LogLevel::Debug.apply());
        assert_eq!(log::max_level(), LevelFilter::Debug);

        LogLevel::fix_max_level();
        assert!(!LogLevel::Error.apply());
        assert_eq!(log::max_level(), LevelFilter::Debug);
    }

    #[test]
    fn with_inputs_keeps_defaults() {
        let mut inputs = InputSet::new();
        inputs.insert("airplay", InputDescriptor::service("airplay", "AirPlay"));

        let options = Options::with_inputs(inputs.clone());
        assert_eq!(options.available_inputs, inputs);
        assert_eq!(options.scan_interval(), Duration::from_secs(30));
        assert_eq!(options.log_level, LogLevel::Info);
    }

    #[test]
    fn persists_to_file() {
        let path = std::env::temp_dir().join(format!(
            "jbl4305p-options-{}-{}.toml",
            std::process::id(),
            crate::util::nocache_token()
        ));

        let mut options = Options::default();
        options.set_scan_interval(60).unwrap();
        options.log_level = LogLevel::Debug;
        options.available_inputs.insert(
            "bluetooth_64_e7_d8_6d_ad_c3",
            InputDescriptor::bluetooth_device("/org/bluez/hci0/dev_64_E7_D8_6D_AD_C3", "Phone"),
        );

        let mut store = OptionsStore::open(&path).unwrap();
        assert_eq!(store.options(), &Options::default());
        store.update(options.clone()).unwrap();

        let reopened = OptionsStore::open(&path).unwrap();
        assert_eq!(reopened.options(), &options);

        fs::remove_file(&path).unwrap();
    }
}
