use std::path::PathBuf;

use crate::{
    error::{Error, Result},
    options::Options,
};

#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Config {
    pub app_name: String,
    pub app_version: String,

    /// Speaker address as `host` or `host:port`.
    pub host: String,

    /// Name to push to the speaker during setup, if any.
    pub name: Option<String>,

    /// Where discovered inputs and other options are persisted. Options are
    /// kept in memory only when unset.
    pub options_file: Option<PathBuf>,

    /// Scan interval requested on the command line, overriding the stored
    /// options.
    pub scan_interval: Option<u64>,

    pub user_agent: String,
}

impl Config {
    /// Creates a configuration for the speaker at `host`.
    ///
    /// # Errors
    ///
    /// Will return `Err` if `host` is empty or carries a scheme or path.
    pub fn with_host(host: &str) -> Result<Self> {
        let host = host.trim();
        if host.is_empty() || host.contains(['/', '?', '#', ' ']) {
            return Err(Error::invalid_argument(format!(
                "host \"{host}\" should be a bare host name or address"
            )));
        }

        let app_name = env!("CARGO_PKG_NAME").to_owned();
        let app_version = env!("CARGO_PKG_VERSION").to_owned();

        let os_name = match std::env::consts::OS {
            "macos" => "osx",
            other => other,
        };
        let user_agent = format!("{app_name}/{app_version} (Rust; {os_name})");
        trace!("user agent: {user_agent}");

        Ok(Self {
            app_name,
            app_version,

            host: host.to_owned(),
            name: None,

            options_file: None,
            scan_interval: None,

            user_agent,
        })
    }

    /// Stable identifier of the configured speaker.
    ///
    /// Dots are replaced so the identifier can be used as a key anywhere.
    #[must_use]
    pub fn unique_id(&self) -> String {
        self.host.replace('.', "_")
    }

    /// Applies command line overrides on top of stored options.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the overriding scan interval is out of range.
    pub fn apply_overrides(&self, options: &mut Options) -> Result<()> {
        if let Some(scan_interval) = self.scan_interval {
            options.set_scan_interval(scan_interval)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_id_replaces_dots() {
        let config = Config::with_host("192.168.1.75").unwrap();
        assert_eq!(config.unique_id(), "192_168_1_75");
    }

    #[test]
    fn rejects_urls_as_host() {
        assert!(Config::with_host("http://192.168.1.75/").is_err());
        assert!(Config::with_host("  ").is_err());
        assert!(Config::with_host("speaker.local:8080").is_ok());
    }
}
