//! Version and network details scraped from the speaker's status page.
//!
//! `/index.fcgi` is an HTML page meant for humans. It is not part of the
//! NSDK API, but it is the only place that reports firmware versions and
//! the network configuration. Each field is matched independently by its
//! label; a label that is missing leaves its field unset.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use super::value::Scalar;

static DEVICE_VERSION: LazyLock<Regex> = LazyLock::new(|| label(r"Device version:\s*([^<\n]+)"));
static AIRPLAY_VERSION: LazyLock<Regex> =
    LazyLock::new(|| label(r"AirPlay version:\s*([^<\n]+)"));
static IP_CIDR: LazyLock<Regex> = LazyLock::new(|| label(r"IP:\s*([0-9.]+/[0-9]+)"));
static GATEWAY: LazyLock<Regex> = LazyLock::new(|| label(r"Gateway:\s*([0-9.]+)"));
static DNS: LazyLock<Regex> = LazyLock::new(|| label(r"DNS:\s*([^<\n]+)"));

fn label(pattern: &str) -> Regex {
    Regex::new(pattern).expect("invalid status page pattern")
}

fn capture(regex: &Regex, text: &str) -> Option<String> {
    regex
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPage {
    pub device_version: Option<String>,
    pub airplay_version: Option<String>,
    pub ip_cidr: Option<String>,
    pub gateway: Option<String>,
    /// Name servers, joined by `", "`.
    pub dns: Option<String>,
}

impl StatusPage {
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let dns = capture(&DNS, text).map(|servers| {
            servers
                .split(',')
                .map(str::trim)
                .filter(|server| !server.is_empty())
                .collect::<Vec<_>>()
                .join(", ")
        });

        Self {
            device_version: capture(&DEVICE_VERSION, text),
            airplay_version: capture(&AIRPLAY_VERSION, text),
            ip_cidr: capture(&IP_CIDR, text),
            gateway: capture(&GATEWAY, text),
            dns,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Looks up a field by its sensor key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Scalar> {
        let value = match key {
            "device_version" => &self.device_version,
            "airplay_version" => &self.airplay_version,
            "ip_cidr" => &self.ip_cidr,
            "gateway" => &self.gateway,
            "dns" => &self.dns,
            _ => return None,
        };
        value.clone().map(Scalar::String)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<html><body>\
        <p>Device version: 1.4.2.3851 </p>\
        <p>AirPlay version: 377.40.00</p>\
        <p>IP: 192.168.1.75/24</p>\
        <p>Gateway: 192.168.1.1</p>\
        <p>DNS: 192.168.1.1 ,1.1.1.1,  8.8.8.8</p>\
        </body></html>";

    #[test]
    fn parses_all_labels() {
        let status = StatusPage::parse(PAGE);
        assert_eq!(status.device_version.as_deref(), Some("1.4.2.3851"));
        assert_eq!(status.airplay_version.as_deref(), Some("377.40.00"));
        assert_eq!(status.ip_cidr.as_deref(), Some("192.168.1.75/24"));
        assert_eq!(status.gateway.as_deref(), Some("192.168.1.1"));
        assert_eq!(status.dns.as_deref(), Some("192.168.1.1, 1.1.1.1, 8.8.8.8"));
    }

    #[test]
    fn missing_labels_stay_unset() {
        let status = StatusPage::parse("Device version: 1.0\nsomething else\n");
        assert_eq!(status.device_version.as_deref(), Some("1.0"));
        assert_eq!(status.airplay_version, None);
        assert_eq!(status.ip_cidr, None);
        assert_eq!(status.get("gateway"), None);
        assert!(!status.is_empty());
    }

    #[test]
    fn ip_requires_prefix_length() {
        assert_eq!(StatusPage::parse("IP: 192.168.1.75<br>").ip_cidr, None);
    }

    #[test]
    fn empty_page() {
        assert!(StatusPage::parse("").is_empty());
    }
}
