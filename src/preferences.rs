//! Normalized `<universal-links>` preferences.
//!
//! The reader turns the raw configuration block into [`Preferences`] with every
//! optional field resolved, so downstream writers never see raw defaults.
use crate::config_xml::{ConfigXml, RawHost};
use crate::context::BuildContext;
use anyhow::{anyhow, Result};
use serde::Serialize;

/// Event name emitted at runtime when neither host nor path declares one.
pub const DEFAULT_EVENT: &str = "didLaunchAppFromLink";
/// Path URL that matches every path on a host.
pub const ANY_PATH: &str = "*";

/// Preferences read from one configuration file, owned by a single hook run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preferences {
    pub hosts: Vec<Host>,
}

/// One `<host>` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Host {
    /// Domain pattern; may start with `*.` for wildcard subdomains.
    pub name: String,
    /// `None` matches any scheme.
    pub scheme: Option<String>,
    pub event: String,
    pub paths: Vec<PathEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathEntry {
    pub rule: PathRule,
    pub event: String,
}

/// How a path URL matches incoming links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "match", content = "url", rename_all = "snake_case")]
pub enum PathRule {
    /// Every path.
    Any,
    /// Glob with `*` wildcards.
    Pattern(String),
    /// One literal path.
    Exact(String),
}

impl PathRule {
    pub fn from_url(url: &str) -> Self {
        let url = url.trim();
        if url.is_empty() || url == ANY_PATH {
            PathRule::Any
        } else if url.contains('*') {
            PathRule::Pattern(url.to_string())
        } else {
            PathRule::Exact(url.to_string())
        }
    }
}

const HTTP_SCHEMES: [&str; 2] = ["http", "https"];

impl Host {
    /// Return whether the host declares a non-HTTP URL scheme.
    ///
    /// Hosts without a scheme accept any scheme and are served over HTTP(S),
    /// so they never count as custom.
    pub fn custom_scheme(&self) -> Option<&str> {
        self.scheme.as_deref().filter(|scheme| {
            !HTTP_SCHEMES
                .iter()
                .any(|http| scheme.eq_ignore_ascii_case(http))
        })
    }
}

impl Preferences {
    /// Return the distinct host names in first-occurrence order.
    pub fn distinct_host_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for host in &self.hosts {
            if !names.contains(&host.name.as_str()) {
                names.push(host.name.as_str());
            }
        }
        names
    }

    /// Return the distinct custom URL schemes in first-occurrence order.
    pub fn custom_schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = Vec::new();
        for scheme in self.hosts.iter().filter_map(Host::custom_scheme) {
            if !schemes.contains(&scheme) {
                schemes.push(scheme);
            }
        }
        schemes
    }
}

/// Read preferences for the project described by `ctx`.
///
/// Returns `Ok(None)` when the configuration declares no `<universal-links>`
/// block; a missing or malformed configuration file is an error.
pub fn read_preferences(ctx: &BuildContext) -> Result<Option<Preferences>> {
    let config = ConfigXml::load(&ctx.paths().config_xml_path())?;
    preferences_from_config(&config)
}

/// Normalize the `<universal-links>` block of an already parsed configuration.
pub fn preferences_from_config(config: &ConfigXml) -> Result<Option<Preferences>> {
    let Some(raw_hosts) = config.universal_links.as_ref() else {
        return Ok(None);
    };
    let hosts = raw_hosts
        .iter()
        .enumerate()
        .map(|(idx, raw)| normalize_host(idx, raw))
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(Preferences { hosts }))
}

fn normalize_host(idx: usize, raw: &RawHost) -> Result<Host> {
    let name = raw
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| anyhow!("<host> #{} in <universal-links> has no name", idx + 1))?
        .to_string();
    let scheme = non_empty(raw.scheme.as_deref()).map(str::to_ascii_lowercase);
    let event = non_empty(raw.event.as_deref())
        .unwrap_or(DEFAULT_EVENT)
        .to_string();

    let mut paths: Vec<PathEntry> = raw
        .paths
        .iter()
        .map(|path| PathEntry {
            rule: PathRule::from_url(path.url.as_deref().unwrap_or(ANY_PATH)),
            event: non_empty(path.event.as_deref())
                .unwrap_or(event.as_str())
                .to_string(),
        })
        .collect();
    if paths.is_empty() {
        paths.push(PathEntry {
            rule: PathRule::Any,
            event: event.clone(),
        });
    }

    Ok(Host {
        name,
        scheme,
        event,
        paths,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Option<Preferences> {
        let config = ConfigXml::parse(xml).expect("parse config");
        preferences_from_config(&config).expect("normalize preferences")
    }

    #[test]
    fn absent_block_means_feature_not_configured() {
        assert!(parse("<widget><name>App</name></widget>").is_none());
    }

    #[test]
    fn defaults_are_filled_in() {
        let prefs = parse(
            r#"<widget><universal-links>
                <host name="example.com" />
                <host name="shop.example.com" scheme="HTTPS" event="shop">
                    <path url="*" />
                    <path url="/items/*" event="item" />
                    <path url="/cart" />
                </host>
            </universal-links></widget>"#,
        )
        .expect("preferences");

        let first = &prefs.hosts[0];
        assert_eq!(first.scheme, None);
        assert_eq!(first.event, DEFAULT_EVENT);
        assert_eq!(
            first.paths,
            vec![PathEntry {
                rule: PathRule::Any,
                event: DEFAULT_EVENT.to_string()
            }]
        );

        let second = &prefs.hosts[1];
        assert_eq!(second.scheme.as_deref(), Some("https"));
        let rules: Vec<_> = second.paths.iter().map(|p| p.rule.clone()).collect();
        assert_eq!(
            rules,
            vec![
                PathRule::Any,
                PathRule::Pattern("/items/*".to_string()),
                PathRule::Exact("/cart".to_string()),
            ]
        );
        assert_eq!(second.paths[1].event, "item");
        assert_eq!(second.paths[2].event, "shop");
    }

    #[test]
    fn host_without_name_is_rejected() {
        let config = ConfigXml::parse(
            "<widget><universal-links><host scheme=\"app\" /></universal-links></widget>",
        )
        .expect("parse config");
        let err = preferences_from_config(&config).unwrap_err();
        assert!(err.to_string().contains("has no name"), "{err}");
    }

    #[test]
    fn custom_schemes_exclude_http_and_deduplicate() {
        let prefs = parse(
            r#"<widget><universal-links>
                <host name="example.com" scheme="https" />
                <host name="example.com" scheme="app" />
                <host name="other.com" scheme="app" />
                <host name="plain.com" />
                <host name="legacy.com" scheme="http" />
                <host name="deep" scheme="myapp" />
                <host name="secure.com" scheme="HTTPS" />
                <host name="embedded" scheme="myhttpapp" />
            </universal-links></widget>"#,
        )
        .expect("preferences");
        assert_eq!(prefs.custom_schemes(), vec!["app", "myapp", "myhttpapp"]);
        assert_eq!(
            prefs.distinct_host_names(),
            vec![
                "example.com",
                "other.com",
                "plain.com",
                "legacy.com",
                "deep",
                "secure.com",
                "embedded"
            ]
        );
    }
}
