//! Endpoint derivation
//!
//! The socket always lives on the host that served the page. Only the
//! scheme changes: `wss` for pages loaded over `https`, `ws` otherwise.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{BusError, Result};

/// How the socket scheme is picked from the page scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemePolicy {
    /// `https` page -> `wss`, anything else -> `ws`
    #[default]
    MatchPage,
    /// Always `ws`, even for `https` pages
    AlwaysInsecure,
}

impl FromStr for SchemePolicy {
    type Err = BusError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "match_page" | "match-page" | "secure" => Ok(Self::MatchPage),
            "always_insecure" | "always-insecure" | "insecure" => Ok(Self::AlwaysInsecure),
            other => Err(BusError::Config(format!("Unknown scheme policy: {}", other))),
        }
    }
}

/// Location of the page the bus belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    url: Url,
}

impl PageLocation {
    /// Parse a page URL such as `https://example.com:8443/app`
    ///
    /// # Errors
    /// `BusError::InvalidUrl` for unparseable input, `BusError::Config` if
    /// the URL has no host.
    pub fn parse(input: &str) -> Result<Self> {
        Self::from_url(Url::parse(input)?)
    }

    pub fn from_url(url: Url) -> Result<Self> {
        if url.host_str().is_none() {
            return Err(BusError::Config(format!("Page URL has no host: {}", url)));
        }
        Ok(Self { url })
    }

    /// Whether the page was loaded over an encrypted transport
    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "https"
    }

    /// Host and non-default port, e.g. `localhost:3000`
    pub fn host(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for PageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Derive the socket URL for a page: `<ws|wss>://<host>/`
pub fn endpoint_url(page: &PageLocation, policy: SchemePolicy) -> Result<Url> {
    let scheme = match policy {
        SchemePolicy::MatchPage if page.is_secure() => "wss",
        _ => "ws",
    };
    Ok(Url::parse(&format!("{}://{}", scheme, page.host()))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derive(page: &str, policy: SchemePolicy) -> String {
        let page = PageLocation::parse(page).unwrap();
        endpoint_url(&page, policy).unwrap().to_string()
    }

    #[test]
    fn test_https_page_upgrades() {
        assert_eq!(
            derive("https://example.com:8443/app?x=1#top", SchemePolicy::MatchPage),
            "wss://example.com:8443/"
        );
        assert_eq!(derive("https://example.com", SchemePolicy::MatchPage), "wss://example.com/");
    }

    #[test]
    fn test_http_page_stays_insecure() {
        assert_eq!(
            derive("http://localhost:3000/", SchemePolicy::MatchPage),
            "ws://localhost:3000/"
        );
        assert_eq!(derive("http://127.0.0.1", SchemePolicy::MatchPage), "ws://127.0.0.1/");
    }

    #[test]
    fn test_always_insecure_policy() {
        assert_eq!(
            derive("https://example.com/", SchemePolicy::AlwaysInsecure),
            "ws://example.com/"
        );
    }

    #[test]
    fn test_page_without_host_is_rejected() {
        assert!(matches!(
            PageLocation::parse("file:///tmp/index.html"),
            Err(BusError::Config(_))
        ));
        assert!(matches!(
            PageLocation::parse("not a url"),
            Err(BusError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("match_page".parse::<SchemePolicy>().unwrap(), SchemePolicy::MatchPage);
        assert_eq!(
            "Always-Insecure".parse::<SchemePolicy>().unwrap(),
            SchemePolicy::AlwaysInsecure
        );
        assert!("sometimes".parse::<SchemePolicy>().is_err());
    }
}
