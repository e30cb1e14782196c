use crate::error::{Result, ScanError};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use url::{Position, Url};

/// An absolute URL that has passed validation.
///
/// Equality, hashing and ordering follow the serialized form produced by the
/// `url` crate. Nothing else is normalized: `https://a.example/x` and
/// `https://a.example/x/` are different links.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Link(Url);

impl Link {
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input.trim())
            .map_err(|e| ScanError::InvalidUrl(format!("'{}': {}", input, e)))?;
        Ok(Self(url))
    }

    /// Resolve `href` against this link, the way a browser resolves an anchor
    /// found on the page at this address.
    pub fn join(&self, href: &str) -> Option<Link> {
        self.0.join(href).ok().map(Link)
    }

    /// User info, host and port as written in the URL. Empty for links
    /// without a host, such as `mailto:`.
    pub fn authority(&self) -> &str {
        &self.0[Position::BeforeUsername..Position::AfterPort]
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl FromStr for Link {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        Link::parse(s)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Serialize for Link {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.as_str())
    }
}
