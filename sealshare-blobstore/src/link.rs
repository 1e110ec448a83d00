//! Link resolution: turning a retrieval link back into a storage path.
//!
//! The extraction rule is tied to the link format of the blob store that
//! issued the link, so each backend hands out its own resolver.

use crate::error::{BlobStoreError, BlobStoreResult};
use url::{ParseError, Url};

/// Base for links given without scheme and host.
const RELATIVE_BASE: &str = "http://link.invalid/";

/// Where the storage path lives inside a link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkShape {
    /// The last path segment, percent-decoded, is the whole storage path.
    FinalSegment,
    /// Everything after this path prefix, each segment percent-decoded.
    Prefix(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkResolver {
    shape: LinkShape,
}

impl LinkResolver {
    pub fn final_segment() -> Self {
        Self {
            shape: LinkShape::FinalSegment,
        }
    }

    /// Resolver for links shaped `.../{prefix}/{storage path}`.
    pub fn with_prefix(prefix: &str) -> Self {
        let trimmed = prefix.trim_matches('/');
        let normalized = if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{trimmed}/")
        };
        Self {
            shape: LinkShape::Prefix(normalized),
        }
    }

    pub fn shape(&self) -> &LinkShape {
        &self.shape
    }

    /// Extracts the storage path. Query string and fragment are ignored.
    pub fn resolve(&self, link: &str) -> BlobStoreResult<String> {
        let url = parse_link(link)?;
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.collect())
            .unwrap_or_default();

        let resolved = match &self.shape {
            LinkShape::FinalSegment => match segments.last() {
                Some(segment) => decode_segment(segment)?,
                None => String::new(),
            },
            LinkShape::Prefix(prefix) => {
                let expected: Vec<&str> = prefix.split('/').filter(|s| !s.is_empty()).collect();
                if segments.len() < expected.len() || segments[..expected.len()] != expected[..] {
                    return Err(BlobStoreError::InvalidLink(format!(
                        "link path does not start with {prefix}"
                    )));
                }
                segments[expected.len()..]
                    .iter()
                    .map(|s| decode_segment(s))
                    .collect::<BlobStoreResult<Vec<_>>>()?
                    .join("/")
            }
        };

        if resolved.is_empty() {
            return Err(BlobStoreError::InvalidLink(format!(
                "no storage path in link: {link}"
            )));
        }
        Ok(resolved)
    }
}

/// Parses an absolute, scheme-relative or bare-path link.
pub(crate) fn parse_link(link: &str) -> BlobStoreResult<Url> {
    match Url::parse(link) {
        Ok(url) => Ok(url),
        Err(ParseError::RelativeUrlWithoutBase) => Url::parse(RELATIVE_BASE)
            .and_then(|base| base.join(link))
            .map_err(|e| BlobStoreError::InvalidLink(format!("{link}: {e}"))),
        Err(e) => Err(BlobStoreError::InvalidLink(format!("{link}: {e}"))),
    }
}

fn decode_segment(segment: &str) -> BlobStoreResult<String> {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .map_err(|e| BlobStoreError::InvalidLink(format!("bad percent-encoding: {e}")))
}
