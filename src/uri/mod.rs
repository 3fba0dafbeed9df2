//! Resource identifiers and the grant/request containment relation
//!
//! A URI names a handler plus the constraints under which it may be called:
//! `<path>[?<arguments>][#<metadata>]`
//!
//! - The path is colon-separated segments: `hs:hs_auth:api:v2:GetUser`.
//!   A shorter path is a namespace covering everything beneath it.
//! - Arguments map names to regex patterns constraining the request
//!   (`path_id=me`). An empty pattern forbids the argument entirely.
//! - Metadata carries predicates evaluated at check time (`before=<unix>`).
//!
//! The `?` and `#` sections are percent-encoded as whole `k=v&k2=v2` lists,
//! so `=`, `&`, `?`, `#` and `%` inside keys and values must be escaped.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// RFC 3986 unreserved characters stay verbatim, everything else is escaped.
const URI_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Argument-name prefixes for the three request parameter origins
pub const PATH_ARG_PREFIX: &str = "path_";
pub const QUERY_ARG_PREFIX: &str = "query_";
pub const POST_FORM_ARG_PREFIX: &str = "postForm_";

#[derive(Debug, Error)]
pub enum UriError {
    #[error("uri path cannot be empty")]
    EmptyPath,

    #[error("empty segment in uri path '{0}'")]
    EmptySegment(String),

    #[error("more than one '{0}' section in uri")]
    RepeatedDelimiter(char),

    #[error("malformed key/value pair '{0}': expected exactly one '='")]
    MalformedPair(String),

    #[error("duplicate key '{0}'")]
    DuplicateKey(String),

    #[error("invalid percent-encoding in '{0}'")]
    InvalidEscape(String),

    #[error("invalid value '{value}' for metadata key '{key}'")]
    Metadata { key: String, value: String },
}

/// A parsed resource identifier
///
/// Grants and request identifiers share this type; which role a value plays
/// is decided by which side of [`Uri::is_superset_of`] it lands on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Uri {
    path: String,
    arguments: HashMap<String, String>,
    metadata: HashMap<String, String>,
}

impl Uri {
    /// Parse the textual form `path[?args][#metadata]`
    ///
    /// The whole value is rejected on the first malformed section; callers
    /// never see a partially parsed identifier.
    pub fn parse(source: &str) -> Result<Self, UriError> {
        let (remaining, metadata) = split_section(source, '#')?;
        let (path, arguments) = split_section(remaining, '?')?;

        if path.is_empty() {
            return Err(UriError::EmptyPath);
        }
        if path.split(':').any(str::is_empty) {
            return Err(UriError::EmptySegment(path.to_string()));
        }

        Ok(Self {
            path: path.to_string(),
            arguments: arguments.unwrap_or_default(),
            metadata: metadata.unwrap_or_default(),
        })
    }

    /// Build the identifier for a live request to `resource_path:handler_name`
    ///
    /// Parameters are namespaced by origin (`path_`, `query_`, `postForm_`);
    /// repeated query/form values are joined with `,`. The handler name is
    /// the stable label attached at route registration.
    pub fn for_request(resource_path: &str, handler_name: &str, params: &RequestParams) -> Self {
        let mut arguments = HashMap::new();

        for (key, value) in &params.path {
            arguments.insert(format!("{PATH_ARG_PREFIX}{key}"), value.clone());
        }
        for (key, values) in &params.query {
            arguments.insert(format!("{QUERY_ARG_PREFIX}{key}"), values.join(","));
        }
        for (key, values) in &params.post_form {
            arguments.insert(format!("{POST_FORM_ARG_PREFIX}{key}"), values.join(","));
        }

        Self {
            path: format!("{resource_path}:{handler_name}"),
            arguments,
            metadata: HashMap::new(),
        }
    }

    pub(crate) fn from_parts(
        path: String,
        arguments: HashMap<String, String>,
        metadata: HashMap<String, String>,
    ) -> Self {
        Self {
            path,
            arguments,
            metadata,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn arguments(&self) -> &HashMap<String, String> {
        &self.arguments
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Check whether this grant admits the `target` request identifier
    ///
    /// Holds when all of:
    /// - this path's segments are a prefix of the target's segments,
    /// - every argument pattern here is satisfied by the target: an empty
    ///   pattern requires the argument to be absent, a non-empty pattern is a
    ///   regex that must match the target's value (unanchored, so deployed
    ///   patterns like `hs:hs_application:*` keep their substring semantics),
    /// - arguments on the target with no pattern here are ignored.
    ///
    /// A pattern that fails to compile never matches; a broken grant must not
    /// take down evaluation. Metadata does not participate, it is applied by
    /// the metadata filter before this relation is consulted.
    pub fn is_superset_of(&self, target: &Uri) -> bool {
        let mut target_segments = target.path.split(':');
        for segment in self.path.split(':') {
            if target_segments.next() != Some(segment) {
                return false;
            }
        }

        for (key, pattern) in &self.arguments {
            match (pattern.is_empty(), target.arguments.get(key)) {
                (true, None) => {}
                (true, Some(_)) => return false,
                (false, None) => return false,
                (false, Some(value)) => match Regex::new(pattern) {
                    Ok(re) if re.is_match(value) => {}
                    _ => return false,
                },
            }
        }

        true
    }

    /// True when this grant admits at least one of `targets`
    pub fn is_superset_of_any(&self, targets: &[Uri]) -> bool {
        targets.iter().any(|target| self.is_superset_of(target))
    }

    /// The subset of `targets` this grant admits, in input order
    pub fn covered_targets(&self, targets: &[Uri]) -> Vec<Uri> {
        targets
            .iter()
            .filter(|target| self.is_superset_of(target))
            .cloned()
            .collect()
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if !self.arguments.is_empty() {
            write!(f, "?{}", encode_pairs(&self.arguments))?;
        }
        if !self.metadata.is_empty() {
            write!(f, "#{}", encode_pairs(&self.metadata))?;
        }
        Ok(())
    }
}

impl Serialize for Uri {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Uri {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let source = String::deserialize(deserializer)?;
        Uri::parse(&source).map_err(de::Error::custom)
    }
}

/// Request parameters from which a request identifier is synthesized
///
/// Query and form parameters may repeat, path parameters may not.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    pub path: HashMap<String, String>,
    pub query: HashMap<String, Vec<String>>,
    pub post_form: HashMap<String, Vec<String>>,
}

/// Join URIs into the single-string persistent form
///
/// Symmetric with [`split_uris`]. Paths must not contain `,`; argument and
/// metadata sections escape it.
pub fn join_uris(uris: &[Uri]) -> String {
    uris.iter()
        .map(Uri::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse the comma-joined persistent form back into a URI list
pub fn split_uris(source: &str) -> Result<Vec<Uri>, UriError> {
    source.split(',').map(Uri::parse).collect()
}

/// Split off a `sep`-introduced key/value section
///
/// At most one `sep` may appear. Returns the part before it and the decoded
/// section map, if present.
fn split_section(source: &str, sep: char) -> Result<(&str, Option<HashMap<String, String>>), UriError> {
    let mut parts = source.split(sep);
    let remaining = parts.next().unwrap_or_default();

    match (parts.next(), parts.next()) {
        (None, _) => Ok((source, None)),
        (Some(section), None) => {
            let decoded = percent_decode(section)?;
            Ok((remaining, Some(parse_pairs(&decoded)?)))
        }
        (Some(_), Some(_)) => Err(UriError::RepeatedDelimiter(sep)),
    }
}

/// Decode a percent-encoded section, rejecting malformed escapes
fn percent_decode(source: &str) -> Result<String, UriError> {
    let bytes = source.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16));
            let lo = bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16));
            match (hi, lo) {
                (Some(hi), Some(lo)) => {
                    decoded.push((hi * 16 + lo) as u8);
                    i += 3;
                }
                _ => return Err(UriError::InvalidEscape(source.to_string())),
            }
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(decoded).map_err(|_| UriError::InvalidEscape(source.to_string()))
}

fn parse_pairs(decoded: &str) -> Result<HashMap<String, String>, UriError> {
    let mut pairs = HashMap::new();

    for pair in decoded.split('&') {
        let mut split = pair.split('=');
        let (key, value) = match (split.next(), split.next(), split.next()) {
            (Some(key), Some(value), None) if !key.is_empty() => (key, value),
            _ => return Err(UriError::MalformedPair(pair.to_string())),
        };

        if pairs.insert(key.to_string(), value.to_string()).is_some() {
            return Err(UriError::DuplicateKey(key.to_string()));
        }
    }

    Ok(pairs)
}

fn encode_pairs(map: &HashMap<String, String>) -> String {
    let joined = map
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    utf8_percent_encode(&joined, URI_ESCAPE).to_string()
}
