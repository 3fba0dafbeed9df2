//! Time-scoped grant metadata
//!
//! Metadata keys with recognized names are predicates over the current
//! time; a grant whose predicates no longer hold is dropped from the
//! effective set. Unrecognized keys are carried but never evaluated, so
//! tokens minted with newer metadata stay verifiable by older cores.

use crate::uri::{Uri, UriError};

/// Grant is in force only while `now < value` (unix seconds)
pub const BEFORE_KEY: &str = "before";

/// Keep the URIs whose metadata predicates hold at `now`
///
/// Returns the first malformed metadata value as an error; a list
/// containing an unparseable predicate is not partially evaluated.
pub fn filter_in_force(uris: Vec<Uri>, now: i64) -> Result<Vec<Uri>, UriError> {
    let mut kept = Vec::with_capacity(uris.len());

    for uri in uris {
        if in_force(&uri, now)? {
            kept.push(uri);
        }
    }

    Ok(kept)
}

fn in_force(uri: &Uri, now: i64) -> Result<bool, UriError> {
    for (key, value) in uri.metadata() {
        match key.as_str() {
            BEFORE_KEY => {
                let deadline: i64 = value.parse().map_err(|_| UriError::Metadata {
                    key: key.clone(),
                    value: value.clone(),
                })?;

                if now >= deadline {
                    return Ok(false);
                }
            }
            _ => {}
        }
    }

    Ok(true)
}
