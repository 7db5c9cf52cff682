//! Key, prefix and metadata normalization shared by all adapters.

use object_store::path::Path;
use object_store::{Attribute, AttributeValue, Attributes};
use std::collections::HashMap;

use crate::{Error, Result};

/// Convert an object key into an SDK path, rejecting keys the SDK would
/// silently rewrite (empty keys, empty or relative segments).
pub(crate) fn object_path(key: &str) -> Result<Path> {
    if key.is_empty() {
        return Err(Error::InvalidArgument("object key must not be empty".to_string()));
    }
    if key.starts_with('/') || key.ends_with('/') || key.contains("//") {
        return Err(Error::InvalidArgument(format!(
            "object key {key:?} contains an empty path segment"
        )));
    }
    Path::parse(key)
        .map_err(|e| Error::InvalidArgument(format!("invalid object key {key:?}: {e}")))
}

/// Directory to hand to the SDK listing for a plain string prefix.
///
/// SDK listings match whole path segments, so a prefix such as `logs/app`
/// has to be listed from `logs` and filtered by the caller. The directory
/// is parsed the same way keys are stored; one that is not a valid path
/// falls back to listing the whole bucket.
pub(crate) fn list_root(prefix: &str) -> Option<Path> {
    match prefix.rfind('/') {
        Some(idx) if idx > 0 => Path::parse(&prefix[..idx]).ok(),
        _ => None,
    }
}

/// Lower-case user metadata keys for upload.
///
/// Fails if two keys collide once lower-cased, since the provider would
/// keep an arbitrary one of them.
pub(crate) fn outgoing_metadata(metadata: &HashMap<String, String>) -> Result<Attributes> {
    let mut normalized: HashMap<String, &str> = HashMap::with_capacity(metadata.len());
    for (key, value) in metadata {
        let lower = key.to_lowercase();
        if normalized.insert(lower.clone(), value.as_str()).is_some() {
            return Err(Error::InvalidArgument(format!(
                "metadata key {key:?} collides with another key as {lower:?}"
            )));
        }
    }

    let mut attributes = Attributes::with_capacity(normalized.len());
    for (key, value) in normalized {
        attributes.insert(
            Attribute::Metadata(key.into()),
            AttributeValue::from(value.to_string()),
        );
    }
    Ok(attributes)
}

/// Collect user metadata from SDK attributes with lower-case keys.
pub(crate) fn incoming_metadata(attributes: &Attributes) -> HashMap<String, String> {
    attributes
        .iter()
        .filter_map(|(attribute, value)| match attribute {
            Attribute::Metadata(key) => {
                let value: &str = value.as_ref();
                Some((key.to_lowercase(), value.to_string()))
            }
            _ => None,
        })
        .collect()
}
