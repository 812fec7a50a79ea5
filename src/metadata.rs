//! Metadata suspicion scanning.
//!
//! Steganographic payloads and smuggled instructions often ride along in
//! comment-style metadata fields. The scanner works on a provided tag
//! mapping; actual EXIF/container parsing is a pluggable backend.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::Result;

/// Tag names that warrant a flag regardless of content (compared
/// case-insensitively).
pub const WATCHED_FIELDS: [&str; 4] = ["comment", "usercomment", "xpcomment", "imagedescription"];

/// String values longer than this are flagged as suspicious carriers.
pub const LONG_VALUE_LIMIT: usize = 512;

/// A single metadata tag value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    /// A textual tag value.
    Text(String),
    /// An integer tag value.
    Int(i64),
    /// A raw byte sequence (undecoded tag payload).
    Bytes(Vec<u8>),
}

/// Ordered mapping of tag name to value, as supplied by a metadata backend.
pub type MetadataMap = BTreeMap<String, MetaValue>;

/// A pluggable metadata extraction backend.
///
/// Any EXIF or container-info reader satisfying this contract is
/// substitutable; tests script one that returns fixed tags. Backends should
/// fail cleanly with [`crate::Error::Metadata`] rather than panic; the
/// pipeline absorbs the failure as "no tags found".
pub trait MetadataReader: Send + Sync {
    /// Read a tag mapping from raw encoded image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Metadata`] if the backend cannot read tags.
    fn read(&self, image_bytes: &[u8]) -> Result<MetadataMap>;
}

/// Default backend that reports no metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl MetadataReader for NoMetadata {
    fn read(&self, _image_bytes: &[u8]) -> Result<MetadataMap> {
        Ok(MetadataMap::new())
    }
}

/// Scan a tag mapping for suspicious entries.
///
/// Produces a deduplicated set of flag labels:
/// - `meta_field:<name>`: tag name is on the watch-list
/// - `meta_raw_bytes:<name>`: value is an undecoded byte sequence
/// - `meta_long:<name>`: string value exceeds [`LONG_VALUE_LIMIT`] characters
///
/// Presence/absence only; the scanner assigns no numeric score.
#[must_use]
pub fn scan_metadata(map: &MetadataMap) -> BTreeSet<String> {
    let mut flags = BTreeSet::new();
    for (name, value) in map {
        if WATCHED_FIELDS.contains(&name.to_lowercase().as_str()) {
            flags.insert(format!("meta_field:{name}"));
        }
        match value {
            MetaValue::Bytes(_) => {
                flags.insert(format!("meta_raw_bytes:{name}"));
            }
            MetaValue::Text(s) if s.chars().count() > LONG_VALUE_LIMIT => {
                flags.insert(format!("meta_long:{name}"));
            }
            MetaValue::Text(_) | MetaValue::Int(_) => {}
        }
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_map_produces_no_flags() {
        assert!(scan_metadata(&MetadataMap::new()).is_empty());
    }

    #[test]
    fn watched_field_is_flagged_case_insensitively() {
        let mut map = MetadataMap::new();
        map.insert("UserComment".to_string(), MetaValue::Text("hello".to_string()));
        let flags = scan_metadata(&map);
        assert!(flags.contains("meta_field:UserComment"));
        assert_eq!(flags.len(), 1);
    }

    #[test]
    fn innocuous_tag_is_not_flagged() {
        let mut map = MetadataMap::new();
        map.insert("Orientation".to_string(), MetaValue::Int(1));
        map.insert("Make".to_string(), MetaValue::Text("ACME".to_string()));
        assert!(scan_metadata(&map).is_empty());
    }

    #[test]
    fn raw_bytes_value_is_flagged() {
        let mut map = MetadataMap::new();
        map.insert("MakerNote".to_string(), MetaValue::Bytes(vec![0, 1, 2]));
        let flags = scan_metadata(&map);
        assert!(flags.contains("meta_raw_bytes:MakerNote"));
    }

    #[test]
    fn long_string_value_is_flagged() {
        let mut map = MetadataMap::new();
        map.insert("Artist".to_string(), MetaValue::Text("x".repeat(600)));
        let flags = scan_metadata(&map);
        assert!(flags.contains("meta_long:Artist"));
    }

    #[test]
    fn string_at_limit_is_not_flagged() {
        let mut map = MetadataMap::new();
        map.insert("Artist".to_string(), MetaValue::Text("x".repeat(LONG_VALUE_LIMIT)));
        assert!(scan_metadata(&map).is_empty());
    }

    #[test]
    fn watched_long_field_gets_both_flags() {
        let mut map = MetadataMap::new();
        map.insert("Comment".to_string(), MetaValue::Text("y".repeat(600)));
        let flags = scan_metadata(&map);
        assert!(flags.contains("meta_field:Comment"));
        assert!(flags.contains("meta_long:Comment"));
        assert_eq!(flags.len(), 2);
    }
}
