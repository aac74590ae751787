//! Per-entry work: gunzip, decode, filter

use peerline_core::{EntryError, gunzip};

use crate::record::{Payload, RecordKind, RelationRecord};

/// Result of processing one archive entry
#[derive(Debug, Default)]
pub struct EntryOutput {
    /// Items found in the payload (matched or not)
    pub scanned: usize,
    /// Items that passed the type predicate
    pub matched: Vec<RelationRecord>,
}

/// Decompress one entry's raw bytes and keep items matching `kind`.
///
/// Items that are not objects of the expected shape are skipped silently;
/// only payload-level failures surface as errors.
pub fn process_entry(compressed: &[u8], kind: RecordKind) -> Result<EntryOutput, EntryError> {
    let json = gunzip(compressed).map_err(EntryError::Decompress)?;
    let payload: Payload = serde_json::from_slice(&json)?;
    let items = payload.into_items().ok_or(EntryError::UnrecognizedShape)?;

    let scanned = items.len();
    let matched = items
        .into_iter()
        .filter_map(RelationRecord::from_value)
        .filter(|record| kind.matches(record))
        .collect();

    Ok(EntryOutput { scanned, matched })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    const MIXED: &str = r#"[
        {"type": "peer-review", "DOI": "10.1/r"},
        {"type": "journal-article", "DOI": "10.1/a"},
        "stray string",
        {"DOI": "10.1/untyped"}
    ]"#;

    #[test]
    fn filters_peer_reviews() {
        let out = process_entry(&gzip(MIXED.as_bytes()), RecordKind::PeerReview).unwrap();
        assert_eq!(out.scanned, 4);
        assert_eq!(out.matched.len(), 1);
        assert_eq!(out.matched[0].identifier(), Some("10.1/r"));
    }

    #[test]
    fn filters_non_peer_reviews() {
        let out = process_entry(&gzip(MIXED.as_bytes()), RecordKind::NonPeerReview).unwrap();
        let ids: Vec<_> = out.matched.iter().filter_map(|r| r.identifier()).collect();
        assert_eq!(ids, vec!["10.1/a", "10.1/untyped"]);
    }

    #[test]
    fn envelope_payload() {
        let raw = gzip(br#"{"items": [{"type": "peer-review"}], "next-cursor": "x"}"#);
        let out = process_entry(&raw, RecordKind::PeerReview).unwrap();
        assert_eq!(out.matched.len(), 1);
    }

    #[test]
    fn unrecognized_shape() {
        let raw = gzip(br#"{"status": "ok"}"#);
        let err = process_entry(&raw, RecordKind::PeerReview).unwrap_err();
        assert!(matches!(err, EntryError::UnrecognizedShape));
    }

    #[test]
    fn invalid_json() {
        let raw = gzip(b"{not json");
        let err = process_entry(&raw, RecordKind::PeerReview).unwrap_err();
        assert!(matches!(err, EntryError::Parse(_)));
    }

    #[test]
    fn not_gzip() {
        let err = process_entry(b"[]", RecordKind::PeerReview).unwrap_err();
        assert!(matches!(err, EntryError::Decompress(_)));
    }
}
