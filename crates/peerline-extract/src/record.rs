//! Relation records decoded from archive payloads

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Type tag carried by peer-review items
pub const PEER_REVIEW_TYPE: &str = "peer-review";

// === Payload shape ===

/// Top-level shape of one decompressed archive entry.
///
/// Dumps mix two layouts: an envelope object with an `items` list and a bare
/// list of items. Anything else is kept as `Unrecognized` so the caller can
/// log and skip it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Envelope { items: Vec<Value> },
    Bare(Vec<Value>),
    Unrecognized(Value),
}

impl Payload {
    /// Item list, or `None` for an unrecognized shape
    pub fn into_items(self) -> Option<Vec<Value>> {
        match self {
            Self::Envelope { items } | Self::Bare(items) => Some(items),
            Self::Unrecognized(_) => None,
        }
    }
}

// === Record ===

/// One raw metadata item. Only the fields the edge writers read are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelationRecord {
    /// Item type tag (e.g. "peer-review", "journal-article")
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    /// Own identifier (DOI)
    #[serde(rename = "DOI", default)]
    pub identifier: Option<String>,

    /// Own resolvable URL
    #[serde(rename = "URL", default)]
    pub url: Option<String>,

    #[serde(default)]
    pub created: Option<Created>,

    #[serde(default)]
    pub issued: Option<Issued>,

    #[serde(default)]
    pub relation: Option<Relation>,

    /// Serial numbers (ISSN)
    #[serde(rename = "ISSN", default, deserialize_with = "null_as_default")]
    pub serial_numbers: Vec<String>,

    /// Venue names (container titles)
    #[serde(rename = "container-title", default, deserialize_with = "null_as_default")]
    pub venues: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Created {
    #[serde(rename = "date-time", default)]
    pub date_time: Option<String>,
}

/// Partial publication date as `[[year, month?, day?]]`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Issued {
    #[serde(rename = "date-parts", default, deserialize_with = "null_as_default")]
    pub date_parts: Vec<Vec<Option<i64>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Relation {
    #[serde(rename = "is-review-of", default, deserialize_with = "null_as_default")]
    pub is_review_of: Vec<RelatedId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelatedId {
    #[serde(default)]
    pub id: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl RelationRecord {
    /// Decode one item; `None` when the item is not an object of the expected shape.
    pub fn from_value(value: Value) -> Option<Self> {
        match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                log::debug!("Skipping malformed item: {e}");
                None
            }
        }
    }

    pub fn is_peer_review(&self) -> bool {
        self.kind.as_deref() == Some(PEER_REVIEW_TYPE)
    }

    /// Own identifier, with empty strings treated as absent
    pub fn identifier(&self) -> Option<&str> {
        non_empty(self.identifier.as_deref())
    }

    pub fn url(&self) -> Option<&str> {
        non_empty(self.url.as_deref())
    }

    /// Related (reviewed) identifiers in document order; may contain empties
    pub fn related_identifiers(&self) -> impl Iterator<Item = &str> + '_ {
        self.relation
            .iter()
            .flat_map(|r| r.is_review_of.iter())
            .map(|r| r.id.as_deref().unwrap_or(""))
    }

    /// Creation date: first 10 characters of `created.date-time`
    pub fn created_date(&self) -> String {
        self.created
            .as_ref()
            .and_then(|c| c.date_time.as_deref())
            .map(|s| s.chars().take(10).collect())
            .unwrap_or_default()
    }

    /// Issued date at its available precision (`YYYY`, `YYYY-MM`, `YYYY-MM-DD`)
    pub fn issued_date(&self) -> Option<String> {
        let parts = self.issued.as_ref()?.date_parts.first()?;
        let mut fields = parts.iter().map_while(|p| *p);
        let year = fields.next()?;
        let mut out = format!("{year:04}");
        for part in fields.take(2) {
            out.push_str(&format!("-{part:02}"));
        }
        Some(out)
    }

    /// Date recorded for a cited (non-peer) item: issued date, else creation date
    pub fn cited_date(&self) -> String {
        self.issued_date().unwrap_or_else(|| self.created_date())
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

// === Type predicate ===

/// Which subset of the dump an extraction run keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Items typed `peer-review`
    PeerReview,
    /// Every other item (the potential review targets)
    NonPeerReview,
}

impl RecordKind {
    /// Type predicate applied to every decoded item
    pub fn matches(&self, record: &RelationRecord) -> bool {
        match self {
            Self::PeerReview => record.is_peer_review(),
            Self::NonPeerReview => !record.is_peer_review(),
        }
    }

    /// Tag used in default output file names
    pub fn file_tag(&self) -> &'static str {
        match self {
            Self::PeerReview => "peer",
            Self::NonPeerReview => "non_peer",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PeerReview => write!(f, "peer-review"),
            Self::NonPeerReview => write!(f, "non-peer-review"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> RelationRecord {
        RelationRecord::from_value(v).unwrap()
    }

    #[test]
    fn payload_envelope() {
        let p: Payload = serde_json::from_str(r#"{"items":[{"type":"x"}],"total":1}"#).unwrap();
        assert_eq!(p.into_items().unwrap().len(), 1);
    }

    #[test]
    fn payload_bare_list() {
        let p: Payload = serde_json::from_str(r#"[{"type":"x"},{"type":"y"}]"#).unwrap();
        assert_eq!(p.into_items().unwrap().len(), 2);
    }

    #[test]
    fn payload_unrecognized() {
        for raw in [r#"{"message":"hi"}"#, r#"{"items":"nope"}"#, "42", r#""text""#] {
            let p: Payload = serde_json::from_str(raw).unwrap();
            assert!(p.into_items().is_none(), "{raw} should be unrecognized");
        }
    }

    #[test]
    fn peer_review_fields() {
        let r = record(json!({
            "type": "peer-review",
            "DOI": "10.1234/review.1",
            "URL": "https://doi.org/10.1234/review.1",
            "created": {"date-time": "2020-05-10T08:00:00Z"},
            "relation": {"is-review-of": [{"id": "10.5555/a"}, {"id-type": "doi"}]}
        }));
        assert!(r.is_peer_review());
        assert_eq!(r.identifier(), Some("10.1234/review.1"));
        assert_eq!(r.created_date(), "2020-05-10");
        assert_eq!(r.related_identifiers().collect::<Vec<_>>(), vec!["10.5555/a", ""]);
    }

    #[test]
    fn nulls_are_absent() {
        let r = record(json!({
            "type": null,
            "DOI": "",
            "ISSN": null,
            "container-title": null,
            "relation": {"is-review-of": null}
        }));
        assert!(!r.is_peer_review());
        assert_eq!(r.identifier(), None);
        assert!(r.serial_numbers.is_empty());
        assert!(r.venues.is_empty());
        assert_eq!(r.related_identifiers().count(), 0);
        assert_eq!(r.created_date(), "");
    }

    #[test]
    fn non_object_item_is_skipped() {
        assert!(RelationRecord::from_value(json!("just a string")).is_none());
        assert!(RelationRecord::from_value(json!({"ISSN": "not-a-list"})).is_none());
    }

    #[test]
    fn issued_date_precision() {
        let year = record(json!({"issued": {"date-parts": [[2019]]}}));
        assert_eq!(year.issued_date().as_deref(), Some("2019"));

        let month = record(json!({"issued": {"date-parts": [[2019, 3]]}}));
        assert_eq!(month.issued_date().as_deref(), Some("2019-03"));

        let day = record(json!({"issued": {"date-parts": [[2019, 3, 7]]}}));
        assert_eq!(day.issued_date().as_deref(), Some("2019-03-07"));

        let empty = record(json!({"issued": {"date-parts": [[null]]}}));
        assert_eq!(empty.issued_date(), None);
    }

    #[test]
    fn cited_date_falls_back_to_created() {
        let r = record(json!({"created": {"date-time": "2018-01-01T00:00:00Z"}}));
        assert_eq!(r.cited_date(), "2018-01-01");

        let r = record(json!({
            "created": {"date-time": "2018-01-01T00:00:00Z"},
            "issued": {"date-parts": [[2017, 12]]}
        }));
        assert_eq!(r.cited_date(), "2017-12");
    }

    #[test]
    fn kind_predicates() {
        let peer = record(json!({"type": "peer-review"}));
        let article = record(json!({"type": "journal-article"}));
        let untyped = record(json!({}));

        assert!(RecordKind::PeerReview.matches(&peer));
        assert!(!RecordKind::PeerReview.matches(&article));
        assert!(!RecordKind::NonPeerReview.matches(&peer));
        assert!(RecordKind::NonPeerReview.matches(&article));
        assert!(RecordKind::NonPeerReview.matches(&untyped));
    }

    #[test]
    fn kind_names() {
        assert_eq!(RecordKind::PeerReview.to_string(), "peer-review");
        assert_eq!(RecordKind::NonPeerReview.file_tag(), "non_peer");
    }
}
