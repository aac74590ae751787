//! Citation edge rows and the append-only writer / deduplicator

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use peerline_core::CsvSink;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::encoder::Encoder;
use crate::record::{RecordKind, RelationRecord};

/// Column holding the pair identifier in peer edge files
pub const PAIR_IDENTIFIER_COLUMN: &str = "entity_pair_identifier";

pub const PEER_HEADER: &[&str] = &[
    PAIR_IDENTIFIER_COLUMN,
    "citing_identifier",
    "cited_identifier",
    "citing_date",
    "citing_url",
];

pub const REFERENCE_HEADER: &[&str] = &[
    "cited_identifier",
    "cited_url",
    "cited_serial_numbers",
    "cited_venue",
    "cited_date",
];

/// Separator for list-valued cells (serial numbers, venues)
const LIST_SEPARATOR: &str = ", ";

/// Peer-review → reviewed item edge (one per related identifier)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerEdge {
    pub entity_pair_identifier: String,
    pub citing_identifier: String,
    pub cited_identifier: String,
    pub citing_date: String,
    pub citing_url: String,
}

/// Reference-side fields of a potentially reviewed item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceEdge {
    pub cited_identifier: String,
    pub cited_url: String,
    pub cited_serial_numbers: String,
    pub cited_venue: String,
    pub cited_date: String,
}

impl PeerEdge {
    /// Edges for one peer-review record; related ids that are empty are skipped.
    pub fn from_record(record: &RelationRecord, encoder: &mut Encoder) -> Result<Vec<Self>> {
        let Some(citing) = record.identifier() else {
            return Ok(Vec::new());
        };
        let citing_date = record.created_date();
        let citing_url = record.url().unwrap_or_default();

        let mut edges = Vec::new();
        for cited in record.related_identifiers().filter(|id| !id.is_empty()) {
            let pair = encoder
                .pair_identifier(citing, cited)
                .with_context(|| format!("Failed to encode {citing} -> {cited}"))?;
            edges.push(Self {
                entity_pair_identifier: pair,
                citing_identifier: citing.to_string(),
                cited_identifier: cited.to_string(),
                citing_date: citing_date.clone(),
                citing_url: citing_url.to_string(),
            });
        }
        Ok(edges)
    }
}

impl ReferenceEdge {
    /// Row for one non-peer record; `None` without both identifier and URL
    pub fn from_record(record: &RelationRecord) -> Option<Self> {
        let identifier = record.identifier()?;
        let url = record.url()?;
        Some(Self {
            cited_identifier: identifier.to_string(),
            cited_url: url.to_string(),
            cited_serial_numbers: record.serial_numbers.join(LIST_SEPARATOR),
            cited_venue: record.venues.join(LIST_SEPARATOR),
            cited_date: record.cited_date(),
        })
    }
}

/// Rows built from one batch, shaped by record kind
#[derive(Debug)]
enum Rows {
    Peer(Vec<PeerEdge>),
    Reference(Vec<ReferenceEdge>),
}

impl Rows {
    fn len(&self) -> usize {
        match self {
            Self::Peer(rows) => rows.len(),
            Self::Reference(rows) => rows.len(),
        }
    }
}

/// Appends edge rows to every destination; owns the encoder for peer runs.
#[derive(Debug)]
pub struct EdgeWriter {
    kind: RecordKind,
    destinations: Vec<PathBuf>,
    encoder: Option<Encoder>,
}

impl EdgeWriter {
    /// Writer for `kind`. Peer runs open the lookup table at `lookup_path`.
    pub fn new(kind: RecordKind, destinations: Vec<PathBuf>, lookup_path: &Path) -> Result<Self> {
        if destinations.is_empty() {
            bail!("no output destinations given");
        }
        let encoder = match kind {
            RecordKind::PeerReview => Some(Encoder::open(lookup_path).with_context(|| {
                format!("Failed to open lookup table {}", lookup_path.display())
            })?),
            RecordKind::NonPeerReview => None,
        };
        Ok(Self {
            kind,
            destinations,
            encoder,
        })
    }

    pub fn destinations(&self) -> &[PathBuf] {
        &self.destinations
    }

    pub fn header(&self) -> &'static [&'static str] {
        match self.kind {
            RecordKind::PeerReview => PEER_HEADER,
            RecordKind::NonPeerReview => REFERENCE_HEADER,
        }
    }

    /// Append rows for `records` to each destination and flush.
    ///
    /// Destinations are created with a header on first use, even when the
    /// batch yields no rows. Returns rows written per destination.
    pub fn write(&mut self, records: &[RelationRecord]) -> Result<usize> {
        let rows = self.build_rows(records)?;
        for path in &self.destinations {
            let mut sink = CsvSink::append(path, self.header())
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let written = match &rows {
                Rows::Peer(rows) => rows.iter().try_for_each(|r| sink.write_row(r)),
                Rows::Reference(rows) => rows.iter().try_for_each(|r| sink.write_row(r)),
            };
            written.with_context(|| format!("Failed to write {}", path.display()))?;
            sink.finish()
                .with_context(|| format!("Failed to flush {}", path.display()))?;
        }
        Ok(rows.len())
    }

    fn build_rows(&mut self, records: &[RelationRecord]) -> Result<Rows> {
        match (&mut self.encoder, self.kind) {
            (Some(encoder), RecordKind::PeerReview) => {
                let mut rows = Vec::new();
                for record in records {
                    rows.extend(PeerEdge::from_record(record, encoder)?);
                }
                Ok(Rows::Peer(rows))
            }
            _ => Ok(Rows::Reference(
                records.iter().filter_map(ReferenceEdge::from_record).collect(),
            )),
        }
    }
}

/// Path of the deduplicated copy: `<stem>_unique.csv` beside `path`
pub fn unique_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}_unique.csv"))
}

/// Outcome of a deduplication pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupStats {
    pub input_rows: usize,
    pub output_rows: usize,
}

impl DedupStats {
    pub fn dropped(&self) -> usize {
        self.input_rows - self.output_rows
    }
}

/// Copy `input` to `output` keeping only the first row for each `column` value.
pub fn deduplicate(input: &Path, output: &Path, column: &str) -> Result<DedupStats> {
    let mut reader = csv::Reader::from_path(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let header = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", input.display()))?
        .clone();
    let Some(key) = header.iter().position(|h| h == column) else {
        bail!("{}: no column named {column}", input.display());
    };

    let mut seen = FxHashSet::default();
    let mut kept = Vec::new();
    let mut input_rows = 0;
    for row in reader.records() {
        let row = row.with_context(|| format!("Failed to read {}", input.display()))?;
        input_rows += 1;
        if seen.insert(row.get(key).unwrap_or_default().to_string()) {
            kept.push(row);
        }
    }

    let mut sink = CsvSink::create(output, &header.iter().collect::<Vec<_>>())
        .with_context(|| format!("Failed to create {}", output.display()))?;
    for row in &kept {
        sink.write_record(row)?;
    }
    let output_rows = sink.finish()?;

    Ok(DedupStats {
        input_rows,
        output_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(v: serde_json::Value) -> RelationRecord {
        RelationRecord::from_value(v).unwrap()
    }

    fn review(doi: &str, targets: &[&str]) -> RelationRecord {
        let related: Vec<_> = targets.iter().map(|t| json!({"id": t})).collect();
        record(json!({
            "type": "peer-review",
            "DOI": doi,
            "URL": format!("https://doi.org/{doi}"),
            "created": {"date-time": "2021-02-03T04:05:06Z"},
            "relation": {"is-review-of": related}
        }))
    }

    #[test]
    fn peer_edges_one_per_related_id() {
        let dir = TempDir::new().unwrap();
        let mut enc = Encoder::open(&dir.path().join("lookup.csv")).unwrap();
        let edges = PeerEdge::from_record(&review("10.1/r", &["10.2/a", "", "10.2/b"]), &mut enc)
            .unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].cited_identifier, "10.2/a");
        assert_eq!(edges[1].cited_identifier, "10.2/b");
        assert_eq!(edges[0].citing_date, "2021-02-03");
        assert!(edges[0].entity_pair_identifier.starts_with("oci:020"));
        assert_ne!(edges[0].entity_pair_identifier, edges[1].entity_pair_identifier);
    }

    #[test]
    fn skipped_rows_do_not_grow_lookup() {
        let dir = TempDir::new().unwrap();
        let mut enc = Encoder::open(&dir.path().join("lookup.csv")).unwrap();
        let no_doi = record(json!({
            "type": "peer-review",
            "relation": {"is-review-of": [{"id": "10.2/a"}]}
        }));
        assert!(PeerEdge::from_record(&no_doi, &mut enc).unwrap().is_empty());
        assert!(enc.is_empty());
    }

    #[test]
    fn reference_edge_requires_identifier_and_url() {
        let full = record(json!({
            "DOI": "10.2/a",
            "URL": "https://doi.org/10.2/a",
            "ISSN": ["1234-5678", "8765-4321"],
            "container-title": ["Journal of Tests"],
            "issued": {"date-parts": [[2019, 4]]}
        }));
        let edge = ReferenceEdge::from_record(&full).unwrap();
        assert_eq!(edge.cited_serial_numbers, "1234-5678, 8765-4321");
        assert_eq!(edge.cited_venue, "Journal of Tests");
        assert_eq!(edge.cited_date, "2019-04");

        assert!(ReferenceEdge::from_record(&record(json!({"DOI": "10.2/a"}))).is_none());
        assert!(ReferenceEdge::from_record(&record(json!({"URL": "https://x"}))).is_none());
    }

    #[test]
    fn writes_header_once_to_every_destination() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("nested/b.csv");
        let mut writer = EdgeWriter::new(
            RecordKind::PeerReview,
            vec![a.clone(), b.clone()],
            &dir.path().join("lookup.csv"),
        )
        .unwrap();

        assert_eq!(writer.write(&[review("10.1/r", &["10.2/a"])]).unwrap(), 1);
        assert_eq!(writer.write(&[]).unwrap(), 0);
        assert_eq!(writer.write(&[review("10.1/s", &["10.2/a"])]).unwrap(), 1);

        for path in [a, b] {
            let content = std::fs::read_to_string(path).unwrap();
            let lines: Vec<_> = content.lines().collect();
            assert_eq!(lines.len(), 3);
            assert_eq!(lines[0], PEER_HEADER.join(","));
        }
    }

    #[test]
    fn reference_writer_skips_encoder() {
        let dir = TempDir::new().unwrap();
        let lookup = dir.path().join("lookup.csv");
        let out = dir.path().join("refs.csv");
        let mut writer =
            EdgeWriter::new(RecordKind::NonPeerReview, vec![out.clone()], &lookup).unwrap();
        let rec = record(json!({"DOI": "10.2/a", "URL": "u", "ISSN": ["1", "2"]}));
        writer.write(&[rec]).unwrap();

        assert!(!lookup.exists());
        let content = std::fs::read_to_string(out).unwrap();
        assert_eq!(
            content,
            "cited_identifier,cited_url,cited_serial_numbers,cited_venue,cited_date\n10.2/a,u,\"1, 2\",,\n"
        );
    }

    #[test]
    fn writer_needs_a_destination() {
        let dir = TempDir::new().unwrap();
        assert!(EdgeWriter::new(RecordKind::NonPeerReview, vec![], dir.path()).is_err());
    }

    #[test]
    fn deduplicate_keeps_first_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(
            &input,
            "entity_pair_identifier,citing_identifier\nx,1\ny,2\nx,3\nz,4\ny,5\n",
        )
        .unwrap();

        let once = dir.path().join("once.csv");
        let stats = deduplicate(&input, &once, PAIR_IDENTIFIER_COLUMN).unwrap();
        assert_eq!(stats.input_rows, 5);
        assert_eq!(stats.output_rows, 3);
        assert_eq!(stats.dropped(), 2);
        let first = std::fs::read_to_string(&once).unwrap();
        assert_eq!(first, "entity_pair_identifier,citing_identifier\nx,1\ny,2\nz,4\n");

        let twice = dir.path().join("twice.csv");
        deduplicate(&once, &twice, PAIR_IDENTIFIER_COLUMN).unwrap();
        assert_eq!(std::fs::read_to_string(&twice).unwrap(), first);
    }

    #[test]
    fn deduplicate_missing_column() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "a,b\n1,2\n").unwrap();
        assert!(deduplicate(&input, &dir.path().join("out.csv"), "c").is_err());
    }

    #[test]
    fn unique_path_naming() {
        assert_eq!(
            unique_path(Path::new("out/dump_peer_results.csv")),
            PathBuf::from("out/dump_peer_results_unique.csv")
        );
    }
}
