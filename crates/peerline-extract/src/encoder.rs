//! Identifier encoder backed by a durable character lookup table.
//!
//! Every character of an identifier maps to a short decimal code; an
//! identifier's code is the concatenation of its characters' codes. The
//! table lives in an append-only CSV (`c,code`) and is the only state shared
//! between runs.
//!
//! Codes are assigned in non-decreasing order starting after the largest code
//! on disk. Within each hundred-block, codes 90..=99 are never assigned: after
//! `xx89` the next code is the start of the following block. A new character
//! is appended and synced to disk before its code is returned.
//!
//! Assignment takes an exclusive lock on the table file and first re-reads
//! rows appended by other processes, so two concurrent writers cannot give
//! one character two codes.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

/// Registrant prefix placed before each entity code in a pair identifier
pub const REGISTRANT_CODE: &str = "020";

/// Number of leading identifier characters dropped before encoding (e.g. `10.`)
pub const IDENTIFIER_PREFIX_LEN: usize = 3;

/// Header of a freshly created lookup table
const TABLE_HEADER: &[u8] = b"c,code\n";

/// Last assignable offset inside a hundred-block; 90..=99 are reserved
const BLOCK_LAST_CODE: u64 = 89;
const BLOCK_SIZE: u64 = 100;

/// Next code after `current`, skipping the reserved top of each hundred-block.
pub const fn next_code(current: u64) -> u64 {
    if current % BLOCK_SIZE == BLOCK_LAST_CODE {
        (current / BLOCK_SIZE + 1) * BLOCK_SIZE
    } else {
        current + 1
    }
}

/// Render a code as stored in the table (at least two digits)
fn render_code(code: u64) -> String {
    format!("{code:02}")
}

/// Character→code lookup table with durable append-before-use assignment.
///
/// Construction reads the whole table, so build one encoder per run and
/// reuse it for every conversion.
pub struct Encoder {
    path: PathBuf,
    file: File,
    codes: FxHashMap<char, String>,
    current: u64,
    /// Bytes of the table file already ingested
    read_offset: u64,
    /// Whether the ingested bytes end with a line terminator
    ends_with_newline: bool,
}

impl std::fmt::Debug for Encoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoder")
            .field("path", &self.path)
            .field("characters", &self.codes.len())
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl Encoder {
    /// Open (or create) the lookup table at `path` and load every finished row.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        let mut encoder = Self {
            path: path.to_path_buf(),
            file,
            codes: FxHashMap::default(),
            current: 0,
            read_offset: 0,
            ends_with_newline: true,
        };
        encoder.file.lock()?;
        let loaded = Self::seed_if_empty(&mut encoder.file).and_then(|()| encoder.refresh(false));
        encoder.file.unlock()?;
        loaded?;

        log::debug!(
            "Loaded {} lookup codes from {} (current {})",
            encoder.codes.len(),
            path.display(),
            encoder.current
        );
        Ok(encoder)
    }

    fn seed_if_empty(file: &mut File) -> io::Result<()> {
        if file.metadata()?.len() == 0 {
            file.write_all(TABLE_HEADER)?;
            file.sync_data()?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of characters with an assigned code
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Largest code assigned so far (0 for an empty table)
    pub fn current_code(&self) -> u64 {
        self.current
    }

    /// Code for one character, assigning and persisting a new one on a miss.
    pub fn code_for(&mut self, c: char) -> io::Result<String> {
        if let Some(code) = self.codes.get(&c) {
            return Ok(code.clone());
        }
        self.file.lock()?;
        let assigned = self.assign_locked(c);
        self.file.unlock()?;
        assigned
    }

    /// Entity code of an identifier: codes of every character after the prefix.
    pub fn identifier_code(&mut self, identifier: &str) -> io::Result<String> {
        let mut out = String::with_capacity(identifier.len() * 2);
        for c in identifier.chars().skip(IDENTIFIER_PREFIX_LEN) {
            out.push_str(&self.code_for(c)?);
        }
        Ok(out)
    }

    /// Pair identifier for a citing→cited edge:
    /// `oci:<registrant><citing code>-<registrant><cited code>`.
    pub fn pair_identifier(&mut self, citing: &str, cited: &str) -> io::Result<String> {
        let citing_code = self.identifier_code(citing)?;
        let cited_code = self.identifier_code(cited)?;
        Ok(format!(
            "oci:{REGISTRANT_CODE}{citing_code}-{REGISTRANT_CODE}{cited_code}"
        ))
    }

    /// Assign a code to `c`. Caller holds the file lock.
    fn assign_locked(&mut self, c: char) -> io::Result<String> {
        // Another process may have assigned it since our last read
        self.refresh(true)?;
        if let Some(code) = self.codes.get(&c) {
            return Ok(code.clone());
        }

        let next = next_code(self.current);
        let code = render_code(next);

        let mut row = Vec::new();
        if !self.ends_with_newline {
            row.push(b'\n');
        }
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .quote_style(csv::QuoteStyle::Always)
                .from_writer(&mut row);
            let mut buf = [0u8; 4];
            writer.write_record([&*c.encode_utf8(&mut buf), code.as_str()])?;
            writer.flush()?;
        }
        self.file.write_all(&row)?;
        self.file.sync_data()?;

        self.read_offset += row.len() as u64;
        self.ends_with_newline = true;
        self.current = next;
        self.codes.insert(c, code.clone());
        log::debug!("Assigned lookup code {code} to {c:?}");
        Ok(code)
    }

    /// Ingest table bytes past `read_offset`.
    ///
    /// Without `whole`, ingestion stops at the first row that is not yet
    /// newline-terminated, since a writer may still be appending it. With
    /// `whole` (only under the file lock) an unterminated final row is taken
    /// as finished.
    fn refresh(&mut self, whole: bool) -> io::Result<()> {
        let len = self.file.metadata()?.len();
        if len <= self.read_offset {
            return Ok(());
        }
        let mut reader = File::open(&self.path)?;
        reader.seek(SeekFrom::Start(self.read_offset))?;
        let mut tail = Vec::with_capacity((len - self.read_offset) as usize);
        reader.read_to_end(&mut tail)?;

        let mut rows = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(tail.as_slice());
        let mut header_pending = self.read_offset == 0;
        let mut record = csv::StringRecord::new();
        let mut consumed = 0;
        while rows.read_record(&mut record)? {
            let end = rows.position().byte() as usize;
            let terminated = end > 0 && tail[end - 1] == b'\n';
            let complete = terminated && record.get(1).is_some_and(|code| !code.is_empty());
            if !whole && !complete {
                break;
            }
            if header_pending {
                header_pending = false;
            } else {
                self.ingest_row(record.get(0).unwrap_or(""), record.get(1).unwrap_or(""))?;
            }
            consumed = end;
        }

        if consumed > 0 {
            self.read_offset += consumed as u64;
            self.ends_with_newline = tail[consumed - 1] == b'\n';
        }
        Ok(())
    }

    fn ingest_row(&mut self, character: &str, code: &str) -> io::Result<()> {
        let mut chars = character.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            log::warn!(
                "{}: ignoring lookup row with non-character key {character:?}",
                self.path.display()
            );
            return Ok(());
        };
        let value: u64 = code.trim().parse().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{}: invalid lookup code {code:?}", self.path.display()),
            )
        })?;
        // First occurrence wins; later duplicates only advance the counter
        self.codes.entry(c).or_insert_with(|| code.trim().to_string());
        self.current = self.current.max(value);
        Ok(())
    }
}
