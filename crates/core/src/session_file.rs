//! Session journals on disk.
//!
//! A session file holds JSON lines. The first line is the header naming the
//! encounter and the run state it started from. Every later line is one
//! accepted input sealed into a SHA-256 chain: its digest covers the record
//! body plus the digest of the record before it, so an edited, dropped or
//! reordered record breaks the chain at that line.
//!
//! Records are written one line at a time and reach the file as soon as the
//! line ends, so a crash loses at most the input being written.

use std::fs::{self, File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::mem;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::journal::{InputJournal, InputPayload, InputRecord};
use crate::state::RunState;
use crate::types::EncounterType;

const FORMAT_VERSION: u16 = 1;

/// Digest the first record chains from.
pub const INITIAL_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Serialize, Deserialize)]
struct SessionHeader {
    format_version: u16,
    build_id: String,
    encounter_type: EncounterType,
    initial_run: RunState,
}

#[derive(Serialize, Deserialize)]
struct SealedInput {
    seq: u64,
    payload: InputPayload,
    prev_sha256_hex: String,
    sha256_hex: String,
}

/// The newest link of a chain and the sequence number that follows it.
#[derive(Clone, Debug)]
struct ChainTip {
    sha256_hex: String,
    next_seq: u64,
}

impl ChainTip {
    fn genesis() -> Self {
        Self { sha256_hex: INITIAL_HASH.to_string(), next_seq: 0 }
    }

    /// `hex(SHA-256({"seq","payload"} json || previous digest))`
    fn digest_for(&self, seq: u64, payload: &InputPayload) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct Body<'a> {
            seq: u64,
            payload: &'a InputPayload,
        }

        let body = serde_json::to_vec(&Body { seq, payload })?;
        let digest = Sha256::new().chain_update(&body).chain_update(self.sha256_hex.as_bytes()).finalize();
        Ok(format!("{digest:x}"))
    }

    fn seal(&mut self, payload: &InputPayload) -> serde_json::Result<SealedInput> {
        let seq = self.next_seq;
        let sha256_hex = self.digest_for(seq, payload)?;
        let prev_sha256_hex = mem::replace(&mut self.sha256_hex, sha256_hex.clone());
        self.next_seq += 1;
        Ok(SealedInput { seq, payload: payload.clone(), prev_sha256_hex, sha256_hex })
    }

    /// Accepts `record` only if it extends this tip.
    fn extend(&mut self, record: &SealedInput, line: usize) -> Result<(), SessionLoadError> {
        if record.seq != self.next_seq {
            return Err(SessionLoadError::InvalidRecord {
                line,
                message: format!("expected seq {}, found {}", self.next_seq, record.seq),
            });
        }
        let expected = self
            .digest_for(record.seq, &record.payload)
            .map_err(|error| SessionLoadError::InvalidRecord { line, message: error.to_string() })?;
        if record.prev_sha256_hex != self.sha256_hex || record.sha256_hex != expected {
            return Err(SessionLoadError::HashChainBroken { line });
        }
        self.sha256_hex = expected;
        self.next_seq += 1;
        Ok(())
    }
}

/// Appends session inputs to a session file.
pub struct SessionWriter {
    out: LineWriter<File>,
    tip: ChainTip,
}

impl SessionWriter {
    /// Creates (or truncates) the file and writes its header line.
    pub fn create(
        path: &Path,
        build_id: &str,
        encounter_type: &EncounterType,
        initial_run: &RunState,
    ) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = Self { out: LineWriter::new(File::create(path)?), tip: ChainTip::genesis() };
        writer.write_line(&SessionHeader {
            format_version: FORMAT_VERSION,
            build_id: build_id.to_string(),
            encounter_type: encounter_type.clone(),
            initial_run: initial_run.clone(),
        })?;
        Ok(writer)
    }

    /// Continues a file whose chain ends at `last_sha256_hex`, as reported by
    /// [`LoadedSession`].
    pub fn resume(path: &Path, last_sha256_hex: String, next_seq: u64) -> io::Result<Self> {
        let file = OpenOptions::new().append(true).open(path)?;
        Ok(Self { out: LineWriter::new(file), tip: ChainTip { sha256_hex: last_sha256_hex, next_seq } })
    }

    pub fn append(&mut self, payload: &InputPayload) -> io::Result<()> {
        let mut tip = self.tip.clone();
        let sealed = tip.seal(payload)?;
        self.write_line(&sealed)?;
        self.tip = tip;
        Ok(())
    }

    /// Writes a whole in-memory journal to a fresh file.
    pub fn write_journal(path: &Path, journal: &InputJournal) -> io::Result<Self> {
        let mut writer =
            Self::create(path, &journal.build_id, &journal.encounter_type, &journal.initial_run)?;
        for record in &journal.inputs {
            writer.append(&record.payload)?;
        }
        tracing::debug!(path = %path.display(), inputs = journal.inputs.len(), "session journal written");
        Ok(writer)
    }

    fn write_line(&mut self, value: &impl Serialize) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, value)?;
        self.out.write_all(b"\n")
    }
}

/// A validated session file plus the chain state needed to resume it.
#[derive(Debug)]
pub struct LoadedSession {
    pub journal: InputJournal,
    /// Digest of the last record, or [`INITIAL_HASH`] when there is none.
    pub last_sha256_hex: String,
    pub next_seq: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionLoadError {
    #[error("session file I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("session file is empty")]
    EmptyFile,

    #[error("invalid session header at line {line}: {message}")]
    InvalidHeader { line: usize, message: String },

    #[error("invalid session record at line {line}: {message}")]
    InvalidRecord { line: usize, message: String },

    /// The line was cut off before its newline.
    #[error("incomplete session line at line {line}")]
    IncompleteLine { line: usize },

    #[error("SHA-256 hash chain broken at line {line}")]
    HashChainBroken { line: usize },
}

/// Reads and verifies a session file. Loading stops at the first line that
/// is cut off, malformed or off the chain.
pub fn load_session_from_file(path: &Path) -> Result<LoadedSession, SessionLoadError> {
    let content = fs::read_to_string(path)?;
    let mut lines = content.split_inclusive('\n').enumerate().map(|(index, raw)| {
        let line = index + 1;
        raw.strip_suffix('\n').map(|text| (line, text)).ok_or(SessionLoadError::IncompleteLine { line })
    });

    let (_, header_text) = lines.next().ok_or(SessionLoadError::EmptyFile)??;
    let header: SessionHeader = serde_json::from_str(header_text)
        .map_err(|error| SessionLoadError::InvalidHeader { line: 1, message: error.to_string() })?;

    let mut tip = ChainTip::genesis();
    let mut inputs = Vec::new();
    for entry in lines {
        let (line, text) = entry?;
        if text.trim().is_empty() {
            return Err(SessionLoadError::InvalidRecord { line, message: "empty line".to_string() });
        }
        let record: SealedInput = serde_json::from_str(text)
            .map_err(|error| SessionLoadError::InvalidRecord { line, message: error.to_string() })?;
        tip.extend(&record, line)?;
        inputs.push(InputRecord { seq: record.seq, payload: record.payload });
    }

    tracing::debug!(path = %path.display(), inputs = inputs.len(), "session journal loaded");
    Ok(LoadedSession {
        journal: InputJournal {
            format_version: header.format_version,
            build_id: header.build_id,
            encounter_type: header.encounter_type,
            initial_run: header.initial_run,
            inputs,
        },
        last_sha256_hex: tip.sha256_hex,
        next_seq: tip.next_seq,
    })
}

#[cfg(test)]
mod tests;
