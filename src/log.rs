use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::buffer::Buffer;
use crate::error::{KvError, Result};

/// The largest key or value the log will record, 16 MiB.
///
/// The limit is enforced on both sides of the file: [`CommandLog::append`]
/// rejects larger payloads up front, which lets replay treat any length
/// field above it as corruption instead of allocating for it.
pub const MAX_PAYLOAD_LEN: u64 = 16 * 1024 * 1024;

/// The append-only on-disk log that gives the store durability.
///
/// Every accepted mutation is recorded as one binary record:
///
/// ```text
/// ┌──────────────────┬───────────┬────────────────────┬─────────────┐
/// │ key_len (u64 LE) │ key bytes │ value_len (u64 LE) │ value bytes │
/// └──────────────────┴───────────┴────────────────────┴─────────────┘
/// ```
///
/// There is no header, no checksum, and no separator beyond the length
/// prefixes, so (de)serialization is driven entirely by length framing and
/// is safe for keys and values containing any byte. Lengths are fixed at
/// 64-bit little-endian regardless of platform.
///
/// Replaying the log front-to-back as insert-or-overwrite reconstructs the
/// index state as of the last successful write. [`Store::open`] performs
/// that replay; deletions are handled by rewriting the log without the
/// deleted key via [`compact_without`].
///
/// [`Store::open`]: crate::Store::open
/// [`compact_without`]: CommandLog::compact_without
#[derive(Debug)]
pub struct CommandLog {
    path: PathBuf,
}

impl CommandLog {
    /// creates a handle for the log file at `path` (the file itself is
    /// created lazily by the first append)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CommandLog { path: path.into() }
    }

    /// the path of the underlying log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rejects a key or value [`replay`] would refuse to decode. Nothing is
    /// written; callers gate on this before mutating any state the log is
    /// supposed to mirror.
    ///
    /// [`replay`]: CommandLog::replay
    pub fn check_record(key: &[u8], value: &[u8]) -> Result<()> {
        check_payload_len(key.len(), "key")?;
        check_payload_len(value.len(), "value")
    }

    /// Appends one record for `key`/`value`, opening the file for append
    /// and flushing before returning. Payloads over [`MAX_PAYLOAD_LEN`] are
    /// rejected without touching the file.
    pub fn append(&self, key: &[u8], value: &[u8]) -> Result<()> {
        Self::check_record(key, value)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        write_record(&mut writer, key, value)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads every decodable record front-to-back.
    ///
    /// A missing file yields an empty history. A truncated or undecodable
    /// trailing record (e.g. after a crash mid-append) is logged and the
    /// intact prefix is returned; replay never fails on a partial write.
    pub fn replay(&self) -> Result<Vec<(Buffer, Buffer)>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(ref e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = BufReader::new(file);
        let mut records = Vec::new();
        loop {
            match next_record(&mut reader) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => break,
                Err(KvError::Corruption(reason)) => {
                    warn!(
                        "dropping undecodable tail of log {:?}: {}",
                        self.path, reason
                    );
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }

    /// Rewrites the log, dropping every record whose key byte-matches
    /// `key`. The rewrite goes to a sibling temp file which is then renamed
    /// over the log, so a crash mid-compaction leaves the old log intact.
    ///
    /// This is a full O(log size) pass and is called with the store's
    /// exclusive lock held; delete-heavy workloads pay for it.
    pub fn compact_without(&self, key: &[u8]) -> Result<()> {
        let retained: Vec<_> = self
            .replay()?
            .into_iter()
            .filter(|(k, _)| k.as_bytes() != key)
            .collect();

        let tmp_path = self.path.with_extension("compact");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            for (k, v) in &retained {
                write_record(&mut writer, k, v)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

fn check_payload_len(len: usize, what: &str) -> Result<()> {
    if len as u64 > MAX_PAYLOAD_LEN {
        return Err(KvError::Protocol(format!(
            "{} length {} exceeds the {} byte limit",
            what, len, MAX_PAYLOAD_LEN
        )));
    }
    Ok(())
}

fn write_record<W: Write>(writer: &mut W, key: &[u8], value: &[u8]) -> Result<()> {
    writer.write_all(&(key.len() as u64).to_le_bytes())?;
    writer.write_all(key)?;
    writer.write_all(&(value.len() as u64).to_le_bytes())?;
    writer.write_all(value)?;
    Ok(())
}

/// Decodes the next record, returning `Ok(None)` on a clean end-of-file and
/// `KvError::Corruption` when the file ends inside a record.
fn next_record<R: Read>(reader: &mut R) -> Result<Option<(Buffer, Buffer)>> {
    let key_len = match read_len(reader, true)? {
        Some(n) => n,
        None => return Ok(None),
    };
    let key = read_payload(reader, key_len, "key")?;
    let value_len = read_len(reader, false)?
        .ok_or_else(|| KvError::Corruption("record ends before value length".to_string()))?;
    let value = read_payload(reader, value_len, "value")?;
    Ok(Some((key, value)))
}

/// Reads one u64 LE length field. `at_boundary` marks a position where
/// end-of-file is legitimate; a partial field is corruption either way.
fn read_len<R: Read>(reader: &mut R, at_boundary: bool) -> Result<Option<u64>> {
    let mut buf = [0u8; 8];
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            if filled == 0 && at_boundary {
                return Ok(None);
            }
            return Err(KvError::Corruption(format!(
                "length field cut short at {} of 8 bytes",
                filled
            )));
        }
        filled += n;
    }
    Ok(Some(u64::from_le_bytes(buf)))
}

fn read_payload<R: Read>(reader: &mut R, len: u64, what: &str) -> Result<Buffer> {
    if len > MAX_PAYLOAD_LEN {
        return Err(KvError::Corruption(format!(
            "{} length {} exceeds the {} byte limit",
            what, len, MAX_PAYLOAD_LEN
        )));
    }
    let mut payload = vec![0u8; len as usize];
    reader
        .read_exact(&mut payload)
        .map_err(|_| KvError::Corruption(format!("record ends inside {} payload", what)))?;
    Ok(Buffer::from(payload))
}
