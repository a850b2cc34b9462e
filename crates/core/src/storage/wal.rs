//! Synchronous Write-Ahead Log (WAL) for crash recovery.
//!
//! Every committed batch is appended to the WAL before it is applied in memory.
//! Each entry is framed as `[u32 length BE][u32 CRC32 BE][bincode payload]`
//! and durably flushed with `fsync`.
//!
//! The file only ever holds whole frames once it accepts appends: a failed
//! append is cut back to the previous frame boundary, and replay cuts off a
//! torn or corrupt tail (keeping a copy in `wal.bin.tail`) so later batches
//! are never written behind bytes that replay cannot get past.

use crate::config;
use crate::entry::NewEntry;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

const FRAME_HEADER_LEN: usize = 8;

/// A batch of `MAX_BATCH_SIZE` maximum-length words fits well below this.
const MAX_RECORD_BYTES: usize = 64 * 1024 * 1024;

/// A single mutation entry in the write-ahead log.
///
/// Each variant represents an atomic operation that can be replayed on startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WalEntry {
    /// One committed ingestion batch.
    InsertBatch { entries: Vec<NewEntry> },
}

/// Diagnostic statistics from a WAL replay.
#[derive(Debug, Default)]
pub struct ReplayStats {
    /// Number of entries successfully deserialized.
    pub success: usize,
    /// Number of entries skipped due to deserialization errors (CRC was valid).
    pub skipped: usize,
    /// Number of CRC mismatches encountered (replay stopped).
    pub crc_errors: usize,
    /// Whether replay was terminated by a truncated entry.
    pub truncated: bool,
    /// Length of the prefix made of whole, checksum-valid frames.
    pub valid_bytes: u64,
    /// Bytes cut from the end of the file after the valid prefix.
    pub discarded_bytes: u64,
}

impl ReplayStats {
    pub fn has_errors(&self) -> bool {
        self.skipped > 0 || self.crc_errors > 0 || self.truncated
    }
}

/// Synchronous append-only write-ahead log with CRC32 integrity checks.
///
/// Each [`append`](SyncWriteAheadLog::append) call serializes, writes, flushes,
/// and fsyncs the entry to disk before returning.
pub struct SyncWriteAheadLog {
    writer: Mutex<BufWriter<File>>,
    /// Write gate: freeze() takes exclusive, append() takes shared.
    write_gate: parking_lot::RwLock<()>,
    /// Set when a failed append could not be rolled back; cleared by truncate or replay.
    poisoned: AtomicBool,
    path: PathBuf,
}

impl std::fmt::Debug for SyncWriteAheadLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncWriteAheadLog")
            .field("path", &self.path)
            .finish()
    }
}

impl SyncWriteAheadLog {
    /// Open or create `wal.bin` in `data_dir` in append mode.
    pub fn new(data_dir: &str) -> io::Result<Self> {
        fs::create_dir_all(data_dir)?;
        let path = PathBuf::from(data_dir).join(config::WAL_FILE_NAME);
        let writer = Mutex::new(BufWriter::new(open_append(&path)?));
        let write_gate = parking_lot::RwLock::new(());

        Ok(Self {
            writer,
            write_gate,
            poisoned: AtomicBool::new(false),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a WAL entry synchronously.
    ///
    /// Serializes the entry, writes, flushes, and fsyncs to disk before returning.
    /// On failure the file is cut back to its length before the call, so an
    /// entry reported as failed never reappears on replay.
    pub fn append(&self, entry: &WalEntry) -> io::Result<()> {
        let framed = serialize_and_frame(entry)?;

        let _gate = self.write_gate.read();
        let mut w = self.writer.lock();
        if self.poisoned.load(Ordering::Acquire) {
            return Err(io::Error::other(
                "WAL holds a partial record from a failed append; replay or truncate it first",
            ));
        }
        let start = w.get_ref().metadata()?.len();
        let written = w
            .write_all(&framed)
            .and_then(|()| w.flush())
            .and_then(|()| w.get_mut().sync_all());
        if let Err(e) = written {
            tracing::error!(offset = start, "WAL append failed, rolling back: {}", e);
            if let Err(rollback) = self.rollback_to(&mut w, start) {
                tracing::error!("WAL rollback failed, refusing further appends: {}", rollback);
                self.poisoned.store(true, Ordering::Release);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Cuts the file back to `len` and replaces the writer, dropping any bytes
    /// still buffered in the old one.
    fn rollback_to(&self, writer: &mut BufWriter<File>, len: u64) -> io::Result<()> {
        let file = open_append(&self.path)?;
        file.set_len(len)?;
        file.sync_all()?;
        let stale = std::mem::replace(writer, BufWriter::new(file));
        let (_file, _unflushed) = stale.into_parts();
        Ok(())
    }

    /// Reads every batch record in order, verifying CRC32 checksums.
    ///
    /// Stops at the first CRC mismatch, oversized length, or torn tail; records
    /// before that point are returned. A record whose checksum holds but whose
    /// payload does not decode is skipped.
    ///
    /// Anything after the last whole frame is moved to `wal.bin.tail` and cut
    /// from the log, so the next append lands on a frame boundary.
    pub fn replay(&self) -> io::Result<(Vec<WalEntry>, ReplayStats)> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut entries = Vec::new();
        let mut stats = ReplayStats::default();

        loop {
            let payload = match read_frame(&mut reader)? {
                Frame::End => break,
                Frame::Torn => {
                    tracing::warn!(
                        records = stats.success,
                        "WAL ends mid-record, stopping replay"
                    );
                    stats.truncated = true;
                    break;
                }
                Frame::Corrupt => {
                    tracing::warn!(
                        records = stats.success,
                        "WAL record failed CRC check, stopping replay"
                    );
                    stats.crc_errors += 1;
                    break;
                }
                Frame::Payload(bytes) => bytes,
            };
            stats.valid_bytes += (FRAME_HEADER_LEN + payload.len()) as u64;
            match bincode::deserialize::<WalEntry>(&payload) {
                Ok(entry) => {
                    entries.push(entry);
                    stats.success += 1;
                }
                Err(e) => {
                    tracing::warn!("WAL record does not decode, skipping: {}", e);
                    stats.skipped += 1;
                }
            }
        }

        drop(reader);
        stats.discarded_bytes = self.discard_tail(stats.valid_bytes)?;
        Ok((entries, stats))
    }

    /// Moves bytes past `valid_len` into `wal.bin.tail` and truncates the log.
    /// Returns how many bytes were cut.
    fn discard_tail(&self, valid_len: u64) -> io::Result<u64> {
        let _gate = self.write_gate.write();
        let mut w = self.writer.lock();
        let file_len = fs::metadata(&self.path)?.len();
        if file_len <= valid_len {
            self.poisoned.store(false, Ordering::Release);
            return Ok(0);
        }

        let mut tail = Vec::new();
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(valid_len))?;
        file.read_to_end(&mut tail)?;
        fs::write(self.tail_path(), &tail)?;

        self.rollback_to(&mut w, valid_len)?;
        self.poisoned.store(false, Ordering::Release);
        let cut = file_len - valid_len;
        tracing::warn!(
            offset = valid_len,
            bytes = cut,
            tail = %self.tail_path().display(),
            "Cut unreadable WAL tail"
        );
        Ok(cut)
    }

    /// Where [`replay`](SyncWriteAheadLog::replay) keeps the last discarded tail.
    pub fn tail_path(&self) -> PathBuf {
        self.path.with_extension("bin.tail")
    }

    /// Acquire an exclusive write gate, blocking all [`append`](SyncWriteAheadLog::append) calls.
    ///
    /// Hold the returned guard while performing snapshot + truncate.
    pub fn freeze(&self) -> parking_lot::RwLockWriteGuard<'_, ()> {
        self.write_gate.write()
    }

    /// Truncate the WAL file, fsync, and reopen in append mode.
    pub fn truncate(&self) -> io::Result<()> {
        let mut writer = self.writer.lock();
        let truncated = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        truncated.sync_all()?;
        *writer = BufWriter::new(open_append(&self.path)?);
        self.poisoned.store(false, Ordering::Release);
        Ok(())
    }

    /// Current size of the WAL file in bytes.
    pub fn size_bytes(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }
}

enum Frame {
    Payload(Vec<u8>),
    /// Clean end of file on a record boundary.
    End,
    /// File ends inside a header or payload.
    Torn,
    /// Checksum mismatch or implausible length.
    Corrupt,
}

fn read_frame<R: Read>(reader: &mut R) -> io::Result<Frame> {
    let mut header = [0u8; FRAME_HEADER_LEN];
    match read_full(reader, &mut header)? {
        0 => return Ok(Frame::End),
        n if n < FRAME_HEADER_LEN => return Ok(Frame::Torn),
        _ => {}
    }
    let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let stored_crc = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);
    if len > MAX_RECORD_BYTES {
        return Ok(Frame::Corrupt);
    }

    let mut payload = vec![0u8; len];
    if read_full(reader, &mut payload)? < len {
        return Ok(Frame::Torn);
    }
    if crc32fast::hash(&payload) != stored_crc {
        return Ok(Frame::Corrupt);
    }
    Ok(Frame::Payload(payload))
}

/// Like `read_exact`, but reports how many bytes were read before EOF.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn open_append(path: &Path) -> io::Result<File> {
    let mut opts = OpenOptions::new();
    opts.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    opts.open(path)
}

/// Serialize a WAL entry into its on-disk frame format:
/// `[u32 len BE][u32 crc32 BE][bincode payload]`.
fn serialize_and_frame(entry: &WalEntry) -> io::Result<Vec<u8>> {
    let bytes = bincode::serialize(entry).map_err(|e| io::Error::other(e.to_string()))?;
    let len = u32::try_from(bytes.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "WAL entry exceeds 4 GiB"))?;
    let crc = crc32fast::hash(&bytes);

    let mut framed = Vec::with_capacity(FRAME_HEADER_LEN + bytes.len());
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(&crc.to_be_bytes());
    framed.extend_from_slice(&bytes);
    Ok(framed)
}
