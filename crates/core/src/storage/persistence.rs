//! Disk persistence for the dictionary using bincode serialization.
//!
//! The dictionary is serialized to `dictionary.tdb`. Writes use atomic
//! temp-file + rename to prevent corruption on crash. A CRC32 checksum is
//! appended as a footer: `[magic "TDC1"][u32 CRC32 BE]`.

use crate::alphabet::Alphabet;
use crate::config;
use crate::storage::dictionary::DictionaryData;
use std::fs;
use std::io;
use std::path::Path;

/// Magic bytes written before the CRC32 footer.
const SNAPSHOT_CRC_MAGIC: &[u8; 4] = b"TDC1";

/// Save dictionary data to `dir` with an atomic write and CRC32 footer.
pub fn save_snapshot(data: &DictionaryData, dir: &str) -> io::Result<()> {
    let bytes = bincode::serialize(data).map_err(|e| io::Error::other(e.to_string()))?;
    let crc = crc32fast::hash(&bytes);

    fs::create_dir_all(dir)?;
    let path = Path::new(dir).join(config::SNAPSHOT_FILE_NAME);
    let tmp_path = Path::new(dir).join(format!("{}.tmp", config::SNAPSHOT_FILE_NAME));

    let mut output = Vec::with_capacity(bytes.len() + 8);
    output.extend_from_slice(&bytes);
    output.extend_from_slice(SNAPSHOT_CRC_MAGIC);
    output.extend_from_slice(&crc.to_be_bytes());

    fs::write(&tmp_path, &output)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
    }
    fs::rename(&tmp_path, &path)?;

    tracing::info!(
        entries = data.entries.len(),
        bytes = bytes.len(),
        "Saved dictionary snapshot (CRC32={:#010x})",
        crc
    );
    Ok(())
}

/// Load a snapshot, verifying its CRC32 footer, invariants, and alphabet.
pub fn load_snapshot(path: &Path, alphabet: &Alphabet) -> io::Result<DictionaryData> {
    let raw = fs::read(path)?;

    if raw.len() < 8 || &raw[raw.len() - 8..raw.len() - 4] != SNAPSHOT_CRC_MAGIC {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Snapshot {:?} has no CRC32 footer", path),
        ));
    }
    let payload = &raw[..raw.len() - 8];
    let stored_crc = u32::from_be_bytes([
        raw[raw.len() - 4],
        raw[raw.len() - 3],
        raw[raw.len() - 2],
        raw[raw.len() - 1],
    ]);
    let computed_crc = crc32fast::hash(payload);
    if computed_crc != stored_crc {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Snapshot CRC32 mismatch: expected {:#010x}, got {:#010x}. File may be corrupted: {:?}",
                stored_crc, computed_crc, path
            ),
        ));
    }

    let data: DictionaryData = bincode::deserialize(payload)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

    if data.alphabet != alphabet.to_string() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "snapshot alphabet '{}' differs from configured alphabet '{}'; reseed required",
                data.alphabet, alphabet
            ),
        ));
    }

    data.validate().map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("snapshot validation failed: {}", e),
        )
    })?;

    tracing::info!(entries = data.entries.len(), "Loaded dictionary snapshot");
    Ok(data)
}

/// Load the snapshot in `dir`, or `None` if none has been written yet.
pub fn load_snapshot_from_dir(dir: &str, alphabet: &Alphabet) -> io::Result<Option<DictionaryData>> {
    let path = Path::new(dir).join(config::SNAPSHOT_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }
    load_snapshot(&path, alphabet).map(Some)
}
