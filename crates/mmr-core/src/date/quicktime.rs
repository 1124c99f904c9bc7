use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use chrono::{DateTime, Utc};

use super::MetadataError;

/// Seconds between 1904-01-01 (QuickTime epoch) and 1970-01-01.
const QT_TO_UNIX_OFFSET: i64 = 2_082_844_800;

#[derive(Debug, Clone, Copy)]
struct AtomRange {
    data_start: u64,
    data_end: u64,
}

/// Read the creation time of the first track (`moov/trak/tkhd`) as
/// `YYYY:MM:DD HH:MM:SS`, in UTC as stored in the file.
pub fn read_track_create_date(path: &Path) -> Result<String, MetadataError> {
    let file = File::open(path).map_err(|e| MetadataError::Unreadable(e.to_string()))?;
    let file_len = file
        .metadata()
        .map_err(|e| MetadataError::Unreadable(e.to_string()))?
        .len();
    let mut reader = BufReader::new(file);

    let moov = find_atom(&mut reader, 0, file_len, *b"moov")?.ok_or(MetadataError::MissingField)?;
    let trak = find_atom(&mut reader, moov.data_start, moov.data_end, *b"trak")?
        .ok_or(MetadataError::MissingField)?;
    let tkhd = find_atom(&mut reader, trak.data_start, trak.data_end, *b"tkhd")?
        .ok_or(MetadataError::MissingField)?;

    let qt_seconds = read_creation_time(&mut reader, tkhd)?;
    if qt_seconds == 0 {
        return Err(MetadataError::MissingField);
    }
    let unix = (qt_seconds as i64)
        .checked_sub(QT_TO_UNIX_OFFSET)
        .ok_or_else(|| MetadataError::Malformed(format!("creation time {} before 1970", qt_seconds)))?;
    let utc: DateTime<Utc> = DateTime::from_timestamp(unix, 0)
        .ok_or_else(|| MetadataError::Malformed(format!("creation time {} out of range", qt_seconds)))?;
    Ok(utc.format("%Y:%m:%d %H:%M:%S").to_string())
}

fn find_atom<R: Read + Seek>(
    reader: &mut R,
    start: u64,
    end: u64,
    atom_type: [u8; 4],
) -> Result<Option<AtomRange>, MetadataError> {
    let mut offset = start;
    while offset + 8 <= end {
        reader.seek(SeekFrom::Start(offset)).map_err(malformed)?;
        let mut header = [0u8; 8];
        reader.read_exact(&mut header).map_err(malformed)?;
        let mut atom_size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as u64;
        let atom_kind = [header[4], header[5], header[6], header[7]];
        let mut header_size = 8u64;

        if atom_size == 1 {
            let mut ext = [0u8; 8];
            reader.read_exact(&mut ext).map_err(malformed)?;
            atom_size = u64::from_be_bytes(ext);
            header_size = 16;
        } else if atom_size == 0 {
            // extends to the end of the enclosing range
            atom_size = end - offset;
        }
        if atom_size < header_size {
            return Err(MetadataError::Malformed(format!(
                "atom '{}' has invalid size {}",
                String::from_utf8_lossy(&atom_kind),
                atom_size
            )));
        }
        let atom_end = offset.saturating_add(atom_size).min(end);

        if atom_kind == atom_type {
            return Ok(Some(AtomRange {
                data_start: offset + header_size,
                data_end: atom_end,
            }));
        }
        offset = atom_end;
    }
    Ok(None)
}

fn read_creation_time<R: Read + Seek>(reader: &mut R, tkhd: AtomRange) -> Result<u64, MetadataError> {
    reader.seek(SeekFrom::Start(tkhd.data_start)).map_err(malformed)?;
    let mut version_flags = [0u8; 4];
    reader.read_exact(&mut version_flags).map_err(malformed)?;
    if version_flags[0] == 1 {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf).map_err(malformed)?;
        Ok(u64::from_be_bytes(buf))
    } else {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).map_err(malformed)?;
        Ok(u32::from_be_bytes(buf) as u64)
    }
}

fn malformed(e: std::io::Error) -> MetadataError {
    MetadataError::Malformed(e.to_string())
}
