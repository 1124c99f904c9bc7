use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{In, Reader, Tag, Value};

use super::MetadataError;

/// Read the raw `DateTimeOriginal` value, e.g. `2020:05:01 12:30:00`.
/// EXIF datetimes have no timezone info - they are local time as-is.
pub fn read_date_time_original(path: &Path) -> Result<String, MetadataError> {
    let file = File::open(path).map_err(|e| MetadataError::Unreadable(e.to_string()))?;
    let exif = Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .map_err(|e| match e {
            exif::Error::NotFound(_) => MetadataError::MissingField,
            other => MetadataError::Malformed(other.to_string()),
        })?;

    let field = exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .ok_or(MetadataError::MissingField)?;

    // display_value() reformats datetimes with dashes and quotes, so take the raw ASCII
    match &field.value {
        Value::Ascii(values) => values
            .first()
            .map(|raw| String::from_utf8_lossy(raw).trim_end_matches('\0').trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(MetadataError::MissingField),
        _ => Err(MetadataError::Malformed(format!(
            "unexpected DateTimeOriginal value: {}",
            field.display_value()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    /// Big-endian TIFF with IFD0 -> Exif IFD -> DateTimeOriginal.
    fn tiff_with_date(date: &[u8; 19]) -> Vec<u8> {
        let mut t = Vec::new();
        t.extend_from_slice(b"MM\x00\x2a");
        t.extend_from_slice(&8u32.to_be_bytes());
        // IFD0: one entry, ExifIFDPointer
        t.extend_from_slice(&1u16.to_be_bytes());
        t.extend_from_slice(&0x8769u16.to_be_bytes());
        t.extend_from_slice(&4u16.to_be_bytes());
        t.extend_from_slice(&1u32.to_be_bytes());
        t.extend_from_slice(&26u32.to_be_bytes());
        t.extend_from_slice(&0u32.to_be_bytes());
        // Exif IFD at 26: DateTimeOriginal, ASCII, 20 bytes at 44
        t.extend_from_slice(&1u16.to_be_bytes());
        t.extend_from_slice(&0x9003u16.to_be_bytes());
        t.extend_from_slice(&2u16.to_be_bytes());
        t.extend_from_slice(&20u32.to_be_bytes());
        t.extend_from_slice(&44u32.to_be_bytes());
        t.extend_from_slice(&0u32.to_be_bytes());
        t.extend_from_slice(date);
        t.push(0);
        t
    }

    fn jpeg_with_exif(tiff: &[u8]) -> Vec<u8> {
        let mut j = vec![0xFF, 0xD8, 0xFF, 0xE1];
        j.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
        j.extend_from_slice(b"Exif\0\0");
        j.extend_from_slice(tiff);
        j.extend_from_slice(&[0xFF, 0xD9]);
        j
    }

    #[test]
    fn test_reads_date_time_original() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("DSC_1000.JPG");
        let jpeg = jpeg_with_exif(&tiff_with_date(b"2020:05:01 12:30:00"));
        File::create(&path).unwrap().write_all(&jpeg).unwrap();
        assert_eq!(read_date_time_original(&path).unwrap(), "2020:05:01 12:30:00");
    }

    #[test]
    fn test_non_image_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fake.jpg");
        File::create(&path).unwrap().write_all(b"not a jpeg").unwrap();
        assert!(read_date_time_original(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let dir = tempdir().unwrap();
        let err = read_date_time_original(&dir.path().join("nope.jpg")).unwrap_err();
        assert!(matches!(err, MetadataError::Unreadable(_)));
    }
}
