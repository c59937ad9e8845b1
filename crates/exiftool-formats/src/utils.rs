//! Shared utilities for format parsers.

use crate::{Error, ReadSeek, Result};
use exiftool_attrs::AttrValue;
use exiftool_core::model::TiffOutputField;
use exiftool_core::{ExifFormat, RawValue};
use std::io::SeekFrom;

/// Maximum file size to read into memory (100 MB).
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Read entire file into memory with size limit check.
///
/// Returns error if file exceeds MAX_FILE_SIZE to prevent OOM attacks.
pub fn read_with_limit<R: ReadSeek + ?Sized>(reader: &mut R) -> Result<Vec<u8>> {
    read_with_limit_custom(reader, MAX_FILE_SIZE)
}

/// Read entire file into memory with custom size limit.
pub fn read_with_limit_custom<R: ReadSeek + ?Sized>(reader: &mut R, max_size: u64) -> Result<Vec<u8>> {
    let current = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    let size = end - current;
    reader.seek(SeekFrom::Start(current))?;

    if size > max_size {
        return Err(Error::FileTooLarge(size, max_size));
    }

    let mut data = Vec::with_capacity(size as usize);
    reader.read_to_end(&mut data)?;
    Ok(data)
}

/// Convert a decoded TIFF field value into an `AttrValue`.
///
/// Single source of truth for TIFF/EXIF → Attr conversion used by every
/// container parser (JPEG, TIFF, RAF, HEIC, JXL).
pub fn raw_value_to_attr(value: &RawValue) -> AttrValue {
    match value {
        RawValue::String(s) => AttrValue::Str(s.clone()),
        RawValue::UInt8(v) if v.len() == 1 => AttrValue::UInt(v[0] as u32),
        RawValue::UInt16(v) if v.len() == 1 => AttrValue::UInt(v[0] as u32),
        RawValue::UInt32(v) if v.len() == 1 => AttrValue::UInt(v[0]),
        RawValue::UInt64(v) if v.len() == 1 => AttrValue::UInt64(v[0]),
        RawValue::Int8(v) if v.len() == 1 => AttrValue::Int(v[0] as i32),
        RawValue::Int16(v) if v.len() == 1 => AttrValue::Int(v[0] as i32),
        RawValue::Int32(v) if v.len() == 1 => AttrValue::Int(v[0]),
        RawValue::URational(v) if v.len() == 1 => AttrValue::URational(v[0].num, v[0].den),
        RawValue::SRational(v) if v.len() == 1 => AttrValue::Rational(v[0].num, v[0].den),
        RawValue::Float(v) if v.len() == 1 => AttrValue::Float(v[0]),
        RawValue::Double(v) if v.len() == 1 => AttrValue::Double(v[0]),
        RawValue::Undefined(v) => AttrValue::Bytes(v.clone()),
        other => AttrValue::Str(other.to_string()),
    }
}

/// Best-effort reverse of [`raw_value_to_attr`] for `JpegWriter::write_metadata`'s
/// convenience path: the handful of top-level IFD0 string/int tags most
/// callers set by name. Anything outside this set (sub-IFD tags, GPS,
/// dates) goes through the update coordinator's typed path instead, which
/// builds a [`exiftool_core::model::TiffOutputSet`] directly.
pub fn attr_to_output_field(name: &str, value: &AttrValue) -> Option<TiffOutputField> {
    use exiftool_core::tiff_writer::tags;

    let tag = match name {
        "Make" => tags::MAKE,
        "Model" => tags::MODEL,
        "Software" => tags::SOFTWARE,
        "Artist" => tags::ARTIST,
        "Copyright" => tags::COPYRIGHT,
        "ImageDescription" => tags::IMAGE_DESCRIPTION,
        "Orientation" => tags::ORIENTATION,
        _ => return None,
    };

    match value {
        AttrValue::Str(s) => {
            let mut bytes = s.as_bytes().to_vec();
            bytes.push(0);
            Some(TiffOutputField::new(tag, ExifFormat::String, bytes.len() as u32, bytes))
        }
        AttrValue::UInt(n) if *n <= u32::from(u16::MAX) => {
            Some(TiffOutputField::new(tag, ExifFormat::UInt16, 1, (*n as u16).to_le_bytes().to_vec()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_with_limit_ok() {
        let data = vec![1u8, 2, 3, 4, 5];
        let mut cursor = Cursor::new(data.clone());
        let result = read_with_limit_custom(&mut cursor, 100).unwrap();
        assert_eq!(result, data);
    }

    #[test]
    fn read_with_limit_exceeds() {
        let data = vec![0u8; 100];
        let mut cursor = Cursor::new(data);
        let result = read_with_limit_custom(&mut cursor, 50);
        assert!(matches!(result, Err(Error::FileTooLarge(100, 50))));
    }

    #[test]
    fn string_value_converts_to_str() {
        let v = RawValue::String("Canon".into());
        assert!(matches!(raw_value_to_attr(&v), AttrValue::Str(s) if s == "Canon"));
    }

    #[test]
    fn make_name_maps_to_tiff_tag() {
        let field = attr_to_output_field("Make", &AttrValue::Str("Canon".into())).unwrap();
        assert_eq!(field.tag, exiftool_core::tiff_writer::tags::MAKE);
        assert_eq!(field.data, b"Canon\0".to_vec());
    }

    #[test]
    fn unknown_name_has_no_mapping() {
        assert!(attr_to_output_field("FNumber", &AttrValue::Float(2.8)).is_none());
    }
}
