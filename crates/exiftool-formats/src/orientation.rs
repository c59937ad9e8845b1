//! Fast-path single-byte patch for EXIF Orientation.
//!
//! Rewriting the whole EXIF block for an orientation-only change is
//! wasteful. When IFD0 carries an inline Orientation entry inside the
//! first APP1 segment, this locates its exact byte and overwrites it in
//! place, leaving everything else in the file untouched. The caller falls
//! back to a full EXIF rewrite whenever this returns `false`.

use exiftool_core::model::DirType;
use exiftool_core::tiff_reader;
use exiftool_core::{tiff_writer::tags::ORIENTATION, ByteOrder};

const APP1_MARKER: u8 = 0xE1;
const EXIF_HEADER: &[u8] = b"Exif\x00\x00";

/// Attempt to patch a JPEG's existing Orientation value in place.
pub fn patch_orientation(data: &mut [u8], new_orientation: u8) -> bool {
    let Some((tiff_start, tiff_end)) = find_first_exif_app1(data) else { return false };
    let Ok(contents) = tiff_reader::read_tiff(&data[tiff_start..tiff_end]) else { return false };
    let Some(ifd0) = contents.directory(DirType::ROOT) else { return false };
    let Some(field) = ifd0.field(ORIENTATION) else { return false };

    // Orientation is always SHORT/count 1, inline in the entry's 4-byte word.
    if field.raw_bytes.len() != 2 {
        return false;
    }

    let entry_offset = ifd0.offset + 2 + u64::from(field.entry_index) * 12;
    let value_word_offset = entry_offset + 8;
    let byte_offset = match field.byte_order {
        ByteOrder::LittleEndian => value_word_offset,
        ByteOrder::BigEndian => value_word_offset + 1,
    };

    let absolute = tiff_start + byte_offset as usize;
    if absolute >= tiff_end {
        return false;
    }

    data[absolute] = new_orientation;
    true
}

/// Byte range of the TIFF stream inside the first EXIF APP1 segment, if any.
fn find_first_exif_app1(data: &[u8]) -> Option<(usize, usize)> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return None;
    }
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            break;
        }
        let marker = data[pos + 1];
        if marker == 0xD9 || marker == 0xDA {
            break;
        }
        if (0xD0..=0xD7).contains(&marker) || marker == 0x01 {
            pos += 2;
            continue;
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if len < 2 || pos + 2 + len > data.len() {
            break;
        }
        let payload_start = pos + 4;
        let payload_end = pos + 2 + len;
        if marker == APP1_MARKER && data[payload_start..payload_end].starts_with(EXIF_HEADER) {
            return Some((payload_start + EXIF_HEADER.len(), payload_end));
        }
        pos = payload_end;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg_with_le_orientation(orientation: u8) -> Vec<u8> {
        let tiff: Vec<u8> = vec![
            b'I', b'I', 0x2A, 0x00, 8, 0, 0, 0, // header, IFD0 @ 8
            1, 0, // 1 entry
            0x12, 0x01, // tag 0x0112 Orientation
            3, 0, // SHORT
            1, 0, 0, 0, // count 1
            orientation, 0, 0, 0, // inline value
            0, 0, 0, 0, // next IFD = 0
        ];
        let mut app1 = EXIF_HEADER.to_vec();
        app1.extend_from_slice(&tiff);

        let mut jpeg = vec![0xFF, 0xD8, 0xFF, APP1_MARKER];
        jpeg.extend_from_slice(&((app1.len() + 2) as u16).to_be_bytes());
        jpeg.extend_from_slice(&app1);
        jpeg.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02, 0xFF, 0xD9]);
        jpeg
    }

    #[test]
    fn patches_inline_little_endian_orientation() {
        let mut jpeg = jpeg_with_le_orientation(1);
        assert!(patch_orientation(&mut jpeg, 6));

        let (start, end) = find_first_exif_app1(&jpeg).unwrap();
        let contents = tiff_reader::read_tiff(&jpeg[start..end]).unwrap();
        let field = contents.field(DirType::ROOT, ORIENTATION).unwrap();
        assert_eq!(field.decoded_value().unwrap().as_u32(), Some(6));
    }

    #[test]
    fn only_one_byte_changes() {
        let original = jpeg_with_le_orientation(1);
        let mut patched = original.clone();
        patch_orientation(&mut patched, 8);
        let diff_count = original.iter().zip(patched.iter()).filter(|(a, b)| a != b).count();
        assert_eq!(diff_count, 1);
    }

    #[test]
    fn no_app1_segment_returns_false() {
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x02, 0xFF, 0xD9];
        assert!(!patch_orientation(&mut jpeg, 3));
    }
}
