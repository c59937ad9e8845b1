//! TIFF/EXIF reader: walks the IFD forest and produces a [`TiffContents`]
//! tree of raw, undecoded fields.
//!
//! TIFF/EXIF files contain one or more IFDs. Each entry is 12 bytes:
//! tag(u16), type(u16), count(u32), value-or-offset(4 bytes). BigTIFF
//! (version 43) is not a format any EXIF container uses and is rejected
//! at the header.
//!
//! Reference: TIFF 6.0 specification, Section 2.

use std::collections::HashSet;

use crate::model::{DirType, ThumbnailDescriptor, TiffContents, TiffDirectory, TiffField, TiffHeader};
use crate::tiff_writer::tags;
use crate::{ByteOrder, Error, ExifFormat, Result};

const MAX_IFD_ENTRIES: u64 = 10_000;

/// Parse a complete TIFF/EXIF byte stream, starting from the byte-order
/// marker, into its directory forest.
pub fn read_tiff(data: &[u8]) -> Result<TiffContents> {
    let header = parse_header(data)?;
    let mut walker =
        Walker { data, byte_order: header.byte_order, visited: HashSet::new(), directories: Vec::new() };
    walker.walk(header.first_ifd_offset, DirType::ROOT)?;

    if walker.directories.is_empty() {
        return Err(Error::NoDirectories);
    }

    Ok(TiffContents { header, directories: walker.directories })
}

/// Parse the 8-byte header and return byte order, version, and the offset
/// of IFD0. Only classic TIFF (version 42) is accepted; BigTIFF (43) is
/// rejected the same as any other unrecognized version.
pub fn parse_header(data: &[u8]) -> Result<TiffHeader> {
    if data.len() < 8 {
        return Err(Error::UnexpectedEof { need: 8, have: data.len() });
    }

    let byte_order = ByteOrder::from_marker([data[0], data[1]])?;
    let version = byte_order.read_u16([data[2], data[3]]);

    match version {
        42 => {
            let offset = byte_order.read_u32([data[4], data[5], data[6], data[7]]);
            Ok(TiffHeader { byte_order, version, first_ifd_offset: offset as u64 })
        }
        other => Err(Error::InvalidTiffMagic(other)),
    }
}

struct Walker<'a> {
    data: &'a [u8],
    byte_order: ByteOrder,
    visited: HashSet<u64>,
    directories: Vec<TiffDirectory>,
}

impl<'a> Walker<'a> {
    fn walk(&mut self, offset: u64, dir_type: DirType) -> Result<()> {
        if offset as usize >= self.data.len() {
            return Ok(());
        }
        if !self.visited.insert(offset) {
            // cycle: a directory at this offset is already on the path.
            return Ok(());
        }

        match self.read_directory(offset, dir_type) {
            Ok(mut dir) => {
                self.resolve_sub_directories(&mut dir);
                let next = dir.next_offset;
                self.directories.push(dir);
                if let Some(next_type) = dir_type.next_in_chain() {
                    if next > 0 {
                        self.walk(next, next_type)?;
                    }
                }
                Ok(())
            }
            Err(e) if dir_type.tolerates_errors() => {
                tracing::warn!(offset, %dir_type, error = %e, "dropping unreadable IFD1 directory");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn resolve_sub_directories(&mut self, dir: &mut TiffDirectory) {
        for &(tag, derive) in &[
            (tags::EXIF_IFD, DerivedDir::Fixed(DirType::EXIF)),
            (tags::GPS_IFD, DerivedDir::Fixed(DirType::GPS)),
            (tags::INTEROP_IFD, DerivedDir::Fixed(DirType::INTEROP)),
            (tags::SUB_IFDS, DerivedDir::SubIfds),
        ] {
            let Some(field) = dir.fields.iter().find(|f| f.tag == tag) else { continue };
            let Ok(value) = field.decoded_value() else { continue };
            let offsets = match value.as_u32_vec() {
                Some(v) if !v.is_empty() => v,
                _ => continue,
            };

            let mut any_failed = false;
            match derive {
                DerivedDir::Fixed(target) => {
                    if self.walk(offsets[0] as u64, target).is_err() {
                        any_failed = true;
                    }
                }
                DerivedDir::SubIfds => {
                    for (i, &off) in offsets.iter().enumerate() {
                        let target = match i + 1 {
                            1 => DirType::EXIF_SUB_IFD1,
                            2 => DirType::EXIF_SUB_IFD2,
                            3 => DirType::EXIF_SUB_IFD3,
                            _ => DirType(5),
                        };
                        if self.walk(off as u64, target).is_err() {
                            any_failed = true;
                        }
                    }
                }
            }

            if any_failed {
                dir.fields.retain(|f| f.tag != tag);
            }
        }

        if let Some(thumb) = self.capture_thumbnail(dir) {
            dir.thumbnail = Some(thumb);
        }
    }

    fn capture_thumbnail(&self, dir: &TiffDirectory) -> Option<ThumbnailDescriptor> {
        let offset_field = dir.fields.iter().find(|f| f.tag == tags::JPEG_INTERCHANGE_FORMAT)?;
        let length_field = dir.fields.iter().find(|f| f.tag == tags::JPEG_INTERCHANGE_FORMAT_LENGTH)?;
        let offset = offset_field.decoded_value().ok()?.as_u32()? as usize;
        let declared_len = length_field.decoded_value().ok()?.as_u32()? as usize;

        if offset >= self.data.len() {
            return None;
        }
        let end = offset.saturating_add(declared_len).min(self.data.len());
        let truncated = offset + declared_len > self.data.len();
        Some(ThumbnailDescriptor { data: self.data[offset..end].to_vec(), truncated })
    }

    fn read_directory(&self, offset: u64, dir_type: DirType) -> Result<TiffDirectory> {
        let byte_order = self.byte_order();
        let base = offset as usize;
        if base + 2 > self.data.len() {
            return Err(Error::IfdOffsetOutOfBounds(offset as u32, self.data.len()));
        }

        let count = byte_order.read_u16([self.data[base], self.data[base + 1]]);
        if count as u64 > MAX_IFD_ENTRIES {
            return Err(Error::TooManyIfdEntries(count, MAX_IFD_ENTRIES as u16));
        }

        let mut fields = Vec::with_capacity(count as usize);
        for i in 0..count as usize {
            let entry_offset = base + 2 + i * 12;
            match self.read_entry_classic(entry_offset, dir_type, i as u32) {
                Ok(Some(field)) => fields.push(field),
                Ok(None) => {}
                Err(e) if e.is_recoverable() => {
                    tracing::debug!(index = i, error = %e, "skipping malformed IFD entry");
                }
                Err(e) => return Err(e),
            }
        }

        let next_pos = base + 2 + count as usize * 12;
        let next_offset = if next_pos + 4 <= self.data.len() {
            byte_order.read_u32([
                self.data[next_pos], self.data[next_pos + 1], self.data[next_pos + 2], self.data[next_pos + 3],
            ]) as u64
        } else {
            0
        };

        Ok(TiffDirectory { dir_type, fields, offset, next_offset, byte_order, thumbnail: None })
    }

    fn read_entry_classic(&self, offset: usize, dir_type: DirType, entry_index: u32) -> Result<Option<TiffField>> {
        if offset + 12 > self.data.len() {
            return Err(Error::IfdOffsetOutOfBounds(offset as u32, self.data.len()));
        }
        let byte_order = self.byte_order();
        let tag = byte_order.read_u16([self.data[offset], self.data[offset + 1]]);
        if tag == 0 && dir_type != DirType::GPS {
            return Ok(None);
        }

        let format_id = byte_order.read_u16([self.data[offset + 2], self.data[offset + 3]]);
        let format = ExifFormat::from_u16(format_id)?;
        let count = byte_order.read_u32([
            self.data[offset + 4], self.data[offset + 5], self.data[offset + 6], self.data[offset + 7],
        ]);
        let inline = &self.data[offset + 8..offset + 12];

        let value_size = format
            .size()
            .checked_mul(count as usize)
            .ok_or(Error::ValueSizeOverflow { format_size: format.size(), count })?;

        let raw_bytes = if value_size <= 4 {
            inline[..value_size].to_vec()
        } else {
            let data_offset = byte_order.read_u32([inline[0], inline[1], inline[2], inline[3]]) as usize;
            if data_offset + value_size > self.data.len() {
                return Err(Error::ValueOutOfBounds(data_offset as u32, value_size, self.data.len()));
            }
            self.data[data_offset..data_offset + value_size].to_vec()
        };

        let mut inline_word = [0u8; 8];
        inline_word[..4].copy_from_slice(inline);

        Ok(Some(TiffField { tag, dir_type, field_type: format, count, raw_bytes, inline_word, byte_order, entry_index }))
    }

    fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }
}

enum DerivedDir {
    Fixed(DirType),
    SubIfds,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le_header(first_ifd: u32) -> Vec<u8> {
        let mut v = vec![b'I', b'I', 42, 0];
        v.extend_from_slice(&first_ifd.to_le_bytes());
        v
    }

    #[test]
    fn rejects_bad_byte_order_marker() {
        let data = [b'X', b'X', 42, 0, 8, 0, 0, 0];
        assert!(matches!(read_tiff(&data), Err(Error::InvalidByteOrder(_))));
    }

    #[test]
    fn empty_ifd0_is_not_an_error() {
        // IFD0 at offset 8 with zero entries and no next directory.
        let mut data = le_header(8);
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        let contents = read_tiff(&data).unwrap();
        assert_eq!(contents.directories.len(), 1);
        assert!(contents.directory(DirType::ROOT).unwrap().fields.is_empty());
    }

    #[test]
    fn bigtiff_version_is_rejected() {
        let data = [b'I', b'I', 43, 0, 8, 0, 0, 0, 0, 0, 0, 0, 16, 0, 0, 0];
        assert!(matches!(parse_header(&data), Err(Error::InvalidTiffMagic(43))));
    }

    #[test]
    fn directory_offset_past_eof_yields_no_directories() {
        let data = le_header(1000);
        assert!(matches!(read_tiff(&data), Err(Error::NoDirectories)));
    }

    #[test]
    fn cyclic_next_offset_terminates() {
        // IFD0 at offset 8, zero entries, next-IFD points back to itself.
        let mut data = le_header(8);
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&8u32.to_le_bytes());
        let contents = read_tiff(&data).unwrap();
        // The cycle means IFD1 (same offset) is never parsed a second time.
        assert_eq!(contents.directories.len(), 1);
    }

    #[test]
    fn reads_inline_orientation_field() {
        // IFD0 at offset 8: one entry (Orientation=6, SHORT), no next IFD.
        let mut data = le_header(8);
        data.extend_from_slice(&1u16.to_le_bytes()); // entry count
        data.extend_from_slice(&tags::ORIENTATION.to_le_bytes());
        data.extend_from_slice(&(ExifFormat::UInt16 as u16).to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes()); // count
        data.extend_from_slice(&6u16.to_le_bytes());
        data.extend_from_slice(&[0, 0]); // pad inline word to 4 bytes
        data.extend_from_slice(&0u32.to_le_bytes()); // next IFD

        let contents = read_tiff(&data).unwrap();
        let field = contents.field(DirType::ROOT, tags::ORIENTATION).unwrap();
        assert_eq!(field.decoded_value().unwrap().as_u32(), Some(6));
    }

    #[test]
    fn gps_ifd_keeps_tag_zero() {
        let mut data = le_header(8);
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes()); // GPSVersionID = tag 0
        data.extend_from_slice(&(ExifFormat::UInt8 as u16).to_le_bytes());
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(&[2, 3, 0, 0]);
        data.extend_from_slice(&0u32.to_le_bytes());

        let header = parse_header(&data).unwrap();
        let mut walker =
            Walker { data: &data, byte_order: header.byte_order, visited: HashSet::new(), directories: Vec::new() };
        walker.walk(header.first_ifd_offset, DirType::GPS).unwrap();
        assert_eq!(walker.directories[0].fields.len(), 1);
        assert_eq!(walker.directories[0].fields[0].tag, 0);
    }

    #[test]
    fn oob_sub_ifd_offset_drops_pointer_field_only() {
        // IFD0 with one ExifOffset field pointing out of bounds.
        let mut data = le_header(8);
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&tags::EXIF_IFD.to_le_bytes());
        data.extend_from_slice(&(ExifFormat::UInt32 as u16).to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&9999u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());

        let contents = read_tiff(&data).unwrap();
        let ifd0 = contents.directory(DirType::ROOT).unwrap();
        assert!(ifd0.fields.is_empty());
    }
}
