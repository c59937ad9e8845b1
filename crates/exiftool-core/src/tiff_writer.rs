//! TIFF/EXIF writer: turns a [`TiffOutputSet`] into a self-consistent TIFF
//! byte stream, synthesising the offset-carrying pointer fields and
//! patching them once every directory's final position is known.
//!
//! Layout is two explicit phases:
//! - **Phase 1 (topology):** assign every directory a tentative offset in a
//!   fixed emission order, then lay out external value blobs and the
//!   thumbnail payload after all directory blocks.
//! - **Phase 2 (offset resolution):** synthesise the pointer fields,
//!   chain `nextDirectoryOffset`, sort each directory's fields by tag id,
//!   and emit.

use std::collections::HashMap;

use crate::model::{DirType, TiffOutputField, TiffOutputSet};
use crate::{ByteOrder, Error, ExifFormat, Result};

/// Well-known tag ids the writer itself needs to reason about.
pub mod tags {
    pub const IMAGE_DESCRIPTION: u16 = 0x010E;
    pub const MAKE: u16 = 0x010F;
    pub const MODEL: u16 = 0x0110;
    pub const ORIENTATION: u16 = 0x0112;
    pub const X_RESOLUTION: u16 = 0x011A;
    pub const Y_RESOLUTION: u16 = 0x011B;
    pub const RESOLUTION_UNIT: u16 = 0x0128;
    pub const SOFTWARE: u16 = 0x0131;
    pub const DATE_TIME: u16 = 0x0132;
    pub const ARTIST: u16 = 0x013B;
    pub const SUB_IFDS: u16 = 0x014A;
    pub const COPYRIGHT: u16 = 0x8298;
    pub const EXIF_IFD: u16 = 0x8769;
    pub const GPS_IFD: u16 = 0x8825;
    pub const EXPOSURE_TIME: u16 = 0x829A;
    pub const FNUMBER: u16 = 0x829D;
    pub const EXPOSURE_PROGRAM: u16 = 0x8822;
    pub const ISO: u16 = 0x8827;
    pub const EXIF_VERSION: u16 = 0x9000;
    pub const DATE_TIME_ORIGINAL: u16 = 0x9003;
    pub const CREATE_DATE: u16 = 0x9004;
    pub const SHUTTER_SPEED: u16 = 0x9201;
    pub const APERTURE: u16 = 0x9202;
    pub const EXPOSURE_COMPENSATION: u16 = 0x9204;
    pub const METERING_MODE: u16 = 0x9207;
    pub const FLASH: u16 = 0x9209;
    pub const FOCAL_LENGTH: u16 = 0x920A;
    pub const USER_COMMENT: u16 = 0x9286;
    pub const COLOR_SPACE: u16 = 0xA001;
    pub const EXIF_IMAGE_WIDTH: u16 = 0xA002;
    pub const EXIF_IMAGE_HEIGHT: u16 = 0xA003;
    pub const INTEROP_IFD: u16 = 0xA005;
    pub const GPS_VERSION_ID: u16 = 0x0000;
    pub const GPS_LATITUDE_REF: u16 = 0x0001;
    pub const GPS_LATITUDE: u16 = 0x0002;
    pub const GPS_LONGITUDE_REF: u16 = 0x0003;
    pub const GPS_LONGITUDE: u16 = 0x0004;
    pub const GPS_ALTITUDE_REF: u16 = 0x0005;
    pub const GPS_ALTITUDE: u16 = 0x0006;
    pub const COMPRESSION: u16 = 0x0103;
    pub const JPEG_INTERCHANGE_FORMAT: u16 = 0x0201;
    pub const JPEG_INTERCHANGE_FORMAT_LENGTH: u16 = 0x0202;
}

const ENTRY_SIZE: u32 = 12;
const HEADER_ENTRY_COUNT_SIZE: u32 = 2;
const NEXT_OFFSET_SIZE: u32 = 4;
const HEADER_SIZE: u32 = 8;

/// Textual tags whose NUL padding and surrounding whitespace the writer
/// trims; an empty result after trimming drops the field entirely.
const TRIMMED_TEXT_TAGS: &[(DirType, u16)] =
    &[(DirType::ROOT, tags::COPYRIGHT), (DirType::ROOT, tags::ARTIST), (DirType::EXIF, tags::USER_COMMENT)];

/// Rejects constructing an output directory for a maker-note sub-tree —
/// the writer never supports writing those back.
fn ensure_writable(dir_type: DirType) -> Result<()> {
    if dir_type.0 <= -100 {
        Err(Error::UnsupportedDirectory(dir_type.0))
    } else {
        Ok(())
    }
}

struct PlannedDirectory {
    fields: Vec<TiffOutputField>,
    offset: u32,
    next_offset: u32,
}

impl PlannedDirectory {
    fn size(&self) -> u32 {
        HEADER_ENTRY_COUNT_SIZE + self.fields.len() as u32 * ENTRY_SIZE + NEXT_OFFSET_SIZE
    }

    fn set(&mut self, tag: u16, data: Vec<u8>) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.tag == tag) {
            field.data = data;
        }
    }
}

/// Serialise `output` to a complete TIFF byte stream starting at the
/// byte-order marker.
pub fn write_tiff(byte_order: ByteOrder, output: &TiffOutputSet) -> Result<Vec<u8>> {
    let mut ifd0_fields = trim_textual(DirType::ROOT, output.ifd0.fields.clone());
    ensure_orientation_present(&mut ifd0_fields, byte_order);

    let exif_fields = output.exif.as_ref().map(|d| trim_textual(DirType::EXIF, d.fields.clone()));
    let gps_fields = output.gps.as_ref().map(|d| d.fields.clone());
    let interop_fields = output.interop.as_ref().map(|d| d.fields.clone());

    for sub in &output.sub_ifds {
        ensure_writable(sub.dir_type)?;
    }

    if exif_fields.is_some() {
        ifd0_fields.push(TiffOutputField::new(tags::EXIF_IFD, ExifFormat::UInt32, 1, vec![0; 4]));
    }
    if gps_fields.is_some() {
        ifd0_fields.push(TiffOutputField::new(tags::GPS_IFD, ExifFormat::UInt32, 1, vec![0; 4]));
    }
    if interop_fields.is_some() {
        ifd0_fields.push(TiffOutputField::new(tags::INTEROP_IFD, ExifFormat::UInt32, 1, vec![0; 4]));
    }
    if !output.sub_ifds.is_empty() {
        ifd0_fields.push(TiffOutputField::new(
            tags::SUB_IFDS,
            ExifFormat::UInt32,
            output.sub_ifds.len() as u32,
            vec![0; 4 * output.sub_ifds.len()],
        ));
    }

    let mut ifd1_fields = output.ifd1.as_ref().map(|d| d.fields.clone());
    let ifd1_thumbnail = output.ifd1.as_ref().and_then(|d| d.thumbnail.clone());
    if ifd1_thumbnail.is_some() {
        let fields = ifd1_fields.get_or_insert_with(Vec::new);
        fields.push(TiffOutputField::new(tags::JPEG_INTERCHANGE_FORMAT, ExifFormat::UInt32, 1, vec![0; 4]));
        fields.push(TiffOutputField::new(tags::JPEG_INTERCHANGE_FORMAT_LENGTH, ExifFormat::UInt32, 1, vec![0; 4]));
    }

    // Phase 1: topology. IFD0, EXIF, GPS, Interop, sub-IFDs, IFD1.
    let mut directories: Vec<PlannedDirectory> = Vec::new();
    let mut offset = HEADER_SIZE;

    let ifd0_index = push_directory(&mut directories, ifd0_fields, &mut offset);
    let exif_index = exif_fields.map(|f| push_directory(&mut directories, f, &mut offset));
    let gps_index = gps_fields.map(|f| push_directory(&mut directories, f, &mut offset));
    let interop_index = interop_fields.map(|f| push_directory(&mut directories, f, &mut offset));

    let mut sub_ifd_indices = Vec::new();
    for sub in &output.sub_ifds {
        sub_ifd_indices.push(push_directory(&mut directories, sub.fields.clone(), &mut offset));
    }

    let ifd1_index = ifd1_fields.map(|f| push_directory(&mut directories, f, &mut offset));

    // External value blobs, directory by directory, tag by tag.
    let mut blob_offsets: Vec<HashMap<u16, u32>> = vec![HashMap::new(); directories.len()];
    let mut cursor = offset;
    for (di, dir) in directories.iter().enumerate() {
        for field in &dir.fields {
            if field.data.len() > 4 {
                blob_offsets[di].insert(field.tag, cursor);
                cursor += field.data.len() as u32;
                if field.data.len() % 2 == 1 {
                    cursor += 1; // word-align, matching TIFF convention
                }
            }
        }
    }

    let thumbnail_offset = cursor;

    // Phase 2: offset resolution.
    if let Some(idx) = exif_index {
        let target = directories[idx].offset;
        directories[ifd0_index].set(tags::EXIF_IFD, byte_order.write_u32(target).to_vec());
    }
    if let Some(idx) = gps_index {
        let target = directories[idx].offset;
        directories[ifd0_index].set(tags::GPS_IFD, byte_order.write_u32(target).to_vec());
    }
    if let Some(idx) = interop_index {
        let target = directories[idx].offset;
        directories[ifd0_index].set(tags::INTEROP_IFD, byte_order.write_u32(target).to_vec());
    }
    if !sub_ifd_indices.is_empty() {
        let values: Vec<u8> =
            sub_ifd_indices.iter().flat_map(|&i| byte_order.write_u32(directories[i].offset)).collect();
        directories[ifd0_index].set(tags::SUB_IFDS, values);
    }
    if let Some(idx) = ifd1_index {
        directories[idx].set(tags::JPEG_INTERCHANGE_FORMAT, byte_order.write_u32(thumbnail_offset).to_vec());
        if let Some(thumb) = &ifd1_thumbnail {
            directories[idx]
                .set(tags::JPEG_INTERCHANGE_FORMAT_LENGTH, byte_order.write_u32(thumb.len() as u32).to_vec());
        }
        directories[ifd0_index].next_offset = directories[idx].offset;
    }

    // Emit.
    let mut buf = Vec::new();
    write_header(&mut buf, byte_order, directories[ifd0_index].offset);

    for (di, dir) in directories.iter().enumerate() {
        write_directory(&mut buf, dir, &blob_offsets[di], byte_order);
    }
    for (di, dir) in directories.iter().enumerate() {
        for field in &dir.fields {
            if blob_offsets[di].contains_key(&field.tag) {
                buf.extend_from_slice(&field.data);
                if field.data.len() % 2 == 1 {
                    buf.push(0);
                }
            }
        }
    }
    if let Some(thumb) = &ifd1_thumbnail {
        buf.extend_from_slice(thumb);
    }

    Ok(buf)
}

fn push_directory(directories: &mut Vec<PlannedDirectory>, fields: Vec<TiffOutputField>, offset: &mut u32) -> usize {
    let idx = directories.len();
    let dir = PlannedDirectory { fields, offset: *offset, next_offset: 0 };
    *offset += dir.size();
    directories.push(dir);
    idx
}

fn write_header(buf: &mut Vec<u8>, byte_order: ByteOrder, first_ifd_offset: u32) {
    match byte_order {
        ByteOrder::LittleEndian => buf.extend_from_slice(b"II"),
        ByteOrder::BigEndian => buf.extend_from_slice(b"MM"),
    }
    byte_order.put_u16(buf, 42);
    byte_order.put_u32(buf, first_ifd_offset);
}

fn write_directory(buf: &mut Vec<u8>, dir: &PlannedDirectory, blob_offsets: &HashMap<u16, u32>, byte_order: ByteOrder) {
    let mut fields: Vec<&TiffOutputField> = dir.fields.iter().collect();
    fields.sort_by(|a, b| a.tag.cmp(&b.tag).then(a.sort_hint.cmp(&b.sort_hint)));

    byte_order.put_u16(buf, fields.len() as u16);

    for field in &fields {
        byte_order.put_u16(buf, field.tag);
        byte_order.put_u16(buf, field.field_type as u16);
        byte_order.put_u32(buf, field.count);

        if let Some(&blob_offset) = blob_offsets.get(&field.tag) {
            byte_order.put_u32(buf, blob_offset);
        } else {
            let mut word = field.data.clone();
            word.resize(4, 0);
            buf.extend_from_slice(&word);
        }
    }

    byte_order.put_u32(buf, dir.next_offset);
}

fn trim_textual(dir_type: DirType, fields: Vec<TiffOutputField>) -> Vec<TiffOutputField> {
    fields
        .into_iter()
        .filter_map(|mut field| {
            if TRIMMED_TEXT_TAGS.contains(&(dir_type, field.tag)) {
                let without_nul: Vec<u8> = field.data.iter().copied().take_while(|&b| b != 0).collect();
                let trimmed = trim_ascii_whitespace(&without_nul);
                if trimmed.is_empty() {
                    return None;
                }
                let mut data = trimmed.to_vec();
                data.push(0);
                field.count = data.len() as u32;
                field.data = data;
            }
            Some(field)
        })
        .collect()
}

fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace()).map(|p| p + 1).unwrap_or(start);
    &bytes[start..end]
}

fn ensure_orientation_present(fields: &mut Vec<TiffOutputField>, byte_order: ByteOrder) {
    if !fields.iter().any(|f| f.tag == tags::ORIENTATION) {
        fields.push(TiffOutputField::new(tags::ORIENTATION, ExifFormat::UInt16, 1, byte_order.write_u16(1).to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_output() -> TiffOutputSet {
        let mut out = TiffOutputSet::new();
        out.ifd0.push(TiffOutputField::new(tags::MAKE, ExifFormat::String, 5, b"Acme\0".to_vec()));
        out.exif_mut().push(TiffOutputField::new(tags::ISO, ExifFormat::UInt16, 1, vec![100, 0]));
        out
    }

    #[test]
    fn emits_valid_header() {
        let out = sample_output();
        let bytes = write_tiff(ByteOrder::LittleEndian, &out).unwrap();
        assert_eq!(&bytes[0..2], b"II");
        assert_eq!(u16::from_le_bytes([bytes[2], bytes[3]]), 42);
    }

    #[test]
    fn orientation_defaults_when_absent() {
        let out = TiffOutputSet::new();
        let bytes = write_tiff(ByteOrder::LittleEndian, &out).unwrap();
        let contents = crate::tiff_reader::read_tiff(&bytes).unwrap();
        let field = contents.field(DirType::ROOT, tags::ORIENTATION).unwrap();
        assert_eq!(field.decoded_value().unwrap().as_u32(), Some(1));
    }

    #[test]
    fn round_trip_preserves_non_synthesised_fields() {
        let out = sample_output();
        let bytes = write_tiff(ByteOrder::LittleEndian, &out).unwrap();
        let contents = crate::tiff_reader::read_tiff(&bytes).unwrap();
        let make = contents.field(DirType::ROOT, tags::MAKE).unwrap();
        assert_eq!(make.decoded_value().unwrap().as_str(), Some("Acme"));
        let iso = contents.field(DirType::EXIF, tags::ISO).unwrap();
        assert_eq!(iso.decoded_value().unwrap().as_u32(), Some(100));
    }

    #[test]
    fn external_value_blob_round_trips() {
        let mut out = TiffOutputSet::new();
        let long_desc = "a very long image description that will not fit inline\0".as_bytes().to_vec();
        out.ifd0.push(TiffOutputField::new(tags::IMAGE_DESCRIPTION, ExifFormat::String, long_desc.len() as u32, long_desc.clone()));
        let bytes = write_tiff(ByteOrder::LittleEndian, &out).unwrap();
        let contents = crate::tiff_reader::read_tiff(&bytes).unwrap();
        let field = contents.field(DirType::ROOT, tags::IMAGE_DESCRIPTION).unwrap();
        assert_eq!(field.raw_bytes, long_desc);
    }

    #[test]
    fn thumbnail_round_trips() {
        let mut out = TiffOutputSet::new();
        out.ifd1_mut().thumbnail = Some(vec![0xFF, 0xD8, 0xFF, 0xD9]);
        let bytes = write_tiff(ByteOrder::LittleEndian, &out).unwrap();
        let contents = crate::tiff_reader::read_tiff(&bytes).unwrap();
        let ifd1 = contents.directory(DirType::IFD1).unwrap();
        assert_eq!(ifd1.thumbnail.as_ref().unwrap().data, vec![0xFF, 0xD8, 0xFF, 0xD9]);
    }

    #[test]
    fn copyright_empty_after_trim_is_omitted() {
        let mut out = TiffOutputSet::new();
        out.ifd0.push(TiffOutputField::new(tags::COPYRIGHT, ExifFormat::String, 1, vec![0, 0, 0]));
        let bytes = write_tiff(ByteOrder::LittleEndian, &out).unwrap();
        let contents = crate::tiff_reader::read_tiff(&bytes).unwrap();
        assert!(contents.field(DirType::ROOT, tags::COPYRIGHT).is_none());
    }
}
