//! HEIC/HEIF/AVIF format writer.
//!
//! HEIC writing strategy (based on ExifTool WriteQuickTime.pl):
//! - Parse ISOBMFF structure (boxes/atoms)
//! - Locate EXIF item in iloc (ItemLocation) box
//! - Update EXIF data in mdat or create new item
//! - Recalculate iloc offsets when EXIF size changes
//! - Update box sizes throughout the hierarchy
//!
//! Key boxes:
//! - ftyp: file type and compatible brands
//! - meta: container for metadata boxes
//!   - hdlr: handler type (should be "pict")
//!   - pitm: primary item ID
//!   - iloc: item locations (offsets/lengths for each item)
//!   - iinf: item info (item types - identifies EXIF item)
//!   - iref: item references (cdsc = content describes)
//!   - iprp: item properties
//! - mdat: media data (contains actual image + EXIF data)
//!
//! Reference: ISO/IEC 14496-12 (ISOBMFF), ISO/IEC 23008-12 (HEIF)

use crate::{Error, Metadata, ReadSeek, Result};
use std::collections::HashMap;
use std::io::Write;

/// Box header info
#[derive(Debug, Clone)]
struct BoxInfo {
    offset: u64,
    size: u64,
    box_type: [u8; 4],
    header_size: u8, // 8 or 16 for extended size
}

/// Item location entry from iloc box
#[derive(Debug, Clone, Default)]
struct ItemLocation {
    #[allow(dead_code)]
    item_id: u32,
    #[allow(dead_code)]
    construction_method: u8,
    #[allow(dead_code)]
    data_ref_index: u16,
    base_offset: u64,
    extents: Vec<ItemExtent>,
}

#[derive(Debug, Clone, Default)]
struct ItemExtent {
    #[allow(dead_code)]
    index: u64,
    offset: u64,
    length: u64,
}

/// Item info from iinf box
#[derive(Debug, Clone)]
struct ItemInfo {
    item_id: u32,
    item_type: [u8; 4],
    #[allow(dead_code)]
    content_type: Option<String>,
}

/// iloc box layout info for offset patching
#[derive(Debug, Clone)]
struct IlocLayout {
    offset: u64,
    version: u8,
    offset_size: u8,
    length_size: u8,
    base_offset_size: u8,
    index_size: u8,
    item_count: u32,
}

/// Parsed HEIC structure
struct HeicStructure {
    boxes: Vec<BoxInfo>,
    meta_offset: u64,
    meta_size: u64,
    iloc_layout: Option<IlocLayout>,
    item_locations: HashMap<u32, ItemLocation>,
    item_infos: HashMap<u32, ItemInfo>,
    primary_item_id: Option<u32>,
    exif_item_id: Option<u32>,
    mdat_offset: u64,
    mdat_size: u64,
}

/// HEIC format writer.
pub struct HeicWriter;

impl HeicWriter {
    /// Write HEIC with updated metadata.
    ///
    /// Strategy:
    /// 1. Parse existing structure
    /// 2. Find or create EXIF item
    /// 3. Build new EXIF data
    /// 4. Calculate size delta
    /// 5. Rewrite file with updated offsets
    pub fn write<R, W>(input: &mut R, output: &mut W, metadata: &Metadata) -> Result<()>
    where
        R: ReadSeek,
        W: Write,
    {
        let data = crate::utils::read_with_limit(input)?;

        // Verify HEIC/HEIF/AVIF format
        if data.len() < 12 || &data[4..8] != b"ftyp" {
            return Err(Error::InvalidStructure("Invalid HEIC file".into()));
        }

        // Check for known brands
        let brand = &data[8..12];
        let is_heic = matches!(
            brand,
            b"heic" | b"heix" | b"hevc" | b"hevx" | b"mif1" | b"msf1" | b"avif" | b"avis"
        );
        if !is_heic {
            return Err(Error::InvalidStructure(
                format!("Unknown brand: {:?}", String::from_utf8_lossy(brand)).into(),
            ));
        }

        // Parse structure
        let mut structure = Self::parse_structure(&data)?;

        // Build new EXIF bytes
        let exif_bytes = Self::build_exif(metadata)?;
        let has_new_exif = !exif_bytes.is_empty();

        if !has_new_exif {
            // No changes needed, copy as-is
            output.write_all(&data)?;
            return Ok(());
        }

        // HEIC EXIF has a 4-byte header before TIFF data (offset to TIFF header)
        // Usually 0x00000006 meaning "skip 6 bytes from start of EXIF item to reach TIFF"
        // But we simplify: use offset 0 if EXIF starts with TIFF header
        let heic_exif = if exif_bytes.starts_with(b"MM") || exif_bytes.starts_with(b"II") {
            // TIFF header at start, no offset needed
            let mut buf = vec![0u8; 4 + exif_bytes.len()];
            buf[3] = 0; // offset = 0
            buf[4..].copy_from_slice(&exif_bytes);
            buf
        } else {
            // Add Exif\0\0 prefix if not present
            let mut buf = Vec::with_capacity(4 + 6 + exif_bytes.len());
            buf.extend_from_slice(&[0, 0, 0, 6]); // offset to TIFF = 6
            buf.extend_from_slice(b"Exif\0\0");
            buf.extend_from_slice(&exif_bytes);
            buf
        };

        // Decide on strategy based on existing structure
        if let Some(exif_id) = structure.exif_item_id {
            // Update existing EXIF item
            Self::update_exif_item(&data, output, &mut structure, exif_id, &heic_exif)?;
        } else {
            // Create new EXIF item - complex, requires modifying iloc, iinf, iref
            Self::create_exif_item(&data, output, &mut structure, &heic_exif)?;
        }

        Ok(())
    }

    /// Parse HEIC file structure.
    fn parse_structure(data: &[u8]) -> Result<HeicStructure> {
        let mut structure = HeicStructure {
            boxes: Vec::new(),
            meta_offset: 0,
            meta_size: 0,
            iloc_layout: None,
            item_locations: HashMap::new(),
            item_infos: HashMap::new(),
            primary_item_id: None,
            exif_item_id: None,
            mdat_offset: 0,
            mdat_size: 0,
        };

        let mut pos = 0usize;
        let data_len = data.len();

        while pos + 8 <= data_len {
            let box_info = Self::read_box_header(data, pos)?;

            match &box_info.box_type {
                b"meta" => {
                    structure.meta_offset = pos as u64;
                    structure.meta_size = box_info.size;
                    Self::parse_meta_box(data, &box_info, &mut structure)?;
                }
                b"mdat" => {
                    structure.mdat_offset = pos as u64;
                    structure.mdat_size = box_info.size;
                }
                _ => {}
            }

            structure.boxes.push(box_info.clone());

            if box_info.size == 0 {
                break; // size 0 means extends to end of file
            }
            pos += box_info.size as usize;
        }

        // Find EXIF item ID from item_infos
        for (id, info) in &structure.item_infos {
            if &info.item_type == b"Exif" {
                structure.exif_item_id = Some(*id);
                break;
            }
        }

        Ok(structure)
    }

    /// Read box header at position.
    fn read_box_header(data: &[u8], pos: usize) -> Result<BoxInfo> {
        if pos + 8 > data.len() {
            return Err(Error::InvalidStructure("Truncated box header".into()));
        }

        let size32 = u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]);
        let box_type = [data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]];

        let (size, header_size) = if size32 == 1 {
            // Extended size
            if pos + 16 > data.len() {
                return Err(Error::InvalidStructure("Truncated extended size".into()));
            }
            let ext_size = u64::from_be_bytes([
                data[pos + 8],
                data[pos + 9],
                data[pos + 10],
                data[pos + 11],
                data[pos + 12],
                data[pos + 13],
                data[pos + 14],
                data[pos + 15],
            ]);
            (ext_size, 16u8)
        } else if size32 == 0 {
            // Extends to end of file
            ((data.len() - pos) as u64, 8u8)
        } else {
            (size32 as u64, 8u8)
        };

        Ok(BoxInfo {
            offset: pos as u64,
            size,
            box_type,
            header_size,
        })
    }

    /// Parse meta box and its children.
    fn parse_meta_box(data: &[u8], meta_box: &BoxInfo, structure: &mut HeicStructure) -> Result<()> {
        // meta is a FullBox - skip version (1) + flags (3) after header
        let meta_start = meta_box.offset as usize + meta_box.header_size as usize + 4;
        let meta_end = (meta_box.offset + meta_box.size) as usize;

        let mut pos = meta_start;

        while pos + 8 <= meta_end {
            let box_info = Self::read_box_header(data, pos)?;

            if box_info.size < 8 || pos + box_info.size as usize > meta_end {
                break;
            }

            match &box_info.box_type {
                b"pitm" => {
                    Self::parse_pitm_box(data, &box_info, structure)?;
                }
                b"iloc" => {
                    Self::parse_iloc_box(data, &box_info, structure)?;
                }
                b"iinf" => {
                    Self::parse_iinf_box(data, &box_info, structure)?;
                }
                _ => {}
            }

            structure.boxes.push(box_info.clone());
            pos += box_info.size as usize;
        }

        Ok(())
    }

    /// Parse pitm (primary item) box.
    fn parse_pitm_box(
        data: &[u8],
        box_info: &BoxInfo,
        structure: &mut HeicStructure,
    ) -> Result<()> {
        let pos = box_info.offset as usize + box_info.header_size as usize;
        if pos + 4 > data.len() {
            return Ok(());
        }

        let version = data[pos];
        let id_offset = pos + 4;

        let primary_id = if version == 0 {
            if id_offset + 2 > data.len() {
                return Ok(());
            }
            u16::from_be_bytes([data[id_offset], data[id_offset + 1]]) as u32
        } else {
            if id_offset + 4 > data.len() {
                return Ok(());
            }
            u32::from_be_bytes([
                data[id_offset],
                data[id_offset + 1],
                data[id_offset + 2],
                data[id_offset + 3],
            ])
        };

        structure.primary_item_id = Some(primary_id);
        Ok(())
    }

    /// Parse iloc (item location) box.
    fn parse_iloc_box(
        data: &[u8],
        box_info: &BoxInfo,
        structure: &mut HeicStructure,
    ) -> Result<()> {
        let pos = box_info.offset as usize + box_info.header_size as usize;
        if pos + 8 > data.len() {
            return Ok(());
        }

        let version = data[pos];
        // flags at pos+1..pos+4

        let sizes = u16::from_be_bytes([data[pos + 4], data[pos + 5]]);
        let offset_size = ((sizes >> 12) & 0xF) as u8;
        let length_size = ((sizes >> 8) & 0xF) as u8;
        let base_offset_size = ((sizes >> 4) & 0xF) as u8;
        let index_size = if version == 1 || version == 2 {
            (sizes & 0xF) as u8
        } else {
            0
        };

        let (item_count, mut cur_pos) = if version < 2 {
            let count = u16::from_be_bytes([data[pos + 6], data[pos + 7]]) as u32;
            (count, pos + 8)
        } else {
            if pos + 10 > data.len() {
                return Ok(());
            }
            let count = u32::from_be_bytes([data[pos + 6], data[pos + 7], data[pos + 8], data[pos + 9]]);
            (count, pos + 10)
        };

        structure.iloc_layout = Some(IlocLayout {
            offset: box_info.offset,
            version,
            offset_size,
            length_size,
            base_offset_size,
            index_size,
            item_count,
        });

        // Parse each item
        for _ in 0..item_count {
            let item_id = if version < 2 {
                if cur_pos + 2 > data.len() {
                    break;
                }
                let id = u16::from_be_bytes([data[cur_pos], data[cur_pos + 1]]) as u32;
                cur_pos += 2;
                id
            } else {
                if cur_pos + 4 > data.len() {
                    break;
                }
                let id = u32::from_be_bytes([
                    data[cur_pos],
                    data[cur_pos + 1],
                    data[cur_pos + 2],
                    data[cur_pos + 3],
                ]);
                cur_pos += 4;
                id
            };

            let construction_method = if version == 1 || version == 2 {
                if cur_pos + 2 > data.len() {
                    break;
                }
                let cm = u16::from_be_bytes([data[cur_pos], data[cur_pos + 1]]) & 0xF;
                cur_pos += 2;
                cm as u8
            } else {
                0
            };

            if cur_pos + 2 > data.len() {
                break;
            }
            let data_ref_index = u16::from_be_bytes([data[cur_pos], data[cur_pos + 1]]);
            cur_pos += 2;

            let base_offset = Self::read_var_int(data, &mut cur_pos, base_offset_size);

            if cur_pos + 2 > data.len() {
                break;
            }
            let extent_count = u16::from_be_bytes([data[cur_pos], data[cur_pos + 1]]);
            cur_pos += 2;

            let mut extents = Vec::new();
            for _ in 0..extent_count {
                let index = if version == 1 || version == 2 {
                    Self::read_var_int(data, &mut cur_pos, index_size)
                } else {
                    0
                };
                let offset = Self::read_var_int(data, &mut cur_pos, offset_size);
                let length = Self::read_var_int(data, &mut cur_pos, length_size);

                extents.push(ItemExtent {
                    index,
                    offset,
                    length,
                });
            }

            structure.item_locations.insert(
                item_id,
                ItemLocation {
                    item_id,
                    construction_method,
                    data_ref_index,
                    base_offset,
                    extents,
                },
            );
        }

        Ok(())
    }

    /// Read variable-size integer from iloc.
    fn read_var_int(data: &[u8], pos: &mut usize, size: u8) -> u64 {
        match size {
            0 => 0,
            4 => {
                if *pos + 4 > data.len() {
                    return 0;
                }
                let val = u32::from_be_bytes([data[*pos], data[*pos + 1], data[*pos + 2], data[*pos + 3]]);
                *pos += 4;
                val as u64
            }
            8 => {
                if *pos + 8 > data.len() {
                    return 0;
                }
                let val = u64::from_be_bytes([
                    data[*pos],
                    data[*pos + 1],
                    data[*pos + 2],
                    data[*pos + 3],
                    data[*pos + 4],
                    data[*pos + 5],
                    data[*pos + 6],
                    data[*pos + 7],
                ]);
                *pos += 8;
                val
            }
            _ => 0,
        }
    }

    /// Write variable-size integer.
    #[allow(dead_code)]
    fn write_var_int(val: u64, size: u8) -> Vec<u8> {
        match size {
            0 => Vec::new(),
            4 => (val as u32).to_be_bytes().to_vec(),
            8 => val.to_be_bytes().to_vec(),
            _ => Vec::new(),
        }
    }

    /// Parse iinf (item info) box.
    fn parse_iinf_box(
        data: &[u8],
        box_info: &BoxInfo,
        structure: &mut HeicStructure,
    ) -> Result<()> {
        let pos = box_info.offset as usize + box_info.header_size as usize;
        if pos + 4 > data.len() {
            return Ok(());
        }

        let version = data[pos];
        let (entry_count, mut cur_pos) = if version == 0 {
            let count = u16::from_be_bytes([data[pos + 4], data[pos + 5]]) as u32;
            (count, pos + 6)
        } else {
            if pos + 8 > data.len() {
                return Ok(());
            }
            let count = u32::from_be_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]]);
            (count, pos + 8)
        };

        let box_end = (box_info.offset + box_info.size) as usize;

        // Parse infe boxes
        for _ in 0..entry_count {
            if cur_pos + 8 > box_end {
                break;
            }

            let infe_size = u32::from_be_bytes([
                data[cur_pos],
                data[cur_pos + 1],
                data[cur_pos + 2],
                data[cur_pos + 3],
            ]) as usize;

            if &data[cur_pos + 4..cur_pos + 8] != b"infe" || infe_size < 12 {
                cur_pos += infe_size.max(8);
                continue;
            }

            // Parse infe entry
            let infe_pos = cur_pos + 8;
            if infe_pos + 4 > data.len() {
                break;
            }

            let infe_version = data[infe_pos];
            let item_info = if infe_version >= 2 {
                // Version 2+: item_ID (2 or 4 bytes), item_protection_index (2), item_type (4)
                let (item_id, id_size) = if infe_version == 2 {
                    (
                        u16::from_be_bytes([data[infe_pos + 4], data[infe_pos + 5]]) as u32,
                        2usize,
                    )
                } else {
                    (
                        u32::from_be_bytes([
                            data[infe_pos + 4],
                            data[infe_pos + 5],
                            data[infe_pos + 6],
                            data[infe_pos + 7],
                        ]),
                        4usize,
                    )
                };

                let type_offset = infe_pos + 4 + id_size + 2; // skip protection_index
                if type_offset + 4 > data.len() {
                    cur_pos += infe_size;
                    continue;
                }

                let item_type = [
                    data[type_offset],
                    data[type_offset + 1],
                    data[type_offset + 2],
                    data[type_offset + 3],
                ];

                Some(ItemInfo {
                    item_id,
                    item_type,
                    content_type: None,
                })
            } else {
                None
            };

            if let Some(info) = item_info {
                structure.item_infos.insert(info.item_id, info);
            }

            cur_pos += infe_size;
        }

        Ok(())
    }

    /// Update existing EXIF item with new data.
    fn update_exif_item<W: Write>(
        data: &[u8],
        output: &mut W,
        structure: &HeicStructure,
        exif_item_id: u32,
        new_exif: &[u8],
    ) -> Result<()> {
        let loc = structure
            .item_locations
            .get(&exif_item_id)
            .ok_or_else(|| Error::InvalidStructure("EXIF item not found in iloc".into()))?
            .clone();

        let _iloc_layout = structure
            .iloc_layout
            .as_ref()
            .ok_or_else(|| Error::InvalidStructure("iloc layout not found".into()))?
            .clone();

        // Get current EXIF location
        if loc.extents.is_empty() {
            return Err(Error::InvalidStructure("EXIF item has no extents".into()));
        }

        let extent = &loc.extents[0];
        let old_offset = loc.base_offset + extent.offset;
        let old_length = extent.length;

        // A length change would invalidate every other item's iloc offset
        // that follows this one in the file; recomputing those is out of
        // scope, so such updates are rejected rather than guessed at.
        if new_exif.len() as u64 != old_length {
            return Err(Error::IlocOffsetShift(old_length as usize, new_exif.len()));
        }

        let exif_file_pos = old_offset as usize;
        if exif_file_pos >= data.len() || exif_file_pos + old_length as usize > data.len() {
            return Err(Error::InvalidStructure("EXIF extent out of bounds".into()));
        }

        let mut out_data = data.to_vec();
        out_data[exif_file_pos..exif_file_pos + old_length as usize].copy_from_slice(new_exif);

        output.write_all(&out_data)?;
        Ok(())
    }

    /// Build EXIF bytes from metadata, mirroring [`crate::raf_writer::RafWriter::build_exif`].
    fn build_exif(metadata: &Metadata) -> Result<Vec<u8>> {
        use exiftool_attrs::AttrValue;
        use exiftool_core::model::{TiffOutputField, TiffOutputSet};
        use exiftool_core::tiff_writer::{self, tags};
        use exiftool_core::{ByteOrder, ExifFormat};

        fn str_field(tag: u16, s: &str) -> TiffOutputField {
            let mut bytes = s.as_bytes().to_vec();
            bytes.push(0);
            TiffOutputField::new(tag, ExifFormat::String, bytes.len() as u32, bytes)
        }

        fn u16_field(tag: u16, v: u16) -> TiffOutputField {
            TiffOutputField::new(tag, ExifFormat::UInt16, 1, ByteOrder::LittleEndian.write_u16(v).to_vec())
        }

        let mut out = TiffOutputSet::new();
        let mut any = false;

        if let Some(v) = metadata.exif.get_str("Make") {
            out.ifd0.push(str_field(tags::MAKE, v));
            any = true;
        }
        if let Some(v) = metadata.exif.get_str("Model") {
            out.ifd0.push(str_field(tags::MODEL, v));
            any = true;
        }
        if let Some(v) = metadata.exif.get_str("Software") {
            out.ifd0.push(str_field(tags::SOFTWARE, v));
            any = true;
        }
        if let Some(AttrValue::UInt(v)) = metadata.exif.get("Orientation") {
            out.ifd0.push(u16_field(tags::ORIENTATION, *v as u16));
            any = true;
        }
        if let Some(v) = metadata.exif.get_str("DateTimeOriginal") {
            out.exif_mut().push(str_field(tags::DATE_TIME_ORIGINAL, v));
            any = true;
        }

        if !any {
            return Ok(Vec::new());
        }

        tiff_writer::write_tiff(ByteOrder::LittleEndian, &out).map_err(Error::Core)
    }

    /// Create a new EXIF item (when none exists).
    ///
    /// Doing this properly means adding an `infe` entry to `iinf`, an
    /// `iloc` entry, a `cdsc` reference in `iref` to the primary item,
    /// appending the EXIF bytes to `mdat`, and recalculating every box
    /// size up the hierarchy. None of that is implemented; rather than
    /// silently drop the caller's EXIF update and copy the file
    /// unchanged, reject it so the caller knows the write didn't happen.
    fn create_exif_item<W: Write>(
        _data: &[u8],
        _output: &mut W,
        _structure: &mut HeicStructure,
        _new_exif: &[u8],
    ) -> Result<()> {
        Err(Error::UnsupportedWrite("HEIC files without an existing EXIF item cannot have one added"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[allow(unused_imports)]
    use exiftool_attrs::AttrValue;
    use std::io::Cursor;

    fn make_minimal_heic() -> Vec<u8> {
        let mut heic = Vec::new();

        // ftyp box (20 bytes)
        heic.extend_from_slice(&20u32.to_be_bytes()); // size
        heic.extend_from_slice(b"ftyp");
        heic.extend_from_slice(b"heic"); // major brand
        heic.extend_from_slice(&0u32.to_be_bytes()); // minor version
        heic.extend_from_slice(b"heic"); // compatible brand

        // meta box (simplified)
        let meta_content = {
            let mut meta = Vec::new();

            // Version/flags
            meta.extend_from_slice(&[0, 0, 0, 0]);

            // hdlr box
            meta.extend_from_slice(&33u32.to_be_bytes());
            meta.extend_from_slice(b"hdlr");
            meta.extend_from_slice(&[0, 0, 0, 0]); // version/flags
            meta.extend_from_slice(&[0, 0, 0, 0]); // pre_defined
            meta.extend_from_slice(b"pict"); // handler_type
            meta.extend_from_slice(&[0u8; 12]); // reserved
            meta.push(0); // null-terminated string

            // pitm box
            meta.extend_from_slice(&14u32.to_be_bytes());
            meta.extend_from_slice(b"pitm");
            meta.extend_from_slice(&[0, 0, 0, 0]); // version/flags
            meta.extend_from_slice(&1u16.to_be_bytes()); // primary item ID

            // iloc box (minimal)
            meta.extend_from_slice(&28u32.to_be_bytes());
            meta.extend_from_slice(b"iloc");
            meta.extend_from_slice(&[0, 0, 0, 0]); // version=0, flags
            meta.extend_from_slice(&0x4400u16.to_be_bytes()); // offset_size=4, length_size=4
            meta.extend_from_slice(&1u16.to_be_bytes()); // item_count=1
            meta.extend_from_slice(&1u16.to_be_bytes()); // item_id=1
            meta.extend_from_slice(&0u16.to_be_bytes()); // data_ref_index
            meta.extend_from_slice(&1u16.to_be_bytes()); // extent_count=1
            meta.extend_from_slice(&100u32.to_be_bytes()); // extent_offset
            meta.extend_from_slice(&50u32.to_be_bytes()); // extent_length

            // iinf box
            meta.extend_from_slice(&30u32.to_be_bytes());
            meta.extend_from_slice(b"iinf");
            meta.extend_from_slice(&[0, 0, 0, 0]); // version/flags
            meta.extend_from_slice(&1u16.to_be_bytes()); // entry_count

            // infe box
            meta.extend_from_slice(&18u32.to_be_bytes());
            meta.extend_from_slice(b"infe");
            meta.extend_from_slice(&[2, 0, 0, 0]); // version=2, flags
            meta.extend_from_slice(&1u16.to_be_bytes()); // item_id
            meta.extend_from_slice(&0u16.to_be_bytes()); // protection_index
            meta.extend_from_slice(b"hvc1"); // item_type

            meta
        };

        let meta_size = 8 + meta_content.len();
        heic.extend_from_slice(&(meta_size as u32).to_be_bytes());
        heic.extend_from_slice(b"meta");
        heic.extend_from_slice(&meta_content);

        // mdat box (placeholder)
        heic.extend_from_slice(&58u32.to_be_bytes()); // size
        heic.extend_from_slice(b"mdat");
        heic.extend_from_slice(&[0u8; 50]); // dummy data

        heic
    }

    #[test]
    fn test_parse_structure() {
        let heic = make_minimal_heic();
        let structure = HeicWriter::parse_structure(&heic).unwrap();

        assert!(structure.primary_item_id.is_some());
        assert_eq!(structure.primary_item_id, Some(1));
        assert!(!structure.item_locations.is_empty());
    }

    #[test]
    fn test_no_changes_copies_original() {
        let heic = make_minimal_heic();
        let metadata = Metadata::new("HEIC");

        let mut input = Cursor::new(&heic);
        let mut output = Vec::new();

        HeicWriter::write(&mut input, &mut output, &metadata).unwrap();

        assert_eq!(output, heic);
    }

    #[test]
    fn test_box_header_parsing() {
        let mut data = Vec::new();
        data.extend_from_slice(&100u32.to_be_bytes());
        data.extend_from_slice(b"test");
        data.extend_from_slice(&[0u8; 92]); // padding

        let box_info = HeicWriter::read_box_header(&data, 0).unwrap();
        assert_eq!(box_info.size, 100);
        assert_eq!(&box_info.box_type, b"test");
        assert_eq!(box_info.header_size, 8);
    }

    #[test]
    fn test_extended_size_box() {
        let mut data = Vec::new();
        data.extend_from_slice(&1u32.to_be_bytes()); // size = 1 means extended
        data.extend_from_slice(b"test");
        data.extend_from_slice(&200u64.to_be_bytes()); // extended size
        data.extend_from_slice(&[0u8; 184]); // padding

        let box_info = HeicWriter::read_box_header(&data, 0).unwrap();
        assert_eq!(box_info.size, 200);
        assert_eq!(box_info.header_size, 16);
    }

    #[test]
    fn test_var_int_read_write() {
        let mut data = vec![0u8; 16];

        // 4-byte int
        data[0..4].copy_from_slice(&HeicWriter::write_var_int(0x12345678, 4));
        let mut pos = 0;
        let val = HeicWriter::read_var_int(&data, &mut pos, 4);
        assert_eq!(val, 0x12345678);

        // 8-byte int
        data[8..16].copy_from_slice(&HeicWriter::write_var_int(0x123456789ABCDEF0, 8));
        let mut pos = 8;
        let val = HeicWriter::read_var_int(&data, &mut pos, 8);
        assert_eq!(val, 0x123456789ABCDEF0);
    }

    #[test]
    fn adding_exif_to_a_file_with_none_is_rejected() {
        // make_minimal_heic's lone item is a plain "hvc1" image item, not
        // an "Exif" item, so this always takes the create (not update)
        // path, which isn't implemented.
        let heic = make_minimal_heic();
        let mut metadata = Metadata::new("HEIC");
        metadata.exif.set("Make", AttrValue::Str("FUJIFILM".into()));

        let mut input = Cursor::new(&heic);
        let mut output = Vec::new();
        let result = HeicWriter::write(&mut input, &mut output, &metadata);
        assert!(matches!(result, Err(Error::UnsupportedWrite(_))));
    }
}
