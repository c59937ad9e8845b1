//! JPEG format parser.
//!
//! JPEG files consist of segments, each starting with an 0xFF marker:
//! - SOI (0xFFD8) - Start of Image
//! - APP0 (0xFFE0) - JFIF
//! - APP1 (0xFFE1) - EXIF or XMP
//! - APP13 (0xFFED) - Photoshop IRB (IPTC)
//! - DQT, DHT, SOF, SOS... - image data
//! - EOI (0xFFD9) - End of Image

use crate::iptc::IptcParser;
use crate::utils::raw_value_to_attr;
use crate::{Error, FormatParser, Metadata, ReadSeek, Result};
use exiftool_attrs::AttrValue;
use exiftool_core::{model::DirType, tiff_reader};
use exiftool_tags::{lookup_tag, TagGroup};
use exiftool_xmp::XmpParser;
use std::io::SeekFrom;

/// JPEG format parser.
pub struct JpegParser;

impl FormatParser for JpegParser {
    fn can_parse(&self, header: &[u8]) -> bool {
        header.len() >= 2 && header[0] == 0xFF && header[1] == 0xD8
    }

    fn format_name(&self) -> &'static str {
        "JPEG"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["jpg", "jpeg", "jpe"]
    }

    fn parse(&self, reader: &mut dyn ReadSeek) -> Result<Metadata> {
        let mut metadata = Metadata::new("JPEG");

        let mut soi = [0u8; 2];
        reader.read_exact(&mut soi)?;
        if soi != [0xFF, 0xD8] {
            return Err(Error::InvalidStructure("missing JPEG SOI marker".into()));
        }

        loop {
            let mut marker = [0u8; 2];
            if reader.read_exact(&mut marker).is_err() {
                break;
            }

            if marker[0] != 0xFF {
                return Err(Error::InvalidStructure("invalid JPEG marker".into()));
            }

            let mut marker_id = marker[1];
            while marker_id == 0xFF {
                let mut b = [0u8; 1];
                reader.read_exact(&mut b)?;
                marker_id = b[0];
            }

            if marker_id == 0xD9 || marker_id == 0xDA {
                break;
            }

            if (0xD0..=0xD7).contains(&marker_id) || marker_id == 0x01 {
                continue;
            }

            let mut len_bytes = [0u8; 2];
            reader.read_exact(&mut len_bytes)?;
            let seg_len = u16::from_be_bytes(len_bytes) as usize;

            if seg_len < 2 {
                return Err(Error::InvalidStructure("invalid segment length".into()));
            }

            let data_len = seg_len - 2;
            let seg_start = reader.stream_position()? as usize;

            match marker_id {
                0xE0 => {
                    let mut data = vec![0u8; data_len];
                    reader.read_exact(&mut data)?;
                    parse_jfif(&data, &mut metadata);
                }
                0xE1 => {
                    let mut data = vec![0u8; data_len];
                    reader.read_exact(&mut data)?;

                    if data.starts_with(b"Exif\x00\x00") {
                        let tiff_data = &data[6..];
                        metadata.exif_offset = Some(seg_start + 6);
                        parse_exif(tiff_data, &mut metadata);
                    } else if data.starts_with(b"http://ns.adobe.com/xap/1.0/\x00") {
                        let xmp_start = b"http://ns.adobe.com/xap/1.0/\x00".len();
                        let xmp_data = &data[xmp_start..];

                        let xmp = String::from_utf8(xmp_data.to_vec()).ok().or_else(|| decode_utf16(xmp_data));

                        if let Some(xmp) = xmp {
                            if let Ok(xmp_attrs) = XmpParser::parse(&xmp) {
                                for (key, value) in xmp_attrs.iter() {
                                    metadata.exif.set(format!("XMP:{}", key), value.clone());
                                }
                            }
                            metadata.xmp = Some(xmp);
                        }
                    }
                }
                0xC0 | 0xC1 | 0xC2 | 0xC3 | 0xC5 | 0xC6 | 0xC7 | 0xC9 | 0xCA | 0xCB | 0xCD | 0xCE | 0xCF => {
                    let mut data = vec![0u8; data_len];
                    reader.read_exact(&mut data)?;
                    parse_sof(marker_id, &data, &mut metadata);
                }
                0xED => {
                    let mut data = vec![0u8; data_len];
                    reader.read_exact(&mut data)?;
                    if data.starts_with(b"Photoshop 3.0\x00") {
                        parse_photoshop_irb(&data, &mut metadata);
                    }
                }
                0xEE => {
                    let mut data = vec![0u8; data_len];
                    reader.read_exact(&mut data)?;
                    if data.starts_with(b"Adobe") && data.len() >= 12 {
                        let transform_name = match data[11] {
                            0 => "Unknown (RGB or CMYK)",
                            1 => "YCbCr",
                            2 => "YCCK",
                            _ => "Unknown",
                        };
                        metadata.exif.set("AdobeColorTransform", AttrValue::Str(transform_name.into()));
                    }
                }
                0xFE => {
                    let mut data = vec![0u8; data_len];
                    reader.read_exact(&mut data)?;
                    if let Ok(comment) = String::from_utf8(data.clone()) {
                        let comment = comment.trim_end_matches('\0').trim();
                        if !comment.is_empty() {
                            metadata.exif.set("Comment", AttrValue::Str(comment.to_string()));
                        }
                    }
                }
                _ => {
                    reader.seek(SeekFrom::Current(data_len as i64))?;
                }
            }
        }

        Ok(metadata)
    }
}

/// Parse JFIF APP0 segment.
fn parse_jfif(data: &[u8], metadata: &mut Metadata) {
    if data.starts_with(b"JFIF\x00") && data.len() >= 14 {
        let version_major = data[5];
        let version_minor = data[6];
        metadata.exif.set("JFIFVersion", AttrValue::Str(format!("{}.{:02}", version_major, version_minor)));

        let units = data[7];
        let x_density = u16::from_be_bytes([data[8], data[9]]);
        let y_density = u16::from_be_bytes([data[10], data[11]]);

        let unit_str = match units {
            0 => "aspect ratio",
            1 => "dpi",
            2 => "dpcm",
            _ => "unknown",
        };

        if x_density > 0 && y_density > 0 {
            metadata.exif.set("XResolution", AttrValue::UInt(x_density as u32));
            metadata.exif.set("YResolution", AttrValue::UInt(y_density as u32));
            metadata.exif.set("ResolutionUnit", AttrValue::Str(unit_str.to_string()));
        }
    }
}

/// Parse SOF (Start of Frame) for image dimensions.
fn parse_sof(marker: u8, data: &[u8], metadata: &mut Metadata) {
    if data.len() < 6 {
        return;
    }

    let precision = data[0];
    let height = u16::from_be_bytes([data[1], data[2]]);
    let width = u16::from_be_bytes([data[3], data[4]]);
    let components = data[5];

    metadata.exif.set("ImageWidth", AttrValue::UInt(width as u32));
    metadata.exif.set("ImageHeight", AttrValue::UInt(height as u32));
    metadata.exif.set("BitsPerSample", AttrValue::UInt(precision as u32));
    metadata.exif.set("ColorComponents", AttrValue::UInt(components as u32));

    let compression = match marker {
        0xC0 => "Baseline DCT",
        0xC1 => "Extended Sequential DCT",
        0xC2 => "Progressive DCT",
        0xC3 => "Lossless",
        0xC5 => "Differential Sequential DCT",
        0xC6 => "Differential Progressive DCT",
        0xC7 => "Differential Lossless",
        0xC9 => "Extended Sequential DCT (Arithmetic)",
        0xCA => "Progressive DCT (Arithmetic)",
        0xCB => "Lossless (Arithmetic)",
        0xCD => "Differential Sequential (Arithmetic)",
        0xCE => "Differential Progressive (Arithmetic)",
        0xCF => "Differential Lossless (Arithmetic)",
        _ => "Unknown",
    };
    metadata.exif.set("Compression", AttrValue::Str(compression.to_string()));
}

/// Parse Photoshop IRB APP13 segment (contains IPTC).
fn parse_photoshop_irb(data: &[u8], metadata: &mut Metadata) {
    const HEADER: &[u8] = b"Photoshop 3.0\x00";
    if !data.starts_with(HEADER) {
        return;
    }

    let mut pos = HEADER.len();

    while pos + 12 <= data.len() {
        if &data[pos..pos + 4] != b"8BIM" {
            break;
        }
        pos += 4;

        let resource_id = u16::from_be_bytes([data[pos], data[pos + 1]]);
        pos += 2;

        let name_len = data[pos] as usize;
        pos += 1 + name_len;
        if !(1 + name_len).is_multiple_of(2) {
            pos += 1;
        }

        if pos + 4 > data.len() {
            break;
        }

        let size = u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        pos += 4;

        if pos + size > data.len() {
            break;
        }

        if resource_id == 0x0404 {
            if let Ok(iptc_attrs) = IptcParser::parse(&data[pos..pos + size]) {
                for (key, value) in iptc_attrs.iter() {
                    metadata.exif.set(key, value.clone());
                }
            }
        }

        pos += size;
        if !size.is_multiple_of(2) {
            pos += 1;
        }
    }
}

/// Decode UTF-16 XMP data (BE or LE based on BOM or heuristics).
fn decode_utf16(data: &[u8]) -> Option<String> {
    if data.len() < 2 {
        return None;
    }

    let (is_be, start) = if data.starts_with(&[0xFE, 0xFF]) {
        (true, 2)
    } else if data.starts_with(&[0xFF, 0xFE]) {
        (false, 2)
    } else {
        let is_le = data[1] == 0x00 && data[0] != 0x00;
        (!is_le, 0)
    };

    let bytes = &data[start..];
    if !bytes.len().is_multiple_of(2) {
        return None;
    }

    let u16_iter = bytes.chunks_exact(2).map(|chunk| {
        if is_be {
            u16::from_be_bytes([chunk[0], chunk[1]])
        } else {
            u16::from_le_bytes([chunk[0], chunk[1]])
        }
    });

    String::from_utf16(&u16_iter.collect::<Vec<_>>()).ok()
}

/// Parse EXIF TIFF data into metadata. Malformed EXIF is absorbed, not fatal
/// to the surrounding JPEG (a bad APP1 segment shouldn't sink the whole file).
fn parse_exif(tiff_data: &[u8], metadata: &mut Metadata) {
    let contents = match tiff_reader::read_tiff(tiff_data) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse EXIF TIFF payload, skipping");
            return;
        }
    };

    if let Some(ifd0) = contents.directory(DirType::ROOT) {
        for field in &ifd0.fields {
            if let Some(def) = lookup_tag(field.tag, TagGroup::Ifd0) {
                if let Ok(value) = field.decoded_value() {
                    metadata.exif.set(def.name, raw_value_to_attr(&value));
                }
            }
        }
    }

    if let Some(exif_ifd) = contents.directory(DirType::EXIF) {
        for field in &exif_ifd.fields {
            if let Some(def) = lookup_tag(field.tag, TagGroup::ExifIfd) {
                if let Ok(value) = field.decoded_value() {
                    metadata.exif.set(def.name, raw_value_to_attr(&value));
                }
            }
        }
    }

    if let Some(gps_ifd) = contents.directory(DirType::GPS) {
        for field in &gps_ifd.fields {
            if let Some(def) = lookup_tag(field.tag, TagGroup::GpsIfd) {
                if let Ok(value) = field.decoded_value() {
                    metadata.exif.set(def.name, raw_value_to_attr(&value));
                }
            }
        }
    }

    if let Some(ifd1) = contents.directory(DirType::IFD1) {
        if let Some(thumb) = &ifd1.thumbnail {
            metadata.thumbnail = Some(thumb.data.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_jpeg() {
        let parser = JpegParser;
        assert!(parser.can_parse(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(!parser.can_parse(&[0x89, 0x50, 0x4E, 0x47])); // PNG
    }

    #[test]
    fn parses_minimal_jpeg_without_exif() {
        let parser = JpegParser;
        let data = [0xFFu8, 0xD8, 0xFF, 0xD9];
        let mut cursor = std::io::Cursor::new(&data[..]);
        let metadata = parser.parse(&mut cursor).unwrap();
        assert_eq!(metadata.format, "JPEG");
    }
}
