//! JPEG segment rewriter - replaces EXIF/XMP/IPTC segments in JPEG files.
//!
//! Strategy: copy all segments verbatim except the three this engine
//! understands (EXIF APP1, XMP APP1, Photoshop IRB APP13), which are
//! replaced wholesale by the caller's final content for that dialect.
//! Pixel data (everything from SOS through EOI) is never touched.

use crate::{Error, Metadata, ReadSeek, Result};
use std::io::Write;

/// A rewritten APP1 payload (length field + "Exif\0\0"/XMP header + body)
/// must fit in the 2-byte big-endian segment-length field.
pub const MAX_APP1_PAYLOAD: usize = 65534;

const EXIF_HEADER: &[u8] = b"Exif\x00\x00";
const XMP_HEADER: &[u8] = b"http://ns.adobe.com/xap/1.0/\x00";
const PHOTOSHOP_HEADER: &[u8] = b"Photoshop 3.0\0";

/// JPEG segment for writing.
#[derive(Debug, Clone)]
pub struct JpegSegment {
    pub marker: u8,
    pub data: Vec<u8>,
}

/// JPEG writer that preserves image data while replacing metadata.
pub struct JpegWriter;

impl JpegWriter {
    /// Rewrite a JPEG, replacing its EXIF/XMP/IPTC segments.
    ///
    /// Each `Option` carries the FINAL content for that dialect: `None`
    /// means the output should have no such segment, `Some` replaces
    /// whatever was there (or inserts a new segment if none existed).
    /// `iptc_app13` is a pre-built APP13 payload, e.g. from
    /// [`crate::iptc::IptcWriter::build_app13`].
    pub fn write<R, W>(
        input: &mut R,
        output: &mut W,
        exif_data: Option<&[u8]>,
        xmp_data: Option<&str>,
        iptc_app13: Option<&[u8]>,
    ) -> Result<()>
    where
        R: ReadSeek,
        W: Write,
    {
        if let Some(exif) = exif_data {
            let len = 2 + EXIF_HEADER.len() + exif.len();
            if len > MAX_APP1_PAYLOAD {
                return Err(Error::ExifTooLarge(len, MAX_APP1_PAYLOAD));
            }
        }

        let data = crate::utils::read_with_limit(input)?;

        if data.len() < 2 || data[0] != 0xFF || data[1] != 0xD8 {
            return Err(Error::InvalidStructure("not a JPEG file".into()));
        }

        let segments = Self::parse_segments(&data)?;

        output.write_all(&[0xFF, 0xD8])?;

        let mut wrote_exif = false;
        let mut wrote_xmp = false;
        let mut wrote_iptc = false;

        // EXIF and XMP always flush together, in that order, the moment
        // either dialect's original segment position is reached (or at
        // SOS if neither ever appeared) — this keeps a new XMP segment
        // immediately after the EXIF one, per the fixed dialect order.
        let mut flush_exif_xmp = |output: &mut W, wrote_exif: &mut bool, wrote_xmp: &mut bool| -> Result<()> {
            if let Some(exif) = exif_data {
                if !*wrote_exif {
                    Self::write_app1(output, EXIF_HEADER, exif)?;
                    *wrote_exif = true;
                }
            }
            if let Some(xmp) = xmp_data {
                if !*wrote_xmp {
                    Self::write_app1(output, XMP_HEADER, xmp.as_bytes())?;
                    *wrote_xmp = true;
                }
            }
            Ok(())
        };

        for seg in &segments {
            match seg.marker {
                0xE1 if seg.data.starts_with(EXIF_HEADER) => {
                    flush_exif_xmp(output, &mut wrote_exif, &mut wrote_xmp)?;
                }
                0xE1 if seg.data.starts_with(XMP_HEADER) => {
                    flush_exif_xmp(output, &mut wrote_exif, &mut wrote_xmp)?;
                }
                0xED if seg.data.starts_with(PHOTOSHOP_HEADER) => {
                    if let Some(app13) = iptc_app13 {
                        if !wrote_iptc {
                            Self::write_segment(output, 0xED, app13)?;
                            wrote_iptc = true;
                        }
                    }
                    // Original IPTC segment is always superseded (or dropped).
                }
                0xDA => {
                    flush_exif_xmp(output, &mut wrote_exif, &mut wrote_xmp)?;
                    if let Some(app13) = iptc_app13 {
                        if !wrote_iptc {
                            Self::write_segment(output, 0xED, app13)?;
                            wrote_iptc = true;
                        }
                    }
                    Self::write_segment(output, seg.marker, &seg.data)?;
                }
                _ => {
                    Self::write_segment(output, seg.marker, &seg.data)?;
                }
            }
        }

        Ok(())
    }

    /// Write JPEG with updated metadata (convenience method).
    ///
    /// Extracts EXIF and XMP from `Metadata`, writes both, and leaves
    /// IPTC untouched (no IPTC attrs live on `Metadata` itself — use
    /// [`Self::write`] directly when an IPTC payload needs to change).
    pub fn write_metadata<R, W>(input: &mut R, output: &mut W, metadata: &Metadata) -> Result<()>
    where
        R: ReadSeek,
        W: Write,
    {
        let mut output_set = exiftool_core::model::TiffOutputSet::new();
        for (name, value) in metadata.exif.iter() {
            if let Some(field) = crate::utils::attr_to_output_field(name, value) {
                output_set.ifd0.push(field);
            }
        }
        let exif_bytes = exiftool_core::tiff_writer::write_tiff(exiftool_core::ByteOrder::LittleEndian, &output_set)
            .map_err(Error::Core)?;
        let exif_data = if output_set.ifd0.fields.is_empty() { None } else { Some(exif_bytes.as_slice()) };

        let xmp_data = metadata.xmp.as_deref();

        Self::write(input, output, exif_data, xmp_data, None)
    }

    /// Parse JPEG into segments.
    fn parse_segments(data: &[u8]) -> Result<Vec<JpegSegment>> {
        let mut segments = Vec::new();
        let mut pos = 2; // Skip SOI

        while pos < data.len() {
            if data[pos] != 0xFF {
                return Err(Error::InvalidStructure("invalid JPEG marker".into()));
            }

            // Skip padding FF bytes
            while pos < data.len() && data[pos] == 0xFF {
                pos += 1;
            }

            if pos >= data.len() {
                break;
            }

            let marker = data[pos];
            pos += 1;

            // EOI - end
            if marker == 0xD9 {
                break;
            }

            // Standalone markers (RST, TEM)
            if (0xD0..=0xD7).contains(&marker) || marker == 0x01 {
                continue;
            }

            // SOS - rest of file is image data
            if marker == 0xDA {
                if pos + 2 > data.len() {
                    break;
                }
                let len = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;

                // SOS data includes everything until EOI
                let sos_header = &data[pos..pos + len];
                let image_start = pos + len;

                let mut image_end = data.len();
                for i in (image_start..data.len() - 1).rev() {
                    if data[i] == 0xFF && data[i + 1] == 0xD9 {
                        image_end = i + 2;
                        break;
                    }
                }

                let mut sos_data = sos_header.to_vec();
                sos_data.extend_from_slice(&data[image_start..image_end]);

                segments.push(JpegSegment { marker, data: sos_data });
                break;
            }

            // Regular segment with length
            if pos + 2 > data.len() {
                break;
            }
            let len = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;

            if len < 2 || pos + len > data.len() {
                break;
            }

            segments.push(JpegSegment { marker, data: data[pos..pos + len].to_vec() });

            pos += len;
        }

        Ok(segments)
    }

    fn write_segment<W: Write>(output: &mut W, marker: u8, data: &[u8]) -> Result<()> {
        output.write_all(&[0xFF, marker])?;
        output.write_all(data)?;
        Ok(())
    }

    /// Write an APP1 segment given its identifying header and body.
    fn write_app1<W: Write>(output: &mut W, header: &[u8], body: &[u8]) -> Result<()> {
        output.write_all(&[0xFF, 0xE1])?;
        let len = 2 + header.len() + body.len();
        output.write_all(&(len as u16).to_be_bytes())?;
        output.write_all(header)?;
        output.write_all(body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exiftool_attrs::AttrValue;
    use std::io::Cursor;

    fn make_minimal_jpeg() -> Vec<u8> {
        vec![
            0xFF, 0xD8, // SOI
            0xFF, 0xE0, 0x00, 0x10, // APP0 JFIF header
            b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00,
            0xFF, 0xDA, 0x00, 0x02, // SOS with minimal 2-byte length (length field only)
            0xFF, 0xD9, // EOI
        ]
    }

    #[test]
    fn write_preserves_image() {
        let input = make_minimal_jpeg();
        let mut cursor = Cursor::new(&input);
        let mut output = Vec::new();

        JpegWriter::write(&mut cursor, &mut output, None, None, None).unwrap();
        assert_eq!(&output[0..2], &[0xFF, 0xD8]);
        assert_eq!(&output[output.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn write_xmp_to_jpeg_without_exif() {
        let input = make_minimal_jpeg();
        let xmp = r#"<?xml version="1.0"?><x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF/></x:xmpmeta>"#;

        let mut cursor = Cursor::new(&input);
        let mut output = Vec::new();

        JpegWriter::write(&mut cursor, &mut output, None, Some(xmp), None).unwrap();

        let found = output.windows(XMP_HEADER.len()).any(|w| w == XMP_HEADER);
        assert!(found, "XMP APP1 segment not found");
        let output_str = String::from_utf8_lossy(&output);
        assert!(output_str.contains("xmpmeta"), "XMP content not found");
    }

    #[test]
    fn xmp_lands_immediately_after_exif_when_both_present() {
        let input = make_minimal_jpeg();
        let xmp = r#"<?xml version="1.0"?><x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF/></x:xmpmeta>"#;
        let exif = vec![b'I', b'I', 0x2A, 0x00, 8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];

        let mut cursor = Cursor::new(&input);
        let mut output = Vec::new();
        JpegWriter::write(&mut cursor, &mut output, Some(&exif), Some(xmp), None).unwrap();

        let exif_pos = output.windows(EXIF_HEADER.len()).position(|w| w == EXIF_HEADER).unwrap();
        let xmp_pos = output.windows(XMP_HEADER.len()).position(|w| w == XMP_HEADER).unwrap();
        assert!(exif_pos < xmp_pos, "EXIF segment must precede XMP segment");
    }

    #[test]
    fn exif_over_app1_ceiling_is_rejected() {
        let input = make_minimal_jpeg();
        let huge_exif = vec![0u8; MAX_APP1_PAYLOAD];

        let mut cursor = Cursor::new(&input);
        let mut output = Vec::new();
        let result = JpegWriter::write(&mut cursor, &mut output, Some(&huge_exif), None, None);
        assert!(matches!(result, Err(Error::ExifTooLarge(_, MAX_APP1_PAYLOAD))));
    }

    #[test]
    fn write_metadata_with_xmp() {
        let input = make_minimal_jpeg();

        let mut metadata = Metadata::new("JPEG");
        metadata.exif.set("Make", AttrValue::Str("TestCam".into()));
        metadata.xmp =
            Some(r#"<?xml version="1.0"?><x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF/></x:xmpmeta>"#.to_string());

        let mut cursor = Cursor::new(&input);
        let mut output = Vec::new();

        JpegWriter::write_metadata(&mut cursor, &mut output, &metadata).unwrap();

        let has_exif = output.windows(6).any(|w| w == EXIF_HEADER);
        assert!(has_exif, "EXIF not found");

        let has_xmp = output.windows(XMP_HEADER.len()).any(|w| w == XMP_HEADER);
        assert!(has_xmp, "XMP not found");
    }

    #[test]
    fn writes_iptc_app13_when_provided() {
        let input = make_minimal_jpeg();
        let mut app13 = PHOTOSHOP_HEADER.to_vec();
        app13.extend_from_slice(b"8BIM");

        let mut cursor = Cursor::new(&input);
        let mut output = Vec::new();
        JpegWriter::write(&mut cursor, &mut output, None, None, Some(&app13)).unwrap();

        let found = output.windows(PHOTOSHOP_HEADER.len()).any(|w| w == PHOTOSHOP_HEADER);
        assert!(found, "IPTC APP13 segment not found");
    }
}
