//! Update coordinator: projects high-level metadata updates onto the
//! dialects that understand them.
//!
//! Every update is applied to XMP first, then EXIF, then IPTC — a fixed
//! order, not per-update configurable, so that a mixed batch always
//! produces the same bytes regardless of how the caller ordered the
//! update list itself. Not every update has a counterpart in every
//! dialect: `Rating` and `Persons` are XMP-only, `Keywords` is XMP+IPTC,
//! the rest are XMP+EXIF.

use std::collections::BTreeSet;
use std::io::Cursor;

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use exiftool_attrs::{AttrValue, Attrs};
use exiftool_core::model::{MetadataUpdate, TiffOutputField, TiffOutputSet};
use exiftool_core::{ByteOrder, ExifFormat};

use crate::clock::{Clock, ZoneProvider};
use crate::gps::{decimal_to_rationals, latitude_to_ddm, longitude_to_ddm};
use crate::heic_writer::HeicWriter;
use crate::iptc::IptcWriter;
use crate::jpeg_writer::JpegWriter;
use crate::jxl::JxlWriter;
use crate::raf_writer::RafWriter;
use crate::{Error, FormatRegistry, Metadata, Result};

/// Everything the update coordinator produced, ready for each dialect's
/// own serializer.
#[derive(Debug, Clone, Default)]
pub struct MergedMetadata {
    pub xmp: Option<String>,
    pub exif: TiffOutputSet,
    /// `IPTC:`-prefixed attrs ready for [`crate::iptc::IptcWriter::build_app13`].
    pub iptc: Attrs,
}

/// Apply `updates` to `xmp`/`exif`/`iptc` in the fixed XMP → EXIF → IPTC
/// order and return the merged result.
///
/// `exif` seeds the output TIFF directory (e.g. an existing IFD0 the
/// caller read back in) before updates are layered on top; `xmp`/`iptc`
/// do the same for their respective attribute sets.
pub fn merge_metadata(
    xmp: &Attrs,
    exif: &Attrs,
    iptc: &Attrs,
    updates: &[MetadataUpdate],
    clock: &dyn Clock,
    zone: &dyn ZoneProvider,
) -> Result<MergedMetadata> {
    let mut merged = MergedMetadata { xmp: None, exif: seed_exif(exif), iptc: iptc.clone() };
    let mut xmp_out = xmp.clone();
    let _ = clock;

    for update in updates {
        apply_xmp(&mut xmp_out, update, zone)?;
        apply_exif(&mut merged.exif, update)?;
        apply_iptc(&mut merged.iptc, update);
    }

    merged.xmp = Some(exiftool_xmp::XmpWriter::write(&xmp_out, false).map_err(Error::Xmp)?);
    Ok(merged)
}

/// Which on-disk container `apply_update` is rewriting.
///
/// Mirrors [`crate::FormatRegistry`]'s parser set, minus the formats that
/// have no writer: the registry still detects and parses all five, but
/// only these carry a counterpart in [`apply_update`]'s dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Jpeg,
    Tiff,
    Heic,
    Raf,
    Jxl,
}

impl ContainerKind {
    fn format_name(self) -> &'static str {
        match self {
            ContainerKind::Jpeg => "JPEG",
            ContainerKind::Tiff => "TIFF",
            ContainerKind::Heic => "HEIC",
            ContainerKind::Raf => "RAF",
            ContainerKind::Jxl => "JXL",
        }
    }
}

/// Parse `bytes` as `container_kind`, apply `updates`, and return the
/// rewritten file.
///
/// A lone [`MetadataUpdate::Orientation`] on a JPEG takes
/// [`crate::orientation::patch_orientation`]'s single-byte fast path first;
/// everything else goes through the full XMP → EXIF → IPTC merge and is
/// handed to the matching format's writer.
pub fn apply_update(
    bytes: &[u8],
    container_kind: ContainerKind,
    updates: &[MetadataUpdate],
    clock: &dyn Clock,
    zone: &dyn ZoneProvider,
) -> Result<Vec<u8>> {
    if container_kind == ContainerKind::Jpeg {
        if let [MetadataUpdate::Orientation(value)] = updates {
            let mut patched = bytes.to_vec();
            if crate::orientation::patch_orientation(&mut patched, *value) {
                return Ok(patched);
            }
        }
    }

    let registry = FormatRegistry::new();
    let parser = registry.get(container_kind.format_name()).ok_or(Error::UnsupportedFormat)?;
    let mut cursor = Cursor::new(bytes);
    let existing = parser.parse(&mut cursor)?;

    if !existing.is_writable() {
        return Err(Error::UnsupportedWrite("this format/vendor combination has no writer"));
    }

    let xmp_attrs = match existing.xmp.as_deref() {
        Some(xmp) => exiftool_xmp::XmpParser::parse(xmp).map_err(Error::Xmp)?,
        None => Attrs::new(),
    };

    let merged = merge_metadata(&xmp_attrs, &existing.exif, &Attrs::new(), updates, clock, zone)?;

    match container_kind {
        ContainerKind::Jpeg => write_jpeg(bytes, &merged),
        ContainerKind::Heic => {
            let mut input = Cursor::new(bytes);
            let mut output = Vec::new();
            HeicWriter::write(&mut input, &mut output, &exif_output_to_metadata(&existing, &merged))?;
            Ok(output)
        }
        ContainerKind::Raf => {
            let mut input = Cursor::new(bytes);
            let mut output = Cursor::new(Vec::new());
            RafWriter::write(&mut input, &mut output, &exif_output_to_metadata(&existing, &merged))?;
            Ok(output.into_inner())
        }
        ContainerKind::Jxl => {
            let mut input = Cursor::new(bytes);
            let mut output = Vec::new();
            JxlWriter::write(&mut input, &mut output, &exif_output_to_metadata(&existing, &merged))?;
            Ok(output)
        }
        ContainerKind::Tiff => unreachable!("Metadata::is_writable rejects TIFF above"),
    }
}

fn write_jpeg(bytes: &[u8], merged: &MergedMetadata) -> Result<Vec<u8>> {
    use exiftool_core::tiff_writer;

    let exif_bytes =
        if merged.exif.is_empty() { None } else { Some(tiff_writer::write_tiff(ByteOrder::LittleEndian, &merged.exif).map_err(Error::Core)?) };
    let iptc_app13 = IptcWriter::build_app13(&merged.iptc);
    let iptc_app13 = if iptc_app13.is_empty() { None } else { Some(iptc_app13) };

    let mut input = Cursor::new(bytes);
    let mut output = Vec::new();
    JpegWriter::write(&mut input, &mut output, exif_bytes.as_deref(), merged.xmp.as_deref(), iptc_app13.as_deref())?;
    Ok(output)
}

/// Adapt a [`MergedMetadata`] into the `Metadata`-shaped EXIF view that
/// [`crate::heic_writer::HeicWriter`], [`crate::raf_writer::RafWriter`], and
/// [`crate::jxl::JxlWriter`] accept: each rebuilds its own narrow
/// [`TiffOutputSet`] from a handful of named attrs, so the round trip
/// through [`exif_output_to_attrs`] just hands those attrs back.
fn exif_output_to_metadata(existing: &Metadata, merged: &MergedMetadata) -> Metadata {
    let mut metadata = Metadata::new(existing.format);
    metadata.exif = exif_output_to_attrs(&merged.exif);
    metadata.xmp = merged.xmp.clone();
    metadata
}

/// Reverse of [`seed_exif`]: decode the subset of [`TiffOutputSet`] fields
/// the per-format writers' own `build_exif` helpers look up by name.
fn exif_output_to_attrs(output: &TiffOutputSet) -> Attrs {
    use exiftool_core::tiff_writer::tags;

    fn str_value(field: &TiffOutputField) -> Option<String> {
        let bytes = field.data.strip_suffix(&[0u8]).unwrap_or(&field.data);
        std::str::from_utf8(bytes).ok().map(str::to_string)
    }

    fn u16_value(field: &TiffOutputField) -> Option<u32> {
        let bytes: [u8; 2] = field.data.as_slice().try_into().ok()?;
        Some(u32::from(ByteOrder::LittleEndian.read_u16(bytes)))
    }

    fn urational_value(field: &TiffOutputField) -> Option<(u32, u32)> {
        let bytes: [u8; 8] = field.data.as_slice().try_into().ok()?;
        let n = ByteOrder::LittleEndian.read_u32(bytes[0..4].try_into().unwrap());
        let d = ByteOrder::LittleEndian.read_u32(bytes[4..8].try_into().unwrap());
        Some((n, d))
    }

    let mut attrs = Attrs::new();

    for (tag, name) in [
        (tags::MAKE, "Make"),
        (tags::MODEL, "Model"),
        (tags::SOFTWARE, "Software"),
        (tags::DATE_TIME, "DateTime"),
        (tags::ARTIST, "Artist"),
        (tags::COPYRIGHT, "Copyright"),
    ] {
        if let Some(s) = output.ifd0.get(tag).and_then(str_value) {
            attrs.set(name, AttrValue::Str(s));
        }
    }
    if let Some(v) = output.ifd0.get(tags::ORIENTATION).and_then(u16_value) {
        attrs.set("Orientation", AttrValue::UInt(v));
    }

    if let Some(exif_dir) = &output.exif {
        if let Some(s) = exif_dir.get(tags::DATE_TIME_ORIGINAL).and_then(str_value) {
            attrs.set("DateTimeOriginal", AttrValue::Str(s));
        }
        if let Some(v) = exif_dir.get(tags::ISO).and_then(u16_value) {
            attrs.set("ISO", AttrValue::UInt(v));
        }
        for (tag, name) in [
            (tags::EXPOSURE_TIME, "ExposureTime"),
            (tags::FNUMBER, "FNumber"),
            (tags::FOCAL_LENGTH, "FocalLength"),
        ] {
            if let Some((n, d)) = exif_dir.get(tag).and_then(urational_value) {
                attrs.set(name, AttrValue::URational(n, d));
            }
        }
    }

    attrs
}

/// Carry `exif`'s existing fields into a fresh [`TiffOutputSet`] so an
/// update batch with no EXIF-bearing entries doesn't wipe pre-existing
/// EXIF; `apply_exif` then layers each update's fields on top.
fn seed_exif(exif: &Attrs) -> TiffOutputSet {
    use exiftool_core::tiff_writer::tags;

    fn str_field(tag: u16, s: &str) -> TiffOutputField {
        let mut bytes = s.as_bytes().to_vec();
        bytes.push(0);
        TiffOutputField::new(tag, ExifFormat::String, bytes.len() as u32, bytes)
    }

    fn u16_field(tag: u16, v: u16) -> TiffOutputField {
        TiffOutputField::new(tag, ExifFormat::UInt16, 1, ByteOrder::LittleEndian.write_u16(v).to_vec())
    }

    fn urational_field(tag: u16, n: u32, d: u32) -> TiffOutputField {
        let mut data = ByteOrder::LittleEndian.write_u32(n).to_vec();
        data.extend_from_slice(&ByteOrder::LittleEndian.write_u32(d));
        TiffOutputField::new(tag, ExifFormat::URational, 1, data)
    }

    let mut out = TiffOutputSet::new();

    if let Some(v) = exif.get_str("Make") {
        out.ifd0.push(str_field(tags::MAKE, v));
    }
    if let Some(v) = exif.get_str("Model") {
        out.ifd0.push(str_field(tags::MODEL, v));
    }
    if let Some(v) = exif.get_str("Software") {
        out.ifd0.push(str_field(tags::SOFTWARE, v));
    }
    if let Some(v) = exif.get_str("DateTime") {
        out.ifd0.push(str_field(tags::DATE_TIME, v));
    }
    if let Some(v) = exif.get_str("Artist") {
        out.ifd0.push(str_field(tags::ARTIST, v));
    }
    if let Some(v) = exif.get_str("Copyright") {
        out.ifd0.push(str_field(tags::COPYRIGHT, v));
    }
    if let Some(AttrValue::UInt(v)) = exif.get("Orientation") {
        out.ifd0.push(u16_field(tags::ORIENTATION, *v as u16));
    }

    if let Some(v) = exif.get_str("DateTimeOriginal") {
        out.exif_mut().push(str_field(tags::DATE_TIME_ORIGINAL, v));
    }
    if let Some(AttrValue::UInt(v)) = exif.get("ISO") {
        out.exif_mut().push(u16_field(tags::ISO, *v as u16));
    }
    if let Some(AttrValue::URational(n, d)) = exif.get("ExposureTime") {
        out.exif_mut().push(urational_field(tags::EXPOSURE_TIME, *n, *d));
    }
    if let Some(AttrValue::URational(n, d)) = exif.get("FNumber") {
        out.exif_mut().push(urational_field(tags::FNUMBER, *n, *d));
    }
    if let Some(AttrValue::URational(n, d)) = exif.get("FocalLength") {
        out.exif_mut().push(urational_field(tags::FOCAL_LENGTH, *n, *d));
    }

    out
}

fn apply_xmp(xmp: &mut Attrs, update: &MetadataUpdate, zone: &dyn ZoneProvider) -> Result<()> {
    match update {
        MetadataUpdate::Orientation(value) => {
            xmp.set("tiff:Orientation", AttrValue::UInt(u32::from(*value)));
        }
        MetadataUpdate::TakenDate(None) => {
            xmp.remove("exif:DateTimeOriginal");
        }
        MetadataUpdate::TakenDate(Some(epoch_millis)) => {
            let local = local_datetime(*epoch_millis, zone);
            xmp.set("exif:DateTimeOriginal", AttrValue::Str(iso8601_local(local, zone)));
        }
        MetadataUpdate::GpsCoordinates(None) => {
            xmp.remove("exif:GPSLatitude");
            xmp.remove("exif:GPSLongitude");
        }
        MetadataUpdate::GpsCoordinates(Some((lat, lon))) => {
            xmp.set("exif:GPSLatitude", AttrValue::Str(latitude_to_ddm(*lat).to_xmp_string()));
            xmp.set("exif:GPSLongitude", AttrValue::Str(longitude_to_ddm(*lon).to_xmp_string()));
        }
        MetadataUpdate::Rating(rating) => {
            if *rating < 0 {
                xmp.remove("xmp:Rating");
            } else {
                xmp.set("xmp:Rating", AttrValue::Int(i32::from(*rating)));
            }
        }
        MetadataUpdate::Keywords(keywords) => {
            xmp.set("dc:subject", keyword_list(keywords));
        }
        MetadataUpdate::Persons(persons) => {
            xmp.set("MP:RegionPersonDisplayName", keyword_list(persons));
        }
    }
    Ok(())
}

fn apply_exif(exif: &mut TiffOutputSet, update: &MetadataUpdate) -> Result<()> {
    use exiftool_core::tiff_writer::tags;

    match update {
        MetadataUpdate::Orientation(value) => {
            exif.ifd0.push(TiffOutputField::new(
                tags::ORIENTATION,
                ExifFormat::UInt16,
                1,
                ByteOrder::LittleEndian.write_u16(u16::from(*value)).to_vec(),
            ));
        }
        MetadataUpdate::TakenDate(None) => {
            exif.exif_mut().fields.retain(|f| f.tag != tags::DATE_TIME_ORIGINAL);
        }
        MetadataUpdate::TakenDate(Some(epoch_millis)) => {
            let ascii = exif_ascii_date(*epoch_millis);
            exif.exif_mut().push(TiffOutputField::new(
                tags::DATE_TIME_ORIGINAL,
                ExifFormat::String,
                ascii.len() as u32,
                ascii.into_bytes(),
            ));
        }
        MetadataUpdate::GpsCoordinates(None) => {
            exif.gps = None;
        }
        MetadataUpdate::GpsCoordinates(Some((lat, lon))) => {
            let gps = exif.gps_mut();
            let lat_ref = if *lat < 0.0 { "S\0" } else { "N\0" };
            let lon_ref = if *lon < 0.0 { "W\0" } else { "E\0" };
            gps.push(TiffOutputField::new(tags::GPS_LATITUDE_REF, ExifFormat::String, 2, lat_ref.as_bytes().to_vec()));
            gps.push(TiffOutputField::new(
                tags::GPS_LATITUDE,
                ExifFormat::URational,
                3,
                rationals_bytes(decimal_to_rationals(*lat)),
            ));
            gps.push(TiffOutputField::new(tags::GPS_LONGITUDE_REF, ExifFormat::String, 2, lon_ref.as_bytes().to_vec()));
            gps.push(TiffOutputField::new(
                tags::GPS_LONGITUDE,
                ExifFormat::URational,
                3,
                rationals_bytes(decimal_to_rationals(*lon)),
            ));
        }
        // Rating/Keywords/Persons have no EXIF projection.
        MetadataUpdate::Rating(_) | MetadataUpdate::Keywords(_) | MetadataUpdate::Persons(_) => {}
    }
    Ok(())
}

fn apply_iptc(iptc: &mut Attrs, update: &MetadataUpdate) {
    if let MetadataUpdate::Keywords(keywords) = update {
        let list = AttrValue::List(keywords.iter().cloned().map(AttrValue::Str).collect());
        iptc.set("IPTC:Keywords", list);
    }
}

fn keyword_list(items: &BTreeSet<String>) -> AttrValue {
    AttrValue::List(items.iter().cloned().map(AttrValue::Str).collect())
}

fn rationals_bytes((n1, d1, n2, d2, n3, d3): (u32, u32, u32, u32, u32, u32)) -> Vec<u8> {
    let mut out = Vec::with_capacity(24);
    for (n, d) in [(n1, d1), (n2, d2), (n3, d3)] {
        out.extend_from_slice(&ByteOrder::LittleEndian.write_u32(n));
        out.extend_from_slice(&ByteOrder::LittleEndian.write_u32(d));
    }
    out
}

fn local_datetime(epoch_millis: i64, zone: &dyn ZoneProvider) -> DateTime<chrono::FixedOffset> {
    let utc = Utc.timestamp_millis_opt(epoch_millis).single().unwrap_or_else(|| Utc.timestamp_millis_opt(0).unwrap());
    utc.with_timezone(&zone.offset())
}

/// `2023-07-12T14:48:45.401` — local time, no trailing zone suffix,
/// millisecond precision.
fn iso8601_local(local: DateTime<chrono::FixedOffset>, _zone: &dyn ZoneProvider) -> String {
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}",
        local.year(),
        local.month(),
        local.day(),
        local.hour(),
        local.minute(),
        local.second(),
        local.timestamp_subsec_millis()
    )
}

/// `YYYY:MM:DD HH:MM:SS\0`, classic EXIF ASCII date form, in UTC (EXIF has
/// no timezone field of its own).
fn exif_ascii_date(epoch_millis: i64) -> String {
    let utc = Utc.timestamp_millis_opt(epoch_millis).single().unwrap_or_else(|| Utc.timestamp_millis_opt(0).unwrap());
    format!(
        "{:04}:{:02}:{:02} {:02}:{:02}:{:02}\0",
        utc.year(),
        utc.month(),
        utc.day(),
        utc.hour(),
        utc.minute(),
        utc.second()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedZoneClock;

    fn clock() -> FixedZoneClock {
        FixedZoneClock::gmt_plus_2(1_689_173_325_401)
    }

    #[test]
    fn orientation_projects_to_xmp_and_exif() {
        let c = clock();
        let merged = merge_metadata(
            &Attrs::new(),
            &Attrs::new(),
            &Attrs::new(),
            &[MetadataUpdate::Orientation(6)],
            &c,
            &c,
        )
        .unwrap();
        assert_eq!(merged.exif.ifd0.get(exiftool_core::tiff_writer::tags::ORIENTATION).unwrap().data, vec![6, 0]);
        assert!(merged.xmp.unwrap().contains("tiff:Orientation"));
    }

    #[test]
    fn taken_date_converts_to_local_iso8601() {
        let c = clock();
        let merged = merge_metadata(
            &Attrs::new(),
            &Attrs::new(),
            &Attrs::new(),
            &[MetadataUpdate::TakenDate(Some(1_689_173_325_401))],
            &c,
            &c,
        )
        .unwrap();
        let xmp = merged.xmp.unwrap();
        assert!(xmp.contains("2023-07-12T"), "xmp was: {xmp}");
    }

    #[test]
    fn gps_coordinates_project_ddm_into_xmp() {
        let c = clock();
        let merged = merge_metadata(
            &Attrs::new(),
            &Attrs::new(),
            &Attrs::new(),
            &[MetadataUpdate::GpsCoordinates(Some((53.219392, 8.239662)))],
            &c,
            &c,
        )
        .unwrap();
        let xmp = merged.xmp.unwrap();
        assert!(xmp.contains("53,13.1635N"), "xmp was: {xmp}");
        assert!(xmp.contains("8,14.3797E"), "xmp was: {xmp}");
    }

    #[test]
    fn keywords_project_to_xmp_subject_and_iptc() {
        let c = clock();
        let mut keywords = BTreeSet::new();
        keywords.insert("Äußerst öffentlich".to_string());
        let merged = merge_metadata(
            &Attrs::new(),
            &Attrs::new(),
            &Attrs::new(),
            &[MetadataUpdate::Keywords(keywords)],
            &c,
            &c,
        )
        .unwrap();
        assert!(merged.xmp.unwrap().contains("dc:subject"));
        assert!(matches!(merged.iptc.get("IPTC:Keywords"), Some(AttrValue::List(_))));
    }

    #[test]
    fn rating_has_no_exif_projection() {
        let c = clock();
        let merged = merge_metadata(
            &Attrs::new(),
            &Attrs::new(),
            &Attrs::new(),
            &[MetadataUpdate::Rating(4)],
            &c,
            &c,
        )
        .unwrap();
        assert!(merged.exif.ifd0.fields.is_empty() || merged.exif.ifd0.get(0x0112).is_none());
        assert!(merged.xmp.unwrap().contains("xmp:Rating"));
    }

    #[test]
    fn preexisting_exif_survives_an_unrelated_update() {
        let c = clock();
        let mut existing_exif = Attrs::new();
        existing_exif.set("Make", AttrValue::Str("FUJIFILM".into()));
        let merged =
            merge_metadata(&Attrs::new(), &existing_exif, &Attrs::new(), &[MetadataUpdate::Rating(4)], &c, &c)
                .unwrap();
        let make = merged.exif.ifd0.get(exiftool_core::tiff_writer::tags::MAKE).unwrap();
        assert_eq!(make.data, b"FUJIFILM\0".to_vec());
    }

    fn minimal_jpeg() -> Vec<u8> {
        vec![0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x02, 0xFF, 0xD9]
    }

    #[test]
    fn apply_update_orientation_falls_back_to_full_rewrite_without_an_app1() {
        // No pre-existing APP1, so the fast path can't find an inline
        // Orientation byte and falls through to a full rewrite instead.
        let c = clock();
        let out = apply_update(&minimal_jpeg(), ContainerKind::Jpeg, &[MetadataUpdate::Orientation(6)], &c, &c)
            .unwrap();
        assert_eq!(&out[0..2], &[0xFF, 0xD8]);
        assert!(out.windows(6).any(|w| w == b"Exif\x00\x00"));
    }

    #[test]
    fn apply_update_writes_keywords_to_jpeg_xmp_and_iptc() {
        let c = clock();
        let mut keywords = BTreeSet::new();
        keywords.insert("beach".to_string());
        let out =
            apply_update(&minimal_jpeg(), ContainerKind::Jpeg, &[MetadataUpdate::Keywords(keywords)], &c, &c)
                .unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("dc:subject"));
        assert!(out.windows(14).any(|w| w == b"Photoshop 3.0\0"));
    }

    #[test]
    fn apply_update_orientation_patches_a_single_byte_when_exif_already_has_one() {
        let tiff: Vec<u8> = vec![
            b'I', b'I', 0x2A, 0x00, 8, 0, 0, 0, // header, IFD0 @ 8
            1, 0, // 1 entry
            0x12, 0x01, // tag 0x0112 Orientation
            3, 0, // SHORT
            1, 0, 0, 0, // count 1
            1, 0, 0, 0, // inline value = 1
            0, 0, 0, 0, // next IFD = 0
        ];
        let mut app1 = b"Exif\x00\x00".to_vec();
        app1.extend_from_slice(&tiff);
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
        jpeg.extend_from_slice(&((app1.len() + 2) as u16).to_be_bytes());
        jpeg.extend_from_slice(&app1);
        jpeg.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02, 0xFF, 0xD9]);

        let c = clock();
        let out = apply_update(&jpeg, ContainerKind::Jpeg, &[MetadataUpdate::Orientation(6)], &c, &c).unwrap();

        let diff_count = jpeg.iter().zip(out.iter()).filter(|(a, b)| a != b).count();
        assert_eq!(diff_count, 1, "the fast path should touch exactly one byte");
    }

    #[test]
    fn apply_update_rejects_tiff() {
        let c = clock();
        let tiff = vec![b'I', b'I', 0x2A, 0x00, 8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let result = apply_update(&tiff, ContainerKind::Tiff, &[MetadataUpdate::Rating(4)], &c, &c);
        assert!(matches!(result, Err(Error::UnsupportedWrite(_))));
    }
}
