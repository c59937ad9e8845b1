//! The TIFF/EXIF structural model: directories, fields, and their writer-side
//! mirrors.
//!
//! Readers build a [`TiffContents`] once from input bytes and never mutate
//! it. Writers build a fresh [`TiffOutputSet`] per call from scratch (or from
//! a prior read) and hand it to the TIFF writer. Neither tree owns
//! references into the other; cross-directory links are plain
//! `(DirType, offset)` pairs resolved by lookup, never borrows.

use crate::{ByteOrder, ExifFormat};

/// A directory-type id. Non-negative values name image directories
/// (IFD0, IFD1, and subsequent image IFDs reached through `SubIFDs`);
/// negative values name semantic sub-directories that never chain via
/// `nextDirectoryOffset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[must_use]
pub struct DirType(pub i32);

impl DirType {
    /// IFD0, the root image directory.
    pub const ROOT: DirType = DirType(0);
    /// IFD1, conventionally the thumbnail directory.
    pub const IFD1: DirType = DirType(1);
    pub const EXIF_SUB_IFD1: DirType = DirType(2);
    pub const EXIF_SUB_IFD2: DirType = DirType(3);
    pub const EXIF_SUB_IFD3: DirType = DirType(4);
    pub const EXIF: DirType = DirType(-2);
    pub const GPS: DirType = DirType(-3);
    pub const INTEROP: DirType = DirType(-4);
    pub const MAKER_CANON: DirType = DirType(-101);
    pub const MAKER_NIKON: DirType = DirType(-102);
    /// Wildcard used by consumers; never assigned to a parsed directory.
    pub const UNKNOWN: DirType = DirType(-1);

    /// Non-negative directory types are image directories that chain via
    /// `nextDirectoryOffset`; negative ones are semantic sub-directories
    /// that never do, even though the source's recursion formula
    /// (`dirType + 1`) would otherwise apply to them too.
    pub fn is_image_directory(self) -> bool {
        self.0 >= 0
    }

    /// The directory type this one's `nextDirectoryOffset` chains to, or
    /// `None` if this directory type never chains.
    pub fn next_in_chain(self) -> Option<DirType> {
        if self.is_image_directory() {
            Some(DirType(self.0 + 1))
        } else {
            None
        }
    }

    /// Only IFD1 gets directory-level error tolerance during parsing.
    pub fn tolerates_errors(self) -> bool {
        self == DirType::IFD1
    }
}

impl Default for DirType {
    fn default() -> Self {
        DirType::UNKNOWN
    }
}

impl std::fmt::Display for DirType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            DirType::ROOT => write!(f, "IFD0"),
            DirType::IFD1 => write!(f, "IFD1"),
            DirType::EXIF => write!(f, "EXIF"),
            DirType::GPS => write!(f, "GPS"),
            DirType::INTEROP => write!(f, "Interop"),
            DirType::MAKER_CANON => write!(f, "MakerNotes(Canon)"),
            DirType::MAKER_NIKON => write!(f, "MakerNotes(Nikon)"),
            DirType::UNKNOWN => write!(f, "Unknown"),
            DirType(n) => write!(f, "IFD{n}"),
        }
    }
}

/// The 8-byte classic TIFF file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct TiffHeader {
    pub byte_order: ByteOrder,
    /// Always 42; BigTIFF's 43 is rejected by the reader.
    pub version: u16,
    pub first_ifd_offset: u64,
}

/// One decoded field entry, still carrying its raw on-disk bytes.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct TiffField {
    pub tag: u16,
    pub dir_type: DirType,
    pub field_type: ExifFormat,
    pub count: u32,
    /// Raw value bytes, length `count * field_type.size()`.
    pub raw_bytes: Vec<u8>,
    /// The literal 4-byte (or 8-byte, BigTIFF) value-or-offset word as it
    /// appeared in the directory entry, before inline/offset resolution.
    pub inline_word: [u8; 8],
    pub byte_order: ByteOrder,
    /// Original position within the directory; a stable tie-breaker only —
    /// tag-id order always wins when the writer re-emits fields.
    pub entry_index: u32,
}

impl TiffField {
    /// Decode the raw bytes into a typed value according to `field_type`.
    pub fn decoded_value(&self) -> crate::Result<crate::RawValue> {
        crate::value::decode(self.field_type, self.count, &self.raw_bytes, self.byte_order)
    }

    pub fn is_offset_carrier(&self) -> bool {
        matches!(
            self.tag,
            crate::tiff_writer::tags::EXIF_IFD
                | crate::tiff_writer::tags::GPS_IFD
                | crate::tiff_writer::tags::INTEROP_IFD
                | crate::tiff_writer::tags::SUB_IFDS
                | crate::tiff_writer::tags::JPEG_INTERCHANGE_FORMAT
                | crate::tiff_writer::tags::JPEG_INTERCHANGE_FORMAT_LENGTH
        )
    }
}

/// A thumbnail captured from `JPEGInterchangeFormat`/`...Length`.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ThumbnailDescriptor {
    pub data: Vec<u8>,
    /// True if the declared length was clipped to the end of the stream.
    pub truncated: bool,
}

/// A parsed IFD: an ordered list of fields plus chain/offset bookkeeping.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct TiffDirectory {
    pub dir_type: DirType,
    pub fields: Vec<TiffField>,
    pub offset: u64,
    /// 0 means terminal (no further directory in the chain).
    pub next_offset: u64,
    pub byte_order: ByteOrder,
    pub thumbnail: Option<ThumbnailDescriptor>,
}

impl TiffDirectory {
    pub fn field(&self, tag: u16) -> Option<&TiffField> {
        self.fields.iter().find(|f| f.tag == tag)
    }
}

/// The full forest discovered by the reader's depth-first walk.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct TiffContents {
    pub header: TiffHeader,
    pub directories: Vec<TiffDirectory>,
}

impl TiffContents {
    /// First directory matching `dir_type`, in discovery order.
    pub fn directory(&self, dir_type: DirType) -> Option<&TiffDirectory> {
        self.directories.iter().find(|d| d.dir_type == dir_type)
    }

    pub fn directories_of(&self, dir_type: DirType) -> impl Iterator<Item = &TiffDirectory> {
        self.directories.iter().filter(move |d| d.dir_type == dir_type)
    }

    pub fn field(&self, dir_type: DirType, tag: u16) -> Option<&TiffField> {
        self.directory(dir_type).and_then(|d| d.field(tag))
    }
}

/// Writer-side mirror of [`TiffField`]: a tag, its type, and a byte payload
/// the writer will re-encode verbatim (callers never hand the writer an
/// already-resolved offset for a tag it synthesises itself).
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct TiffOutputField {
    pub tag: u16,
    pub field_type: ExifFormat,
    pub count: u32,
    pub data: Vec<u8>,
    /// Inherited from the read tree, or assigned at creation time; only a
    /// tie-breaker once the writer sorts by tag id.
    pub sort_hint: u32,
}

impl TiffOutputField {
    pub fn new(tag: u16, field_type: ExifFormat, count: u32, data: Vec<u8>) -> Self {
        Self { tag, field_type, count, data, sort_hint: 0 }
    }

    pub fn with_sort_hint(mut self, hint: u32) -> Self {
        self.sort_hint = hint;
        self
    }

    pub fn is_inline(&self, offset_size: usize) -> bool {
        self.data.len() <= offset_size
    }
}

/// Writer-side mirror of [`TiffDirectory`].
#[derive(Debug, Clone, PartialEq, Default)]
#[must_use]
pub struct TiffOutputDirectory {
    /// What kind of directory this is; checked by the writer before a
    /// sub-IFD is emitted so a caller-supplied maker-note sub-tree can't
    /// sneak past [`crate::tiff_writer::ensure_writable`].
    pub dir_type: DirType,
    pub fields: Vec<TiffOutputField>,
    pub thumbnail: Option<Vec<u8>>,
}

impl TiffOutputDirectory {
    pub fn with_dir_type(dir_type: DirType) -> Self {
        Self { dir_type, ..Self::default() }
    }

    pub fn push(&mut self, field: TiffOutputField) {
        self.fields.retain(|f| f.tag != field.tag);
        self.fields.push(field);
    }

    pub fn get(&self, tag: u16) -> Option<&TiffOutputField> {
        self.fields.iter().find(|f| f.tag == tag)
    }
}

/// The full output set a caller assembles before handing it to the TIFF
/// writer. `ifd0` is mandatory in practice (the writer always emits it);
/// the rest are populated on demand.
#[derive(Debug, Clone, PartialEq, Default)]
#[must_use]
pub struct TiffOutputSet {
    pub ifd0: TiffOutputDirectory,
    pub exif: Option<TiffOutputDirectory>,
    pub gps: Option<TiffOutputDirectory>,
    pub interop: Option<TiffOutputDirectory>,
    pub sub_ifds: Vec<TiffOutputDirectory>,
    pub ifd1: Option<TiffOutputDirectory>,
}

impl TiffOutputSet {
    pub fn new() -> Self {
        Self { ifd0: TiffOutputDirectory::with_dir_type(DirType::ROOT), ..Self::default() }
    }

    pub fn exif_mut(&mut self) -> &mut TiffOutputDirectory {
        self.exif.get_or_insert_with(|| TiffOutputDirectory::with_dir_type(DirType::EXIF))
    }

    pub fn gps_mut(&mut self) -> &mut TiffOutputDirectory {
        self.gps.get_or_insert_with(|| TiffOutputDirectory::with_dir_type(DirType::GPS))
    }

    pub fn interop_mut(&mut self) -> &mut TiffOutputDirectory {
        self.interop.get_or_insert_with(|| TiffOutputDirectory::with_dir_type(DirType::INTEROP))
    }

    pub fn ifd1_mut(&mut self) -> &mut TiffOutputDirectory {
        self.ifd1.get_or_insert_with(|| TiffOutputDirectory::with_dir_type(DirType::IFD1))
    }

    /// True when no directory carries any field, i.e. writing this out would
    /// produce a TIFF stream with nothing in it.
    pub fn is_empty(&self) -> bool {
        self.ifd0.fields.is_empty()
            && self.exif.as_ref().map_or(true, |d| d.fields.is_empty())
            && self.gps.as_ref().map_or(true, |d| d.fields.is_empty())
            && self.interop.as_ref().map_or(true, |d| d.fields.is_empty())
            && self.sub_ifds.iter().all(|d| d.fields.is_empty())
            && self.ifd1.as_ref().map_or(true, |d| d.fields.is_empty())
    }
}

/// A high-level update request the coordinator projects onto whichever
/// dialects understand it.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum MetadataUpdate {
    /// EXIF Orientation, 1..=8.
    Orientation(u8),
    /// Epoch milliseconds, or `None` to clear DateTimeOriginal.
    TakenDate(Option<i64>),
    /// Decimal (latitude, longitude), or `None` to clear both.
    GpsCoordinates(Option<(f64, f64)>),
    /// -1..=5; -1 clears the rating.
    Rating(i8),
    Keywords(std::collections::BTreeSet<String>),
    Persons(std::collections::BTreeSet<String>),
}
