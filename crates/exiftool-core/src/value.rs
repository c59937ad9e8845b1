//! Raw EXIF values before conversion.
//!
//! RawValue represents the parsed binary data from EXIF tags
//! before any value conversion (ValueConv) or print conversion (PrintConv).

use crate::{ByteOrder, ExifFormat, Result};

/// Unsigned rational number (numerator/denominator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct URational {
    pub num: u32,
    pub den: u32,
}

impl URational {
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// Convert to f64, returning 0.0 if denominator is zero.
    pub fn to_f64(self) -> f64 {
        if self.den == 0 {
            0.0
        } else {
            self.num as f64 / self.den as f64
        }
    }
}

impl std::fmt::Display for URational {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Signed rational number (numerator/denominator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct SRational {
    pub num: i32,
    pub den: i32,
}

impl SRational {
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// Convert to f64, returning 0.0 if denominator is zero.
    pub fn to_f64(self) -> f64 {
        if self.den == 0 {
            0.0
        } else {
            self.num as f64 / self.den as f64
        }
    }
}

impl std::fmt::Display for SRational {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Raw value parsed from EXIF data.
///
/// This represents the binary data interpreted according to the EXIF format type.
/// Single values and arrays are unified - single value is just array of length 1.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum RawValue {
    /// Unsigned 8-bit integers (format 1).
    UInt8(Vec<u8>),
    /// ASCII string, null-terminated (format 2).
    String(String),
    /// Unsigned 16-bit integers (format 3).
    UInt16(Vec<u16>),
    /// Unsigned 32-bit integers (format 4).
    UInt32(Vec<u32>),
    /// Unsigned rationals (format 5).
    URational(Vec<URational>),
    /// Signed 8-bit integers (format 6).
    Int8(Vec<i8>),
    /// Undefined/binary data (format 7).
    Undefined(Vec<u8>),
    /// Signed 16-bit integers (format 8).
    Int16(Vec<i16>),
    /// Signed 32-bit integers (format 9).
    Int32(Vec<i32>),
    /// Signed rationals (format 10).
    SRational(Vec<SRational>),
    /// 32-bit floats (format 11).
    Float(Vec<f32>),
    /// 64-bit doubles (format 12).
    Double(Vec<f64>),
    /// Unsigned 64-bit integers (format 16, BigTIFF).
    UInt64(Vec<u64>),
    /// Signed 64-bit integers (format 17, BigTIFF).
    Int64(Vec<i64>),
}

impl RawValue {
    /// Get the EXIF format type of this value.
    pub fn format(&self) -> ExifFormat {
        match self {
            RawValue::UInt8(_) => ExifFormat::UInt8,
            RawValue::String(_) => ExifFormat::String,
            RawValue::UInt16(_) => ExifFormat::UInt16,
            RawValue::UInt32(_) => ExifFormat::UInt32,
            RawValue::URational(_) => ExifFormat::URational,
            RawValue::Int8(_) => ExifFormat::Int8,
            RawValue::Undefined(_) => ExifFormat::Undefined,
            RawValue::Int16(_) => ExifFormat::Int16,
            RawValue::Int32(_) => ExifFormat::Int32,
            RawValue::SRational(_) => ExifFormat::SRational,
            RawValue::Float(_) => ExifFormat::Float,
            RawValue::Double(_) => ExifFormat::Double,
            RawValue::UInt64(_) => ExifFormat::UInt64,
            RawValue::Int64(_) => ExifFormat::Int64,
        }
    }

    /// Number of elements in this value.
    pub fn count(&self) -> usize {
        match self {
            RawValue::UInt8(v) => v.len(),
            RawValue::String(s) => s.len(),
            RawValue::UInt16(v) => v.len(),
            RawValue::UInt32(v) => v.len(),
            RawValue::URational(v) => v.len(),
            RawValue::Int8(v) => v.len(),
            RawValue::Undefined(v) => v.len(),
            RawValue::Int16(v) => v.len(),
            RawValue::Int32(v) => v.len(),
            RawValue::SRational(v) => v.len(),
            RawValue::Float(v) => v.len(),
            RawValue::Double(v) => v.len(),
            RawValue::UInt64(v) => v.len(),
            RawValue::Int64(v) => v.len(),
        }
    }

    /// Try to get as a single u32 value.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            RawValue::UInt8(v) if v.len() == 1 => Some(v[0] as u32),
            RawValue::UInt16(v) if v.len() == 1 => Some(v[0] as u32),
            RawValue::UInt32(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }

    /// Try to get as Vec<u32> (for StripOffsets/StripByteCounts).
    pub fn as_u32_vec(&self) -> Option<Vec<u32>> {
        match self {
            RawValue::UInt8(v) => Some(v.iter().map(|&x| x as u32).collect()),
            RawValue::UInt16(v) => Some(v.iter().map(|&x| x as u32).collect()),
            RawValue::UInt32(v) => Some(v.clone()),
            RawValue::UInt64(v) => Some(v.iter().map(|&x| x as u32).collect()),
            _ => None,
        }
    }

    /// Try to get as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Try to get as a single unsigned rational.
    pub fn as_urational(&self) -> Option<URational> {
        match self {
            RawValue::URational(v) if !v.is_empty() => Some(v[0]),
            _ => None,
        }
    }

    /// Try to get as a single signed rational.
    pub fn as_srational(&self) -> Option<SRational> {
        match self {
            RawValue::SRational(v) if !v.is_empty() => Some(v[0]),
            _ => None,
        }
    }

    /// Get raw bytes reference for undefined/binary data.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RawValue::Undefined(v) => Some(v.as_slice()),
            RawValue::UInt8(v) => Some(v.as_slice()),
            _ => None,
        }
    }
}

impl std::fmt::Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawValue::String(s) => write!(f, "{}", s),
            RawValue::UInt8(v) if v.len() == 1 => write!(f, "{}", v[0]),
            RawValue::UInt16(v) if v.len() == 1 => write!(f, "{}", v[0]),
            RawValue::UInt32(v) if v.len() == 1 => write!(f, "{}", v[0]),
            RawValue::URational(v) if v.len() == 1 => write!(f, "{}", v[0]),
            RawValue::SRational(v) if v.len() == 1 => write!(f, "{}", v[0]),
            RawValue::Float(v) if v.len() == 1 => write!(f, "{}", v[0]),
            RawValue::Double(v) if v.len() == 1 => write!(f, "{}", v[0]),
            RawValue::Undefined(v) => write!(f, "<{} bytes>", v.len()),
            _ => write!(f, "<{} x {}>", self.count(), self.format().name()),
        }
    }
}

/// Decode `count` values of `format` out of `data` (exactly
/// `count * format.size()` bytes) using `byte_order`.
pub fn decode(format: ExifFormat, count: u32, data: &[u8], byte_order: ByteOrder) -> Result<RawValue> {
    let count = count as usize;

    match format {
        ExifFormat::UInt8 => Ok(RawValue::UInt8(data[..count].to_vec())),

        ExifFormat::String => {
            let s = data[..count]
                .iter()
                .take_while(|&&b| b != 0)
                .map(|&b| b as char)
                .collect();
            Ok(RawValue::String(s))
        }

        ExifFormat::UInt16 => {
            let mut values = Vec::with_capacity(count);
            for i in 0..count {
                let o = i * 2;
                values.push(byte_order.read_u16([data[o], data[o + 1]]));
            }
            Ok(RawValue::UInt16(values))
        }

        ExifFormat::UInt32 | ExifFormat::Ifd => {
            let mut values = Vec::with_capacity(count);
            for i in 0..count {
                let o = i * 4;
                values.push(byte_order.read_u32([data[o], data[o + 1], data[o + 2], data[o + 3]]));
            }
            Ok(RawValue::UInt32(values))
        }

        ExifFormat::URational => {
            let mut values = Vec::with_capacity(count);
            for i in 0..count {
                let o = i * 8;
                let num = byte_order.read_u32([data[o], data[o + 1], data[o + 2], data[o + 3]]);
                let den = byte_order.read_u32([data[o + 4], data[o + 5], data[o + 6], data[o + 7]]);
                values.push(URational::new(num, den));
            }
            Ok(RawValue::URational(values))
        }

        ExifFormat::Int8 => Ok(RawValue::Int8(data[..count].iter().map(|&b| b as i8).collect())),

        ExifFormat::Undefined => Ok(RawValue::Undefined(data[..count].to_vec())),

        ExifFormat::Int16 => {
            let mut values = Vec::with_capacity(count);
            for i in 0..count {
                let o = i * 2;
                values.push(byte_order.read_i16([data[o], data[o + 1]]));
            }
            Ok(RawValue::Int16(values))
        }

        ExifFormat::Int32 => {
            let mut values = Vec::with_capacity(count);
            for i in 0..count {
                let o = i * 4;
                values.push(byte_order.read_i32([data[o], data[o + 1], data[o + 2], data[o + 3]]));
            }
            Ok(RawValue::Int32(values))
        }

        ExifFormat::SRational => {
            let mut values = Vec::with_capacity(count);
            for i in 0..count {
                let o = i * 8;
                let num = byte_order.read_i32([data[o], data[o + 1], data[o + 2], data[o + 3]]);
                let den = byte_order.read_i32([data[o + 4], data[o + 5], data[o + 6], data[o + 7]]);
                values.push(SRational::new(num, den));
            }
            Ok(RawValue::SRational(values))
        }

        ExifFormat::Float => {
            let mut values = Vec::with_capacity(count);
            for i in 0..count {
                let o = i * 4;
                values.push(byte_order.read_f32([data[o], data[o + 1], data[o + 2], data[o + 3]]));
            }
            Ok(RawValue::Float(values))
        }

        ExifFormat::Double => {
            let mut values = Vec::with_capacity(count);
            for i in 0..count {
                let o = i * 8;
                values.push(byte_order.read_f64([
                    data[o], data[o + 1], data[o + 2], data[o + 3],
                    data[o + 4], data[o + 5], data[o + 6], data[o + 7],
                ]));
            }
            Ok(RawValue::Double(values))
        }

        ExifFormat::UInt64 | ExifFormat::Ifd64 => {
            let mut values = Vec::with_capacity(count);
            for i in 0..count {
                let o = i * 8;
                values.push(byte_order.read_u64([
                    data[o], data[o + 1], data[o + 2], data[o + 3],
                    data[o + 4], data[o + 5], data[o + 6], data[o + 7],
                ]));
            }
            Ok(RawValue::UInt64(values))
        }

        ExifFormat::Int64 => {
            let mut values = Vec::with_capacity(count);
            for i in 0..count {
                let o = i * 8;
                let u = byte_order.read_u64([
                    data[o], data[o + 1], data[o + 2], data[o + 3],
                    data[o + 4], data[o + 5], data[o + 6], data[o + 7],
                ]);
                values.push(u as i64);
            }
            Ok(RawValue::Int64(values))
        }

        ExifFormat::Unicode | ExifFormat::Complex => {
            Ok(RawValue::Undefined(data[..count * format.size()].to_vec()))
        }

        ExifFormat::Utf8 => {
            let bytes = &data[..count];
            let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            Ok(RawValue::String(String::from_utf8_lossy(&bytes[..len]).into_owned()))
        }
    }
}

/// Encode a typed value back to bytes for the given byte order — the
/// writer's counterpart to [`decode`].
pub fn encode(value: &RawValue, byte_order: ByteOrder) -> Vec<u8> {
    match value {
        RawValue::UInt8(v) => v.clone(),
        RawValue::String(s) => {
            let mut bytes = s.as_bytes().to_vec();
            bytes.push(0);
            bytes
        }
        RawValue::UInt16(v) => v.iter().flat_map(|&x| encode_u16(x, byte_order)).collect(),
        RawValue::UInt32(v) => v.iter().flat_map(|&x| encode_u32(x, byte_order)).collect(),
        RawValue::URational(v) => v
            .iter()
            .flat_map(|r| encode_u32(r.num, byte_order).into_iter().chain(encode_u32(r.den, byte_order)))
            .collect(),
        RawValue::Int8(v) => v.iter().map(|&x| x as u8).collect(),
        RawValue::Undefined(v) => v.clone(),
        RawValue::Int16(v) => v.iter().flat_map(|&x| encode_u16(x as u16, byte_order)).collect(),
        RawValue::Int32(v) => v.iter().flat_map(|&x| encode_u32(x as u32, byte_order)).collect(),
        RawValue::SRational(v) => v
            .iter()
            .flat_map(|r| {
                encode_u32(r.num as u32, byte_order)
                    .into_iter()
                    .chain(encode_u32(r.den as u32, byte_order))
            })
            .collect(),
        RawValue::Float(v) => v.iter().flat_map(|&x| encode_u32(x.to_bits(), byte_order)).collect(),
        RawValue::Double(v) => v.iter().flat_map(|&x| encode_u64(x.to_bits(), byte_order)).collect(),
        RawValue::UInt64(v) => v.iter().flat_map(|&x| encode_u64(x, byte_order)).collect(),
        RawValue::Int64(v) => v.iter().flat_map(|&x| encode_u64(x as u64, byte_order)).collect(),
    }
}

fn encode_u16(value: u16, byte_order: ByteOrder) -> [u8; 2] {
    match byte_order {
        ByteOrder::LittleEndian => value.to_le_bytes(),
        ByteOrder::BigEndian => value.to_be_bytes(),
    }
}

fn encode_u32(value: u32, byte_order: ByteOrder) -> [u8; 4] {
    match byte_order {
        ByteOrder::LittleEndian => value.to_le_bytes(),
        ByteOrder::BigEndian => value.to_be_bytes(),
    }
}

fn encode_u64(value: u64, byte_order: ByteOrder) -> [u8; 8] {
    match byte_order {
        ByteOrder::LittleEndian => value.to_le_bytes(),
        ByteOrder::BigEndian => value.to_be_bytes(),
    }
}

#[cfg(test)]
mod codec_tests {
    use super::*;

    #[test]
    fn round_trips_u16() {
        let raw = RawValue::UInt16(vec![1, 256, 65535]);
        let bytes = encode(&raw, ByteOrder::LittleEndian);
        let back = decode(ExifFormat::UInt16, 3, &bytes, ByteOrder::LittleEndian).unwrap();
        assert_eq!(raw, back);
    }

    #[test]
    fn round_trips_rational() {
        let raw = RawValue::URational(vec![URational::new(1, 2), URational::new(3, 1)]);
        let bytes = encode(&raw, ByteOrder::BigEndian);
        let back = decode(ExifFormat::URational, 2, &bytes, ByteOrder::BigEndian).unwrap();
        assert_eq!(raw, back);
    }

    #[test]
    fn string_encoding_null_terminates() {
        let raw = RawValue::String("abc".into());
        let bytes = encode(&raw, ByteOrder::LittleEndian);
        assert_eq!(bytes, b"abc\0");
    }
}
