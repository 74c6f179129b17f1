//! The entry stream: a VFB file as a header followed by tagged entries.
//!
//! ```text
//! 0x1A "WLF10" u16 version, u16 flags, u32 creator
//! u16 key [u16 | u32 length] payload ... key 5, length 0
//! ```
//!
//! A key with bit `0x8000` set is followed by a 32-bit length, otherwise by a
//! 16-bit one. All fixed-width numbers are little-endian.
use super::{
    keys::{EntryKey, PayloadKind},
    records::Record,
};
use crate::FakeLabError;

const MAGIC: &[u8; 6] = b"\x1aWLF10";
const LONG_LENGTH: u16 = 0x8000;
pub const FORMAT_VERSION: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    pub flags: u16,
    pub creator: u32,
}

impl Default for Header {
    fn default() -> Self {
        Header {
            version: FORMAT_VERSION,
            flags: 0,
            creator: 0x0005_0200,
        }
    }
}

/// A decoded entry payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryValue {
    Str(String),
    Int(i32),
    Ints(Vec<i32>),
    Float(f64),
    /// The bytes of a structured record, decoded on demand
    Record(Vec<u8>),
    Raw(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: EntryKey,
    /// Byte offset of the entry's key in the file
    pub offset: usize,
    pub value: EntryValue,
}

impl Entry {
    pub fn new(key: EntryKey, value: EntryValue) -> Self {
        Entry {
            key,
            offset: 0,
            value,
        }
    }

    pub fn str(key: EntryKey, value: impl Into<String>) -> Self {
        Entry::new(key, EntryValue::Str(value.into()))
    }

    pub fn int(key: EntryKey, value: i32) -> Self {
        Entry::new(key, EntryValue::Int(value))
    }

    pub fn ints(key: EntryKey, values: Vec<i32>) -> Self {
        Entry::new(key, EntryValue::Ints(values))
    }

    pub fn float(key: EntryKey, value: f64) -> Self {
        Entry::new(key, EntryValue::Float(value))
    }

    pub fn raw(key: EntryKey, bytes: Vec<u8>) -> Self {
        Entry::new(key, EntryValue::Raw(bytes))
    }

    /// An entry holding a structured record.
    pub fn record<T: Record>(key: EntryKey, record: &T) -> Result<Self, FakeLabError> {
        let mut out = vec![];
        record.write(&mut out)?;
        Ok(Entry::new(key, EntryValue::Record(out)))
    }

    pub(crate) fn malformed(&self, reason: impl Into<String>) -> FakeLabError {
        FakeLabError::MalformedEntry {
            key: self.key.code(),
            offset: self.offset,
            glyph: None,
            reason: reason.into(),
        }
    }

    fn wrong_kind(&self, wanted: &str) -> FakeLabError {
        self.malformed(format!("expected {} payload, found {:?}", wanted, self.value))
    }

    pub fn as_str(&self) -> Result<&str, FakeLabError> {
        match &self.value {
            EntryValue::Str(s) => Ok(s),
            _ => Err(self.wrong_kind("text")),
        }
    }

    pub fn as_int(&self) -> Result<i32, FakeLabError> {
        match &self.value {
            EntryValue::Int(i) => Ok(*i),
            _ => Err(self.wrong_kind("integer")),
        }
    }

    pub fn as_ints(&self) -> Result<&[i32], FakeLabError> {
        match &self.value {
            EntryValue::Ints(i) => Ok(i),
            _ => Err(self.wrong_kind("integer list")),
        }
    }

    pub fn as_float(&self) -> Result<f64, FakeLabError> {
        match &self.value {
            EntryValue::Float(f) => Ok(*f),
            _ => Err(self.wrong_kind("float")),
        }
    }

    pub fn as_raw(&self) -> Result<&[u8], FakeLabError> {
        match &self.value {
            EntryValue::Raw(r) => Ok(r),
            _ => Err(self.wrong_kind("binary")),
        }
    }

    /// Decodes a structured payload into its record type.
    ///
    /// The whole payload must be consumed.
    pub fn as_record<T: Record>(&self) -> Result<T, FakeLabError> {
        let data = match &self.value {
            EntryValue::Record(data) => data,
            _ => return Err(self.wrong_kind("record")),
        };
        let mut cursor = Cursor::new(data, self.offset);
        let record = T::read(&mut cursor).map_err(|e| match e {
            FakeLabError::Truncated { offset, .. } => {
                self.malformed(format!("record ends early at byte {}", offset))
            }
            FakeLabError::General(reason) => self.malformed(reason),
            other => other,
        })?;
        if !cursor.at_end() {
            return Err(self.malformed(format!(
                "{} trailing bytes after record",
                cursor.remaining()
            )));
        }
        Ok(record)
    }
}

/// A bounds-checked reader over a byte slice.
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    /// Offset of `data` within the file, for error reporting
    base: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8], base: usize) -> Self {
        Cursor { data, pos: 0, base }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// File offset of the next byte.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], FakeLabError> {
        let end = self.pos + n;
        if end > self.data.len() {
            return Err(FakeLabError::Truncated {
                offset: self.base + self.pos,
                needed: end - self.data.len(),
            });
        }
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], FakeLabError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, FakeLabError> {
        Ok(self.array::<1>()?[0])
    }

    pub fn u16(&mut self) -> Result<u16, FakeLabError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub fn u32(&mut self) -> Result<u32, FakeLabError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn varint(&mut self) -> Result<i32, FakeLabError> {
        let b0 = self.u8()?;
        Ok(match b0 {
            32..=246 => i32::from(b0) - 139,
            247..=250 => (i32::from(b0) - 247) * 256 + i32::from(self.u8()?) + 108,
            251..=254 => -(i32::from(b0) - 251) * 256 - i32::from(self.u8()?) - 108,
            255 => i32::from_be_bytes(self.array()?),
            _ => {
                return Err(FakeLabError::General(format!(
                    "Invalid integer lead byte {} at {}",
                    b0,
                    self.base + self.pos - 1
                )))
            }
        })
    }

    pub fn i16(&mut self) -> Result<i16, FakeLabError> {
        Ok(i16::from_le_bytes(self.array()?))
    }

    pub fn i32(&mut self) -> Result<i32, FakeLabError> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    pub fn f64(&mut self) -> Result<f64, FakeLabError> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    /// A variable-length integer that must not be negative.
    pub fn count(&mut self) -> Result<usize, FakeLabError> {
        let n = self.varint()?;
        usize::try_from(n).map_err(|_| {
            FakeLabError::General(format!("Negative length {} at {}", n, self.offset()))
        })
    }
}

pub(crate) fn write_varint(out: &mut Vec<u8>, value: i32) {
    match value {
        -107..=107 => out.push((value + 139) as u8),
        108..=1131 => {
            let v = value - 108;
            out.push((v / 256 + 247) as u8);
            out.push((v % 256) as u8);
        }
        -1131..=-108 => {
            let v = -value - 108;
            out.push((v / 256 + 251) as u8);
            out.push((v % 256) as u8);
        }
        _ => {
            out.push(255);
            out.extend_from_slice(&value.to_be_bytes());
        }
    }
}

/// Encodes one payload.
pub fn encode_value(value: &EntryValue) -> Result<Vec<u8>, FakeLabError> {
    let mut out = vec![];
    match value {
        EntryValue::Str(s) => out.extend_from_slice(s.as_bytes()),
        EntryValue::Int(i) => write_varint(&mut out, *i),
        EntryValue::Ints(values) => {
            for v in values {
                write_varint(&mut out, *v);
            }
        }
        EntryValue::Float(f) => out.extend_from_slice(&f.to_le_bytes()),
        EntryValue::Record(bytes) | EntryValue::Raw(bytes) => out.extend_from_slice(bytes),
    }
    Ok(out)
}

fn decode_value(kind: PayloadKind, payload: &[u8], base: usize) -> Result<EntryValue, FakeLabError> {
    let mut cursor = Cursor::new(payload, base);
    let value = match kind {
        PayloadKind::Str => EntryValue::Str(
            String::from_utf8(payload.to_vec())
                .map_err(|e| FakeLabError::General(format!("Invalid UTF-8: {}", e)))?,
        ),
        PayloadKind::Raw => EntryValue::Raw(payload.to_vec()),
        PayloadKind::Int => {
            let value = cursor.varint()?;
            if !cursor.at_end() {
                return Err(FakeLabError::General(format!(
                    "{} trailing bytes after integer",
                    payload.len() - cursor.pos
                )));
            }
            EntryValue::Int(value)
        }
        PayloadKind::Ints => {
            let mut values = vec![];
            while !cursor.at_end() {
                values.push(cursor.varint()?);
            }
            EntryValue::Ints(values)
        }
        PayloadKind::Float => EntryValue::Float(f64::from_le_bytes(cursor.array()?)),
        PayloadKind::Record => EntryValue::Record(payload.to_vec()),
    };
    Ok(value)
}

/// Splits a file into its header and entries, decoding every payload.
///
/// The end marker is consumed and not returned.
pub fn decompile(data: &[u8]) -> Result<(Header, Vec<Entry>), FakeLabError> {
    let mut cursor = Cursor::new(data, 0);
    let magic = cursor.take(MAGIC.len()).map_err(|_| FakeLabError::NotAVfb {
        reason: "file too short for a header".to_string(),
    })?;
    if magic != MAGIC {
        return Err(FakeLabError::NotAVfb {
            reason: format!("bad magic {:02x?}", magic),
        });
    }
    let header = Header {
        version: cursor.u16()?,
        flags: cursor.u16()?,
        creator: cursor.u32()?,
    };
    if header.version != FORMAT_VERSION {
        log::warn!(
            "Unexpected format version {}, reading anyway",
            header.version
        );
    }

    let mut entries = vec![];
    loop {
        let offset = cursor.pos;
        let raw_key = cursor.u16()?;
        let code = raw_key & !LONG_LENGTH;
        let len = if raw_key & LONG_LENGTH != 0 {
            cursor.u32()? as usize
        } else {
            cursor.u16()? as usize
        };
        let payload_start = cursor.pos;
        let payload = cursor.take(len)?;
        let key = EntryKey::from_code(code);
        if key == EntryKey::End {
            break;
        }
        let value =
            decode_value(key.kind(), payload, payload_start).map_err(|e| match e {
                FakeLabError::General(reason) => FakeLabError::MalformedEntry {
                    key: code,
                    offset,
                    glyph: None,
                    reason,
                },
                FakeLabError::Truncated { .. } => FakeLabError::MalformedEntry {
                    key: code,
                    offset,
                    glyph: None,
                    reason: "payload ends early".to_string(),
                },
                other => other,
            })?;
        log::trace!("Entry {:?} at {}, {} bytes", key, offset, len);
        entries.push(Entry { key, offset, value });
    }
    if !cursor.at_end() {
        log::warn!(
            "Ignoring {} bytes after the end marker",
            data.len() - cursor.pos
        );
    }
    Ok((header, entries))
}

/// Builds a complete file from a header and entries, adding the end marker.
pub fn compile(header: &Header, entries: &[Entry]) -> Result<Vec<u8>, FakeLabError> {
    let mut out = MAGIC.to_vec();
    out.extend_from_slice(&header.version.to_le_bytes());
    out.extend_from_slice(&header.flags.to_le_bytes());
    out.extend_from_slice(&header.creator.to_le_bytes());
    for entry in entries {
        let payload = encode_value(&entry.value)?;
        write_entry(&mut out, entry.key.code(), &payload)?;
    }
    write_entry(&mut out, EntryKey::End.code(), &[])?;
    Ok(out)
}

fn write_entry(out: &mut Vec<u8>, code: u16, payload: &[u8]) -> Result<(), FakeLabError> {
    if code & LONG_LENGTH != 0 {
        return Err(FakeLabError::General(format!("Key {} out of range", code)));
    }
    match u16::try_from(payload.len()) {
        Ok(len) => {
            out.extend_from_slice(&code.to_le_bytes());
            out.extend_from_slice(&len.to_le_bytes());
        }
        Err(_) => {
            let len = u32::try_from(payload.len()).map_err(|_| {
                FakeLabError::General(format!("Entry {} too large to encode", code))
            })?;
            out.extend_from_slice(&(code | LONG_LENGTH).to_le_bytes());
            out.extend_from_slice(&len.to_le_bytes());
        }
    }
    out.extend_from_slice(payload);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0, 1)]
    #[case(-107, 1)]
    #[case(107, 1)]
    #[case(108, 2)]
    #[case(1131, 2)]
    #[case(-1131, 2)]
    #[case(1132, 5)]
    #[case(i32::MIN, 5)]
    fn test_varint(#[case] value: i32, #[case] size: usize) {
        let mut out = vec![];
        write_varint(&mut out, value);
        assert_eq!(out.len(), size);
        let mut cursor = Cursor::new(&out, 0);
        assert_eq!(cursor.varint().unwrap(), value);
        assert!(cursor.at_end());
    }

    #[test]
    fn test_stream() {
        let entries = vec![
            Entry::str(EntryKey::FontName, "Test-Regular"),
            Entry::int(EntryKey::Upm, 2048),
            Entry::ints(EntryKey::Xuid, vec![1, -2, 30000]),
            Entry::float(EntryKey::ItalicAngle, -12.5),
            Entry::new(EntryKey::Glyph, EntryValue::Record(vec![1, 9, 7, 1, 140, b'a'])),
            Entry::raw(EntryKey::Unknown(4000), vec![1, 2, 3]),
            Entry::raw(EntryKey::Cvt, vec![7; 70_000]),
        ];
        let bytes = compile(&Header::default(), &entries).unwrap();
        let (header, back) = decompile(&bytes).unwrap();
        assert_eq!(header, Header::default());
        assert_eq!(back.len(), entries.len());
        for (a, b) in entries.iter().zip(back.iter()) {
            assert_eq!(a.key, b.key);
            assert_eq!(a.value, b.value);
        }
        assert_eq!(back[0].offset, 14);
    }

    #[test]
    fn test_not_a_vfb() {
        assert!(matches!(
            decompile(b"PK\x03\x04 not a font"),
            Err(FakeLabError::NotAVfb { .. })
        ));
        assert!(matches!(decompile(b"\x1a"), Err(FakeLabError::NotAVfb { .. })));
    }

    #[test]
    fn test_truncated() {
        let bytes = compile(&Header::default(), &[Entry::str(EntryKey::FontName, "Test")]).unwrap();
        // Drop the end marker
        let cut = &bytes[..bytes.len() - 4];
        assert!(matches!(
            decompile(cut),
            Err(FakeLabError::Truncated { offset, .. }) if offset == cut.len()
        ));
        // Payload shorter than its declared length
        assert!(matches!(
            decompile(&bytes[..20]),
            Err(FakeLabError::Truncated { .. })
        ));
    }

    #[test]
    fn test_malformed_payload() {
        let mut bytes = compile(&Header::default(), &[]).unwrap();
        bytes.truncate(bytes.len() - 4);
        // An Int entry with two values
        bytes.extend_from_slice(&EntryKey::Upm.code().to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&[139, 139]);
        bytes.extend_from_slice(&[5, 0, 0, 0]);
        match decompile(&bytes) {
            Err(FakeLabError::MalformedEntry { key, offset, .. }) => {
                assert_eq!(key, EntryKey::Upm.code());
                assert_eq!(offset, 14);
            }
            other => panic!("Expected a malformed entry, got {:?}", other),
        }
    }
}
