use std::path::Path;

use crate::{FakeLabError, Font};

pub mod keys;
pub mod reader;
pub mod records;
pub mod stream;
pub mod writer;

pub use keys::{EntryKey, PayloadKind};
pub use stream::{Entry, EntryValue, Header};

/// An entry kept byte-for-byte because its key is not understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub key: u16,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct VfbReadOptions {
    /// Fail on unknown entries instead of preserving them
    pub strict: bool,
}

#[derive(Debug, Clone, Default)]
pub struct VfbWriteOptions {
    /// Emit optional sections even when they are empty
    pub always_emit_optional: bool,
}

/// Decodes a VFB file.
pub fn load(path: &Path, options: &VfbReadOptions) -> Result<Font, FakeLabError> {
    let data = std::fs::read(path)?;
    let font = from_bytes(&data, options)?;
    log::info!(
        "Loaded {:?}: {} glyphs, {} masters",
        path,
        font.glyphs.len(),
        font.master_count()
    );
    Ok(font)
}

pub fn from_bytes(data: &[u8], options: &VfbReadOptions) -> Result<Font, FakeLabError> {
    let (_header, entries) = stream::decompile(data)?;
    reader::read(&entries, options)
}

/// Encodes a font and writes it out in one go.
pub fn save(font: &Font, path: &Path, options: &VfbWriteOptions) -> Result<(), FakeLabError> {
    let data = to_bytes(font, options)?;
    std::fs::write(path, data)?;
    log::info!("Saved {:?}", path);
    Ok(())
}

pub fn to_bytes(font: &Font, options: &VfbWriteOptions) -> Result<Vec<u8>, FakeLabError> {
    let entries = writer::write(font, options)?;
    stream::compile(&Header::default(), &entries)
}
