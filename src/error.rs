use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::NodeType;

#[derive(Debug, Error)]
pub enum FakeLabError {
    #[error("Unknown file type for file {path:?}")]
    UnknownFileType { path: PathBuf },

    #[error("{path:?}: {source}")]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<FakeLabError>,
    },

    #[error("Not a VFB file: {reason}")]
    NotAVfb { reason: String },

    #[error("Stream truncated at byte {offset}: needed {needed} more bytes")]
    Truncated { offset: usize, needed: usize },

    #[error("Malformed entry {key} at byte {offset}{}: {reason}", glyph.as_ref().map(|g| format!(" (glyph {g})")).unwrap_or_default())]
    MalformedEntry {
        key: u16,
        offset: usize,
        glyph: Option<String>,
        reason: String,
    },

    #[error("Unknown entry {key} at byte {offset} rejected in strict mode")]
    UnknownEntry { key: u16, offset: usize },

    #[error("{nodetype:?} node needs {expected} points per master, master {master} has {found}")]
    NodePointCount {
        nodetype: NodeType,
        expected: usize,
        found: usize,
        master: usize,
    },

    #[error("{what}: expected {expected} masters, found {found}")]
    MasterCountMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    #[error("Cannot have {requested} masters; the format allows at most 16")]
    TooManyMasters { requested: usize },

    #[error("Interpolation supports 1 to 4 axes, font has {count}")]
    UnsupportedAxisCount { count: usize },

    #[error("Unresolved reference: {what} {index}")]
    UnresolvedReference { what: String, index: i32 },

    #[error("Glyph {glyph} not found")]
    GlyphNotFound { glyph: String },

    #[error("{what} index {index} out of range (length {len})")]
    IndexOutOfRange {
        what: String,
        index: usize,
        len: usize,
    },

    #[error("Error parsing font: {0}")]
    General(String),

    #[error("Filter error: {0}")]
    FilterError(String),

    #[error("IO Error: {0}")]
    IO(#[from] io::Error),
}

impl FakeLabError {
    pub(crate) fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            FakeLabError::InFile { .. } => self,
            other => FakeLabError::InFile {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// Attaches the name of the glyph under construction to an entry error.
    pub(crate) fn in_glyph(self, name: &str) -> Self {
        match self {
            FakeLabError::MalformedEntry {
                key,
                offset,
                glyph: None,
                reason,
            } => FakeLabError::MalformedEntry {
                key,
                offset,
                glyph: Some(name.to_string()),
                reason,
            },
            other => other,
        }
    }
}
