#![deny(clippy::unwrap_used, clippy::expect_used)]

mod anchor;
mod axis;
pub mod classes;
pub mod common;
mod component;
pub mod convertors;
pub mod encoding;
mod error;
mod features;
pub mod filters;
mod font;
mod glyph;
mod guide;
mod hint;
mod image;
pub mod interpolate;
mod kerning;
pub mod master;
pub mod names;
mod node;
pub mod ttinfo;

pub use crate::{
    anchor::Anchor,
    axis::Axis,
    classes::{ClassFlags, ClassList, GlyphClass},
    common::{Interpolate, MasterValues, Matrix, Point, Rect, MAX_MASTERS},
    component::Component,
    convertors::vfb::{VfbReadOptions, VfbWriteOptions},
    encoding::{Encoding, EncodingRecord},
    error::FakeLabError,
    features::Features,
    font::{Font, MAX_AXES},
    glyph::{GdefData, Glyph, GlyphList},
    guide::{Guide, GuideOrientation},
    hint::{Hint, Link, Replace, ReplaceTarget, ReplaceType},
    image::Image,
    interpolate::{interpolate, interpolate_glyph, Location, Mutator},
    kerning::{expand_kerning, KerningPair},
    master::{Master, PostScriptInfo},
    names::{NameRecord, Names},
    node::{Alignment, Node, NodeType},
    ttinfo::TTInfo,
};
use std::path::PathBuf;

/// Opens a font file, choosing the format from its extension.
pub fn load(filename: impl Into<PathBuf>) -> Result<Font, FakeLabError> {
    let pb = filename.into();
    match pb.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("vfb") => Font::open(&pb),
        _ => Err(FakeLabError::UnknownFileType { path: pb }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_extension() {
        assert!(matches!(
            load("font.ufo"),
            Err(FakeLabError::UnknownFileType { .. })
        ));
    }
}
