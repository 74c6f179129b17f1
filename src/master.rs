use crate::{
    common::Interpolate, convertors::vfb::records::PostScriptInfoRecord, FakeLabError,
};

/// Stored lengths of the padded PostScript zone arrays.
pub const BLUE_VALUES_SIZE: usize = 14;
pub const OTHER_BLUES_SIZE: usize = 10;
pub const FAMILY_BLUES_SIZE: usize = 14;
pub const FAMILY_OTHER_BLUES_SIZE: usize = 10;
pub const STEM_SNAP_SIZE: usize = 12;

/// PostScript hinting and vertical metrics of one master.
#[derive(Debug, Clone, PartialEq)]
pub struct PostScriptInfo {
    pub force_bold: i32,
    pub blue_values: Vec<i32>,
    pub other_blues: Vec<i32>,
    pub family_blues: Vec<i32>,
    pub family_other_blues: Vec<i32>,
    pub stem_snap_h: Vec<i32>,
    pub stem_snap_v: Vec<i32>,
    pub blue_scale: f64,
    pub blue_shift: i32,
    pub blue_fuzz: i32,
    pub std_hw: i32,
    pub std_vw: i32,
    pub ascender: i32,
    pub descender: i32,
    pub x_height: i32,
    pub cap_height: i32,
}

impl Default for PostScriptInfo {
    fn default() -> Self {
        PostScriptInfo {
            force_bold: 0,
            blue_values: vec![],
            other_blues: vec![],
            family_blues: vec![],
            family_other_blues: vec![],
            stem_snap_h: vec![],
            stem_snap_v: vec![],
            blue_scale: 0.039625,
            blue_shift: 7,
            blue_fuzz: 1,
            std_hw: 0,
            std_vw: 0,
            ascender: 750,
            descender: -250,
            x_height: 500,
            cap_height: 700,
        }
    }
}

fn padded(values: &[i32], size: usize) -> Vec<i32> {
    let mut out = values.to_vec();
    out.resize(size.max(values.len()), 0);
    out
}

impl PostScriptInfo {
    /// The record as stored, with every zone array padded to its fixed size.
    pub(crate) fn serialize(&self) -> PostScriptInfoRecord {
        PostScriptInfoRecord {
            force_bold: self.force_bold,
            blue_values: padded(&self.blue_values, BLUE_VALUES_SIZE),
            other_blues: padded(&self.other_blues, OTHER_BLUES_SIZE),
            family_blues: padded(&self.family_blues, FAMILY_BLUES_SIZE),
            family_other_blues: padded(&self.family_other_blues, FAMILY_OTHER_BLUES_SIZE),
            stem_snap_h: padded(&self.stem_snap_h, STEM_SNAP_SIZE),
            stem_snap_v: padded(&self.stem_snap_v, STEM_SNAP_SIZE),
            blue_scale: self.blue_scale,
            blue_shift: self.blue_shift,
            blue_fuzz: self.blue_fuzz,
            std_hw: self.std_hw,
            std_vw: self.std_vw,
            ascender: self.ascender,
            descender: self.descender,
            x_height: self.x_height,
            cap_height: self.cap_height,
        }
    }

    /// Reads a record; arrays stay padded until the live counts are known.
    pub(crate) fn deserialize(record: &PostScriptInfoRecord) -> PostScriptInfo {
        PostScriptInfo {
            force_bold: record.force_bold,
            blue_values: record.blue_values.clone(),
            other_blues: record.other_blues.clone(),
            family_blues: record.family_blues.clone(),
            family_other_blues: record.family_other_blues.clone(),
            stem_snap_h: record.stem_snap_h.clone(),
            stem_snap_v: record.stem_snap_v.clone(),
            blue_scale: record.blue_scale,
            blue_shift: record.blue_shift,
            blue_fuzz: record.blue_fuzz,
            std_hw: record.std_hw,
            std_vw: record.std_vw,
            ascender: record.ascender,
            descender: record.descender,
            x_height: record.x_height,
            cap_height: record.cap_height,
        }
    }
}

impl Interpolate for PostScriptInfo {
    fn interpolate(&self, other: &Self, factor: f64) -> Result<Self, FakeLabError> {
        Ok(PostScriptInfo {
            force_bold: self.force_bold.interpolate(&other.force_bold, factor)?,
            blue_values: self.blue_values.interpolate(&other.blue_values, factor)?,
            other_blues: self.other_blues.interpolate(&other.other_blues, factor)?,
            family_blues: self.family_blues.interpolate(&other.family_blues, factor)?,
            family_other_blues: self
                .family_other_blues
                .interpolate(&other.family_other_blues, factor)?,
            stem_snap_h: self.stem_snap_h.interpolate(&other.stem_snap_h, factor)?,
            stem_snap_v: self.stem_snap_v.interpolate(&other.stem_snap_v, factor)?,
            blue_scale: self.blue_scale.interpolate(&other.blue_scale, factor)?,
            blue_shift: self.blue_shift.interpolate(&other.blue_shift, factor)?,
            blue_fuzz: self.blue_fuzz.interpolate(&other.blue_fuzz, factor)?,
            std_hw: self.std_hw.interpolate(&other.std_hw, factor)?,
            std_vw: self.std_vw.interpolate(&other.std_vw, factor)?,
            ascender: self.ascender.interpolate(&other.ascender, factor)?,
            descender: self.descender.interpolate(&other.descender, factor)?,
            x_height: self.x_height.interpolate(&other.x_height, factor)?,
            cap_height: self.cap_height.interpolate(&other.cap_height, factor)?,
        })
    }
}

/// One master of a multiple-master font.
#[derive(Debug, Clone, PartialEq)]
pub struct Master {
    pub name: String,
    /// Normalized position on each axis
    pub location: Vec<f64>,
    pub ps: PostScriptInfo,
}

impl Default for Master {
    fn default() -> Self {
        Master::new("Regular")
    }
}

impl Master {
    pub fn new(name: impl Into<String>) -> Self {
        Master {
            name: name.into(),
            location: vec![],
            ps: PostScriptInfo::default(),
        }
    }

    /// The hypercube corner of a master index: bit `n` gives the position on axis `n`.
    pub fn corner_location(index: usize, axis_count: usize) -> Vec<f64> {
        (0..axis_count)
            .map(|axis| if index & (1 << axis) != 0 { 1.0 } else { 0.0 })
            .collect()
    }
}

impl Interpolate for Master {
    fn interpolate(&self, other: &Self, factor: f64) -> Result<Self, FakeLabError> {
        Ok(Master {
            name: self.name.clone(),
            location: self.location.interpolate(&other.location, factor)?,
            ps: self.ps.interpolate(&other.ps, factor)?,
        })
    }
}
