//! Multilinear interpolation of multiple-master fonts.
//!
//! A font with `N` axes has `2^N` masters sitting on the corners of the unit
//! hypercube, master `i` having bit `n` set when it lies at the far end of
//! axis `n`. An instance at a location inside the cube is a weighted sum of
//! the corners; [`Mutator`] holds those weights and [`interpolate`] applies
//! them to every per-master value in a font.
use std::fmt::Display;

use indexmap::IndexMap;

use crate::{
    common::{MasterValues, Point},
    font::MAX_AXES,
    master::PostScriptInfo,
    Axis, FakeLabError, Font, Glyph, Guide, Master,
};

/// Where to take an instance, keyed by axis name.
///
/// Axes may be named by their full name or their short name, in any case.
/// Axes left out sit at 0.0, the position of the first master.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// Positions already on the 0..1 normalized scale
    Normalized(IndexMap<String, f64>),
    /// Positions in user units, mapped through each axis' mapping curve
    User(IndexMap<String, f64>),
}

impl Location {
    pub fn normalized<S: Into<String>>(values: impl IntoIterator<Item = (S, f64)>) -> Self {
        Location::Normalized(values.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn user<S: Into<String>>(values: impl IntoIterator<Item = (S, f64)>) -> Self {
        Location::User(values.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    fn values(&self) -> &IndexMap<String, f64> {
        match self {
            Location::Normalized(v) | Location::User(v) => v,
        }
    }

    /// The normalized position on each of `axes`, in axis order.
    pub fn resolve(&self, axes: &[Axis]) -> Result<Vec<f64>, FakeLabError> {
        let mut coords = vec![0.0; axes.len()];
        for (name, value) in self.values() {
            let index = axes
                .iter()
                .position(|axis| {
                    axis.name.eq_ignore_ascii_case(name)
                        || axis.short_name().eq_ignore_ascii_case(name)
                })
                .ok_or_else(|| FakeLabError::General(format!("Unknown axis {}", name)))?;
            let normalized = match self {
                Location::Normalized(_) => *value,
                Location::User(_) => axes[index].normalize(*value),
            };
            if !(0.0..=1.0).contains(&normalized) {
                log::warn!(
                    "Clamping {} on axis {} to the master range",
                    normalized,
                    axes[index].name
                );
            }
            coords[index] = normalized.clamp(0.0, 1.0);
        }
        Ok(coords)
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .values()
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Values that can be combined as a weighted sum of masters.
pub trait Blend: Sized {
    fn blend(values: &[Self], weights: &[f64]) -> Self;
}

fn weighted(values: impl Iterator<Item = f64>, weights: &[f64]) -> f64 {
    values.zip(weights).map(|(v, w)| v * w).sum()
}

impl Blend for i32 {
    fn blend(values: &[Self], weights: &[f64]) -> Self {
        weighted(values.iter().map(|v| *v as f64), weights).round() as i32
    }
}

impl Blend for f64 {
    fn blend(values: &[Self], weights: &[f64]) -> Self {
        weighted(values.iter().copied(), weights)
    }
}

impl Blend for Point {
    fn blend(values: &[Self], weights: &[f64]) -> Self {
        Point::new(
            weighted(values.iter().map(|p| p.x as f64), weights).round() as i32,
            weighted(values.iter().map(|p| p.y as f64), weights).round() as i32,
        )
    }
}

impl Blend for (f64, f64) {
    fn blend(values: &[Self], weights: &[f64]) -> Self {
        (
            weighted(values.iter().map(|v| v.0), weights),
            weighted(values.iter().map(|v| v.1), weights),
        )
    }
}

/// Corner weights for one location.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutator {
    weights: Vec<f64>,
}

impl Mutator {
    /// Builds the weights for normalized coordinates, one per axis.
    pub fn new(coords: &[f64]) -> Result<Mutator, FakeLabError> {
        if coords.len() > MAX_AXES {
            return Err(FakeLabError::UnsupportedAxisCount {
                count: coords.len(),
            });
        }
        let weights = (0..1usize << coords.len())
            .map(|corner| {
                coords
                    .iter()
                    .enumerate()
                    .map(|(axis, t)| if corner & (1 << axis) != 0 { *t } else { 1.0 - t })
                    .product::<f64>()
            })
            .collect();
        Ok(Mutator { weights })
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Blends one value per master.
    pub fn blend<T: Blend>(&self, values: &[T]) -> Result<T, FakeLabError> {
        if values.len() != self.weights.len() {
            return Err(FakeLabError::MasterCountMismatch {
                what: "interpolated value".to_string(),
                expected: self.weights.len(),
                found: values.len(),
            });
        }
        Ok(T::blend(values, &self.weights))
    }

    /// Blends arrays element by element.
    ///
    /// Masters with shorter arrays contribute zeros for the missing elements.
    pub fn blend_arrays(&self, arrays: &[&Vec<i32>]) -> Result<Vec<i32>, FakeLabError> {
        let len = arrays.iter().map(|a| a.len()).max().unwrap_or(0);
        if arrays.iter().any(|a| a.len() != len) {
            log::warn!("Blending arrays of differing lengths; padding with zeros");
        }
        (0..len)
            .map(|ix| {
                let column: Vec<i32> = arrays
                    .iter()
                    .map(|a| a.get(ix).copied().unwrap_or(0))
                    .collect();
                self.blend(&column)
            })
            .collect()
    }

    fn collapse<T: Blend + Clone>(&self, values: &mut MasterValues<T>) -> Result<(), FakeLabError> {
        *values = MasterValues::splat(self.blend(values.live())?);
        Ok(())
    }

    fn postscript(&self, masters: &[Master]) -> Result<PostScriptInfo, FakeLabError> {
        let ps: Vec<&PostScriptInfo> = masters.iter().map(|m| &m.ps).collect();
        macro_rules! scalar {
            ($field:ident) => {
                self.blend(&ps.iter().map(|p| p.$field).collect::<Vec<_>>())?
            };
        }
        macro_rules! array {
            ($field:ident) => {
                self.blend_arrays(&ps.iter().map(|p| &p.$field).collect::<Vec<_>>())?
            };
        }
        Ok(PostScriptInfo {
            force_bold: scalar!(force_bold),
            blue_values: array!(blue_values),
            other_blues: array!(other_blues),
            family_blues: array!(family_blues),
            family_other_blues: array!(family_other_blues),
            stem_snap_h: array!(stem_snap_h),
            stem_snap_v: array!(stem_snap_v),
            blue_scale: scalar!(blue_scale),
            blue_shift: scalar!(blue_shift),
            blue_fuzz: scalar!(blue_fuzz),
            std_hw: scalar!(std_hw),
            std_vw: scalar!(std_vw),
            ascender: scalar!(ascender),
            descender: scalar!(descender),
            x_height: scalar!(x_height),
            cap_height: scalar!(cap_height),
        })
    }

    fn guides(&self, guides: &mut [Guide]) -> Result<(), FakeLabError> {
        for guide in guides.iter_mut() {
            self.collapse(&mut guide.positions)?;
            self.collapse(&mut guide.angles)?;
        }
        Ok(())
    }

    /// Collapses every per-master value of a glyph, and of its mask, to one master.
    fn glyph(&self, glyph: &mut Glyph) -> Result<(), FakeLabError> {
        if glyph.layers_number() != self.weights.len() {
            return Err(FakeLabError::MasterCountMismatch {
                what: format!("glyph {}", glyph.name),
                expected: self.weights.len(),
                found: glyph.layers_number(),
            });
        }
        for node in glyph.nodes.iter_mut() {
            for point in node.points_mut() {
                self.collapse(point)?;
            }
        }
        for component in glyph.components.iter_mut() {
            self.collapse(&mut component.deltas)?;
            self.collapse(&mut component.scales)?;
        }
        for anchor in glyph.anchors.iter_mut() {
            self.collapse(&mut anchor.positions)?;
        }
        for hint in glyph.hhints.iter_mut().chain(glyph.vhints.iter_mut()) {
            self.collapse(&mut hint.positions)?;
            self.collapse(&mut hint.widths)?;
        }
        for pair in glyph.kerning.iter_mut() {
            self.collapse(&mut pair.values)?;
        }
        self.guides(&mut glyph.hguides)?;
        self.guides(&mut glyph.vguides)?;
        self.collapse(&mut glyph.metrics)?;
        if let Some(mask) = glyph.mask.as_mut() {
            self.glyph(mask)?;
        }
        glyph.set_layers_number(1)
    }
}

/// Checks that `font` has a full set of masters for its axes and builds the
/// mutator for `location`.
fn mutator_for(font: &Font, location: &Location) -> Result<Mutator, FakeLabError> {
    let axes = font.axes.len();
    if axes > MAX_AXES {
        return Err(FakeLabError::UnsupportedAxisCount { count: axes });
    }
    if font.masters.len() != 1 << axes {
        return Err(FakeLabError::MasterCountMismatch {
            what: format!("font with {} axes", axes),
            expected: 1 << axes,
            found: font.masters.len(),
        });
    }
    let coords = location.resolve(&font.axes)?;
    Mutator::new(&coords)
}

/// Computes a single-master instance of `font` at `location`.
///
/// A font without axes is returned as a copy. Integer values are rounded
/// to the nearest integer, half away from zero; float values such as blue
/// scale and component scales are kept unrounded.
pub fn interpolate(font: &Font, location: &Location) -> Result<Font, FakeLabError> {
    if font.axes.is_empty() {
        return Ok(font.clone());
    }
    let mutator = mutator_for(font, location)?;
    log::info!("Interpolating instance at {}", location);

    let mut instance = font.clone();
    let mut master = Master::new(location.to_string());
    master.ps = mutator.postscript(&font.masters)?;
    instance.masters = vec![master];
    instance.axes = vec![];
    instance.weight_vector = vec![1.0];
    mutator.guides(&mut instance.hguides)?;
    mutator.guides(&mut instance.vguides)?;
    for glyph in instance.glyphs.iter_mut() {
        mutator.glyph(glyph)?;
    }
    Ok(instance)
}

/// Computes one glyph of `font` at `location`, as a single-master glyph.
pub fn interpolate_glyph(
    font: &Font,
    name: &str,
    location: &Location,
) -> Result<Glyph, FakeLabError> {
    let mut glyph = font
        .glyph(name)
        .cloned()
        .ok_or_else(|| FakeLabError::GlyphNotFound {
            glyph: name.to_string(),
        })?;
    if font.axes.is_empty() {
        return Ok(glyph);
    }
    mutator_for(font, location)?.glyph(&mut glyph)?;
    Ok(glyph)
}
