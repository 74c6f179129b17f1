use std::path::Path;

use chrono::Datelike;
use font_types::{NameId, Tag};
use indexmap::IndexMap;
use paste::paste;

use crate::{
    axis::Axis,
    classes::ClassList,
    common::{remove_axis_from_list_at, Point, Rect, MAX_MASTERS},
    convertors::vfb::{self, RawEntry, VfbReadOptions, VfbWriteOptions},
    encoding::Encoding,
    features::Features,
    glyph::GlyphList,
    kerning,
    master::Master,
    names::{NameRecord, Names},
    ttinfo::TTInfo,
    ClassFlags, FakeLabError, Glyph, Guide,
};

/// The largest number of axes a font can have: each axis doubles the masters.
pub const MAX_AXES: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub names: Names,
    /// Explicit name table records
    pub name_records: Vec<NameRecord>,
    pub year: i32,
    pub version_major: i32,
    pub version_minor: i32,
    pub upm: i32,
    pub fond_id: i32,
    pub pcl_id: i32,
    pub vp_id: i32,
    pub ms_id: i32,
    pub weight_code: i32,
    pub unique_id: i32,
    pub xuid: Vec<i32>,
    pub italic_angle: f64,
    pub slant_angle: f64,
    pub underline_position: i32,
    pub underline_thickness: i32,
    pub is_fixed_pitch: bool,
    pub ms_charset: i32,
    /// Set bits of the OS/2 unicode range fields
    pub unicode_ranges: Vec<u8>,
    pub weight_vector: Vec<f64>,
    pub note: String,
    pub custom_data: String,
    pub export_options: Vec<i32>,
    pub opentype_export_options: Vec<i32>,

    pub axes: Vec<Axis>,
    /// One master per corner of the axis hypercube, `2^axes` in total
    pub masters: Vec<Master>,
    pub encoding: Encoding,
    pub classes: ClassList,
    pub glyphs: GlyphList,
    pub features: Features,
    /// Binary tables copied verbatim into generated fonts
    pub truetype_tables: IndexMap<Tag, Vec<u8>>,
    pub ttinfo: TTInfo,
    pub hguides: Vec<Guide>,
    pub vguides: Vec<Guide>,
    /// Entries read from a file which this library does not interpret
    pub unknown_entries: Vec<RawEntry>,
}

impl Default for Font {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! per_master_metrics {
    ($($field:ident: $ty:ty),* $(,)?) => {
        paste! {
            impl Font {
                $(
                    #[doc = "The `" $field "` of every master."]
                    pub fn $field(&self) -> Vec<$ty> {
                        self.masters.iter().map(|m| m.ps.$field.clone()).collect()
                    }

                    #[doc = "Sets the `" $field "` of every master."]
                    pub fn [<set_ $field>](&mut self, value: $ty) {
                        for master in self.masters.iter_mut() {
                            master.ps.$field = value.clone();
                        }
                    }

                    pub fn [<set_ $field _at>](
                        &mut self,
                        master: usize,
                        value: $ty,
                    ) -> Result<(), FakeLabError> {
                        let len = self.masters.len();
                        let m = self.masters.get_mut(master).ok_or_else(|| {
                            FakeLabError::IndexOutOfRange {
                                what: "master".to_string(),
                                index: master,
                                len,
                            }
                        })?;
                        m.ps.$field = value;
                        Ok(())
                    }
                )*
            }
        }
    };
}

per_master_metrics!(
    ascender: i32,
    descender: i32,
    x_height: i32,
    cap_height: i32,
    force_bold: i32,
    blue_values: Vec<i32>,
    other_blues: Vec<i32>,
    family_blues: Vec<i32>,
    family_other_blues: Vec<i32>,
    stem_snap_h: Vec<i32>,
    stem_snap_v: Vec<i32>,
    blue_scale: f64,
    blue_shift: i32,
    blue_fuzz: i32,
    std_hw: i32,
    std_vw: i32,
);

impl Font {
    pub fn new() -> Self {
        Font {
            names: Names::default(),
            name_records: vec![],
            year: chrono::Local::now().year(),
            version_major: 1,
            version_minor: 0,
            upm: 1000,
            fond_id: 0,
            pcl_id: 0,
            vp_id: 0,
            ms_id: 0,
            weight_code: 400,
            unique_id: 0,
            xuid: vec![],
            italic_angle: 0.0,
            slant_angle: 0.0,
            underline_position: -100,
            underline_thickness: 50,
            is_fixed_pitch: false,
            ms_charset: 0,
            unicode_ranges: vec![],
            weight_vector: vec![1.0],
            note: String::new(),
            custom_data: String::new(),
            export_options: vec![],
            opentype_export_options: vec![],
            axes: vec![],
            masters: vec![Master::default()],
            encoding: Encoding::default(),
            classes: ClassList::new(),
            glyphs: GlyphList::default(),
            features: Features::default(),
            truetype_tables: IndexMap::new(),
            ttinfo: TTInfo::default(),
            hguides: vec![],
            vguides: vec![],
            unknown_entries: vec![],
        }
    }

    /// Reads a VFB file.
    pub fn open(path: impl AsRef<Path>) -> Result<Font, FakeLabError> {
        Font::open_with_options(path, &VfbReadOptions::default())
    }

    pub fn open_with_options(
        path: impl AsRef<Path>,
        options: &VfbReadOptions,
    ) -> Result<Font, FakeLabError> {
        let path = path.as_ref();
        vfb::load(path, options).map_err(|e| e.in_file(path))
    }

    /// Writes the font as a VFB file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), FakeLabError> {
        self.save_with_options(path, &VfbWriteOptions::default())
    }

    pub fn save_with_options(
        &self,
        path: impl AsRef<Path>,
        options: &VfbWriteOptions,
    ) -> Result<(), FakeLabError> {
        let path = path.as_ref();
        vfb::save(self, path, options).map_err(|e| e.in_file(path))
    }

    pub fn master_count(&self) -> usize {
        self.masters.len()
    }

    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    /// The name a `name` table would carry for an id: an explicit Windows
    /// English record if there is one, otherwise the matching identity string.
    pub fn name(&self, name_id: NameId) -> Option<&str> {
        self.name_records
            .iter()
            .find(|r| r.name_id == name_id && r.platform_id == 3 && r.language_id == 0x409)
            .map(|r| r.value.as_str())
            .or_else(|| self.names.get(name_id))
    }

    /// Adds a glyph at the end of the glyph list, returning its index.
    ///
    /// A single-master glyph is widened to the font's masters; any other
    /// master count must match the font's.
    pub fn append_glyph(&mut self, mut glyph: Glyph) -> Result<usize, FakeLabError> {
        self.fit_glyph(&mut glyph)?;
        Ok(self.glyphs.push(glyph))
    }

    pub fn insert_glyph(&mut self, index: usize, mut glyph: Glyph) -> Result<(), FakeLabError> {
        self.fit_glyph(&mut glyph)?;
        self.glyphs.insert(index, glyph)
    }

    /// Detaches a glyph. The glyphs after it move down one index; references
    /// to them by index are not rewritten.
    pub fn remove_glyph(&mut self, index: usize) -> Result<Glyph, FakeLabError> {
        self.glyphs.remove(index)
    }

    fn fit_glyph(&self, glyph: &mut Glyph) -> Result<(), FakeLabError> {
        let masters = self.master_count();
        if glyph.layers_number() == masters {
            return Ok(());
        }
        if glyph.layers_number() != 1 {
            return Err(FakeLabError::MasterCountMismatch {
                what: format!("glyph {}", glyph.name),
                expected: masters,
                found: glyph.layers_number(),
            });
        }
        glyph.set_layers_number(masters)
    }

    pub fn glyph(&self, name: &str) -> Option<&Glyph> {
        self.glyphs.get_by_name(name)
    }

    pub fn glyph_mut(&mut self, index: usize) -> Option<&mut Glyph> {
        self.glyphs.get_mut(index)
    }

    /// Index of the first glyph with this name, or -1.
    pub fn find_glyph(&self, name: &str) -> i32 {
        self.glyphs
            .iter()
            .position(|g| g.name == name)
            .and_then(|ix| i32::try_from(ix).ok())
            .unwrap_or(-1)
    }

    /// Index of the first glyph mapped to this code point, or -1.
    pub fn find_glyph_by_unicode(&self, unicode: u32) -> i32 {
        self.glyphs
            .iter()
            .position(|g| g.unicodes.contains(&unicode))
            .and_then(|ix| i32::try_from(ix).ok())
            .unwrap_or(-1)
    }

    pub fn get_class_left(&self, index: usize) -> Result<bool, FakeLabError> {
        self.classes.get_class_left(index)
    }

    pub fn get_class_right(&self, index: usize) -> Result<bool, FakeLabError> {
        self.classes.get_class_right(index)
    }

    pub fn get_class_metrics_flags(&self, index: usize) -> Result<ClassFlags, FakeLabError> {
        self.classes.flags(index)
    }

    /// The flat kerning table of one master.
    pub fn expand_kerning(
        &self,
        master: usize,
    ) -> Result<std::collections::BTreeMap<(String, String), i32>, FakeLabError> {
        kerning::expand_kerning(self, master)
    }

    /// Adds a design axis, doubling every per-master value.
    ///
    /// The new masters start as copies of the existing ones, placed at the
    /// far end of the new axis.
    pub fn add_axis(&mut self, axis: Axis) -> Result<(), FakeLabError> {
        if self.axes.len() >= MAX_AXES || self.master_count() * 2 > MAX_MASTERS {
            return Err(FakeLabError::TooManyMasters {
                requested: self.master_count() * 2,
            });
        }
        for glyph in self.glyphs.iter_mut() {
            glyph.add_axis()?;
        }
        for guide in self.hguides.iter_mut().chain(self.vguides.iter_mut()) {
            guide.add_axis()?;
        }
        let mut added = self.masters.clone();
        for master in self.masters.iter_mut() {
            master.location.push(0.0);
        }
        for master in added.iter_mut() {
            master.location.push(1.0);
        }
        self.masters.extend(added);
        // The current instance sits at the start of the new axis.
        let masters = self.masters.len();
        self.weight_vector.resize(masters, 0.0);
        log::info!(
            "Added axis {}; font now has {} masters",
            axis.name,
            self.masters.len()
        );
        self.axes.push(axis);
        Ok(())
    }

    /// Removes a design axis, blending each pair of masters that differ only
    /// along it. `factor` is the position kept on that axis.
    ///
    /// This is lossy: adding the axis back does not restore the removed masters.
    pub fn remove_axis(&mut self, axis: usize, factor: f64) -> Result<(), FakeLabError> {
        if axis >= self.axes.len() {
            return Err(FakeLabError::IndexOutOfRange {
                what: "axis".to_string(),
                index: axis,
                len: self.axes.len(),
            });
        }
        for glyph in self.glyphs.iter_mut() {
            glyph.remove_axis(axis, factor)?;
        }
        for guide in self.hguides.iter_mut().chain(self.vguides.iter_mut()) {
            guide.remove_axis(axis, factor)?;
        }
        let mut masters = remove_axis_from_list_at(&self.masters, axis, factor)?;
        for master in masters.iter_mut() {
            if axis < master.location.len() {
                master.location.remove(axis);
            }
        }
        self.masters = masters;
        self.weight_vector = remove_axis_from_list_at(&self.weight_vector, axis, factor)?;
        let removed = self.axes.remove(axis);
        log::info!(
            "Removed axis {} at {}; font now has {} masters",
            removed.name,
            factor,
            self.masters.len()
        );
        Ok(())
    }

    /// The bounding box of a glyph in one master, components included.
    ///
    /// Fails on a component pointing outside the glyph list or on a glyph
    /// that contains itself.
    pub fn glyph_bounding_rect(
        &self,
        index: usize,
        master: usize,
    ) -> Result<Option<Rect>, FakeLabError> {
        let mut stack = vec![];
        self.bounds_inner(index, master, &mut stack)
    }

    fn bounds_inner(
        &self,
        index: usize,
        master: usize,
        stack: &mut Vec<usize>,
    ) -> Result<Option<Rect>, FakeLabError> {
        let glyph = self
            .glyphs
            .get(index)
            .ok_or_else(|| FakeLabError::UnresolvedReference {
                what: "glyph".to_string(),
                index: i32::try_from(index).unwrap_or(i32::MAX),
            })?;
        if stack.contains(&index) {
            return Err(FakeLabError::General(format!(
                "Component cycle through glyph {}",
                glyph.name
            )));
        }
        stack.push(index);
        let mut rect = glyph.get_bounding_rect(master);
        for component in &glyph.components {
            let target = usize::try_from(component.index).map_err(|_| {
                FakeLabError::UnresolvedReference {
                    what: format!("component of {}", glyph.name),
                    index: component.index,
                }
            })?;
            if target >= self.glyphs.len() {
                return Err(FakeLabError::UnresolvedReference {
                    what: format!("component of {}", glyph.name),
                    index: component.index,
                });
            }
            if let Some(inner) = self.bounds_inner(target, master, stack)? {
                let moved = inner.transform(&component.matrix(master));
                rect = Some(match rect {
                    Some(r) => r.union(&moved),
                    None => moved,
                });
            }
        }
        stack.pop();
        Ok(rect)
    }

    /// Moves the outlines, anchors and components of every glyph.
    pub fn shift(&mut self, delta: Point) {
        for glyph in self.glyphs.iter_mut() {
            glyph.shift(delta);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{Component, Node};
    use pretty_assertions::assert_eq;

    fn square(name: &str, size: i32) -> Glyph {
        let mut glyph = Glyph::new(name);
        glyph.append_node(Node::move_to(Point::new(0, 0))).unwrap();
        glyph.append_node(Node::line_to(Point::new(size, 0))).unwrap();
        glyph.append_node(Node::line_to(Point::new(size, size))).unwrap();
        glyph
    }

    #[test]
    fn test_find_and_reindex() {
        let mut font = Font::new();
        font.append_glyph(Glyph::new("a")).unwrap();
        font.append_glyph(Glyph::new("b")).unwrap();
        font.append_glyph(Glyph::new("c")).unwrap();
        assert_eq!(font.find_glyph("c"), 2);
        assert_eq!(font.find_glyph("missing"), -1);
        let removed = font.remove_glyph(1).unwrap();
        assert_eq!(removed.index(), -1);
        assert_eq!(font.find_glyph("c"), 1);
        assert_eq!(font.glyphs[1].index(), 1);
        font.insert_glyph(0, Glyph::new("z")).unwrap();
        assert_eq!(font.glyphs[1].index(), 1);
        assert_eq!(font.glyphs[0].name, "z");
    }

    #[test]
    fn test_find_by_unicode() {
        let mut font = Font::new();
        let mut a = Glyph::new("a");
        a.unicodes = vec![0x61];
        font.append_glyph(a).unwrap();
        assert_eq!(font.find_glyph_by_unicode(0x61), 0);
        assert_eq!(font.find_glyph_by_unicode(0x62), -1);
    }

    #[test]
    fn test_axis_add_remove() {
        let mut font = Font::new();
        font.set_blue_values(vec![-10, 0]);
        font.append_glyph(square("a", 100)).unwrap();
        font.add_axis(Axis::new("Weight")).unwrap();
        assert_eq!(font.master_count(), 2);
        assert_eq!(font.glyphs[0].layers_number(), 2);
        assert_eq!(font.masters[1].location, vec![1.0]);
        font.set_blue_values_at(1, vec![-20, 0]).unwrap();
        font.glyph_mut(0)
            .unwrap()
            .nodes[1]
            .set_point_at(1, Point::new(300, 0))
            .unwrap();

        assert_eq!(font.weight_vector, vec![1.0, 0.0]);

        font.remove_axis(0, 0.5).unwrap();
        assert_eq!(font.master_count(), 1);
        assert_eq!(font.weight_vector, vec![0.5]);
        assert!(font.axes.is_empty());
        assert_eq!(font.blue_values(), vec![vec![-15, 0]]);
        assert_eq!(font.glyphs[0].nodes[1].point(), Point::new(200, 0));
        assert_eq!(font.glyphs[0].layers_number(), 1);
    }

    #[test]
    fn test_too_many_axes() {
        let mut font = Font::new();
        for name in ["Weight", "Width", "Optical Size", "Serif"] {
            font.add_axis(Axis::new(name)).unwrap();
        }
        assert_eq!(font.master_count(), 16);
        assert_eq!(font.weight_vector.len(), 16);
        assert!(matches!(
            font.add_axis(Axis::new("Contrast")),
            Err(FakeLabError::TooManyMasters { requested: 32 })
        ));
    }

    #[test]
    fn test_append_mismatched_glyph() {
        let mut font = Font::new();
        font.add_axis(Axis::new("Weight")).unwrap();
        let mut glyph = Glyph::new("a");
        glyph.add_axis().unwrap();
        glyph.add_axis().unwrap();
        assert!(matches!(
            font.append_glyph(glyph),
            Err(FakeLabError::MasterCountMismatch { expected: 2, found: 4, .. })
        ));
        font.append_glyph(Glyph::new("b")).unwrap();
        assert_eq!(font.glyphs[0].layers_number(), 2);
    }

    #[test]
    fn test_composite_bounds() {
        let mut font = Font::new();
        font.append_glyph(square("base", 100)).unwrap();
        let mut composite = square("comp", 10);
        composite
            .components
            .push(Component::with_delta(0, Point::new(200, 50)));
        font.append_glyph(composite).unwrap();
        assert_eq!(
            font.glyph_bounding_rect(1, 0).unwrap(),
            Some(Rect::new(Point::new(0, 0), Point::new(300, 150)))
        );

        font.glyph_mut(1).unwrap().components[0].index = 7;
        assert!(matches!(
            font.glyph_bounding_rect(1, 0),
            Err(FakeLabError::UnresolvedReference { index: 7, .. })
        ));

        font.glyph_mut(1).unwrap().components[0].index = 1;
        assert!(font.glyph_bounding_rect(1, 0).is_err());
    }

    #[test]
    fn test_class_metrics_flags() {
        let mut font = Font::new();
        font.classes.replace_all(&["_O_L: O' Q", "_H: H' I"]).unwrap();
        let flags = ClassFlags {
            metrics_lsb: true,
            metrics_width: true,
            ..Default::default()
        };
        font.classes.set_flags(1, flags).unwrap();
        assert_eq!(font.get_class_metrics_flags(1).unwrap(), flags);
        assert!(font.get_class_metrics_flags(0).unwrap().is_empty());
        assert!(matches!(
            font.get_class_metrics_flags(2),
            Err(FakeLabError::UnresolvedReference { index: 2, .. })
        ));
    }

    #[test]
    fn test_name_lookup() {
        let mut font = Font::new();
        font.names.family_name = "Test".to_string();
        assert_eq!(font.name(NameId::FAMILY_NAME), Some("Test"));
        font.name_records
            .push(NameRecord::windows(NameId::FAMILY_NAME, "Override"));
        assert_eq!(font.name(NameId::FAMILY_NAME), Some("Override"));
    }
}
