use std::ops::{Deref, Range};

use crate::{
    common::{pairs_from_points, points_from_pairs, MasterValues, Point, Rect},
    convertors::vfb::{
        records::{
            AnchorPropertyRecord, GdefRecord, GlyphRecord, GuidePropertyRecord, HintsRecord,
            LinksRecord,
        },
        RawEntry,
    },
    guide::{apply_guide_properties, deserialize_guides, serialize_guides},
    Anchor, Component, FakeLabError, Guide, Hint, Image, KerningPair, Link, Node, NodeType,
    Replace, ReplaceTarget, ReplaceType,
};

/// A font's glyphs, in their significant order.
///
/// The list hands out shared access only; changes go through the owning
/// [`Font`](crate::Font) so that glyph indices stay current.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphList(Vec<Glyph>);

impl GlyphList {
    pub fn get_by_name(&self, name: &str) -> Option<&Glyph> {
        self.0.iter().find(|g| g.name == name)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Glyph> {
        self.0.get_mut(index)
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Glyph> {
        self.0.iter_mut()
    }

    pub(crate) fn push(&mut self, mut glyph: Glyph) -> usize {
        let index = self.0.len();
        glyph.index = Some(index);
        self.0.push(glyph);
        index
    }

    pub(crate) fn insert(&mut self, index: usize, glyph: Glyph) -> Result<(), FakeLabError> {
        if index > self.0.len() {
            return Err(FakeLabError::IndexOutOfRange {
                what: "glyph".to_string(),
                index,
                len: self.0.len(),
            });
        }
        self.0.insert(index, glyph);
        self.reindex();
        Ok(())
    }

    pub(crate) fn remove(&mut self, index: usize) -> Result<Glyph, FakeLabError> {
        if index >= self.0.len() {
            return Err(FakeLabError::IndexOutOfRange {
                what: "glyph".to_string(),
                index,
                len: self.0.len(),
            });
        }
        let mut glyph = self.0.remove(index);
        glyph.index = None;
        self.reindex();
        Ok(glyph)
    }

    fn reindex(&mut self) {
        for (ix, glyph) in self.0.iter_mut().enumerate() {
            glyph.index = Some(ix);
        }
    }
}

impl Deref for GlyphList {
    type Target = Vec<Glyph>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// GDEF class and ligature caret data of a glyph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GdefData {
    pub class: Option<String>,
    /// `(position, caret type)` pairs
    pub carets: Vec<(i32, i32)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub name: String,
    pub unicodes: Vec<u32>,
    layers_number: usize,
    pub nodes: Vec<Node>,
    pub components: Vec<Component>,
    pub anchors: Vec<Anchor>,
    pub hhints: Vec<Hint>,
    pub vhints: Vec<Hint>,
    pub hlinks: Vec<Link>,
    pub vlinks: Vec<Link>,
    pub replace_table: Vec<Replace>,
    pub kerning: Vec<KerningPair>,
    pub hguides: Vec<Guide>,
    pub vguides: Vec<Guide>,
    /// Advance width and height
    pub metrics: MasterValues<Point>,
    pub mask: Option<Box<Glyph>>,
    pub image: Option<Image>,
    pub mark: i32,
    pub note: String,
    pub custom_data: String,
    pub origin: Point,
    pub hinting_options: Vec<i32>,
    pub gdef: Option<GdefData>,
    pub instructions: Vec<u8>,
    /// Entries read from a file which this library does not interpret
    pub unknown_entries: Vec<RawEntry>,
    index: Option<usize>,
}

impl Default for Glyph {
    fn default() -> Self {
        Glyph::new("")
    }
}

fn check_masters(what: &str, expected: usize, found: usize) -> Result<(), FakeLabError> {
    if expected != found {
        return Err(FakeLabError::MasterCountMismatch {
            what: what.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

impl Glyph {
    pub fn new(name: impl Into<String>) -> Self {
        Glyph {
            name: name.into(),
            unicodes: vec![],
            layers_number: 1,
            nodes: vec![],
            components: vec![],
            anchors: vec![],
            hhints: vec![],
            vhints: vec![],
            hlinks: vec![],
            vlinks: vec![],
            replace_table: vec![],
            kerning: vec![],
            hguides: vec![],
            vguides: vec![],
            metrics: MasterValues::splat(Point::default()),
            mask: None,
            image: None,
            mark: 0,
            note: String::new(),
            custom_data: String::new(),
            origin: Point::default(),
            hinting_options: vec![],
            gdef: None,
            instructions: vec![],
            unknown_entries: vec![],
            index: None,
        }
    }

    /// Position in the owning font, or -1 for a glyph that belongs to no font.
    pub fn index(&self) -> i32 {
        self.index
            .and_then(|ix| i32::try_from(ix).ok())
            .unwrap_or(-1)
    }

    pub fn unicode(&self) -> Option<u32> {
        self.unicodes.first().copied()
    }

    pub fn layers_number(&self) -> usize {
        self.layers_number
    }

    /// Changes the number of live masters of every per-master value.
    pub fn set_layers_number(&mut self, count: usize) -> Result<(), FakeLabError> {
        for node in self.nodes.iter_mut() {
            node.set_layers_number(count)?;
        }
        for c in self.components.iter_mut() {
            c.set_layers_number(count)?;
        }
        for a in self.anchors.iter_mut() {
            a.set_layers_number(count)?;
        }
        for h in self.hhints.iter_mut().chain(self.vhints.iter_mut()) {
            h.set_layers_number(count)?;
        }
        for k in self.kerning.iter_mut() {
            k.set_layers_number(count)?;
        }
        for g in self.hguides.iter_mut().chain(self.vguides.iter_mut()) {
            g.set_layers_number(count)?;
        }
        self.metrics.set_count(count)?;
        if let Some(mask) = self.mask.as_mut() {
            mask.set_layers_number(count)?;
        }
        self.layers_number = count;
        Ok(())
    }

    pub fn width(&self) -> i32 {
        self.metrics.get().x
    }

    /// Sets the advance width in every master.
    pub fn set_width(&mut self, width: i32) {
        for m in self.metrics.iter_mut() {
            m.x = width;
        }
    }

    pub fn width_at(&self, master: usize) -> Option<i32> {
        self.metrics.at(master).map(|m| m.x)
    }

    pub fn set_width_at(&mut self, master: usize, width: i32) -> Result<(), FakeLabError> {
        let height = self.height_at(master).unwrap_or_default();
        self.metrics.set_at(master, Point::new(width, height))
    }

    pub fn height(&self) -> i32 {
        self.metrics.get().y
    }

    pub fn set_height(&mut self, height: i32) {
        for m in self.metrics.iter_mut() {
            m.y = height;
        }
    }

    pub fn height_at(&self, master: usize) -> Option<i32> {
        self.metrics.at(master).map(|m| m.y)
    }

    /// Advance width and height in one master, as a point.
    pub fn get_metrics(&self, master: usize) -> Point {
        self.metrics.at(master).copied().unwrap_or_default()
    }

    /// Adds a node, widening a single-master node to the glyph's master count.
    pub fn append_node(&mut self, mut node: Node) -> Result<(), FakeLabError> {
        if node.layers_number() != self.layers_number {
            if node.layers_number() != 1 {
                return Err(FakeLabError::MasterCountMismatch {
                    what: format!("node appended to glyph {}", self.name),
                    expected: self.layers_number,
                    found: node.layers_number(),
                });
            }
            node.set_layers_number(self.layers_number)?;
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Node index ranges of each contour. A contour starts at a move node.
    pub fn contours(&self) -> Vec<Range<usize>> {
        let mut contours = vec![];
        let mut start = None;
        for (ix, node) in self.nodes.iter().enumerate() {
            if node.nodetype == NodeType::Move {
                if let Some(s) = start {
                    contours.push(s..ix);
                }
                start = Some(ix);
            } else if start.is_none() {
                start = Some(ix);
            }
        }
        if let Some(s) = start {
            contours.push(s..self.nodes.len());
        }
        contours
    }

    /// The box around every point of every node in one master.
    ///
    /// Curve control points count, so the box can be larger than the outline.
    /// Components are not included; see [`Font::glyph_bounding_rect`](crate::Font::glyph_bounding_rect).
    pub fn get_bounding_rect(&self, master: usize) -> Option<Rect> {
        Rect::bounding(self.nodes.iter().flat_map(|n| n.points_at(master)))
    }

    pub fn find_anchor(&self, name: &str) -> Option<&Anchor> {
        self.anchors.iter().find(|a| a.name == name)
    }

    /// Moves every node, anchor and component in every master.
    pub fn shift(&mut self, delta: Point) {
        for node in self.nodes.iter_mut() {
            node.shift(delta);
        }
        for anchor in self.anchors.iter_mut() {
            for p in anchor.positions.iter_mut() {
                *p = *p + delta;
            }
        }
        for component in self.components.iter_mut() {
            for p in component.deltas.iter_mut() {
                *p = *p + delta;
            }
        }
    }

    /// The hint or node a replace-table entry points at.
    pub fn resolve_replace(&self, replace: &Replace) -> Result<ReplaceTarget<'_>, FakeLabError> {
        let unresolved = |what: &str| FakeLabError::UnresolvedReference {
            what: format!("replace table {} in glyph {}", what, self.name),
            index: replace.index,
        };
        let ix = usize::try_from(replace.index).ok();
        match replace.replace_type {
            ReplaceType::HHint => ix
                .and_then(|ix| self.hhints.get(ix))
                .map(ReplaceTarget::HHint)
                .ok_or_else(|| unresolved("horizontal hint")),
            ReplaceType::VHint => ix
                .and_then(|ix| self.vhints.get(ix))
                .map(ReplaceTarget::VHint)
                .ok_or_else(|| unresolved("vertical hint")),
            ReplaceType::Node => ix
                .and_then(|ix| self.nodes.get(ix))
                .map(ReplaceTarget::Node)
                .ok_or_else(|| unresolved("node")),
        }
    }

    /// Builds the stem hint described by a link.
    ///
    /// Horizontal links measure between node y positions, vertical links
    /// between x positions. A ghost link gives a top (-20) or bottom (-21)
    /// ghost hint at its first node.
    pub fn hint_from_link(&self, link: &Link, vertical: bool) -> Result<Hint, FakeLabError> {
        let node_at = |index: i32| {
            usize::try_from(index)
                .ok()
                .and_then(|ix| self.nodes.get(ix))
                .ok_or_else(|| FakeLabError::UnresolvedReference {
                    what: format!("link node in glyph {}", self.name),
                    index,
                })
        };
        let coord = |p: Point| if vertical { p.x } else { p.y };
        let first = node_at(link.node1)?;
        let second = if link.is_ghost() {
            None
        } else {
            Some(node_at(link.node2)?)
        };
        let mut positions = vec![];
        let mut widths = vec![];
        for master in 0..self.layers_number {
            let p1 = first.point_at(master).map(coord).unwrap_or_default();
            match (second, link.node2) {
                (Some(node), _) => {
                    let p2 = node.point_at(master).map(coord).unwrap_or_default();
                    positions.push(p1.min(p2));
                    widths.push((p2 - p1).abs());
                }
                (None, -1) => {
                    positions.push(p1);
                    widths.push(-20);
                }
                (None, _) => {
                    positions.push(p1);
                    widths.push(-21);
                }
            }
        }
        Ok(Hint {
            positions: MasterValues::from_live(&positions)?,
            widths: MasterValues::from_live(&widths)?,
        })
    }

    /// Regenerates both hint lists from the links.
    pub fn links_to_hints(&mut self) -> Result<(), FakeLabError> {
        self.hhints = self
            .hlinks
            .iter()
            .map(|l| self.hint_from_link(l, false))
            .collect::<Result<Vec<_>, _>>()?;
        self.vhints = self
            .vlinks
            .iter()
            .map(|l| self.hint_from_link(l, true))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(())
    }

    pub(crate) fn add_axis(&mut self) -> Result<(), FakeLabError> {
        for node in self.nodes.iter_mut() {
            node.add_axis()?;
        }
        for c in self.components.iter_mut() {
            c.add_axis()?;
        }
        for a in self.anchors.iter_mut() {
            a.add_axis()?;
        }
        for h in self.hhints.iter_mut().chain(self.vhints.iter_mut()) {
            h.add_axis()?;
        }
        for k in self.kerning.iter_mut() {
            k.add_axis()?;
        }
        for g in self.hguides.iter_mut().chain(self.vguides.iter_mut()) {
            g.add_axis()?;
        }
        self.metrics.add_axis()?;
        if let Some(mask) = self.mask.as_mut() {
            mask.add_axis()?;
        }
        self.layers_number *= 2;
        Ok(())
    }

    pub(crate) fn remove_axis(&mut self, axis: usize, factor: f64) -> Result<(), FakeLabError> {
        for node in self.nodes.iter_mut() {
            node.remove_axis(axis, factor)?;
        }
        for c in self.components.iter_mut() {
            c.remove_axis(axis, factor)?;
        }
        for a in self.anchors.iter_mut() {
            a.remove_axis(axis, factor)?;
        }
        for h in self.hhints.iter_mut().chain(self.vhints.iter_mut()) {
            h.remove_axis(axis, factor)?;
        }
        for k in self.kerning.iter_mut() {
            k.remove_axis(axis, factor)?;
        }
        for g in self.hguides.iter_mut().chain(self.vguides.iter_mut()) {
            g.remove_axis(axis, factor)?;
        }
        self.metrics.remove_axis_at(axis, factor)?;
        if let Some(mask) = self.mask.as_mut() {
            mask.remove_axis(axis, factor)?;
        }
        self.layers_number /= 2;
        Ok(())
    }

    /// The `Glyph` entry payload.
    pub fn serialize(&self) -> GlyphRecord {
        let (guides, _) = serialize_guides(&self.hguides, &self.vguides);
        GlyphRecord {
            name: self.name.clone(),
            num_masters: self.layers_number,
            nodes: self.nodes.iter().map(Node::serialize).collect(),
            metrics: pairs_from_points(self.metrics.live()),
            hints: HintsRecord {
                h: self.hhints.iter().map(Hint::serialize).collect(),
                v: self.vhints.iter().map(Hint::serialize).collect(),
                replace: self.replace_table.iter().map(Replace::serialize).collect(),
            },
            guides,
            components: self.components.iter().map(Component::serialize).collect(),
            kerning: self.kerning.iter().map(KerningPair::serialize).collect(),
            instructions: self.instructions.clone(),
        }
    }

    /// Rebuilds a glyph from its `Glyph` entry payload, checking that every
    /// per-master list has one value per master.
    pub fn deserialize(record: &GlyphRecord) -> Result<Glyph, FakeLabError> {
        let masters = record.num_masters;
        let mut glyph = Glyph::new(record.name.clone());
        glyph.layers_number = masters;

        check_masters("glyph metrics", masters, record.metrics.len())?;
        glyph.metrics = MasterValues::from_live(&points_from_pairs(&record.metrics))?;

        for (ix, node) in record.nodes.iter().enumerate() {
            check_masters(&format!("node {}", ix), masters, node.points.len())?;
            glyph.nodes.push(Node::deserialize(node)?);
        }
        for (ix, hint) in record.hints.h.iter().enumerate() {
            check_masters(&format!("horizontal hint {}", ix), masters, hint.len())?;
            glyph.hhints.push(Hint::deserialize(hint)?);
        }
        for (ix, hint) in record.hints.v.iter().enumerate() {
            check_masters(&format!("vertical hint {}", ix), masters, hint.len())?;
            glyph.vhints.push(Hint::deserialize(hint)?);
        }
        glyph.replace_table = record
            .hints
            .replace
            .iter()
            .map(Replace::deserialize)
            .collect::<Result<Vec<_>, _>>()?;

        for guide in record.guides.h.iter().chain(record.guides.v.iter()) {
            check_masters("guide", masters, guide.len())?;
        }
        (glyph.hguides, glyph.vguides) = deserialize_guides(&record.guides)?;

        glyph.components = record
            .components
            .iter()
            .map(|c| Component::deserialize(c, masters))
            .collect::<Result<Vec<_>, _>>()?;
        for pair in &record.kerning {
            check_masters("kerning pair", masters, pair.values.len())?;
            glyph.kerning.push(KerningPair::deserialize(pair)?);
        }
        glyph.instructions = record.instructions.clone();
        Ok(glyph)
    }

    pub(crate) fn links_record(&self) -> LinksRecord {
        let pairs = |links: &[Link]| links.iter().map(|l| (l.node1, l.node2)).collect();
        LinksRecord {
            x: pairs(&self.vlinks),
            y: pairs(&self.hlinks),
        }
    }

    pub(crate) fn apply_links(&mut self, record: &LinksRecord) {
        self.vlinks = record.x.iter().map(|(a, b)| Link::new(*a, *b)).collect();
        self.hlinks = record.y.iter().map(|(a, b)| Link::new(*a, *b)).collect();
    }

    pub(crate) fn guide_properties(&self) -> Vec<GuidePropertyRecord> {
        serialize_guides(&self.hguides, &self.vguides).1
    }

    pub(crate) fn apply_guide_properties(
        &mut self,
        properties: &[GuidePropertyRecord],
    ) -> Result<(), FakeLabError> {
        apply_guide_properties(&mut self.hguides, &mut self.vguides, properties)
    }

    /// Anchor positions: one list of per-master points per anchor.
    pub(crate) fn anchors_mm_record(&self) -> Vec<Vec<(i32, i32)>> {
        self.anchors
            .iter()
            .map(|a| pairs_from_points(a.positions.live()))
            .collect()
    }

    pub(crate) fn apply_anchors_mm(
        &mut self,
        positions: &[Vec<(i32, i32)>],
    ) -> Result<(), FakeLabError> {
        self.reconcile_anchors(positions.len())?;
        for (anchor, points) in self.anchors.iter_mut().zip(positions) {
            check_masters(
                &format!("anchor {}", anchor.name),
                self.layers_number,
                points.len(),
            )?;
            anchor.positions = MasterValues::from_live(&points_from_pairs(points))?;
        }
        Ok(())
    }

    pub(crate) fn anchor_properties(&self) -> Vec<AnchorPropertyRecord> {
        self.anchors.iter().map(Anchor::properties).collect()
    }

    pub(crate) fn apply_anchor_properties(
        &mut self,
        properties: &[AnchorPropertyRecord],
    ) -> Result<(), FakeLabError> {
        self.reconcile_anchors(properties.len())?;
        for (anchor, record) in self.anchors.iter_mut().zip(properties) {
            anchor.apply_properties(record);
        }
        Ok(())
    }

    /// Creates anchors on first sight; later records must agree on the count.
    fn reconcile_anchors(&mut self, count: usize) -> Result<(), FakeLabError> {
        if self.anchors.is_empty() {
            let masters = self.layers_number;
            self.anchors = (0..count)
                .map(|_| {
                    let mut anchor = Anchor::new("", Point::default());
                    anchor.set_layers_number(masters).map(|_| anchor)
                })
                .collect::<Result<Vec<_>, _>>()?;
        } else if self.anchors.len() != count {
            return Err(FakeLabError::General(format!(
                "Glyph {} has {} anchors, record has {}",
                self.name,
                self.anchors.len(),
                count
            )));
        }
        Ok(())
    }

    pub(crate) fn gdef_record(&self) -> Option<GdefRecord> {
        self.gdef.as_ref().map(|g| GdefRecord {
            class: g.class.clone(),
            carets: g.carets.clone(),
        })
    }

    pub(crate) fn apply_gdef(&mut self, record: &GdefRecord) {
        self.gdef = Some(GdefData {
            class: record.class.clone(),
            carets: record.carets.clone(),
        });
    }

    pub(crate) fn set_index(&mut self, index: Option<usize>) {
        self.index = index;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::common::MAX_MASTERS;
    use crate::convertors::vfb::records::NodeRecord;
    use pretty_assertions::assert_eq;

    fn curve_glyph() -> Glyph {
        let mut glyph = Glyph::new("c");
        glyph.append_node(Node::move_to(Point::new(0, 0))).unwrap();
        glyph
            .append_node(Node::curve_to(
                Point::new(-40, 120),
                Point::new(300, 260),
                Point::new(200, 100),
            ))
            .unwrap();
        glyph
    }

    #[test]
    fn test_bounding_rect_includes_control_points() {
        let glyph = curve_glyph();
        assert_eq!(
            glyph.get_bounding_rect(0),
            Some(Rect::new(Point::new(-40, 0), Point::new(300, 260)))
        );
        assert_eq!(Glyph::new("space").get_bounding_rect(0), None);
    }

    #[test]
    fn test_contours() {
        let mut glyph = curve_glyph();
        glyph.append_node(Node::line_to(Point::new(0, 0))).unwrap();
        glyph.append_node(Node::move_to(Point::new(50, 50))).unwrap();
        glyph.append_node(Node::line_to(Point::new(60, 50))).unwrap();
        assert_eq!(glyph.contours(), vec![0..3, 3..5]);
    }

    #[test]
    fn test_width_broadcast() {
        let mut glyph = Glyph::new("a");
        glyph.set_width(500);
        assert!(glyph.metrics.all().iter().all(|m| m.x == 500));
        glyph.set_width_at(2, 520).unwrap();
        assert_eq!(glyph.width(), 500);
        assert_eq!(glyph.width_at(2), Some(520));
        assert_eq!(glyph.get_metrics(0), Point::new(500, 0));
        assert_eq!(glyph.metrics.all().len(), MAX_MASTERS);
    }

    #[test]
    fn test_orphan_index() {
        assert_eq!(Glyph::new("a").index(), -1);
    }

    #[test]
    fn test_deserialize_master_mismatch() {
        let record = GlyphRecord {
            name: "a".to_string(),
            num_masters: 2,
            nodes: vec![NodeRecord {
                nodetype: 1,
                flags: 0,
                points: vec![vec![(0, 0)]],
            }],
            metrics: vec![(500, 0), (520, 0)],
            ..Default::default()
        };
        assert!(matches!(
            Glyph::deserialize(&record),
            Err(FakeLabError::MasterCountMismatch {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_record_roundtrip_two_masters() {
        let mut glyph = curve_glyph();
        glyph.set_width(400);
        glyph.hhints.push(Hint::new(0, 80));
        glyph.vguides.push(Guide::new(250));
        glyph.kerning.push(KerningPair::new(3, -40));
        glyph.components.push(Component::with_delta(1, Point::new(10, 0)));
        glyph.replace_table.push(Replace::new(crate::ReplaceType::HHint, 0));
        glyph.add_axis().unwrap();
        glyph.nodes[1]
            .set_point_at(1, Point::new(220, 110))
            .unwrap();
        let back = Glyph::deserialize(&glyph.serialize()).unwrap();
        assert_eq!(back, glyph);
        assert_eq!(back.layers_number(), 2);
    }

    #[test]
    fn test_hint_from_link() {
        let mut glyph = Glyph::new("l");
        glyph.append_node(Node::move_to(Point::new(40, 0))).unwrap();
        glyph.append_node(Node::line_to(Point::new(120, 0))).unwrap();
        glyph.append_node(Node::line_to(Point::new(120, 700))).unwrap();
        let hint = glyph.hint_from_link(&Link::new(1, 0), true).unwrap();
        assert_eq!((hint.position(), hint.width()), (40, 80));
        let ghost = glyph.hint_from_link(&Link::new(2, -1), false).unwrap();
        assert_eq!((ghost.position(), ghost.width()), (700, -20));
        assert!(glyph.hint_from_link(&Link::new(7, 0), false).is_err());
    }

    #[test]
    fn test_resolve_replace() {
        let mut glyph = curve_glyph();
        glyph.vhints.push(Hint::new(10, 60));
        let target = glyph
            .resolve_replace(&Replace::new(ReplaceType::VHint, 0))
            .unwrap();
        assert_eq!(target, ReplaceTarget::VHint(&glyph.vhints[0]));
        assert!(matches!(
            glyph.resolve_replace(&Replace::new(ReplaceType::Node, 1)),
            Ok(ReplaceTarget::Node(_))
        ));
        for dangling in [
            Replace::new(ReplaceType::HHint, 0),
            Replace::new(ReplaceType::Node, 2),
            Replace::new(ReplaceType::VHint, -1),
        ] {
            assert!(matches!(
                glyph.resolve_replace(&dangling),
                Err(FakeLabError::UnresolvedReference { .. })
            ));
        }
    }

    #[test]
    fn test_anchor_reconcile() {
        let mut glyph = Glyph::new("a");
        glyph
            .apply_anchor_properties(&[AnchorPropertyRecord {
                name: "top".to_string(),
                mark: 0,
            }])
            .unwrap();
        glyph.apply_anchors_mm(&[vec![(250, 700)]]).unwrap();
        assert_eq!(glyph.anchors.len(), 1);
        assert_eq!(glyph.anchors[0].name, "top");
        assert_eq!(glyph.anchors[0].position(), Point::new(250, 700));
        assert!(glyph.apply_anchors_mm(&[vec![], vec![]]).is_err());
    }
}
