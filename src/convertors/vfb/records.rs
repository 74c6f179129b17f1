//! Binary layouts of the structured entry payloads.
//!
//! Numbers are VFB variable-length integers unless noted; `f64`, `u16`, `i16`
//! and `i32` fields marked as fixed are little-endian. Lists are a count
//! followed by the items, and text is a byte count followed by UTF-8.
//!
//! A `Glyph` (and `Mask`) payload is laid out as
//!
//! ```text
//! 01 09 07 01                      header
//! name, master count
//! section byte + body, repeated, until 0x0f:
//!   0x01 outline       value count, node count, nodes
//!   0x02 metrics       per master: width, height
//!   0x03 hints         horizontal hints, vertical hints, replace table
//!   0x04 guides        horizontal guides, vertical guides
//!   0x05 components    count, per component: glyph index,
//!                      per master dx dy, per master fixed f64 sx sy
//!   0x06 kerning       count, per pair: glyph index, per master value
//!   0x0a instructions  byte count, bytes
//! ```
//!
//! A node is one byte holding its flags in the high nibble and its type in the
//! low nibble, then for every master each of its points as x and y deltas from
//! the previous point of that master.
use super::stream::{write_varint, Cursor};
use crate::{
    common::MAX_MASTERS,
    master::{
        BLUE_VALUES_SIZE, FAMILY_BLUES_SIZE, FAMILY_OTHER_BLUES_SIZE, OTHER_BLUES_SIZE,
        STEM_SNAP_SIZE,
    },
    ttinfo::TableFields,
    FakeLabError, NodeType,
};

/// A payload with a binary layout of its own.
pub trait Record: Sized {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError>;
    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError>;
}

fn write_count(out: &mut Vec<u8>, n: usize) -> Result<(), FakeLabError> {
    let n = i32::try_from(n)
        .map_err(|_| FakeLabError::General(format!("Count {} too large to encode", n)))?;
    write_varint(out, n);
    Ok(())
}

fn read_text(cursor: &mut Cursor) -> Result<String, FakeLabError> {
    let len = cursor.count()?;
    let at = cursor.offset();
    String::from_utf8(cursor.take(len)?.to_vec())
        .map_err(|e| FakeLabError::General(format!("Invalid text at {}: {}", at, e)))
}

fn write_text(out: &mut Vec<u8>, text: &str) -> Result<(), FakeLabError> {
    write_count(out, text.len())?;
    out.extend_from_slice(text.as_bytes());
    Ok(())
}

/// Reads a variable-length integer into a narrower type.
fn read_narrow<T: TryFrom<i32>>(cursor: &mut Cursor, what: &str) -> Result<T, FakeLabError> {
    let at = cursor.offset();
    let value = cursor.varint()?;
    T::try_from(value)
        .map_err(|_| FakeLabError::General(format!("{} {} out of range at {}", what, value, at)))
}

fn read_list<T>(
    cursor: &mut Cursor,
    mut item: impl FnMut(&mut Cursor) -> Result<T, FakeLabError>,
) -> Result<Vec<T>, FakeLabError> {
    let n = cursor.count()?;
    let mut items = Vec::with_capacity(n.min(cursor.remaining()));
    for _ in 0..n {
        items.push(item(cursor)?);
    }
    Ok(items)
}

/// Reads exactly one item per master.
fn read_per_master<T>(
    cursor: &mut Cursor,
    masters: usize,
    mut item: impl FnMut(&mut Cursor) -> Result<T, FakeLabError>,
) -> Result<Vec<T>, FakeLabError> {
    (0..masters).map(|_| item(cursor)).collect()
}

fn write_per_master<T>(
    out: &mut Vec<u8>,
    what: &str,
    masters: usize,
    items: &[T],
    mut item: impl FnMut(&mut Vec<u8>, &T) -> Result<(), FakeLabError>,
) -> Result<(), FakeLabError> {
    if items.len() != masters {
        return Err(FakeLabError::MasterCountMismatch {
            what: what.to_string(),
            expected: masters,
            found: items.len(),
        });
    }
    items.iter().try_for_each(|i| item(out, i))
}

fn read_master_count(cursor: &mut Cursor) -> Result<usize, FakeLabError> {
    let at = cursor.offset();
    let masters = cursor.count()?;
    if masters == 0 || masters > MAX_MASTERS {
        return Err(FakeLabError::General(format!(
            "Master count {} at {} outside 1 to {}",
            masters, at, MAX_MASTERS
        )));
    }
    Ok(masters)
}

fn read_fixed(cursor: &mut Cursor, size: usize) -> Result<Vec<i32>, FakeLabError> {
    (0..size).map(|_| cursor.i32()).collect()
}

fn write_fixed(
    out: &mut Vec<u8>,
    what: &str,
    values: &[i32],
    size: usize,
) -> Result<(), FakeLabError> {
    if values.len() > size {
        return Err(FakeLabError::General(format!(
            "{} holds at most {} values, found {}",
            what,
            size,
            values.len()
        )));
    }
    for ix in 0..size {
        out.extend_from_slice(&values.get(ix).copied().unwrap_or(0).to_le_bytes());
    }
    Ok(())
}

impl Record for i32 {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        cursor.varint()
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        write_varint(out, *self);
        Ok(())
    }
}

impl Record for u16 {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        read_narrow(cursor, "value")
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        write_varint(out, i32::from(*self));
        Ok(())
    }
}

impl Record for f64 {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        cursor.f64()
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        out.extend_from_slice(&self.to_le_bytes());
        Ok(())
    }
}

impl<A: Record, B: Record> Record for (A, B) {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        Ok((A::read(cursor)?, B::read(cursor)?))
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        self.0.write(out)?;
        self.1.write(out)
    }
}

impl<T: Record> Record for Vec<T> {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        read_list(cursor, T::read)
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        write_count(out, self.len())?;
        self.iter().try_for_each(|item| item.write(out))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeRecord {
    pub nodetype: u8,
    pub flags: u8,
    /// `points[master][k]`, absolute
    pub points: Vec<Vec<(i32, i32)>>,
}

fn points_per_node(nodetype: u8) -> Result<usize, FakeLabError> {
    NodeType::from_vfb_code(nodetype)
        .map(NodeType::points_per_master)
        .ok_or_else(|| FakeLabError::General(format!("Unknown node type {}", nodetype)))
}

fn read_outline(cursor: &mut Cursor, masters: usize) -> Result<Vec<NodeRecord>, FakeLabError> {
    // The value count is implied by the nodes themselves.
    let _values = cursor.count()?;
    let mut last = vec![(0i32, 0i32); masters];
    read_list(cursor, |cursor| {
        let byte = cursor.u8()?;
        let nodetype = byte & 0x0f;
        let per_master = points_per_node(nodetype)?;
        let mut points = Vec::with_capacity(masters);
        for previous in last.iter_mut() {
            let mut master_points = Vec::with_capacity(per_master);
            for _ in 0..per_master {
                let at = cursor.offset();
                let (dx, dy) = (cursor.varint()?, cursor.varint()?);
                *previous = previous
                    .0
                    .checked_add(dx)
                    .zip(previous.1.checked_add(dy))
                    .ok_or_else(|| {
                        FakeLabError::General(format!("Coordinate overflow at {}", at))
                    })?;
                master_points.push(*previous);
            }
            points.push(master_points);
        }
        Ok(NodeRecord {
            nodetype,
            flags: byte >> 4,
            points,
        })
    })
}

fn write_outline(
    out: &mut Vec<u8>,
    masters: usize,
    nodes: &[NodeRecord],
) -> Result<(), FakeLabError> {
    let mut values = 0;
    for node in nodes {
        values += points_per_node(node.nodetype)? * 2 * masters;
    }
    write_count(out, values)?;
    write_count(out, nodes.len())?;
    let mut last = vec![(0i32, 0i32); masters];
    for (ix, node) in nodes.iter().enumerate() {
        if node.flags > 0x0f {
            return Err(FakeLabError::General(format!(
                "Node {} flags {} do not fit in four bits",
                ix, node.flags
            )));
        }
        out.push(node.flags << 4 | node.nodetype);
        let per_master = points_per_node(node.nodetype)?;
        write_per_master(
            out,
            &format!("node {}", ix),
            masters,
            &node.points,
            |_, master_points| {
                if master_points.len() != per_master {
                    return Err(FakeLabError::General(format!(
                        "Node {} needs {} points per master, found {}",
                        ix,
                        per_master,
                        master_points.len()
                    )));
                }
                Ok(())
            },
        )?;
        for (previous, master_points) in last.iter_mut().zip(&node.points) {
            for point in master_points {
                let delta = point
                    .0
                    .checked_sub(previous.0)
                    .zip(point.1.checked_sub(previous.1))
                    .ok_or_else(|| {
                        FakeLabError::General(format!("Node {} is too far from the last", ix))
                    })?;
                write_varint(out, delta.0);
                write_varint(out, delta.1);
                *previous = *point;
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaceRecord {
    pub kind: u8,
    pub index: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HintsRecord {
    /// One entry per hint, each a `(position, width)` pair per master
    pub h: Vec<Vec<(i32, i32)>>,
    pub v: Vec<Vec<(i32, i32)>>,
    pub replace: Vec<ReplaceRecord>,
}

impl HintsRecord {
    pub fn is_empty(&self) -> bool {
        self.h.is_empty() && self.v.is_empty() && self.replace.is_empty()
    }

    fn read(cursor: &mut Cursor, masters: usize) -> Result<Self, FakeLabError> {
        let side = |cursor: &mut Cursor| {
            read_list(cursor, |cursor| {
                read_per_master(cursor, masters, <(i32, i32)>::read)
            })
        };
        let h = side(cursor)?;
        let v = side(cursor)?;
        let replace = read_list(cursor, |cursor| {
            Ok(ReplaceRecord {
                kind: cursor.u8()?,
                index: cursor.varint()?,
            })
        })?;
        Ok(HintsRecord { h, v, replace })
    }

    fn write(&self, out: &mut Vec<u8>, masters: usize) -> Result<(), FakeLabError> {
        for (what, hints) in [("horizontal hint", &self.h), ("vertical hint", &self.v)] {
            write_count(out, hints.len())?;
            for hint in hints {
                write_per_master(out, what, masters, hint, |out, pair| pair.write(out))?;
            }
        }
        write_count(out, self.replace.len())?;
        for replace in &self.replace {
            out.push(replace.kind);
            write_varint(out, replace.index);
        }
        Ok(())
    }
}

/// A guide in one master.
///
/// The angle is stored as the slope scaled by 10000.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuideRecord {
    pub position: i32,
    pub angle: f64,
}

impl Record for GuideRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        let position = cursor.varint()?;
        let slope = cursor.varint()?;
        Ok(GuideRecord {
            position,
            angle: f64::from(slope).atan2(10000.0).to_degrees(),
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        write_varint(out, self.position);
        write_varint(out, (self.angle.to_radians().tan() * 10000.0).round() as i32);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuidesRecord {
    /// One entry per guide, each holding one record per master
    pub h: Vec<Vec<GuideRecord>>,
    pub v: Vec<Vec<GuideRecord>>,
}

impl GuidesRecord {
    pub fn is_empty(&self) -> bool {
        self.h.is_empty() && self.v.is_empty()
    }

    /// The master count, taken from the first guide.
    fn masters(&self) -> usize {
        self.h.iter().chain(self.v.iter()).next().map_or(1, Vec::len)
    }

    fn read_body(cursor: &mut Cursor, masters: usize) -> Result<Self, FakeLabError> {
        let side = |cursor: &mut Cursor| {
            read_list(cursor, |cursor| {
                read_per_master(cursor, masters, GuideRecord::read)
            })
        };
        let h = side(cursor)?;
        let v = side(cursor)?;
        Ok(GuidesRecord { h, v })
    }

    fn write_body(&self, out: &mut Vec<u8>, masters: usize) -> Result<(), FakeLabError> {
        for guides in [&self.h, &self.v] {
            write_count(out, guides.len())?;
            for guide in guides {
                write_per_master(out, "guide", masters, guide, |out, g| g.write(out))?;
            }
        }
        Ok(())
    }
}

/// Font-wide guides carry their own master count.
impl Record for GuidesRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        let masters = read_master_count(cursor)?;
        GuidesRecord::read_body(cursor, masters)
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        let masters = self.masters();
        write_count(out, masters)?;
        self.write_body(out, masters)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuidePropertyRecord {
    pub vertical: bool,
    pub index: usize,
    pub name: Option<String>,
    pub color: Option<i32>,
}

mod guide_flag {
    pub const VERTICAL: u8 = 1;
    pub const NAME: u8 = 2;
    pub const COLOR: u8 = 4;
}

impl Record for GuidePropertyRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        let flags = cursor.u8()?;
        let index = cursor.count()?;
        let name = match flags & guide_flag::NAME {
            0 => None,
            _ => Some(read_text(cursor)?),
        };
        let color = match flags & guide_flag::COLOR {
            0 => None,
            _ => Some(cursor.varint()?),
        };
        Ok(GuidePropertyRecord {
            vertical: flags & guide_flag::VERTICAL != 0,
            index,
            name,
            color,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        let mut flags = 0;
        if self.vertical {
            flags |= guide_flag::VERTICAL;
        }
        if self.name.is_some() {
            flags |= guide_flag::NAME;
        }
        if self.color.is_some() {
            flags |= guide_flag::COLOR;
        }
        out.push(flags);
        write_count(out, self.index)?;
        if let Some(name) = &self.name {
            write_text(out, name)?;
        }
        if let Some(color) = self.color {
            write_varint(out, color);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentRecord {
    pub gid: i32,
    pub offsets: Vec<(i32, i32)>,
    pub scales: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KerningRecord {
    pub gid: i32,
    pub values: Vec<i32>,
}

mod section {
    pub const OUTLINE: u8 = 0x01;
    pub const METRICS: u8 = 0x02;
    pub const HINTS: u8 = 0x03;
    pub const GUIDES: u8 = 0x04;
    pub const COMPONENTS: u8 = 0x05;
    pub const KERNING: u8 = 0x06;
    pub const INSTRUCTIONS: u8 = 0x0a;
    pub const END: u8 = 0x0f;
}

const GLYPH_HEADER: [u8; 4] = [0x01, 0x09, 0x07, 0x01];

/// The payload of a `Glyph` entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphRecord {
    pub name: String,
    pub num_masters: usize,
    pub nodes: Vec<NodeRecord>,
    /// `(width, height)` per master
    pub metrics: Vec<(i32, i32)>,
    pub hints: HintsRecord,
    pub guides: GuidesRecord,
    pub components: Vec<ComponentRecord>,
    pub kerning: Vec<KerningRecord>,
    pub instructions: Vec<u8>,
}

impl Record for GlyphRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        let header = cursor.array::<4>()?;
        if header != GLYPH_HEADER {
            log::debug!("Unusual glyph header {:02x?}", header);
        }
        let name = read_text(cursor)?;
        let masters = read_master_count(cursor)?;
        let mut record = GlyphRecord {
            name,
            num_masters: masters,
            ..Default::default()
        };
        loop {
            let at = cursor.offset();
            match cursor.u8()? {
                section::END => break,
                section::OUTLINE => record.nodes = read_outline(cursor, masters)?,
                section::METRICS => {
                    record.metrics = read_per_master(cursor, masters, <(i32, i32)>::read)?
                }
                section::HINTS => record.hints = HintsRecord::read(cursor, masters)?,
                section::GUIDES => record.guides = GuidesRecord::read_body(cursor, masters)?,
                section::COMPONENTS => {
                    record.components = read_list(cursor, |cursor| {
                        Ok(ComponentRecord {
                            gid: cursor.varint()?,
                            offsets: read_per_master(cursor, masters, <(i32, i32)>::read)?,
                            scales: read_per_master(cursor, masters, <(f64, f64)>::read)?,
                        })
                    })?
                }
                section::KERNING => {
                    record.kerning = read_list(cursor, |cursor| {
                        Ok(KerningRecord {
                            gid: cursor.varint()?,
                            values: read_per_master(cursor, masters, |c| c.varint())?,
                        })
                    })?
                }
                section::INSTRUCTIONS => {
                    let len = cursor.count()?;
                    record.instructions = cursor.take(len)?.to_vec();
                }
                other => {
                    return Err(FakeLabError::General(format!(
                        "Unknown glyph section {} at {}",
                        other, at
                    )))
                }
            }
        }
        Ok(record)
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        let masters = self.num_masters;
        out.extend_from_slice(&GLYPH_HEADER);
        write_text(out, &self.name)?;
        write_count(out, masters)?;
        if !self.nodes.is_empty() {
            out.push(section::OUTLINE);
            write_outline(out, masters, &self.nodes)?;
        }
        out.push(section::METRICS);
        write_per_master(out, "glyph metrics", masters, &self.metrics, |out, m| {
            m.write(out)
        })?;
        if !self.hints.is_empty() {
            out.push(section::HINTS);
            self.hints.write(out, masters)?;
        }
        if !self.guides.is_empty() {
            out.push(section::GUIDES);
            self.guides.write_body(out, masters)?;
        }
        if !self.components.is_empty() {
            out.push(section::COMPONENTS);
            write_count(out, self.components.len())?;
            for component in &self.components {
                write_varint(out, component.gid);
                write_per_master(out, "component offsets", masters, &component.offsets, |out, o| {
                    o.write(out)
                })?;
                write_per_master(out, "component scales", masters, &component.scales, |out, s| {
                    s.write(out)
                })?;
            }
        }
        if !self.kerning.is_empty() {
            out.push(section::KERNING);
            write_count(out, self.kerning.len())?;
            for pair in &self.kerning {
                write_varint(out, pair.gid);
                write_per_master(out, "kerning pair", masters, &pair.values, |out, v| {
                    v.write(out)
                })?;
            }
        }
        if !self.instructions.is_empty() {
            out.push(section::INSTRUCTIONS);
            write_count(out, self.instructions.len())?;
            out.extend_from_slice(&self.instructions);
        }
        out.push(section::END);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinksRecord {
    /// Vertical-stem links, as node index pairs
    pub x: Vec<(i32, i32)>,
    /// Horizontal-stem links
    pub y: Vec<(i32, i32)>,
}

impl Record for LinksRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        Ok(LinksRecord {
            x: Vec::read(cursor)?,
            y: Vec::read(cursor)?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        self.x.write(out)?;
        self.y.write(out)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageRecord {
    pub origin: (i32, i32),
    pub width: i32,
    pub height: i32,
    pub data: Vec<u8>,
}

impl Record for ImageRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        let origin = <(i32, i32)>::read(cursor)?;
        let width = cursor.varint()?;
        let height = cursor.varint()?;
        let len = cursor.count()?;
        Ok(ImageRecord {
            origin,
            width,
            height,
            data: cursor.take(len)?.to_vec(),
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        self.origin.write(out)?;
        write_varint(out, self.width);
        write_varint(out, self.height);
        write_count(out, self.data.len())?;
        out.extend_from_slice(&self.data);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnchorPropertyRecord {
    pub name: String,
    pub mark: i32,
}

impl Record for AnchorPropertyRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        Ok(AnchorPropertyRecord {
            name: read_text(cursor)?,
            mark: cursor.varint()?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        write_text(out, &self.name)?;
        write_varint(out, self.mark);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GdefRecord {
    pub class: Option<String>,
    /// `(position, caret type)` pairs
    pub carets: Vec<(i32, i32)>,
}

impl Record for GdefRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        let class = match cursor.u8()? {
            0 => None,
            _ => Some(read_text(cursor)?),
        };
        Ok(GdefRecord {
            class,
            carets: Vec::read(cursor)?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        match &self.class {
            Some(class) => {
                out.push(1);
                write_text(out, class)?;
            }
            None => out.push(0),
        }
        self.carets.write(out)
    }
}

/// One master's PostScript info, with fixed `i32` zone arrays padded to
/// their full size and a fixed `f64` blue scale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostScriptInfoRecord {
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

impl Record for PostScriptInfoRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        Ok(PostScriptInfoRecord {
            force_bold: cursor.i32()?,
            blue_values: read_fixed(cursor, BLUE_VALUES_SIZE)?,
            other_blues: read_fixed(cursor, OTHER_BLUES_SIZE)?,
            family_blues: read_fixed(cursor, FAMILY_BLUES_SIZE)?,
            family_other_blues: read_fixed(cursor, FAMILY_OTHER_BLUES_SIZE)?,
            stem_snap_h: read_fixed(cursor, STEM_SNAP_SIZE)?,
            stem_snap_v: read_fixed(cursor, STEM_SNAP_SIZE)?,
            blue_scale: cursor.f64()?,
            blue_shift: cursor.i32()?,
            blue_fuzz: cursor.i32()?,
            std_hw: cursor.i32()?,
            std_vw: cursor.i32()?,
            ascender: cursor.i32()?,
            descender: cursor.i32()?,
            x_height: cursor.i32()?,
            cap_height: cursor.i32()?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        out.extend_from_slice(&self.force_bold.to_le_bytes());
        write_fixed(out, "blue values", &self.blue_values, BLUE_VALUES_SIZE)?;
        write_fixed(out, "other blues", &self.other_blues, OTHER_BLUES_SIZE)?;
        write_fixed(out, "family blues", &self.family_blues, FAMILY_BLUES_SIZE)?;
        write_fixed(
            out,
            "family other blues",
            &self.family_other_blues,
            FAMILY_OTHER_BLUES_SIZE,
        )?;
        write_fixed(out, "horizontal stem snaps", &self.stem_snap_h, STEM_SNAP_SIZE)?;
        write_fixed(out, "vertical stem snaps", &self.stem_snap_v, STEM_SNAP_SIZE)?;
        out.extend_from_slice(&self.blue_scale.to_le_bytes());
        for value in [
            self.blue_shift,
            self.blue_fuzz,
            self.std_hw,
            self.std_vw,
            self.ascender,
            self.descender,
            self.x_height,
            self.cap_height,
        ] {
            out.extend_from_slice(&value.to_le_bytes());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterLocationRecord {
    pub master: usize,
    pub location: Vec<f64>,
}

impl Record for MasterLocationRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        Ok(MasterLocationRecord {
            master: cursor.count()?,
            location: Vec::read(cursor)?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        write_count(out, self.master)?;
        self.location.write(out)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameRecordRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: u16,
    pub value: String,
}

impl Record for NameRecordRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        Ok(NameRecordRecord {
            platform_id: u16::read(cursor)?,
            encoding_id: u16::read(cursor)?,
            language_id: u16::read(cursor)?,
            name_id: u16::read(cursor)?,
            value: read_text(cursor)?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        for id in [
            self.platform_id,
            self.encoding_id,
            self.language_id,
            self.name_id,
        ] {
            id.write(out)?;
        }
        write_text(out, &self.value)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TtStemRecord {
    pub name: String,
    pub width: i32,
}

impl Record for TtStemRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        let width = cursor.varint()?;
        Ok(TtStemRecord {
            name: read_text(cursor)?,
            width,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        write_varint(out, self.width);
        write_text(out, &self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TtStemsRecord {
    pub h: Vec<TtStemRecord>,
    pub v: Vec<TtStemRecord>,
}

impl Record for TtStemsRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        Ok(TtStemsRecord {
            h: Vec::read(cursor)?,
            v: Vec::read(cursor)?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        self.h.write(out)?;
        self.v.write(out)
    }
}

/// Rounding thresholds for one stem: pixels-per-em values at which the stem
/// grows to 2, 3, 4 and 5 pixels, or only the 1-pixel threshold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TtStemPpemsRecord {
    pub h: Vec<Vec<u16>>,
    pub v: Vec<Vec<u16>>,
}

impl Record for TtStemPpemsRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        Ok(TtStemPpemsRecord {
            h: Vec::read(cursor)?,
            v: Vec::read(cursor)?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        self.h.write(out)?;
        self.v.write(out)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TtZoneRecord {
    pub position: i32,
    pub width: i32,
    pub name: String,
}

impl Record for TtZoneRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        Ok(TtZoneRecord {
            position: cursor.varint()?,
            width: cursor.varint()?,
            name: read_text(cursor)?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        write_varint(out, self.position);
        write_varint(out, self.width);
        write_text(out, &self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TtZonesRecord {
    pub top: Vec<TtZoneRecord>,
    pub bottom: Vec<TtZoneRecord>,
}

impl Record for TtZonesRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        Ok(TtZonesRecord {
            top: Vec::read(cursor)?,
            bottom: Vec::read(cursor)?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        self.top.write(out)?;
        self.bottom.write(out)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TtZoneDeltaRecord {
    pub top: bool,
    pub zone: usize,
    pub ppem: u16,
    pub shift: i8,
}

impl Record for TtZoneDeltaRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        Ok(TtZoneDeltaRecord {
            top: cursor.u8()? != 0,
            zone: cursor.count()?,
            ppem: u16::read(cursor)?,
            shift: read_narrow(cursor, "zone shift")?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        out.push(u8::from(self.top));
        write_count(out, self.zone)?;
        self.ppem.write(out)?;
        write_varint(out, i32::from(self.shift));
        Ok(())
    }
}

/// Fixed `u16` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GaspRecord {
    pub ppem: u16,
    pub behavior: u16,
}

impl Record for GaspRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        Ok(GaspRecord {
            ppem: cursor.u16()?,
            behavior: cursor.u16()?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        out.extend_from_slice(&self.ppem.to_le_bytes());
        out.extend_from_slice(&self.behavior.to_le_bytes());
        Ok(())
    }
}

/// Fixed `u16` ppem and `i16` extremes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VdmxRecord {
    pub ppem: u16,
    pub y_max: i16,
    pub y_min: i16,
}

impl Record for VdmxRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        Ok(VdmxRecord {
            ppem: cursor.u16()?,
            y_max: cursor.i16()?,
            y_min: cursor.i16()?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        out.extend_from_slice(&self.ppem.to_le_bytes());
        out.extend_from_slice(&self.y_max.to_le_bytes());
        out.extend_from_slice(&self.y_min.to_le_bytes());
        Ok(())
    }
}

/// Kerning or metrics flags of one class, attached by class name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassFlagRecord {
    pub name: String,
    pub flags: u8,
}

impl Record for ClassFlagRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        Ok(ClassFlagRecord {
            name: read_text(cursor)?,
            flags: read_narrow(cursor, "class flags")?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        write_text(out, &self.name)?;
        write_varint(out, i32::from(self.flags));
        Ok(())
    }
}

/// A fixed `u16` slot number, then the glyph name up to the end of the payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodingSlotRecord {
    pub gid: usize,
    pub name: String,
}

impl Record for EncodingSlotRecord {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        let gid = usize::from(cursor.u16()?);
        let at = cursor.offset();
        let name = String::from_utf8(cursor.take(cursor.remaining())?.to_vec())
            .map_err(|e| FakeLabError::General(format!("Invalid text at {}: {}", at, e)))?;
        Ok(EncodingSlotRecord { gid, name })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        let gid = u16::try_from(self.gid).map_err(|_| {
            FakeLabError::General(format!("Encoding slot {} out of range", self.gid))
        })?;
        out.extend_from_slice(&gid.to_le_bytes());
        out.extend_from_slice(self.name.as_bytes());
        Ok(())
    }
}

mod tt_field {
    pub const END: u8 = 0x32;
    pub const HEAD_FLAGS: u8 = 0x33;
    pub const LOWEST_REC_PPEM: u8 = 0x34;
    pub const FONT_DIRECTION_HINT: u8 = 0x35;
    pub const MAC_STYLE: u8 = 0x36;
    pub const LINE_GAP: u8 = 0x37;
    pub const WEIGHT_CLASS: u8 = 0x38;
    pub const WIDTH_CLASS: u8 = 0x39;
    pub const FS_TYPE: u8 = 0x3a;
    pub const SUBSCRIPT: u8 = 0x3b;
    pub const SUPERSCRIPT: u8 = 0x3c;
    pub const STRIKEOUT_SIZE: u8 = 0x3d;
    pub const STRIKEOUT_POSITION: u8 = 0x3e;
    pub const FAMILY_CLASS: u8 = 0x3f;
    pub const PANOSE: u8 = 0x40;
    pub const FS_SELECTION: u8 = 0x41;
    pub const TYPO_ASCENDER: u8 = 0x42;
    pub const TYPO_DESCENDER: u8 = 0x43;
    pub const TYPO_LINE_GAP: u8 = 0x44;
    pub const WIN_ASCENT: u8 = 0x45;
    pub const WIN_DESCENT: u8 = 0x46;
    pub const CODEPAGE_RANGES: u8 = 0x47;
}

fn read_quad(cursor: &mut Cursor) -> Result<[i16; 4], FakeLabError> {
    Ok([
        read_narrow(cursor, "script metric")?,
        read_narrow(cursor, "script metric")?,
        read_narrow(cursor, "script metric")?,
        read_narrow(cursor, "script metric")?,
    ])
}

/// Key/value pairs: a key byte, then the value. Absent keys keep their
/// defaults; the list ends with key `0x32`.
impl Record for TableFields {
    fn read(cursor: &mut Cursor) -> Result<Self, FakeLabError> {
        let mut t = TableFields::default();
        loop {
            let at = cursor.offset();
            match cursor.u8()? {
                tt_field::END => break,
                tt_field::HEAD_FLAGS => t.head_flags = read_narrow(cursor, "head flags")?,
                tt_field::LOWEST_REC_PPEM => {
                    t.head_lowest_rec_ppem = read_narrow(cursor, "lowest ppem")?
                }
                tt_field::FONT_DIRECTION_HINT => {
                    t.head_font_direction_hint = read_narrow(cursor, "direction hint")?
                }
                tt_field::MAC_STYLE => t.head_mac_style = read_narrow(cursor, "mac style")?,
                tt_field::LINE_GAP => t.hhea_line_gap = read_narrow(cursor, "line gap")?,
                tt_field::WEIGHT_CLASS => {
                    t.os2_us_weight_class = read_narrow(cursor, "weight class")?
                }
                tt_field::WIDTH_CLASS => t.os2_us_width_class = read_narrow(cursor, "width class")?,
                tt_field::FS_TYPE => t.os2_fs_type = read_narrow(cursor, "fsType")?,
                tt_field::SUBSCRIPT => t.os2_subscript = read_quad(cursor)?,
                tt_field::SUPERSCRIPT => t.os2_superscript = read_quad(cursor)?,
                tt_field::STRIKEOUT_SIZE => {
                    t.os2_strikeout_size = read_narrow(cursor, "strikeout size")?
                }
                tt_field::STRIKEOUT_POSITION => {
                    t.os2_strikeout_position = read_narrow(cursor, "strikeout position")?
                }
                tt_field::FAMILY_CLASS => {
                    t.os2_family_class = read_narrow(cursor, "family class")?
                }
                tt_field::PANOSE => {
                    let len = cursor.count()?;
                    t.panose = cursor.take(len)?.to_vec();
                }
                tt_field::FS_SELECTION => t.os2_fs_selection = read_narrow(cursor, "fsSelection")?,
                tt_field::TYPO_ASCENDER => {
                    t.os2_typo_ascender = read_narrow(cursor, "typo ascender")?
                }
                tt_field::TYPO_DESCENDER => {
                    t.os2_typo_descender = read_narrow(cursor, "typo descender")?
                }
                tt_field::TYPO_LINE_GAP => {
                    t.os2_typo_line_gap = read_narrow(cursor, "typo line gap")?
                }
                tt_field::WIN_ASCENT => t.os2_win_ascent = read_narrow(cursor, "win ascent")?,
                tt_field::WIN_DESCENT => t.os2_win_descent = read_narrow(cursor, "win descent")?,
                tt_field::CODEPAGE_RANGES => {
                    t.codepage_ranges = read_list(cursor, |c| c.u32())?;
                }
                other => {
                    return Err(FakeLabError::General(format!(
                        "Unknown TrueType info key {} at {}",
                        other, at
                    )))
                }
            }
        }
        Ok(t)
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), FakeLabError> {
        let mut field = |key: u8, value: i32| {
            out.push(key);
            write_varint(out, value);
        };
        field(tt_field::HEAD_FLAGS, i32::from(self.head_flags));
        field(tt_field::LOWEST_REC_PPEM, i32::from(self.head_lowest_rec_ppem));
        field(
            tt_field::FONT_DIRECTION_HINT,
            i32::from(self.head_font_direction_hint),
        );
        field(tt_field::MAC_STYLE, i32::from(self.head_mac_style));
        field(tt_field::LINE_GAP, i32::from(self.hhea_line_gap));
        field(tt_field::WEIGHT_CLASS, i32::from(self.os2_us_weight_class));
        field(tt_field::WIDTH_CLASS, i32::from(self.os2_us_width_class));
        field(tt_field::FS_TYPE, i32::from(self.os2_fs_type));
        field(tt_field::STRIKEOUT_SIZE, i32::from(self.os2_strikeout_size));
        field(
            tt_field::STRIKEOUT_POSITION,
            i32::from(self.os2_strikeout_position),
        );
        field(tt_field::FAMILY_CLASS, i32::from(self.os2_family_class));
        field(tt_field::FS_SELECTION, i32::from(self.os2_fs_selection));
        field(tt_field::TYPO_ASCENDER, i32::from(self.os2_typo_ascender));
        field(tt_field::TYPO_DESCENDER, i32::from(self.os2_typo_descender));
        field(tt_field::TYPO_LINE_GAP, i32::from(self.os2_typo_line_gap));
        field(tt_field::WIN_ASCENT, i32::from(self.os2_win_ascent));
        field(tt_field::WIN_DESCENT, i32::from(self.os2_win_descent));
        for (key, quad) in [
            (tt_field::SUBSCRIPT, &self.os2_subscript),
            (tt_field::SUPERSCRIPT, &self.os2_superscript),
        ] {
            out.push(key);
            for value in quad {
                write_varint(out, i32::from(*value));
            }
        }
        out.push(tt_field::PANOSE);
        write_count(out, self.panose.len())?;
        out.extend_from_slice(&self.panose);
        out.push(tt_field::CODEPAGE_RANGES);
        write_count(out, self.codepage_ranges.len())?;
        for range in &self.codepage_ranges {
            out.extend_from_slice(&range.to_le_bytes());
        }
        out.push(tt_field::END);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use pretty_assertions::assert_eq;

    fn bytes<T: Record>(record: &T) -> Vec<u8> {
        let mut out = vec![];
        record.write(&mut out).unwrap();
        out
    }

    fn parse<T: Record>(data: &[u8]) -> Result<T, FakeLabError> {
        let mut cursor = Cursor::new(data, 0);
        let record = T::read(&mut cursor)?;
        assert!(cursor.at_end());
        Ok(record)
    }

    fn two_master_glyph() -> GlyphRecord {
        GlyphRecord {
            name: "a".to_string(),
            num_masters: 2,
            nodes: vec![
                NodeRecord {
                    nodetype: 0,
                    flags: 0,
                    points: vec![vec![(10, 0)], vec![(12, 0)]],
                },
                NodeRecord {
                    nodetype: 3,
                    flags: 1,
                    points: vec![
                        vec![(10, 50), (40, 80), (80, 80)],
                        vec![(12, 55), (45, 90), (90, 90)],
                    ],
                },
            ],
            metrics: vec![(500, 0), (560, 0)],
            kerning: vec![KerningRecord {
                gid: 3,
                values: vec![-40, -60],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_glyph_layout() {
        let data = bytes(&two_master_glyph());
        assert_eq!(&data[..4], &GLYPH_HEADER);
        // Name "a", two masters, then the outline section
        assert_eq!(&data[4..8], &[140, b'a', 141, section::OUTLINE]);
        // 2 nodes of 1 and 3 points, x and y, in two masters
        assert_eq!(&data[8..10], &[139 + 16, 139 + 2]);
        // Move node: type 0, then (10, 0) and (12, 0) from the origin
        assert_eq!(&data[10..15], &[0x00, 149, 139, 151, 139]);
        // Curve node with smooth flags, deltas from the move point
        assert_eq!(&data[15..17], &[0x13, 139]);
        assert_eq!(data.last(), Some(&section::END));
        assert_eq!(parse::<GlyphRecord>(&data).unwrap(), two_master_glyph());
    }

    #[test]
    fn test_glyph_rejects_unknown_section() {
        let mut data = GLYPH_HEADER.to_vec();
        data.extend_from_slice(&[140, b'a', 140, 0x09]);
        assert!(matches!(
            parse::<GlyphRecord>(&data),
            Err(FakeLabError::General(msg)) if msg.contains("section 9")
        ));
    }

    #[test]
    fn test_glyph_master_count_bounds() {
        let mut data = GLYPH_HEADER.to_vec();
        data.extend_from_slice(&[140, b'a', 139 + 17, section::END]);
        assert!(parse::<GlyphRecord>(&data).is_err());
    }

    #[test]
    fn test_metrics_must_match_masters() {
        let mut glyph = two_master_glyph();
        glyph.metrics.pop();
        let mut out = vec![];
        assert!(matches!(
            glyph.write(&mut out),
            Err(FakeLabError::MasterCountMismatch { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn test_guide_slope() {
        let guide = GuideRecord {
            position: 300,
            angle: 45.0,
        };
        let data = bytes(&guide);
        // 300 fits two bytes, 10000 needs the five-byte form
        assert_eq!(data.len(), 7);
        let back = parse::<GuideRecord>(&data).unwrap();
        assert_eq!(back.position, 300);
        assert!((back.angle - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_postscript_info_is_fixed_size() {
        let record = PostScriptInfoRecord {
            blue_values: vec![-10, 0, 500, 510],
            blue_scale: 0.04,
            ..Default::default()
        };
        let data = bytes(&record);
        assert_eq!(data.len(), 4 * (1 + 14 + 10 + 14 + 10 + 12 + 12) + 8 + 4 * 8);
        let back = parse::<PostScriptInfoRecord>(&data).unwrap();
        assert_eq!(&back.blue_values[..4], &[-10, 0, 500, 510]);
        assert_eq!(back.blue_values.len(), BLUE_VALUES_SIZE);

        let too_many = PostScriptInfoRecord {
            stem_snap_v: vec![1; 13],
            ..Default::default()
        };
        assert!(too_many.write(&mut vec![]).is_err());
    }

    #[test]
    fn test_table_fields_tolerate_missing_keys() {
        let data = [tt_field::WEIGHT_CLASS, 248, 36, tt_field::END];
        let fields = parse::<TableFields>(&data).unwrap();
        assert_eq!(fields.os2_us_weight_class, 400);
        assert_eq!(fields.os2_us_width_class, 0);
        assert!(parse::<TableFields>(&[0x20, 139, tt_field::END]).is_err());
    }

    #[test]
    fn test_encoding_slot() {
        let slot = EncodingSlotRecord {
            gid: 65,
            name: "A".to_string(),
        };
        assert_eq!(bytes(&slot), vec![65, 0, b'A']);
        assert_eq!(parse::<EncodingSlotRecord>(&[65, 0, b'A']).unwrap(), slot);
    }

    #[test]
    fn test_huge_count_fails_cleanly() {
        // A list claiming two billion items in a few bytes
        let data = [255, 0x7f, 0xff, 0xff, 0xff, 139];
        assert!(matches!(
            parse::<Vec<Vec<(i32, i32)>>>(&data),
            Err(FakeLabError::Truncated { .. })
        ));
    }
}
