use crate::{
    common::MasterValues,
    convertors::vfb::records::ReplaceRecord,
    FakeLabError, Node,
};

/// A PostScript stem hint.
#[derive(Debug, Clone, PartialEq)]
pub struct Hint {
    pub positions: MasterValues<i32>,
    pub widths: MasterValues<i32>,
}

impl Default for Hint {
    fn default() -> Self {
        Hint::new(0, 0)
    }
}

impl Hint {
    pub fn new(position: i32, width: i32) -> Self {
        Hint {
            positions: MasterValues::splat(position),
            widths: MasterValues::splat(width),
        }
    }

    pub fn position(&self) -> i32 {
        *self.positions.get()
    }

    pub fn set_position(&mut self, position: i32) {
        self.positions.set(position)
    }

    pub fn width(&self) -> i32 {
        *self.widths.get()
    }

    pub fn set_width(&mut self, width: i32) {
        self.widths.set(width)
    }

    pub(crate) fn set_layers_number(&mut self, count: usize) -> Result<(), FakeLabError> {
        self.positions.set_count(count)?;
        self.widths.set_count(count)
    }

    pub(crate) fn add_axis(&mut self) -> Result<(), FakeLabError> {
        self.positions.add_axis()?;
        self.widths.add_axis()
    }

    pub(crate) fn remove_axis(&mut self, axis: usize, factor: f64) -> Result<(), FakeLabError> {
        self.positions.remove_axis_at(axis, factor)?;
        self.widths.remove_axis_at(axis, factor)
    }

    pub(crate) fn serialize(&self) -> Vec<(i32, i32)> {
        self.positions
            .live()
            .iter()
            .copied()
            .zip(self.widths.live().iter().copied())
            .collect()
    }

    pub(crate) fn deserialize(pairs: &[(i32, i32)]) -> Result<Hint, FakeLabError> {
        let positions: Vec<i32> = pairs.iter().map(|(p, _)| *p).collect();
        let widths: Vec<i32> = pairs.iter().map(|(_, w)| *w).collect();
        Ok(Hint {
            positions: MasterValues::from_live(&positions)?,
            widths: MasterValues::from_live(&widths)?,
        })
    }
}

/// A pair of node indices from which a hint is generated.
///
/// Negative second indices mark ghost links: -1 for a top ghost, -2 for a bottom one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub node1: i32,
    pub node2: i32,
}

impl Link {
    pub fn new(node1: i32, node2: i32) -> Self {
        Link { node1, node2 }
    }

    pub fn is_ghost(&self) -> bool {
        self.node2 < 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceType {
    HHint,
    VHint,
    /// Hint replacement starts at this node
    Node,
}

impl ReplaceType {
    fn code(self) -> u8 {
        match self {
            ReplaceType::HHint => 1,
            ReplaceType::VHint => 2,
            ReplaceType::Node => 255,
        }
    }

    fn from_code(code: u8) -> Option<ReplaceType> {
        match code {
            1 => Some(ReplaceType::HHint),
            2 => Some(ReplaceType::VHint),
            255 => Some(ReplaceType::Node),
            _ => None,
        }
    }
}

/// What a replace-table entry points at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReplaceTarget<'a> {
    HHint(&'a Hint),
    VHint(&'a Hint),
    Node(&'a Node),
}

/// One instruction of the hint replacement program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replace {
    pub replace_type: ReplaceType,
    pub index: i32,
}

impl Replace {
    pub fn new(replace_type: ReplaceType, index: i32) -> Self {
        Replace {
            replace_type,
            index,
        }
    }

    pub(crate) fn serialize(&self) -> ReplaceRecord {
        ReplaceRecord {
            kind: self.replace_type.code(),
            index: self.index,
        }
    }

    pub(crate) fn deserialize(record: &ReplaceRecord) -> Result<Replace, FakeLabError> {
        let replace_type = ReplaceType::from_code(record.kind).ok_or_else(|| {
            FakeLabError::General(format!("Unknown hint replacement type {}", record.kind))
        })?;
        Ok(Replace::new(replace_type, record.index))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::common::MAX_MASTERS;

    #[test]
    fn test_hint_broadcast() {
        let mut hint = Hint::default();
        hint.set_position(50);
        assert_eq!(hint.positions.all(), &[50; MAX_MASTERS]);
        assert_eq!(hint.position(), 50);
        hint.widths.set_at(1, 20).unwrap();
        assert_eq!(hint.width(), 0);
    }

    #[test]
    fn test_hint_record() {
        let hint = Hint::deserialize(&[(10, 20), (15, 25)]).unwrap();
        assert_eq!(hint.positions.live(), &[10, 15]);
        assert_eq!(hint.widths.live(), &[20, 25]);
        assert_eq!(hint.serialize(), vec![(10, 20), (15, 25)]);
    }

    #[test]
    fn test_replace_codes() {
        let r = Replace::new(ReplaceType::Node, 4);
        assert_eq!(Replace::deserialize(&r.serialize()).unwrap(), r);
        assert!(Replace::deserialize(&ReplaceRecord { kind: 7, index: 0 }).is_err());
    }
}
