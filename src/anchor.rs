use crate::{
    common::{MasterValues, Point},
    convertors::vfb::records::AnchorPropertyRecord,
    FakeLabError,
};

/// A named attachment point.
///
/// Positions vary per master. On disk they are split over two entries, the
/// per-master coordinates and the name/mark properties, which the reader
/// joins back together by index.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub name: String,
    pub mark: i32,
    pub positions: MasterValues<Point>,
}

impl Anchor {
    pub fn new(name: impl Into<String>, position: Point) -> Self {
        Anchor {
            name: name.into(),
            mark: 0,
            positions: MasterValues::splat(position),
        }
    }

    pub fn position(&self) -> Point {
        *self.positions.get()
    }

    pub fn set_position(&mut self, position: Point) {
        self.positions.set(position)
    }

    pub fn x(&self) -> i32 {
        self.position().x
    }

    pub fn y(&self) -> i32 {
        self.position().y
    }

    pub(crate) fn set_layers_number(&mut self, count: usize) -> Result<(), FakeLabError> {
        self.positions.set_count(count)
    }

    pub(crate) fn add_axis(&mut self) -> Result<(), FakeLabError> {
        self.positions.add_axis()
    }

    pub(crate) fn remove_axis(&mut self, axis: usize, factor: f64) -> Result<(), FakeLabError> {
        self.positions.remove_axis_at(axis, factor)
    }

    pub(crate) fn properties(&self) -> AnchorPropertyRecord {
        AnchorPropertyRecord {
            name: self.name.clone(),
            mark: self.mark,
        }
    }

    pub(crate) fn apply_properties(&mut self, record: &AnchorPropertyRecord) {
        self.name = record.name.clone();
        self.mark = record.mark;
    }
}
