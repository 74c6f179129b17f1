use crate::{
    common::{pairs_from_points, points_from_pairs, MasterValues, Matrix, Point},
    convertors::vfb::records::ComponentRecord,
    FakeLabError, Font, Glyph,
};

/// A reference to another glyph, shifted and scaled per master.
///
/// The reference is a glyph index in the owning font. It is not checked when
/// set; a component pointing past the end of the glyph list only fails when it
/// is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub index: i32,
    pub deltas: MasterValues<Point>,
    pub scales: MasterValues<(f64, f64)>,
}

impl Component {
    pub fn new(index: i32) -> Self {
        Component {
            index,
            deltas: MasterValues::splat(Point::default()),
            scales: MasterValues::splat((1.0, 1.0)),
        }
    }

    pub fn with_delta(index: i32, delta: Point) -> Self {
        let mut component = Component::new(index);
        component.deltas.set(delta);
        component
    }

    pub fn delta(&self) -> Point {
        *self.deltas.get()
    }

    pub fn set_delta(&mut self, delta: Point) {
        self.deltas.set(delta)
    }

    pub fn scale(&self) -> (f64, f64) {
        *self.scales.get()
    }

    pub fn set_scale(&mut self, scale: (f64, f64)) {
        self.scales.set(scale)
    }

    /// The transformation applied to the referenced glyph in one master.
    pub fn matrix(&self, master: usize) -> Matrix {
        let delta = self.deltas.at(master).copied().unwrap_or_default();
        let (sx, sy) = self.scales.at(master).copied().unwrap_or((1.0, 1.0));
        Matrix::scale(sx, sy).then(&Matrix::translate(delta.x as f64, delta.y as f64))
    }

    /// Resolves the referenced glyph.
    pub fn glyph<'a>(&self, font: &'a Font) -> Result<&'a Glyph, FakeLabError> {
        usize::try_from(self.index)
            .ok()
            .and_then(|ix| font.glyphs.get(ix))
            .ok_or_else(|| FakeLabError::UnresolvedReference {
                what: "component glyph".to_string(),
                index: self.index,
            })
    }

    pub(crate) fn set_layers_number(&mut self, count: usize) -> Result<(), FakeLabError> {
        self.deltas.set_count(count)?;
        self.scales.set_count(count)
    }

    pub(crate) fn add_axis(&mut self) -> Result<(), FakeLabError> {
        self.deltas.add_axis()?;
        self.scales.add_axis()
    }

    pub(crate) fn remove_axis(&mut self, axis: usize, factor: f64) -> Result<(), FakeLabError> {
        self.deltas.remove_axis_at(axis, factor)?;
        self.scales.remove_axis_at(axis, factor)
    }

    pub(crate) fn serialize(&self) -> ComponentRecord {
        ComponentRecord {
            gid: self.index,
            offsets: pairs_from_points(self.deltas.live()),
            scales: self.scales.live().to_vec(),
        }
    }

    pub(crate) fn deserialize(
        record: &ComponentRecord,
        masters: usize,
    ) -> Result<Component, FakeLabError> {
        if record.offsets.len() != masters || record.scales.len() != masters {
            return Err(FakeLabError::MasterCountMismatch {
                what: format!("component of glyph {}", record.gid),
                expected: masters,
                found: record.offsets.len().min(record.scales.len()),
            });
        }
        Ok(Component {
            index: record.gid,
            deltas: MasterValues::from_live(&points_from_pairs(&record.offsets))?,
            scales: MasterValues::from_live(&record.scales)?,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_matrix() {
        let mut c = Component::with_delta(0, Point::new(100, 0));
        c.set_scale((0.5, 0.5));
        assert_eq!(c.matrix(0).apply(Point::new(200, 200)), Point::new(200, 100));
    }

    #[test]
    fn test_unresolved() {
        let font = Font::new();
        let c = Component::new(42);
        assert!(matches!(
            c.glyph(&font),
            Err(FakeLabError::UnresolvedReference { index: 42, .. })
        ));
        let c = Component::new(-1);
        assert!(c.glyph(&font).is_err());
    }

    #[test]
    fn test_deserialize_length_mismatch() {
        let record = ComponentRecord {
            gid: 1,
            offsets: vec![(0, 0)],
            scales: vec![(1.0, 1.0), (1.0, 1.0)],
        };
        assert!(Component::deserialize(&record, 2).is_err());
    }
}
