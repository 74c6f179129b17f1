use crate::{
    common::MasterValues,
    convertors::vfb::records::{GuideRecord, GuidePropertyRecord, GuidesRecord},
    FakeLabError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideOrientation {
    Horizontal,
    Vertical,
}

/// A guideline, either on a glyph or font-wide.
///
/// Horizontal guides are positioned on the y axis, vertical guides on x. The
/// angle is the slant away from the guide's own orientation, in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Guide {
    pub positions: MasterValues<i32>,
    pub angles: MasterValues<f64>,
    pub name: Option<String>,
    pub color: Option<i32>,
}

impl Default for Guide {
    fn default() -> Self {
        Guide::new(0)
    }
}

impl Guide {
    pub fn new(position: i32) -> Self {
        Guide {
            positions: MasterValues::splat(position),
            angles: MasterValues::splat(0.0),
            name: None,
            color: None,
        }
    }

    pub fn position(&self) -> i32 {
        *self.positions.get()
    }

    pub fn set_position(&mut self, position: i32) {
        self.positions.set(position)
    }

    pub fn angle(&self) -> f64 {
        *self.angles.get()
    }

    pub fn set_angle(&mut self, angle: f64) {
        self.angles.set(angle)
    }

    pub(crate) fn set_layers_number(&mut self, count: usize) -> Result<(), FakeLabError> {
        self.positions.set_count(count)?;
        self.angles.set_count(count)
    }

    pub(crate) fn add_axis(&mut self) -> Result<(), FakeLabError> {
        self.positions.add_axis()?;
        self.angles.add_axis()
    }

    pub(crate) fn remove_axis(&mut self, axis: usize, factor: f64) -> Result<(), FakeLabError> {
        self.positions.remove_axis_at(axis, factor)?;
        self.angles.remove_axis_at(axis, factor)
    }

    pub(crate) fn serialize(&self) -> Vec<GuideRecord> {
        self.positions
            .live()
            .iter()
            .zip(self.angles.live())
            .map(|(position, angle)| GuideRecord {
                position: *position,
                angle: *angle,
            })
            .collect()
    }

    pub(crate) fn deserialize(records: &[GuideRecord]) -> Result<Guide, FakeLabError> {
        let positions: Vec<i32> = records.iter().map(|r| r.position).collect();
        let angles: Vec<f64> = records.iter().map(|r| r.angle).collect();
        Ok(Guide {
            positions: MasterValues::from_live(&positions)?,
            angles: MasterValues::from_live(&angles)?,
            name: None,
            color: None,
        })
    }
}

/// Splits guides into the positional record and the sparse property list.
pub(crate) fn serialize_guides(
    hguides: &[Guide],
    vguides: &[Guide],
) -> (GuidesRecord, Vec<GuidePropertyRecord>) {
    let record = GuidesRecord {
        h: hguides.iter().map(Guide::serialize).collect(),
        v: vguides.iter().map(Guide::serialize).collect(),
    };
    let properties = hguides
        .iter()
        .enumerate()
        .map(|(ix, g)| (false, ix, g))
        .chain(vguides.iter().enumerate().map(|(ix, g)| (true, ix, g)))
        .filter(|(_, _, g)| g.name.is_some() || g.color.is_some())
        .map(|(vertical, index, g)| GuidePropertyRecord {
            vertical,
            index,
            name: g.name.clone(),
            color: g.color,
        })
        .collect();
    (record, properties)
}

pub(crate) fn deserialize_guides(
    record: &GuidesRecord,
) -> Result<(Vec<Guide>, Vec<Guide>), FakeLabError> {
    let h = record
        .h
        .iter()
        .map(|g| Guide::deserialize(g))
        .collect::<Result<Vec<_>, _>>()?;
    let v = record
        .v
        .iter()
        .map(|g| Guide::deserialize(g))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((h, v))
}

/// Applies name and colour properties to guides read earlier.
pub(crate) fn apply_guide_properties(
    hguides: &mut [Guide],
    vguides: &mut [Guide],
    properties: &[GuidePropertyRecord],
) -> Result<(), FakeLabError> {
    for property in properties {
        let list = if property.vertical {
            &mut *vguides
        } else {
            &mut *hguides
        };
        let len = list.len();
        let guide = list
            .get_mut(property.index)
            .ok_or_else(|| FakeLabError::IndexOutOfRange {
                what: "guide".to_string(),
                index: property.index,
                len,
            })?;
        guide.name = property.name.clone();
        guide.color = property.color;
    }
    Ok(())
}
