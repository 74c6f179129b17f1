use crate::{common::Point, convertors::vfb::records::ImageRecord};

/// A bitmap placed behind a glyph's outline as a tracing background.
///
/// The pixel data is kept as stored; nothing here decodes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Image {
    pub origin: Point,
    pub width: i32,
    pub height: i32,
    pub data: Vec<u8>,
}

impl Image {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub(crate) fn serialize(&self) -> ImageRecord {
        ImageRecord {
            origin: self.origin.into(),
            width: self.width,
            height: self.height,
            data: self.data.clone(),
        }
    }

    pub(crate) fn deserialize(record: &ImageRecord) -> Image {
        Image {
            origin: record.origin.into(),
            width: record.width,
            height: record.height,
            data: record.data.clone(),
        }
    }
}
