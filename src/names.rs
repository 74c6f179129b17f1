use font_types::NameId;

use crate::convertors::vfb::records::NameRecordRecord;

/// Identity strings of a font. An empty string means "not set".
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Names {
    pub family_name: String,
    pub style_name: String,
    pub full_name: String,
    /// PostScript font name
    pub font_name: String,
    pub menu_name: String,
    pub apple_name: String,
    pub weight: String,
    pub width: String,
    pub version: String,
    pub notice: String,
    pub copyright: String,
    pub trademark: String,
    pub designer: String,
    pub designer_url: String,
    pub vendor_url: String,
    pub source: String,
    pub license: String,
    pub license_url: String,
    /// Four-character OS/2 vendor id
    pub vendor: String,
    pub default_character: String,
    pub sample_text: String,
}

impl Names {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name_id: NameId) -> Option<&str> {
        let value = match name_id {
            NameId::COPYRIGHT_NOTICE => &self.copyright,
            NameId::FAMILY_NAME => &self.family_name,
            NameId::SUBFAMILY_NAME => &self.style_name,
            NameId::FULL_NAME => &self.full_name,
            NameId::VERSION_STRING => &self.version,
            NameId::POSTSCRIPT_NAME => &self.font_name,
            NameId::TRADEMARK => &self.trademark,
            NameId::MANUFACTURER => &self.source,
            NameId::DESIGNER => &self.designer,
            NameId::DESCRIPTION => &self.notice,
            NameId::VENDOR_URL => &self.vendor_url,
            NameId::DESIGNER_URL => &self.designer_url,
            NameId::LICENSE_DESCRIPTION => &self.license,
            NameId::LICENSE_URL => &self.license_url,
            NameId::SAMPLE_TEXT => &self.sample_text,
            _ => return None,
        };
        (!value.is_empty()).then_some(value.as_str())
    }
}

/// An explicit `name` table record, overriding the value derived from [`Names`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: NameId,
    pub value: String,
}

impl NameRecord {
    /// A Windows Unicode English record.
    pub fn windows(name_id: NameId, value: impl Into<String>) -> Self {
        NameRecord {
            platform_id: 3,
            encoding_id: 1,
            language_id: 0x409,
            name_id,
            value: value.into(),
        }
    }

    pub(crate) fn serialize(&self) -> NameRecordRecord {
        NameRecordRecord {
            platform_id: self.platform_id,
            encoding_id: self.encoding_id,
            language_id: self.language_id,
            name_id: self.name_id.to_u16(),
            value: self.value.clone(),
        }
    }

    pub(crate) fn deserialize(record: &NameRecordRecord) -> Self {
        NameRecord {
            platform_id: record.platform_id,
            encoding_id: record.encoding_id,
            language_id: record.language_id,
            name_id: NameId::new(record.name_id),
            value: record.value.clone(),
        }
    }
}
