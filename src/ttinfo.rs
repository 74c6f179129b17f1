use std::collections::BTreeMap;

use crate::{
    convertors::vfb::records::{
        GaspRecord, TtStemPpemsRecord, TtStemRecord, TtStemsRecord, TtZoneDeltaRecord,
        TtZoneRecord, TtZonesRecord, VdmxRecord,
    },
    FakeLabError,
};

/// Fields copied into the `head`, `hhea` and `OS/2` tables on export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableFields {
    pub head_flags: u16,
    pub head_lowest_rec_ppem: u16,
    pub head_font_direction_hint: i16,
    pub head_mac_style: u16,
    pub hhea_line_gap: i16,
    pub os2_us_weight_class: u16,
    pub os2_us_width_class: u16,
    pub os2_fs_type: u16,
    /// x size, y size, x offset, y offset
    pub os2_subscript: [i16; 4],
    pub os2_superscript: [i16; 4],
    pub os2_strikeout_size: i16,
    pub os2_strikeout_position: i16,
    pub os2_family_class: i16,
    pub panose: Vec<u8>,
    pub os2_fs_selection: u16,
    pub os2_typo_ascender: i16,
    pub os2_typo_descender: i16,
    pub os2_typo_line_gap: i16,
    pub os2_win_ascent: u16,
    pub os2_win_descent: u16,
    pub codepage_ranges: Vec<u32>,
}

/// A TrueType hinting stem.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TTStem {
    pub name: String,
    pub width: i32,
    /// The size at which the stem becomes one pixel wide
    pub ppm1: u16,
    /// Sizes at which the stem grows to 2, 3, 4 and 5 pixels
    pub ppms: [u16; 4],
}

/// A TrueType alignment zone with its per-size corrections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TTZone {
    pub position: i32,
    pub width: i32,
    pub name: String,
    /// Pixel shift keyed by ppem
    pub deltas: BTreeMap<u16, i8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GaspRange {
    pub ppem: u16,
    pub behavior: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VdmxEntry {
    pub ppem: u16,
    pub y_max: i16,
    pub y_min: i16,
}

/// TrueType-specific font data: hinting globals and table fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TTInfo {
    pub tables: TableFields,
    pub gasp: Vec<GaspRange>,
    pub vdmx: Vec<VdmxEntry>,
    pub hstems: Vec<TTStem>,
    pub vstems: Vec<TTStem>,
    pub top_zones: Vec<TTZone>,
    pub bottom_zones: Vec<TTZone>,
    pub cvt: Vec<u8>,
    pub prep: Vec<u8>,
    pub fpgm: Vec<u8>,
    pub hhea_ascender: i32,
    pub hhea_descender: i32,
}

/// Brings a list in line with an incoming record list.
///
/// An empty list is populated from the records; a populated one must match
/// them in length and is updated in place.
fn reconcile<T: Default, R>(
    what: &str,
    existing: &mut Vec<T>,
    incoming: &[R],
    update: impl Fn(&mut T, &R) -> Result<(), FakeLabError>,
) -> Result<(), FakeLabError> {
    if existing.is_empty() {
        existing.resize_with(incoming.len(), T::default);
    } else if existing.len() != incoming.len() {
        return Err(FakeLabError::General(format!(
            "{} count {} does not match the {} already read",
            what,
            incoming.len(),
            existing.len()
        )));
    }
    for (item, record) in existing.iter_mut().zip(incoming) {
        update(item, record)?;
    }
    Ok(())
}

impl TTInfo {
    pub(crate) fn gasp_record(&self) -> Vec<GaspRecord> {
        self.gasp
            .iter()
            .map(|g| GaspRecord {
                ppem: g.ppem,
                behavior: g.behavior,
            })
            .collect()
    }

    pub(crate) fn apply_gasp(&mut self, records: &[GaspRecord]) {
        self.gasp = records
            .iter()
            .map(|r| GaspRange {
                ppem: r.ppem,
                behavior: r.behavior,
            })
            .collect();
    }

    pub(crate) fn vdmx_record(&self) -> Vec<VdmxRecord> {
        self.vdmx
            .iter()
            .map(|v| VdmxRecord {
                ppem: v.ppem,
                y_max: v.y_max,
                y_min: v.y_min,
            })
            .collect()
    }

    pub(crate) fn apply_vdmx(&mut self, records: &[VdmxRecord]) {
        self.vdmx = records
            .iter()
            .map(|r| VdmxEntry {
                ppem: r.ppem,
                y_max: r.y_max,
                y_min: r.y_min,
            })
            .collect();
    }

    pub(crate) fn stems_record(&self) -> TtStemsRecord {
        let side = |stems: &[TTStem]| {
            stems
                .iter()
                .map(|s| TtStemRecord {
                    name: s.name.clone(),
                    width: s.width,
                })
                .collect()
        };
        TtStemsRecord {
            h: side(&self.hstems),
            v: side(&self.vstems),
        }
    }

    pub(crate) fn apply_stems(&mut self, record: &TtStemsRecord) -> Result<(), FakeLabError> {
        let update = |stem: &mut TTStem, r: &TtStemRecord| -> Result<(), FakeLabError> {
            stem.name = r.name.clone();
            stem.width = r.width;
            Ok(())
        };
        reconcile("Horizontal stem", &mut self.hstems, &record.h, update)?;
        reconcile("Vertical stem", &mut self.vstems, &record.v, update)
    }

    pub(crate) fn stem_ppems_record(&self) -> TtStemPpemsRecord {
        let side = |stems: &[TTStem]| stems.iter().map(|s| s.ppms.to_vec()).collect();
        TtStemPpemsRecord {
            h: side(&self.hstems),
            v: side(&self.vstems),
        }
    }

    pub(crate) fn apply_stem_ppems(
        &mut self,
        record: &TtStemPpemsRecord,
    ) -> Result<(), FakeLabError> {
        let update = |stem: &mut TTStem, ppms: &Vec<u16>| -> Result<(), FakeLabError> {
            stem.ppms = ppms.as_slice().try_into().map_err(|_| {
                FakeLabError::General(format!("Expected 4 stem ppems, found {}", ppms.len()))
            })?;
            Ok(())
        };
        reconcile("Horizontal stem", &mut self.hstems, &record.h, update)?;
        reconcile("Vertical stem", &mut self.vstems, &record.v, update)
    }

    pub(crate) fn stem_ppems1_record(&self) -> TtStemPpemsRecord {
        let side = |stems: &[TTStem]| stems.iter().map(|s| vec![s.ppm1]).collect();
        TtStemPpemsRecord {
            h: side(&self.hstems),
            v: side(&self.vstems),
        }
    }

    pub(crate) fn apply_stem_ppems1(
        &mut self,
        record: &TtStemPpemsRecord,
    ) -> Result<(), FakeLabError> {
        let update = |stem: &mut TTStem, ppms: &Vec<u16>| -> Result<(), FakeLabError> {
            match ppms.as_slice() {
                [ppm1] => {
                    stem.ppm1 = *ppm1;
                    Ok(())
                }
                _ => Err(FakeLabError::General(format!(
                    "Expected 1 stem ppem, found {}",
                    ppms.len()
                ))),
            }
        };
        reconcile("Horizontal stem", &mut self.hstems, &record.h, update)?;
        reconcile("Vertical stem", &mut self.vstems, &record.v, update)
    }

    pub(crate) fn zones_record(&self) -> TtZonesRecord {
        let side = |zones: &[TTZone]| {
            zones
                .iter()
                .map(|z| TtZoneRecord {
                    position: z.position,
                    width: z.width,
                    name: z.name.clone(),
                })
                .collect()
        };
        TtZonesRecord {
            top: side(&self.top_zones),
            bottom: side(&self.bottom_zones),
        }
    }

    pub(crate) fn apply_zones(&mut self, record: &TtZonesRecord) -> Result<(), FakeLabError> {
        let update = |zone: &mut TTZone, r: &TtZoneRecord| -> Result<(), FakeLabError> {
            zone.position = r.position;
            zone.width = r.width;
            zone.name = r.name.clone();
            Ok(())
        };
        reconcile("Top zone", &mut self.top_zones, &record.top, update)?;
        reconcile("Bottom zone", &mut self.bottom_zones, &record.bottom, update)
    }

    pub(crate) fn zone_deltas_record(&self) -> Vec<TtZoneDeltaRecord> {
        let side = |top: bool, zones: &[TTZone]| -> Vec<TtZoneDeltaRecord> {
            zones
                .iter()
                .enumerate()
                .flat_map(|(zone, z)| {
                    z.deltas.iter().map(move |(ppem, shift)| TtZoneDeltaRecord {
                        top,
                        zone,
                        ppem: *ppem,
                        shift: *shift,
                    })
                })
                .collect()
        };
        let mut deltas = side(true, &self.top_zones);
        deltas.extend(side(false, &self.bottom_zones));
        deltas
    }

    pub(crate) fn apply_zone_deltas(
        &mut self,
        records: &[TtZoneDeltaRecord],
    ) -> Result<(), FakeLabError> {
        for record in records {
            let zones = if record.top {
                &mut self.top_zones
            } else {
                &mut self.bottom_zones
            };
            let len = zones.len();
            let zone = zones
                .get_mut(record.zone)
                .ok_or_else(|| FakeLabError::IndexOutOfRange {
                    what: "zone".to_string(),
                    index: record.zone,
                    len,
                })?;
            zone.deltas.insert(record.ppem, record.shift);
        }
        Ok(())
    }

    pub fn has_stems(&self) -> bool {
        !self.hstems.is_empty() || !self.vstems.is_empty()
    }

    pub fn has_zones(&self) -> bool {
        !self.top_zones.is_empty() || !self.bottom_zones.is_empty()
    }
}
