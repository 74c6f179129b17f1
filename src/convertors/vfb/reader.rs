//! Builds a [`Font`] from decoded entries.
//!
//! Entries are consumed in stream order. A `Glyph` entry starts a new glyph,
//! and every glyph-level entry after it belongs to that glyph until the next
//! `Glyph` entry. Some font data can only be assembled once the whole stream
//! has been seen (the encoding, the class list with its flags, the masters
//! and axes); it is collected first and committed at the end.
use std::collections::BTreeMap;

use font_types::Tag;

use crate::{
    common::{to_bitarray, Point, MAX_MASTERS},
    convertors::vfb::{
        records::{
            AnchorPropertyRecord, ClassFlagRecord, EncodingSlotRecord, GaspRecord, GdefRecord,
            GlyphRecord, GuidePropertyRecord, GuidesRecord, ImageRecord, LinksRecord,
            MasterLocationRecord, NameRecordRecord, PostScriptInfoRecord, TtStemPpemsRecord,
            TtStemsRecord, TtZoneDeltaRecord, TtZonesRecord, VdmxRecord,
        },
        Entry, EntryKey, RawEntry, VfbReadOptions,
    },
    encoding::Encoding,
    font::MAX_AXES,
    guide::{apply_guide_properties, deserialize_guides},
    master::PostScriptInfo,
    names::NameRecord,
    ttinfo::TableFields,
    Axis, FakeLabError, Features, Font, Glyph, Image, Master,
};

/// Which PostScript zone array a `*Num` entry gives the live length of.
#[derive(Debug, Clone, Copy)]
enum ZoneArray {
    BlueValues,
    OtherBlues,
    FamilyBlues,
    FamilyOtherBlues,
    StemSnapH,
    StemSnapV,
}

impl ZoneArray {
    fn of(self, ps: &mut PostScriptInfo) -> &mut Vec<i32> {
        match self {
            ZoneArray::BlueValues => &mut ps.blue_values,
            ZoneArray::OtherBlues => &mut ps.other_blues,
            ZoneArray::FamilyBlues => &mut ps.family_blues,
            ZoneArray::FamilyOtherBlues => &mut ps.family_other_blues,
            ZoneArray::StemSnapH => &mut ps.stem_snap_h,
            ZoneArray::StemSnapV => &mut ps.stem_snap_v,
        }
    }
}

struct Reader<'a> {
    options: &'a VfbReadOptions,
    font: Font,
    glyph: Option<Glyph>,
    master_count: Option<usize>,
    weight_vector: Option<Vec<f64>>,
    encoding_slots: BTreeMap<usize, String>,
    class_definitions: Vec<String>,
    kerning_flags: Vec<ClassFlagRecord>,
    metrics_flags: Vec<ClassFlagRecord>,
    axis_count: Option<usize>,
    axis_names: Vec<String>,
    mapping_counts: Vec<usize>,
    mappings: Vec<(f64, f64)>,
    master_names: Vec<String>,
    master_locations: BTreeMap<usize, Vec<f64>>,
    postscript: Vec<PostScriptInfo>,
    zone_counts: Vec<(ZoneArray, usize)>,
}

/// Reads a font from entries, end marker excluded.
pub fn read(entries: &[Entry], options: &VfbReadOptions) -> Result<Font, FakeLabError> {
    let mut reader = Reader {
        options,
        font: Font::new(),
        glyph: None,
        master_count: None,
        weight_vector: None,
        encoding_slots: BTreeMap::new(),
        class_definitions: vec![],
        kerning_flags: vec![],
        metrics_flags: vec![],
        axis_count: None,
        axis_names: vec![],
        mapping_counts: vec![],
        mappings: vec![],
        master_names: vec![],
        master_locations: BTreeMap::new(),
        postscript: vec![],
        zone_counts: vec![],
    };
    for entry in entries {
        log::debug!("Reading {:?} at {}", entry.key, entry.offset);
        reader.entry(entry).map_err(|e| reader.with_context(entry, e))?;
    }
    reader.finish()
}

fn count(entry: &Entry, value: i32) -> Result<usize, FakeLabError> {
    usize::try_from(value).map_err(|_| entry.malformed(format!("negative count {}", value)))
}

impl Reader<'_> {
    /// Turns any failure while handling an entry into one that names the
    /// entry, its offset and the glyph being read.
    fn with_context(&self, entry: &Entry, error: FakeLabError) -> FakeLabError {
        let error = match error {
            FakeLabError::MalformedEntry { .. }
            | FakeLabError::UnknownEntry { .. }
            | FakeLabError::IO(_) => error,
            other => entry.malformed(other.to_string()),
        };
        match &self.glyph {
            Some(glyph) if entry.key != EntryKey::Glyph => error.in_glyph(&glyph.name),
            _ => error,
        }
    }

    fn current_glyph(&mut self, entry: &Entry) -> Result<&mut Glyph, FakeLabError> {
        self.glyph
            .as_mut()
            .ok_or_else(|| entry.malformed("glyph data outside a glyph"))
    }

    fn finish_glyph(&mut self) {
        if let Some(glyph) = self.glyph.take() {
            log::trace!("Finished glyph {}", glyph.name);
            self.font.glyphs.push(glyph);
        }
    }

    fn start_glyph(&mut self, entry: &Entry) -> Result<(), FakeLabError> {
        self.finish_glyph();
        let record: GlyphRecord = entry.as_record()?;
        let glyph = Glyph::deserialize(&record)
            .map_err(|e| entry.malformed(e.to_string()).in_glyph(&record.name))?;
        let expected = self.master_count.unwrap_or(1);
        if glyph.layers_number() != expected {
            return Err(entry
                .malformed(format!(
                    "glyph has {} masters, font has {}",
                    glyph.layers_number(),
                    expected
                ))
                .in_glyph(&record.name));
        }
        self.glyph = Some(glyph);
        Ok(())
    }

    fn unknown(&mut self, entry: &Entry, code: u16) -> Result<(), FakeLabError> {
        if self.options.strict {
            return Err(FakeLabError::UnknownEntry {
                key: code,
                offset: entry.offset,
            });
        }
        let raw = RawEntry {
            key: code,
            data: entry.as_raw()?.to_vec(),
        };
        match self.glyph.as_mut() {
            Some(glyph) => {
                log::warn!(
                    "Preserving unknown entry {} at {} in glyph {}",
                    code,
                    entry.offset,
                    glyph.name
                );
                glyph.unknown_entries.push(raw);
            }
            None => {
                log::warn!("Preserving unknown entry {} at {}", code, entry.offset);
                self.font.unknown_entries.push(raw);
            }
        }
        Ok(())
    }

    fn entry(&mut self, entry: &Entry) -> Result<(), FakeLabError> {
        let font = &mut self.font;
        match entry.key {
            EntryKey::End
            | EntryKey::BlockNamesEnd
            | EntryKey::BlockFontInfoStart
            | EntryKey::BlockFontInfoEnd
            | EntryKey::BlockMmFontInfoStart
            | EntryKey::BlockMmFontInfoEnd
            | EntryKey::EncodingDefault => {}

            EntryKey::Encoding => {
                let slot: EncodingSlotRecord = entry.as_record()?;
                self.encoding_slots.insert(slot.gid, slot.name);
            }
            EntryKey::MasterCount => {
                let masters = count(entry, entry.as_int()?)?;
                if masters == 0 || masters > MAX_MASTERS {
                    return Err(FakeLabError::TooManyMasters { requested: masters });
                }
                if !font.glyphs.is_empty() || self.glyph.is_some() {
                    return Err(entry.malformed("master count after glyph data"));
                }
                self.master_count = Some(masters);
            }

            EntryKey::FontName => font.names.font_name = entry.as_str()?.to_string(),
            EntryKey::FullName => font.names.full_name = entry.as_str()?.to_string(),
            EntryKey::FamilyName => font.names.family_name = entry.as_str()?.to_string(),
            EntryKey::StyleName => font.names.style_name = entry.as_str()?.to_string(),
            EntryKey::MenuName => font.names.menu_name = entry.as_str()?.to_string(),
            EntryKey::AppleName => font.names.apple_name = entry.as_str()?.to_string(),
            EntryKey::Weight => font.names.weight = entry.as_str()?.to_string(),
            EntryKey::Width => font.names.width = entry.as_str()?.to_string(),
            EntryKey::Version => font.names.version = entry.as_str()?.to_string(),
            EntryKey::Notice => font.names.notice = entry.as_str()?.to_string(),
            EntryKey::Copyright => font.names.copyright = entry.as_str()?.to_string(),
            EntryKey::Trademark => font.names.trademark = entry.as_str()?.to_string(),
            EntryKey::Designer => font.names.designer = entry.as_str()?.to_string(),
            EntryKey::DesignerUrl => font.names.designer_url = entry.as_str()?.to_string(),
            EntryKey::VendorUrl => font.names.vendor_url = entry.as_str()?.to_string(),
            EntryKey::Source => font.names.source = entry.as_str()?.to_string(),
            EntryKey::License => font.names.license = entry.as_str()?.to_string(),
            EntryKey::LicenseUrl => font.names.license_url = entry.as_str()?.to_string(),
            EntryKey::Vendor => font.names.vendor = entry.as_str()?.to_string(),
            EntryKey::DefaultCharacter => {
                font.names.default_character = entry.as_str()?.to_string()
            }
            EntryKey::SampleText => font.names.sample_text = entry.as_str()?.to_string(),
            EntryKey::Note => font.note = entry.as_str()?.to_string(),
            EntryKey::CustomData => font.custom_data = entry.as_str()?.to_string(),

            EntryKey::Year => font.year = entry.as_int()?,
            EntryKey::VersionMajor => font.version_major = entry.as_int()?,
            EntryKey::VersionMinor => font.version_minor = entry.as_int()?,
            EntryKey::Upm => font.upm = entry.as_int()?,
            EntryKey::FondId => font.fond_id = entry.as_int()?,
            EntryKey::PclId => font.pcl_id = entry.as_int()?,
            EntryKey::VpId => font.vp_id = entry.as_int()?,
            EntryKey::MsId => font.ms_id = entry.as_int()?,
            EntryKey::WeightCode => font.weight_code = entry.as_int()?,
            EntryKey::UniqueId => font.unique_id = entry.as_int()?,
            EntryKey::UnderlinePosition => font.underline_position = entry.as_int()?,
            EntryKey::UnderlineThickness => font.underline_thickness = entry.as_int()?,
            EntryKey::IsFixedPitch => font.is_fixed_pitch = entry.as_int()? != 0,
            EntryKey::MsCharset => font.ms_charset = entry.as_int()?,
            EntryKey::ItalicAngle => font.italic_angle = entry.as_float()?,
            EntryKey::SlantAngle => font.slant_angle = entry.as_float()?,
            EntryKey::Xuid => font.xuid = entry.as_ints()?.to_vec(),
            EntryKey::XuidNum => {
                let n = count(entry, entry.as_int()?)?;
                if n > font.xuid.len() {
                    return Err(entry.malformed(format!(
                        "XUID count {} exceeds the {} values read",
                        n,
                        font.xuid.len()
                    )));
                }
                font.xuid.truncate(n);
            }
            EntryKey::UnicodeRanges => {
                font.unicode_ranges = entry
                    .as_ints()?
                    .iter()
                    .take(4)
                    .enumerate()
                    .flat_map(|(word, bits)| {
                        to_bitarray(*bits as u32)
                            .into_iter()
                            .map(move |bit| bit + 32 * word as u8)
                    })
                    .collect();
            }
            EntryKey::FontNames => {
                let records: Vec<NameRecordRecord> = entry.as_record()?;
                font.name_records = records.iter().map(NameRecord::deserialize).collect();
            }
            EntryKey::WeightVector => self.weight_vector = Some(entry.as_record()?),
            EntryKey::ExportOptions => font.export_options = entry.as_ints()?.to_vec(),
            EntryKey::OpenTypeExportOptions => {
                font.opentype_export_options = entry.as_ints()?.to_vec()
            }

            EntryKey::OpenTypeClass => self.class_definitions.push(entry.as_str()?.to_string()),
            EntryKey::KerningClassFlags => {
                let flags: Vec<ClassFlagRecord> = entry.as_record()?;
                self.kerning_flags.extend(flags);
            }
            EntryKey::MetricsClassFlags => {
                let flags: Vec<ClassFlagRecord> = entry.as_record()?;
                self.metrics_flags.extend(flags);
            }
            EntryKey::Features => font.features = Features::from_fea(entry.as_str()?),

            EntryKey::TtInfo => font.ttinfo.tables = entry.as_record::<TableFields>()?,
            EntryKey::Gasp => font
                .ttinfo
                .apply_gasp(&entry.as_record::<Vec<GaspRecord>>()?),
            EntryKey::Vdmx => font
                .ttinfo
                .apply_vdmx(&entry.as_record::<Vec<VdmxRecord>>()?),
            EntryKey::Cvt => font.ttinfo.cvt = entry.as_raw()?.to_vec(),
            EntryKey::Prep => font.ttinfo.prep = entry.as_raw()?.to_vec(),
            EntryKey::Fpgm => font.ttinfo.fpgm = entry.as_raw()?.to_vec(),
            EntryKey::HheaAscender => font.ttinfo.hhea_ascender = entry.as_int()?,
            EntryKey::HheaDescender => font.ttinfo.hhea_descender = entry.as_int()?,
            EntryKey::TrueTypeStems => font
                .ttinfo
                .apply_stems(&entry.as_record::<TtStemsRecord>()?)?,
            EntryKey::TrueTypeStemPpems => font
                .ttinfo
                .apply_stem_ppems(&entry.as_record::<TtStemPpemsRecord>()?)?,
            EntryKey::TrueTypeStemPpems1 => font
                .ttinfo
                .apply_stem_ppems1(&entry.as_record::<TtStemPpemsRecord>()?)?,
            EntryKey::TrueTypeZones => font
                .ttinfo
                .apply_zones(&entry.as_record::<TtZonesRecord>()?)?,
            EntryKey::TrueTypeZoneDeltas => font
                .ttinfo
                .apply_zone_deltas(&entry.as_record::<Vec<TtZoneDeltaRecord>>()?)?,
            EntryKey::TrueTypeTable => {
                let data = entry.as_raw()?;
                let (tag, table) = data
                    .split_first_chunk::<4>()
                    .ok_or_else(|| entry.malformed("table shorter than its tag"))?;
                font.truetype_tables
                    .insert(Tag::new(tag), table.to_vec());
            }

            EntryKey::GlobalGuides => {
                let record: GuidesRecord = entry.as_record()?;
                (font.hguides, font.vguides) = deserialize_guides(&record)?;
            }
            EntryKey::GlobalGuideProperties => {
                let properties: Vec<GuidePropertyRecord> = entry.as_record()?;
                apply_guide_properties(&mut font.hguides, &mut font.vguides, &properties)?;
            }

            EntryKey::AxisCount => {
                let axes = count(entry, entry.as_int()?)?;
                if axes > MAX_AXES {
                    return Err(entry.malformed(format!(
                        "{} axes, at most {} are supported",
                        axes, MAX_AXES
                    )));
                }
                self.axis_count = Some(axes);
            }
            EntryKey::AxisName => {
                if self.axis_names.len() == MAX_AXES {
                    return Err(entry.malformed(format!("more than {} axis names", MAX_AXES)));
                }
                self.axis_names.push(entry.as_str()?.to_string());
            }
            EntryKey::AxisMappingsCount => {
                self.mapping_counts = entry
                    .as_ints()?
                    .iter()
                    .map(|c| count(entry, *c))
                    .collect::<Result<_, _>>()?;
            }
            EntryKey::AxisMappings => self.mappings = entry.as_record()?,
            EntryKey::MasterName => self.master_names.push(entry.as_str()?.to_string()),
            EntryKey::MasterLocation => {
                let record: MasterLocationRecord = entry.as_record()?;
                self.master_locations.insert(record.master, record.location);
            }
            EntryKey::PostScriptInfo => {
                let record: PostScriptInfoRecord = entry.as_record()?;
                self.postscript.push(PostScriptInfo::deserialize(&record));
            }
            EntryKey::BlueValuesNum => self.zone_count(entry, ZoneArray::BlueValues)?,
            EntryKey::OtherBluesNum => self.zone_count(entry, ZoneArray::OtherBlues)?,
            EntryKey::FamilyBluesNum => self.zone_count(entry, ZoneArray::FamilyBlues)?,
            EntryKey::FamilyOtherBluesNum => {
                self.zone_count(entry, ZoneArray::FamilyOtherBlues)?
            }
            EntryKey::StemSnapHNum => self.zone_count(entry, ZoneArray::StemSnapH)?,
            EntryKey::StemSnapVNum => self.zone_count(entry, ZoneArray::StemSnapV)?,

            EntryKey::Glyph => self.start_glyph(entry)?,
            EntryKey::Links => {
                let record: LinksRecord = entry.as_record()?;
                self.current_glyph(entry)?.apply_links(&record);
            }
            EntryKey::Image => {
                let record: ImageRecord = entry.as_record()?;
                self.current_glyph(entry)?.image = Some(Image::deserialize(&record));
            }
            EntryKey::HintingOptions => {
                let options = entry.as_ints()?.to_vec();
                self.current_glyph(entry)?.hinting_options = options;
            }
            EntryKey::Mask => {
                let record: GlyphRecord = entry.as_record()?;
                let mask = Glyph::deserialize(&record)?;
                let glyph = self.current_glyph(entry)?;
                if mask.layers_number() != glyph.layers_number() {
                    return Err(entry.malformed(format!(
                        "mask has {} masters, glyph has {}",
                        mask.layers_number(),
                        glyph.layers_number()
                    )));
                }
                glyph.mask = Some(Box::new(mask));
            }
            EntryKey::Origin => {
                let origin = match entry.as_ints()? {
                    [x, y] => Point::new(*x, *y),
                    other => {
                        return Err(entry.malformed(format!(
                            "origin needs 2 values, found {}",
                            other.len()
                        )))
                    }
                };
                self.current_glyph(entry)?.origin = origin;
            }
            EntryKey::Unicodes | EntryKey::UnicodesNonBmp => {
                let codepoints = entry
                    .as_ints()?
                    .iter()
                    .map(|u| {
                        u32::try_from(*u)
                            .map_err(|_| entry.malformed(format!("bad code point {}", u)))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let glyph = self.current_glyph(entry)?;
                if entry.key == EntryKey::Unicodes {
                    glyph.unicodes = codepoints;
                } else {
                    glyph.unicodes.extend(codepoints);
                }
            }
            EntryKey::GdefData => {
                let record: GdefRecord = entry.as_record()?;
                self.current_glyph(entry)?.apply_gdef(&record);
            }
            EntryKey::AnchorsProperties => {
                let records: Vec<AnchorPropertyRecord> = entry.as_record()?;
                self.current_glyph(entry)?.apply_anchor_properties(&records)?;
            }
            EntryKey::AnchorsMm => {
                let positions: Vec<Vec<(i32, i32)>> = entry.as_record()?;
                self.current_glyph(entry)?.apply_anchors_mm(&positions)?;
            }
            EntryKey::GuideProperties => {
                let properties: Vec<GuidePropertyRecord> = entry.as_record()?;
                self.current_glyph(entry)?
                    .apply_guide_properties(&properties)?;
            }
            EntryKey::GlyphNote => {
                let note = entry.as_str()?.to_string();
                self.current_glyph(entry)?.note = note;
            }
            EntryKey::Mark => {
                let mark = entry.as_int()?;
                self.current_glyph(entry)?.mark = mark;
            }
            EntryKey::GlyphCustomData => {
                let data = entry.as_str()?.to_string();
                self.current_glyph(entry)?.custom_data = data;
            }

            EntryKey::Unknown(code) => self.unknown(entry, code)?,
        }
        Ok(())
    }

    fn zone_count(&mut self, entry: &Entry, array: ZoneArray) -> Result<(), FakeLabError> {
        let n = count(entry, entry.as_int()?)?;
        self.zone_counts.push((array, n));
        Ok(())
    }

    fn finish(mut self) -> Result<Font, FakeLabError> {
        self.finish_glyph();
        self.commit_encoding();
        self.commit_classes()?;
        self.commit_axes()?;
        self.commit_masters()?;
        Ok(self.font)
    }

    fn commit_encoding(&mut self) {
        self.font.encoding = if self.encoding_slots.is_empty() {
            Encoding::default()
        } else {
            Encoding::from_slots(&self.encoding_slots)
        };
    }

    fn commit_classes(&mut self) -> Result<(), FakeLabError> {
        let classes = &mut self.font.classes;
        classes.replace_all(&self.class_definitions)?;
        for record in &self.kerning_flags {
            if classes.find(&record.name).is_none() {
                log::warn!("Kerning flags for unknown class {}", record.name);
                continue;
            }
            let mut flags = classes.flags_by_name(&record.name);
            flags.set_kerning_bits(record.flags);
            classes.set_flags_by_name(&record.name, flags);
        }
        for record in &self.metrics_flags {
            if classes.find(&record.name).is_none() {
                log::warn!("Metrics flags for unknown class {}", record.name);
                continue;
            }
            let mut flags = classes.flags_by_name(&record.name);
            flags.set_metrics_bits(record.flags);
            classes.set_flags_by_name(&record.name, flags);
        }
        Ok(())
    }

    fn commit_axes(&mut self) -> Result<(), FakeLabError> {
        let count = self.axis_count.unwrap_or(self.axis_names.len());
        if count != self.axis_names.len() {
            log::warn!(
                "Axis count {} but {} axis names",
                count,
                self.axis_names.len()
            );
        }
        let mut axes: Vec<Axis> = (0..count)
            .map(|ix| match self.axis_names.get(ix) {
                Some(name) => Axis::new(name.clone()),
                None => Axis::new(format!("Axis {}", ix + 1)),
            })
            .collect();
        if !self.mapping_counts.is_empty() {
            let total: usize = self.mapping_counts.iter().sum();
            if self.mapping_counts.len() != axes.len() || total != self.mappings.len() {
                return Err(FakeLabError::General(format!(
                    "Axis mappings: {} counts summing to {} for {} axes and {} points",
                    self.mapping_counts.len(),
                    total,
                    axes.len(),
                    self.mappings.len()
                )));
            }
            let mut points = self.mappings.iter().copied();
            for (axis, n) in axes.iter_mut().zip(self.mapping_counts.iter()) {
                axis.mapping = points.by_ref().take(*n).collect();
            }
        }
        self.font.axes = axes;
        Ok(())
    }

    fn commit_masters(&mut self) -> Result<(), FakeLabError> {
        let count = self.master_count.unwrap_or(1);
        let axes = self.font.axes.len();
        if count != 1 << axes {
            return Err(FakeLabError::MasterCountMismatch {
                what: format!("font with {} axes", axes),
                expected: 1 << axes,
                found: count,
            });
        }
        if self.postscript.len() > count {
            log::warn!(
                "Ignoring {} PostScript info records beyond the {} masters",
                self.postscript.len() - count,
                count
            );
        }
        let mut masters: Vec<Master> = (0..count)
            .map(|ix| Master {
                name: self
                    .master_names
                    .get(ix)
                    .cloned()
                    .unwrap_or_else(|| format!("Master {}", ix + 1)),
                location: self
                    .master_locations
                    .get(&ix)
                    .cloned()
                    .unwrap_or_else(|| Master::corner_location(ix, axes)),
                ps: self.postscript.get(ix).cloned().unwrap_or_default(),
            })
            .collect();
        for (array, n) in &self.zone_counts {
            for master in masters.iter_mut() {
                let values = array.of(&mut master.ps);
                if *n > values.len() {
                    log::warn!("{:?} count {} exceeds the stored {}", array, n, values.len());
                }
                values.truncate(*n);
            }
        }
        self.font.masters = masters;
        self.font.weight_vector = match self.weight_vector.take() {
            Some(weights) if weights.len() != count => {
                return Err(FakeLabError::MasterCountMismatch {
                    what: "weight vector".to_string(),
                    expected: count,
                    found: weights.len(),
                })
            }
            Some(weights) => weights,
            None => {
                let mut weights = vec![0.0; count];
                if let Some(first) = weights.first_mut() {
                    *first = 1.0;
                }
                weights
            }
        };
        Ok(())
    }
}
