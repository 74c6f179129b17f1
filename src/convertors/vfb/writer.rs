//! Flattens a [`Font`] into entries in the canonical order:
//!
//! 1. encoding
//! 2. font information: identity, classes, features, TrueType data
//! 3. multiple master information: axes, masters, PostScript info
//! 4. global guides
//! 5. glyphs, each followed by its own sections
//! 6. export options
use crate::{
    convertors::vfb::{
        records::{ClassFlagRecord, EncodingSlotRecord, MasterLocationRecord},
        Entry, EntryKey, RawEntry, VfbWriteOptions,
    },
    encoding::Encoding,
    font::MAX_AXES,
    guide::serialize_guides,
    master::PostScriptInfo,
    FakeLabError, Font, Glyph,
};

struct Writer<'a> {
    entries: Vec<Entry>,
    options: &'a VfbWriteOptions,
}

impl Writer<'_> {
    fn push(&mut self, entry: Entry) {
        log::trace!("Writing {:?}", entry.key);
        self.entries.push(entry);
    }

    fn str(&mut self, key: EntryKey, value: &str) {
        self.push(Entry::str(key, value));
    }

    fn int(&mut self, key: EntryKey, value: i32) {
        self.push(Entry::int(key, value));
    }

    fn marker(&mut self, key: EntryKey) {
        self.push(Entry::raw(key, vec![]));
    }

    fn emit_optional(&self, is_empty: bool) -> bool {
        !is_empty || self.options.always_emit_optional
    }

    fn optional_str(&mut self, key: EntryKey, value: &str) {
        if self.emit_optional(value.is_empty()) {
            self.str(key, value);
        }
    }

    fn optional_ints(&mut self, key: EntryKey, values: &[i32]) {
        if self.emit_optional(values.is_empty()) {
            self.push(Entry::ints(key, values.to_vec()));
        }
    }

    fn raw_entries(&mut self, raw: &[RawEntry]) {
        for entry in raw {
            self.push(Entry::raw(EntryKey::Unknown(entry.key), entry.data.clone()));
        }
    }
}

/// Produces the entries for a font, checking that it is consistent enough
/// to be read back.
pub fn write(font: &Font, options: &VfbWriteOptions) -> Result<Vec<Entry>, FakeLabError> {
    check_consistency(font)?;
    let mut w = Writer {
        entries: vec![],
        options,
    };
    write_encoding(&mut w, font)?;
    w.marker(EntryKey::BlockFontInfoStart);
    write_identity(&mut w, font)?;
    write_classes(&mut w, font)?;
    write_truetype(&mut w, font)?;
    w.marker(EntryKey::BlockFontInfoEnd);
    write_mm_info(&mut w, font)?;
    write_global_guides(&mut w, font)?;
    // Anything after the first glyph entry would be read back into a glyph.
    w.raw_entries(&font.unknown_entries);
    for glyph in font.glyphs.iter() {
        write_glyph(&mut w, glyph).map_err(|e| e.in_glyph(&glyph.name))?;
    }
    w.optional_ints(EntryKey::ExportOptions, &font.export_options);
    w.optional_ints(
        EntryKey::OpenTypeExportOptions,
        &font.opentype_export_options,
    );
    Ok(w.entries)
}

fn check_consistency(font: &Font) -> Result<(), FakeLabError> {
    let masters = font.master_count();
    let axes = font.axis_count();
    if axes > MAX_AXES {
        return Err(FakeLabError::UnsupportedAxisCount { count: axes });
    }
    if masters != 1 << axes {
        return Err(FakeLabError::MasterCountMismatch {
            what: format!("font with {} axes", axes),
            expected: 1 << axes,
            found: masters,
        });
    }
    if font.weight_vector.len() != masters {
        return Err(FakeLabError::MasterCountMismatch {
            what: "weight vector".to_string(),
            expected: masters,
            found: font.weight_vector.len(),
        });
    }
    for glyph in font.glyphs.iter() {
        if glyph.layers_number() != masters {
            return Err(FakeLabError::MasterCountMismatch {
                what: format!("glyph {}", glyph.name),
                expected: masters,
                found: glyph.layers_number(),
            });
        }
    }
    Ok(())
}

fn write_encoding(w: &mut Writer, font: &Font) -> Result<(), FakeLabError> {
    if font.encoding == Encoding::default() {
        w.marker(EntryKey::EncodingDefault);
        return Ok(());
    }
    for (gid, record) in font.encoding.iter().enumerate() {
        w.push(Entry::record(
            EntryKey::Encoding,
            &EncodingSlotRecord {
                gid,
                name: record.name.clone(),
            },
        )?);
    }
    Ok(())
}

fn write_identity(w: &mut Writer, font: &Font) -> Result<(), FakeLabError> {
    let names = &font.names;
    w.str(EntryKey::FontName, &names.font_name);
    w.int(EntryKey::MasterCount, font.master_count() as i32);
    w.push(Entry::record(EntryKey::WeightVector, &font.weight_vector)?);
    w.int(EntryKey::UniqueId, font.unique_id);
    w.str(EntryKey::Version, &names.version);
    w.str(EntryKey::Notice, &names.notice);
    w.str(EntryKey::FullName, &names.full_name);
    w.str(EntryKey::FamilyName, &names.family_name);
    w.str(EntryKey::StyleName, &names.style_name);
    w.str(EntryKey::MenuName, &names.menu_name);
    w.str(EntryKey::AppleName, &names.apple_name);
    w.str(EntryKey::Weight, &names.weight);
    w.str(EntryKey::Width, &names.width);
    w.str(EntryKey::License, &names.license);
    w.str(EntryKey::LicenseUrl, &names.license_url);
    w.str(EntryKey::Copyright, &names.copyright);
    w.str(EntryKey::Trademark, &names.trademark);
    w.str(EntryKey::Designer, &names.designer);
    w.str(EntryKey::DesignerUrl, &names.designer_url);
    w.str(EntryKey::VendorUrl, &names.vendor_url);
    w.str(EntryKey::Source, &names.source);
    w.int(EntryKey::IsFixedPitch, i32::from(font.is_fixed_pitch));
    w.int(EntryKey::WeightCode, font.weight_code);
    w.push(Entry::float(EntryKey::ItalicAngle, font.italic_angle));
    w.push(Entry::float(EntryKey::SlantAngle, font.slant_angle));
    w.int(EntryKey::UnderlinePosition, font.underline_position);
    w.int(EntryKey::UnderlineThickness, font.underline_thickness);
    w.int(EntryKey::MsCharset, font.ms_charset);
    w.str(EntryKey::Vendor, &names.vendor);
    if w.emit_optional(font.xuid.is_empty()) {
        w.push(Entry::ints(EntryKey::Xuid, font.xuid.clone()));
        w.int(EntryKey::XuidNum, font.xuid.len() as i32);
    }
    w.int(EntryKey::Year, font.year);
    w.int(EntryKey::VersionMajor, font.version_major);
    w.int(EntryKey::VersionMinor, font.version_minor);
    w.int(EntryKey::Upm, font.upm);
    w.int(EntryKey::FondId, font.fond_id);
    w.int(EntryKey::PclId, font.pcl_id);
    w.int(EntryKey::VpId, font.vp_id);
    w.int(EntryKey::MsId, font.ms_id);
    w.str(EntryKey::DefaultCharacter, &names.default_character);
    w.optional_str(EntryKey::SampleText, &names.sample_text);
    w.optional_str(EntryKey::Note, &font.note);
    w.optional_str(EntryKey::CustomData, &font.custom_data);
    if w.emit_optional(font.unicode_ranges.is_empty()) {
        let packed: u128 = crate::common::from_bitarray(&font.unicode_ranges);
        let words = (0..4)
            .map(|word| ((packed >> (32 * word)) & 0xffff_ffff) as u32 as i32)
            .collect();
        w.push(Entry::ints(EntryKey::UnicodeRanges, words));
    }
    if w.emit_optional(font.name_records.is_empty()) {
        let records: Vec<_> = font.name_records.iter().map(|r| r.serialize()).collect();
        w.push(Entry::record(EntryKey::FontNames, &records)?);
    }
    Ok(())
}

fn write_classes(w: &mut Writer, font: &Font) -> Result<(), FakeLabError> {
    for definition in font.classes.definitions() {
        w.str(EntryKey::OpenTypeClass, &definition);
    }
    let kerning: Vec<ClassFlagRecord> = font
        .classes
        .named_flags()
        .filter(|(_, flags)| flags.kerning_bits() != 0)
        .map(|(name, flags)| ClassFlagRecord {
            name: name.to_string(),
            flags: flags.kerning_bits(),
        })
        .collect();
    if w.emit_optional(kerning.is_empty()) {
        w.push(Entry::record(EntryKey::KerningClassFlags, &kerning)?);
    }
    let metrics: Vec<ClassFlagRecord> = font
        .classes
        .named_flags()
        .filter(|(_, flags)| flags.metrics_bits() != 0)
        .map(|(name, flags)| ClassFlagRecord {
            name: name.to_string(),
            flags: flags.metrics_bits(),
        })
        .collect();
    if w.emit_optional(metrics.is_empty()) {
        w.push(Entry::record(EntryKey::MetricsClassFlags, &metrics)?);
    }
    if w.emit_optional(font.features.is_empty()) {
        w.str(EntryKey::Features, &font.features.to_fea());
    }
    Ok(())
}

fn write_truetype(w: &mut Writer, font: &Font) -> Result<(), FakeLabError> {
    let tt = &font.ttinfo;
    w.push(Entry::record(EntryKey::TtInfo, &tt.tables)?);
    w.int(EntryKey::HheaAscender, tt.hhea_ascender);
    w.int(EntryKey::HheaDescender, tt.hhea_descender);
    if w.emit_optional(tt.gasp.is_empty()) {
        w.push(Entry::record(EntryKey::Gasp, &tt.gasp_record())?);
    }
    if w.emit_optional(tt.vdmx.is_empty()) {
        w.push(Entry::record(EntryKey::Vdmx, &tt.vdmx_record())?);
    }
    for (key, program) in [
        (EntryKey::Cvt, &tt.cvt),
        (EntryKey::Prep, &tt.prep),
        (EntryKey::Fpgm, &tt.fpgm),
    ] {
        if w.emit_optional(program.is_empty()) {
            w.push(Entry::raw(key, program.clone()));
        }
    }
    if w.emit_optional(!tt.has_stems()) {
        w.push(Entry::record(EntryKey::TrueTypeStems, &tt.stems_record())?);
        w.push(Entry::record(
            EntryKey::TrueTypeStemPpems,
            &tt.stem_ppems_record(),
        )?);
        w.push(Entry::record(
            EntryKey::TrueTypeStemPpems1,
            &tt.stem_ppems1_record(),
        )?);
    }
    if w.emit_optional(!tt.has_zones()) {
        w.push(Entry::record(EntryKey::TrueTypeZones, &tt.zones_record())?);
        let deltas = tt.zone_deltas_record();
        if w.emit_optional(deltas.is_empty()) {
            w.push(Entry::record(EntryKey::TrueTypeZoneDeltas, &deltas)?);
        }
    }
    for (tag, data) in &font.truetype_tables {
        let mut payload = tag.to_be_bytes().to_vec();
        payload.extend_from_slice(data);
        w.push(Entry::raw(EntryKey::TrueTypeTable, payload));
    }
    Ok(())
}

/// The live length of a zone array, taken across all masters.
fn zone_count(font: &Font, what: &str, get: impl Fn(&PostScriptInfo) -> usize) -> i32 {
    let counts: Vec<usize> = font.masters.iter().map(|m| get(&m.ps)).collect();
    let max = counts.iter().copied().max().unwrap_or(0);
    if counts.iter().any(|&c| c != max) {
        log::warn!(
            "Masters disagree on the length of {}; shorter ones will read back zero-padded",
            what
        );
    }
    max as i32
}

fn write_mm_info(w: &mut Writer, font: &Font) -> Result<(), FakeLabError> {
    w.marker(EntryKey::BlockMmFontInfoStart);
    w.int(EntryKey::AxisCount, font.axis_count() as i32);
    for axis in &font.axes {
        w.str(EntryKey::AxisName, &axis.name);
    }
    if !font.axes.is_empty() {
        w.push(Entry::ints(
            EntryKey::AxisMappingsCount,
            font.axes.iter().map(|a| a.mapping.len() as i32).collect(),
        ));
        let mappings: Vec<(f64, f64)> = font
            .axes
            .iter()
            .flat_map(|a| a.mapping.iter().copied())
            .collect();
        w.push(Entry::record(EntryKey::AxisMappings, &mappings)?);
    }
    for master in &font.masters {
        w.str(EntryKey::MasterName, &master.name);
    }
    for (index, master) in font.masters.iter().enumerate() {
        w.push(Entry::record(
            EntryKey::MasterLocation,
            &MasterLocationRecord {
                master: index,
                location: master.location.clone(),
            },
        )?);
        w.push(Entry::record(
            EntryKey::PostScriptInfo,
            &master.ps.serialize(),
        )?);
    }
    let counts = [
        (
            EntryKey::BlueValuesNum,
            zone_count(font, "blue values", |p| p.blue_values.len()),
        ),
        (
            EntryKey::OtherBluesNum,
            zone_count(font, "other blues", |p| p.other_blues.len()),
        ),
        (
            EntryKey::FamilyBluesNum,
            zone_count(font, "family blues", |p| p.family_blues.len()),
        ),
        (
            EntryKey::FamilyOtherBluesNum,
            zone_count(font, "family other blues", |p| p.family_other_blues.len()),
        ),
        (
            EntryKey::StemSnapHNum,
            zone_count(font, "horizontal stem snaps", |p| p.stem_snap_h.len()),
        ),
        (
            EntryKey::StemSnapVNum,
            zone_count(font, "vertical stem snaps", |p| p.stem_snap_v.len()),
        ),
    ];
    for (key, count) in counts {
        w.int(key, count);
    }
    w.marker(EntryKey::BlockMmFontInfoEnd);
    Ok(())
}

fn write_global_guides(w: &mut Writer, font: &Font) -> Result<(), FakeLabError> {
    let (guides, properties) = serialize_guides(&font.hguides, &font.vguides);
    if w.emit_optional(guides.is_empty()) {
        w.push(Entry::record(EntryKey::GlobalGuides, &guides)?);
    }
    if w.emit_optional(properties.is_empty()) {
        w.push(Entry::record(EntryKey::GlobalGuideProperties, &properties)?);
    }
    Ok(())
}

fn write_glyph(w: &mut Writer, glyph: &Glyph) -> Result<(), FakeLabError> {
    w.push(Entry::record(EntryKey::Glyph, &glyph.serialize())?);
    let links = glyph.links_record();
    if w.emit_optional(links.x.is_empty() && links.y.is_empty()) {
        w.push(Entry::record(EntryKey::Links, &links)?);
    }
    if let Some(image) = &glyph.image {
        w.push(Entry::record(EntryKey::Image, &image.serialize())?);
    }
    w.optional_ints(EntryKey::HintingOptions, &glyph.hinting_options);
    if let Some(mask) = &glyph.mask {
        if mask.layers_number() != glyph.layers_number() {
            return Err(FakeLabError::MasterCountMismatch {
                what: "mask".to_string(),
                expected: glyph.layers_number(),
                found: mask.layers_number(),
            });
        }
        w.push(Entry::record(EntryKey::Mask, &mask.serialize())?);
    }
    if w.emit_optional(glyph.origin == Default::default()) {
        w.push(Entry::ints(
            EntryKey::Origin,
            vec![glyph.origin.x, glyph.origin.y],
        ));
    }
    let (bmp, non_bmp): (Vec<u32>, Vec<u32>) =
        glyph.unicodes.iter().partition(|&&u| u <= 0xFFFF);
    let as_ints = |values: Vec<u32>| -> Vec<i32> {
        values.into_iter().filter_map(|u| i32::try_from(u).ok()).collect()
    };
    w.optional_ints(EntryKey::Unicodes, &as_ints(bmp));
    w.optional_ints(EntryKey::UnicodesNonBmp, &as_ints(non_bmp));
    if let Some(gdef) = glyph.gdef_record() {
        w.push(Entry::record(EntryKey::GdefData, &gdef)?);
    }
    if w.emit_optional(glyph.anchors.is_empty()) {
        w.push(Entry::record(
            EntryKey::AnchorsProperties,
            &glyph.anchor_properties(),
        )?);
        w.push(Entry::record(
            EntryKey::AnchorsMm,
            &glyph.anchors_mm_record(),
        )?);
    }
    let guide_properties = glyph.guide_properties();
    if w.emit_optional(guide_properties.is_empty()) {
        w.push(Entry::record(EntryKey::GuideProperties, &guide_properties)?);
    }
    w.optional_str(EntryKey::GlyphNote, &glyph.note);
    if w.emit_optional(glyph.mark == 0) {
        w.int(EntryKey::Mark, glyph.mark);
    }
    w.optional_str(EntryKey::GlyphCustomData, &glyph.custom_data);
    w.raw_entries(&glyph.unknown_entries);
    Ok(())
}
