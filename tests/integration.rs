use std::collections::BTreeMap;

use fakelab::{
    convertors::vfb::{self, stream, Entry, EntryKey, EntryValue, RawEntry},
    filters::{DropAxis, FontFilter, Instantiate},
    ttinfo::{GaspRange, TTStem, TTZone, VdmxEntry},
    Anchor, Axis, Component, FakeLabError, Features, Font, GdefData, Glyph, Guide, Hint, Image,
    KerningPair, Link, Location, Node, Point, Rect, Replace, ReplaceTarget, ReplaceType,
    VfbReadOptions, VfbWriteOptions,
};
use font_types::Tag;
use pretty_assertions::assert_eq;
use rstest::rstest;

const AXIS_NAMES: [&str; 4] = ["Weight", "Width", "Optical Size", "Serif"];

fn glyph_with_outline(name: &str, unicode: u32, nodes: Vec<Node>, width: i32) -> Glyph {
    let mut glyph = Glyph::new(name);
    glyph.unicodes = vec![unicode];
    for node in nodes {
        glyph.append_node(node).unwrap();
    }
    glyph.set_width(width);
    glyph
}

/// A small font exercising most sections of the format, with `axes` axes.
fn sample_font(axes: usize) -> Font {
    let mut font = Font::new();
    font.names.family_name = "Sample Sans".to_string();
    font.names.style_name = "Regular".to_string();
    font.names.font_name = "SampleSans-Regular".to_string();
    font.names.full_name = "Sample Sans Regular".to_string();
    font.names.copyright = "Copyright 2024 Sample Foundry".to_string();
    font.year = 2024;
    font.xuid = vec![1, 2, 3];
    font.unicode_ranges = vec![0, 1, 33, 70];
    font.italic_angle = -12.5;
    font.note = "Proofed".to_string();
    font.set_blue_values(vec![-15, 0, 500, 515]);
    font.set_stem_snap_h(vec![80, 90]);
    font.features = Features::from_fea(
        "languagesystem DFLT dflt;\nfeature liga {\n  sub f i by fi;\n} liga;\n",
    );
    font.truetype_tables
        .insert(Tag::new(b"TEST"), vec![1, 2, 3, 4, 5]);

    let mut a = glyph_with_outline(
        "A",
        0x41,
        vec![
            Node::move_to(Point::new(0, 0)),
            Node::line_to(Point::new(300, 700)),
            Node::line_to(Point::new(600, 0)),
        ],
        600,
    );
    a.anchors.push(Anchor::new("top", Point::new(300, 700)));
    a.anchors.push(Anchor::new("bottom", Point::new(300, 0)));
    a.hhints.push(Hint::new(0, 20));
    a.vhints.push(Hint::new(280, 40));
    a.hlinks.push(Link::new(0, -2));
    a.vlinks.push(Link::new(0, 2));
    a.replace_table = vec![
        Replace::new(ReplaceType::HHint, 0),
        Replace::new(ReplaceType::VHint, 0),
        Replace::new(ReplaceType::Node, 1),
    ];
    a.note = "Apex needs work".to_string();
    a.mark = 3;
    a.gdef = Some(GdefData {
        class: Some("base".to_string()),
        carets: vec![],
    });
    a.image = Some(Image {
        origin: Point::new(-10, -200),
        width: 8,
        height: 2,
        data: vec![0xff, 0x00, 0x81, 0x7e, 0x3c, 0x18, 0x00, 0xff],
    });
    let mut mask = Glyph::new("A");
    mask.append_node(Node::move_to(Point::new(10, 0))).unwrap();
    mask.append_node(Node::line_to(Point::new(300, 680))).unwrap();
    mask.set_width(600);
    a.mask = Some(Box::new(mask));
    a.instructions = vec![0xb0, 0x00, 0x2d];
    let mut o = glyph_with_outline(
        "o",
        0x6F,
        vec![
            Node::move_to(Point::new(250, 0)),
            Node::curve_to(Point::new(100, 0), Point::new(0, 120), Point::new(0, 250)),
            Node::curve_to(Point::new(0, 380), Point::new(100, 500), Point::new(250, 500)),
        ],
        500,
    );
    o.vguides.push(Guide::new(250));
    let v = glyph_with_outline(
        "V",
        0x56,
        vec![
            Node::move_to(Point::new(0, 700)),
            Node::line_to(Point::new(300, 0)),
            Node::line_to(Point::new(600, 700)),
        ],
        600,
    );
    font.append_glyph(a).unwrap();
    font.append_glyph(o).unwrap();
    let v_index = font.append_glyph(v).unwrap();

    let mut aacute = Glyph::new("Aacute");
    aacute.unicodes = vec![0xC1];
    aacute.components.push(Component::new(0));
    aacute.set_width(600);
    font.append_glyph(aacute).unwrap();

    font.glyph_mut(0)
        .unwrap()
        .kerning
        .push(KerningPair::new(v_index as i32, -80));
    font.classes
        .replace_all(&["_A_L: A' Aacute", "_V_R: V'"])
        .unwrap();
    font.classes.set_class_flags(0, true, false).unwrap();
    font.classes.set_class_metrics_flags(1, false, true, true).unwrap();
    font.hguides.push(Guide::new(700));
    let mut f_i = glyph_with_outline(
        "fi",
        0xFB01,
        vec![
            Node::move_to(Point::new(40, 0)),
            Node::line_to(Point::new(40, 700)),
        ],
        560,
    );
    f_i.gdef = Some(GdefData {
        class: Some("ligature".to_string()),
        carets: vec![(280, 0)],
    });
    font.append_glyph(f_i).unwrap();

    let tt = &mut font.ttinfo;
    tt.gasp = vec![
        GaspRange {
            ppem: 8,
            behavior: 2,
        },
        GaspRange {
            ppem: 0xFFFF,
            behavior: 15,
        },
    ];
    tt.vdmx = vec![VdmxEntry {
        ppem: 12,
        y_max: 11,
        y_min: -3,
    }];
    tt.hstems = vec![TTStem {
        name: "bar".to_string(),
        width: 70,
        ppm1: 9,
        ppms: [18, 27, 36, 45],
    }];
    tt.vstems = vec![TTStem {
        name: "stem".to_string(),
        width: 84,
        ppm1: 8,
        ppms: [16, 24, 32, 40],
    }];
    tt.top_zones = vec![TTZone {
        position: 500,
        width: 15,
        name: "x-height".to_string(),
        deltas: BTreeMap::from([(12, 1), (13, -1)]),
    }];
    tt.bottom_zones = vec![TTZone {
        position: 0,
        width: -15,
        name: "baseline".to_string(),
        deltas: BTreeMap::new(),
    }];
    tt.tables.os2_us_weight_class = 400;
    tt.tables.panose = vec![2, 11, 5, 3, 2, 2, 2, 2, 2, 4];
    tt.tables.codepage_ranges = vec![1, 0];

    for name in AXIS_NAMES.iter().take(axes) {
        font.add_axis(Axis::new(*name)).unwrap();
    }
    let last = font.master_count() - 1;
    let a = font.glyph_mut(0).unwrap();
    a.set_width_at(last, 650).unwrap();
    a.anchors[0]
        .positions
        .set_at(last, Point::new(325, 720))
        .unwrap();
    font.set_blue_values_at(last, vec![-20, 0, 520, 540])
        .unwrap();
    font
}

#[rstest]
fn test_roundtrip_through_file(
    #[values(0, 1, 2, 3, 4)] axes: usize,
    #[values(false, true)] always_emit_optional: bool,
) {
    let font = sample_font(axes);
    assert_eq!(font.master_count(), 1 << axes);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.vfb");
    font.save_with_options(
        &path,
        &VfbWriteOptions {
            always_emit_optional,
        },
    )
    .unwrap();
    let back = Font::open(&path).unwrap();
    assert_eq!(back, font);
}

#[rstest]
#[case::one_master(0)]
#[case::two_masters(1)]
#[case::four_masters(2)]
fn test_glyph_sections_roundtrip(#[case] axes: usize) {
    let font = sample_font(axes);
    let bytes = vfb::to_bytes(&font, &VfbWriteOptions::default()).unwrap();
    let back = vfb::from_bytes(&bytes, &VfbReadOptions::default()).unwrap();
    let last = back.master_count() - 1;

    let a = &back.glyphs[0];
    assert_eq!(a.mask.as_ref().unwrap().nodes.len(), 2);
    assert_eq!(a.mask.as_ref().unwrap().layers_number(), back.master_count());
    assert_eq!(a.image.as_ref().unwrap().data.len(), 8);
    assert_eq!(a.gdef.as_ref().unwrap().class.as_deref(), Some("base"));
    assert_eq!(a.hlinks, vec![Link::new(0, -2)]);
    assert_eq!(a.vlinks, vec![Link::new(0, 2)]);
    assert_eq!(a.instructions, vec![0xb0, 0x00, 0x2d]);
    for replace in &a.replace_table {
        a.resolve_replace(replace).unwrap();
    }
    assert!(matches!(
        a.resolve_replace(&a.replace_table[2]),
        Ok(ReplaceTarget::Node(node)) if node.point() == Point::new(300, 700)
    ));
    let top = &a.anchors[0];
    if last > 0 {
        assert_eq!(top.positions.at(0), Some(&Point::new(300, 700)));
    }
    assert_eq!(top.positions.at(last), Some(&Point::new(325, 720)));
    assert_eq!(a.anchors[1].name, "bottom");

    let f_i = back.glyph("fi").unwrap();
    assert_eq!(f_i.gdef.as_ref().unwrap().carets, vec![(280, 0)]);

    let tt = &back.ttinfo;
    assert_eq!(tt.gasp.len(), 2);
    assert_eq!(tt.vdmx[0].y_min, -3);
    assert_eq!(tt.hstems[0].ppms, [18, 27, 36, 45]);
    assert_eq!(tt.vstems[0].ppm1, 8);
    assert_eq!(tt.top_zones[0].deltas.get(&13), Some(&-1));
    assert_eq!(tt.bottom_zones[0].name, "baseline");
    assert_eq!(tt.tables.os2_us_weight_class, 400);
    assert_eq!(back, font);
}

#[test]
fn test_weight_vector_follows_axes() {
    let mut font = sample_font(2);
    assert_eq!(font.weight_vector, vec![1.0, 0.0, 0.0, 0.0]);
    DropAxis::new("Width", 0.0).apply(&mut font).unwrap();
    assert_eq!(font.weight_vector, vec![1.0, 0.0]);
    font.add_axis(Axis::new("Serif")).unwrap();
    assert_eq!(font.weight_vector, vec![1.0, 0.0, 0.0, 0.0]);
    let bytes = vfb::to_bytes(&font, &VfbWriteOptions::default()).unwrap();
    let back = vfb::from_bytes(&bytes, &VfbReadOptions::default()).unwrap();
    assert_eq!(back.weight_vector, font.weight_vector);

    font.weight_vector.pop();
    assert!(matches!(
        vfb::to_bytes(&font, &VfbWriteOptions::default()),
        Err(FakeLabError::MasterCountMismatch { expected: 4, found: 3, .. })
    ));
}

/// Re-encodes a font after replacing the value of the first entry with `key`.
fn with_entry_value(font: &Font, key: EntryKey, value: EntryValue) -> Vec<u8> {
    let bytes = vfb::to_bytes(font, &VfbWriteOptions::default()).unwrap();
    let (header, mut entries) = stream::decompile(&bytes).unwrap();
    let entry = entries.iter_mut().find(|e| e.key == key).unwrap();
    entry.value = value;
    stream::compile(&header, &entries).unwrap()
}

#[rstest]
#[case::five(5)]
#[case::past_shift_width(70)]
fn test_axis_count_out_of_range(#[case] axes: i32) {
    let bytes = with_entry_value(&sample_font(0), EntryKey::AxisCount, EntryValue::Int(axes));
    assert!(matches!(
        vfb::from_bytes(&bytes, &VfbReadOptions::default()),
        Err(FakeLabError::MalformedEntry { .. })
    ));
}

#[test]
fn test_garbage_glyph_record() {
    let bytes = with_entry_value(
        &sample_font(0),
        EntryKey::Glyph,
        EntryValue::Record(vec![6; 30_000]),
    );
    assert!(matches!(
        vfb::from_bytes(&bytes, &VfbReadOptions::default()),
        Err(FakeLabError::MalformedEntry { .. })
    ));
}

#[test]
fn test_load_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.vfb");
    sample_font(1).save(&path).unwrap();
    let font = fakelab::load(path).unwrap();
    assert_eq!(font.glyphs.len(), 5);
    assert_eq!(font.find_glyph("Aacute"), 3);
    assert_eq!(font.find_glyph_by_unicode(0x6F), 1);
    assert_eq!(font.find_glyph("B"), -1);
}

#[test]
fn test_interpolated_blue_values() {
    let mut font = Font::new();
    font.add_axis(Axis::new("Weight")).unwrap();
    font.add_axis(Axis::new("Width")).unwrap();
    let corners = [
        [-8, 0, 497, 505],
        [-12, 0, 497, 509],
        [-9, 0, 497, 506],
        [-15, 0, 497, 512],
    ];
    for (master, blues) in corners.iter().enumerate() {
        font.set_blue_values_at(master, blues.to_vec()).unwrap();
    }
    let bytes = vfb::to_bytes(&font, &VfbWriteOptions::default()).unwrap();
    let font = vfb::from_bytes(&bytes, &VfbReadOptions::default()).unwrap();
    let instance = fakelab::interpolate(
        &font,
        &Location::normalized([("wt", 0.289), ("wd", 0.472)]),
    )
    .unwrap();
    assert_eq!(instance.blue_values(), vec![vec![-10, 0, 497, 507]]);
}

#[test]
fn test_filters_chain() {
    let mut font = sample_font(2);
    DropAxis::new("Width", 0.0).apply(&mut font).unwrap();
    assert_eq!(font.master_count(), 2);
    Instantiate::new(Location::normalized([("Weight", 1.0)]))
        .apply(&mut font)
        .unwrap();
    assert_eq!(font.master_count(), 1);
    // The diverged width sat on the last corner, dropped with the Width axis
    assert_eq!(font.glyphs[0].width(), 600);
    let bytes = vfb::to_bytes(&font, &VfbWriteOptions::default()).unwrap();
    assert_eq!(
        vfb::from_bytes(&bytes, &VfbReadOptions::default()).unwrap(),
        font
    );
}

#[test]
fn test_kerning_survives_roundtrip() {
    let font = sample_font(0);
    let bytes = vfb::to_bytes(&font, &VfbWriteOptions::default()).unwrap();
    let font = vfb::from_bytes(&bytes, &VfbReadOptions::default()).unwrap();
    let mut font = font;
    let v = font.find_glyph("V") as i32;
    let aacute = font.find_glyph("Aacute") as usize;
    font.glyph_mut(aacute)
        .unwrap()
        .kerning
        .push(KerningPair::new(v, -40));
    let flat = font.expand_kerning(0).unwrap();
    let pairs: Vec<((String, String), i32)> = flat.into_iter().collect();
    assert_eq!(
        pairs,
        vec![
            (("A".to_string(), "V".to_string()), -80),
            (("Aacute".to_string(), "V".to_string()), -40),
        ]
    );
}

#[test]
fn test_class_flags_follow_names() {
    let font = sample_font(0);
    let bytes = vfb::to_bytes(&font, &VfbWriteOptions::default()).unwrap();
    let mut font = vfb::from_bytes(&bytes, &VfbReadOptions::default()).unwrap();
    assert!(font.get_class_left(0).unwrap());
    assert!(!font.get_class_right(0).unwrap());
    assert_eq!(font.get_class_metrics_flags(1).unwrap(), fakelab::ClassFlags {
        metrics_rsb: true,
        metrics_width: true,
        ..Default::default()
    });

    font.classes
        .replace_all(&["_new: x' y", "_V_R: V' W", "_A_L: A' Aacute Agrave"])
        .unwrap();
    assert!(font.get_class_left(2).unwrap());
    assert!(font.get_class_metrics_flags(1).unwrap().metrics_width);
    assert!(font.get_class_metrics_flags(0).unwrap().is_empty());
}

#[test]
fn test_parse_class_definition() {
    let class = fakelab::GlyphClass::parse("_LAT_a_LEFT: a' c").unwrap();
    assert_eq!(class.key(), Some("a"));
    assert_eq!(class.members(), &["c".to_string()]);
    assert_eq!(class.sides(), "L");
}

#[test]
fn test_bounding_rect_includes_control_points() {
    let mut glyph = Glyph::new("bump");
    glyph.append_node(Node::move_to(Point::new(0, 0))).unwrap();
    glyph
        .append_node(Node::curve_to(
            Point::new(-50, 400),
            Point::new(350, 400),
            Point::new(300, 0),
        ))
        .unwrap();
    assert_eq!(
        glyph.get_bounding_rect(0),
        Some(Rect::new(Point::new(-50, 0), Point::new(350, 400)))
    );
}

#[test]
fn test_composite_bounds_after_roundtrip() {
    let font = sample_font(1);
    let bytes = vfb::to_bytes(&font, &VfbWriteOptions::default()).unwrap();
    let font = vfb::from_bytes(&bytes, &VfbReadOptions::default()).unwrap();
    let aacute = font.find_glyph("Aacute") as usize;
    assert_eq!(
        font.glyph_bounding_rect(aacute, 0).unwrap(),
        Some(Rect::new(Point::new(0, 0), Point::new(600, 700)))
    );
}

/// Re-encodes a font with extra raw entries spliced in before the entry
/// matching `before`.
fn with_unknown_entries(font: &Font, before: EntryKey, extra: Vec<Entry>) -> Vec<u8> {
    let bytes = vfb::to_bytes(font, &VfbWriteOptions::default()).unwrap();
    let (header, mut entries) = stream::decompile(&bytes).unwrap();
    let at = entries.iter().position(|e| e.key == before).unwrap();
    for (offset, entry) in extra.into_iter().enumerate() {
        entries.insert(at + offset, entry);
    }
    stream::compile(&header, &entries).unwrap()
}

#[test]
fn test_unknown_entries_are_preserved() {
    let mut font = Font::new();
    font.append_glyph(Glyph::new("a")).unwrap();
    font.append_glyph(Glyph::new("b")).unwrap();
    let bytes = vfb::to_bytes(&font, &VfbWriteOptions::default()).unwrap();
    let (header, mut entries) = stream::decompile(&bytes).unwrap();
    let second_glyph = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.key == EntryKey::Glyph)
        .map(|(ix, _)| ix)
        .nth(1)
        .unwrap();
    entries.insert(second_glyph, Entry::raw(EntryKey::Unknown(4242), vec![9, 8, 7]));
    entries.insert(0, Entry::raw(EntryKey::Unknown(4243), vec![1]));
    let bytes = stream::compile(&header, &entries).unwrap();

    let font = vfb::from_bytes(&bytes, &VfbReadOptions::default()).unwrap();
    assert_eq!(
        font.unknown_entries,
        vec![RawEntry {
            key: 4243,
            data: vec![1]
        }]
    );
    assert_eq!(
        font.glyphs[0].unknown_entries,
        vec![RawEntry {
            key: 4242,
            data: vec![9, 8, 7]
        }]
    );
    assert!(font.glyphs[1].unknown_entries.is_empty());

    let again = vfb::to_bytes(&font, &VfbWriteOptions::default()).unwrap();
    let reread = vfb::from_bytes(&again, &VfbReadOptions::default()).unwrap();
    assert_eq!(reread, font);
}

#[test]
fn test_strict_mode_rejects_unknown_entries() {
    let bytes = with_unknown_entries(
        &sample_font(0),
        EntryKey::Glyph,
        vec![Entry::raw(EntryKey::Unknown(4242), vec![0])],
    );
    let result = vfb::from_bytes(&bytes, &VfbReadOptions { strict: true });
    assert!(matches!(
        result,
        Err(FakeLabError::UnknownEntry { key: 4242, .. })
    ));
}

#[test]
fn test_truncated_file_names_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cut.vfb");
    let bytes = vfb::to_bytes(&sample_font(1), &VfbWriteOptions::default()).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
    match Font::open(&path) {
        Err(FakeLabError::InFile { path: p, source }) => {
            assert_eq!(p, path);
            assert!(matches!(*source, FakeLabError::Truncated { .. }));
        }
        other => panic!("Expected a truncation error, got {:?}", other),
    }
}

#[test]
fn test_glyph_data_before_glyph_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orphan.vfb");
    let bytes = with_unknown_entries(
        &sample_font(0),
        EntryKey::Glyph,
        vec![Entry::int(EntryKey::Mark, 4)],
    );
    std::fs::write(&path, bytes).unwrap();
    let err = Font::open(&path).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("orphan.vfb"), "{}", message);
    match err {
        FakeLabError::InFile { source, .. } => match *source {
            FakeLabError::MalformedEntry {
                key, offset, glyph, ..
            } => {
                assert_eq!(key, EntryKey::Mark.code());
                assert!(offset > 14);
                assert_eq!(glyph, None);
            }
            other => panic!("Expected a malformed entry, got {:?}", other),
        },
        other => panic!("Expected a path-carrying error, got {:?}", other),
    }
}

#[test]
fn test_not_a_vfb() {
    assert!(matches!(
        vfb::from_bytes(b"%!PS-AdobeFont-1.0", &VfbReadOptions::default()),
        Err(FakeLabError::NotAVfb { .. })
    ));
}
