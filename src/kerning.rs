use std::collections::{BTreeMap, HashMap};

use crate::{
    common::MasterValues, convertors::vfb::records::KerningRecord, FakeLabError, Font,
};

/// A kerning value against one right-hand glyph, stored on the left-hand glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct KerningPair {
    /// Index of the right-hand glyph
    pub key: i32,
    pub values: MasterValues<i32>,
}

impl KerningPair {
    pub fn new(key: i32, value: i32) -> Self {
        KerningPair {
            key,
            values: MasterValues::splat(value),
        }
    }

    pub fn value(&self) -> i32 {
        *self.values.get()
    }

    pub fn set_value(&mut self, value: i32) {
        self.values.set(value)
    }

    pub(crate) fn set_layers_number(&mut self, count: usize) -> Result<(), FakeLabError> {
        self.values.set_count(count)
    }

    pub(crate) fn add_axis(&mut self) -> Result<(), FakeLabError> {
        self.values.add_axis()
    }

    pub(crate) fn remove_axis(&mut self, axis: usize, factor: f64) -> Result<(), FakeLabError> {
        self.values.remove_axis_at(axis, factor)
    }

    pub(crate) fn serialize(&self) -> KerningRecord {
        KerningRecord {
            gid: self.key,
            values: self.values.live().to_vec(),
        }
    }

    pub(crate) fn deserialize(record: &KerningRecord) -> Result<KerningPair, FakeLabError> {
        Ok(KerningPair {
            key: record.gid,
            values: MasterValues::from_live(&record.values)?,
        })
    }
}

/// Flattens class and glyph kerning into glyph pairs for one master.
///
/// Each stored pair is classified by whether its left glyph keys a left
/// kerning class and its right glyph keys a right kerning class. Buckets are
/// applied class-class, class-glyph, glyph-class, then glyph-glyph, so a later,
/// more specific pair overwrites a broader expansion of the same glyph pair.
/// The result is ordered by left then right glyph name.
pub fn expand_kerning(
    font: &Font,
    master: usize,
) -> Result<BTreeMap<(String, String), i32>, FakeLabError> {
    let left_classes = class_members(font, true);
    let right_classes = class_members(font, false);

    let mut buckets: [Vec<(&str, &str, i32)>; 4] = Default::default();
    for glyph in font.glyphs.iter() {
        for pair in glyph.kerning.iter() {
            let right = usize::try_from(pair.key)
                .ok()
                .and_then(|ix| font.glyphs.get(ix))
                .ok_or_else(|| FakeLabError::UnresolvedReference {
                    what: format!("kerning pair right glyph of {}", glyph.name),
                    index: pair.key,
                })?;
            let value = *pair.values.at(master).ok_or_else(|| FakeLabError::IndexOutOfRange {
                what: "master".to_string(),
                index: master,
                len: pair.values.count(),
            })?;
            let left_is_class = left_classes.contains_key(glyph.name.as_str());
            let right_is_class = right_classes.contains_key(right.name.as_str());
            let bucket = match (left_is_class, right_is_class) {
                (true, true) => 0,
                (true, false) => 1,
                (false, true) => 2,
                (false, false) => 3,
            };
            buckets[bucket].push((glyph.name.as_str(), right.name.as_str(), value));
        }
    }

    let mut flat = BTreeMap::new();
    for (bucket_ix, bucket) in buckets.iter().enumerate() {
        let (left_is_class, right_is_class) = (bucket_ix < 2, bucket_ix % 2 == 0);
        log::trace!("Expanding {} kerning pairs in bucket {}", bucket.len(), bucket_ix);
        for (left, right, value) in bucket {
            for l in expand(left, &left_classes, left_is_class) {
                for r in expand(right, &right_classes, right_is_class) {
                    flat.insert((l.clone(), r), *value);
                }
            }
        }
    }
    Ok(flat)
}

fn expand(name: &str, classes: &HashMap<&str, Vec<&str>>, is_class: bool) -> Vec<String> {
    match classes.get(name) {
        Some(members) if is_class => members.iter().map(|m| m.to_string()).collect(),
        _ => vec![name.to_string()],
    }
}

/// Maps each kerning class key glyph to the class glyphs, key included.
fn class_members(font: &Font, left: bool) -> HashMap<&str, Vec<&str>> {
    let mut map: HashMap<&str, Vec<&str>> = HashMap::new();
    for class in font.classes.kerning_classes(left) {
        if let Some(key) = class.key() {
            map.entry(key).or_default().extend(class.glyphs());
        }
    }
    map
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::Glyph;
    use pretty_assertions::assert_eq;

    fn kerned_font() -> Font {
        let mut font = Font::new();
        for name in ["A", "Aacute", "V", "W", "T", "o"] {
            font.append_glyph(Glyph::new(name)).unwrap();
        }
        font.classes
            .replace_all(&["_A_L: A' Aacute", "_V_R: V' W"])
            .unwrap();
        let v = font.find_glyph("V") as i32;
        let o = font.find_glyph("o") as i32;
        let a = font.find_glyph("A") as usize;
        let t = font.find_glyph("T") as usize;
        let aacute = font.find_glyph("Aacute") as usize;
        // Exception first in source order, class pair second
        font.glyph_mut(aacute).unwrap().kerning.push(KerningPair::new(v, -20));
        font.glyph_mut(a).unwrap().kerning.push(KerningPair::new(v, -80));
        font.glyph_mut(t).unwrap().kerning.push(KerningPair::new(o, -60));
        font
    }

    #[test]
    fn test_specific_pairs_override_class_pairs() {
        let font = kerned_font();
        let flat = expand_kerning(&font, 0).unwrap();
        let expected: BTreeMap<(String, String), i32> = [
            (("A", "V"), -80),
            (("A", "W"), -80),
            (("Aacute", "V"), -20),
            (("Aacute", "W"), -20),
            (("T", "o"), -60),
        ]
        .into_iter()
        .map(|((l, r), v)| ((l.to_string(), r.to_string()), v))
        .collect();
        assert_eq!(flat, expected);
    }

    #[test]
    fn test_sorted_output() {
        let flat = expand_kerning(&kerned_font(), 0).unwrap();
        let keys: Vec<_> = flat.keys().cloned().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_dangling_right_glyph() {
        let mut font = kerned_font();
        font.glyph_mut(0).unwrap().kerning.push(KerningPair::new(99, 10));
        assert!(matches!(
            expand_kerning(&font, 0),
            Err(FakeLabError::UnresolvedReference { index: 99, .. })
        ));
    }
}
