use font_types::Tag;

mod geometry;
pub(crate) mod mastervalues;

pub use geometry::{Matrix, Point, Rect};
pub use mastervalues::{
    add_axis_to_list, remove_axis_from_list, remove_axis_from_list_at, Interpolate,
    MasterValues, MAX_MASTERS,
};

use crate::FakeLabError;

pub(crate) fn tag_from_string(s: &str) -> Result<Tag, FakeLabError> {
    let mut chars = s.bytes().collect::<Vec<u8>>();
    if chars.is_empty() || chars.len() > 4 {
        return Err(FakeLabError::General(format!("Bad tag: '{}'", s)));
    }
    while chars.len() < 4 {
        chars.push(b' ');
    }
    Ok(Tag::new(&chars[0..4].try_into().map_err(|_| {
        FakeLabError::General(format!("Bad tag: '{}'", s))
    })?))
}

/// Converts `(x, y)` pairs as stored in records into points.
pub(crate) fn points_from_pairs(pairs: &[(i32, i32)]) -> Vec<Point> {
    pairs.iter().copied().map(Point::from).collect()
}

pub(crate) fn pairs_from_points(points: &[Point]) -> Vec<(i32, i32)> {
    points.iter().copied().map(<(i32, i32)>::from).collect()
}

/// Packs a list of set bit indices into an integer. Out-of-range bits are dropped.
pub(crate) fn from_bitarray<T>(bits: &[u8]) -> T
where
    T: num_traits::PrimInt,
{
    let width = T::zero().count_zeros() as usize;
    let mut result = T::zero();
    for bit in bits.iter().map(|b| usize::from(*b)) {
        if bit < width {
            result = result | (T::one() << bit);
        }
    }
    result
}

/// The indices of the set bits of an integer, lowest first.
pub(crate) fn to_bitarray<T>(v: T) -> Vec<u8>
where
    T: num_traits::PrimInt,
{
    let mut bits = vec![];
    let mut bit_index = 0u8;
    let mut value = v;
    while !value.is_zero() {
        if value & T::one() == T::one() {
            bits.push(bit_index);
        }
        value = value >> 1;
        bit_index += 1;
    }
    bits
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_tag_from_string() {
        assert_eq!(tag_from_string("kern").unwrap(), Tag::new(b"kern"));
        assert_eq!(tag_from_string("cv1").unwrap(), Tag::new(b"cv1 "));
        assert!(tag_from_string("toolong").is_err());
    }

    #[test]
    fn test_bitarray() {
        let packed: u128 = from_bitarray(&[0, 1, 57, 127]);
        assert_eq!(packed >> 127, 1);
        assert_eq!(to_bitarray(packed), vec![0, 1, 57, 127]);
        assert_eq!(from_bitarray::<u32>(&[40]), 0);
    }
}
