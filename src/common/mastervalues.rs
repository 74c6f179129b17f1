use std::fmt::{Debug, Formatter};

use crate::{common::Point, FakeLabError};

/// The largest number of masters a VFB file can describe.
pub const MAX_MASTERS: usize = 16;

/// Values which can be blended between two masters.
pub trait Interpolate: Sized {
    /// Blends `self` towards `other`; `factor` 0.0 gives `self`, 1.0 gives `other`.
    fn interpolate(&self, other: &Self, factor: f64) -> Result<Self, FakeLabError>;
}

impl Interpolate for i32 {
    fn interpolate(&self, other: &Self, factor: f64) -> Result<Self, FakeLabError> {
        let a = *self as f64;
        let b = *other as f64;
        Ok((a + (b - a) * factor).round() as i32)
    }
}

impl Interpolate for f64 {
    fn interpolate(&self, other: &Self, factor: f64) -> Result<Self, FakeLabError> {
        Ok(self + (other - self) * factor)
    }
}

impl Interpolate for (f64, f64) {
    fn interpolate(&self, other: &Self, factor: f64) -> Result<Self, FakeLabError> {
        Ok((
            self.0.interpolate(&other.0, factor)?,
            self.1.interpolate(&other.1, factor)?,
        ))
    }
}

impl Interpolate for Point {
    // Points are truncated, not rounded.
    fn interpolate(&self, other: &Self, factor: f64) -> Result<Self, FakeLabError> {
        let x = self.x as f64 + (other.x - self.x) as f64 * factor;
        let y = self.y as f64 + (other.y - self.y) as f64 * factor;
        Ok(Point::new(x as i32, y as i32))
    }
}

impl<T: Interpolate> Interpolate for Vec<T> {
    fn interpolate(&self, other: &Self, factor: f64) -> Result<Self, FakeLabError> {
        if self.len() != other.len() {
            return Err(FakeLabError::General(format!(
                "Cannot interpolate lists of length {} and {}",
                self.len(),
                other.len()
            )));
        }
        self.iter()
            .zip(other.iter())
            .map(|(a, b)| a.interpolate(b, factor))
            .collect()
    }
}

/// Duplicates a per-master list for a newly added axis: `old + old`.
pub fn add_axis_to_list<T: Clone>(list: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(list.len() * 2);
    out.extend_from_slice(list);
    out.extend_from_slice(list);
    out
}

/// Halves a per-master list when its last axis is removed.
///
/// Element `i` of the result blends `list[i]` with `list[k + i]`, where `k` is
/// half the list length. This is lossy: adding the axis back duplicates the
/// blended values rather than restoring the originals.
pub fn remove_axis_from_list<T: Interpolate>(
    list: &[T],
    factor: f64,
) -> Result<Vec<T>, FakeLabError> {
    if list.len() % 2 != 0 {
        return Err(FakeLabError::General(format!(
            "Cannot remove an axis from a list of odd length {}",
            list.len()
        )));
    }
    let k = list.len() / 2;
    (0..k)
        .map(|i| list[i].interpolate(&list[k + i], factor))
        .collect()
}

/// Halves a per-master list by removing axis `axis`.
///
/// Masters are laid out on the unit hypercube with axis `n` as bit `n` of the
/// master index; masters that differ only in that bit are blended pairwise.
pub fn remove_axis_from_list_at<T: Interpolate>(
    list: &[T],
    axis: usize,
    factor: f64,
) -> Result<Vec<T>, FakeLabError> {
    let bit = u32::try_from(axis)
        .ok()
        .and_then(|axis| 1usize.checked_shl(axis))
        .unwrap_or(usize::MAX);
    if !list.len().is_power_of_two() || bit >= list.len() {
        return Err(FakeLabError::General(format!(
            "Cannot remove axis {} from a list of {} masters",
            axis,
            list.len()
        )));
    }
    (0..list.len())
        .filter(|i| i & bit == 0)
        .map(|i| list[i].interpolate(&list[i | bit], factor))
        .collect()
}

/// A value that varies per master.
///
/// Storage always has room for [`MAX_MASTERS`] slots; only the first
/// [`count`](MasterValues::count) of them are live. Setting the value with
/// [`set`](MasterValues::set) writes every slot, reading with
/// [`get`](MasterValues::get) returns slot 0; the `_at` variants address a
/// single master. Equality only looks at live slots.
#[derive(Clone)]
pub struct MasterValues<T> {
    values: [T; MAX_MASTERS],
    count: usize,
}

impl<T: Clone> MasterValues<T> {
    /// A single-master value.
    pub fn splat(value: T) -> Self {
        Self::with_count(value, 1)
    }

    pub fn with_count(value: T, count: usize) -> Self {
        MasterValues {
            values: std::array::from_fn(|_| value.clone()),
            count: count.clamp(1, MAX_MASTERS),
        }
    }

    /// Builds from the live values; unused slots follow the first master.
    pub fn from_live(live: &[T]) -> Result<Self, FakeLabError> {
        let first = live.first().ok_or_else(|| FakeLabError::MasterCountMismatch {
            what: "per-master list".to_string(),
            expected: 1,
            found: 0,
        })?;
        if live.len() > MAX_MASTERS {
            return Err(FakeLabError::TooManyMasters {
                requested: live.len(),
            });
        }
        let mut values: [T; MAX_MASTERS] = std::array::from_fn(|_| first.clone());
        for (slot, value) in values.iter_mut().zip(live.iter()) {
            *slot = value.clone();
        }
        Ok(MasterValues {
            values,
            count: live.len(),
        })
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Changes the live count without touching stored values.
    pub fn set_count(&mut self, count: usize) -> Result<(), FakeLabError> {
        if count == 0 || count > MAX_MASTERS {
            return Err(FakeLabError::TooManyMasters { requested: count });
        }
        self.count = count;
        Ok(())
    }

    pub fn get(&self) -> &T {
        &self.values[0]
    }

    /// Broadcasts `value` into every slot.
    pub fn set(&mut self, value: T) {
        for slot in self.values.iter_mut() {
            *slot = value.clone();
        }
    }

    pub fn at(&self, master: usize) -> Option<&T> {
        self.values.get(master)
    }

    pub fn at_mut(&mut self, master: usize) -> Option<&mut T> {
        self.values.get_mut(master)
    }

    pub fn set_at(&mut self, master: usize, value: T) -> Result<(), FakeLabError> {
        let slot = self
            .values
            .get_mut(master)
            .ok_or_else(|| FakeLabError::IndexOutOfRange {
                what: "master".to_string(),
                index: master,
                len: MAX_MASTERS,
            })?;
        *slot = value;
        Ok(())
    }

    pub fn live(&self) -> &[T] {
        &self.values[..self.count]
    }

    pub fn all(&self) -> &[T; MAX_MASTERS] {
        &self.values
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.values.iter_mut()
    }

    pub fn map<U: Clone, F: Fn(&T) -> U>(&self, f: F) -> MasterValues<U> {
        MasterValues {
            values: std::array::from_fn(|i| f(&self.values[i])),
            count: self.count,
        }
    }

    /// Doubles the live masters by duplicating them.
    pub fn add_axis(&mut self) -> Result<(), FakeLabError> {
        let count = self.count;
        if count * 2 > MAX_MASTERS {
            return Err(FakeLabError::TooManyMasters {
                requested: count * 2,
            });
        }
        for i in 0..count {
            self.values[count + i] = self.values[i].clone();
        }
        self.count = count * 2;
        Ok(())
    }
}

impl<T: Clone + Interpolate> MasterValues<T> {
    /// Halves the live masters by removing the last axis.
    pub fn remove_axis(&mut self, factor: f64) -> Result<(), FakeLabError> {
        let halved = remove_axis_from_list(self.live(), factor)?;
        self.replace_live(halved)
    }

    /// Halves the live masters by removing the given axis.
    pub fn remove_axis_at(&mut self, axis: usize, factor: f64) -> Result<(), FakeLabError> {
        let halved = remove_axis_from_list_at(self.live(), axis, factor)?;
        self.replace_live(halved)
    }

    fn replace_live(&mut self, live: Vec<T>) -> Result<(), FakeLabError> {
        if live.is_empty() {
            return Err(FakeLabError::MasterCountMismatch {
                what: "per-master list".to_string(),
                expected: 1,
                found: 0,
            });
        }
        let count = live.len();
        for (slot, value) in self.values.iter_mut().zip(live) {
            *slot = value;
        }
        self.count = count;
        Ok(())
    }
}

impl<T: Clone + Default> Default for MasterValues<T> {
    fn default() -> Self {
        MasterValues::splat(T::default())
    }
}

impl<T: PartialEq> PartialEq for MasterValues<T> {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count && self.values[..self.count] == other.values[..other.count]
    }
}

impl<T: Debug> Debug for MasterValues<T> {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        fmt.debug_list()
            .entries(self.values[..self.count].iter())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_broadcast() {
        let mut positions = MasterValues::splat(0);
        positions.set(50);
        assert_eq!(positions.all(), &[50; MAX_MASTERS]);
        assert_eq!(*positions.get(), 50);
        positions.set_at(3, 7).unwrap();
        assert_eq!(*positions.get(), 50);
        assert_eq!(positions.at(3), Some(&7));
        assert!(positions.set_at(16, 1).is_err());
    }

    #[test]
    fn test_add_axis_to_list() {
        assert_eq!(add_axis_to_list(&[1, 0]), vec![1, 0, 1, 0]);
    }

    #[rstest]
    #[case(0.5)]
    #[case(0.0)]
    fn test_remove_added_axis_is_identity(#[case] factor: f64) {
        let seq = vec![1, 0];
        let doubled = add_axis_to_list(&seq);
        assert_eq!(remove_axis_from_list(&doubled, factor).unwrap(), seq);
        let seq = vec![-250, 13, 0, 999, 41, 7, -3, 12];
        let doubled = add_axis_to_list(&seq);
        assert_eq!(remove_axis_from_list(&doubled, factor).unwrap(), seq);
    }

    #[test]
    fn test_remove_axis_rounding() {
        // 2.5 rounds away from zero, as does -2.5
        assert_eq!(remove_axis_from_list(&[0, 0, 5, -5], 0.5).unwrap(), vec![3, -3]);
        assert_eq!(remove_axis_from_list(&[0, 10], 1.0).unwrap(), vec![10]);
        assert!(remove_axis_from_list(&[1, 2, 3], 0.5).is_err());
    }

    #[test]
    fn test_remove_axis_points_truncate() {
        let points = [Point::new(0, 0), Point::new(5, -5)];
        assert_eq!(
            remove_axis_from_list(&points, 0.5).unwrap(),
            vec![Point::new(2, -2)]
        );
    }

    #[test]
    fn test_remove_axis_at() {
        // Two axes: index bit 0 is the first axis, bit 1 the second
        let values = [0, 10, 100, 110];
        assert_eq!(
            remove_axis_from_list_at(&values, 0, 0.5).unwrap(),
            vec![5, 105]
        );
        assert_eq!(
            remove_axis_from_list_at(&values, 1, 0.5).unwrap(),
            remove_axis_from_list(&values, 0.5).unwrap()
        );
        assert!(remove_axis_from_list_at(&values, 2, 0.5).is_err());
    }

    #[test]
    fn test_master_values_axis_roundtrip() {
        let mut v = MasterValues::from_live(&[3, 9]).unwrap();
        v.add_axis().unwrap();
        assert_eq!(v.live(), &[3, 9, 3, 9]);
        v.remove_axis(0.5).unwrap();
        assert_eq!(v, MasterValues::from_live(&[3, 9]).unwrap());
    }

    #[test]
    fn test_too_many_masters() {
        let mut v = MasterValues::with_count(1, 16);
        assert!(matches!(
            v.add_axis(),
            Err(FakeLabError::TooManyMasters { requested: 32 })
        ));
    }

    #[test]
    fn test_equality_ignores_dead_slots() {
        let mut a = MasterValues::from_live(&[1, 2]).unwrap();
        let b = MasterValues::from_live(&[1, 2]).unwrap();
        a.set_at(9, 99).unwrap();
        assert_eq!(a, b);
    }
}
