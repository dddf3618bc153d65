use std::ops::{Add, AddAssign, Index, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

type CapacityVector = SmallVec<[f64; 2]>;

/// Multi-dimensional amount used both for vehicle capacities and job demands.
///
/// Missing dimensions are treated as zero, so a one-dimensional demand can be
/// compared against a two-dimensional capacity.
#[derive(Default, Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Capacity(CapacityVector);

impl Capacity {
    pub const ZERO: Capacity = Capacity(CapacityVector::new_const());

    pub fn from_vec(vec: Vec<f64>) -> Self {
        Capacity(CapacityVector::from_vec(vec))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&value| value == 0.0)
    }

    pub fn get(&self, index: usize) -> f64 {
        self.0.get(index).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    /// True when every dimension of `self` fits into `other`.
    pub fn is_less_or_equal(&self, other: &Capacity) -> bool {
        let len = self.len().max(other.len());
        (0..len).all(|i| self.get(i) <= other.get(i))
    }

    /// Dimension-wise maximum.
    pub fn max(&self, other: &Capacity) -> Capacity {
        self.zip_with(other, f64::max)
    }

    pub fn update_max(&mut self, other: &Capacity) {
        if other.len() > self.len() {
            self.0.resize(other.len(), 0.0);
        }
        for (i, value) in self.0.iter_mut().enumerate() {
            *value = value.max(other.get(i));
        }
    }

    fn zip_with(&self, other: &Capacity, op: impl Fn(f64, f64) -> f64) -> Capacity {
        let len = self.len().max(other.len());
        Capacity((0..len).map(|i| op(self.get(i), other.get(i))).collect())
    }
}

impl Index<usize> for Capacity {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl Add<&Capacity> for &Capacity {
    type Output = Capacity;

    fn add(self, rhs: &Capacity) -> Self::Output {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl Sub<&Capacity> for &Capacity {
    type Output = Capacity;

    fn sub(self, rhs: &Capacity) -> Self::Output {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl AddAssign<&Capacity> for Capacity {
    fn add_assign(&mut self, rhs: &Capacity) {
        if rhs.len() > self.len() {
            self.0.resize(rhs.len(), 0.0);
        }
        for (i, value) in self.0.iter_mut().enumerate() {
            *value += rhs.get(i);
        }
    }
}

impl SubAssign<&Capacity> for Capacity {
    fn sub_assign(&mut self, rhs: &Capacity) {
        if rhs.len() > self.len() {
            self.0.resize(rhs.len(), 0.0);
        }
        for (i, value) in self.0.iter_mut().enumerate() {
            *value -= rhs.get(i);
        }
    }
}

impl Neg for &Capacity {
    type Output = Capacity;

    fn neg(self) -> Self::Output {
        Capacity(self.0.iter().map(|value| -value).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_with_different_dimensions() {
        let a = Capacity::from_vec(vec![1.0, 2.0]);
        let b = Capacity::from_vec(vec![3.0]);

        assert_eq!(&a + &b, Capacity::from_vec(vec![4.0, 2.0]));
    }

    #[test]
    fn test_sub_assign_grows_dimensions() {
        let mut a = Capacity::from_vec(vec![1.0]);
        a -= &Capacity::from_vec(vec![1.0, 2.0]);

        assert_eq!(a, Capacity::from_vec(vec![0.0, -2.0]));
    }

    #[test]
    fn test_is_less_or_equal() {
        let capacity = Capacity::from_vec(vec![10.0, 5.0]);

        assert!(Capacity::from_vec(vec![10.0]).is_less_or_equal(&capacity));
        assert!(Capacity::ZERO.is_less_or_equal(&capacity));
        assert!(!Capacity::from_vec(vec![1.0, 6.0]).is_less_or_equal(&capacity));
        assert!(!Capacity::from_vec(vec![1.0, 0.0, 1.0]).is_less_or_equal(&capacity));
    }

    #[test]
    fn test_max_and_update_max() {
        let a = Capacity::from_vec(vec![1.0, 7.0]);
        let b = Capacity::from_vec(vec![4.0, 2.0, 1.0]);

        assert_eq!(a.max(&b), Capacity::from_vec(vec![4.0, 7.0, 1.0]));

        let mut c = a.clone();
        c.update_max(&b);
        assert_eq!(c, a.max(&b));
    }

    #[test]
    fn test_neg_and_empty() {
        let a = Capacity::from_vec(vec![1.0, -2.0]);

        assert_eq!(-&a, Capacity::from_vec(vec![-1.0, 2.0]));
        assert!(Capacity::from_vec(vec![0.0, 0.0]).is_empty());
        assert!(!a.is_empty());
    }
}
