//! Boolean masks over ring positions.

use serde::{Deserialize, Serialize};

use crate::error::ProfileError;

/// A ring of flags, one per profile position. Unlike [`Profile`], access
/// wraps: masks are always consumed alongside a profile of the same length,
/// so any signed index is meaningful.
///
/// [`Profile`]: crate::profile::Profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanProfile {
    flags: Vec<bool>,
}

impl BooleanProfile {
    /// A mask of `len` copies of `value`.
    pub fn uniform(value: bool, len: usize) -> Self {
        Self {
            flags: vec![value; len],
        }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Flag at any signed ring index.
    pub fn get(&self, index: isize) -> bool {
        self.flags[self.wrap(index)]
    }

    /// Set the flag at any signed ring index.
    pub fn set(&mut self, index: isize, value: bool) {
        let i = self.wrap(index);
        self.flags[i] = value;
    }

    pub fn wrap(&self, index: isize) -> usize {
        index.rem_euclid(self.flags.len() as isize) as usize
    }

    pub fn count_true(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    pub fn count_false(&self) -> usize {
        self.flags.len() - self.count_true()
    }

    /// Ring indices whose flag is set.
    pub fn true_indices(&self) -> Vec<usize> {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| f.then_some(i))
            .collect()
    }

    /// Positionwise conjunction with a mask of the same length.
    pub fn and(&self, other: &BooleanProfile) -> Result<BooleanProfile, ProfileError> {
        self.zip_op(other, |a, b| a && b)
    }

    /// Positionwise disjunction with a mask of the same length.
    pub fn or(&self, other: &BooleanProfile) -> Result<BooleanProfile, ProfileError> {
        self.zip_op(other, |a, b| a || b)
    }

    /// The complement mask.
    pub fn invert(&self) -> BooleanProfile {
        Self {
            flags: self.flags.iter().map(|f| !f).collect(),
        }
    }

    fn zip_op(
        &self,
        other: &BooleanProfile,
        op: impl Fn(bool, bool) -> bool,
    ) -> Result<BooleanProfile, ProfileError> {
        if other.len() != self.len() {
            return Err(ProfileError::LengthMismatch {
                expected: self.len(),
                got: other.len(),
            });
        }
        Ok(Self {
            flags: self
                .flags
                .iter()
                .zip(other.flags.iter())
                .map(|(&a, &b)| op(a, b))
                .collect(),
        })
    }
}
