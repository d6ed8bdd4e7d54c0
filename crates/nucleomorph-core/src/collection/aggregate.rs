//! Position-wise aggregation of profiles across a population.

use crate::collection::Quartile;
use crate::error::ProfileError;
use crate::profile::Profile;

/// Accumulates profiles at a fixed ring length and answers per-position
/// quantile queries. Contributed profiles are resampled to the target
/// length, so members of different sizes aggregate position by position.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileAggregate {
    len: usize,
    columns: Vec<Vec<f32>>,
}

impl ProfileAggregate {
    pub fn new(len: usize) -> Result<Self, ProfileError> {
        if len == 0 {
            return Err(ProfileError::ZeroLength);
        }
        Ok(Self {
            len,
            columns: vec![Vec::new(); len],
        })
    }

    /// Target ring length.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.columns[0].is_empty()
    }

    /// Number of profiles contributed so far.
    pub fn count(&self) -> usize {
        self.columns[0].len()
    }

    /// Resample a profile to the target length and add one value to every
    /// position column.
    pub fn add(&mut self, profile: &Profile) -> Result<(), ProfileError> {
        let resampled = profile.interpolate(self.len)?;
        for (column, value) in self.columns.iter_mut().zip(resampled.iter()) {
            column.push(value);
        }
        Ok(())
    }

    /// The values contributed at one ring position.
    pub fn values_at(&self, position: usize) -> Option<&[f32]> {
        self.columns.get(position).map(Vec::as_slice)
    }

    /// The per-position quantile profile for a quartile.
    pub fn quartile(&self, quartile: Quartile) -> Result<Profile, ProfileError> {
        if self.count() == 0 {
            return Err(ProfileError::Empty);
        }
        let q = quartile.fraction();
        let values = self
            .columns
            .iter()
            .map(|column| {
                let mut sorted = column.clone();
                sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                quantile(&sorted, q)
            })
            .collect();
        Profile::new(values)
    }
}

/// Linear-interpolated quantile of an ascending slice.
fn quantile(sorted: &[f32], q: f64) -> f32 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = q * (n - 1) as f64;
    let lo = h.floor() as usize;
    let frac = (h - lo as f64) as f32;
    if lo + 1 >= n {
        return sorted[n - 1];
    }
    sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
}
