//! Circular numeric profiles.
//!
//! A [`Profile`] is an immutable sequence of `f32` values on a logical ring:
//! index `len` is the same position as index 0. Profiles are produced by
//! measuring a closed outline (one value per border point) and compared by
//! sliding, interpolating and differencing them. Every transform returns a
//! new profile; the source is never modified.
//!
//! Plain `get` is strict and rejects out-of-range indices. Ring semantics
//! are explicit: callers that want wrapping go through [`Profile::wrap`].

pub mod boolean;

use serde::{Deserialize, Serialize};

use crate::error::ProfileError;
use crate::geometry::{self, Point};
use self::boolean::BooleanProfile;

/// An immutable ring of measured values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    values: Vec<f32>,
}

impl Profile {
    /// Wrap a non-empty value vector.
    pub fn new(values: Vec<f32>) -> Result<Self, ProfileError> {
        if values.is_empty() {
            return Err(ProfileError::Empty);
        }
        Ok(Self { values })
    }

    /// A profile of `len` copies of `value`.
    pub fn uniform(value: f32, len: usize) -> Result<Self, ProfileError> {
        if len == 0 {
            return Err(ProfileError::ZeroLength);
        }
        Ok(Self {
            values: vec![value; len],
        })
    }

    /// Measure the angle profile of a closed border: for each border point,
    /// the interior angle between the points `window` positions behind and
    /// ahead of it, in degrees. Reflex angles (chord midpoint outside the
    /// border) are reported as `360 − angle`.
    pub fn angles_from_border(border: &[Point], window: usize) -> Result<Self, ProfileError> {
        let n = border.len();
        let needed = 2 * window + 1;
        if n < needed {
            return Err(ProfileError::TooFewPoints { needed, got: n });
        }
        let wrap = |i: isize| -> usize { i.rem_euclid(n as isize) as usize };
        let values = (0..n)
            .map(|i| {
                let a = &border[wrap(i as isize - window as isize)];
                let v = &border[i];
                let b = &border[wrap(i as isize + window as isize)];
                let angle = geometry::angle_between(a, v, b);
                if geometry::angle_is_reflex(a, v, b, border) {
                    (360.0 - angle) as f32
                } else {
                    angle as f32
                }
            })
            .collect();
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        false // construction guarantees at least one value
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().copied()
    }

    // ── Indexing ───────────────────────────────────────────────────────────

    /// Strict access: `index` must lie in `0..len`.
    pub fn get(&self, index: usize) -> Result<f32, ProfileError> {
        self.values
            .get(index)
            .copied()
            .ok_or(ProfileError::IndexOutOfBounds {
                index,
                len: self.len(),
            })
    }

    /// Value at the given fraction of the way round, in `[0, 1]`.
    /// `floor(fraction · len)`, clamped so that exactly 1.0 reads the last
    /// position rather than wrapping to the first.
    pub fn get_fraction(&self, fraction: f64) -> Result<f32, ProfileError> {
        Ok(self.values[self.index_of_fraction(fraction)?])
    }

    /// Ring index for a fraction in `[0, 1]`.
    pub fn index_of_fraction(&self, fraction: f64) -> Result<usize, ProfileError> {
        if !(0.0..=1.0).contains(&fraction) || fraction.is_nan() {
            return Err(ProfileError::FractionOutOfRange { fraction });
        }
        let idx = (fraction * self.len() as f64).floor() as usize;
        Ok(idx.min(self.len() - 1))
    }

    /// Fraction of the way round for a ring index.
    pub fn fraction_of_index(&self, index: usize) -> Result<f64, ProfileError> {
        if index >= self.len() {
            return Err(ProfileError::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        Ok(index as f64 / self.len() as f64)
    }

    /// Map any signed index onto the ring.
    pub fn wrap(&self, index: isize) -> usize {
        index.rem_euclid(self.len() as isize) as usize
    }

    fn value_wrapped(&self, index: isize) -> f32 {
        self.values[self.wrap(index)]
    }

    // ── Extremes ───────────────────────────────────────────────────────────

    pub fn min(&self) -> f32 {
        self.values.iter().copied().fold(f32::INFINITY, f32::min)
    }

    pub fn max(&self) -> f32 {
        self.values
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Index of the smallest value; the first such index on ties.
    pub fn index_of_min(&self) -> usize {
        let mut best = 0;
        for (i, &v) in self.values.iter().enumerate() {
            if v < self.values[best] {
                best = i;
            }
        }
        best
    }

    /// Index of the largest value; the first such index on ties.
    pub fn index_of_max(&self) -> usize {
        let mut best = 0;
        for (i, &v) in self.values.iter().enumerate() {
            if v > self.values[best] {
                best = i;
            }
        }
        best
    }

    /// Index of the smallest value among positions the mask marks true.
    pub fn index_of_min_where(
        &self,
        mask: &BooleanProfile,
    ) -> Result<Option<usize>, ProfileError> {
        if mask.len() != self.len() {
            return Err(ProfileError::LengthMismatch {
                expected: self.len(),
                got: mask.len(),
            });
        }
        let mut best: Option<usize> = None;
        for (i, &v) in self.values.iter().enumerate() {
            if mask.get(i as isize) && best.map_or(true, |b| v < self.values[b]) {
                best = Some(i);
            }
        }
        Ok(best)
    }

    /// Index of the largest value among positions the mask marks true.
    pub fn index_of_max_where(
        &self,
        mask: &BooleanProfile,
    ) -> Result<Option<usize>, ProfileError> {
        if mask.len() != self.len() {
            return Err(ProfileError::LengthMismatch {
                expected: self.len(),
                got: mask.len(),
            });
        }
        let mut best: Option<usize> = None;
        for (i, &v) in self.values.iter().enumerate() {
            if mask.get(i as isize) && best.map_or(true, |b| v > self.values[b]) {
                best = Some(i);
            }
        }
        Ok(best)
    }

    // ── Ring transforms ────────────────────────────────────────────────────

    /// Rotate the ring so that the value at `amount` becomes index 0:
    /// `offset(1)` turns `[1, 2, 3, 4]` into `[2, 3, 4, 1]`.
    pub fn offset(&self, amount: isize) -> Profile {
        let values = (0..self.len() as isize)
            .map(|i| self.value_wrapped(i + amount))
            .collect();
        Self { values }
    }

    /// Reverse the direction of travel around the ring.
    pub fn reversed(&self) -> Profile {
        let mut values = self.values.clone();
        values.reverse();
        Self { values }
    }

    /// Resample to `new_len` positions by piecewise-linear interpolation
    /// around the ring. Resampling to the current length is the identity.
    pub fn interpolate(&self, new_len: usize) -> Result<Profile, ProfileError> {
        if new_len == 0 {
            return Err(ProfileError::ZeroLength);
        }
        if new_len == self.len() {
            return Ok(self.clone());
        }
        let old_len = self.len() as f64;
        let values = (0..new_len)
            .map(|i| {
                let pos = i as f64 * old_len / new_len as f64;
                let lo = pos.floor();
                let t = (pos - lo) as f32;
                let a = self.value_wrapped(lo as isize);
                let b = self.value_wrapped(lo as isize + 1);
                a * (1.0 - t) + b * t
            })
            .collect();
        Ok(Self { values })
    }

    /// Moving-average smooth over a window of `2·window + 1` positions.
    pub fn smooth(&self, window: usize) -> Profile {
        let span = (2 * window + 1) as f32;
        let values = (0..self.len() as isize)
            .map(|i| {
                let sum: f32 = (-(window as isize)..=window as isize)
                    .map(|k| self.value_wrapped(i + k))
                    .sum();
                sum / span
            })
            .collect();
        Self { values }
    }

    /// Inclusive subregion from `start` to `end`, wrapping through index 0
    /// when `end < start`.
    pub fn subregion(&self, start: usize, end: usize) -> Result<Profile, ProfileError> {
        let len = self.len();
        for &i in &[start, end] {
            if i >= len {
                return Err(ProfileError::IndexOutOfBounds { index: i, len });
            }
        }
        let count = if end >= start {
            end - start + 1
        } else {
            len - start + end + 1
        };
        let values = (0..count)
            .map(|k| self.value_wrapped((start + k) as isize))
            .collect();
        Ok(Self { values })
    }

    /// Subregion of `2·size + 1` positions centred on `index`.
    pub fn window(&self, index: usize, size: usize) -> Result<Profile, ProfileError> {
        if index >= self.len() {
            return Err(ProfileError::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        let start = self.wrap(index as isize - size as isize);
        let end = self.wrap(index as isize + size as isize);
        self.subregion(start, end)
    }

    /// Join profiles end to end into one ring.
    pub fn concat(profiles: &[Profile]) -> Result<Profile, ProfileError> {
        if profiles.is_empty() {
            return Err(ProfileError::Empty);
        }
        let values = profiles
            .iter()
            .flat_map(|p| p.values.iter().copied())
            .collect();
        Ok(Self { values })
    }

    // ── Feature detection ──────────────────────────────────────────────────

    /// Positions that are strict local minima: the profile must fall
    /// strictly at every step approaching the position and rise strictly at
    /// every step leaving it, out to `window` positions on each side.
    pub fn local_minima(&self, window: usize) -> BooleanProfile {
        self.local_extrema(window, |near, far| far > near)
    }

    /// Strict local minima whose value is also below `limit`.
    pub fn local_minima_below(&self, window: usize, limit: f32) -> BooleanProfile {
        let mut mask = self.local_minima(window);
        for (i, &v) in self.values.iter().enumerate() {
            if v >= limit {
                mask.set(i as isize, false);
            }
        }
        mask
    }

    /// Positions that are strict local maxima, mirror of [`local_minima`].
    ///
    /// [`local_minima`]: Profile::local_minima
    pub fn local_maxima(&self, window: usize) -> BooleanProfile {
        self.local_extrema(window, |near, far| far < near)
    }

    /// Strict local maxima whose value is also above `limit`.
    pub fn local_maxima_above(&self, window: usize, limit: f32) -> BooleanProfile {
        let mut mask = self.local_maxima(window);
        for (i, &v) in self.values.iter().enumerate() {
            if v <= limit {
                mask.set(i as isize, false);
            }
        }
        mask
    }

    /// Strict local minima in the lowest `fraction` of the amplitude range.
    pub fn local_minima_below_fraction(&self, window: usize, fraction: f32) -> BooleanProfile {
        self.local_minima_below(window, self.min() + fraction * (self.max() - self.min()))
    }

    /// Strict local maxima in the highest `fraction` of the amplitude range.
    pub fn local_maxima_above_fraction(&self, window: usize, fraction: f32) -> BooleanProfile {
        self.local_maxima_above(window, self.max() - fraction * (self.max() - self.min()))
    }

    fn local_extrema(&self, window: usize, outward: impl Fn(f32, f32) -> bool) -> BooleanProfile {
        let mut mask = BooleanProfile::uniform(false, self.len());
        if window == 0 || self.len() < 2 * window + 1 {
            return mask;
        }
        'pos: for i in 0..self.len() as isize {
            for k in 1..=window as isize {
                let strictly_before = outward(self.value_wrapped(i - k + 1), self.value_wrapped(i - k));
                let strictly_after = outward(self.value_wrapped(i + k - 1), self.value_wrapped(i + k));
                if !strictly_before || !strictly_after {
                    continue 'pos;
                }
            }
            mask.set(i, true);
        }
        mask
    }

    /// Difference across a symmetric window: `value(i+window) − value(i−window)`.
    pub fn calculate_deltas(&self, window: usize) -> Profile {
        let w = window as isize;
        let values = (0..self.len() as isize)
            .map(|i| self.value_wrapped(i + w) - self.value_wrapped(i - w))
            .collect();
        Self { values }
    }

    /// Central-difference first derivative around the ring.
    pub fn derivative(&self) -> Profile {
        let values = (0..self.len() as isize)
            .map(|i| (self.value_wrapped(i + 1) - self.value_wrapped(i - 1)) / 2.0)
            .collect();
        Self { values }
    }

    // ── Comparison ─────────────────────────────────────────────────────────

    /// Sum of squared differences against another profile. When lengths
    /// differ, the shorter profile is interpolated up to the longer length
    /// first, so neither side loses detail.
    pub fn absolute_square_difference(&self, template: &Profile) -> Result<f64, ProfileError> {
        if self.len() < template.len() {
            return self
                .interpolate(template.len())?
                .absolute_square_difference(template);
        }
        let template = template.interpolate(self.len())?;
        Ok(self
            .values
            .iter()
            .zip(template.values.iter())
            .map(|(&a, &b)| {
                let d = (a - b) as f64;
                d * d
            })
            .sum())
    }

    /// Sum of squared differences with both profiles interpolated to a
    /// common length first.
    pub fn absolute_square_difference_at(
        &self,
        template: &Profile,
        length: usize,
    ) -> Result<f64, ProfileError> {
        self.interpolate(length)?
            .absolute_square_difference(&template.interpolate(length)?)
    }

    /// The rotation of this profile best matching the template: the offset
    /// minimising the squared difference, with the smallest offset winning
    /// ties. Exhaustive over all ring positions.
    pub fn best_fit_offset(&self, template: &Profile) -> Result<usize, ProfileError> {
        let mut best_offset = 0;
        let mut best_score = f64::INFINITY;
        for j in 0..self.len() {
            let score = self.offset(j as isize).absolute_square_difference(template)?;
            if score < best_score {
                best_score = score;
                best_offset = j;
            }
        }
        Ok(best_offset)
    }

    // ── Arithmetic ─────────────────────────────────────────────────────────

    /// Add a finite constant to every value.
    pub fn add(&self, value: f32) -> Result<Profile, ProfileError> {
        self.scalar_op(value, |a, b| a + b)
    }

    /// Subtract a finite constant from every value.
    pub fn subtract(&self, value: f32) -> Result<Profile, ProfileError> {
        self.scalar_op(value, |a, b| a - b)
    }

    /// Multiply every value by a finite constant.
    pub fn multiply(&self, value: f32) -> Result<Profile, ProfileError> {
        self.scalar_op(value, |a, b| a * b)
    }

    /// Divide every value by a finite, non-zero constant.
    pub fn divide(&self, value: f32) -> Result<Profile, ProfileError> {
        if value == 0.0 {
            return Err(ProfileError::NonFinite);
        }
        self.scalar_op(value, |a, b| a / b)
    }

    fn scalar_op(&self, value: f32, op: impl Fn(f32, f32) -> f32) -> Result<Profile, ProfileError> {
        if !value.is_finite() {
            return Err(ProfileError::NonFinite);
        }
        Ok(Self {
            values: self.values.iter().map(|&v| op(v, value)).collect(),
        })
    }

    /// Elementwise sum with a profile of the same length.
    pub fn add_profile(&self, other: &Profile) -> Result<Profile, ProfileError> {
        self.elementwise_op(other, |a, b| a + b, false)
    }

    /// Elementwise difference with a profile of the same length.
    pub fn subtract_profile(&self, other: &Profile) -> Result<Profile, ProfileError> {
        self.elementwise_op(other, |a, b| a - b, false)
    }

    /// Elementwise product with a profile of the same length.
    pub fn multiply_profile(&self, other: &Profile) -> Result<Profile, ProfileError> {
        self.elementwise_op(other, |a, b| a * b, false)
    }

    /// Elementwise quotient with a profile of the same length. Every divisor
    /// must be finite and non-zero.
    pub fn divide_profile(&self, other: &Profile) -> Result<Profile, ProfileError> {
        self.elementwise_op(other, |a, b| a / b, true)
    }

    fn elementwise_op(
        &self,
        other: &Profile,
        op: impl Fn(f32, f32) -> f32,
        reject_zero: bool,
    ) -> Result<Profile, ProfileError> {
        if other.len() != self.len() {
            return Err(ProfileError::LengthMismatch {
                expected: self.len(),
                got: other.len(),
            });
        }
        if other
            .values
            .iter()
            .any(|v| !v.is_finite() || (reject_zero && *v == 0.0))
        {
            return Err(ProfileError::NonFinite);
        }
        Ok(Self {
            values: self
                .values
                .iter()
                .zip(other.values.iter())
                .map(|(&a, &b)| op(a, b))
                .collect(),
        })
    }

    /// Running sum from index 0.
    pub fn cumulative_sum(&self) -> Profile {
        let mut sum = 0.0;
        let values = self
            .values
            .iter()
            .map(|&v| {
                sum += v;
                sum
            })
            .collect();
        Self { values }
    }

    /// Raise every value to the given power.
    pub fn to_power(&self, power: f32) -> Profile {
        Self {
            values: self.values.iter().map(|v| v.powf(power)).collect(),
        }
    }

    /// Absolute value of every position.
    pub fn absolute(&self) -> Profile {
        Self {
            values: self.values.iter().map(|v| v.abs()).collect(),
        }
    }

    /// Rescale values linearly onto `[new_min, new_max]`. A flat profile
    /// maps to `new_min` everywhere.
    pub fn normalise_amplitude(&self, new_min: f32, new_max: f32) -> Result<Profile, ProfileError> {
        if !new_min.is_finite() || !new_max.is_finite() {
            return Err(ProfileError::NonFinite);
        }
        let min = self.min();
        let range = self.max() - min;
        if range == 0.0 {
            return Profile::uniform(new_min, self.len());
        }
        let scale = (new_max - new_min) / range;
        Ok(Self {
            values: self
                .values
                .iter()
                .map(|&v| new_min + (v - min) * scale)
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn profile(values: &[f32]) -> Profile {
        Profile::new(values.to_vec()).unwrap()
    }

    #[test]
    fn empty_profile_is_rejected() {
        assert_eq!(Profile::new(vec![]), Err(ProfileError::Empty));
    }

    #[test]
    fn strict_get_rejects_out_of_range() {
        let p = profile(&[1.0, 2.0, 3.0]);
        assert_eq!(p.get(2), Ok(3.0));
        assert_eq!(
            p.get(3),
            Err(ProfileError::IndexOutOfBounds { index: 3, len: 3 })
        );
    }

    #[test]
    fn fraction_get_floors_and_clamps() {
        let p = profile(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(p.get_fraction(0.0), Ok(1.0));
        assert_eq!(p.get_fraction(0.5), Ok(3.0));
        // exactly 1.0 reads the final position, not index 0
        assert_eq!(p.get_fraction(1.0), Ok(4.0));
        assert!(p.get_fraction(1.1).is_err());
        assert!(p.get_fraction(-0.1).is_err());
    }

    #[test]
    fn offset_rotates_forward() {
        let p = profile(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(p.offset(1), profile(&[2.0, 3.0, 4.0, 1.0]));
        assert_eq!(p.offset(-1), profile(&[4.0, 1.0, 2.0, 3.0]));
    }

    #[test]
    fn offset_round_trips() {
        let p = profile(&[5.0, 1.0, 8.0, 2.0, 9.0]);
        for k in -7isize..=7 {
            assert_eq!(p.offset(k).offset(-k), p);
        }
        assert_eq!(p.offset(p.len() as isize), p);
    }

    #[test]
    fn interpolate_same_length_is_identity() {
        let p = profile(&[1.0, 5.0, 2.0, 8.0]);
        assert_eq!(p.interpolate(4).unwrap(), p);
    }

    #[test]
    fn interpolate_doubling_keeps_anchors() {
        let p = profile(&[0.0, 2.0, 4.0, 6.0]);
        let q = p.interpolate(8).unwrap();
        assert_eq!(q.len(), 8);
        for i in 0..4 {
            assert_relative_eq!(q.get(2 * i).unwrap(), p.get(i).unwrap());
        }
        // midpoints fall between the anchors
        assert_relative_eq!(q.get(1).unwrap(), 1.0);
        assert_relative_eq!(q.get(7).unwrap(), 3.0); // wraps 6.0 → 0.0
    }

    #[test]
    fn smooth_preserves_uniform_profiles() {
        let p = Profile::uniform(3.5, 10).unwrap();
        assert_eq!(p.smooth(2), p);
    }

    #[test]
    fn smooth_averages_over_window() {
        let p = profile(&[0.0, 0.0, 3.0, 0.0, 0.0, 0.0]);
        let s = p.smooth(1);
        assert_relative_eq!(s.get(2).unwrap(), 1.0);
        assert_relative_eq!(s.get(1).unwrap(), 1.0);
        assert_relative_eq!(s.get(4).unwrap(), 0.0);
    }

    #[test]
    fn subregion_wraps_through_zero() {
        let p = profile(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(p.subregion(1, 3).unwrap(), profile(&[2.0, 3.0, 4.0]));
        assert_eq!(p.subregion(3, 1).unwrap(), profile(&[4.0, 5.0, 1.0, 2.0]));
        assert_eq!(p.subregion(2, 2).unwrap(), profile(&[3.0]));
        assert!(p.subregion(0, 5).is_err());
    }

    #[test]
    fn local_minima_finds_strict_dips() {
        let p = profile(&[5.0, 3.0, 1.0, 3.0, 5.0, 6.0, 5.5, 6.5]);
        let mask = p.local_minima(2);
        assert!(mask.get(2));
        assert_eq!(mask.count_true(), 1);
    }

    #[test]
    fn plateaus_are_not_extrema() {
        let p = profile(&[5.0, 3.0, 1.0, 1.0, 3.0, 5.0, 5.0, 5.0]);
        assert_eq!(p.local_minima(1).count_true(), 0);
    }

    #[test]
    fn extrema_mirror_under_reversal() {
        let mut rng = StdRng::seed_from_u64(7);
        let p = profile(&(0..40).map(|_| rng.gen_range(0.0..10.0)).collect::<Vec<_>>());
        let mask = p.local_minima(2);
        let rev_mask = p.reversed().local_minima(2);
        for i in 0..p.len() {
            assert_eq!(
                mask.get(i as isize),
                rev_mask.get((p.len() - 1 - i) as isize)
            );
        }
    }

    #[test]
    fn minima_below_limit_filters_by_value() {
        let p = profile(&[5.0, 3.0, 1.0, 3.0, 5.0, 6.0, 4.0, 6.0]);
        assert_eq!(p.local_minima(1).count_true(), 2);
        let mask = p.local_minima_below(1, 2.0);
        assert!(mask.get(2));
        assert_eq!(mask.count_true(), 1);
    }

    #[test]
    fn best_fit_offset_recovers_rotation() {
        let mut rng = StdRng::seed_from_u64(42);
        let p = profile(&(0..60).map(|_| rng.gen_range(0.0..180.0)).collect::<Vec<_>>());
        for k in [0usize, 1, 13, 59] {
            let rotated = p.offset(k as isize);
            let found = rotated.best_fit_offset(&p).unwrap();
            assert_eq!(found, (p.len() - k) % p.len());
        }
    }

    #[test]
    fn square_difference_is_zero_for_identical() {
        let p = profile(&[1.0, 2.0, 3.0]);
        assert_relative_eq!(p.absolute_square_difference(&p).unwrap(), 0.0);
        assert_relative_eq!(
            p.absolute_square_difference(&profile(&[1.0, 2.0, 4.0])).unwrap(),
            1.0
        );
    }

    #[test]
    fn square_difference_upsamples_the_shorter_profile() {
        let short = Profile::uniform(1.0, 4).unwrap();
        let spiked = profile(&[1.0, 1.0, 1.0, 1.0, 101.0, 1.0, 1.0, 1.0]);
        // the spike survives comparison at the longer length
        assert_relative_eq!(short.absolute_square_difference(&spiked).unwrap(), 10000.0);
        assert_relative_eq!(spiked.absolute_square_difference(&short).unwrap(), 10000.0);
    }

    #[test]
    fn arithmetic_rejects_non_finite() {
        let p = profile(&[1.0, 2.0]);
        assert_eq!(p.add(f32::NAN), Err(ProfileError::NonFinite));
        assert_eq!(p.multiply(f32::INFINITY), Err(ProfileError::NonFinite));
        assert_eq!(p.divide(0.0), Err(ProfileError::NonFinite));
        let bad = profile(&[1.0, f32::NAN]);
        assert_eq!(p.add_profile(&bad), Err(ProfileError::NonFinite));
        assert_eq!(
            p.divide_profile(&profile(&[1.0, 0.0])),
            Err(ProfileError::NonFinite)
        );
    }

    #[test]
    fn elementwise_requires_equal_lengths() {
        let p = profile(&[1.0, 2.0]);
        let q = profile(&[1.0, 2.0, 3.0]);
        assert_eq!(
            p.add_profile(&q),
            Err(ProfileError::LengthMismatch { expected: 2, got: 3 })
        );
    }

    #[test]
    fn cumulative_sum_and_power() {
        let p = profile(&[1.0, 2.0, 3.0]);
        assert_eq!(p.cumulative_sum(), profile(&[1.0, 3.0, 6.0]));
        assert_eq!(p.to_power(2.0), profile(&[1.0, 4.0, 9.0]));
        assert_eq!(profile(&[-1.0, 2.0]).absolute(), profile(&[1.0, 2.0]));
    }

    #[test]
    fn normalise_amplitude_rescales_onto_target_range() {
        let p = profile(&[2.0, 4.0, 6.0]).normalise_amplitude(0.0, 1.0).unwrap();
        assert_eq!(p, profile(&[0.0, 0.5, 1.0]));
        let shifted = profile(&[2.0, 4.0, 6.0]).normalise_amplitude(10.0, 30.0).unwrap();
        assert_eq!(shifted, profile(&[10.0, 20.0, 30.0]));
        let flat = Profile::uniform(7.0, 3)
            .unwrap()
            .normalise_amplitude(5.0, 9.0)
            .unwrap();
        assert_eq!(flat, profile(&[5.0, 5.0, 5.0]));
        assert_eq!(
            profile(&[1.0, 2.0]).normalise_amplitude(f32::NAN, 1.0),
            Err(ProfileError::NonFinite)
        );
    }

    #[test]
    fn masked_min_respects_mask() {
        let p = profile(&[5.0, 1.0, 4.0, 2.0]);
        let mut mask = BooleanProfile::uniform(false, 4);
        mask.set(2, true);
        mask.set(3, true);
        assert_eq!(p.index_of_min_where(&mask).unwrap(), Some(3));
        let none = BooleanProfile::uniform(false, 4);
        assert_eq!(p.index_of_min_where(&none).unwrap(), None);
    }

    #[test]
    fn deltas_and_derivative() {
        let p = profile(&[0.0, 1.0, 2.0, 3.0]);
        let d = p.calculate_deltas(1);
        // index 1: value(2) − value(0) = 2
        assert_relative_eq!(d.get(1).unwrap(), 2.0);
        let dv = p.derivative();
        assert_relative_eq!(dv.get(1).unwrap(), 1.0);
    }

    #[test]
    fn square_border_angle_profile_is_mostly_straight() {
        // 20 points round a square: corners measure ~90°, edges ~180°
        let mut border = Vec::new();
        for i in 0..5 {
            border.push(Point::new(i as f64, 0.0));
        }
        for i in 0..5 {
            border.push(Point::new(5.0, i as f64));
        }
        for i in 0..5 {
            border.push(Point::new(5.0 - i as f64, 5.0));
        }
        for i in 0..5 {
            border.push(Point::new(0.0, 5.0 - i as f64));
        }
        let p = Profile::angles_from_border(&border, 1).unwrap();
        assert_eq!(p.len(), 20);
        assert_relative_eq!(p.get(0).unwrap(), 90.0, epsilon = 1e-4);
        assert_relative_eq!(p.get(2).unwrap(), 180.0, epsilon = 1e-4);
    }

    #[test]
    fn concat_joins_in_order() {
        let joined =
            Profile::concat(&[profile(&[1.0, 2.0]), profile(&[3.0]), profile(&[4.0, 5.0])])
                .unwrap();
        assert_eq!(joined, profile(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        assert_eq!(Profile::concat(&[]), Err(ProfileError::Empty));
    }

    #[test]
    fn window_centres_on_index() {
        let p = profile(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(p.window(0, 1).unwrap(), profile(&[4.0, 0.0, 1.0]));
        assert_eq!(p.window(2, 1).unwrap(), profile(&[1.0, 2.0, 3.0]));
    }
}
