//! Profiles carrying a full ring segmentation.
//!
//! A [`SegmentedProfile`] pairs a [`Profile`] with segments that tile its
//! ring exactly once. Segments are held in canonical order: the first is
//! the segment whose span covers ring index 0 (other than as its shared end
//! boundary), and each subsequent segment starts where the previous one
//! ends. Every transform is copy-on-write: a rejected edit returns an error
//! and the original is untouched.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SegmentUpdateError;
use crate::profile::Profile;
use crate::segment::{self, Segment, MIN_SEGMENT_LENGTH};

/// A profile whose ring is tiled by named segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentedProfile {
    profile: Profile,
    segments: Vec<Segment>,
}

impl SegmentedProfile {
    /// Pair a profile with a segment list. The segments must be supplied in
    /// ring order (any rotation) and tile the profile exactly once.
    pub fn new(profile: Profile, segments: Vec<Segment>) -> Result<Self, SegmentUpdateError> {
        segment::validate_ring(&segments, profile.len())?;
        let mut sp = Self { profile, segments };
        sp.canonicalize();
        Ok(sp)
    }

    /// A profile covered by the single whole-ring default segment.
    pub fn with_default_segment(profile: Profile) -> Result<Self, SegmentUpdateError> {
        let whole = Segment::whole_ring(profile.len())?;
        Self::new(profile, vec![whole])
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn len(&self) -> usize {
        self.profile.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    // ── Lookup ─────────────────────────────────────────────────────────────

    /// Segments in canonical ring order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segment_ids(&self) -> Vec<Uuid> {
        self.segments.iter().map(|s| s.id()).collect()
    }

    pub fn segment(&self, id: Uuid) -> Result<&Segment, SegmentUpdateError> {
        self.segments
            .iter()
            .find(|s| s.id() == id)
            .ok_or(SegmentUpdateError::NotFound { id })
    }

    /// Segment at the given position in canonical order.
    pub fn segment_at(&self, position: usize) -> Option<&Segment> {
        self.segments.get(position)
    }

    /// Display name of the segment at a canonical position.
    pub fn segment_name(&self, position: usize) -> Option<String> {
        (position < self.segments.len()).then(|| format!("Seg_{position}"))
    }

    /// Segment lookup by display name (`Seg_0`, `Seg_1`, ...).
    pub fn segment_named(&self, name: &str) -> Option<&Segment> {
        let position: usize = name.strip_prefix("Seg_")?.parse().ok()?;
        self.segment_at(position)
    }

    /// The first segment in canonical order whose span covers the index.
    pub fn segment_containing(&self, index: usize) -> Result<&Segment, SegmentUpdateError> {
        self.segments
            .iter()
            .find(|s| s.contains(index))
            .ok_or(SegmentUpdateError::OutOfBounds {
                index,
                total: self.len(),
            })
    }

    fn position_of(&self, id: Uuid) -> Result<usize, SegmentUpdateError> {
        self.segments
            .iter()
            .position(|s| s.id() == id)
            .ok_or(SegmentUpdateError::NotFound { id })
    }

    // ── Boundary editing ───────────────────────────────────────────────────

    /// Move a segment's boundaries, adjusting the two neighbours to keep
    /// the ring covered. Fails without side effects if any resulting span
    /// would fall below the minimum length or grow to claim nearly the
    /// whole ring, if an affected segment is locked, or if a boundary
    /// would cross another. Merge sources of the reshaped segments are
    /// discarded.
    pub fn update_segment(
        &self,
        id: Uuid,
        new_start: usize,
        new_end: usize,
    ) -> Result<SegmentedProfile, SegmentUpdateError> {
        let total = self.len();
        for &i in &[new_start, new_end] {
            if i >= total {
                return Err(SegmentUpdateError::OutOfBounds { index: i, total });
            }
        }
        let n = self.segments.len();
        if n == 1 {
            return Err(SegmentUpdateError::SingleSegment);
        }
        let p = self.position_of(id)?;
        let prev_p = (p + n - 1) % n;
        let next_p = (p + 1) % n;
        for &q in &[prev_p, p, next_p] {
            if self.segments[q].is_locked() {
                return Err(SegmentUpdateError::Locked {
                    id: self.segments[q].id(),
                });
            }
        }
        let ring_dist = |a: usize, b: usize| (b + total - a) % total;

        if n == 2 {
            // the lone neighbour takes up the remainder of the ring
            if new_start == new_end {
                return Err(SegmentUpdateError::WouldInvert { id });
            }
            let d_self = ring_dist(new_start, new_end);
            let d_other = total - d_self;
            if d_self + 1 < MIN_SEGMENT_LENGTH {
                return Err(SegmentUpdateError::TooShort {
                    len: d_self + 1,
                    min: MIN_SEGMENT_LENGTH,
                });
            }
            if d_other + 1 < MIN_SEGMENT_LENGTH {
                return Err(SegmentUpdateError::NeighbourTooShort {
                    id: self.segments[next_p].id(),
                    len: d_other + 1,
                    min: MIN_SEGMENT_LENGTH,
                });
            }
            let max = total - MIN_SEGMENT_LENGTH;
            if d_self > max {
                return Err(SegmentUpdateError::TooLong {
                    len: d_self + 1,
                    max: max + 1,
                });
            }
            if d_other > max {
                return Err(SegmentUpdateError::TooLong {
                    len: d_other + 1,
                    max: max + 1,
                });
            }
            let mut out = self.clone();
            out.segments[p].set_span(new_start, new_end);
            out.segments[p].clear_merge_sources();
            out.segments[next_p].set_span(new_end, new_start);
            out.segments[next_p].clear_merge_sources();
            out.canonicalize();
            return Ok(out);
        }

        let prev = &self.segments[prev_p];
        let next = &self.segments[next_p];
        let budget = prev.exclusive_len()
            + self.segments[p].exclusive_len()
            + next.exclusive_len();
        let d_prev = ring_dist(prev.start(), new_start);
        let d_self = ring_dist(new_start, new_end);
        let d_next = ring_dist(new_end, next.end());
        if d_prev + d_self + d_next != budget {
            return Err(SegmentUpdateError::WouldInvert { id });
        }
        if d_self + 1 < MIN_SEGMENT_LENGTH {
            return Err(SegmentUpdateError::TooShort {
                len: d_self + 1,
                min: MIN_SEGMENT_LENGTH,
            });
        }
        if d_prev + 1 < MIN_SEGMENT_LENGTH {
            return Err(SegmentUpdateError::NeighbourTooShort {
                id: prev.id(),
                len: d_prev + 1,
                min: MIN_SEGMENT_LENGTH,
            });
        }
        if d_next + 1 < MIN_SEGMENT_LENGTH {
            return Err(SegmentUpdateError::NeighbourTooShort {
                id: next.id(),
                len: d_next + 1,
                min: MIN_SEGMENT_LENGTH,
            });
        }
        if d_self > total - MIN_SEGMENT_LENGTH {
            return Err(SegmentUpdateError::TooLong {
                len: d_self + 1,
                max: total - MIN_SEGMENT_LENGTH + 1,
            });
        }
        tracing::debug!(%id, new_start, new_end, "updating segment boundaries");
        let mut out = self.clone();
        let prev_start = out.segments[prev_p].start();
        let next_end = out.segments[next_p].end();
        out.segments[prev_p].set_span(prev_start, new_start);
        out.segments[prev_p].clear_merge_sources();
        out.segments[p].set_span(new_start, new_end);
        out.segments[p].clear_merge_sources();
        out.segments[next_p].set_span(new_end, next_end);
        out.segments[next_p].clear_merge_sources();
        out.canonicalize();
        Ok(out)
    }

    // ── Split / merge / unmerge ────────────────────────────────────────────

    /// Whether the segment could be split at the given ring index.
    pub fn is_splittable(&self, id: Uuid, index: usize) -> bool {
        let Ok(seg) = self.segment(id) else {
            return false;
        };
        if seg.is_locked() || !seg.contains(index) {
            return false;
        }
        let Ok(steps) = seg.offset_from_start(index) else {
            return false;
        };
        steps + 1 >= MIN_SEGMENT_LENGTH && seg.len() - steps >= MIN_SEGMENT_LENGTH
    }

    /// Split a segment in two at a contained ring index. The halves take
    /// the supplied ids and share `index` as their boundary; the split is
    /// reversed by merging the halves back under the parent's id.
    pub fn split(
        &self,
        id: Uuid,
        index: usize,
        left_id: Uuid,
        right_id: Uuid,
    ) -> Result<SegmentedProfile, SegmentUpdateError> {
        let p = self.position_of(id)?;
        let seg = &self.segments[p];
        if seg.is_locked() {
            return Err(SegmentUpdateError::Locked { id });
        }
        if !seg.contains(index) {
            return Err(SegmentUpdateError::OutOfBounds {
                index,
                total: self.len(),
            });
        }
        if left_id == right_id
            || self.segments.iter().any(|s| s.id() == left_id || s.id() == right_id)
        {
            return Err(SegmentUpdateError::DuplicateId { id: left_id });
        }
        let steps = seg.offset_from_start(index)?;
        let left_len = steps + 1;
        let right_len = seg.len() - steps;
        if left_len < MIN_SEGMENT_LENGTH || right_len < MIN_SEGMENT_LENGTH {
            return Err(SegmentUpdateError::TooShort {
                len: left_len.min(right_len),
                min: MIN_SEGMENT_LENGTH,
            });
        }
        tracing::debug!(%id, index, "splitting segment");
        let left = Segment::new(left_id, seg.start(), index, self.len())?;
        let right = Segment::new(right_id, index, seg.end(), self.len())?;
        let mut segments = self.segments.clone();
        segments.splice(p..=p, [left, right]);
        SegmentedProfile::new(self.profile.clone(), segments)
    }

    /// Merge two adjacent segments into one spanning both, under a fresh
    /// id. The sources are retained on the merged segment for
    /// [`unmerge`](SegmentedProfile::unmerge).
    pub fn merge(
        &self,
        id_a: Uuid,
        id_b: Uuid,
        merged_id: Uuid,
    ) -> Result<SegmentedProfile, SegmentUpdateError> {
        let n = self.segments.len();
        if n == 2 {
            return Err(SegmentUpdateError::SpansWholeRing);
        }
        let pa = self.position_of(id_a)?;
        let pb = self.position_of(id_b)?;
        // normalize so `first` immediately precedes `second` on the ring
        let (pf, ps) = if (pa + 1) % n == pb {
            (pa, pb)
        } else if (pb + 1) % n == pa {
            (pb, pa)
        } else {
            return Err(SegmentUpdateError::NotAdjacent { a: id_a, b: id_b });
        };
        for &q in &[pf, ps] {
            if self.segments[q].is_locked() {
                return Err(SegmentUpdateError::Locked {
                    id: self.segments[q].id(),
                });
            }
        }
        if self.segments.iter().any(|s| s.id() == merged_id) {
            return Err(SegmentUpdateError::DuplicateId { id: merged_id });
        }
        let first = self.segments[pf].clone();
        let second = self.segments[ps].clone();
        tracing::debug!(a = %first.id(), b = %second.id(), "merging segments");
        let mut merged = Segment::new(merged_id, first.start(), second.end(), self.len())?;
        merged.add_merge_source(first)?;
        merged.add_merge_source(second)?;

        let mut segments: Vec<Segment> = Vec::with_capacity(n - 1);
        for (i, s) in self.segments.iter().enumerate() {
            if i == pf {
                segments.push(merged.clone());
            } else if i != ps {
                segments.push(s.clone());
            }
        }
        SegmentedProfile::new(self.profile.clone(), segments)
    }

    /// Undo a merge, restoring the segment's recorded sources in place. A
    /// segment without merge sources is returned unchanged.
    pub fn unmerge(&self, id: Uuid) -> Result<SegmentedProfile, SegmentUpdateError> {
        let p = self.position_of(id)?;
        let seg = &self.segments[p];
        if !seg.has_merge_sources() {
            return Ok(self.clone());
        }
        if seg.is_locked() {
            return Err(SegmentUpdateError::Locked { id });
        }
        tracing::debug!(%id, sources = seg.merge_sources().len(), "unmerging segment");
        let mut segments: Vec<Segment> = Vec::with_capacity(self.segments.len() + 1);
        for (i, s) in self.segments.iter().enumerate() {
            if i == p {
                segments.extend(s.merge_sources().iter().cloned());
            } else {
                segments.push(s.clone());
            }
        }
        SegmentedProfile::new(self.profile.clone(), segments)
    }

    // ── Whole-ring transforms ──────────────────────────────────────────────

    /// Resample profile and segmentation to a new ring length. Segment
    /// boundaries move proportionally, nudged apart where rounding would
    /// collapse a segment; the segment count is always preserved.
    pub fn interpolate(&self, new_len: usize) -> Result<SegmentedProfile, SegmentUpdateError> {
        let n = self.segments.len();
        if new_len < n.max(1) * (MIN_SEGMENT_LENGTH - 1) || new_len < MIN_SEGMENT_LENGTH {
            return Err(SegmentUpdateError::TooShort {
                len: new_len,
                min: n.max(1) * (MIN_SEGMENT_LENGTH - 1),
            });
        }
        let profile = self
            .profile
            .interpolate(new_len)
            .map_err(|_| SegmentUpdateError::TooShort {
                len: new_len,
                min: 1,
            })?;
        let old_len = self.len() as f64;
        // boundaries truncate rather than round to the nearest position
        let scale = |i: usize| ((i as f64 / old_len) * new_len as f64).floor() as usize % new_len;

        if n == 1 {
            let mut seg = self.segments[0].clone();
            let s = scale(seg.start());
            seg.set_span(s, s);
            seg.clear_merge_sources();
            return SegmentedProfile::new_resized(profile, vec![seg]);
        }

        let first_start = self.segments[0].start();
        // boundary offsets from the first segment's start, in ring steps
        let mut deltas: Vec<usize> = self
            .segments
            .iter()
            .map(|s| {
                let d = (s.start() + self.len() - first_start) % self.len();
                ((d as f64 / old_len) * new_len as f64).floor() as usize
            })
            .collect();
        let step = MIN_SEGMENT_LENGTH - 1;
        for i in 1..n {
            if deltas[i] < deltas[i - 1] + step {
                deltas[i] = deltas[i - 1] + step;
            }
        }
        for i in (1..n).rev() {
            let cap = new_len - (n - i) * step;
            if deltas[i] > cap {
                deltas[i] = cap;
            }
        }
        let anchor = scale(first_start);
        let starts: Vec<usize> = deltas.iter().map(|d| (anchor + d) % new_len).collect();
        let segments: Vec<Segment> = self
            .segments
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut seg = s.with_id(s.id());
                seg.set_span(starts[i], starts[(i + 1) % n]);
                seg
            })
            .collect();
        // set_span bypasses per-segment checks; the ring check below is
        // what guarantees the result
        SegmentedProfile::new_resized(profile, segments)
    }

    fn new_resized(
        profile: Profile,
        mut segments: Vec<Segment>,
    ) -> Result<SegmentedProfile, SegmentUpdateError> {
        for seg in &mut segments {
            seg.set_total(profile.len());
        }
        SegmentedProfile::new(profile, segments)
    }

    /// Rescale this profile segment-by-segment onto a template's
    /// segmentation: each segment is resampled to the length of the
    /// template segment with the same id and the pieces are rejoined.
    /// Segments are matched by id, not position, so the template may sit
    /// at any rotation; the id sets must be equal. The result is aligned
    /// with its first segment starting at ring index 0.
    pub fn franken_normalise_to(
        &self,
        template: &SegmentedProfile,
    ) -> Result<SegmentedProfile, SegmentUpdateError> {
        if self.segment_count() != template.segment_count()
            || self.segments.iter().any(|s| template.segment(s.id()).is_err())
        {
            return Err(SegmentUpdateError::PatternMismatch);
        }
        let mut pieces: Vec<Profile> = Vec::with_capacity(self.segments.len());
        for mine in &self.segments {
            let templ = template.segment(mine.id())?;
            let last = self.profile.wrap(mine.end() as isize - 1);
            let piece = self
                .profile
                .subregion(mine.start(), last)
                .and_then(|p| p.interpolate(templ.exclusive_len()))
                .map_err(|_| SegmentUpdateError::BrokenCoverage)?;
            pieces.push(piece);
        }
        let stitched = Profile::concat(&pieces).map_err(|_| SegmentUpdateError::BrokenCoverage)?;
        let total = stitched.len();
        let mut segments: Vec<Segment> = Vec::with_capacity(self.segments.len());
        let mut pos = 0;
        for mine in &self.segments {
            let templ = template.segment(mine.id())?;
            let end = (pos + templ.exclusive_len()) % total;
            let mut seg = mine.with_id(mine.id());
            seg.set_total(total);
            seg.set_span(pos, end);
            segments.push(seg);
            pos = end;
        }
        SegmentedProfile::new(stitched, segments)
    }

    /// Rotate so the value at ring index `amount` becomes index 0. The
    /// profile rotates forward and the segments move back to keep covering
    /// the same values.
    pub fn offset(&self, amount: isize) -> SegmentedProfile {
        let mut out = SegmentedProfile {
            profile: self.profile.offset(amount),
            segments: self.segments.iter().map(|s| s.offset(amount)).collect(),
        };
        out.canonicalize();
        out
    }

    /// Reverse the direction of travel round the ring.
    pub fn reversed(&self) -> SegmentedProfile {
        let mut segments: Vec<Segment> = self.segments.iter().map(|s| s.reversed()).collect();
        segments.reverse();
        let mut out = SegmentedProfile {
            profile: self.profile.reversed(),
            segments,
        };
        out.canonicalize();
        out
    }

    /// Set the lock flag on one segment.
    pub fn with_segment_lock(
        &self,
        id: Uuid,
        locked: bool,
    ) -> Result<SegmentedProfile, SegmentUpdateError> {
        let p = self.position_of(id)?;
        let mut out = self.clone();
        out.segments[p].set_locked(locked);
        Ok(out)
    }

    /// Rotate the segment list so the canonical first segment leads: the
    /// one covering ring index 0 other than as its trailing boundary.
    fn canonicalize(&mut self) {
        let n = self.segments.len();
        if n <= 1 {
            return;
        }
        if let Some(p) = self
            .segments
            .iter()
            .position(|s| s.contains(0) && s.end() != 0)
        {
            self.segments.rotate_left(p);
        }
    }
}
