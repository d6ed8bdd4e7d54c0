//! Named spans over a circular profile.
//!
//! A [`Segment`] is an inclusive span `[start, end]` of ring indices over a
//! profile of known length. Spans wrap: `end <= start` means the segment
//! runs through index 0, and because boundary indices are shared with the
//! neighbouring segments, a full ring of `n` segments has inclusive lengths
//! summing to `profile length + n`.
//!
//! Segments carry no links to their neighbours; ordering and adjacency are
//! derived from the segment list that owns them (see
//! [`crate::segmented::SegmentedProfile`]). A segment produced by merging
//! keeps its source segments so the merge can be undone later.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SegmentUpdateError;

/// Id of the reserved segment spanning an entire unsegmented profile.
pub const DEFAULT_SEGMENT_ID: Uuid = Uuid::from_u128(0x11111111_2222_3333_4444_555566667777);

/// Smallest permitted inclusive segment length. Anything shorter cannot
/// survive interpolation to another profile length.
pub const MIN_SEGMENT_LENGTH: usize = 2;

/// An inclusive, wrap-capable span of ring indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    id: Uuid,
    start: usize,
    end: usize,
    total: usize,
    locked: bool,
    merge_sources: Vec<Segment>,
}

impl Segment {
    /// A segment from `start` to `end` (inclusive) on a ring of `total`
    /// positions. `end <= start` wraps through index 0; `start == end` is
    /// reserved for the whole-ring default segment. Any other span must be
    /// at least the minimum length and leave at least the minimum length
    /// free on the rest of the ring.
    pub fn new(id: Uuid, start: usize, end: usize, total: usize) -> Result<Self, SegmentUpdateError> {
        for &i in &[start, end] {
            if i >= total {
                return Err(SegmentUpdateError::OutOfBounds { index: i, total });
            }
        }
        let seg = Self {
            id,
            start,
            end,
            total,
            locked: false,
            merge_sources: Vec::new(),
        };
        if start != end && seg.len() < MIN_SEGMENT_LENGTH {
            return Err(SegmentUpdateError::TooShort {
                len: seg.len(),
                min: MIN_SEGMENT_LENGTH,
            });
        }
        // a non-default span must leave room for at least one more segment
        if start != end && seg.exclusive_len() > total - MIN_SEGMENT_LENGTH {
            return Err(SegmentUpdateError::TooLong {
                len: seg.len(),
                max: total - MIN_SEGMENT_LENGTH + 1,
            });
        }
        Ok(seg)
    }

    /// The whole-ring segment assigned to a freshly segmented profile.
    pub fn whole_ring(total: usize) -> Result<Self, SegmentUpdateError> {
        Self::new(DEFAULT_SEGMENT_ID, 0, 0, total)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Length of the underlying profile.
    pub fn profile_len(&self) -> usize {
        self.total
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// The same span under a different id, without merge sources.
    pub fn with_id(&self, id: Uuid) -> Segment {
        Segment {
            id,
            start: self.start,
            end: self.end,
            total: self.total,
            locked: self.locked,
            merge_sources: Vec::new(),
        }
    }

    // ── Span arithmetic ────────────────────────────────────────────────────

    /// Whether the span passes through index 0. The whole-ring segment
    /// (`start == end`) always wraps.
    pub fn wraps(&self) -> bool {
        self.end <= self.start
    }

    /// Inclusive length: both boundary indices count, so adjacent segments
    /// share one index.
    pub fn len(&self) -> usize {
        if self.wraps() {
            self.end + self.total + 1 - self.start
        } else {
            self.end - self.start + 1
        }
    }

    /// Exclusive length: the positions owned by this segment alone, i.e.
    /// everything up to but not including `end`.
    pub fn exclusive_len(&self) -> usize {
        self.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        false // a span always holds at least its two endpoints
    }

    /// Whether the inclusive span covers the given ring index.
    pub fn contains(&self, index: usize) -> bool {
        if index >= self.total {
            return false;
        }
        if self.wraps() {
            index >= self.start || index <= self.end
        } else {
            index >= self.start && index <= self.end
        }
    }

    /// The ring indices of the span in order, from `start` to `end`.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        let total = self.total;
        let start = self.start;
        (0..self.len()).map(move |k| (start + k) % total)
    }

    /// Steps from `start` forward to the given contained index.
    pub fn offset_from_start(&self, index: usize) -> Result<usize, SegmentUpdateError> {
        if !self.contains(index) {
            return Err(SegmentUpdateError::OutOfBounds {
                index,
                total: self.total,
            });
        }
        Ok(if index >= self.start {
            index - self.start
        } else {
            self.total - self.start + index
        })
    }

    /// Shortest ring distance from the given index to `start`, in either
    /// direction.
    pub fn shortest_distance_to_start(&self, index: usize) -> usize {
        let fwd = (index + self.total - self.start) % self.total;
        fwd.min(self.total - fwd)
    }

    /// Shortest ring distance from the given index to `end`.
    pub fn shortest_distance_to_end(&self, index: usize) -> usize {
        let fwd = (index + self.total - self.end) % self.total;
        fwd.min(self.total - fwd)
    }

    /// The contained index at the given proportion of the span, with 0.0 at
    /// `start` and 1.0 at `end`.
    pub fn proportional_index(&self, proportion: f64) -> Result<usize, SegmentUpdateError> {
        if !(0.0..=1.0).contains(&proportion) || proportion.is_nan() {
            return Err(SegmentUpdateError::InvalidProportion { proportion });
        }
        let steps = (proportion * self.exclusive_len() as f64).round() as usize;
        Ok((self.start + steps) % self.total)
    }

    /// The proportion of the span at which a contained index sits.
    pub fn index_proportion(&self, index: usize) -> Result<f64, SegmentUpdateError> {
        let steps = self.offset_from_start(index)?;
        Ok(steps as f64 / self.exclusive_len() as f64)
    }

    /// The index halfway along the span.
    pub fn midpoint_index(&self) -> usize {
        (self.start + self.exclusive_len() / 2) % self.total
    }

    /// Whether the two spans share any ring index.
    pub fn overlaps(&self, other: &Segment) -> bool {
        self.indices().any(|i| other.contains(i))
    }

    /// Whether the two spans share anything more than a single adjacent
    /// boundary index.
    pub fn overlaps_beyond_endpoints(&self, other: &Segment) -> bool {
        self.indices().any(|i| {
            other.contains(i)
                && !(i == self.start && i == other.end)
                && !(i == self.end && i == other.start)
        })
    }

    // ── Transforms ─────────────────────────────────────────────────────────

    /// Move the span `amount` positions backward round the ring (matching a
    /// profile rotated forward by `amount`). Merge sources move with it.
    pub fn offset(&self, amount: isize) -> Segment {
        let total = self.total as isize;
        let wrap = |i: usize| -> usize { (i as isize - amount).rem_euclid(total) as usize };
        Segment {
            id: self.id,
            start: wrap(self.start),
            end: wrap(self.end),
            total: self.total,
            locked: self.locked,
            merge_sources: self.merge_sources.iter().map(|s| s.offset(amount)).collect(),
        }
    }

    /// The same span under a reversed direction of travel round the ring.
    pub fn reversed(&self) -> Segment {
        Segment {
            id: self.id,
            start: self.total - 1 - self.end,
            end: self.total - 1 - self.start,
            total: self.total,
            locked: self.locked,
            merge_sources: self.merge_sources.iter().map(|s| s.reversed()).collect(),
        }
    }

    // ── Merge sources ──────────────────────────────────────────────────────

    pub fn merge_sources(&self) -> &[Segment] {
        &self.merge_sources
    }

    pub fn has_merge_sources(&self) -> bool {
        !self.merge_sources.is_empty()
    }

    pub fn merge_source(&self, id: Uuid) -> Option<&Segment> {
        self.merge_sources.iter().find(|s| s.id == id)
    }

    /// Record a source span this segment was merged from. The source must
    /// lie inside this span, on the same ring, under a distinct id.
    pub fn add_merge_source(&mut self, source: Segment) -> Result<(), SegmentUpdateError> {
        if source.total != self.total {
            return Err(SegmentUpdateError::LengthMismatch {
                expected: self.total,
                got: source.total,
            });
        }
        if source.id == self.id || self.merge_sources.iter().any(|s| s.id == source.id) {
            return Err(SegmentUpdateError::DuplicateId { id: source.id });
        }
        if !self.contains(source.start) || !self.contains(source.end) || source.len() > self.len() {
            return Err(SegmentUpdateError::MergeSourceOutsideSpan);
        }
        self.merge_sources.push(source);
        Ok(())
    }

    pub fn clear_merge_sources(&mut self) {
        self.merge_sources.clear();
    }

    pub(crate) fn set_span(&mut self, start: usize, end: usize) {
        self.start = start;
        self.end = end;
    }

    pub(crate) fn set_total(&mut self, total: usize) {
        self.total = total;
    }
}

/// Check that an ordered segment list tiles a ring of `total` positions
/// exactly once: consecutive segments share their boundary index and the
/// exclusive lengths sum to the ring length. A single segment must be the
/// whole-ring span.
pub fn validate_ring(segments: &[Segment], total: usize) -> Result<(), SegmentUpdateError> {
    if segments.is_empty() {
        return Err(SegmentUpdateError::BrokenCoverage);
    }
    for seg in segments {
        if seg.profile_len() != total {
            return Err(SegmentUpdateError::LengthMismatch {
                expected: total,
                got: seg.profile_len(),
            });
        }
    }
    if segments.len() == 1 {
        return if segments[0].start() == segments[0].end() {
            Ok(())
        } else {
            Err(SegmentUpdateError::BrokenCoverage)
        };
    }
    let mut covered = 0;
    for (i, seg) in segments.iter().enumerate() {
        let next = &segments[(i + 1) % segments.len()];
        if seg.end() != next.start() {
            return Err(SegmentUpdateError::BrokenCoverage);
        }
        covered += seg.exclusive_len();
    }
    if covered != total {
        return Err(SegmentUpdateError::BrokenCoverage);
    }
    Ok(())
}
