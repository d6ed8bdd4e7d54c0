//! Error types shared across the crate.
//!
//! Each failure domain carries its own enum: [`ProfileError`] for numeric
//! profile operations, [`SegmentUpdateError`] for rejected segment geometry,
//! and [`CollectionError`] for population-level lookups. Segment rejections
//! are recoverable by design: callers present them to the user and the
//! profile is left untouched.

use thiserror::Error;
use uuid::Uuid;

use crate::collection::ProfileType;
use crate::tag::Tag;

/// Errors from profile construction and numeric operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    /// A profile must contain at least one value.
    #[error("profile must not be empty")]
    Empty,

    /// Strict index access outside `0..len`.
    #[error("index {index} out of bounds for profile of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Fractional access outside `[0, 1]`.
    #[error("fraction {fraction} outside [0, 1]")]
    FractionOutOfRange { fraction: f64 },

    /// Elementwise arithmetic between profiles of different lengths.
    #[error("profile length mismatch: {expected} vs {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// NaN or infinity supplied to an arithmetic operation.
    #[error("cannot operate with NaN or infinite value")]
    NonFinite,

    /// A requested target length of zero.
    #[error("target length must be at least 1")]
    ZeroLength,

    /// Too few border points to measure an angle profile.
    #[error("need at least {needed} border points, got {got}")]
    TooFewPoints { needed: usize, got: usize },
}

/// Rejected segment geometry. The operation that produced this error has
/// made no change to the profile or its segments.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegmentUpdateError {
    /// No segment with the given id.
    #[error("no segment with id {id}")]
    NotFound { id: Uuid },

    /// The segment (or an affected neighbour) is locked against edits.
    #[error("segment {id} is locked")]
    Locked { id: Uuid },

    /// An endpoint outside the profile.
    #[error("index {index} out of bounds for profile of length {total}")]
    OutOfBounds { index: usize, total: usize },

    /// A within-segment proportion outside `[0, 1]`.
    #[error("proportion {proportion} outside [0, 1]")]
    InvalidProportion { proportion: f64 },

    /// The resulting segment would be shorter than the minimum.
    #[error("segment length {len} below minimum {min}")]
    TooShort { len: usize, min: usize },

    /// The resulting segment would leave less than the minimum length
    /// uncovered on the rest of the ring.
    #[error("segment length {len} above maximum {max} for this profile")]
    TooLong { len: usize, max: usize },

    /// A neighbour would be squeezed below the minimum length.
    #[error("neighbour {id} would shrink to {len}, below minimum {min}")]
    NeighbourTooShort { id: Uuid, len: usize, min: usize },

    /// The moved endpoint would cross its partner or a neighbour boundary.
    #[error("update would invert segment {id}")]
    WouldInvert { id: Uuid },

    /// The lone whole-profile segment cannot be edited.
    #[error("the default whole-profile segment cannot be updated")]
    SingleSegment,

    /// A merge that would leave one segment spanning the entire ring.
    #[error("merge would span the whole profile")]
    SpansWholeRing,

    /// Merge requested for segments that do not share a boundary.
    #[error("segments {a} and {b} are not adjacent")]
    NotAdjacent { a: Uuid, b: Uuid },

    /// Segment declared for a profile of a different length.
    #[error("segment is defined on length {expected}, profile has {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// The segment list does not tile the ring exactly once.
    #[error("segments do not cover the profile contiguously")]
    BrokenCoverage,

    /// A merge source that falls outside the span of its parent.
    #[error("merge source lies outside the parent segment")]
    MergeSourceOutsideSpan,

    /// A merge source id colliding with the parent or an existing source.
    #[error("duplicate segment id {id}")]
    DuplicateId { id: Uuid },

    /// Two segmentations that should share an id pattern but do not.
    #[error("segment id patterns do not match")]
    PatternMismatch,
}

/// Errors from population-level profile collections and managers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollectionError {
    /// The requested landmark has no index in this collection.
    #[error("tag {tag} is not present")]
    TagNotPresent { tag: Tag },

    /// No aggregate has been built for the requested profile type.
    #[error("no aggregate for profile type {ptype}")]
    NoAggregate { ptype: ProfileType },

    /// Segments were requested before any segmentation was assigned.
    /// This is an expected state for a freshly created collection.
    #[error("collection is not yet segmented")]
    NotSegmented,

    /// Aggregate rebuild at a length that disagrees with stored segments.
    #[error("aggregate length {requested} conflicts with segmented length {existing}")]
    AggregateLengthMismatch { existing: usize, requested: usize },

    /// A position beyond the aggregate length.
    #[error("position {position} out of bounds for aggregate of length {len}")]
    PositionOutOfBounds { position: usize, len: usize },

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Segment(#[from] SegmentUpdateError),
}
