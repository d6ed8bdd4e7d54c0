//! Segmented circular profile analysis for 2D nuclear outlines.
//!
//! A traced nuclear border is reduced to circular numeric profiles (one
//! value per border point) which are segmented, aligned and aggregated
//! across populations:
//!
//! 1. **Measure** — [`Profile::angles_from_border`] turns a closed border
//!    polygon into an angle profile; the [`geometry`] module supplies the
//!    point and line primitives.
//! 2. **Transform** — [`Profile`] offers ring-aware offsetting,
//!    interpolation, smoothing, extrema detection and best-fit alignment.
//! 3. **Segment** — [`SegmentedProfile`] tiles the ring with named
//!    [`Segment`]s that can be moved, split, merged and unmerged under
//!    strict coverage invariants.
//! 4. **Aggregate** — [`ProfileCollection`] pools a population's profiles
//!    into per-position quartiles, locates landmark [`Tag`]s and carries
//!    the shared reference segmentation.
//! 5. **Coordinate** — [`ProfileManager`] propagates segmentation and
//!    landmark edits from the population median onto every member
//!    atomically.
//!
//! All transforms are copy-on-write; a rejected operation reports a typed
//! error and leaves its input untouched.
//!
//! [`Profile::angles_from_border`]: profile::Profile::angles_from_border

pub mod collection;
pub mod error;
pub mod geometry;
pub mod manager;
pub mod profile;
pub mod segment;
pub mod segmented;
pub mod tag;

pub use collection::{aggregate::ProfileAggregate, cache::ProfileCache};
pub use collection::{ProfileCollection, ProfileType, Quartile};
pub use error::{CollectionError, ProfileError, SegmentUpdateError};
pub use geometry::{LineEquation, Point};
pub use manager::{Population, ProfileManager, Taggable};
pub use profile::{boolean::BooleanProfile, Profile};
pub use segment::{Segment, DEFAULT_SEGMENT_ID, MIN_SEGMENT_LENGTH};
pub use segmented::SegmentedProfile;
pub use tag::{Tag, TagKind};
