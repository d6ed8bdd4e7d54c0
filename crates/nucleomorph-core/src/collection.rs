//! Population-level profile collections.
//!
//! A [`ProfileCollection`] summarises the profiles of a population of
//! outlines: per-type [`ProfileAggregate`]s answering quartile queries,
//! landmark indices locating each [`Tag`] on the median ring, and the
//! reference segmentation shared by the population. Everything is stored
//! zeroed on the reference point; queries against another landmark rotate
//! on the way out, and supplied segmentations rotate on the way in.
//!
//! Computed quartile profiles are memoized in a [`ProfileCache`] with
//! explicit, targeted invalidation.

pub mod aggregate;
pub mod cache;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CollectionError, SegmentUpdateError};
use crate::profile::Profile;
use crate::segment::{self, Segment};
use crate::segmented::SegmentedProfile;
use crate::tag::Tag;
use self::aggregate::ProfileAggregate;
use self::cache::ProfileCache;

/// The measurement a profile records at each border point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileType {
    /// Interior angle at the border point.
    Angle,
    /// Diameter through the centre of mass.
    Diameter,
    /// Distance from the border point to the centre of mass.
    Radius,
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProfileType::Angle => "angle",
            ProfileType::Diameter => "diameter",
            ProfileType::Radius => "radius",
        };
        f.write_str(name)
    }
}

/// Which quartile of the aggregated values to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quartile {
    Lower,
    Median,
    Upper,
}

impl Quartile {
    /// The quantile fraction this quartile reads at.
    pub fn fraction(&self) -> f64 {
        match self {
            Quartile::Lower => 0.25,
            Quartile::Median => 0.5,
            Quartile::Upper => 0.75,
        }
    }
}

/// Aggregated profiles, landmarks and reference segmentation for one
/// population.
#[derive(Debug, Clone)]
pub struct ProfileCollection {
    /// Landmark positions on the median ring, zeroed on the reference point.
    tag_indices: BTreeMap<Tag, usize>,
    aggregates: HashMap<ProfileType, ProfileAggregate>,
    /// Reference segmentation in the reference frame, in ring order.
    segments: Option<Vec<Segment>>,
    cache: ProfileCache,
}

impl Default for ProfileCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileCollection {
    /// An empty collection. The reference point is always present, pinned
    /// to index 0.
    pub fn new() -> Self {
        let mut tag_indices = BTreeMap::new();
        tag_indices.insert(Tag::Reference, 0);
        Self {
            tag_indices,
            aggregates: HashMap::new(),
            segments: None,
            cache: ProfileCache::new(),
        }
    }

    // ── Landmarks ──────────────────────────────────────────────────────────

    pub fn tags(&self) -> Vec<Tag> {
        self.tag_indices.keys().cloned().collect()
    }

    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tag_indices.contains_key(tag)
    }

    /// Index of a landmark on the median ring, in the reference frame.
    pub fn tag_index(&self, tag: &Tag) -> Result<usize, CollectionError> {
        self.tag_indices
            .get(tag)
            .copied()
            .ok_or_else(|| CollectionError::TagNotPresent { tag: tag.clone() })
    }

    /// Place or move a landmark. Moving the reference point is a no-op:
    /// every stored index is defined relative to it. Cached profiles for
    /// the landmark are discarded.
    pub fn set_tag_index(&mut self, tag: Tag, index: usize) -> Result<(), CollectionError> {
        if tag == Tag::Reference {
            tracing::debug!("ignoring attempt to move the reference point");
            return Ok(());
        }
        if let Some(len) = self.length() {
            if index >= len {
                return Err(CollectionError::PositionOutOfBounds {
                    position: index,
                    len,
                });
            }
        }
        tracing::debug!(%tag, index, "placing landmark");
        self.tag_indices.insert(tag.clone(), index);
        self.cache.invalidate_tag(&tag);
        Ok(())
    }

    /// The ring length of the aggregated median, when known.
    pub fn length(&self) -> Option<usize> {
        if let Some(agg) = self.aggregates.values().next() {
            return Some(agg.len());
        }
        self.segments
            .as_ref()
            .and_then(|segs| segs.first().map(Segment::profile_len))
    }

    // ── Aggregates ─────────────────────────────────────────────────────────

    /// Rebuild the aggregate for one profile type from the population's
    /// member profiles, resampled to `len` positions. Cached profiles of
    /// that type are discarded. Fails if a stored segmentation pins the
    /// ring to a different length.
    pub fn rebuild_aggregate(
        &mut self,
        ptype: ProfileType,
        profiles: &[Profile],
        len: usize,
    ) -> Result<(), CollectionError> {
        if let Some(existing) = self.length() {
            if existing != len {
                return Err(CollectionError::AggregateLengthMismatch {
                    existing,
                    requested: len,
                });
            }
        }
        let mut agg = ProfileAggregate::new(len)?;
        for p in profiles {
            agg.add(p)?;
        }
        tracing::info!(%ptype, members = profiles.len(), len, "rebuilt profile aggregate");
        self.aggregates.insert(ptype, agg);
        self.cache.invalidate_type(ptype);
        Ok(())
    }

    pub fn aggregate(&self, ptype: ProfileType) -> Result<&ProfileAggregate, CollectionError> {
        self.aggregates
            .get(&ptype)
            .ok_or(CollectionError::NoAggregate { ptype })
    }

    /// The values every member contributed at one ring position, in the
    /// reference frame.
    pub fn values_at_position(
        &self,
        ptype: ProfileType,
        position: usize,
    ) -> Result<Vec<f32>, CollectionError> {
        let agg = self.aggregate(ptype)?;
        agg.values_at(position)
            .map(<[f32]>::to_vec)
            .ok_or(CollectionError::PositionOutOfBounds {
                position,
                len: agg.len(),
            })
    }

    // ── Quartile profiles ──────────────────────────────────────────────────

    /// The quartile profile of a type, rotated so the given landmark sits
    /// at index 0. Served from cache when previously computed.
    pub fn profile(
        &mut self,
        ptype: ProfileType,
        tag: &Tag,
        quartile: Quartile,
    ) -> Result<Profile, CollectionError> {
        let index = self.tag_index(tag)?;
        if let Some(hit) = self.cache.get(ptype, quartile, tag) {
            return Ok(hit.clone());
        }
        let profile = self.aggregate(ptype)?.quartile(quartile)?.offset(index as isize);
        self.cache
            .insert(ptype, quartile, tag.clone(), profile.clone());
        Ok(profile)
    }

    /// Interquartile range per ring position, an indicator of how variable
    /// the population is at each point of the outline.
    pub fn iqr_profile(&mut self, ptype: ProfileType, tag: &Tag) -> Result<Profile, CollectionError> {
        let upper = self.profile(ptype, tag, Quartile::Upper)?;
        let lower = self.profile(ptype, tag, Quartile::Lower)?;
        Ok(upper.subtract_profile(&lower)?)
    }

    /// Up to three ring positions where the population varies most: the
    /// strongest local maxima of the smoothed IQR profile. When fewer than
    /// three maxima survive the window, the position of smallest spread is
    /// included as a fallback seed.
    pub fn find_most_variable_regions(
        &mut self,
        ptype: ProfileType,
        tag: &Tag,
    ) -> Result<Vec<usize>, CollectionError> {
        let iqr = self.iqr_profile(ptype, tag)?.smooth(3);
        let mask = iqr.local_maxima(3);
        let mut ranked = mask.true_indices();
        ranked.sort_by(|&a, &b| {
            iqr.as_slice()[b]
                .partial_cmp(&iqr.as_slice()[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(3);
        if ranked.len() < 3 {
            let seed = iqr.index_of_min();
            if !ranked.contains(&seed) {
                ranked.insert(0, seed);
            }
        }
        Ok(ranked)
    }

    // ── Segmentation ───────────────────────────────────────────────────────

    pub fn has_segments(&self) -> bool {
        self.segments.is_some()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.as_ref().map_or(0, Vec::len)
    }

    /// Deep copies of the reference segmentation, rotated into the frame of
    /// the given landmark.
    pub fn segments(&self, tag: &Tag) -> Result<Vec<Segment>, CollectionError> {
        let index = self.tag_index(tag)?;
        let stored = self.segments.as_ref().ok_or(CollectionError::NotSegmented)?;
        Ok(stored.iter().map(|s| s.offset(index as isize)).collect())
    }

    /// Assign the reference segmentation. The segments are interpreted in
    /// the frame of the given landmark and stored zeroed on the reference
    /// point. The whole cache is discarded.
    pub fn set_segments(&mut self, tag: &Tag, segments: Vec<Segment>) -> Result<(), CollectionError> {
        let index = self.tag_index(tag)?;
        let total = segments
            .first()
            .map(Segment::profile_len)
            .ok_or(CollectionError::NotSegmented)?;
        segment::validate_ring(&segments, total)?;
        if let Some(existing) = self.length() {
            if existing != total {
                return Err(CollectionError::AggregateLengthMismatch {
                    existing,
                    requested: total,
                });
            }
        }
        tracing::info!(%tag, segments = segments.len(), "assigning reference segmentation");
        self.segments = Some(
            segments
                .iter()
                .map(|s| s.offset(-(index as isize)))
                .collect(),
        );
        self.cache.clear();
        Ok(())
    }

    /// The quartile profile with its segmentation, both rotated into the
    /// landmark's frame. The segments are deep copies; editing them never
    /// touches the stored segmentation.
    pub fn segmented_profile(
        &mut self,
        ptype: ProfileType,
        tag: &Tag,
        quartile: Quartile,
    ) -> Result<SegmentedProfile, CollectionError> {
        let profile = self.profile(ptype, tag, quartile)?;
        let segments = self.segments(tag)?;
        Ok(SegmentedProfile::new(profile, segments)?)
    }

    /// The segment whose span begins at the landmark, in the reference
    /// frame.
    pub fn segment_starting_at(&self, tag: &Tag) -> Result<Segment, CollectionError> {
        let index = self.tag_index(tag)?;
        self.find_segment(|s| s.start() == index)
    }

    /// The segment whose span ends at the landmark, in the reference frame.
    pub fn segment_ending_at(&self, tag: &Tag) -> Result<Segment, CollectionError> {
        let index = self.tag_index(tag)?;
        self.find_segment(|s| s.end() == index)
    }

    /// The first segment whose span covers the landmark, in the reference
    /// frame.
    pub fn segment_containing(&self, tag: &Tag) -> Result<Segment, CollectionError> {
        let index = self.tag_index(tag)?;
        self.find_segment(|s| s.contains(index))
    }

    fn find_segment(&self, pred: impl Fn(&Segment) -> bool) -> Result<Segment, CollectionError> {
        let stored = self.segments.as_ref().ok_or(CollectionError::NotSegmented)?;
        stored
            .iter()
            .find(|s| pred(s))
            .cloned()
            .ok_or(CollectionError::NotSegmented)
    }

    /// Ids of the reference segmentation in ring order.
    pub fn segment_ids(&self) -> Result<Vec<Uuid>, CollectionError> {
        let stored = self.segments.as_ref().ok_or(CollectionError::NotSegmented)?;
        Ok(stored.iter().map(Segment::id).collect())
    }

    /// Set the lock flag on one segment of the reference segmentation.
    pub fn set_segment_lock(&mut self, id: Uuid, locked: bool) -> Result<(), CollectionError> {
        let stored = self.segments.as_mut().ok_or(CollectionError::NotSegmented)?;
        let seg = stored
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or(CollectionError::Segment(SegmentUpdateError::NotFound { id }))?;
        seg.set_locked(locked);
        Ok(())
    }

    /// Drop all memoized profiles.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProfileError, SegmentUpdateError};
    use approx::assert_relative_eq;

    fn populated_collection() -> ProfileCollection {
        let mut pc = ProfileCollection::new();
        let members = vec![
            Profile::new((0..12).map(|i| i as f32).collect()).unwrap(),
            Profile::new((0..12).map(|i| (i + 2) as f32).collect()).unwrap(),
            Profile::new((0..12).map(|i| (i + 4) as f32).collect()).unwrap(),
        ];
        pc.rebuild_aggregate(ProfileType::Angle, &members, 12).unwrap();
        pc
    }

    fn three_segments(total: usize) -> Vec<Segment> {
        vec![
            Segment::new(Uuid::new_v4(), 0, 4, total).unwrap(),
            Segment::new(Uuid::new_v4(), 4, 9, total).unwrap(),
            Segment::new(Uuid::new_v4(), 9, 0, total).unwrap(),
        ]
    }

    #[test]
    fn reference_point_is_pinned_to_zero() {
        let mut pc = populated_collection();
        assert_eq!(pc.tag_index(&Tag::Reference).unwrap(), 0);
        pc.set_tag_index(Tag::Reference, 5).unwrap();
        assert_eq!(pc.tag_index(&Tag::Reference).unwrap(), 0);
    }

    #[test]
    fn missing_tag_is_reported() {
        let pc = populated_collection();
        assert_eq!(
            pc.tag_index(&Tag::Orientation),
            Err(CollectionError::TagNotPresent {
                tag: Tag::Orientation
            })
        );
    }

    #[test]
    fn median_profile_rotates_to_the_landmark() {
        let mut pc = populated_collection();
        let at_rp = pc.profile(ProfileType::Angle, &Tag::Reference, Quartile::Median).unwrap();
        // members are i, i+2, i+4 so the median at position i is i+2
        assert_relative_eq!(at_rp.get(0).unwrap(), 2.0);
        pc.set_tag_index(Tag::Orientation, 3).unwrap();
        let at_op = pc.profile(ProfileType::Angle, &Tag::Orientation, Quartile::Median).unwrap();
        assert_relative_eq!(at_op.get(0).unwrap(), 5.0);
    }

    #[test]
    fn unsegmented_collection_reports_not_segmented() {
        let mut pc = populated_collection();
        assert!(!pc.has_segments());
        assert_eq!(
            pc.segments(&Tag::Reference),
            Err(CollectionError::NotSegmented)
        );
        assert!(matches!(
            pc.segmented_profile(ProfileType::Angle, &Tag::Reference, Quartile::Median),
            Err(CollectionError::NotSegmented)
        ));
    }

    #[test]
    fn segments_round_trip_through_landmark_frames() {
        let mut pc = populated_collection();
        pc.set_tag_index(Tag::Orientation, 3).unwrap();
        let segs = three_segments(12);
        let ids: Vec<Uuid> = segs.iter().map(Segment::id).collect();
        // supplied in the orientation frame
        pc.set_segments(&Tag::Orientation, segs.clone()).unwrap();

        let back = pc.segments(&Tag::Orientation).unwrap();
        assert_eq!(back, segs);

        // in the reference frame the same spans sit 3 positions later
        let at_rp = pc.segments(&Tag::Reference).unwrap();
        let first = at_rp.iter().find(|s| s.id() == ids[0]).unwrap();
        assert_eq!((first.start(), first.end()), (3, 7));
        assert_eq!(at_rp.iter().find(|s| s.start() == 0).unwrap().id(), ids[2]);
    }

    #[test]
    fn segmented_profile_is_a_deep_copy() {
        let mut pc = populated_collection();
        pc.set_segments(&Tag::Reference, three_segments(12)).unwrap();
        let sp = pc
            .segmented_profile(ProfileType::Angle, &Tag::Reference, Quartile::Median)
            .unwrap();
        let ids = sp.segment_ids();
        // mutate the copy; the stored segmentation is unaffected
        let edited = sp.update_segment(ids[1], 5, 8).unwrap();
        assert_ne!(edited.segments(), sp.segments());
        let stored = pc.segments(&Tag::Reference).unwrap();
        assert_eq!(stored[1].start(), 4);
    }

    #[test]
    fn segment_queries_by_landmark() {
        let mut pc = populated_collection();
        let segs = three_segments(12);
        let ids: Vec<Uuid> = segs.iter().map(Segment::id).collect();
        pc.set_segments(&Tag::Reference, segs).unwrap();
        pc.set_tag_index(Tag::Orientation, 4).unwrap();

        assert_eq!(pc.segment_starting_at(&Tag::Orientation).unwrap().id(), ids[1]);
        assert_eq!(pc.segment_ending_at(&Tag::Orientation).unwrap().id(), ids[0]);
        assert_eq!(pc.segment_containing(&Tag::Reference).unwrap().id(), ids[0]);
    }

    #[test]
    fn aggregate_length_must_match_segmentation() {
        let mut pc = populated_collection();
        pc.set_segments(&Tag::Reference, three_segments(12)).unwrap();
        let members = vec![Profile::uniform(1.0, 20).unwrap()];
        assert_eq!(
            pc.rebuild_aggregate(ProfileType::Radius, &members, 20),
            Err(CollectionError::AggregateLengthMismatch {
                existing: 12,
                requested: 20
            })
        );
        assert_eq!(
            pc.set_segments(&Tag::Reference, three_segments(20)),
            Err(CollectionError::AggregateLengthMismatch {
                existing: 12,
                requested: 20
            })
        );
    }

    #[test]
    fn iqr_reflects_population_spread() {
        let mut pc = populated_collection();
        let iqr = pc.iqr_profile(ProfileType::Angle, &Tag::Reference).unwrap();
        // members differ by a constant shift, so spread is uniform
        for i in 0..12 {
            assert_relative_eq!(iqr.get(i).unwrap(), 2.0);
        }
    }

    #[test]
    fn variable_regions_pick_the_widest_spread() {
        let mut pc = ProfileCollection::new();
        // two members agreeing everywhere except around position 10
        let mut a = vec![10.0f32; 40];
        let mut b = vec![10.0f32; 40];
        for (i, (x, y)) in a.iter_mut().zip(b.iter_mut()).enumerate() {
            let d = (i as f32 - 10.0).abs();
            if d < 5.0 {
                *x += 5.0 - d;
                *y -= 5.0 - d;
            }
        }
        pc.rebuild_aggregate(
            ProfileType::Angle,
            &[Profile::new(a).unwrap(), Profile::new(b).unwrap()],
            40,
        )
        .unwrap();
        let regions = pc
            .find_most_variable_regions(ProfileType::Angle, &Tag::Reference)
            .unwrap();
        assert!(regions.contains(&10));
    }

    #[test]
    fn values_at_position_and_errors() {
        let pc = populated_collection();
        assert_eq!(
            pc.values_at_position(ProfileType::Angle, 1).unwrap(),
            vec![1.0, 3.0, 5.0]
        );
        assert!(matches!(
            pc.values_at_position(ProfileType::Angle, 12),
            Err(CollectionError::PositionOutOfBounds { .. })
        ));
        assert_eq!(
            pc.values_at_position(ProfileType::Radius, 0),
            Err(CollectionError::NoAggregate {
                ptype: ProfileType::Radius
            })
        );
    }

    #[test]
    fn error_conversions_layer_cleanly() {
        let profile_err: CollectionError = ProfileError::Empty.into();
        assert!(matches!(profile_err, CollectionError::Profile(_)));
        let seg_err: CollectionError = SegmentUpdateError::BrokenCoverage.into();
        assert!(matches!(seg_err, CollectionError::Segment(_)));
    }
}
