//! Coordinated edits across a population.
//!
//! A [`ProfileManager`] applies segmentation and landmark changes to a
//! whole population at once: the collection's reference segmentation and
//! every member's own segmented profile move together, with median-ring
//! positions mapped onto each member through within-segment proportions.
//!
//! Every batch operation validates against every member before mutating
//! anything: the new state for each participant is computed first, and only
//! committed once all of them succeeded. One infeasible member aborts the
//! whole batch. Members flagged as locked are skipped outright and keep
//! their current state.

use uuid::Uuid;

use crate::collection::{ProfileCollection, ProfileType, Quartile};
use crate::error::CollectionError;
use crate::segmented::SegmentedProfile;
use crate::tag::Tag;

/// An object carrying per-outline profiles and landmark positions.
pub trait Taggable {
    /// The member's segmented profile of the given type.
    fn segmented_profile(&self, ptype: ProfileType) -> Result<SegmentedProfile, CollectionError>;

    /// Replace the member's segmented profile of the given type.
    fn set_segmented_profile(
        &mut self,
        ptype: ProfileType,
        profile: SegmentedProfile,
    ) -> Result<(), CollectionError>;

    /// The member's border index for a landmark, if placed.
    fn tag_index(&self, tag: &Tag) -> Option<usize>;

    /// Place or move a landmark on the member's border.
    fn set_tag_index(&mut self, tag: Tag, index: usize) -> Result<(), CollectionError>;

    /// Number of border points on this member's outline.
    fn profile_len(&self) -> usize;

    /// Whether the member is excluded from batch edits.
    fn is_locked(&self) -> bool;
}

/// A population of taggable members with a shared profile collection.
pub trait Population {
    type Member: Taggable;

    fn members(&self) -> &[Self::Member];
    fn members_mut(&mut self) -> &mut [Self::Member];
    fn collection(&self) -> &ProfileCollection;
    fn collection_mut(&mut self) -> &mut ProfileCollection;
}

/// Applies landmark and segmentation edits across a population.
pub struct ProfileManager<'a, P: Population> {
    population: &'a mut P,
}

impl<'a, P: Population> ProfileManager<'a, P> {
    pub fn new(population: &'a mut P) -> Self {
        Self { population }
    }

    /// Move a landmark to a median-ring index, and to the proportionally
    /// equivalent border index on every unlocked member.
    pub fn set_tag(&mut self, tag: Tag, median_index: usize) -> Result<(), CollectionError> {
        if tag == Tag::Reference {
            tracing::debug!("ignoring attempt to move the reference point");
            return Ok(());
        }
        let median_len = self
            .population
            .collection()
            .length()
            .ok_or(CollectionError::NotSegmented)?;
        if median_index >= median_len {
            return Err(CollectionError::PositionOutOfBounds {
                position: median_index,
                len: median_len,
            });
        }
        let fraction = median_index as f64 / median_len as f64;
        let staged: Vec<Option<usize>> = self
            .population
            .members()
            .iter()
            .map(|m| {
                if m.is_locked() {
                    return None;
                }
                let len = m.profile_len();
                Some(((fraction * len as f64).round() as usize) % len)
            })
            .collect();

        tracing::info!(%tag, median_index, members = staged.len(), "moving landmark");
        self.population.collection_mut().set_tag_index(tag.clone(), median_index)?;
        for (member, index) in self.population.members_mut().iter_mut().zip(staged) {
            if let Some(index) = index {
                member.set_tag_index(tag.clone(), index)?;
            }
        }
        Ok(())
    }

    /// Merge two adjacent segments on the collection and on every unlocked
    /// member.
    pub fn merge_segments(
        &mut self,
        ptype: ProfileType,
        id_a: Uuid,
        id_b: Uuid,
        merged_id: Uuid,
    ) -> Result<(), CollectionError> {
        let median = self.median_segmented(ptype)?;
        let merged_median = median.merge(id_a, id_b, merged_id)?;
        let staged = self.stage(ptype, |sp| sp.merge(id_a, id_b, merged_id).map_err(Into::into))?;

        tracing::info!(%id_a, %id_b, members = staged.len(), "merging segments across population");
        self.commit(ptype, staged, &merged_median)
    }

    /// Split a segment at a median-ring index, placing the boundary at the
    /// same within-segment proportion on every member. Returns the ids of
    /// the two new segments.
    pub fn split_segment(
        &mut self,
        ptype: ProfileType,
        id: Uuid,
        median_index: usize,
    ) -> Result<(Uuid, Uuid), CollectionError> {
        let median = self.median_segmented(ptype)?;
        let proportion = median.segment(id)?.index_proportion(median_index)?;
        let (left_id, right_id) = (Uuid::new_v4(), Uuid::new_v4());
        let split_median = median.split(id, median_index, left_id, right_id)?;
        let staged = self.stage(ptype, |sp| {
            let member_index = sp.segment(id)?.proportional_index(proportion)?;
            sp.split(id, member_index, left_id, right_id).map_err(Into::into)
        })?;

        tracing::info!(%id, median_index, members = staged.len(), "splitting segment across population");
        self.commit(ptype, staged, &split_median)?;
        Ok((left_id, right_id))
    }

    /// Undo a merge on the collection and on every member. A segment that
    /// was never merged leaves the population unchanged.
    pub fn unmerge_segments(&mut self, ptype: ProfileType, id: Uuid) -> Result<(), CollectionError> {
        let median = self.median_segmented(ptype)?;
        if !median.segment(id)?.has_merge_sources() {
            return Ok(());
        }
        let unmerged_median = median.unmerge(id)?;
        let staged = self.stage(ptype, |sp| {
            if !sp.segment(id)?.has_merge_sources() {
                return Err(crate::error::SegmentUpdateError::PatternMismatch.into());
            }
            sp.unmerge(id).map_err(Into::into)
        })?;

        tracing::info!(%id, members = staged.len(), "unmerging segment across population");
        self.commit(ptype, staged, &unmerged_median)
    }

    /// Set the lock flag on one segment, on the collection and on every
    /// member.
    pub fn set_segment_lock(
        &mut self,
        ptype: ProfileType,
        id: Uuid,
        locked: bool,
    ) -> Result<(), CollectionError> {
        let staged = self.stage(ptype, |sp| sp.with_segment_lock(id, locked).map_err(Into::into))?;
        for (member, sp) in self.population.members_mut().iter_mut().zip(staged) {
            if let Some(sp) = sp {
                member.set_segmented_profile(ptype, sp)?;
            }
        }
        self.population.collection_mut().set_segment_lock(id, locked)
    }

    fn median_segmented(&mut self, ptype: ProfileType) -> Result<SegmentedProfile, CollectionError> {
        self.population
            .collection_mut()
            .segmented_profile(ptype, &Tag::Reference, Quartile::Median)
    }

    /// Compute the post-edit profile for every unlocked member without
    /// mutating any. Locked members stage as `None` and are left untouched
    /// on commit.
    fn stage(
        &self,
        ptype: ProfileType,
        op: impl Fn(&SegmentedProfile) -> Result<SegmentedProfile, CollectionError>,
    ) -> Result<Vec<Option<SegmentedProfile>>, CollectionError> {
        self.population
            .members()
            .iter()
            .map(|m| {
                if m.is_locked() {
                    return Ok(None);
                }
                op(&m.segmented_profile(ptype)?).map(Some)
            })
            .collect()
    }

    fn commit(
        &mut self,
        ptype: ProfileType,
        staged: Vec<Option<SegmentedProfile>>,
        median: &SegmentedProfile,
    ) -> Result<(), CollectionError> {
        for (member, sp) in self.population.members_mut().iter_mut().zip(staged) {
            if let Some(sp) = sp {
                member.set_segmented_profile(ptype, sp)?;
            }
        }
        self.population
            .collection_mut()
            .set_segments(&Tag::Reference, median.segments().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SegmentUpdateError;
    use crate::profile::Profile;
    use crate::segment::Segment;
    use std::collections::{BTreeMap, HashMap};

    struct TestMember {
        profiles: HashMap<ProfileType, SegmentedProfile>,
        tags: BTreeMap<Tag, usize>,
        locked: bool,
    }

    impl Taggable for TestMember {
        fn segmented_profile(
            &self,
            ptype: ProfileType,
        ) -> Result<SegmentedProfile, CollectionError> {
            self.profiles
                .get(&ptype)
                .cloned()
                .ok_or(CollectionError::NotSegmented)
        }

        fn set_segmented_profile(
            &mut self,
            ptype: ProfileType,
            profile: SegmentedProfile,
        ) -> Result<(), CollectionError> {
            self.profiles.insert(ptype, profile);
            Ok(())
        }

        fn tag_index(&self, tag: &Tag) -> Option<usize> {
            self.tags.get(tag).copied()
        }

        fn set_tag_index(&mut self, tag: Tag, index: usize) -> Result<(), CollectionError> {
            self.tags.insert(tag, index);
            Ok(())
        }

        fn profile_len(&self) -> usize {
            self.profiles[&ProfileType::Angle].len()
        }

        fn is_locked(&self) -> bool {
            self.locked
        }
    }

    struct TestPopulation {
        members: Vec<TestMember>,
        collection: ProfileCollection,
    }

    impl Population for TestPopulation {
        type Member = TestMember;

        fn members(&self) -> &[TestMember] {
            &self.members
        }

        fn members_mut(&mut self) -> &mut [TestMember] {
            &mut self.members
        }

        fn collection(&self) -> &ProfileCollection {
            &self.collection
        }

        fn collection_mut(&mut self) -> &mut ProfileCollection {
            &mut self.collection
        }
    }

    /// Two members of different border lengths sharing a three-segment
    /// pattern, plus a collection aggregated at length 12.
    fn population() -> (TestPopulation, Uuid, Uuid, Uuid) {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let base = SegmentedProfile::new(
            Profile::new((0..12).map(|i| i as f32).collect()).unwrap(),
            vec![
                Segment::new(a, 0, 4, 12).unwrap(),
                Segment::new(b, 4, 9, 12).unwrap(),
                Segment::new(c, 9, 0, 12).unwrap(),
            ],
        )
        .unwrap();
        let scaled = base.interpolate(24).unwrap();

        let member = |sp: &SegmentedProfile| TestMember {
            profiles: HashMap::from([(ProfileType::Angle, sp.clone())]),
            tags: BTreeMap::from([(Tag::Reference, 0)]),
            locked: false,
        };
        let mut collection = ProfileCollection::new();
        collection
            .rebuild_aggregate(
                ProfileType::Angle,
                &[base.profile().clone(), scaled.profile().clone()],
                12,
            )
            .unwrap();
        collection
            .set_segments(&Tag::Reference, base.segments().to_vec())
            .unwrap();
        (
            TestPopulation {
                members: vec![member(&base), member(&scaled)],
                collection,
            },
            a,
            b,
            c,
        )
    }

    #[test]
    fn merge_applies_to_every_member_and_the_collection() {
        let (mut pop, a, b, _) = population();
        let merged_id = Uuid::new_v4();
        ProfileManager::new(&mut pop)
            .merge_segments(ProfileType::Angle, a, b, merged_id)
            .unwrap();

        assert_eq!(pop.collection.segment_count(), 2);
        for m in &pop.members {
            let sp = m.segmented_profile(ProfileType::Angle).unwrap();
            assert_eq!(sp.segment_count(), 2);
            assert!(sp.segment(merged_id).unwrap().has_merge_sources());
        }
    }

    #[test]
    fn split_places_member_boundaries_proportionally() {
        let (mut pop, _, b, _) = population();
        // median segment b spans [4, 9]; index 6 sits at proportion 0.4
        let (left_id, right_id) = ProfileManager::new(&mut pop)
            .split_segment(ProfileType::Angle, b, 6)
            .unwrap();

        assert_eq!(pop.collection.segment_count(), 4);
        let small = pop.members[0].segmented_profile(ProfileType::Angle).unwrap();
        assert_eq!(small.segment(left_id).unwrap().end(), 6);
        // on the 24-ring member, b spans [8, 18]; proportion 0.4 lands at 12
        let large = pop.members[1].segmented_profile(ProfileType::Angle).unwrap();
        assert_eq!(large.segment(left_id).unwrap().end(), 12);
        assert_eq!(large.segment(right_id).unwrap().start(), 12);
    }

    #[test]
    fn merge_then_unmerge_round_trips_the_population() {
        let (mut pop, a, b, _) = population();
        let before: Vec<Uuid> = pop.members[0]
            .segmented_profile(ProfileType::Angle)
            .unwrap()
            .segment_ids();
        let merged_id = Uuid::new_v4();
        {
            let mut mgr = ProfileManager::new(&mut pop);
            mgr.merge_segments(ProfileType::Angle, a, b, merged_id).unwrap();
            mgr.unmerge_segments(ProfileType::Angle, merged_id).unwrap();
        }
        let after = pop.members[0]
            .segmented_profile(ProfileType::Angle)
            .unwrap()
            .segment_ids();
        assert_eq!(before, after);
        assert_eq!(pop.collection.segment_count(), 3);
    }

    #[test]
    fn one_locked_member_aborts_the_whole_merge() {
        let (mut pop, a, b, _) = population();
        // lock segment b on the second member only
        let locked = pop.members[1]
            .segmented_profile(ProfileType::Angle)
            .unwrap()
            .with_segment_lock(b, true)
            .unwrap();
        pop.members[1]
            .set_segmented_profile(ProfileType::Angle, locked)
            .unwrap();

        let result =
            ProfileManager::new(&mut pop).merge_segments(ProfileType::Angle, a, b, Uuid::new_v4());
        assert!(matches!(
            result,
            Err(CollectionError::Segment(SegmentUpdateError::Locked { .. }))
        ));
        // nothing was mutated
        assert_eq!(pop.collection.segment_count(), 3);
        assert_eq!(
            pop.members[0]
                .segmented_profile(ProfileType::Angle)
                .unwrap()
                .segment_count(),
            3
        );
    }

    #[test]
    fn locked_members_are_skipped_by_batch_edits() {
        let (mut pop, a, b, _) = population();
        pop.members[1].locked = true;
        let merged_id = Uuid::new_v4();
        ProfileManager::new(&mut pop)
            .merge_segments(ProfileType::Angle, a, b, merged_id)
            .unwrap();

        // unlocked member and collection take the merge
        assert_eq!(pop.collection.segment_count(), 2);
        assert_eq!(
            pop.members[0]
                .segmented_profile(ProfileType::Angle)
                .unwrap()
                .segment_count(),
            2
        );
        // the locked member keeps its segmentation
        assert_eq!(
            pop.members[1]
                .segmented_profile(ProfileType::Angle)
                .unwrap()
                .segment_count(),
            3
        );

        // landmark moves also pass the locked member by
        ProfileManager::new(&mut pop)
            .set_tag(Tag::Orientation, 6)
            .unwrap();
        assert_eq!(pop.members[0].tag_index(&Tag::Orientation), Some(6));
        assert_eq!(pop.members[1].tag_index(&Tag::Orientation), None);
    }

    #[test]
    fn set_tag_maps_the_median_index_to_each_member() {
        let (mut pop, _, _, _) = population();
        ProfileManager::new(&mut pop)
            .set_tag(Tag::Orientation, 6)
            .unwrap();
        assert_eq!(pop.collection.tag_index(&Tag::Orientation).unwrap(), 6);
        assert_eq!(pop.members[0].tag_index(&Tag::Orientation), Some(6));
        assert_eq!(pop.members[1].tag_index(&Tag::Orientation), Some(12));
    }

    #[test]
    fn set_tag_rejects_out_of_range_indices() {
        let (mut pop, _, _, _) = population();
        assert!(matches!(
            ProfileManager::new(&mut pop).set_tag(Tag::Orientation, 12),
            Err(CollectionError::PositionOutOfBounds { .. })
        ));
    }

    #[test]
    fn lock_propagates_to_members_and_collection() {
        let (mut pop, a, b, _) = population();
        ProfileManager::new(&mut pop)
            .set_segment_lock(ProfileType::Angle, b, true)
            .unwrap();
        for m in &pop.members {
            let sp = m.segmented_profile(ProfileType::Angle).unwrap();
            assert!(sp.segment(b).unwrap().is_locked());
        }
        // a locked segment now blocks boundary edits everywhere
        assert!(matches!(
            ProfileManager::new(&mut pop).merge_segments(
                ProfileType::Angle,
                a,
                b,
                Uuid::new_v4()
            ),
            Err(CollectionError::Segment(SegmentUpdateError::Locked { .. }))
        ));
    }
}
