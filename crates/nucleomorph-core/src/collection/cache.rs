//! Memoized quartile profiles.

use std::collections::HashMap;

use crate::collection::{ProfileType, Quartile};
use crate::profile::Profile;
use crate::tag::Tag;

/// Cache of computed quartile profiles keyed by profile type, quartile and
/// landmark. Owned by the collection, which invalidates entries whenever
/// the inputs they were derived from change: per tag when a landmark
/// moves, per type when an aggregate is rebuilt, and entirely when the
/// segmentation changes.
#[derive(Debug, Clone, Default)]
pub struct ProfileCache {
    entries: HashMap<(ProfileType, Quartile, Tag), Profile>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ptype: ProfileType, quartile: Quartile, tag: &Tag) -> Option<&Profile> {
        self.entries.get(&(ptype, quartile, tag.clone()))
    }

    pub fn insert(&mut self, ptype: ProfileType, quartile: Quartile, tag: Tag, profile: Profile) {
        self.entries.insert((ptype, quartile, tag), profile);
    }

    /// Drop every entry derived from the given landmark.
    pub fn invalidate_tag(&mut self, tag: &Tag) {
        self.entries.retain(|(_, _, t), _| t != tag);
    }

    /// Drop every entry derived from the given profile type.
    pub fn invalidate_type(&mut self, ptype: ProfileType) {
        self.entries.retain(|(p, _, _), _| *p != ptype);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
