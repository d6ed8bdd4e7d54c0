//! Landmark tags: named positions on the outline ring.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named landmark on a profile. The reference point is the origin every
/// stored index is expressed against; the remaining tags orient the outline
/// or mark features of interest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tag {
    /// The zero landmark all profiles are aligned to.
    Reference,
    /// The point used to rotate outlines into a common orientation.
    Orientation,
    /// Upper intersection of the vertical axis with the border.
    TopVertical,
    /// Lower intersection of the vertical axis with the border.
    BottomVertical,
    /// Intersection of an internal structure with the border.
    Intersection,
    /// A user-defined landmark.
    Custom(String),
}

/// Whether a tag is part of the core orientation set or an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Core,
    Extended,
}

impl Tag {
    pub fn kind(&self) -> TagKind {
        match self {
            Tag::Reference | Tag::Orientation => TagKind::Core,
            _ => TagKind::Extended,
        }
    }

    /// Stable name used for display and serialization of known tags.
    pub fn name(&self) -> &str {
        match self {
            Tag::Reference => "RP",
            Tag::Orientation => "OP",
            Tag::TopVertical => "TV",
            Tag::BottomVertical => "BV",
            Tag::Intersection => "IP",
            Tag::Custom(name) => name,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
