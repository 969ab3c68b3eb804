//! Persisted graph schema: opaque element ids and the fixed label set.
//!
//! The inventory stores a small, fixed schema:
//!
//! | Kind | Label | Direction |
//! |------|-------|-----------|
//! | Vertex | `Team` | |
//! | Vertex | `Asset` | |
//! | Vertex | `Universe` | |
//! | Edge | `parent_of` | parent → child |
//! | Edge | `owns` | team → asset |
//! | Edge | `universe_of` | universe → team/asset |
//!
//! Element ids are opaque strings. They order lexicographically (pagination
//! sorts by them) but must never be parsed for meaning.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque internal id of a vertex (`vid`) or edge (`eid`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Wraps an existing id string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh id (UUIDv7, so ids sort roughly by creation time).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ElementId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Vertex labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexLabel {
    /// A team that may own assets.
    Team,
    /// An inventoried asset.
    Asset,
    /// A universe generation marker.
    Universe,
}

impl VertexLabel {
    /// Returns the persisted label string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Team => "Team",
            Self::Asset => "Asset",
            Self::Universe => "Universe",
        }
    }

    /// Parses a persisted label string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Team" => Some(Self::Team),
            "Asset" => Some(Self::Asset),
            "Universe" => Some(Self::Universe),
            _ => None,
        }
    }

    /// All vertex labels.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Team, Self::Asset, Self::Universe]
    }
}

impl fmt::Display for VertexLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeLabel {
    /// Parent asset → child asset.
    ParentOf,
    /// Team → asset.
    Owns,
    /// Universe → team or asset.
    UniverseOf,
}

impl EdgeLabel {
    /// Returns the persisted label string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ParentOf => "parent_of",
            Self::Owns => "owns",
            Self::UniverseOf => "universe_of",
        }
    }

    /// Parses a persisted label string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "parent_of" => Some(Self::ParentOf),
            "owns" => Some(Self::Owns),
            "universe_of" => Some(Self::UniverseOf),
            _ => None,
        }
    }

    /// All edge labels.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::ParentOf, Self::Owns, Self::UniverseOf]
    }
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
