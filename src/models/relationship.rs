//! `parent_of` and `owns` relationships.

use super::graph::ElementId;
use super::temporal::{OwnsTime, TimeAttr};
use crate::{Error, Result};

/// Directed parent → child relationship between two assets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParentOf {
    /// Parent asset vertex.
    pub parent_vid: ElementId,
    /// Child asset vertex.
    pub child_vid: ElementId,
}

impl ParentOf {
    /// Creates a relationship between two asset vertices.
    #[must_use]
    pub const fn new(parent_vid: ElementId, child_vid: ElementId) -> Self {
        Self {
            parent_vid,
            child_vid,
        }
    }

    /// Rejects self-loops.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when parent and child are the same vertex.
    pub fn validate(&self) -> Result<()> {
        if self.parent_vid == self.child_vid {
            return Err(Error::InvalidInput(
                "child_vid and parent_vid are the same".to_string(),
            ));
        }
        Ok(())
    }
}

/// A persisted `parent_of` edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbParentOf {
    /// Internal edge id.
    pub eid: ElementId,
    /// Parent asset vertex.
    pub parent_vid: ElementId,
    /// Child asset vertex.
    pub child_vid: ElementId,
    /// Observed validity window.
    pub time: TimeAttr,
}

/// Team → asset ownership.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Owns {
    /// Owning team vertex.
    pub team_vid: ElementId,
    /// Owned asset vertex.
    pub asset_vid: ElementId,
}

impl Owns {
    /// Creates an ownership between a team and an asset.
    #[must_use]
    pub const fn new(team_vid: ElementId, asset_vid: ElementId) -> Self {
        Self {
            team_vid,
            asset_vid,
        }
    }
}

/// A persisted `owns` edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbOwns {
    /// Internal edge id.
    pub eid: ElementId,
    /// Owning team vertex.
    pub team_vid: ElementId,
    /// Owned asset vertex.
    pub asset_vid: ElementId,
    /// Ownership interval.
    pub time: OwnsTime,
}
