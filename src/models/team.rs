//! Teams: non-temporal owners of assets, keyed by identifier.

use super::graph::ElementId;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A team as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Team {
    /// Identifier, unique within a universe and immutable once set.
    pub identifier: String,
    /// Display name; the only mutable attribute.
    pub name: String,
}

impl Team {
    /// Creates a team.
    #[must_use]
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
        }
    }

    /// Rejects an empty identifier or name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if either field is empty.
    pub fn validate(&self) -> Result<()> {
        if self.identifier.is_empty() {
            return Err(Error::InvalidInput("team identifier is empty".to_string()));
        }
        if self.name.is_empty() {
            return Err(Error::InvalidInput("team name is empty".to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.identifier, self.name)
    }
}

/// A persisted team vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbTeam {
    /// Internal vertex id.
    pub vid: ElementId,
    /// Identifier.
    pub identifier: String,
    /// Display name.
    pub name: String,
}

impl DbTeam {
    /// Returns the caller-facing team value.
    #[must_use]
    pub fn team(&self) -> Team {
        Team::new(self.identifier.clone(), self.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_validate() {
        assert!(Team::new("t1", "Team 1").validate().is_ok());
        assert!(Team::new("", "Team 1").validate().is_err());
        assert!(Team::new("t1", "").validate().is_err());
    }
}
