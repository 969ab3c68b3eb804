//! Temporal windows and the observation merge rule.
//!
//! Assets and `parent_of` relationships carry a window
//! `first_seen <= last_seen <= expiration` that only ever widens. Each new
//! observation `(timestamp, expiration')` is folded in with [`TimeAttr::merge`]:
//!
//! | Observation | Effect |
//! |-------------|--------|
//! | `timestamp < first_seen` | `first_seen = timestamp` |
//! | `timestamp > last_seen` | `last_seen = timestamp`, `expiration = expiration'` |
//! | otherwise | no change |
//!
//! Ownership (`owns`) is not accreted: its [`OwnsTime`] is replaced wholesale
//! on every write, and an absent `end_time` means open-ended ownership.
//!
//! All instants are normalised to microsecond precision, the resolution the
//! persistent stores keep.
//!
//! # Example
//!
//! ```rust
//! use asset_inventory::models::temporal::{Observation, TimeAttr};
//! use chrono::{TimeZone, Utc};
//!
//! let day = |d| Utc.with_ymd_and_hms(2021, 7, d, 0, 0, 0).unwrap();
//!
//! let mut window = TimeAttr::from_observation(&Observation::new(day(7), Some(day(1))).unwrap());
//! assert!(window.merge(&Observation::new(day(20), Some(day(10))).unwrap()));
//! assert_eq!(window.first_seen, day(1));
//! assert_eq!(window.last_seen, day(10));
//! assert_eq!(window.expiration, day(20));
//! ```

use crate::{Error, Result, current_timestamp};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Truncates an instant to the microsecond precision persisted by the stores.
#[must_use]
pub fn normalize(t: DateTime<Utc>) -> DateTime<Utc> {
    t.trunc_subsecs(6)
}

/// A single sighting of an entity: when it was seen and until when it is
/// expected to stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// When the entity was observed.
    pub timestamp: DateTime<Utc>,
    /// Best known expiration as of this observation.
    pub expiration: DateTime<Utc>,
}

impl Observation {
    /// Builds an observation, defaulting `timestamp` to now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `expiration` precedes `timestamp`.
    pub fn new(expiration: DateTime<Utc>, timestamp: Option<DateTime<Utc>>) -> Result<Self> {
        let timestamp = timestamp.map_or_else(current_timestamp, normalize);
        let expiration = normalize(expiration);
        if expiration < timestamp {
            return Err(Error::InvalidInput(
                "expiration before timestamp".to_string(),
            ));
        }
        Ok(Self {
            timestamp,
            expiration,
        })
    }
}

/// Observed validity window of an asset or `parent_of` relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAttr {
    /// Earliest observation.
    pub first_seen: DateTime<Utc>,
    /// Latest observation.
    pub last_seen: DateTime<Utc>,
    /// Expiration reported by the latest observation.
    pub expiration: DateTime<Utc>,
}

impl TimeAttr {
    /// Initial window established by a first observation.
    #[must_use]
    pub const fn from_observation(observation: &Observation) -> Self {
        Self {
            first_seen: observation.timestamp,
            last_seen: observation.timestamp,
            expiration: observation.expiration,
        }
    }

    /// Folds an observation into the window. Returns `true` if anything changed.
    pub fn merge(&mut self, observation: &Observation) -> bool {
        if observation.timestamp < self.first_seen {
            self.first_seen = observation.timestamp;
            true
        } else if observation.timestamp > self.last_seen {
            self.last_seen = observation.timestamp;
            self.expiration = observation.expiration;
            true
        } else {
            false
        }
    }

    /// Returns `true` if `at` lies within `[first_seen, expiration]`.
    #[must_use]
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.first_seen <= at && at <= self.expiration
    }
}

/// Ownership interval of an `owns` relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnsTime {
    /// Start of the ownership.
    pub start_time: DateTime<Utc>,
    /// End of the ownership, `None` while it is open-ended.
    pub end_time: Option<DateTime<Utc>>,
}

impl OwnsTime {
    /// Builds an ownership interval.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `end_time` precedes `start_time`.
    pub fn new(start_time: DateTime<Utc>, end_time: Option<DateTime<Utc>>) -> Result<Self> {
        let start_time = normalize(start_time);
        let end_time = end_time.map(normalize);
        if end_time.is_some_and(|end| end < start_time) {
            return Err(Error::InvalidInput(
                "end_time before start_time".to_string(),
            ));
        }
        Ok(Self {
            start_time,
            end_time,
        })
    }
}
