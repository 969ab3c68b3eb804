//! Typed request and response bodies.
//!
//! Times are accepted as RFC 3339 with any offset and always rendered in UTC
//! as `+00:00`. Every response embeds the fields of its request type.

use crate::models::{
    AssetId, DEFAULT_PAGE_SIZE, DbAsset, DbOwns, DbParentOf, DbTeam, DbUniverse, PageRequest,
};
use crate::services::BulkAsset;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// RFC 3339 (de)serialization of UTC times.
pub mod rfc3339 {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Parses an RFC 3339 time with any offset.
    ///
    /// # Errors
    ///
    /// Returns a message naming the malformed value.
    pub fn parse(value: &str) -> Result<DateTime<Utc>, String> {
        DateTime::parse_from_rfc3339(value)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| format!("invalid time {value:?}: {e}"))
    }

    /// Serializes with a `+00:00` offset.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.to_rfc3339())
    }

    /// Deserializes any RFC 3339 offset into UTC.
    ///
    /// # Errors
    ///
    /// Fails on a malformed time.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let value = String::deserialize(d)?;
        parse(&value).map_err(serde::de::Error::custom)
    }

    /// Optional variant; `null` and absent are both `None`.
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        /// Serializes `None` as `null`.
        ///
        /// # Errors
        ///
        /// Propagates serializer errors.
        #[allow(clippy::ref_option)]
        pub fn serialize<S: Serializer>(t: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
            match t {
                Some(t) => s.serialize_str(&t.to_rfc3339()),
                None => s.serialize_none(),
            }
        }

        /// Deserializes an optional RFC 3339 time.
        ///
        /// # Errors
        ///
        /// Fails on a malformed time.
        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<String>::deserialize(d)?
                .map(|value| super::parse(&value).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

// ============================================================================
// Teams
// ============================================================================

/// Team as supplied by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamReq {
    /// Identifier, immutable once created.
    pub identifier: String,
    /// Display name.
    pub name: String,
}

/// Stored team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamResp {
    /// Internal id.
    pub id: String,
    /// Request fields.
    #[serde(flatten)]
    pub team: TeamReq,
}

impl From<DbTeam> for TeamResp {
    fn from(team: DbTeam) -> Self {
        Self {
            id: team.vid.to_string(),
            team: TeamReq {
                identifier: team.identifier,
                name: team.name,
            },
        }
    }
}

// ============================================================================
// Assets
// ============================================================================

/// Asset observation as supplied by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetReq {
    /// Natural key.
    #[serde(flatten)]
    pub asset_id: AssetId,
    /// Observation time; now when absent.
    #[serde(default, with = "rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Expiration of the observation.
    #[serde(with = "rfc3339")]
    pub expiration: DateTime<Utc>,
}

/// Stored asset with its validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetResp {
    /// Internal id.
    pub id: String,
    /// Natural key.
    #[serde(flatten)]
    pub asset_id: AssetId,
    /// Earliest observation.
    #[serde(with = "rfc3339")]
    pub first_seen: DateTime<Utc>,
    /// Latest observation.
    #[serde(with = "rfc3339")]
    pub last_seen: DateTime<Utc>,
    /// Expiration reported by the latest observation.
    #[serde(with = "rfc3339")]
    pub expiration: DateTime<Utc>,
}

impl From<DbAsset> for AssetResp {
    fn from(asset: DbAsset) -> Self {
        Self {
            id: asset.vid.to_string(),
            asset_id: asset.asset_id,
            first_seen: asset.time.first_seen,
            last_seen: asset.time.last_seen,
            expiration: asset.time.expiration,
        }
    }
}

/// Body of `POST /v1/assets/bulk`.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkReq {
    /// Assets of the batch, in order.
    pub assets: Vec<BulkAsset>,
}

// ============================================================================
// Relationships
// ============================================================================

/// `parent_of` observation as supplied by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentOfReq {
    /// Observation time; now when absent.
    #[serde(default, with = "rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Expiration of the observation.
    #[serde(with = "rfc3339")]
    pub expiration: DateTime<Utc>,
}

/// Stored `parent_of` edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentOfResp {
    /// Internal edge id.
    pub id: String,
    /// Parent asset id.
    pub parent_id: String,
    /// Child asset id.
    pub child_id: String,
    /// Earliest observation.
    #[serde(with = "rfc3339")]
    pub first_seen: DateTime<Utc>,
    /// Latest observation.
    #[serde(with = "rfc3339")]
    pub last_seen: DateTime<Utc>,
    /// Expiration reported by the latest observation.
    #[serde(with = "rfc3339")]
    pub expiration: DateTime<Utc>,
}

impl From<DbParentOf> for ParentOfResp {
    fn from(edge: DbParentOf) -> Self {
        Self {
            id: edge.eid.to_string(),
            parent_id: edge.parent_vid.to_string(),
            child_id: edge.child_vid.to_string(),
            first_seen: edge.time.first_seen,
            last_seen: edge.time.last_seen,
            expiration: edge.time.expiration,
        }
    }
}

/// Ownership interval as supplied by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnsReq {
    /// Start of the ownership.
    #[serde(with = "rfc3339")]
    pub start_time: DateTime<Utc>,
    /// End of the ownership; `null` while open-ended.
    #[serde(default, with = "rfc3339::option")]
    pub end_time: Option<DateTime<Utc>>,
}

/// Stored `owns` edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnsResp {
    /// Internal edge id.
    pub id: String,
    /// Owning team id.
    pub team_id: String,
    /// Owned asset id.
    pub asset_id: String,
    /// Request fields.
    #[serde(flatten)]
    pub time: OwnsReq,
}

impl From<DbOwns> for OwnsResp {
    fn from(owns: DbOwns) -> Self {
        Self {
            id: owns.eid.to_string(),
            team_id: owns.team_vid.to_string(),
            asset_id: owns.asset_vid.to_string(),
            time: OwnsReq {
                start_time: owns.time.start_time,
                end_time: owns.time.end_time,
            },
        }
    }
}

// ============================================================================
// Universe and queries
// ============================================================================

/// The universe the service writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseResp {
    /// Internal id of the universe vertex.
    pub id: String,
    /// Namespace.
    pub namespace: String,
    /// Version, `major.minor.patch`.
    pub version: String,
}

impl From<DbUniverse> for UniverseResp {
    fn from(universe: DbUniverse) -> Self {
        Self {
            id: universe.vid.to_string(),
            namespace: universe.universe.namespace,
            version: universe.universe.version.to_string(),
        }
    }
}

/// `page`/`size` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    /// Zero-based page.
    pub page: Option<usize>,
    /// Page size.
    pub size: Option<usize>,
}

impl PageParams {
    /// A page when `page` is present, sized [`DEFAULT_PAGE_SIZE`] unless
    /// `size` is given; the full list otherwise.
    #[must_use]
    pub fn page(self) -> Option<PageRequest> {
        self.page
            .map(|page| PageRequest::new(page, self.size.unwrap_or(DEFAULT_PAGE_SIZE)))
    }
}

/// Query parameters of `GET /v1/assets`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetListParams {
    /// Zero-based page.
    pub page: Option<usize>,
    /// Page size.
    pub size: Option<usize>,
    /// Type filter.
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    /// Identifier filter.
    pub identifier: Option<String>,
    /// Validity instant, RFC 3339.
    pub valid_at: Option<String>,
}

impl AssetListParams {
    /// Paging part of the parameters.
    #[must_use]
    pub const fn paging(&self) -> PageParams {
        PageParams {
            page: self.page,
            size: self.size,
        }
    }
}
