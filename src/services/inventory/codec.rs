//! Conversions between inventory records and stored graph elements.

use crate::models::{
    AssetId, DbAsset, DbOwns, DbParentOf, DbTeam, DbUniverse, OwnsTime, Team, TimeAttr, Universe,
    UniverseVersion,
};
use crate::storage::traits::{Edge, Properties, PropertyUpdate, Vertex};
use crate::Result;
use chrono::{DateTime, Utc};

/// Property keys of the persisted schema.
pub mod keys {
    /// Asset type.
    pub const TYPE: &str = "type";
    /// Asset or team identifier.
    pub const IDENTIFIER: &str = "identifier";
    /// Team name.
    pub const NAME: &str = "name";
    /// Window start.
    pub const FIRST_SEEN: &str = "first_seen";
    /// Latest observation.
    pub const LAST_SEEN: &str = "last_seen";
    /// Window expiration.
    pub const EXPIRATION: &str = "expiration";
    /// Ownership start.
    pub const START_TIME: &str = "start_time";
    /// Ownership end; absent while open-ended.
    pub const END_TIME: &str = "end_time";
    /// Universe namespace.
    pub const NAMESPACE: &str = "namespace";
    /// Universe version, integer encoded.
    pub const VERSION: &str = "version";
}

pub fn team_properties(team: &Team) -> Properties {
    let mut properties = Properties::new();
    properties.insert(keys::IDENTIFIER.to_string(), team.identifier.as_str().into());
    properties.insert(keys::NAME.to_string(), team.name.as_str().into());
    properties
}

pub fn team_from_vertex(vertex: &Vertex) -> Result<DbTeam> {
    Ok(DbTeam {
        vid: vertex.id.clone(),
        identifier: vertex.text(keys::IDENTIFIER)?.to_string(),
        name: vertex.text(keys::NAME)?.to_string(),
    })
}

pub fn time_updates(time: &TimeAttr) -> Vec<PropertyUpdate> {
    vec![
        PropertyUpdate::set(keys::FIRST_SEEN, time.first_seen),
        PropertyUpdate::set(keys::LAST_SEEN, time.last_seen),
        PropertyUpdate::set(keys::EXPIRATION, time.expiration),
    ]
}

pub fn time_properties(time: &TimeAttr) -> Properties {
    let mut properties = Properties::new();
    for update in time_updates(time) {
        update.apply(&mut properties);
    }
    properties
}

fn time_attr(
    first_seen: Result<DateTime<Utc>>,
    last_seen: Result<DateTime<Utc>>,
    expiration: Result<DateTime<Utc>>,
) -> Result<TimeAttr> {
    Ok(TimeAttr {
        first_seen: first_seen?,
        last_seen: last_seen?,
        expiration: expiration?,
    })
}

pub fn asset_properties(asset_id: &AssetId, time: &TimeAttr) -> Properties {
    let mut properties = time_properties(time);
    properties.insert(keys::TYPE.to_string(), asset_id.asset_type.as_str().into());
    properties.insert(keys::IDENTIFIER.to_string(), asset_id.identifier.as_str().into());
    properties
}

pub fn asset_from_vertex(vertex: &Vertex) -> Result<DbAsset> {
    Ok(DbAsset {
        vid: vertex.id.clone(),
        asset_id: AssetId::new(vertex.text(keys::TYPE)?, vertex.text(keys::IDENTIFIER)?),
        time: time_attr(
            vertex.time(keys::FIRST_SEEN),
            vertex.time(keys::LAST_SEEN),
            vertex.time(keys::EXPIRATION),
        )?,
    })
}

pub fn parent_of_from_edge(edge: &Edge) -> Result<DbParentOf> {
    Ok(DbParentOf {
        eid: edge.id.clone(),
        parent_vid: edge.from.clone(),
        child_vid: edge.to.clone(),
        time: time_attr(
            edge.time(keys::FIRST_SEEN),
            edge.time(keys::LAST_SEEN),
            edge.time(keys::EXPIRATION),
        )?,
    })
}

/// Overwrites the ownership interval; a missing `end_time` clears the stored one.
pub fn owns_time_updates(time: &OwnsTime) -> Vec<PropertyUpdate> {
    vec![
        PropertyUpdate::set(keys::START_TIME, time.start_time),
        time.end_time.map_or_else(
            || PropertyUpdate::remove(keys::END_TIME),
            |end| PropertyUpdate::set(keys::END_TIME, end),
        ),
    ]
}

pub fn owns_properties(time: &OwnsTime) -> Properties {
    let mut properties = Properties::new();
    for update in owns_time_updates(time) {
        update.apply(&mut properties);
    }
    properties
}

pub fn owns_from_edge(edge: &Edge) -> Result<DbOwns> {
    Ok(DbOwns {
        eid: edge.id.clone(),
        team_vid: edge.from.clone(),
        asset_vid: edge.to.clone(),
        time: OwnsTime {
            start_time: edge.time(keys::START_TIME)?,
            end_time: edge.opt_time(keys::END_TIME)?,
        },
    })
}

pub fn universe_from_vertex(vertex: &Vertex) -> Result<DbUniverse> {
    Ok(DbUniverse {
        vid: vertex.id.clone(),
        universe: Universe::new(
            vertex.text(keys::NAMESPACE)?,
            UniverseVersion::from_int(vertex.int(keys::VERSION)?)?,
        ),
    })
}
