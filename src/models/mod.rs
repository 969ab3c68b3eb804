//! Data models for the inventory.
//!
//! This module contains the caller-facing values (`Asset`, `Team`, ...), their
//! persisted `Db*` forms, and the temporal and universe types they carry.

mod asset;
pub mod graph;
mod query;
mod relationship;
mod team;
pub mod temporal;
mod universe;

pub use asset::{Asset, AssetId, DbAsset};
pub use graph::{EdgeLabel, ElementId, VertexLabel};
pub use query::{AssetFilter, DEFAULT_PAGE_SIZE, PageRequest};
pub use relationship::{DbOwns, DbParentOf, Owns, ParentOf};
pub use team::{DbTeam, Team};
pub use temporal::{Observation, OwnsTime, TimeAttr};
pub use universe::{DEFAULT_NAMESPACE, DEFAULT_VERSION, DbUniverse, Universe, UniverseVersion};
