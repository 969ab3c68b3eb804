//! Team upserts and lookups.

use super::{InventoryService, codec, find_linked, vertex_with_label};
use crate::models::{DbTeam, EdgeLabel, ElementId, PageRequest, Team, Universe, VertexLabel};
use crate::services::universe;
use crate::storage::traits::{GraphStore, GraphTxn, Predicate, PropertyUpdate, Vertex, VertexQuery};
use crate::{Error, Result};
use tracing::instrument;

fn team_query(identifier: &str) -> VertexQuery {
    VertexQuery::new(VertexLabel::Team).with(Predicate::equals(codec::keys::IDENTIFIER, identifier))
}

fn linked_team(
    txn: &mut dyn GraphTxn,
    identifier: &str,
    universe_vid: &ElementId,
) -> Result<Option<Vertex>> {
    find_linked(txn, &team_query(identifier), universe_vid, &identifier)
}

fn create_team(txn: &mut dyn GraphTxn, team: &Team, universe_vid: &ElementId) -> Result<DbTeam> {
    let vertex = txn.create_vertex(VertexLabel::Team, codec::team_properties(team))?;
    universe::link_in(txn, universe_vid, &vertex.id)?;
    codec::team_from_vertex(&vertex)
}

fn rename(txn: &mut dyn GraphTxn, vertex: &Vertex, name: &str) -> Result<DbTeam> {
    if vertex.text(codec::keys::NAME)? == name {
        return codec::team_from_vertex(vertex);
    }
    let updated = txn
        .update_vertex_properties(&vertex.id, &[PropertyUpdate::set(codec::keys::NAME, name)])?
        .ok_or_else(|| Error::not_found(&vertex.id))?;
    codec::team_from_vertex(&updated)
}

impl<S: GraphStore> InventoryService<S> {
    /// Creates a team in `universe`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the identifier or name is empty
    /// - [`Error::Conflict`] if the universe already holds a team with the
    ///   same identifier
    #[instrument(skip(self, team), fields(identifier = %team.identifier, universe = %universe))]
    pub fn add_team(&self, team: &Team, universe: &Universe) -> Result<DbTeam> {
        team.validate()?;
        self.store().atomically("add_team", |txn| {
            let universe_vid = universe::ensure_in(txn, universe)?;
            if linked_team(txn, &team.identifier, &universe_vid)?.is_some() {
                return Err(Error::conflict(&team.identifier));
            }
            create_team(txn, team, &universe_vid)
        })
    }

    /// Creates the team in `universe`, or renames the existing one.
    ///
    /// Returns the team and whether it already existed in the universe.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the identifier or name is empty.
    #[instrument(skip(self, team), fields(identifier = %team.identifier, universe = %universe))]
    pub fn set_team(&self, team: &Team, universe: &Universe) -> Result<(DbTeam, bool)> {
        team.validate()?;
        self.store().atomically("set_team", |txn| {
            let universe_vid = universe::ensure_in(txn, universe)?;
            match linked_team(txn, &team.identifier, &universe_vid)? {
                Some(vertex) => Ok((rename(txn, &vertex, &team.name)?, true)),
                None => Ok((create_team(txn, team, &universe_vid)?, false)),
            }
        })
    }

    /// Updates the name of the team stored at `vid`.
    ///
    /// The identifier is immutable: `team.identifier` must match the stored one.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the identifier or name is empty
    /// - [`Error::NotFound`] if `vid` is not a team or its identifier differs
    #[instrument(skip(self, team), fields(vid = %vid))]
    pub fn update_team(&self, vid: &ElementId, team: &Team) -> Result<DbTeam> {
        team.validate()?;
        self.store().atomically("update_team", |txn| {
            let vertex = vertex_with_label(txn, vid, VertexLabel::Team)?;
            if vertex.text(codec::keys::IDENTIFIER)? != team.identifier {
                return Err(Error::not_found(vid));
            }
            rename(txn, &vertex, &team.name)
        })
    }

    /// Deletes the team stored at `vid` along with its edges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `vid` is not a team.
    #[instrument(skip(self), fields(vid = %vid))]
    pub fn drop_team(&self, vid: &ElementId) -> Result<()> {
        self.store().atomically("drop_team", |txn| {
            vertex_with_label(txn, vid, VertexLabel::Team)?;
            match txn.delete_vertex(vid)? {
                0 => Err(Error::not_found(vid)),
                _ => Ok(()),
            }
        })
    }

    /// Returns the team stored at `vid`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `vid` is not a team.
    pub fn team(&self, vid: &ElementId) -> Result<DbTeam> {
        self.store().atomically("team", |txn| {
            codec::team_from_vertex(&vertex_with_label(txn, vid, VertexLabel::Team)?)
        })
    }

    /// Returns the team with `identifier` in `universe`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] naming the identifier if the universe holds
    /// no such team.
    pub fn team_by_identifier(&self, identifier: &str, universe: &Universe) -> Result<DbTeam> {
        self.store().atomically("team_by_identifier", |txn| {
            let Some(universe_vid) = universe::find_in(txn, universe)? else {
                return Err(Error::not_found(identifier));
            };
            let vertex = linked_team(txn, identifier, &universe_vid)?
                .ok_or_else(|| Error::not_found(identifier))?;
            codec::team_from_vertex(&vertex)
        })
    }

    /// Lists the teams of `universe` ordered by internal id.
    ///
    /// With `page` absent the whole list is returned.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub fn teams(&self, universe: &Universe, page: Option<PageRequest>) -> Result<Vec<DbTeam>> {
        self.store().atomically("teams", |txn| {
            let Some(universe_vid) = universe::find_in(txn, universe)? else {
                return Ok(Vec::new());
            };
            let query = VertexQuery::new(VertexLabel::Team)
                .linked_from(EdgeLabel::UniverseOf, universe_vid)
                .page(page);
            txn.find_vertices(&query)?
                .iter()
                .map(codec::team_from_vertex)
                .collect()
        })
    }
}
