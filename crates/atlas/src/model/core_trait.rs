//! Core Entity Trait - what the mappers need to know about a model type

use std::sync::Arc;

use super::capabilities::{HasIdentity, HasTimestamps};
use crate::mapper::Mapper;
use crate::populate::Properties;

/// A plain model type that can be mapped to and from rows.
///
/// Capabilities default to absent; implement the accessors a model supports.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Accessor table used to populate and extract this model
    fn properties() -> &'static Properties<Self>;

    fn identity(&self) -> Option<&dyn HasIdentity> {
        None
    }

    fn timestamps(&self) -> Option<&dyn HasTimestamps> {
        None
    }

    fn timestamps_mut(&mut self) -> Option<&mut dyn HasTimestamps> {
        None
    }

    /// Mapper responsible for loading this model, if it is bound to one
    fn bound_mapper(&self) -> Option<Arc<dyn Mapper<Self>>> {
        None
    }
}

/// Whether `model` has already been written to the datastore.
///
/// Identity wins when present. A model with timestamps only counts as loaded
/// once it has a creation time. Anything else is never loaded.
pub fn is_loaded<M: Entity>(model: &M) -> bool {
    if let Some(identity) = model.identity() {
        return identity.id().map_or(false, |id| !id.is_null());
    }
    if let Some(timestamps) = model.timestamps() {
        return timestamps.created().is_some();
    }
    false
}
