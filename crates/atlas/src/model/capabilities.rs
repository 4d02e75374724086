//! Optional capabilities a model can expose to its mapper
//!
//! Both are independent: a model may implement neither, either or both, and
//! hands them out through `Entity::identity` and `Entity::timestamps`.

use chrono::{DateTime, Utc};

use crate::value::DatabaseValue;

/// A model persisted under a single identifier column
pub trait HasIdentity {
    /// Current identifier, `None` until the model has been stored
    fn id(&self) -> Option<DatabaseValue>;

    /// Name of the field (and column) holding the identifier
    fn identity_field(&self) -> &str {
        "id"
    }
}

/// A model tracking when it was created and last updated in the datastore
pub trait HasTimestamps {
    fn created(&self) -> Option<DateTime<Utc>>;

    fn set_created(&mut self, at: DateTime<Utc>);

    fn updated(&self) -> Option<DateTime<Utc>>;

    fn set_updated(&mut self, at: DateTime<Utc>);
}
