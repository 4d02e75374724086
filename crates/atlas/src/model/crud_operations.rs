//! CRUD shortcuts for models that carry their own mapper

use super::core_trait::Entity;
use crate::error::{OrmError, OrmResult};
use crate::query::Select;

/// Save, delete and query directly on a model bound to a mapper.
///
/// Implemented for every [`Entity`]; models without a binding fail with
/// [`OrmError::UnboundModel`].
pub trait Crud: Entity {
    fn save(self) -> OrmResult<Self> {
        let mapper = self.bound_mapper().ok_or(OrmError::UnboundModel)?;
        mapper.save(self)
    }

    fn delete(self) -> OrmResult<Self> {
        let mapper = self.bound_mapper().ok_or(OrmError::UnboundModel)?;
        mapper.delete(self)
    }

    fn query(&self) -> OrmResult<Select<Self>> {
        self.bound_mapper().ok_or(OrmError::UnboundModel)?.start_query()
    }
}

impl<M: Entity> Crud for M {}
