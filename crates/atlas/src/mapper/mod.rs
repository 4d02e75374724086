//! Mappers - move models in and out of the database
//!
//! [`Mapper`] is the object-safe interface queries, results and models talk
//! to. [`DatabaseMapper`] implements it on top of a [`Mapping`], which
//! describes one table: its name, the data written on create and update, and
//! optional hooks into each operation's pipeline.

pub mod database;

pub use database::{DatabaseMapper, Fetched};

use crate::error::{OrmError, OrmResult};
use crate::model::{is_loaded, Entity};
use crate::pipeline::Pipeline;
use crate::query::Select;
use crate::results::Results;
use crate::value::{DatabaseValue, FieldMap, Row};

/// Connection used when a mapping does not name one
pub const DEFAULT_CONNECTION: &str = "default";

/// Pipeline step names registered by [`DatabaseMapper`]
pub mod steps {
    pub const TIMESTAMPS: &str = "timestamps";
    pub const WRITE: &str = "write";
    pub const DELETE: &str = "delete";
    pub const POPULATE: &str = "populate";
    pub const AFTER_LOAD: &str = "after_load";
    pub const READ: &str = "read";
    pub const TRANSFORM: &str = "transform";
    pub const HYDRATE: &str = "hydrate";
}

/// Persistence operations for one model type
pub trait Mapper<M: Entity>: Send + Sync {
    /// Update a loaded model, create anything else
    fn save(&self, model: M) -> OrmResult<M> {
        if self.is_loaded(&model) {
            self.update(model)
        } else {
            self.create(model)
        }
    }

    fn is_loaded(&self, model: &M) -> bool {
        is_loaded(model)
    }

    fn create(&self, model: M) -> OrmResult<M>;

    fn update(&self, model: M) -> OrmResult<M>;

    /// Delete a loaded model; anything else is returned untouched
    fn delete(&self, model: M) -> OrmResult<M>;

    /// Populate `model` from a raw row
    fn load(&self, model: M, data: &Row) -> OrmResult<M>;

    /// A select over this mapper's table, bound to this mapper
    fn start_query(&self) -> OrmResult<Select<M>>;

    fn fetch_query(&self, query: &Select<M>) -> OrmResult<Results<M>>;

    /// Raw rows for `query`, skipping hydration into a result set
    fn fetch_query_raw(&self, query: &Select<M>) -> OrmResult<Vec<Row>>;
}

/// Equality condition on the model's identity field
pub fn identity_condition<M: Entity>(model: &M, operation: &'static str, table: &str) -> OrmResult<FieldMap> {
    let identity = model
        .identity()
        .ok_or_else(|| OrmError::missing_identity(operation, table))?;
    let mut condition = FieldMap::new();
    condition.insert(
        identity.identity_field().to_string(),
        identity.id().unwrap_or(DatabaseValue::Null),
    );
    Ok(condition)
}

/// Table description driving a [`DatabaseMapper`]
pub trait Mapping: Send + Sync + Sized + 'static {
    type Model: Entity;

    fn table_name(&self) -> &str;

    fn connection_name(&self) -> &str {
        DEFAULT_CONNECTION
    }

    /// Template instance cloned for every fetched row
    fn model_instance(&self) -> Self::Model;

    /// Columns written on create.
    ///
    /// Models with identity must register their identity field with
    /// `Properties::field`; creating one that does not fails before the insert.
    fn create_data(&self, model: &Self::Model) -> FieldMap;

    fn update_data(&self, model: &Self::Model) -> FieldMap;

    fn update_condition(&self, model: &Self::Model) -> OrmResult<FieldMap> {
        identity_condition(model, "an update", self.table_name())
    }

    fn delete_condition(&self, model: &Self::Model) -> OrmResult<FieldMap> {
        identity_condition(model, "a delete", self.table_name())
    }

    /// Runs after a model has been populated from a row
    fn after_load(&self, model: Self::Model, _data: &Row) -> OrmResult<Self::Model> {
        Ok(model)
    }

    /// Post-processing of every fetched result set
    fn hydrate(&self, results: Results<Self::Model>) -> OrmResult<Results<Self::Model>> {
        Ok(results)
    }

    fn configure_create_pipeline(&self, _pipeline: &mut Pipeline<DatabaseMapper<Self>, Self::Model>) -> OrmResult<()> {
        Ok(())
    }

    fn configure_update_pipeline(&self, _pipeline: &mut Pipeline<DatabaseMapper<Self>, Self::Model>) -> OrmResult<()> {
        Ok(())
    }

    fn configure_delete_pipeline(&self, _pipeline: &mut Pipeline<DatabaseMapper<Self>, Self::Model>) -> OrmResult<()> {
        Ok(())
    }

    fn configure_load_pipeline(
        &self,
        _pipeline: &mut Pipeline<DatabaseMapper<Self>, Self::Model, Row>,
    ) -> OrmResult<()> {
        Ok(())
    }

    fn configure_fetch_pipeline(
        &self,
        _pipeline: &mut Pipeline<DatabaseMapper<Self>, Fetched<Self::Model>>,
    ) -> OrmResult<()> {
        Ok(())
    }
}
