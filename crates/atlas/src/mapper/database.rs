//! Pipelined mapper over a named connection
//!
//! Each operation runs through its own pipeline, built on first use:
//!
//! | operation | steps                                   |
//! |-----------|-----------------------------------------|
//! | create    | `timestamps`, `write`                   |
//! | update    | `timestamps`, `write`                   |
//! | delete    | `delete` (final)                        |
//! | load      | `populate`, `after_load`                |
//! | fetch     | `read`, `transform`, `hydrate`          |
//!
//! A [`Mapping`] can reshape any pipeline through its `configure_*` hooks,
//! which run after the defaults are registered.

use std::fmt;
use std::sync::{Arc, Weak};

use chrono::Utc;
use once_cell::sync::OnceCell;

use super::{steps, Mapper, Mapping};
use crate::connection::{Connection, ConnectionManager};
use crate::error::{OrmError, OrmResult};
use crate::model::Entity;
use crate::pipeline::Pipeline;
use crate::query::{CacheLength, Select};
use crate::results::Results;
use crate::value::Row;

/// Value flowing through the fetch pipeline
pub enum Fetched<M: Entity> {
    /// Query waiting to be read
    Query(Select<M>),
    /// Raw rows returned by the connection
    Rows(Vec<Row>),
    /// Rows wrapped for lazy hydration
    Results(Results<M>),
}

impl<M: Entity> Fetched<M> {
    fn stage(&self) -> &'static str {
        match self {
            Fetched::Query(_) => "query",
            Fetched::Rows(_) => "rows",
            Fetched::Results(_) => "results",
        }
    }
}

type ModelPipeline<D> = Pipeline<DatabaseMapper<D>, <D as Mapping>::Model>;
type LoadPipeline<D> = Pipeline<DatabaseMapper<D>, <D as Mapping>::Model, Row>;
type FetchPipeline<D> = Pipeline<DatabaseMapper<D>, Fetched<<D as Mapping>::Model>>;

/// [`Mapper`] implementation driven by a [`Mapping`]
pub struct DatabaseMapper<D: Mapping> {
    mapping: D,
    connections: Arc<ConnectionManager>,
    me: Weak<Self>,
    create_pipeline: OnceCell<ModelPipeline<D>>,
    update_pipeline: OnceCell<ModelPipeline<D>>,
    delete_pipeline: OnceCell<ModelPipeline<D>>,
    load_pipeline: OnceCell<LoadPipeline<D>>,
    fetch_pipeline: OnceCell<FetchPipeline<D>>,
}

impl<D: Mapping> fmt::Debug for DatabaseMapper<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseMapper")
            .field("table", &self.mapping.table_name())
            .field("connection", &self.mapping.connection_name())
            .finish()
    }
}

impl<D: Mapping> DatabaseMapper<D> {
    pub fn new(mapping: D, connections: Arc<ConnectionManager>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            mapping,
            connections,
            me: me.clone(),
            create_pipeline: OnceCell::new(),
            update_pipeline: OnceCell::new(),
            delete_pipeline: OnceCell::new(),
            load_pipeline: OnceCell::new(),
            fetch_pipeline: OnceCell::new(),
        })
    }

    pub fn mapping(&self) -> &D {
        &self.mapping
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    /// The connection named by the mapping
    pub fn connection(&self) -> OrmResult<Arc<Connection>> {
        self.connections.connection(self.mapping.connection_name())
    }

    /// Shared handle to this mapper, as given to queries and results
    pub fn handle(&self) -> Option<Arc<dyn Mapper<D::Model>>> {
        self.me.upgrade().map(|me| me as Arc<dyn Mapper<D::Model>>)
    }

    pub fn create_pipeline(&self) -> OrmResult<&ModelPipeline<D>> {
        self.create_pipeline.get_or_try_init(|| {
            let mut pipeline: ModelPipeline<D> = Pipeline::new();
            pipeline.add_step(steps::TIMESTAMPS, |_: &Self, mut model: D::Model, _: &mut Option<()>| {
                if let Some(timestamps) = model.timestamps_mut() {
                    timestamps.set_created(Utc::now());
                }
                Ok(model)
            })?;
            pipeline.add_step(steps::WRITE, |mapper: &Self, model, _| mapper.write_created(model))?;
            self.mapping.configure_create_pipeline(&mut pipeline)?;
            Ok(pipeline)
        })
    }

    pub fn update_pipeline(&self) -> OrmResult<&ModelPipeline<D>> {
        self.update_pipeline.get_or_try_init(|| {
            let mut pipeline: ModelPipeline<D> = Pipeline::new();
            pipeline.add_step(steps::TIMESTAMPS, |_: &Self, mut model: D::Model, _: &mut Option<()>| {
                if let Some(timestamps) = model.timestamps_mut() {
                    timestamps.set_updated(Utc::now());
                }
                Ok(model)
            })?;
            pipeline.add_step(steps::WRITE, |mapper: &Self, model, _| mapper.write_updated(model))?;
            self.mapping.configure_update_pipeline(&mut pipeline)?;
            Ok(pipeline)
        })
    }

    pub fn delete_pipeline(&self) -> OrmResult<&ModelPipeline<D>> {
        self.delete_pipeline.get_or_try_init(|| {
            let mut pipeline: ModelPipeline<D> = Pipeline::new();
            pipeline.add_final_step(steps::DELETE, |mapper: &Self, model: D::Model, _: &mut Option<()>| {
                mapper.write_deleted(model)
            })?;
            self.mapping.configure_delete_pipeline(&mut pipeline)?;
            Ok(pipeline)
        })
    }

    pub fn load_pipeline(&self) -> OrmResult<&LoadPipeline<D>> {
        self.load_pipeline.get_or_try_init(|| {
            let mut pipeline: LoadPipeline<D> = Pipeline::new();
            pipeline.add_step(steps::POPULATE, |_: &Self, model: D::Model, row: &mut Option<Row>| match row {
                Some(row) => D::Model::properties().populate(model, row),
                None => Ok(model),
            })?;
            pipeline.add_step(steps::AFTER_LOAD, |mapper: &Self, model, row: &mut Option<Row>| {
                let empty = Row::new();
                mapper.mapping.after_load(model, row.as_ref().unwrap_or(&empty))
            })?;
            self.mapping.configure_load_pipeline(&mut pipeline)?;
            Ok(pipeline)
        })
    }

    pub fn fetch_pipeline(&self) -> OrmResult<&FetchPipeline<D>> {
        self.fetch_pipeline.get_or_try_init(|| {
            let mut pipeline: FetchPipeline<D> = Pipeline::new();
            pipeline.add_step(steps::READ, |mapper: &Self, value, _: &mut Option<()>| match value {
                Fetched::Query(query) => mapper.read(&query).map(Fetched::Rows),
                other => Ok(other),
            })?;
            pipeline.add_step(steps::TRANSFORM, |mapper: &Self, value, _| match value {
                Fetched::Rows(rows) => Ok(Fetched::Results(Results::new(
                    mapper.mapping.model_instance(),
                    rows,
                    mapper.handle(),
                ))),
                other => Ok(other),
            })?;
            pipeline.add_step(steps::HYDRATE, |mapper: &Self, value, _| match value {
                Fetched::Results(results) => mapper.mapping.hydrate(results).map(Fetched::Results),
                other => Ok(other),
            })?;
            self.mapping.configure_fetch_pipeline(&mut pipeline)?;
            Ok(pipeline)
        })
    }

    fn write_created(&self, mut model: D::Model) -> OrmResult<D::Model> {
        let table = self.mapping.table_name();
        let properties = D::Model::properties();

        // the id can only be written back through a registered field
        let identity_field = model.identity().map(|identity| identity.identity_field().to_string());
        if let Some(field) = &identity_field {
            if !properties.has_field(field) {
                return Err(OrmError::Configuration(format!(
                    "identity field '{}' of table '{}' is not registered for direct assignment",
                    field, table
                )));
            }
        }

        let data = self.mapping.create_data(&model);
        let id = self.connection()?.insert(table, &data)?;
        tracing::debug!("Created row in {} with id {:?}", table, id);

        match identity_field {
            Some(_) if id.is_null() => {
                tracing::warn!("Insert into {} returned no id; model left without identity", table);
            }
            Some(field) => properties.assign_field(&mut model, &field, &id)?,
            None => {}
        }
        Ok(model)
    }

    fn write_updated(&self, model: D::Model) -> OrmResult<D::Model> {
        let table = self.mapping.table_name();
        let data = self.mapping.update_data(&model);
        let condition = self.mapping.update_condition(&model)?;
        let affected = self.connection()?.update(table, &data, &condition)?;
        tracing::debug!("Updated {} row(s) in {}", affected, table);
        Ok(model)
    }

    fn write_deleted(&self, model: D::Model) -> OrmResult<D::Model> {
        if !self.is_loaded(&model) {
            return Ok(model);
        }
        let table = self.mapping.table_name();
        let condition = self.mapping.delete_condition(&model)?;
        let affected = self.connection()?.delete(table, &condition)?;
        tracing::debug!("Deleted {} row(s) from {}", affected, table);
        Ok(model)
    }

    fn read(&self, query: &Select<D::Model>) -> OrmResult<Vec<Row>> {
        let (sql, params) = query.builder().to_sql_with_params();
        self.connection()?.fetch_all(&sql, &params, query.cache_length())
    }
}

impl<D: Mapping> Mapper<D::Model> for DatabaseMapper<D> {
    fn create(&self, model: D::Model) -> OrmResult<D::Model> {
        self.create_pipeline()?.run(self, model, &mut None)
    }

    fn update(&self, model: D::Model) -> OrmResult<D::Model> {
        self.update_pipeline()?.run(self, model, &mut None)
    }

    fn delete(&self, model: D::Model) -> OrmResult<D::Model> {
        self.delete_pipeline()?.run(self, model, &mut None)
    }

    fn load(&self, model: D::Model, data: &Row) -> OrmResult<D::Model> {
        let mut row = Some(data.clone());
        self.load_pipeline()?.run(self, model, &mut row)
    }

    fn start_query(&self) -> OrmResult<Select<D::Model>> {
        let table = self.mapping.table_name();
        let mut query = Select::new(self.connection()?.dialect())
            .select(&format!("{}.*", table))
            .from(table)
            .cache_for(CacheLength::Never);
        if let Some(handle) = self.handle() {
            query = query.with_mapper(handle);
        }
        Ok(query)
    }

    fn fetch_query(&self, query: &Select<D::Model>) -> OrmResult<Results<D::Model>> {
        match self.fetch_pipeline()?.run(self, Fetched::Query(query.clone()), &mut None)? {
            Fetched::Results(results) => Ok(results),
            other => {
                tracing::warn!("Fetch pipeline for {} ended at the {} stage", self.mapping.table_name(), other.stage());
                Err(OrmError::UnexpectedStage("results"))
            }
        }
    }

    fn fetch_query_raw(&self, query: &Select<D::Model>) -> OrmResult<Vec<Row>> {
        let fetch = self.fetch_pipeline()?;
        match fetch.run_without(&[steps::TRANSFORM], self, Fetched::Query(query.clone()), &mut None)? {
            Fetched::Rows(rows) => Ok(rows),
            other => {
                tracing::warn!("Raw fetch for {} ended at the {} stage", self.mapping.table_name(), other.stage());
                Err(OrmError::UnexpectedStage("rows"))
            }
        }
    }
}
