//! Lazily hydrated query results
//!
//! `Results` keeps raw rows and builds model instances only when an index is
//! first read. Each built instance is cloned from a template model and is
//! memoized, so reading an index twice returns the same instance.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::OrmResult;
use crate::mapper::Mapper;
use crate::model::Entity;
use crate::value::Row;

/// Something that can be stored at an index of a [`Results`]
#[derive(Debug, Clone)]
pub enum Entry<M> {
    /// Raw row, hydrated on the next read
    Row(Row),
    /// Already built model instance
    Model(M),
}

impl<M> From<Row> for Entry<M> {
    fn from(row: Row) -> Self {
        Entry::Row(row)
    }
}

/// Result set of a single query execution
pub struct Results<M: Entity> {
    template: M,
    rows: BTreeMap<usize, Row>,
    built: BTreeMap<usize, M>,
    mapper: Option<Arc<dyn Mapper<M>>>,
    pointer: usize,
}

impl<M: Entity + fmt::Debug> fmt::Debug for Results<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Results")
            .field("template", &self.template)
            .field("rows", &self.rows)
            .field("built", &self.built)
            .field("has_mapper", &self.mapper.is_some())
            .field("pointer", &self.pointer)
            .finish()
    }
}

impl<M: Entity> Results<M> {
    pub fn new(template: M, rows: Vec<Row>, mapper: Option<Arc<dyn Mapper<M>>>) -> Self {
        Self {
            template,
            rows: rows.into_iter().enumerate().collect(),
            built: BTreeMap::new(),
            mapper,
            pointer: 0,
        }
    }

    /// Number of raw rows; directly assigned models are not counted
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether a raw row is stored at `index`
    pub fn contains(&self, index: usize) -> bool {
        self.rows.contains_key(&index)
    }

    pub fn template(&self) -> &M {
        &self.template
    }

    /// Model at `index`, building it on first access
    pub fn get(&mut self, index: usize) -> OrmResult<Option<&M>> {
        self.build(index)?;
        Ok(self.built.get(&index))
    }

    pub fn get_mut(&mut self, index: usize) -> OrmResult<Option<&mut M>> {
        self.build(index)?;
        Ok(self.built.get_mut(&index))
    }

    pub fn get_first(&mut self) -> OrmResult<Option<&M>> {
        self.get(0)
    }

    /// Consume the results, returning the model at index zero
    pub fn into_first(mut self) -> OrmResult<Option<M>> {
        self.build(0)?;
        Ok(self.built.remove(&0))
    }

    /// Store a row or a model at `index`.
    ///
    /// A row replaces any model already built there. A model is stored as built
    /// and leaves the raw row alone.
    pub fn set(&mut self, index: usize, entry: impl Into<Entry<M>>) {
        match entry.into() {
            Entry::Row(row) => {
                self.rows.insert(index, row);
                self.built.remove(&index);
            }
            Entry::Model(model) => {
                self.built.insert(index, model);
            }
        }
    }

    pub fn set_model(&mut self, index: usize, model: M) {
        self.set(index, Entry::Model(model));
    }

    /// Remove both the raw row and any built model at `index`
    pub fn unset(&mut self, index: usize) {
        self.rows.remove(&index);
        self.built.remove(&index);
    }

    pub fn rewind(&mut self) {
        self.pointer = 0;
    }

    pub fn valid(&self) -> bool {
        self.pointer < self.count()
    }

    pub fn key(&self) -> usize {
        self.pointer
    }

    pub fn current(&mut self) -> OrmResult<Option<&M>> {
        self.get(self.pointer)
    }

    pub fn advance(&mut self) {
        self.pointer += 1;
    }

    fn build(&mut self, index: usize) -> OrmResult<()> {
        if self.built.contains_key(&index) {
            return Ok(());
        }
        if let Some(row) = self.rows.get(&index) {
            let model = self.hydrate(row)?;
            self.built.insert(index, model);
        }
        Ok(())
    }

    /// Model-bound mapper first, then the collection's mapper, then the
    /// model's property table
    fn hydrate(&self, row: &Row) -> OrmResult<M> {
        let instance = self.template.clone();
        if let Some(mapper) = instance.bound_mapper() {
            return mapper.load(instance, row);
        }
        if let Some(mapper) = &self.mapper {
            return mapper.load(instance, row);
        }
        M::properties().populate(instance, row)
    }
}

impl<M: Entity> IntoIterator for Results<M> {
    type Item = OrmResult<M>;
    type IntoIter = IntoIter<M>;

    fn into_iter(self) -> Self::IntoIter {
        let mut indices: Vec<usize> = self.rows.keys().chain(self.built.keys()).copied().collect();
        indices.sort_unstable();
        indices.dedup();
        IntoIter {
            results: self,
            indices: indices.into_iter(),
        }
    }
}

/// Owning iterator over a [`Results`], in ascending index order
pub struct IntoIter<M: Entity> {
    results: Results<M>,
    indices: std::vec::IntoIter<usize>,
}

impl<M: Entity> Iterator for IntoIter<M> {
    type Item = OrmResult<M>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.indices.next()?;
        if let Some(model) = self.results.built.remove(&index) {
            return Some(Ok(model));
        }
        let row = self.results.rows.remove(&index)?;
        Some(self.results.hydrate(&row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }
}
