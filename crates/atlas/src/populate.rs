//! Property tables: how raw rows are written into models and read back out
//!
//! A model registers named setters, getters and plain fields once, usually in a
//! `once_cell::sync::Lazy` static returned from `Entity::properties`. Setter and
//! getter names are stored in lowerCamelCase, so `"set_name"` and `"setName"`
//! register the same setter.
//!
//! Population prefers the setter `set<Key>` for each column and falls back to
//! the field named exactly like the column. Columns matching neither are
//! ignored.

use std::collections::HashMap;
use std::fmt;

use crate::error::{OrmError, OrmResult};
use crate::util::snake_to_camel;
use crate::value::{DatabaseValue, FieldMap, FromValue, Row};

type WriteFn<M> = Box<dyn Fn(&mut M, &DatabaseValue) -> OrmResult<()> + Send + Sync>;
type ReadFn<M> = Box<dyn Fn(&M) -> DatabaseValue + Send + Sync>;

struct FieldAccess<M> {
    read: ReadFn<M>,
    write: WriteFn<M>,
}

/// Registered accessors for one model type
pub struct Properties<M> {
    setters: HashMap<String, WriteFn<M>>,
    getters: HashMap<String, ReadFn<M>>,
    fields: HashMap<String, FieldAccess<M>>,
}

impl<M> fmt::Debug for Properties<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Properties")
            .field("setters", &self.setters.keys().collect::<Vec<_>>())
            .field("getters", &self.getters.keys().collect::<Vec<_>>())
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<M: 'static> Default for Properties<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: 'static> Properties<M> {
    pub fn new() -> Self {
        Self {
            setters: HashMap::new(),
            getters: HashMap::new(),
            fields: HashMap::new(),
        }
    }

    /// Register a setter method such as `"set_name"`
    pub fn setter<T, F>(mut self, method: &str, setter: F) -> Self
    where
        T: FromValue,
        F: Fn(&mut M, T) + Send + Sync + 'static,
    {
        self.setters.insert(
            snake_to_camel(method, ""),
            Box::new(move |model, value| {
                setter(model, T::from_value(value)?);
                Ok(())
            }),
        );
        self
    }

    /// Register a getter method such as `"get_name"`
    pub fn getter<T, F>(mut self, method: &str, getter: F) -> Self
    where
        T: Into<DatabaseValue>,
        F: Fn(&M) -> T + Send + Sync + 'static,
    {
        self.getters
            .insert(snake_to_camel(method, ""), Box::new(move |model| getter(model).into()));
        self
    }

    /// Register a plain field, accessed directly without going through methods
    pub fn field<T>(mut self, name: &str, get: fn(&M) -> &T, get_mut: fn(&mut M) -> &mut T) -> Self
    where
        T: FromValue + Clone + Into<DatabaseValue> + 'static,
    {
        self.fields.insert(
            name.to_string(),
            FieldAccess {
                read: Box::new(move |model| get(model).clone().into()),
                write: Box::new(move |model, value| {
                    *get_mut(model) = T::from_value(value)?;
                    Ok(())
                }),
            },
        );
        self
    }

    pub fn has_setter(&self, method: &str) -> bool {
        self.setters.contains_key(&snake_to_camel(method, ""))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Write every column of `data` into `model`
    pub fn populate(&self, mut model: M, data: &Row) -> OrmResult<M> {
        for (key, value) in data {
            if let Some(setter) = self.setters.get(&snake_to_camel(key, "set")) {
                setter(&mut model, value)?;
            } else if let Some(field) = self.fields.get(key.as_str()) {
                (field.write)(&mut model, value)?;
            }
        }
        Ok(model)
    }

    /// Read the named properties back out, getter first then field
    pub fn extract(&self, model: &M, names: &[&str]) -> FieldMap {
        let mut out = FieldMap::new();
        for name in names {
            if let Some(getter) = self.getters.get(&snake_to_camel(name, "get")) {
                out.insert(name.to_string(), getter(model));
            } else if let Some(field) = self.fields.get(*name) {
                out.insert(name.to_string(), (field.read)(model));
            }
        }
        out
    }

    /// Assign a field directly, bypassing any setter
    pub fn assign_field(&self, model: &mut M, name: &str, value: &DatabaseValue) -> OrmResult<()> {
        let field = self.fields.get(name).ok_or_else(|| {
            OrmError::Configuration(format!("field '{}' is not registered for direct assignment", name))
        })?;
        (field.write)(model, value)
    }
}
