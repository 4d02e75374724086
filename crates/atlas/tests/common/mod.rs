#![allow(dead_code)]

use std::sync::Arc;

use atlas::model::datetime_from_value;
use atlas::{
    Connection, ConnectionManager, DatabaseMapper, DatabaseValue, Entity, FieldMap, HasIdentity, HasTimestamps,
    Mapper, Mapping, OrmResult, Properties, QueryLog, Timestamps,
};
use once_cell::sync::{Lazy, OnceCell};

/// Fresh in-memory database with the fixture tables, registered as "default"
pub fn manager() -> (Arc<ConnectionManager>, Arc<Connection>) {
    let manager = Arc::new(ConnectionManager::new());
    let connection = manager.register(
        "default",
        Connection::connect("sqlite::memory:").expect("sqlite connection"),
    );
    for statement in [
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name varchar(32))",
        "CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER, total FLOAT)",
        "CREATE TABLE posts (id INTEGER PRIMARY KEY, title varchar(64), created TEXT, updated TEXT)",
        "CREATE TABLE tags (label varchar(32), created TEXT, updated TEXT)",
    ] {
        connection.execute(statement, &[]).expect("fixture table");
    }
    (manager, connection)
}

/// Attach a fresh query log to `connection`
pub fn log(connection: &Connection) -> Arc<QueryLog> {
    let log = Arc::new(QueryLog::new());
    connection.set_logger(log.clone());
    log
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: Option<i64>,
    pub name: String,
}

impl User {
    pub fn named(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
        }
    }
}

impl HasIdentity for User {
    fn id(&self) -> Option<DatabaseValue> {
        self.id.map(DatabaseValue::from)
    }
}

impl Entity for User {
    fn properties() -> &'static Properties<Self> {
        static PROPERTIES: Lazy<Properties<User>> = Lazy::new(|| {
            Properties::new()
                .field("id", |u: &User| &u.id, |u: &mut User| &mut u.id)
                .field("name", |u: &User| &u.name, |u: &mut User| &mut u.name)
        });
        &PROPERTIES
    }

    fn identity(&self) -> Option<&dyn HasIdentity> {
        Some(self)
    }
}

#[derive(Debug, Default)]
pub struct UserMapping;

impl Mapping for UserMapping {
    type Model = User;

    fn table_name(&self) -> &str {
        "users"
    }

    fn model_instance(&self) -> User {
        User::default()
    }

    fn create_data(&self, model: &User) -> FieldMap {
        User::properties().extract(model, &["name"])
    }

    fn update_data(&self, model: &User) -> FieldMap {
        User::properties().extract(model, &["name"])
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Order {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub total: f64,
}

impl HasIdentity for Order {
    fn id(&self) -> Option<DatabaseValue> {
        self.id.map(DatabaseValue::from)
    }
}

impl Entity for Order {
    fn properties() -> &'static Properties<Self> {
        static PROPERTIES: Lazy<Properties<Order>> = Lazy::new(|| {
            Properties::new()
                .field("id", |o: &Order| &o.id, |o: &mut Order| &mut o.id)
                .field("user_id", |o: &Order| &o.user_id, |o: &mut Order| &mut o.user_id)
                .field("total", |o: &Order| &o.total, |o: &mut Order| &mut o.total)
        });
        &PROPERTIES
    }

    fn identity(&self) -> Option<&dyn HasIdentity> {
        Some(self)
    }
}

#[derive(Debug, Default)]
pub struct OrderMapping;

impl Mapping for OrderMapping {
    type Model = Order;

    fn table_name(&self) -> &str {
        "orders"
    }

    fn model_instance(&self) -> Order {
        Order::default()
    }

    fn create_data(&self, model: &Order) -> FieldMap {
        Order::properties().extract(model, &["user_id", "total"])
    }

    fn update_data(&self, model: &Order) -> FieldMap {
        Order::properties().extract(model, &["user_id", "total"])
    }
}

/// Identity plus timestamps, populated through setters
#[derive(Debug, Clone, Default)]
pub struct Post {
    pub id: Option<i64>,
    pub title: String,
    pub timestamps: Timestamps,
}

impl HasIdentity for Post {
    fn id(&self) -> Option<DatabaseValue> {
        self.id.map(DatabaseValue::from)
    }
}

impl Entity for Post {
    fn properties() -> &'static Properties<Self> {
        static PROPERTIES: Lazy<Properties<Post>> = Lazy::new(|| {
            Properties::new()
                .field("id", |p: &Post| &p.id, |p: &mut Post| &mut p.id)
                .field("title", |p: &Post| &p.title, |p: &mut Post| &mut p.title)
                .setter("set_created", |p: &mut Post, value: DatabaseValue| {
                    if let Ok(at) = datetime_from_value(&value) {
                        p.timestamps.set_created(at);
                    }
                })
                .setter("set_updated", |p: &mut Post, value: DatabaseValue| {
                    if let Ok(at) = datetime_from_value(&value) {
                        p.timestamps.set_updated(at);
                    }
                })
        });
        &PROPERTIES
    }

    fn identity(&self) -> Option<&dyn HasIdentity> {
        Some(self)
    }

    fn timestamps(&self) -> Option<&dyn HasTimestamps> {
        Some(&self.timestamps)
    }

    fn timestamps_mut(&mut self) -> Option<&mut dyn HasTimestamps> {
        Some(&mut self.timestamps)
    }
}

fn timestamp_fields(timestamps: &Timestamps) -> FieldMap {
    let mut data = FieldMap::new();
    data.insert("created".into(), timestamps.created.into());
    data.insert("updated".into(), timestamps.updated.into());
    data
}

#[derive(Debug, Default)]
pub struct PostMapping;

impl Mapping for PostMapping {
    type Model = Post;

    fn table_name(&self) -> &str {
        "posts"
    }

    fn model_instance(&self) -> Post {
        Post::default()
    }

    fn create_data(&self, model: &Post) -> FieldMap {
        let mut data = Post::properties().extract(model, &["title"]);
        data.extend(timestamp_fields(&model.timestamps));
        data
    }

    fn update_data(&self, model: &Post) -> FieldMap {
        self.create_data(model)
    }
}

/// Timestamps without identity: cannot be updated or deleted
#[derive(Debug, Clone, Default)]
pub struct Tag {
    pub label: String,
    pub timestamps: Timestamps,
}

impl Entity for Tag {
    fn properties() -> &'static Properties<Self> {
        static PROPERTIES: Lazy<Properties<Tag>> = Lazy::new(|| {
            Properties::new().field("label", |t: &Tag| &t.label, |t: &mut Tag| &mut t.label)
        });
        &PROPERTIES
    }

    fn timestamps(&self) -> Option<&dyn HasTimestamps> {
        Some(&self.timestamps)
    }

    fn timestamps_mut(&mut self) -> Option<&mut dyn HasTimestamps> {
        Some(&mut self.timestamps)
    }
}

#[derive(Debug, Default)]
pub struct TagMapping;

impl Mapping for TagMapping {
    type Model = Tag;

    fn table_name(&self) -> &str {
        "tags"
    }

    fn model_instance(&self) -> Tag {
        Tag::default()
    }

    fn create_data(&self, model: &Tag) -> FieldMap {
        let mut data = Tag::properties().extract(model, &["label"]);
        data.extend(timestamp_fields(&model.timestamps));
        data
    }

    fn update_data(&self, model: &Tag) -> FieldMap {
        self.create_data(model)
    }
}

/// A model carrying its own mapper, for the `Crud` shortcuts.
///
/// The mapper is installed once per test binary through [`bind_accounts`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Account {
    pub id: Option<i64>,
    pub name: String,
}

static ACCOUNT_MAPPER: OnceCell<Arc<dyn Mapper<Account>>> = OnceCell::new();

impl HasIdentity for Account {
    fn id(&self) -> Option<DatabaseValue> {
        self.id.map(DatabaseValue::from)
    }
}

impl Entity for Account {
    fn properties() -> &'static Properties<Self> {
        static PROPERTIES: Lazy<Properties<Account>> = Lazy::new(|| {
            Properties::new()
                .field("id", |a: &Account| &a.id, |a: &mut Account| &mut a.id)
                .field("name", |a: &Account| &a.name, |a: &mut Account| &mut a.name)
        });
        &PROPERTIES
    }

    fn identity(&self) -> Option<&dyn HasIdentity> {
        Some(self)
    }

    fn bound_mapper(&self) -> Option<Arc<dyn Mapper<Self>>> {
        ACCOUNT_MAPPER.get().cloned()
    }
}

#[derive(Debug, Default)]
pub struct AccountMapping;

impl Mapping for AccountMapping {
    type Model = Account;

    fn table_name(&self) -> &str {
        "users"
    }

    fn model_instance(&self) -> Account {
        Account::default()
    }

    fn create_data(&self, model: &Account) -> FieldMap {
        Account::properties().extract(model, &["name"])
    }

    fn update_data(&self, model: &Account) -> FieldMap {
        Account::properties().extract(model, &["name"])
    }

    fn after_load(&self, mut model: Account, _data: &atlas::Row) -> OrmResult<Account> {
        model.name = model.name.to_uppercase();
        Ok(model)
    }
}

/// Bind `Account` to a mapper over its own in-memory database
pub fn bind_accounts() -> Arc<dyn Mapper<Account>> {
    ACCOUNT_MAPPER
        .get_or_init(|| {
            let (manager, _) = manager();
            DatabaseMapper::new(AccountMapping, manager)
        })
        .clone()
}
