pub mod config;
pub use config::{CacheConfig, Config};

pub mod db;
pub use db::{Count, Db};

mod engine;
pub use engine::{AliasCache, AliasMap};

pub mod localize;
pub use localize::{Catalog, Localizer};

pub use arbor_core::{
    driver::Driver,
    schema::Schema,
    stmt::Request,
    Document, Error, Result, Value,
};
