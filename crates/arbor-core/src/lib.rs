pub mod driver;
pub use driver::Driver;

mod error;
pub use error::{Error, IntoError};

pub mod schema;
pub use schema::Schema;

pub mod stmt;

pub mod template;

mod value;
pub use value::{Document, Value};

pub use async_trait::async_trait;

/// A Result type alias that uses arbor's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
