mod response;
pub use response::Response;

pub mod operation;
pub use operation::Operation;

use crate::{async_trait, Result};

use std::fmt::Debug;

/// A storage backend able to execute compiled statements.
#[async_trait]
pub trait Driver: Debug + Send + Sync + 'static {
    /// Execute a database operation
    async fn exec(&self, op: Operation) -> Result<Response>;
}
