mod cache;
pub use cache::AliasCache;

mod exec;
mod finalize;

#[cfg(test)]
mod fixture;

mod lower;
mod materialize;

mod plan;
pub use plan::AliasMap;

mod query;
pub(crate) use query::Query;

mod resolve;
mod select;
mod tail;

use crate::{Config, Localizer};

use arbor_core::{driver::Driver, stmt::Request, Document, Result, Schema};

use std::sync::Arc;

/// Request execution state shared by every handle and every tail task.
#[derive(Debug, Clone)]
pub(crate) struct Engine {
    pub(crate) schema: Arc<Schema>,
    pub(crate) driver: Arc<dyn Driver>,
    pub(crate) config: Arc<Config>,
    pub(crate) localizer: Option<Arc<dyn Localizer>>,
    pub(crate) cache: Option<Arc<AliasCache>>,
}

impl Engine {
    pub(crate) async fn list(&self, request: Request) -> Result<Vec<Document>> {
        let query = Query::list(&self.schema, &self.config, request)?;
        self.resolve(query).await
    }

    pub(crate) async fn count(&self, request: Request) -> Result<u64> {
        let query = Query::count(&self.schema, request)?;
        self.resolve_count(query).await
    }
}
