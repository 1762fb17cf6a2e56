mod builder;
pub use builder::Builder;

use crate::engine::{AliasCache, AliasMap, Engine, Query};

use arbor_core::{stmt::Request, Document, Result, Schema};
use serde::Serialize;

use std::sync::Arc;

/// A handle for resolving requests against one schema and driver.
///
/// Cloning is cheap; clones share the schema, driver, and alias cache.
#[derive(Debug, Clone)]
pub struct Db {
    engine: Engine,
}

/// Response of a count request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Count {
    pub count: u64,
}

impl Db {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Resolves a request into nested documents.
    pub async fn list(&self, request: Request) -> Result<Vec<Document>> {
        self.engine.list(request).await
    }

    /// Counts the rows matching a request's filters. The preset, sorts,
    /// offset, and limit are ignored.
    pub async fn count(&self, request: Request) -> Result<Count> {
        let count = self.engine.count(request).await?;
        Ok(Count { count })
    }

    /// Returns the alias plan a list request compiles with.
    pub fn plan(&self, request: Request) -> Result<Arc<AliasMap>> {
        let query = Query::list(&self.engine.schema, &self.engine.config, request)?;
        let model = self.engine.schema.model(&query.model)?;
        self.engine.plan(model, &query)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.engine.schema
    }

    /// The alias plan cache, if enabled.
    pub fn alias_cache(&self) -> Option<&Arc<AliasCache>> {
        self.engine.cache.as_ref()
    }
}
