use super::Engine;

use arbor_core::{driver::operation::QuerySql, Result, Value};
use arbor_sql::{stmt::Select, Serializer, Statement};

impl Engine {
    /// Serializes `select` and runs it on the driver.
    pub(super) async fn exec(&self, select: Select) -> Result<Vec<Vec<Value>>> {
        let mut params: Vec<Value> = vec![];
        let sql = Serializer::postgresql().serialize(&Statement::from(select), &mut params);

        tracing::debug!(%sql, ?params, "executing query");

        let response = self.driver.exec(QuerySql::new(sql, params).into()).await?;
        let rows = response.into_rows();

        tracing::trace!(rows = rows.len(), "query returned");
        Ok(rows)
    }
}
