mod query_sql;
pub use query_sql::QuerySql;

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Execute a SQL query and return its rows
    QuerySql(QuerySql),
}

impl Operation {
    pub fn as_query_sql(&self) -> Option<&QuerySql> {
        match self {
            Operation::QuerySql(query) => Some(query),
        }
    }
}
