use super::Operation;

use crate::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct QuerySql {
    /// SQL text with positional placeholders
    pub sql: String,

    /// Arguments bound to the placeholders, in order
    pub params: Vec<Value>,
}

impl QuerySql {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> QuerySql {
        QuerySql {
            sql: sql.into(),
            params,
        }
    }
}

impl From<QuerySql> for Operation {
    fn from(value: QuerySql) -> Self {
        Self::QuerySql(value)
    }
}
