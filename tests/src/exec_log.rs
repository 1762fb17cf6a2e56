use crate::DriverOp;

use arbor_core::{driver::operation::QuerySql, Value};

use std::sync::{Arc, Mutex};

/// A wrapper around the operations log that provides a clean API for tests
pub struct ExecLog {
    ops: Arc<Mutex<Vec<DriverOp>>>,
}

impl ExecLog {
    pub(crate) fn new(ops: Arc<Mutex<Vec<DriverOp>>>) -> Self {
        Self { ops }
    }

    /// Get the number of logged statements
    pub fn len(&self) -> usize {
        self.ops.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.lock().unwrap().is_empty()
    }

    /// SQL text of every statement, in execution order
    pub fn sql(&self) -> Vec<String> {
        self.with_ops(|ops| {
            ops.iter()
                .filter_map(|op| op.operation.as_query_sql())
                .map(|query| query.sql.clone())
                .collect()
        })
    }

    /// The first statement whose SQL contains `pattern`
    pub fn find(&self, pattern: &str) -> Option<QuerySql> {
        self.with_ops(|ops| {
            ops.iter()
                .filter_map(|op| op.operation.as_query_sql())
                .find(|query| query.sql.contains(pattern))
                .cloned()
        })
    }

    /// Parameters of the first statement whose SQL contains `pattern`
    pub fn params(&self, pattern: &str) -> Option<Vec<Value>> {
        self.find(pattern).map(|query| query.params)
    }

    /// Count statements whose SQL contains `pattern`
    pub fn count(&self, pattern: &str) -> usize {
        self.with_ops(|ops| {
            ops.iter()
                .filter_map(|op| op.operation.as_query_sql())
                .filter(|query| query.sql.contains(pattern))
                .count()
        })
    }

    /// Count statements that failed
    pub fn failures(&self) -> usize {
        self.with_ops(|ops| ops.iter().filter(|op| op.response.is_none()).count())
    }

    /// Clear the log
    pub fn clear(&mut self) {
        self.ops.lock().unwrap().clear();
    }

    /// Get access to all operations for custom assertions
    pub fn with_ops<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[DriverOp]) -> R,
    {
        let ops = self.ops.lock().unwrap();
        f(&ops)
    }
}
