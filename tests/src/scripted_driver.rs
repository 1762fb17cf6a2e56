use crate::ExecLog;

use arbor_core::{
    async_trait,
    driver::{operation::QuerySql, Driver, Operation, Response},
    Error, Result, Value,
};

use std::{
    io,
    sync::{Arc, Mutex},
};

/// A driver answering statements from canned responses.
///
/// Each rule matches statements whose SQL contains a pattern; the first
/// matching rule answers. Statements no rule matches return no rows. Every
/// executed statement is logged.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDriver {
    rules: Arc<Mutex<Vec<Rule>>>,

    /// Log of all operations executed through this driver
    ops_log: Arc<Mutex<Vec<DriverOp>>>,
}

#[derive(Debug)]
struct Rule {
    pattern: String,
    outcome: Outcome,
}

#[derive(Debug, Clone)]
enum Outcome {
    Rows(Vec<Vec<Value>>),
    Fail(String),
}

#[derive(Debug)]
pub struct DriverOp {
    pub operation: Operation,

    /// `None` when the statement failed
    pub response: Option<Response>,
}

impl ScriptedDriver {
    pub fn new() -> ScriptedDriver {
        ScriptedDriver::default()
    }

    /// Answers statements containing `pattern` with `rows`.
    pub fn respond(&self, pattern: impl Into<String>, rows: Vec<Vec<Value>>) -> &Self {
        self.push(pattern.into(), Outcome::Rows(rows))
    }

    /// Fails statements containing `pattern`.
    pub fn fail(&self, pattern: impl Into<String>, message: impl Into<String>) -> &Self {
        self.push(pattern.into(), Outcome::Fail(message.into()))
    }

    /// Get a handle to the operations log
    pub fn exec_log(&self) -> ExecLog {
        ExecLog::new(self.ops_log.clone())
    }

    fn push(&self, pattern: String, outcome: Outcome) -> &Self {
        self.rules.lock().unwrap().push(Rule { pattern, outcome });
        self
    }

    fn outcome(&self, query: &QuerySql) -> Option<Outcome> {
        self.rules
            .lock()
            .unwrap()
            .iter()
            .find(|rule| query.sql.contains(&rule.pattern))
            .map(|rule| rule.outcome.clone())
    }
}

#[async_trait]
impl Driver for ScriptedDriver {
    async fn exec(&self, operation: Operation) -> Result<Response> {
        let Operation::QuerySql(query) = &operation;

        let result = match self.outcome(query) {
            Some(Outcome::Rows(rows)) => Ok(Response::rows(rows)),
            Some(Outcome::Fail(message)) => Err(Error::query_execution(io::Error::other(message))),
            None => Ok(Response::empty()),
        };

        self.ops_log.lock().unwrap().push(DriverOp {
            operation,
            response: result.as_ref().ok().cloned(),
        });

        result
    }
}
