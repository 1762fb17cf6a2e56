mod cte;
pub use cte::Cte;

mod expr;
pub use expr::{BinaryOp, Expr};

mod select;
pub use select::{Distinct, Join, OrderBy, Select, SelectItem, Source};

/// A statement that can be serialized to SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
}

impl From<Select> for Statement {
    fn from(value: Select) -> Self {
        Self::Select(value)
    }
}
