use super::{Formatter, ToSql};

use arbor_core::Value;

pub trait Params {
    fn push(&mut self, param: &Value) -> Placeholder;
}

/// A 1-based positional placeholder, serialized as `$n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder(pub usize);

impl Params for Vec<Value> {
    fn push(&mut self, value: &Value) -> Placeholder {
        self.push(value.clone());
        Placeholder(self.len())
    }
}

impl ToSql for Placeholder {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        use std::fmt::Write;
        let _ = write!(f.dst, "${}", self.0);
    }
}
