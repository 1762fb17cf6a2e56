use super::{Comma, Formatter, Params, ToSql};

use crate::stmt;

pub(super) struct With<'a>(pub(super) &'a [stmt::Cte]);

impl ToSql for With<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        if !self.0.is_empty() {
            fmt!(f, "WITH " Comma(self.0) " ");
        }
    }
}

impl ToSql for &stmt::Cte {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let name = self.name.as_str();
        let query = &self.query;

        fmt!(f, name " AS (" query ")");
    }
}
