use super::{cte::With, Comma, Formatter, Ident, Params, ToSql};

use crate::stmt::{self, Distinct};

impl ToSql for &stmt::Statement {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            stmt::Statement::Select(select) => select.to_sql(f),
        }
    }
}

impl ToSql for &stmt::Select {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let with = With(&self.with);
        let distinct = &self.distinct;
        let columns = Comma(&self.columns);
        let from = &self.from;

        fmt!(f, with "SELECT " distinct columns " FROM " from);

        for join in &self.joins {
            fmt!(f, " LEFT JOIN " join);
        }

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE " filter);
        }

        if !self.group_by.is_empty() {
            let group_by = Comma(&self.group_by);
            fmt!(f, " GROUP BY " group_by);
        }

        if let Some(having) = &self.having {
            fmt!(f, " HAVING " having);
        }

        if !self.order_by.is_empty() {
            let order_by = Comma(&self.order_by);
            fmt!(f, " ORDER BY " order_by);
        }

        if let Some(limit) = self.limit {
            fmt!(f, " LIMIT " limit);
        }

        if let Some(offset) = self.offset {
            fmt!(f, " OFFSET " offset);
        }
    }
}

impl ToSql for &Distinct {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            Distinct::None => {}
            Distinct::All => fmt!(f, "DISTINCT "),
            Distinct::On(exprs) => fmt!(f, "DISTINCT ON (" Comma(exprs) ") "),
        }
    }
}

impl ToSql for &stmt::SelectItem {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let expr = &self.expr;
        fmt!(f, expr);

        if let Some(alias) = &self.alias {
            fmt!(f, " AS " Ident(alias));
        }
    }
}

impl ToSql for &stmt::Source {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            stmt::Source::Table { name, alias } => {
                fmt!(f, Ident(name) " AS " alias.as_str());
            }
            stmt::Source::Subquery { query, alias } => {
                let query = &**query;
                fmt!(f, "(" query ") AS " alias.as_str());
            }
        }
    }
}

impl ToSql for &stmt::Join {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let source = &self.source;
        let on = &self.on;
        fmt!(f, source " ON " on);
    }
}

impl ToSql for &stmt::OrderBy {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let expr = &self.expr;
        fmt!(f, expr);

        if self.desc {
            fmt!(f, " DESC");
        }
    }
}
