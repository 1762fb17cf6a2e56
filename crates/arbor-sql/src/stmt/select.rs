use super::{Cte, Expr};

/// A `SELECT` query.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub with: Vec<Cte>,
    pub distinct: Distinct,
    pub columns: Vec<SelectItem>,
    pub from: Source,
    pub joins: Vec<Join>,
    pub filter: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Distinct {
    #[default]
    None,

    /// `SELECT DISTINCT`
    All,

    /// `SELECT DISTINCT ON (exprs)`
    On(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// `"table" AS alias`
    Table { name: String, alias: String },

    /// `(SELECT ...) AS alias`
    Subquery { query: Box<Select>, alias: String },
}

/// A `LEFT JOIN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub source: Source,
    pub on: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expr: Expr,
    pub desc: bool,
}

impl Select {
    pub fn from(source: Source) -> Select {
        Select {
            with: vec![],
            distinct: Distinct::None,
            columns: vec![],
            from: source,
            joins: vec![],
            filter: None,
            group_by: vec![],
            having: None,
            order_by: vec![],
            limit: None,
            offset: None,
        }
    }

    pub fn column(&mut self, expr: Expr) -> &mut Self {
        self.columns.push(SelectItem { expr, alias: None });
        self
    }

    pub fn column_as(&mut self, expr: Expr, alias: impl Into<String>) -> &mut Self {
        self.columns.push(SelectItem {
            expr,
            alias: Some(alias.into()),
        });
        self
    }

    pub fn left_join(&mut self, source: Source, on: Expr) -> &mut Self {
        self.joins.push(Join { source, on });
        self
    }

    /// ANDs `expr` into the `WHERE` clause.
    pub fn and_where(&mut self, expr: Expr) -> &mut Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => Expr::and([existing, expr]),
            None => expr,
        });
        self
    }

    pub fn order_by(&mut self, expr: Expr, desc: bool) -> &mut Self {
        self.order_by.push(OrderBy { expr, desc });
        self
    }
}

impl Source {
    pub fn table(name: impl Into<String>, alias: impl Into<String>) -> Source {
        Source::Table {
            name: name.into(),
            alias: alias.into(),
        }
    }

    pub fn subquery(query: Select, alias: impl Into<String>) -> Source {
        Source::Subquery {
            query: Box::new(query),
            alias: alias.into(),
        }
    }

    pub fn alias(&self) -> &str {
        match self {
            Source::Table { alias, .. } | Source::Subquery { alias, .. } => alias,
        }
    }
}
