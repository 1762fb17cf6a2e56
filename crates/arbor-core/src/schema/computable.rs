use super::ColumnTy;
use crate::template::Template;

const AGGREGATES: &[&str] = &[
    "COUNT",
    "SUM",
    "AVG",
    "MIN",
    "MAX",
    "ARRAY_AGG",
    "STRING_AGG",
    "BOOL_AND",
    "BOOL_OR",
    "JSON_AGG",
    "JSONB_AGG",
];

/// A pseudo-column defined by a SQL expression with `{path}` placeholders.
#[derive(Debug, Clone)]
pub struct Computable {
    pub name: String,

    pub expr: Template,

    pub ty: ColumnTy,

    /// Relation paths referenced by the expression, in order of first
    /// appearance. Placeholders on the owner's own columns add nothing.
    pub paths: Vec<String>,

    /// The expression calls an aggregate function
    pub aggregate: bool,

    /// The `has_many` relation the expression aggregates over. Such
    /// computables are evaluated in a grouped CTE.
    pub has_many: Option<String>,
}

impl Computable {
    pub fn new(name: impl Into<String>, expr: &str, ty: ColumnTy) -> Computable {
        let expr = Template::parse_placeholders(expr);
        let aggregate = expr.segments().iter().any(|segment| match segment {
            crate::template::Segment::Literal(text) => is_aggregate(text),
            _ => false,
        });

        let mut paths: Vec<String> = vec![];
        for path in expr.field_paths() {
            if path.len() > 1 {
                let relation_path = path[..path.len() - 1].join(".");
                if !paths.contains(&relation_path) {
                    paths.push(relation_path);
                }
            }
        }

        Computable {
            name: name.into(),
            expr,
            ty,
            paths,
            aggregate,
            has_many: None,
        }
    }

    /// Evaluated in a per-relation CTE rather than in the outer query.
    pub fn is_cte(&self) -> bool {
        self.has_many.is_some()
    }
}

/// Returns `true` if `sql` calls an aggregate function.
pub fn is_aggregate(sql: &str) -> bool {
    let upper = sql.to_ascii_uppercase();
    let bytes = upper.as_bytes();

    AGGREGATES.iter().any(|name| {
        upper.match_indices(name).any(|(at, _)| {
            let boundary = at == 0 || {
                let prev = bytes[at - 1];
                !(prev.is_ascii_alphanumeric() || prev == b'_')
            };

            boundary && upper[at + name.len()..].trim_start().starts_with('(')
        })
    })
}
