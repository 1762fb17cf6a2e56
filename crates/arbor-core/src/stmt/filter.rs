use crate::{Error, Result, Value};

/// A parsed filter document.
///
/// Plain keys are `field[__operator]` conditions and are ANDed together.
/// `and`/`or` keys open nested groups: a map value is an AND of its keys, an
/// array value combines its elements with the parent key's operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Cond(Cond),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cond {
    /// Dotted path ending in a column or computable. May be a compound such
    /// as `first_name_or_last_name`.
    pub field: String,

    pub op: Op,

    /// Set by the `_cs` operator suffix
    pub case_sensitive: bool,

    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    In,
    Lt,
    Lte,
    Gt,
    Gte,
    Start,
    End,
    Contains,

    /// `true` for `IS NULL`, `false` for `IS NOT NULL`
    IsNull(bool),
}

impl Filter {
    /// An empty filter matching every row.
    pub fn all() -> Filter {
        Filter::And(vec![])
    }

    pub fn parse(src: &serde_json::Value) -> Result<Filter> {
        match src {
            serde_json::Value::Null => Ok(Filter::all()),
            serde_json::Value::Object(map) => parse_map(map),
            other => Err(Error::query_compile(format!(
                "filters must be an object; got `{other}`"
            ))),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Filter::And(items) | Filter::Or(items) => items.iter().all(Filter::is_empty),
            Filter::Cond(_) => false,
        }
    }

    /// Every condition in the tree, depth first.
    pub fn conds(&self) -> Vec<&Cond> {
        let mut out = vec![];
        self.collect_conds(&mut out);
        out
    }

    fn collect_conds<'a>(&'a self, out: &mut Vec<&'a Cond>) {
        match self {
            Filter::And(items) | Filter::Or(items) => {
                for item in items {
                    item.collect_conds(out);
                }
            }
            Filter::Cond(cond) => out.push(cond),
        }
    }

    /// Rewrites every condition's field through `f`.
    pub fn map_fields(&mut self, f: &impl Fn(&str) -> String) {
        match self {
            Filter::And(items) | Filter::Or(items) => {
                for item in items {
                    item.map_fields(f);
                }
            }
            Filter::Cond(cond) => cond.field = f(&cond.field),
        }
    }
}

fn parse_map(map: &serde_json::Map<String, serde_json::Value>) -> Result<Filter> {
    let mut items = Vec::with_capacity(map.len());

    for (key, value) in map {
        let item = match key.as_str() {
            "and" => parse_group(value, Filter::And)?,
            "or" => parse_group(value, Filter::Or)?,
            _ => Filter::Cond(Cond::parse(key, value)?),
        };
        items.push(item);
    }

    Ok(Filter::And(items))
}

fn parse_group(value: &serde_json::Value, combine: fn(Vec<Filter>) -> Filter) -> Result<Filter> {
    match value {
        serde_json::Value::Object(map) => parse_map(map),
        serde_json::Value::Array(elements) => {
            let mut items = Vec::with_capacity(elements.len());

            for element in elements {
                match element {
                    serde_json::Value::Object(map) => items.push(parse_map(map)?),
                    other => {
                        return Err(Error::query_compile(format!(
                            "filter group elements must be objects; got `{other}`"
                        )))
                    }
                }
            }

            Ok(combine(items))
        }
        other => Err(Error::query_compile(format!(
            "filter group must be an object or an array; got `{other}`"
        ))),
    }
}

impl Cond {
    fn parse(key: &str, value: &serde_json::Value) -> Result<Cond> {
        let (field, op_name) = match key.rsplit_once("__") {
            Some((field, op)) => (field, op),
            None => (key, "eq"),
        };

        if field.is_empty() {
            return Err(Error::query_compile(format!("filter key `{key}` has no field")));
        }

        let (op_name, case_sensitive) = match op_name.strip_suffix("_cs") {
            Some(base) => (base, true),
            None => (op_name, false),
        };

        let op = match (op_name, case_sensitive) {
            ("eq", _) => Op::Eq,
            ("start", _) => Op::Start,
            ("end", _) => Op::End,
            ("cnt", _) => Op::Contains,
            ("in", false) => Op::In,
            ("lt", false) => Op::Lt,
            ("lte", false) => Op::Lte,
            ("gt", false) => Op::Gt,
            ("gte", false) => Op::Gte,
            ("null" | "is_null", false) => Op::IsNull(expect_bool(key, value)?),
            ("not_null", false) => Op::IsNull(!expect_bool(key, value)?),
            _ => {
                return Err(Error::query_compile(format!(
                    "unknown filter operator in `{key}`"
                )))
            }
        };

        let value = match op {
            Op::IsNull(_) => Value::Null,
            Op::In => match value {
                serde_json::Value::Array(_) => Value::from(value),
                _ => {
                    return Err(Error::query_compile(format!(
                        "`{key}` expects an array"
                    )))
                }
            },
            _ => match value {
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                    return Err(Error::query_compile(format!(
                        "`{key}` expects a scalar value"
                    )))
                }
                _ => Value::from(value),
            },
        };

        Ok(Cond {
            field: field.to_string(),
            op,
            case_sensitive,
            value,
        })
    }

    /// Relation prefix of the field, or `""` for the root.
    pub fn relation_path(&self) -> &str {
        self.field.rsplit_once('.').map(|(path, _)| path).unwrap_or("")
    }

    /// Last path segment: the column, computable, or compound name.
    pub fn column(&self) -> &str {
        self.field.rsplit_once('.').map(|(_, column)| column).unwrap_or(&self.field)
    }
}

fn expect_bool(key: &str, value: &serde_json::Value) -> Result<bool> {
    match value {
        serde_json::Value::Bool(b) => Ok(*b),
        other => Err(Error::query_compile(format!(
            "`{key}` expects a boolean; got `{other}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn cond(field: &str, op: Op, case_sensitive: bool, value: Value) -> Filter {
        Filter::Cond(Cond {
            field: field.to_string(),
            op,
            case_sensitive,
            value,
        })
    }

    #[test]
    fn plain_keys_are_anded() {
        let filter = Filter::parse(&json!({
            "name": "John",
            "name__eq_cs": "John",
            "author.age__gte": 18,
        }))
        .unwrap();

        assert_eq!(
            filter,
            Filter::And(vec![
                cond("name", Op::Eq, false, "John".into()),
                cond("name", Op::Eq, true, "John".into()),
                cond("author.age", Op::Gte, false, Value::I64(18)),
            ])
        );
    }

    #[test]
    fn groups() {
        let filter = Filter::parse(&json!({
            "or": [{"a": 1}, {"b__in": [1, 2]}],
            "and": {"c__null": true, "d__not_null": true},
        }))
        .unwrap();

        assert_eq!(
            filter,
            Filter::And(vec![
                Filter::Or(vec![
                    Filter::And(vec![cond("a", Op::Eq, false, Value::I64(1))]),
                    Filter::And(vec![cond(
                        "b",
                        Op::In,
                        false,
                        Value::List(vec![Value::I64(1), Value::I64(2)])
                    )]),
                ]),
                Filter::And(vec![
                    cond("c", Op::IsNull(true), false, Value::Null),
                    cond("d", Op::IsNull(false), false, Value::Null),
                ]),
            ])
        );
    }

    #[test]
    fn or_with_map_is_and_group() {
        let filter = Filter::parse(&json!({"or": {"a": 1, "b": 2}})).unwrap();

        assert_eq!(
            filter,
            Filter::And(vec![Filter::And(vec![
                cond("a", Op::Eq, false, Value::I64(1)),
                cond("b", Op::Eq, false, Value::I64(2)),
            ])])
        );
    }

    #[test]
    fn errors() {
        for src in [
            json!({"name__between": [1, 2]}),
            json!({"name__in": 1}),
            json!({"name__lt_cs": 1}),
            json!({"name__null": "yes"}),
            json!({"or": 1}),
            json!({"__eq": 1}),
            json!([1]),
        ] {
            let err = Filter::parse(&src).unwrap_err();
            assert!(err.is_query_compile(), "{src}: {err}");
        }
    }

    #[test]
    fn relation_path_and_column() {
        let Filter::And(items) = Filter::parse(&json!({"author.company.name__cnt": "ac"})).unwrap() else {
            panic!()
        };
        let Filter::Cond(cond) = &items[0] else { panic!() };

        assert_eq!(cond.relation_path(), "author.company");
        assert_eq!(cond.column(), "name");
        assert_eq!(cond.op, Op::Contains);
    }

    #[test]
    fn empty() {
        assert!(Filter::parse(&serde_json::Value::Null).unwrap().is_empty());
        assert!(Filter::parse(&json!({"or": []})).unwrap().is_empty());
        assert!(!Filter::parse(&json!({"a": 1})).unwrap().is_empty());
    }
}
