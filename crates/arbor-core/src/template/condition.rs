use crate::Value;

use std::cmp::Ordering;

/// A ternary condition: a bare path (truthiness) or a comparison of a path
/// against a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Truthy(Vec<String>),
    Compare {
        path: Vec<String>,
        op: CmpOp,
        literal: Literal,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Condition {
    /// Parses the text between `{?` and the `?` that separates the branches.
    pub fn parse(src: &str) -> Result<Condition, String> {
        let src = src.trim();

        let Some((at, op, len)) = find_operator(src) else {
            return parse_path(src).map(Condition::Truthy);
        };

        let path = parse_path(src[..at].trim())?;
        let literal = Literal::parse(src[at + len..].trim())?;

        Ok(Condition::Compare { path, op, literal })
    }

    pub fn path(&self) -> &[String] {
        match self {
            Condition::Truthy(path) => path,
            Condition::Compare { path, .. } => path,
        }
    }

    /// Evaluates the condition against the value found at its path, if any.
    pub fn eval(&self, value: Option<&Value>) -> bool {
        match self {
            Condition::Truthy(_) => value.is_some_and(is_truthy),
            Condition::Compare { op, literal, .. } => compare(value, *op, literal),
        }
    }
}

impl CmpOp {
    fn matches(self, ordering: Ordering) -> bool {
        match self {
            CmpOp::Eq => ordering.is_eq(),
            CmpOp::Ne => ordering.is_ne(),
            CmpOp::Gt => ordering.is_gt(),
            CmpOp::Ge => ordering.is_ge(),
            CmpOp::Lt => ordering.is_lt(),
            CmpOp::Le => ordering.is_le(),
        }
    }
}

impl Literal {
    fn parse(src: &str) -> Result<Literal, String> {
        if src.is_empty() {
            return Err("missing right-hand side".into());
        }

        for quote in ['\'', '"'] {
            if let Some(rest) = src.strip_prefix(quote) {
                return match rest.strip_suffix(quote) {
                    Some(text) => Ok(Literal::String(text.to_string())),
                    None => Err(format!("unterminated string literal `{src}`")),
                };
            }
        }

        Ok(match src {
            "null" => Literal::Null,
            "true" => Literal::Bool(true),
            "false" => Literal::Bool(false),
            _ => match src.parse::<f64>() {
                Ok(number) => Literal::Number(number),
                Err(_) if src.contains(char::is_whitespace) => {
                    return Err(format!("unexpected literal `{src}`"))
                }
                Err(_) => Literal::String(src.to_string()),
            },
        })
    }

    fn to_text(&self) -> String {
        match self {
            Literal::Null => String::new(),
            Literal::Bool(v) => v.to_string(),
            Literal::Number(v) => v.to_string(),
            Literal::String(v) => v.clone(),
        }
    }
}

/// Finds the first comparison operator outside of quotes, returning its byte
/// offset, the operator, and its length.
fn find_operator(src: &str) -> Option<(usize, CmpOp, usize)> {
    let bytes = src.as_bytes();
    let mut quote = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => {
                let next = bytes.get(i + 1).copied();
                let found = match (b, next) {
                    (b'\'' | b'"', _) => {
                        quote = Some(b);
                        None
                    }
                    (b'=', Some(b'=')) => Some((CmpOp::Eq, 2)),
                    (b'!', Some(b'=')) => Some((CmpOp::Ne, 2)),
                    (b'>', Some(b'=')) => Some((CmpOp::Ge, 2)),
                    (b'<', Some(b'=')) => Some((CmpOp::Le, 2)),
                    (b'>', _) => Some((CmpOp::Gt, 1)),
                    (b'<', _) => Some((CmpOp::Lt, 1)),
                    _ => None,
                };

                if let Some((op, len)) = found {
                    return Some((i, op, len));
                }
            }
        }

        i += 1;
    }

    None
}

pub(super) fn parse_path(src: &str) -> Result<Vec<String>, String> {
    if src.is_empty() {
        return Err("missing field path".into());
    }

    let segments: Vec<String> = src.split('.').map(String::from).collect();

    for segment in &segments {
        if !is_ident(segment) {
            return Err(format!("invalid field path `{src}`"));
        }
    }

    Ok(segments)
}

pub(super) fn is_ident(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(v) => *v,
        Value::I64(v) => *v != 0,
        Value::F64(v) => *v != 0.0,
        Value::String(v) => !v.is_empty(),
        Value::Uuid(_) => true,
        Value::Bytes(v) => !v.is_empty(),
        Value::List(items) => !items.is_empty(),
        Value::Object(doc) => !doc.is_empty(),
    }
}

fn compare(value: Option<&Value>, op: CmpOp, literal: &Literal) -> bool {
    let is_null = value.map_or(true, Value::is_null);

    if let Literal::Null = literal {
        return match op {
            CmpOp::Eq => is_null,
            CmpOp::Ne => !is_null,
            _ => false,
        };
    }

    if is_null {
        return op == CmpOp::Ne;
    }

    let lhs = value.map(Value::to_text).unwrap_or_default();
    let rhs = literal.to_text();

    let ordering = if let (Ok(a), Ok(b)) = (lhs.trim().parse::<f64>(), rhs.trim().parse::<f64>()) {
        match a.partial_cmp(&b) {
            Some(ordering) => ordering,
            None => return op == CmpOp::Ne,
        }
    } else if let (Ok(a), Ok(b)) = (lhs.parse::<bool>(), rhs.parse::<bool>()) {
        a.cmp(&b)
    } else {
        lhs.as_str().cmp(rhs.as_str())
    };

    op.matches(ordering)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> Vec<String> {
        p.split('.').map(String::from).collect()
    }

    #[test]
    fn parse_truthy() {
        assert_eq!(
            Condition::parse(" user.active "),
            Ok(Condition::Truthy(path("user.active")))
        );
    }

    #[test]
    fn parse_comparisons() {
        assert_eq!(
            Condition::parse("age >= 18"),
            Ok(Condition::Compare {
                path: path("age"),
                op: CmpOp::Ge,
                literal: Literal::Number(18.0),
            })
        );
        assert_eq!(
            Condition::parse("status == 'a >= b'"),
            Ok(Condition::Compare {
                path: path("status"),
                op: CmpOp::Eq,
                literal: Literal::String("a >= b".into()),
            })
        );
        assert_eq!(
            Condition::parse("deleted_at != null"),
            Ok(Condition::Compare {
                path: path("deleted_at"),
                op: CmpOp::Ne,
                literal: Literal::Null,
            })
        );
    }

    #[test]
    fn parse_failures() {
        assert!(Condition::parse("age >=").is_err());
        assert!(Condition::parse("== 1").is_err());
        assert!(Condition::parse("a b").is_err());
        assert!(Condition::parse("name == 'open").is_err());
    }

    #[test]
    fn numeric_before_string() {
        let cond = Condition::parse("count > 9").unwrap();
        // Lexicographically "10" < "9"
        assert!(cond.eval(Some(&Value::from("10"))));
        assert!(cond.eval(Some(&Value::I64(10))));
        assert!(!cond.eval(Some(&Value::F64(2.5))));
    }

    #[test]
    fn boolean_then_string() {
        let cond = Condition::parse("active == true").unwrap();
        assert!(cond.eval(Some(&Value::Bool(true))));
        assert!(!cond.eval(Some(&Value::Bool(false))));

        let cond = Condition::parse("name < \"m\"").unwrap();
        assert!(cond.eval(Some(&Value::from("alice"))));
        assert!(!cond.eval(Some(&Value::from("zoe"))));
    }

    #[test]
    fn null_handling() {
        let is_null = Condition::parse("x == null").unwrap();
        assert!(is_null.eval(None));
        assert!(is_null.eval(Some(&Value::Null)));
        assert!(!is_null.eval(Some(&Value::from(""))));

        let gt = Condition::parse("x > 1").unwrap();
        assert!(!gt.eval(None));
    }

    #[test]
    fn truthiness() {
        let cond = Condition::parse("x").unwrap();
        assert!(!cond.eval(None));
        assert!(!cond.eval(Some(&Value::from(""))));
        assert!(!cond.eval(Some(&Value::I64(0))));
        assert!(cond.eval(Some(&Value::from("x"))));
        assert!(cond.eval(Some(&Value::List(vec![Value::Null]))));
    }
}
