use super::{Comma, Delimited, Formatter, Ident, Params, ToSql};

use crate::stmt::{self, BinaryOp, Expr};
use arbor_core::Value;

impl ToSql for &stmt::Expr {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            Expr::Column { table, name } => {
                if let Some(table) = table {
                    fmt!(f, table.as_str() ".");
                }
                fmt!(f, Ident(name));
            }
            Expr::Value(value) => value.to_sql(f),
            Expr::Raw(sql) => fmt!(f, "(" sql.as_str() ")"),
            Expr::And(operands) if operands.is_empty() => fmt!(f, "TRUE"),
            Expr::And(operands) => fmt!(f, Delimited(operands.iter().map(Grouped), " AND ")),
            Expr::Or(operands) if operands.is_empty() => fmt!(f, "FALSE"),
            Expr::Or(operands) => fmt!(f, Delimited(operands.iter().map(Grouped), " OR ")),
            Expr::BinaryOp { lhs, op, rhs } => {
                let (lhs, op, rhs) = (&**lhs, *op, &**rhs);
                fmt!(f, lhs " " op " " rhs);
            }
            Expr::Lower(expr) => {
                let expr = &**expr;
                fmt!(f, "LOWER(" expr ")");
            }
            Expr::Cast { expr, ty } => {
                let expr = &**expr;
                fmt!(f, expr "::" ty.as_str());
            }
            Expr::Like {
                expr,
                pattern,
                case_insensitive,
            } => {
                let (expr, pattern) = (&**expr, &**pattern);
                let op = if *case_insensitive { " ILIKE " } else { " LIKE " };
                fmt!(f, expr op pattern);
            }
            Expr::InList { list, .. } if list.is_empty() => fmt!(f, "FALSE"),
            Expr::InList { expr, list } => {
                let expr = &**expr;
                fmt!(f, expr " IN (" Comma(list) ")");
            }
            Expr::IsNull { expr, negate } => {
                let expr = &**expr;
                let suffix = if *negate { " IS NOT NULL" } else { " IS NULL" };
                fmt!(f, expr suffix);
            }
            Expr::Func {
                name,
                args,
                distinct,
            } => {
                let distinct = if *distinct { "DISTINCT " } else { "" };
                fmt!(f, name.as_str() "(" distinct Comma(args) ")");
            }
            Expr::Star => fmt!(f, "*"),
            Expr::Bool(true) => fmt!(f, "TRUE"),
            Expr::Bool(false) => fmt!(f, "FALSE"),
        }
    }
}

/// Wraps nested boolean groups in parentheses.
struct Grouped<'a>(&'a Expr);

impl ToSql for Grouped<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self.0 {
            Expr::And(operands) | Expr::Or(operands) if operands.len() > 1 => {
                fmt!(f, "(" self.0 ")");
            }
            expr => expr.to_sql(f),
        }
    }
}

impl ToSql for BinaryOp {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        f.dst.push_str(match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        });
    }
}

impl ToSql for &Value {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            Value::Null => fmt!(f, "NULL"),
            value => {
                let placeholder = f.params.push(value);
                fmt!(f, placeholder);
            }
        }
    }
}
