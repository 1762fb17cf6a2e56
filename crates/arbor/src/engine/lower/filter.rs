use super::{Lower, Operand};
use crate::engine::query::split_compound;

use arbor_core::{
    schema::ColumnTy,
    stmt::{Cond, Filter, Op},
    Error, Result, Value,
};
use arbor_sql::stmt::{BinaryOp, Expr};

impl Lower<'_> {
    /// Lowers the query filter. Top-level conditions that reference an
    /// aggregate outside of a CTE go to `HAVING`, the rest to `WHERE`.
    pub(super) fn filter(&mut self) -> Result<(Option<Expr>, Option<Expr>)> {
        let query = self.query;
        let items = match &query.filter {
            Filter::And(items) => &items[..],
            other => std::slice::from_ref(other),
        };

        let mut filter = vec![];
        let mut having = vec![];

        for item in items {
            if item.is_empty() {
                continue;
            }

            let (expr, aggregate) = self.lower_filter(item)?;

            if aggregate {
                having.push(expr);
            } else {
                filter.push(expr);
            }
        }

        let conjunction = |exprs: Vec<Expr>| (!exprs.is_empty()).then(|| Expr::and(exprs));
        Ok((conjunction(filter), conjunction(having)))
    }

    fn lower_filter(&mut self, filter: &Filter) -> Result<(Expr, bool)> {
        match filter {
            Filter::And(items) | Filter::Or(items) => {
                let mut exprs = Vec::with_capacity(items.len());
                let mut aggregate = false;

                for item in items.iter().filter(|item| !item.is_empty()) {
                    let (expr, item_aggregate) = self.lower_filter(item)?;
                    aggregate |= item_aggregate;
                    exprs.push(expr);
                }

                let expr = match filter {
                    Filter::Or(_) => Expr::or(exprs),
                    _ => Expr::and(exprs),
                };

                Ok((expr, aggregate))
            }
            Filter::Cond(cond) => self.cond(cond),
        }
    }

    /// Lowers one condition, expanding compound field names.
    fn cond(&mut self, cond: &Cond) -> Result<(Expr, bool)> {
        let path = cond.relation_path();
        let owner = self.owner(path)?;

        let mut alternatives = vec![];
        let mut aggregate = false;

        for parts in split_compound(owner, cond.column()) {
            let mut all = Vec::with_capacity(parts.len());

            for part in parts {
                let operand = self.operand(owner, path, part)?;
                aggregate |= operand.aggregate;
                all.push(predicate(operand, cond)?);
            }

            alternatives.push(Expr::and(all));
        }

        Ok((Expr::or(alternatives), aggregate))
    }
}

fn predicate(operand: Operand, cond: &Cond) -> Result<Expr> {
    let Operand { expr, ty, .. } = operand;

    Ok(match cond.op {
        Op::IsNull(is_null) => Expr::is_null(expr, !is_null),
        Op::Eq if cond.value.is_null() => Expr::is_null(expr, false),
        Op::Eq if !cond.case_sensitive && ty.is_textual() && cond.value.as_str().is_some() => {
            Expr::eq(Expr::lower(expr), Expr::lower(arg(ty, &cond.value)))
        }
        Op::Eq => Expr::eq(expr, arg(ty, &cond.value)),
        Op::In => {
            let Some(values) = cond.value.as_list() else {
                return Err(Error::query_compile(format!(
                    "`{}__in` expects an array",
                    cond.field
                )));
            };

            Expr::in_list(expr, values.iter().map(|value| arg(ty, value)).collect())
        }
        Op::Lt => Expr::binary_op(expr, BinaryOp::Lt, arg(ty, &cond.value)),
        Op::Lte => Expr::binary_op(expr, BinaryOp::Le, arg(ty, &cond.value)),
        Op::Gt => Expr::binary_op(expr, BinaryOp::Gt, arg(ty, &cond.value)),
        Op::Gte => Expr::binary_op(expr, BinaryOp::Ge, arg(ty, &cond.value)),
        Op::Start | Op::End | Op::Contains => {
            let escaped = escape_like(&cond.value.to_text());
            let pattern = match cond.op {
                Op::Start => format!("{escaped}%"),
                Op::End => format!("%{escaped}"),
                _ => format!("%{escaped}%"),
            };

            let subject = if ty.is_textual() {
                expr
            } else {
                Expr::cast(expr, "text")
            };

            Expr::like(subject, Expr::value(pattern), !cond.case_sensitive)
        }
    })
}

/// Binds a filter argument, converted to the column's type.
fn arg(ty: ColumnTy, value: &Value) -> Expr {
    let value = Expr::Value(ty.coerce_arg(value.clone()));

    match ty.param_cast() {
        Some(cast) => Expr::cast(value, cast),
        None => value,
    }
}

/// Escapes `LIKE` metacharacters so the argument matches literally.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }

    out
}
