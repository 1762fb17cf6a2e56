//! Lowers a resolved query into a SQL statement tree.

mod filter;
mod join;

use super::{
    plan::AliasMap,
    query::{join_path, split_path, Query},
    select::{Column, Source as ColumnSource},
};

use arbor_core::{
    schema::{ColumnTy, Computable, Model},
    Error, Result, Schema,
};
use arbor_sql::stmt::{Distinct, Expr, OrderBy, Select, SelectItem, Source};
use indexmap::IndexMap;

use std::collections::HashSet;

/// Alias of the subquery wrapping a `DISTINCT ON` query.
const DEDUPED: &str = "deduped";

/// Alias of the subquery counted by a grouped or composite-key count.
const COUNTED: &str = "counted";

/// Compiles a list query selecting `columns`.
pub(crate) fn list(
    schema: &Schema,
    model: &Model,
    query: &Query,
    aliases: &AliasMap,
    columns: &[Column],
) -> Result<Select> {
    let mut lower = Lower::new(schema, model, query, aliases);
    let mut select = Select::from(Source::table(&model.table, aliases.resolve("")?));
    let mut grouped = false;

    for column in columns {
        let operand = lower.column(column)?;
        grouped |= operand.aggregate;
        select.column(operand.expr);
    }

    let (filter, having) = lower.filter()?;
    let sorts = lower.sorts()?;

    let fanout = lower.joins(&mut select)?;
    lower.ctes(&mut select)?;

    select.filter = filter;
    lower.scopes(&mut select)?;

    grouped |= having.is_some() || sorts.iter().any(|sort| sort.aggregate);
    select.having = having;

    let key = lower.key();
    let order_by: Vec<OrderBy> = sorts.iter().map(|sort| sort.order_by.clone()).collect();
    let sort_on_fanout = sorts.iter().any(|sort| sort.fanout);

    let mut select = if grouped {
        lower.group_by(&mut select, &sorts);
        select.order_by = order_by;
        select
    } else if query.one_per_group {
        let group = match &query.group {
            Some(group) => Expr::column(aliases.resolve("")?, group),
            None => return Err(Error::query_compile("one row per group requires a group column")),
        };
        distinct_on(select, vec![group], order_by)
    } else if fanout && (model.has_composite_key() || sort_on_fanout) {
        distinct_on(select, key, order_by)
    } else if fanout {
        select.distinct = Distinct::All;
        for sort in &order_by {
            if !select.columns.iter().any(|item| item.expr == sort.expr) {
                select.column(sort.expr.clone());
            }
        }
        select.order_by = order_by;
        select
    } else {
        select.order_by = order_by;
        select
    };

    select.limit = query.limit;
    select.offset = Some(query.offset).filter(|offset| *offset > 0);

    Ok(select)
}

/// Compiles a count query. Only the joins the filters need are planned.
pub(crate) fn count(schema: &Schema, model: &Model, query: &Query, aliases: &AliasMap) -> Result<Select> {
    let mut lower = Lower::new(schema, model, query, aliases);
    let mut select = Select::from(Source::table(&model.table, aliases.resolve("")?));

    let (filter, having) = lower.filter()?;
    let fanout = lower.joins(&mut select)?;
    lower.ctes(&mut select)?;

    select.filter = filter;
    lower.scopes(&mut select)?;

    let key = lower.key();

    if having.is_some() || (fanout && model.has_composite_key()) {
        for expr in &key {
            select.column(expr.clone());
        }

        if having.is_some() {
            select.group_by = key;
            select.having = having;
        } else {
            select.distinct = Distinct::All;
        }

        let with = std::mem::take(&mut select.with);
        let mut outer = Select::from(Source::subquery(select, COUNTED));
        outer.with = with;
        outer.column(Expr::count_star());
        Ok(outer)
    } else if fanout {
        select.column(Expr::count_distinct(key));
        Ok(select)
    } else {
        select.column(Expr::count_star());
        Ok(select)
    }
}

/// Wraps `inner` so that only the first row per `key` is kept, ordered by
/// `order_by` afterwards.
fn distinct_on(mut inner: Select, key: Vec<Expr>, order_by: Vec<OrderBy>) -> Select {
    inner.order_by = key
        .iter()
        .map(|expr| OrderBy {
            expr: expr.clone(),
            desc: false,
        })
        .collect();
    inner.distinct = Distinct::On(key);

    let mut outer_order = Vec::with_capacity(order_by.len());

    for (i, sort) in order_by.into_iter().enumerate() {
        let name = format!("__sort_{i}");
        inner.column_as(sort.expr.clone(), &name);
        outer_order.push(OrderBy {
            expr: Expr::column(DEDUPED, name),
            desc: sort.desc,
        });
        inner.order_by.push(sort);
    }

    let with = std::mem::take(&mut inner.with);
    let mut outer = Select::from(Source::subquery(inner, DEDUPED));
    outer.with = with;
    outer.column(Expr::Star);
    outer.order_by = outer_order;
    outer
}

/// `table."column"`, for SQL rewritten from templates.
fn qualified(table: &str, column: &str) -> String {
    format!("{table}.\"{}\"", column.replace('"', "\"\""))
}

struct Lower<'a> {
    schema: &'a Schema,
    model: &'a Model,
    query: &'a Query,
    aliases: &'a AliasMap,

    /// Has-many computables grouped by CTE name
    ctes: IndexMap<String, CteSpec<'a>>,

    /// Junction aliases handed out so far
    junctions: HashSet<String>,
}

struct CteSpec<'a> {
    /// Model owning the computables
    owner: &'a Model,

    /// Path of the owner
    owner_path: String,

    /// Path of the aggregated has-many relation
    relation_path: String,

    computables: Vec<&'a Computable>,
}

/// A compiled column or computable reference.
struct Operand {
    expr: Expr,
    ty: ColumnTy,

    /// Calls an aggregate outside of a CTE
    aggregate: bool,
}

struct SortItem {
    order_by: OrderBy,
    aggregate: bool,

    /// The sorted column sits behind a fan-out relation
    fanout: bool,
}

impl<'a> Lower<'a> {
    fn new(schema: &'a Schema, model: &'a Model, query: &'a Query, aliases: &'a AliasMap) -> Self {
        Lower {
            schema,
            model,
            query,
            aliases,
            ctes: IndexMap::new(),
            junctions: HashSet::new(),
        }
    }

    /// Primary key columns of the root table.
    fn key(&self) -> Vec<Expr> {
        let alias = self.aliases.alias("").unwrap_or("t0");
        self.model
            .primary_key
            .iter()
            .map(|column| Expr::column(alias, column))
            .collect()
    }

    fn owner(&self, path: &str) -> Result<&'a Model> {
        self.schema.model_at(self.model, &split_path(path))
    }

    fn column(&mut self, column: &Column) -> Result<Operand> {
        let owner = self.owner(&column.path)?;

        let mut operand = match &column.source {
            ColumnSource::Column(name) => Operand {
                expr: Expr::column(self.aliases.resolve(&column.path)?, name),
                ty: owner.column_ty(name),
                aggregate: false,
            },
            ColumnSource::Computable(name) => self.operand(owner, &column.path, name)?,
        };

        if column.ty.is_some_and(ColumnTy::selects_as_text) {
            operand.expr = Expr::cast(operand.expr, "text");
        }

        Ok(operand)
    }

    /// Resolves `name` on the model at `path` to a column or computable.
    fn operand(&mut self, owner: &'a Model, path: &str, name: &str) -> Result<Operand> {
        let alias = self.aliases.resolve(path)?;

        let Some(computable) = owner.computable(name) else {
            return Ok(Operand {
                expr: Expr::column(alias, name),
                ty: owner.column_ty(name),
                aggregate: false,
            });
        };

        if let Some(has_many) = &computable.has_many {
            let relation_path = join_path(path, has_many);
            let cte = format!("{}_agg", self.aliases.resolve(&relation_path)?);

            let spec = self.ctes.entry(cte.clone()).or_insert_with(|| CteSpec {
                owner,
                owner_path: path.to_string(),
                relation_path,
                computables: vec![],
            });

            if !spec.computables.iter().any(|c| c.name == computable.name) {
                spec.computables.push(computable);
            }

            return Ok(Operand {
                expr: Expr::column(cte, &computable.name),
                ty: computable.ty,
                aggregate: false,
            });
        }

        Ok(Operand {
            expr: Expr::raw(self.computable_sql(computable, path, alias)?),
            ty: computable.ty,
            aggregate: computable.aggregate,
        })
    }

    /// Rewrites a computable's placeholders to aliased columns. `{column}`
    /// refers to `own_alias`, `{relation.column}` to the relation's alias
    /// relative to `path`.
    fn computable_sql(&self, computable: &Computable, path: &str, own_alias: &str) -> Result<String> {
        computable.expr.rewrite(|placeholder| {
            let Some((column, relation)) = placeholder.split_last() else {
                return Err(Error::query_compile(format!(
                    "empty placeholder in computable `{}`",
                    computable.name
                )));
            };

            let table = if relation.is_empty() {
                own_alias
            } else {
                self.aliases.resolve(&join_path(path, &relation.join(".")))?
            };

            Ok(qualified(table, column))
        })
    }

    fn sorts(&mut self) -> Result<Vec<SortItem>> {
        let mut out = Vec::with_capacity(self.query.sorts.len());

        for sort in &self.query.sorts {
            let (path, name) = match sort.field.rsplit_once('.') {
                Some((path, name)) => (path, name),
                None => ("", sort.field.as_str()),
            };

            let owner = self.owner(path)?;
            let operand = self.operand(owner, path, name)?;
            let fanout = self
                .schema
                .walk(self.model, &split_path(path))?
                .iter()
                .any(|step| step.relation.fans_out());

            out.push(SortItem {
                order_by: OrderBy {
                    expr: operand.expr,
                    desc: sort.direction.is_desc(),
                },
                aggregate: operand.aggregate,
                fanout,
            });
        }

        Ok(out)
    }

    /// Groups by the root key and every non-aggregate selected or sorted
    /// expression.
    fn group_by(&self, select: &mut Select, sorts: &[SortItem]) {
        let mut group_by = self.key();

        let candidates = select
            .columns
            .iter()
            .map(|item: &SelectItem| &item.expr)
            .chain(sorts.iter().filter(|sort| !sort.aggregate).map(|sort| &sort.order_by.expr));

        for expr in candidates {
            let aggregate = match expr {
                Expr::Raw(sql) => arbor_core::schema::is_aggregate(sql),
                Expr::Cast { expr, .. } => matches!(&**expr, Expr::Raw(sql) if arbor_core::schema::is_aggregate(sql)),
                _ => false,
            };

            if !aggregate && !group_by.contains(expr) {
                group_by.push(expr.clone());
            }
        }

        select.group_by = group_by;
    }
}
