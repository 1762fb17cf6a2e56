use super::{qualified, Lower};
use crate::engine::query::split_path;

use arbor_core::{schema::Relation, template::Template, Error, Result};
use arbor_sql::stmt::{Cte, Expr, Join, Select, Source};

impl Lower<'_> {
    /// Adds a `LEFT JOIN` for every joined path. Returns `true` if any join
    /// can multiply root rows.
    pub(super) fn joins(&mut self, select: &mut Select) -> Result<bool> {
        let aliases = self.aliases;
        let mut fanout = false;

        for path in aliases.joins() {
            let (parent, segment) = path.rsplit_once('.').unwrap_or(("", path));
            let owner = self.schema.model_at(self.model, &split_path(parent))?;
            let relation = owner.relation(segment)?;

            fanout |= relation.fans_out();

            let joins = self.relation_joins(aliases.resolve(parent)?, relation, aliases.resolve(path)?)?;
            select.joins.extend(joins);
        }

        Ok(fanout)
    }

    /// Adds one CTE per aggregated has-many relation and joins it on the
    /// owner's key.
    pub(super) fn ctes(&mut self, select: &mut Select) -> Result<()> {
        let specs = std::mem::take(&mut self.ctes);

        for (name, spec) in specs {
            let segment = spec
                .relation_path
                .rsplit('.')
                .next()
                .unwrap_or(&spec.relation_path);
            let relation = spec.owner.relation(segment)?;
            let key = spec.owner.key_column();

            let mut query = Select::from(Source::table(&spec.owner.table, "main"));
            query.column(Expr::column("main", key));

            for computable in &spec.computables {
                let sql = self.computable_sql(computable, &spec.owner_path, "main")?;
                query.column_as(Expr::raw(sql), &computable.name);
            }

            let alias = self.aliases.resolve(&spec.relation_path)?;
            let joins = self.relation_joins("main", relation, alias)?;
            query.joins.extend(joins);
            query.group_by.push(Expr::column("main", key));

            let owner_alias = self.aliases.resolve(&spec.owner_path)?;
            select.with.push(Cte::new(&name, query));
            select.left_join(
                Source::table(&name, &name),
                Expr::eq(Expr::column(&name, key), Expr::column(owner_alias, key)),
            );
        }

        Ok(())
    }

    /// ANDs the parent key restriction and the relation row filters into
    /// `WHERE`.
    pub(super) fn scopes(&self, select: &mut Select) -> Result<()> {
        if let Some(keys) = &self.query.keys {
            let values = keys.values.iter().cloned().map(Expr::Value).collect();
            select.and_where(Expr::in_list(
                Expr::column(self.aliases.resolve("")?, &keys.column),
                values,
            ));
        }

        for scope in &self.query.scopes {
            let alias = self.aliases.resolve(&scope.path)?;
            select.and_where(scope_expr(alias, &scope.filter)?);
        }

        Ok(())
    }

    /// Joins needed to reach `relation` from `parent` under `alias`.
    pub(super) fn relation_joins(
        &mut self,
        parent: &str,
        relation: &Relation,
        alias: &str,
    ) -> Result<Vec<Join>> {
        let target = self.schema.target(relation)?;

        let Some(through) = &relation.through else {
            let condition = if relation.is_belongs_to() {
                Expr::eq(
                    Expr::column(parent, &relation.fk),
                    Expr::column(alias, &relation.pk),
                )
            } else {
                Expr::eq(
                    Expr::column(alias, &relation.fk),
                    Expr::column(parent, &relation.pk),
                )
            };

            return Ok(vec![Join {
                source: Source::table(&target.table, alias),
                on: on(condition, alias, relation.filter.as_deref())?,
            }]);
        };

        let junction = self.schema.model(&through.model)?;
        let link = junction.relation(&through.link)?;
        let junction_alias = self.junction_alias();

        let to_junction = Expr::eq(
            Expr::column(&junction_alias, &relation.fk),
            Expr::column(parent, &relation.pk),
        );
        let to_target = Expr::eq(
            Expr::column(&junction_alias, &link.fk),
            Expr::column(alias, &link.pk),
        );

        Ok(vec![
            Join {
                source: Source::table(&junction.table, &junction_alias),
                on: on(to_junction, &junction_alias, through.filter.as_deref())?,
            },
            Join {
                source: Source::table(&target.table, alias),
                on: on(to_target, alias, relation.filter.as_deref())?,
            },
        ])
    }

    /// A throwaway alias for a junction table, distinct from path aliases.
    fn junction_alias(&mut self) -> String {
        loop {
            let alias = format!("j_{:06x}", rand::random::<u32>() & 0x00ff_ffff);

            if self.junctions.insert(alias.clone()) {
                return alias;
            }
        }
    }
}

fn on(condition: Expr, alias: &str, filter: Option<&str>) -> Result<Expr> {
    match filter {
        Some(filter) => Ok(Expr::and([condition, scope_expr(alias, filter)?])),
        None => Ok(condition),
    }
}

/// Rewrites a relation row filter. `{column}` placeholders become columns
/// of the table aliased `alias`.
pub(super) fn scope_expr(alias: &str, filter: &str) -> Result<Expr> {
    let sql = Template::parse_placeholders(filter).rewrite(|placeholder| match placeholder {
        [column] => Ok(qualified(alias, column)),
        _ => Err(Error::query_compile(format!(
            "relation filter `{filter}` may only reference columns of its own table"
        ))),
    })?;

    Ok(Expr::raw(sql))
}
