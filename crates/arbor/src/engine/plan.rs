use super::query::{join_path, split_compound, split_path, Query};

use arbor_core::{
    schema::{Computable, Field, FieldTy, Model, Preset, Relation},
    Error, Result, Schema,
};
use indexmap::{IndexMap, IndexSet};

/// Relation path to SQL alias assignment for one query shape.
///
/// The root path `""` is always `t0`; every other path gets the next `tN`
/// in discovery order. The map also records which paths are joined in the
/// outer query and which were cut off by their reentrancy limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    aliases: IndexMap<String, String>,
    paths: IndexMap<String, String>,

    /// Paths joined in the outer query. Paths only reached by a has-many
    /// computable are evaluated in a CTE instead.
    joins: IndexSet<String>,

    /// Paths recorded at their reentrancy limit and not descended into
    truncated: IndexSet<String>,
}

/// What happens when a walk enters a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reentry {
    Descend,

    /// Record the path but select only the target's own columns
    Truncate,
}

impl AliasMap {
    fn new() -> AliasMap {
        let mut map = AliasMap::default();
        map.insert("", false, false);
        map
    }

    /// Alias of a relation path.
    pub fn alias(&self, path: &str) -> Option<&str> {
        self.aliases.get(path).map(String::as_str)
    }

    /// Relation path of an alias.
    pub fn path(&self, alias: &str) -> Option<&str> {
        self.paths.get(alias).map(String::as_str)
    }

    /// `(path, alias)` pairs in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases
            .iter()
            .map(|(path, alias)| (path.as_str(), alias.as_str()))
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn is_truncated(&self, path: &str) -> bool {
        self.truncated.contains(path)
    }

    /// Paths joined in the outer query, parents before children.
    pub fn joins(&self) -> impl Iterator<Item = &str> {
        self.joins.iter().map(String::as_str)
    }

    pub(crate) fn resolve(&self, path: &str) -> Result<&str> {
        self.alias(path)
            .ok_or_else(|| Error::alias_resolution(path))
    }

    /// Rough heap footprint, used for the cache budget.
    pub(crate) fn estimated_size(&self) -> usize {
        let strings: usize = self
            .aliases
            .iter()
            .map(|(path, alias)| 2 * (path.len() + alias.len()))
            .sum();
        let sets: usize = self.joins.iter().chain(&self.truncated).map(String::len).sum();

        std::mem::size_of::<AliasMap>() + strings + sets + 32 * (self.len() + self.joins.len())
    }

    fn insert(&mut self, path: &str, join: bool, truncated: bool) {
        if !self.aliases.contains_key(path) {
            let alias = format!("t{}", self.aliases.len());
            self.aliases.insert(path.to_string(), alias.clone());
            self.paths.insert(alias, path.to_string());
        }

        if join {
            self.joins.insert(path.to_string());
        }

        if truncated {
            self.truncated.insert(path.to_string());
        }
    }
}

/// Decides whether a walk at `lineage` may enter `relation`.
///
/// `lineage` lists the models already on the path, outermost first. A model
/// seen before may only be revisited through a reentrant relation, at most
/// `max_depth` times; the revisit after that is recorded but not descended.
pub(crate) fn reentry(
    schema: &Schema,
    owner: &Model,
    relation: &Relation,
    target: &Model,
    field: Option<&Field>,
    lineage: &[String],
) -> Result<Reentry> {
    let seen = lineage.iter().filter(|name| **name == target.name).count();

    if seen == 0 {
        return Ok(Reentry::Descend);
    }

    if !relation.reentrant {
        return Err(Error::cycle(format!(
            "relation `{}.{}` revisits `{}` and is not reentrant",
            owner.name, relation.name, target.name
        )));
    }

    let max_depth = schema.max_depth(relation, field);

    if seen <= max_depth {
        Ok(Reentry::Descend)
    } else if seen == max_depth + 1 {
        Ok(Reentry::Truncate)
    } else {
        Err(Error::cycle(format!(
            "relation `{}.{}` exceeds max depth {max_depth} revisiting `{}`",
            owner.name, relation.name, target.name
        )))
    }
}

/// Plans the aliases needed by the preset alone.
///
/// The result is independent of filters and sorts and is cached per preset;
/// [`extend`] adds the paths a particular request needs on top of it.
pub(crate) fn plan_preset<'a>(
    schema: &'a Schema,
    model: &'a Model,
    query: &'a Query,
) -> Result<AliasMap> {
    let mut planner = Planner {
        schema,
        query,
        map: AliasMap::new(),
    };

    if let Some(preset) = query.preset() {
        if !query.root_truncated() {
            let mut lineage = query.lineage();
            planner.walk_preset(model, preset, "", &mut lineage)?;
        }
    }

    Ok(planner.map)
}

/// Adds the paths referenced by the query's filters, sorts, and scopes.
pub(crate) fn extend<'a>(
    map: AliasMap,
    schema: &'a Schema,
    model: &'a Model,
    query: &'a Query,
) -> Result<AliasMap> {
    let mut planner = Planner { schema, query, map };

    for cond in query.filter.conds() {
        planner.walk_field(model, &cond.field)?;
    }

    for sort in &query.sorts {
        planner.walk_field(model, &sort.field)?;
    }

    for scope in &query.scopes {
        planner.walk_path(model, &split_path(&scope.path), true)?;
    }

    Ok(planner.map)
}

pub(crate) fn plan(schema: &Schema, model: &Model, query: &Query) -> Result<AliasMap> {
    let base = plan_preset(schema, model, query)?;
    extend(base, schema, model, query)
}

struct Planner<'a> {
    schema: &'a Schema,
    query: &'a Query,
    map: AliasMap,
}

impl<'a> Planner<'a> {
    fn walk_preset(
        &mut self,
        model: &'a Model,
        preset: &'a Preset,
        path: &str,
        lineage: &mut Vec<String>,
    ) -> Result<()> {
        for field in &preset.fields {
            match &field.ty {
                FieldTy::Computable => {
                    let computable = model.computable(&field.source).ok_or_else(|| {
                        Error::schema(format!(
                            "model `{}` has no computable `{}`",
                            model.name, field.source
                        ))
                    })?;
                    self.walk_computable(model, computable, path)?;
                }
                FieldTy::Preset(nested) => {
                    let relation = model.relation(&field.source)?;

                    // Tails are fetched by their own requests
                    if relation.is_tail() {
                        continue;
                    }

                    let target = self.schema.target(relation)?;
                    let child = join_path(path, &relation.name);
                    let entry = self.enter(model, relation, target, Some(field), path, lineage)?;

                    self.map.insert(&child, true, entry == Reentry::Truncate);

                    if entry == Reentry::Descend {
                        lineage.push(target.name.clone());
                        self.walk_preset(target, target.preset(nested)?, &child, lineage)?;
                        lineage.pop();
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Walks the relation prefix of a filter or sort field, then the paths
    /// referenced by any computable it names.
    fn walk_field(&mut self, model: &'a Model, field: &str) -> Result<()> {
        let (path, name) = match field.rsplit_once('.') {
            Some((path, name)) => (path, name),
            None => ("", field),
        };

        let (owner, path) = self.walk_path(model, &split_path(path), true)?;

        for part in split_compound(owner, name).into_iter().flatten() {
            if let Some(computable) = owner.computable(part) {
                self.walk_computable(owner, computable, &path)?;
            }
        }

        Ok(())
    }

    /// Walks the relation paths a computable at `path` references. The
    /// has-many relation of a CTE computable is aliased but not joined.
    fn walk_computable(&mut self, owner: &Model, computable: &Computable, path: &str) -> Result<()> {
        let root = self.schema.model(&self.query.model)?;

        for relation_path in &computable.paths {
            let join = computable.has_many.as_ref() != Some(relation_path);

            let mut segments = split_path(path);
            segments.extend(split_path(relation_path));

            self.walk_path(root, &segments, join).map_err(|err| {
                err.context(arbor_core::err!(
                    "computable `{}.{}`",
                    owner.name,
                    computable.name
                ))
            })?;
        }

        Ok(())
    }

    /// Walks `segments` from `model`, assigning aliases to new paths.
    /// Returns the model and path reached. `join` applies to the last
    /// segment; every prefix is joined.
    fn walk_path(
        &mut self,
        model: &'a Model,
        segments: &[&str],
        join: bool,
    ) -> Result<(&'a Model, String)> {
        let mut owner = model;
        let mut path = String::new();
        let mut lineage = self.query.lineage();

        for (i, segment) in segments.iter().enumerate() {
            if self.map.is_truncated(&path) {
                return Err(Error::cycle(format!(
                    "`{}` continues past `{path}`, which is at its reentrancy limit",
                    segments.join(".")
                )));
            }

            let relation = owner.relation(segment)?;

            if relation.is_polymorphic() {
                return Err(Error::schema(format!(
                    "cannot traverse polymorphic relation `{}.{segment}`",
                    owner.name
                )));
            }

            let target = self.schema.target(relation)?;
            let child = join_path(&path, segment);

            let truncated = if self.map.alias(&child).is_some() {
                self.map.is_truncated(&child)
            } else {
                self.enter(owner, relation, target, None, &path, &lineage)? == Reentry::Truncate
            };

            self.map.insert(&child, join || i + 1 < segments.len(), truncated);

            lineage.push(target.name.clone());
            owner = target;
            path = child;
        }

        Ok((owner, path))
    }

    fn enter(
        &self,
        owner: &Model,
        relation: &Relation,
        target: &Model,
        field: Option<&Field>,
        path: &str,
        lineage: &[String],
    ) -> Result<Reentry> {
        // The link of a through request was checked by the parent request
        if path.is_empty() && self.query.unwrap.as_deref() == Some(relation.name.as_str()) {
            return Ok(if self.query.truncated {
                Reentry::Truncate
            } else {
                Reentry::Descend
            });
        }

        reentry(self.schema, owner, relation, target, field, lineage)
    }
}
