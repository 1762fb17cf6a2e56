//! Relation fields resolved by batched child requests.

use super::{
    plan::{reentry, AliasMap, Reentry},
    query::{join_path, Keys, Query, Scope},
    select::{hidden, GROUP_KEY},
};
use crate::Config;

use arbor_core::{
    schema::{Field, FieldTy, Model, Preset, Relation},
    stmt::{Filter, Sort},
    Document, Error, Result, Schema, Value,
};
use indexmap::IndexMap;

use std::collections::HashMap;

/// A has-one, has-many, or polymorphic belongs-to field found in the
/// preset, at any `belongs_to` nesting depth.
#[derive(Debug)]
pub(super) struct Tail<'a> {
    /// Segments leading to the document holding the field
    path: Vec<String>,

    owner: &'a Model,
    field: &'a Field,
    relation: &'a Relation,

    /// Models from the outermost ancestor down to `owner`
    lineage: Vec<String>,
}

/// One child request issued for a tail.
#[derive(Debug)]
pub(super) struct Fetch {
    /// Index of the tail in the collected list
    pub(super) tail: usize,

    /// Discriminator value of a polymorphic request
    pub(super) discriminator: Option<String>,

    pub(super) query: Query,
}

/// Child documents returned for one tail, grouped by discriminator and key.
#[derive(Debug, Default)]
pub(super) struct Children {
    groups: HashMap<(Option<String>, String), Vec<Document>>,
}

/// Finds every tail the documents of `query` need.
pub(super) fn collect<'a>(
    schema: &'a Schema,
    model: &'a Model,
    query: &'a Query,
    aliases: &AliasMap,
) -> Result<Vec<Tail<'a>>> {
    let mut out = vec![];

    if let Some(preset) = query.preset() {
        if !query.root_truncated() {
            let mut collect = Collect {
                schema,
                aliases,
                out: &mut out,
            };
            collect.preset(model, preset, "", &mut vec![], &mut query.lineage())?;
        }
    }

    Ok(out)
}

struct Collect<'a, 'b> {
    schema: &'a Schema,
    aliases: &'b AliasMap,
    out: &'b mut Vec<Tail<'a>>,
}

impl<'a> Collect<'a, '_> {
    fn preset(
        &mut self,
        model: &'a Model,
        preset: &'a Preset,
        path: &str,
        segments: &mut Vec<String>,
        lineage: &mut Vec<String>,
    ) -> Result<()> {
        for field in &preset.fields {
            let FieldTy::Preset(nested) = &field.ty else {
                continue;
            };

            let relation = model.relation(&field.source)?;

            if relation.is_tail() {
                self.out.push(Tail {
                    path: segments.clone(),
                    owner: model,
                    field,
                    relation,
                    lineage: lineage.clone(),
                });
                continue;
            }

            let child = join_path(path, &relation.name);
            if self.aliases.is_truncated(&child) {
                continue;
            }

            let target = self.schema.target(relation)?;

            segments.push(field.key.clone());
            lineage.push(target.name.clone());
            self.preset(target, target.preset(nested)?, &child, segments, lineage)?;
            lineage.pop();
            segments.pop();
        }

        Ok(())
    }
}

impl Tail<'_> {
    /// Builds the child requests for this tail from the parent keys present
    /// in `docs`. Returns nothing when no parent has a key.
    pub(super) fn fetches(
        &self,
        index: usize,
        schema: &Schema,
        config: &Config,
        parent: &Query,
        docs: &[Document],
    ) -> Result<Vec<Fetch>> {
        let mut out = vec![];

        if let Some(polymorphic) = &self.relation.polymorphic {
            let mut by_type: IndexMap<String, IndexMap<String, Value>> = IndexMap::new();

            for owner in owners(&self.path, docs) {
                let Some(discriminator) = discriminator(owner, &polymorphic.type_column) else {
                    continue;
                };
                let Some((key, value)) = key_of(owner, &self.relation.fk) else {
                    continue;
                };

                by_type
                    .entry(discriminator)
                    .or_default()
                    .entry(key)
                    .or_insert(value);
            }

            for (discriminator, keys) in by_type {
                let model = schema.model(polymorphic.model_for(&discriminator))?;
                let query = self.polymorphic(schema, parent, model, keys.into_values().collect())?;

                out.push(Fetch {
                    tail: index,
                    discriminator: Some(discriminator),
                    query,
                });
            }

            return Ok(out);
        }

        let mut keys = IndexMap::new();
        for owner in owners(&self.path, docs) {
            if let Some((key, value)) = key_of(owner, &self.relation.pk) {
                keys.entry(key).or_insert(value);
            }
        }

        if keys.is_empty() {
            return Ok(out);
        }

        let keys = keys.into_values().collect();
        let query = match &self.relation.through {
            Some(_) => self.through(schema, config, parent, keys)?,
            None => self.direct(schema, config, parent, keys)?,
        };

        out.push(Fetch {
            tail: index,
            discriminator: None,
            query,
        });

        Ok(out)
    }

    /// Writes the children into every parent document.
    pub(super) fn merge(&self, children: &Children, docs: &mut [Document]) {
        for doc in docs {
            let Some(owner) = doc.doc_at_mut(&self.path) else {
                continue;
            };

            let value = match &self.relation.polymorphic {
                Some(polymorphic) => {
                    let found = discriminator(owner, &polymorphic.type_column).and_then(|discriminator| {
                        let (key, _) = key_of(owner, &self.relation.fk)?;
                        children.get(Some(discriminator), key)?.first().cloned()
                    });
                    found.map(Value::Object).unwrap_or(Value::Null)
                }
                // The holding document itself is missing
                None if key_of(owner, &self.relation.pk).is_none() => Value::Null,
                None => {
                    let group = key_of(owner, &self.relation.pk)
                        .and_then(|(key, _)| children.get(None, key))
                        .unwrap_or(&[]);

                    if self.relation.is_has_many() {
                        self.list(group)
                    } else {
                        group.first().cloned().map(Value::Object).unwrap_or(Value::Null)
                    }
                }
            };

            owner.insert(self.field.key.clone(), value);
        }
    }

    fn list(&self, children: &[Document]) -> Value {
        let items = children
            .iter()
            .map(|child| match &self.field.formatter {
                Some(formatter) => Value::String(formatter.render(child)),
                None => Value::Object(child.clone()),
            })
            .collect();

        Value::List(items)
    }

    fn nested(&self) -> Result<&str> {
        self.field.nested_preset().ok_or_else(|| {
            Error::schema(format!(
                "field `{}.{}` is not a preset field",
                self.owner.name, self.field.key
            ))
        })
    }

    fn reentry(&self, schema: &Schema, target: &Model) -> Result<Reentry> {
        reentry(
            schema,
            self.owner,
            self.relation,
            target,
            Some(self.field),
            &self.lineage,
        )
    }

    fn sorts(&self, prefix: Option<&str>) -> Result<Vec<Sort>> {
        self.relation
            .sorts
            .iter()
            .map(|src| {
                let mut sort = Sort::parse(src)?;
                if let Some(prefix) = prefix {
                    sort.field = join_path(prefix, &sort.field);
                }
                Ok(sort)
            })
            .collect()
    }

    /// `has_one` / `has_many`: target rows whose foreign key matches.
    fn direct(&self, schema: &Schema, config: &Config, parent: &Query, keys: Vec<Value>) -> Result<Query> {
        let target = schema.target(self.relation)?;
        let preset = target.preset(self.nested()?)?.clone();

        let mut query = Query::child(&target.name, Some(preset), Filter::all(), self.sorts(None)?);
        self.restrict(&mut query, parent, &self.relation.fk, keys);
        query.truncated = self.reentry(schema, target)? == Reentry::Truncate;

        if self.relation.is_has_many() {
            query.limit = Some(config.has_many_limit);
        } else {
            query.one_per_group = true;
        }

        if let Some(filter) = &self.relation.filter {
            query.scopes.push(Scope {
                path: String::new(),
                filter: filter.clone(),
            });
        }

        Ok(query)
    }

    /// Through relations: junction rows whose foreign key matches, each
    /// carrying the linked target document. The junction rows are replaced
    /// by the targets once resolved.
    fn through(&self, schema: &Schema, config: &Config, parent: &Query, keys: Vec<Value>) -> Result<Query> {
        let Some(through) = &self.relation.through else {
            return Err(Error::schema(format!(
                "relation `{}.{}` has no junction",
                self.owner.name, self.relation.name
            )));
        };

        let junction = schema.model(&through.model)?;
        let target = schema.target(self.relation)?;
        let nested = self.nested()?;
        target.preset(nested)?;

        let preset = Preset::synthetic(
            format!("{}:{nested}", through.link),
            vec![Field::preset(&through.link, nested)],
        );

        let mut query = Query::child(
            &junction.name,
            Some(preset),
            Filter::all(),
            self.sorts(Some(&through.link))?,
        );
        self.restrict(&mut query, parent, &self.relation.fk, keys);
        query.truncated = self.reentry(schema, target)? == Reentry::Truncate;
        query.unwrap = Some(through.link.clone());

        if self.relation.is_has_many() {
            query.limit = Some(config.has_many_limit);
        } else {
            query.one_per_group = true;
        }

        if let Some(filter) = &through.filter {
            query.scopes.push(Scope {
                path: String::new(),
                filter: filter.clone(),
            });
        }

        if let Some(filter) = &self.relation.filter {
            query.scopes.push(Scope {
                path: through.link.clone(),
                filter: filter.clone(),
            });
        }

        Ok(query)
    }

    /// Polymorphic `belongs_to`: rows of one concrete model by key.
    fn polymorphic(&self, schema: &Schema, parent: &Query, model: &Model, keys: Vec<Value>) -> Result<Query> {
        let preset = model.preset(self.nested()?)?.clone();

        let mut query = Query::child(&model.name, Some(preset), Filter::all(), vec![]);
        self.restrict(&mut query, parent, &self.relation.pk, keys);
        query.truncated = self.reentry(schema, model)? == Reentry::Truncate;

        if let Some(filter) = &self.relation.filter {
            query.scopes.push(Scope {
                path: String::new(),
                filter: filter.clone(),
            });
        }

        Ok(query)
    }

    fn restrict(&self, query: &mut Query, parent: &Query, column: &str, keys: Vec<Value>) {
        query.keys = Some(Keys {
            column: column.to_string(),
            values: keys,
        });
        query.group = Some(column.to_string());
        query.ancestry = self.lineage.clone();
        query.locale = parent.locale.clone();
    }
}

impl Children {
    /// Files child documents under their `__group` key, removing it.
    pub(super) fn add(&mut self, discriminator: Option<String>, docs: Vec<Document>) {
        for mut doc in docs {
            let Some(key) = doc.remove(GROUP_KEY).and_then(|group| group.key()) else {
                continue;
            };

            self.groups
                .entry((discriminator.clone(), key))
                .or_default()
                .push(doc);
        }
    }

    fn get(&self, discriminator: Option<String>, key: String) -> Option<&[Document]> {
        self.groups
            .get(&(discriminator, key))
            .map(Vec::as_slice)
    }
}

/// Documents holding a tail field at `path`, one per parent row.
fn owners<'d>(path: &'d [String], docs: &'d [Document]) -> impl Iterator<Item = &'d Document> + 'd {
    docs.iter().filter_map(move |doc| doc.doc_at(path))
}

/// The canonical key and wire value of the hidden column `column`.
fn key_of(owner: &Document, column: &str) -> Option<(String, Value)> {
    let value = owner.get(&hidden(column))?;
    Some((value.key()?, value.clone()))
}

fn discriminator(owner: &Document, column: &str) -> Option<String> {
    match owner.get(&hidden(column))? {
        Value::Null => None,
        value => Some(value.to_text()),
    }
}

/// Replaces through junction rows by their linked documents, carrying the
/// group key over. Rows without a linked document are dropped.
pub(super) fn unwrap(link: &str, docs: Vec<Document>) -> Vec<Document> {
    docs.into_iter()
        .filter_map(|mut doc| {
            let group = doc.remove(GROUP_KEY);
            let Some(Value::Object(mut linked)) = doc.remove(link) else {
                return None;
            };

            if let Some(group) = group {
                linked.insert(GROUP_KEY, group);
            }
            Some(linked)
        })
        .collect()
}
