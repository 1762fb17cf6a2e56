mod builder;
pub use builder::Builder;

mod column;
pub use column::ColumnTy;

mod computable;
pub use computable::{is_aggregate, Computable};

pub mod def;

mod field;
pub use field::{Field, FieldTy};

mod model;
pub use model::Model;

mod preset;
pub use preset::Preset;

mod relation;
pub use relation::{Polymorphic, Relation, RelationKind, Through};

mod verify;

use crate::{Error, Result};
use indexmap::IndexMap;

/// Reentrancy depth used when neither the field nor the relation sets one.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// The linked schema graph.
///
/// Models are stored in an arena keyed by name. Relations and preset fields
/// refer to other models by name and resolve them on lookup, so the graph has
/// no ownership cycles. A `Schema` is immutable once built and is shared
/// across concurrent requests.
#[derive(Debug)]
pub struct Schema {
    models: IndexMap<String, Model>,

    /// Reentrancy depth applied when a relation does not declare one
    pub default_max_depth: usize,
}

/// One relation hop resolved while walking a dotted path.
#[derive(Debug, Clone, Copy)]
pub struct Step<'a> {
    /// Model owning the relation
    pub owner: &'a Model,

    pub relation: &'a Relation,

    /// Model the relation points at. `None` for polymorphic relations.
    pub target: Option<&'a Model>,
}

impl Schema {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn model(&self, name: &str) -> Result<&Model> {
        self.models
            .get(name)
            .ok_or_else(|| Error::schema(format!("unknown model `{name}`")))
    }

    pub fn get_model(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    pub fn models(&self) -> impl ExactSizeIterator<Item = &Model> {
        self.models.values()
    }

    /// Returns the model a relation points at.
    pub fn target(&self, relation: &Relation) -> Result<&Model> {
        match &relation.target {
            Some(target) => self.model(target),
            None => Err(Error::schema(format!(
                "relation `{}` is polymorphic and has no fixed target",
                relation.name
            ))),
        }
    }

    /// Walks a relation path starting at `model`, returning one step per
    /// segment. Every segment must name a relation; polymorphic relations
    /// can only appear last.
    pub fn walk<'a, S: AsRef<str>>(&'a self, model: &'a Model, path: &[S]) -> Result<Vec<Step<'a>>> {
        let mut steps = Vec::with_capacity(path.len());
        let mut owner = model;

        for (i, segment) in path.iter().enumerate() {
            let segment = segment.as_ref();
            let relation = owner.relation(segment)?;

            let target = match &relation.target {
                Some(target) => Some(self.model(target)?),
                None if i + 1 == path.len() => None,
                None => {
                    return Err(Error::schema(format!(
                        "cannot traverse polymorphic relation `{}.{segment}`",
                        owner.name
                    )))
                }
            };

            steps.push(Step {
                owner,
                relation,
                target,
            });

            if let Some(target) = target {
                owner = target;
            }
        }

        Ok(steps)
    }

    /// Returns the model reached by following `path` from `model`.
    pub fn model_at<'a, S: AsRef<str>>(&'a self, model: &'a Model, path: &[S]) -> Result<&'a Model> {
        match self.walk(model, path)?.last() {
            None => Ok(model),
            Some(step) => step
                .target
                .ok_or_else(|| Error::schema("polymorphic relation used as a path prefix")),
        }
    }

    /// Effective reentrancy depth for a relation, optionally overridden by the
    /// preset field that follows it.
    pub fn max_depth(&self, relation: &Relation, field: Option<&Field>) -> usize {
        field
            .and_then(|field| field.max_depth)
            .or(relation.max_depth)
            .unwrap_or(self.default_max_depth)
    }
}
