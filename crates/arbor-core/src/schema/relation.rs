use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    BelongsTo,
    HasOne,
    HasMany,
}

/// An association from one model to another.
#[derive(Debug, Clone)]
pub struct Relation {
    /// Relation name, unique within the owning model
    pub name: String,

    pub kind: RelationKind,

    /// Target model name. `None` for polymorphic relations, whose target is
    /// picked per row by the discriminator column.
    pub target: Option<String>,

    /// Foreign key column. Lives on the owner for `belongs_to`, on the target
    /// (or the junction) otherwise.
    pub fk: String,

    /// Referenced key column. Lives on the target for `belongs_to`, on the
    /// owner otherwise.
    pub pk: String,

    pub through: Option<Through>,

    /// Row filter applied to the related table. `{column}` placeholders refer
    /// to the related table's columns.
    pub filter: Option<String>,

    /// May revisit a model already present earlier on the same path
    pub reentrant: bool,

    pub max_depth: Option<usize>,

    pub polymorphic: Option<Polymorphic>,

    /// Default ordering of child rows fetched for this relation
    pub sorts: Vec<String>,
}

/// Many-to-many association through a junction model.
#[derive(Debug, Clone)]
pub struct Through {
    /// Junction model name
    pub model: String,

    /// The junction's `belongs_to` relation pointing at the target
    pub link: String,

    /// Row filter applied to the junction table
    pub filter: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Polymorphic {
    /// Column on the owner holding the discriminator
    pub type_column: String,

    /// Discriminator value to model name. Discriminators missing from the map
    /// name the model directly.
    pub types: IndexMap<String, String>,
}

impl RelationKind {
    pub fn parse(name: &str) -> Option<RelationKind> {
        match name {
            "belongs_to" => Some(RelationKind::BelongsTo),
            "has_one" => Some(RelationKind::HasOne),
            "has_many" => Some(RelationKind::HasMany),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::BelongsTo => "belongs_to",
            RelationKind::HasOne => "has_one",
            RelationKind::HasMany => "has_many",
        }
    }
}

impl Relation {
    pub fn is_belongs_to(&self) -> bool {
        self.kind == RelationKind::BelongsTo
    }

    pub fn is_has_one(&self) -> bool {
        self.kind == RelationKind::HasOne
    }

    pub fn is_has_many(&self) -> bool {
        self.kind == RelationKind::HasMany
    }

    pub fn is_polymorphic(&self) -> bool {
        self.polymorphic.is_some()
    }

    /// Joining this relation can multiply the owner's rows.
    pub fn fans_out(&self) -> bool {
        !self.is_belongs_to()
    }

    /// Resolved by a separate batched request instead of a join when used as
    /// a preset field.
    pub fn is_tail(&self) -> bool {
        !self.is_belongs_to() || self.is_polymorphic()
    }
}

impl Polymorphic {
    /// Model name for a discriminator value.
    pub fn model_for<'a>(&'a self, discriminator: &'a str) -> &'a str {
        self.types
            .get(discriminator)
            .map(String::as_str)
            .unwrap_or(discriminator)
    }
}
