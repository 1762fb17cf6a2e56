use super::def::{FieldDef, ModelDef, PolymorphicDef, RelationDef};
use super::{
    ColumnTy, Computable, Field, FieldTy, Model, Polymorphic, Preset, Relation, RelationKind,
    Schema, Through, DEFAULT_MAX_DEPTH,
};
use crate::template::{self, Template};
use crate::{err, Error, Result};

use heck::ToSnakeCase;
use indexmap::IndexMap;

/// Links model definitions into a [`Schema`].
#[derive(Debug)]
pub struct Builder {
    defs: IndexMap<String, ModelDef>,
    default_max_depth: usize,
}

/// Used to track state during the build process
struct BuildSchema<'a> {
    builder: &'a Builder,

    /// Models as they are built
    models: IndexMap<String, Model>,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            defs: IndexMap::new(),
            default_max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn model(&mut self, name: impl Into<String>, def: ModelDef) -> &mut Self {
        self.defs.insert(name.into(), def);
        self
    }

    pub fn models(&mut self, defs: impl IntoIterator<Item = (String, ModelDef)>) -> &mut Self {
        self.defs.extend(defs);
        self
    }

    /// Reentrancy depth for relations that do not declare `max_depth`.
    pub fn default_max_depth(&mut self, depth: usize) -> &mut Self {
        self.default_max_depth = depth;
        self
    }

    pub fn build(&self) -> Result<Schema> {
        let mut builder = BuildSchema {
            builder: self,
            models: IndexMap::new(),
        };

        for (name, def) in &self.defs {
            let model = builder.build_model_shell(name, def)?;
            builder.models.insert(name.clone(), model);
        }

        for (name, def) in &self.defs {
            for (relation_name, relation_def) in &def.relations {
                let relation = builder
                    .build_relation(name, relation_name, relation_def)
                    .map_err(|e| e.context(err!("relation `{name}.{relation_name}`")))?;

                builder.model_mut(name).relations.insert(relation_name.clone(), relation);
            }
        }

        // Links need every junction's relations in place
        builder.link_through_relations()?;

        for (name, def) in &self.defs {
            for (computable_name, computable_def) in &def.computables {
                let computable = builder
                    .build_computable(name, computable_name, computable_def.expr(), computable_def.ty())
                    .map_err(|e| e.context(err!("computable `{name}.{computable_name}`")))?;

                builder
                    .model_mut(name)
                    .computables
                    .insert(computable_name.clone(), computable);
            }
        }

        for (name, def) in &self.defs {
            for preset_name in def.presets.keys() {
                let preset = builder
                    .build_preset(name, def, preset_name)
                    .map_err(|e| e.context(err!("preset `{name}.{preset_name}`")))?;

                builder.model_mut(name).presets.insert(preset_name.clone(), preset);
            }
        }

        let schema = Schema {
            models: builder.models,
            default_max_depth: self.default_max_depth,
        };

        schema.verify_aliases()?;
        schema.verify()?;

        Ok(schema)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildSchema<'_> {
    fn model(&self, name: &str) -> Result<&Model> {
        self.models
            .get(name)
            .ok_or_else(|| Error::schema(format!("unknown model `{name}`")))
    }

    fn model_mut(&mut self, name: &str) -> &mut Model {
        &mut self.models[name]
    }

    fn build_model_shell(&self, name: &str, def: &ModelDef) -> Result<Model> {
        let mut columns = IndexMap::new();
        for (column, ty) in &def.columns {
            columns.insert(column.clone(), ColumnTy::parse(ty)?);
        }

        let primary_key = match &def.primary_key {
            Some(pk) => pk.to_vec(),
            None => vec!["id".to_string()],
        };

        if primary_key.is_empty() {
            return Err(Error::schema(format!("model `{name}` has an empty primary key")));
        }

        Ok(Model {
            name: name.to_string(),
            table: def.table.clone().unwrap_or_else(|| name.to_snake_case()),
            primary_key,
            columns,
            relations: IndexMap::new(),
            presets: IndexMap::new(),
            computables: IndexMap::new(),
            aliases: def.aliases.clone(),
        })
    }

    fn build_relation(&self, owner: &str, name: &str, def: &RelationDef) -> Result<Relation> {
        let Some(kind) = RelationKind::parse(&def.kind) else {
            return Err(Error::schema(format!("invalid relation type `{}`", def.kind)));
        };

        let polymorphic = match &def.polymorphic {
            None | Some(PolymorphicDef::Flag(false)) => None,
            Some(PolymorphicDef::Flag(true)) => Some(Polymorphic {
                type_column: format!("{name}_type"),
                types: IndexMap::new(),
            }),
            Some(PolymorphicDef::Config { type_column, types }) => Some(Polymorphic {
                type_column: type_column.clone().unwrap_or_else(|| format!("{name}_type")),
                types: types.clone(),
            }),
        };

        if let Some(polymorphic) = &polymorphic {
            if def.through.is_some() {
                return Err(Error::schema(
                    "`through` and `polymorphic` are mutually exclusive",
                ));
            }

            if kind != RelationKind::BelongsTo {
                return Err(Error::schema("only belongs_to relations can be polymorphic"));
            }

            for model in polymorphic.types.values() {
                self.model(model)?;
            }
        }

        let owner_model = self.model(owner)?;

        let target = match (&polymorphic, &def.model) {
            (Some(_), _) => None,
            (None, Some(target)) => Some(self.model(target)?),
            (None, None) => return Err(Error::schema("relation has no target `model`")),
        };

        let (fk, pk) = match (kind, target) {
            (RelationKind::BelongsTo, Some(target)) => (
                def.fk
                    .clone()
                    .unwrap_or_else(|| format!("{}_id", target.name.to_snake_case())),
                def.pk.clone().unwrap_or_else(|| target.key_column().to_string()),
            ),
            (RelationKind::BelongsTo, None) => (
                def.fk.clone().unwrap_or_else(|| format!("{name}_id")),
                def.pk.clone().unwrap_or_else(|| "id".to_string()),
            ),
            (RelationKind::HasOne | RelationKind::HasMany, _) => (
                def.fk
                    .clone()
                    .unwrap_or_else(|| format!("{}_id", owner.to_snake_case())),
                def.pk
                    .clone()
                    .unwrap_or_else(|| owner_model.key_column().to_string()),
            ),
        };

        let through = match &def.through {
            None => None,
            Some(_) if kind == RelationKind::BelongsTo => {
                return Err(Error::schema("through relations must be has_one or has_many"))
            }
            Some(junction) => {
                self.model(junction)?;
                Some(Through {
                    model: junction.clone(),
                    link: String::new(),
                    filter: def.through_filter.clone(),
                })
            }
        };

        Ok(Relation {
            name: name.to_string(),
            kind,
            target: target.map(|target| target.name.clone()),
            fk,
            pk,
            through,
            filter: def.filter.clone(),
            reentrant: def.reentrant,
            max_depth: def.max_depth,
            polymorphic,
            sorts: def.sorts.clone(),
        })
    }

    /// Finds, for every `through` relation, the junction's `belongs_to`
    /// relation pointing at the target.
    fn link_through_relations(&mut self) -> Result<()> {
        let mut links = vec![];

        for model in self.models.values() {
            for relation in model.relations.values() {
                let (Some(through), Some(target)) = (&relation.through, &relation.target) else {
                    continue;
                };

                let junction = self.model(&through.model)?;
                let candidates: Vec<&Relation> = junction
                    .relations
                    .values()
                    .filter(|link| link.is_belongs_to() && link.target.as_ref() == Some(target))
                    .collect();

                let link = match &candidates[..] {
                    [] => {
                        return Err(Error::schema(format!(
                            "through link not found: junction `{}` has no belongs_to relation to `{target}` (relation `{}.{}`)",
                            junction.name, model.name, relation.name
                        )))
                    }
                    [link] => link.name.clone(),
                    _ => {
                        let preferred = target.to_snake_case();
                        match candidates.iter().find(|link| link.name == preferred) {
                            Some(link) => link.name.clone(),
                            None => {
                                return Err(Error::schema(format!(
                                    "junction `{}` has more than one belongs_to relation to `{target}` (relation `{}.{}`)",
                                    junction.name, model.name, relation.name
                                )))
                            }
                        }
                    }
                };

                links.push((model.name.clone(), relation.name.clone(), link));
            }
        }

        for (model, relation, link) in links {
            if let Some(through) = &mut self.model_mut(&model).relations[&relation].through {
                through.link = link;
            }
        }

        Ok(())
    }

    fn build_computable(
        &self,
        owner: &str,
        name: &str,
        expr: &str,
        ty: Option<&str>,
    ) -> Result<Computable> {
        let ty = ty.map(ColumnTy::parse).transpose()?.unwrap_or_default();
        let mut computable = Computable::new(name, expr, ty);
        let model = self.model(owner)?;

        let mut has_many = vec![];

        for path in &computable.paths {
            let mut current = model;

            for (depth, segment) in path.split('.').enumerate() {
                let relation = current.relation(segment)?;

                if relation.is_polymorphic() {
                    return Err(Error::schema(format!(
                        "cannot reference polymorphic relation `{segment}`"
                    )));
                }

                if relation.is_has_many() {
                    if depth > 0 {
                        return Err(Error::schema(format!(
                            "`{path}` aggregates over a nested has_many relation; only direct has_many relations are supported"
                        )));
                    }
                    has_many.push(path.clone());
                }

                if let Some(target) = &relation.target {
                    current = self.model(target)?;
                }
            }
        }

        match &has_many[..] {
            [] => {}
            [path] if computable.paths.len() == 1 => computable.has_many = Some(path.clone()),
            [_] => {
                return Err(Error::schema(
                    "an expression over a has_many relation cannot reference other relations",
                ))
            }
            _ => {
                return Err(Error::schema(
                    "expression references more than one has_many relation",
                ))
            }
        }

        Ok(computable)
    }

    fn build_preset(&mut self, owner: &str, def: &ModelDef, name: &str) -> Result<Preset> {
        let field_defs = resolve_extends(def, name, &mut vec![])?;

        let mut fields = Vec::with_capacity(field_defs.len());
        let mut declared = vec![];

        for field_def in &field_defs {
            let field = self.build_field(owner, field_def).map_err(|e| {
                e.context(err!("field `{}`", field_def.alias.as_ref().unwrap_or(&field_def.source)))
            })?;

            if let FieldTy::Column(ty) = field.ty {
                if field_def.ty.is_some() {
                    declared.push((field.source.clone(), ty));
                }
            }

            fields.push(field);
        }

        let model = self.model_mut(owner);
        for (column, ty) in declared {
            model.columns.entry(column).or_insert(ty);
        }

        Ok(Preset {
            name: name.to_string(),
            fields,
        })
    }

    fn build_field(&self, owner: &str, def: &FieldDef) -> Result<Field> {
        let model = self.model(owner)?;
        let has_placeholder = template::has_placeholders(&def.source);

        let ty = match def.ty.as_deref() {
            Some("preset") => match &def.preset {
                Some(preset) => FieldTy::Preset(preset.clone()),
                None => return Err(Error::schema("field of type `preset` needs a `preset` name")),
            },
            Some("formatter") => FieldTy::Formatter(Template::parse(&def.source)),
            Some("nested_field") => FieldTy::NestedField(Template::parse(&def.source)),
            Some("computable") => FieldTy::Computable,
            Some(ty) => FieldTy::Column(ColumnTy::parse(ty)?),
            None if has_placeholder => FieldTy::Formatter(Template::parse(&def.source)),
            None if model.computables.contains_key(&def.source) => FieldTy::Computable,
            None if model.relations.contains_key(&def.source) => match &def.preset {
                Some(preset) => FieldTy::Preset(preset.clone()),
                None => return Err(Error::schema("relation field needs a `preset`")),
            },
            None => FieldTy::Column(model.column_ty(&def.source)),
        };

        match &ty {
            FieldTy::Formatter(_) | FieldTy::NestedField(_) => {}
            _ if has_placeholder => {
                return Err(Error::schema(
                    "a source with placeholders must be a formatter or nested_field",
                ))
            }
            FieldTy::Column(_) => {
                if !is_plain_name(&def.source) {
                    return Err(Error::schema(
                        "column fields must name a column; use nested_field for paths",
                    ));
                }
            }
            FieldTy::Computable => {
                if !model.computables.contains_key(&def.source) {
                    return Err(Error::schema(format!(
                        "model `{owner}` has no computable `{}`",
                        def.source
                    )));
                }
            }
            FieldTy::Preset(preset) => {
                let relation = model.relation(&def.source)?;

                if let Some(target) = &relation.target {
                    let target_def = &self.builder.defs[target];
                    if !target_def.presets.contains_key(preset) {
                        return Err(Error::schema(format!(
                            "model `{target}` has no preset `{preset}`"
                        )));
                    }
                }
            }
        }

        if def.formatter.is_some() && !matches!(ty, FieldTy::Preset(_)) {
            return Err(Error::schema("`formatter` is only allowed on preset fields"));
        }

        Ok(Field {
            key: def.alias.clone().unwrap_or_else(|| def.source.clone()),
            source: def.source.clone(),
            ty,
            internal: def.internal,
            localize: def.localize,
            formatter: def.formatter.as_deref().map(Template::parse),
            max_depth: def.max_depth,
        })
    }
}

/// Flattens a preset's `extends` chain into one field list. Parents are
/// applied left to right; a field whose output key is already present
/// replaces the earlier definition in place.
fn resolve_extends(def: &ModelDef, name: &str, stack: &mut Vec<String>) -> Result<Vec<FieldDef>> {
    if stack.iter().any(|entry| entry == name) {
        stack.push(name.to_string());
        return Err(Error::schema(format!(
            "preset `extends` cycle: {}",
            stack.join(" -> ")
        )));
    }

    let Some(preset) = def.presets.get(name) else {
        return Err(Error::schema(format!("unknown preset `{name}` in `extends`")));
    };

    stack.push(name.to_string());

    let mut fields: Vec<FieldDef> = vec![];

    for parent in preset.extends.iter().flat_map(|extends| extends.to_vec()) {
        for field in resolve_extends(def, &parent, stack)? {
            merge_field(&mut fields, field);
        }
    }

    for field in &preset.fields {
        merge_field(&mut fields, field.clone());
    }

    stack.pop();

    Ok(fields)
}

fn merge_field(fields: &mut Vec<FieldDef>, field: FieldDef) {
    let key = output_key(&field);

    match fields.iter_mut().find(|existing| output_key(existing) == key) {
        Some(existing) => *existing = field,
        None => fields.push(field),
    }
}

fn output_key(field: &FieldDef) -> &str {
    field.alias.as_deref().unwrap_or(&field.source)
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Schema {
    /// Every path alias must expand to a walkable relation prefix.
    fn verify_aliases(&self) -> Result<()> {
        for model in self.models() {
            for (shortcut, path) in &model.aliases {
                let segments: Vec<&str> = path.split('.').collect();
                let (last, prefix) = segments
                    .split_last()
                    .ok_or_else(|| Error::schema(format!("empty path alias `{shortcut}`")))?;

                let owner = self.model_at(model, prefix).map_err(|e| {
                    e.context(err!("path alias `{}.{shortcut}` -> `{path}`", model.name))
                })?;

                let known = owner.relations.contains_key(*last)
                    || owner.computables.contains_key(*last)
                    || owner.columns.contains_key(*last)
                    || owner.primary_key.iter().any(|pk| pk == last);

                if !known {
                    tracing::debug!(
                        model = %model.name,
                        shortcut,
                        path,
                        "path alias ends in an undeclared column"
                    );
                }
            }
        }

        Ok(())
    }
}
