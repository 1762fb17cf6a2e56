use super::{
    plan::AliasMap,
    query::{join_path, Query},
};

use arbor_core::{
    schema::{ColumnTy, FieldTy, Model, Preset},
    Error, Result, Schema,
};

/// Key under which a child request returns the value matching it to its
/// parent row.
pub(crate) const GROUP_KEY: &str = "__group";

/// One selected column. The compiler lowers `source` to an expression, the
/// materializer stores the row value under `key`. Both walk the same list,
/// so values line up positionally.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Column {
    /// Relation path of the table the column belongs to
    pub(crate) path: String,

    pub(crate) source: Source,

    /// Dotted output key, e.g. `author.name`
    pub(crate) key: String,

    /// Declared type the wire value is coerced to. `None` keeps the wire
    /// value, used for keys matched against child rows.
    pub(crate) ty: Option<ColumnTy>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Source {
    Column(String),
    Computable(String),
}

/// Key of a hidden column carrying `column` for tail matching.
pub(crate) fn hidden(column: &str) -> String {
    format!("__{column}")
}

pub(crate) fn is_hidden(key: &str) -> bool {
    key.starts_with("__")
}

/// Computes the column list for a list query.
pub(crate) fn columns(
    schema: &Schema,
    model: &Model,
    aliases: &AliasMap,
    query: &Query,
) -> Result<Vec<Column>> {
    let mut out = vec![];

    if let Some(preset) = query.preset() {
        let mut walk = Walk {
            schema,
            aliases,
            out: &mut out,
        };
        walk.preset(model, preset, "", "", query.root_truncated())?;
    }

    if let Some(group) = &query.group {
        out.push(Column {
            path: String::new(),
            source: Source::Column(group.clone()),
            key: GROUP_KEY.to_string(),
            ty: None,
        });
    }

    Ok(out)
}

struct Walk<'a> {
    schema: &'a Schema,
    aliases: &'a AliasMap,
    out: &'a mut Vec<Column>,
}

impl Walk<'_> {
    fn preset(
        &mut self,
        model: &Model,
        preset: &Preset,
        path: &str,
        prefix: &str,
        truncated: bool,
    ) -> Result<()> {
        for field in &preset.fields {
            let key = format!("{prefix}{}", field.key);

            match &field.ty {
                FieldTy::Column(ty) => self.push(path, Source::Column(field.source.clone()), key, Some(*ty)),
                FieldTy::Computable if !truncated => {
                    let computable = model.computable(&field.source).ok_or_else(|| {
                        Error::schema(format!(
                            "model `{}` has no computable `{}`",
                            model.name, field.source
                        ))
                    })?;
                    self.push(
                        path,
                        Source::Computable(computable.name.clone()),
                        key,
                        Some(computable.ty),
                    );
                }
                FieldTy::Preset(nested) if !truncated => {
                    let relation = model.relation(&field.source)?;

                    if let Some(polymorphic) = &relation.polymorphic {
                        self.push_hidden(path, prefix, &relation.fk);
                        self.push_hidden(path, prefix, &polymorphic.type_column);
                    } else if relation.is_tail() {
                        self.push_hidden(path, prefix, &relation.pk);
                    } else {
                        let child = join_path(path, &relation.name);
                        self.aliases.resolve(&child)?;

                        let target = self.schema.target(relation)?;
                        let nested = target.preset(nested)?;
                        let truncated = self.aliases.is_truncated(&child);
                        self.preset(target, nested, &child, &format!("{key}."), truncated)?;
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn push(&mut self, path: &str, source: Source, key: String, ty: Option<ColumnTy>) {
        self.out.push(Column {
            path: path.to_string(),
            source,
            key,
            ty,
        });
    }

    fn push_hidden(&mut self, path: &str, prefix: &str, column: &str) {
        let key = format!("{prefix}{}", hidden(column));

        if !self.out.iter().any(|existing| existing.key == key) {
            self.push(path, Source::Column(column.to_string()), key, None);
        }
    }
}
