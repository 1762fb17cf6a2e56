use super::{
    plan::AliasMap,
    query::{join_path, Query},
    select::{is_hidden, GROUP_KEY},
    Engine,
};
use crate::localize::{localize, Localizer};

use arbor_core::{
    schema::{FieldTy, Model, Preset},
    Document, Result, Schema, Value,
};

impl Engine {
    /// Turns merged documents into their output shape.
    ///
    /// The first pass evaluates templates and localization and puts every
    /// level in preset order. The second pass removes internal fields and
    /// hidden keys, then collapses `belongs_to` objects whose leaves are all
    /// null. A child request keeps `__group` at its root.
    pub(super) fn finalize(
        &self,
        model: &Model,
        query: &Query,
        aliases: &AliasMap,
        docs: Vec<Document>,
    ) -> Result<Vec<Document>> {
        let Some(preset) = query.preset() else {
            return Ok(docs);
        };

        let finalize = Finalize {
            schema: &self.schema,
            aliases,
            localizer: self.localizer.as_deref(),
            locale: query.locale.as_deref(),
            fallback: self.config.default_locale.as_deref(),
        };

        let truncated = query.root_truncated();
        let keep_group = query.group.is_some();

        docs.into_iter()
            .map(|doc| {
                let doc = finalize.assemble(model, preset, "", doc, truncated)?;
                finalize.strip(model, preset, "", doc, keep_group)
            })
            .collect()
    }
}

struct Finalize<'a> {
    schema: &'a Schema,
    aliases: &'a AliasMap,
    localizer: Option<&'a dyn Localizer>,
    locale: Option<&'a str>,
    fallback: Option<&'a str>,
}

impl Finalize<'_> {
    fn assemble(
        &self,
        model: &Model,
        preset: &Preset,
        path: &str,
        mut doc: Document,
        truncated: bool,
    ) -> Result<Document> {
        if !truncated {
            self.assemble_nested(model, preset, path, &mut doc)?;
            self.render_templates(preset, &mut doc);
            self.render_formatters(model, preset, &mut doc)?;
        }

        let mut out = Document::with_capacity(doc.len());

        for field in &preset.fields {
            if truncated && !field.is_column() {
                continue;
            }

            let value = doc.remove(&field.key).unwrap_or_default();
            let value = if field.localize {
                localize(value, self.localizer, self.locale, self.fallback)
            } else {
                value
            };

            out.insert(field.key.clone(), value);
        }

        for (key, value) in doc {
            if is_hidden(&key) {
                out.insert(key, value);
            }
        }

        Ok(out)
    }

    /// Assembles joined `belongs_to` objects before their parent, so the
    /// parent's templates see finished values.
    fn assemble_nested(&self, model: &Model, preset: &Preset, path: &str, doc: &mut Document) -> Result<()> {
        for field in &preset.fields {
            let FieldTy::Preset(nested) = &field.ty else {
                continue;
            };

            let relation = model.relation(&field.source)?;
            if relation.is_tail() {
                continue;
            }

            let Some(slot) = doc.get_mut(&field.key) else {
                continue;
            };

            *slot = match std::mem::take(slot) {
                Value::Object(child) => {
                    let target = self.schema.target(relation)?;
                    let child_path = join_path(path, &relation.name);
                    let truncated = self.aliases.is_truncated(&child_path);

                    Value::Object(self.assemble(
                        target,
                        target.preset(nested)?,
                        &child_path,
                        child,
                        truncated,
                    )?)
                }
                other => other,
            };
        }

        Ok(())
    }

    /// Evaluates formatter and nested fields in preset order. Each result is
    /// visible to the templates after it.
    fn render_templates(&self, preset: &Preset, doc: &mut Document) {
        for field in &preset.fields {
            let value = match &field.ty {
                FieldTy::Formatter(template) => Value::String(template.render(doc)),
                FieldTy::NestedField(template) => match template.as_single_field() {
                    Some(path) => doc
                        .get_segments(path.iter().map(String::as_str))
                        .cloned()
                        .unwrap_or_default(),
                    None => Value::String(template.render(doc)),
                },
                _ => continue,
            };

            doc.insert(field.key.clone(), value);
        }
    }

    /// Renders `belongs_to` objects through their field's legacy formatter.
    fn render_formatters(&self, model: &Model, preset: &Preset, doc: &mut Document) -> Result<()> {
        for field in &preset.fields {
            let (FieldTy::Preset(_), Some(formatter)) = (&field.ty, &field.formatter) else {
                continue;
            };

            if !model.relation(&field.source)?.is_belongs_to() {
                continue;
            }

            let value = match doc.get(&field.key) {
                Some(Value::Object(child)) if !child.values().all(Value::is_all_null) => {
                    Value::String(formatter.render(child))
                }
                _ => Value::Null,
            };

            doc.insert(field.key.clone(), value);
        }

        Ok(())
    }

    fn strip(
        &self,
        model: &Model,
        preset: &Preset,
        path: &str,
        doc: Document,
        keep_group: bool,
    ) -> Result<Document> {
        let mut out = Document::with_capacity(doc.len());

        for (key, value) in doc {
            if is_hidden(&key) {
                if keep_group && key == GROUP_KEY {
                    out.insert(key, value);
                }
                continue;
            }

            let Some(field) = preset.field(&key) else {
                out.insert(key, value);
                continue;
            };

            if field.internal {
                continue;
            }

            let value = match (&field.ty, value) {
                (FieldTy::Preset(nested), Value::Object(child)) => {
                    let relation = model.relation(&field.source)?;

                    if relation.is_tail() {
                        Value::Object(child)
                    } else {
                        let target = self.schema.target(relation)?;
                        let child_path = join_path(path, &relation.name);
                        let child = self.strip(target, target.preset(nested)?, &child_path, child, false)?;
                        collapse(Value::Object(child))
                    }
                }
                (_, value) => value,
            };

            out.insert(key, value);
        }

        Ok(out)
    }
}

/// A `belongs_to` object whose leaves are all null becomes null.
fn collapse(value: Value) -> Value {
    if value.is_all_null() {
        Value::Null
    } else {
        value
    }
}
