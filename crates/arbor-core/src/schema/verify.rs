use super::{FieldTy, Model, Preset, Schema};
use crate::{Error, Result};

struct Verify<'a> {
    schema: &'a Schema,
}

/// Walk state for one root preset.
struct Walk<'a> {
    /// Models visited on the current path, root first
    ancestry: Vec<&'a str>,

    /// (model, preset) pairs on the current path
    active: Vec<(&'a str, &'a str)>,

    /// Field keys on the current path, for error messages
    path: Vec<&'a str>,
}

impl Schema {
    pub(super) fn verify(&self) -> Result<()> {
        Verify { schema: self }.verify()
    }
}

impl<'a> Verify<'a> {
    fn verify(&self) -> Result<()> {
        for model in self.schema.models() {
            for preset in model.presets.values() {
                let mut walk = Walk {
                    ancestry: vec![model.name.as_str()],
                    active: vec![(model.name.as_str(), preset.name.as_str())],
                    path: vec![],
                };

                self.verify_reentrancy(model, preset, &mut walk)?;
            }
        }

        Ok(())
    }

    /// Walks the nested-preset graph below `preset`, counting how often each
    /// target model already appears on the path.
    fn verify_reentrancy(&self, model: &'a Model, preset: &'a Preset, walk: &mut Walk<'a>) -> Result<()> {
        for field in &preset.fields {
            let FieldTy::Preset(nested) = &field.ty else {
                continue;
            };

            let relation = model.relation(&field.source)?;

            // Resolved per row at fetch time
            if relation.is_polymorphic() {
                continue;
            }

            let target = self.schema.target(relation)?;
            let revisits = walk
                .ancestry
                .iter()
                .filter(|name| **name == target.name)
                .count();

            if revisits > 0 {
                let max_depth = self.schema.max_depth(relation, Some(field));
                let at = walk.describe(&field.key);

                if !relation.reentrant {
                    return Err(Error::cycle(format!(
                        "{at}: relation `{}.{}` revisits `{}` and is not reentrant",
                        model.name, relation.name, target.name
                    )));
                }

                if revisits > max_depth {
                    return Err(Error::cycle(format!(
                        "{at}: max depth {max_depth} exceeded revisiting `{}`",
                        target.name
                    )));
                }
            }

            // A recursive preset; planning truncates it at run time
            if walk
                .active
                .iter()
                .any(|(m, p)| *m == target.name && *p == nested)
            {
                continue;
            }

            let nested_preset = target.preset(nested)?;

            walk.ancestry.push(target.name.as_str());
            walk.active.push((target.name.as_str(), nested.as_str()));
            walk.path.push(field.key.as_str());

            self.verify_reentrancy(target, nested_preset, walk)?;

            walk.ancestry.pop();
            walk.active.pop();
            walk.path.pop();
        }

        Ok(())
    }
}

impl Walk<'_> {
    fn describe(&self, key: &str) -> String {
        let root = self.active.first().map(|(m, p)| format!("{m}.{p}")).unwrap_or_default();
        let mut path = self.path.clone();
        path.push(key);
        format!("`{root}` at `{}`", path.join("."))
    }
}
