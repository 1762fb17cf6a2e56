use super::Field;

/// A named, ordered projection of a model's fields.
#[derive(Debug, Clone)]
pub struct Preset {
    pub name: String,
    pub fields: Vec<Field>,
}

impl Preset {
    /// An ad hoc preset built at resolve time.
    pub fn synthetic(name: impl Into<String>, fields: Vec<Field>) -> Preset {
        Preset {
            name: name.into(),
            fields,
        }
    }

    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.key == key)
    }

    /// Fields that name a relation, in preset order.
    pub fn relation_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| field.nested_preset().is_some())
    }
}
