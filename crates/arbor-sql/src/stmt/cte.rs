use super::Select;

/// A named common table expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Cte {
    pub name: String,
    pub query: Select,
}

impl Cte {
    pub fn new(name: impl Into<String>, query: Select) -> Cte {
        Cte {
            name: name.into(),
            query,
        }
    }
}
