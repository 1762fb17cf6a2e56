use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// One `"path.column [ASC|DESC]"` sort entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sort {
    /// Dotted path ending in a column or computable
    pub field: String,
    pub direction: Direction,
}

impl Sort {
    pub fn parse(src: &str) -> Result<Sort> {
        let mut parts = src.split_whitespace();

        let Some(field) = parts.next() else {
            return Err(Error::query_compile("empty sort entry"));
        };

        let direction = match parts.next() {
            None => Direction::Asc,
            Some(dir) if dir.eq_ignore_ascii_case("asc") => Direction::Asc,
            Some(dir) if dir.eq_ignore_ascii_case("desc") => Direction::Desc,
            Some(dir) => {
                return Err(Error::query_compile(format!(
                    "invalid sort direction `{dir}` in `{src}`"
                )))
            }
        };

        if parts.next().is_some() {
            return Err(Error::query_compile(format!("malformed sort entry `{src}`")));
        }

        Ok(Sort {
            field: field.to_string(),
            direction,
        })
    }

    /// Relation prefix of the sorted field, or `""` for the root.
    pub fn relation_path(&self) -> &str {
        self.field.rsplit_once('.').map(|(path, _)| path).unwrap_or("")
    }
}

impl Direction {
    pub fn is_desc(self) -> bool {
        self == Direction::Desc
    }
}
