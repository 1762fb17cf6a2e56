use crate::Config;

use arbor_core::{
    schema::{Model, Preset},
    stmt::{Filter, Request, Sort},
    Error, Result, Schema, Value,
};

/// A request resolved against the schema: the preset is looked up, filter
/// and sort fields have their path aliases expanded.
///
/// Child requests issued for tails are built directly as `Query` values and
/// carry the extra state needed to stitch their rows back into the parent.
#[derive(Debug, Clone)]
pub(crate) struct Query {
    pub(crate) model: String,

    /// `None` when counting
    pub(crate) preset: Option<Preset>,

    pub(crate) filter: Filter,
    pub(crate) sorts: Vec<Sort>,
    pub(crate) offset: u64,
    pub(crate) limit: Option<u64>,
    pub(crate) locale: Option<String>,

    /// Models above this request's root, outermost first. Reentrancy is
    /// counted across tail boundaries through it.
    pub(crate) ancestry: Vec<String>,

    /// The root (or, with `unwrap`, the link target) reached its reentrancy
    /// limit: only its own columns are selected.
    pub(crate) truncated: bool,

    /// Restricts a child request to the rows of its parents
    pub(crate) keys: Option<Keys>,

    /// Column whose value is returned as `__group` so child rows can be
    /// matched to their parents
    pub(crate) group: Option<String>,

    /// Return at most one row per `group` value
    pub(crate) one_per_group: bool,

    /// Relation row filters ANDed into the `WHERE` clause
    pub(crate) scopes: Vec<Scope>,

    /// The synthetic link field of a through request. Its rows are replaced
    /// by the linked documents before they are returned.
    pub(crate) unwrap: Option<String>,
}

/// `column IN (values)` on the root table. The values are parent keys as
/// returned by the backend and are bound without conversion.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Keys {
    pub(crate) column: String,
    pub(crate) values: Vec<Value>,
}

/// A relation row filter applied to the table at `path`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Scope {
    pub(crate) path: String,
    pub(crate) filter: String,
}

impl Query {
    pub(crate) fn list(schema: &Schema, config: &Config, request: Request) -> Result<Query> {
        let model = schema.model(&request.model)?;

        if request.preset.is_empty() {
            return Err(Error::query_compile(format!(
                "listing `{}` requires a preset",
                model.name
            )));
        }

        let preset = model.preset(&request.preset)?.clone();
        let mut query = Query::new(model, Some(preset), &request)?;
        query.offset = request.offset;
        query.limit = config.clamp_limit(request.limit);
        query.locale = request.locale.or_else(|| config.default_locale.clone());
        Ok(query)
    }

    pub(crate) fn count(schema: &Schema, request: Request) -> Result<Query> {
        let model = schema.model(&request.model)?;
        let mut query = Query::new(model, None, &request)?;
        query.sorts.clear();
        Ok(query)
    }

    fn new(model: &Model, preset: Option<Preset>, request: &Request) -> Result<Query> {
        let mut filter = Filter::parse(&request.filters)?;
        filter.map_fields(&|field| model.expand_alias(field));

        let sorts = request
            .sorts
            .iter()
            .map(|src| {
                let mut sort = Sort::parse(src)?;
                sort.field = model.expand_alias(&sort.field);
                Ok(sort)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Query::child(&model.name, preset, filter, sorts))
    }

    /// A bare query, used for tail requests.
    pub(crate) fn child(
        model: &str,
        preset: Option<Preset>,
        filter: Filter,
        sorts: Vec<Sort>,
    ) -> Query {
        Query {
            model: model.to_string(),
            preset,
            filter,
            sorts,
            offset: 0,
            limit: None,
            locale: None,
            ancestry: vec![],
            truncated: false,
            keys: None,
            group: None,
            one_per_group: false,
            scopes: vec![],
            unwrap: None,
        }
    }

    pub(crate) fn preset(&self) -> Option<&Preset> {
        self.preset.as_ref()
    }

    /// Relation paths whose own fields are the only ones selected.
    pub(crate) fn root_truncated(&self) -> bool {
        self.truncated && self.unwrap.is_none()
    }

    /// Models on the path to the root, starting from the outermost ancestor.
    pub(crate) fn lineage(&self) -> Vec<String> {
        let mut lineage = self.ancestry.clone();
        lineage.push(self.model.clone());
        lineage
    }
}

/// Joins a relation path and a segment with `.`.
pub(crate) fn join_path(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{path}.{segment}")
    }
}

pub(crate) fn split_path(path: &str) -> Vec<&str> {
    if path.is_empty() {
        vec![]
    } else {
        path.split('.').collect()
    }
}

/// Splits a compound filter field such as `first_name_or_last_name` into
/// an OR of ANDs of field names.
///
/// Names that are declared columns, primary key columns, or computables are
/// never split.
pub(crate) fn split_compound<'a>(model: &Model, name: &'a str) -> Vec<Vec<&'a str>> {
    let known = model.columns.contains_key(name)
        || model.computables.contains_key(name)
        || model.primary_key.iter().any(|pk| pk == name);

    if known {
        return vec![vec![name]];
    }

    name.split("_or_")
        .map(|alternative| alternative.split("_and_").collect())
        .collect()
}
