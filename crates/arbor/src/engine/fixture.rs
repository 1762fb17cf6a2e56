use super::{plan, AliasMap, Query};
use crate::Config;

use arbor_core::{schema::def::ModelDef, stmt::Request, Schema, Value};
use arbor_sql::{stmt::Select, Serializer, Statement};
use indexmap::IndexMap;
use serde_json::json;

pub(crate) fn blog() -> Schema {
    let defs: IndexMap<String, ModelDef> = serde_json::from_value(json!({
        "User": {
            "table": "users",
            "columns": {"id": "integer", "name": "string", "email": "string", "manager_id": "integer"},
            "relations": {
                "manager": {"type": "belongs_to", "model": "User", "fk": "manager_id", "reentrant": true, "max_depth": 1},
                "posts": {"type": "has_many", "model": "Post", "fk": "author_id"},
            },
            "computables": {
                "post_count": {"expr": "COUNT({posts.id})", "type": "integer"},
            },
            "presets": {
                "short": {"fields": ["id", "name"]},
                "tree": {"fields": ["id", "name", {"source": "manager", "preset": "tree"}]},
                "stats": {"fields": ["id", "post_count"]},
            },
        },
        "Post": {
            "table": "posts",
            "columns": {"id": "integer", "author_id": "integer", "title": "string", "body": "string"},
            "relations": {
                "author": {"type": "belongs_to", "model": "User", "fk": "author_id"},
                "comments": {"type": "has_many", "model": "Comment"},
                "tags": {"type": "has_many", "model": "Tag", "through": "PostTag"},
            },
            "presets": {
                "base": {"fields": ["id", "title"]},
                "card": {"fields": [
                    "id",
                    "title",
                    {"source": "author", "preset": "short"},
                    {"source": "{title} by {author.name}", "alias": "label"},
                ]},
            },
        },
        "Comment": {
            "table": "comments",
            "columns": {"id": "integer", "post_id": "integer", "body": "string"},
            "presets": {"base": {"fields": ["id", "body"]}},
        },
        "Tag": {
            "table": "tags",
            "columns": {"id": "integer", "name": "string"},
            "presets": {"base": {"fields": ["id", "name"]}},
        },
        "PostTag": {
            "table": "post_tags",
            "columns": {"post_id": "integer", "tag_id": "integer"},
            "relations": {
                "post": {"type": "belongs_to", "model": "Post"},
                "tag": {"type": "belongs_to", "model": "Tag"},
            },
        },
    }))
    .unwrap();

    Schema::builder().models(defs).build().unwrap()
}

pub(crate) fn query(schema: &Schema, request: Request) -> Query {
    Query::list(schema, &Config::default(), request).unwrap()
}

pub(crate) fn aliases(schema: &Schema, query: &Query) -> AliasMap {
    let model = schema.model(&query.model).unwrap();
    plan::plan(schema, model, query).unwrap()
}

pub(crate) fn sql(select: Select) -> (String, Vec<Value>) {
    let mut params: Vec<Value> = vec![];
    let sql = Serializer::postgresql().serialize(&Statement::from(select), &mut params);
    (sql, params)
}
