//! The blog schema the end-to-end tests run against.

use arbor_core::{schema::def::ModelDef, Schema};
use indexmap::IndexMap;
use serde_json::json;

pub fn blog() -> Schema {
    let defs: IndexMap<String, ModelDef> = serde_json::from_value(json!({
        "User": {
            "table": "users",
            "columns": {
                "id": "integer",
                "name": "string",
                "email": "string",
                "role": "string",
                "manager_id": "integer",
            },
            "relations": {
                "manager": {"type": "belongs_to", "model": "User", "fk": "manager_id", "reentrant": true, "max_depth": 1},
                "posts": {"type": "has_many", "model": "Post", "fk": "author_id", "sorts": ["id"]},
                "profile": {"type": "has_one", "model": "Profile"},
            },
            "presets": {
                "short": {"fields": ["id", "name"]},
                "tree": {"fields": ["id", "name", {"source": "manager", "preset": "tree"}]},
                "with_posts": {"fields": ["id", "name", {"source": "posts", "preset": "base"}]},
                "with_profile": {"fields": ["id", "name", {"source": "profile", "preset": "base"}]},
                "titles": {"fields": ["id", {"source": "posts", "preset": "base", "formatter": "{title}"}]},
                "localized": {"fields": ["id", {"source": "role", "localize": true}]},
            },
        },
        "Profile": {
            "table": "profiles",
            "columns": {"id": "integer", "user_id": "integer", "city": "string"},
            "presets": {"base": {"fields": ["city"]}},
        },
        "Post": {
            "table": "posts",
            "columns": {
                "id": "integer",
                "author_id": "integer",
                "title": "string",
                "subject_id": "integer",
                "subject_type": "string",
            },
            "relations": {
                "author": {"type": "belongs_to", "model": "User", "fk": "author_id"},
                "comments": {"type": "has_many", "model": "Comment", "sorts": ["id"]},
                "tags": {"type": "has_many", "model": "Tag", "through": "PostTag"},
                "subject": {
                    "type": "belongs_to",
                    "polymorphic": {"type_column": "subject_type", "types": {"photo": "Photo", "video": "Video"}},
                },
            },
            "presets": {
                "base": {"fields": ["id", "title"]},
                "card": {"fields": [
                    "id",
                    "title",
                    {"source": "author", "preset": "short"},
                    {"source": "{title} by {author.name}", "alias": "label"},
                ]},
                "teaser": {"fields": [
                    "id",
                    {"source": "title", "internal": true},
                    {"source": "{title}[0..4]", "alias": "short_title"},
                    {"source": "{author.name}", "type": "nested_field", "alias": "author_name"},
                    {"source": "author", "preset": "short", "internal": true},
                ]},
                "with_comments": {"fields": ["id", {"source": "comments", "preset": "base"}]},
                "with_tags": {"fields": ["id", {"source": "tags", "preset": "base"}]},
                "with_subject": {"fields": ["id", {"source": "subject", "preset": "base"}]},
                "full": {"fields": [
                    "id",
                    {"source": "author", "preset": "with_profile"},
                    {"source": "comments", "preset": "base"},
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
            "columns": {"id": "integer", "name": "string", "label": "json"},
            "presets": {
                "base": {"fields": ["id", "name"]},
                "localized": {"fields": ["id", {"source": "label", "localize": true}]},
            },
        },
        "PostTag": {
            "table": "post_tags",
            "columns": {"post_id": "integer", "tag_id": "integer"},
            "relations": {
                "post": {"type": "belongs_to", "model": "Post"},
                "tag": {"type": "belongs_to", "model": "Tag"},
            },
        },
        "Photo": {
            "table": "photos",
            "columns": {"id": "integer", "url": "string"},
            "presets": {"base": {"fields": ["id", "url"]}},
        },
        "Video": {
            "table": "videos",
            "columns": {"id": "integer", "seconds": "integer"},
            "presets": {"base": {"fields": ["id", "seconds"]}},
        },
    }))
    .unwrap();

    Schema::builder().models(defs).build().unwrap()
}
