use arbor_core::schema::def::ModelDef;
use arbor_core::schema::{ColumnTy, FieldTy, RelationKind};
use arbor_core::{Error, Schema};

use indexmap::IndexMap;
use serde_json::json;
use std_util::{assert_err, assert_ok};

fn build(defs: serde_json::Value) -> Result<Schema, Error> {
    let defs: IndexMap<String, ModelDef> = serde_json::from_value(defs).unwrap();
    Schema::builder().models(defs).build()
}

fn blog() -> serde_json::Value {
    json!({
        "User": {
            "table": "users",
            "columns": {"id": "integer", "name": "string"},
            "presets": {
                "short": {"fields": ["id", "name"]},
            },
        },
        "BlogPost": {
            "columns": {"id": "integer", "author_id": "integer", "title": "string"},
            "relations": {
                "author": {"type": "belongs_to", "model": "User"},
                "comments": {"type": "has_many", "model": "Comment", "sorts": ["id"]},
                "tags": {"type": "has_many", "model": "Tag", "through": "PostTag"},
            },
            "computables": {
                "comment_count": {"expr": "COUNT({comments.id})", "type": "integer"},
                "byline": "{title} || ' by ' || {author.name}",
            },
            "aliases": {"writer": "author"},
            "presets": {
                "base": {"fields": ["id", "title"]},
                "card": {
                    "extends": "base",
                    "fields": [
                        {"source": "title", "alias": "title", "type": "string"},
                        {"source": "author", "preset": "short"},
                        {"source": "comment_count"},
                        {"source": "{title} ({comment_count})", "alias": "label"},
                    ],
                },
            },
        },
        "Comment": {
            "columns": {"id": "integer", "blog_post_id": "integer", "body": "string"},
            "presets": {"base": {"fields": ["id", "body"]}},
        },
        "Tag": {
            "columns": {"id": "integer", "name": "string"},
            "presets": {"base": {"fields": ["id", "name"]}},
        },
        "PostTag": {
            "relations": {
                "blog_post": {"type": "belongs_to", "model": "BlogPost"},
                "tag": {"type": "belongs_to", "model": "Tag"},
            },
        },
    })
}

#[test]
fn defaults_are_derived_from_model_names() {
    let schema = assert_ok!(build(blog()));

    let post = schema.model("BlogPost").unwrap();
    assert_eq!(post.table, "blog_post");
    assert_eq!(post.primary_key, ["id"]);

    let author = post.relation("author").unwrap();
    assert_eq!(author.kind, RelationKind::BelongsTo);
    assert_eq!(author.fk, "user_id");
    assert_eq!(author.pk, "id");

    let comments = post.relation("comments").unwrap();
    assert_eq!(comments.fk, "blog_post_id");
    assert_eq!(comments.pk, "id");
    assert_eq!(comments.sorts, ["id"]);
}

#[test]
fn through_link_is_resolved() {
    let schema = assert_ok!(build(blog()));

    let tags = schema.model("BlogPost").unwrap().relation("tags").unwrap();
    let through = tags.through.as_ref().unwrap();

    assert_eq!(through.model, "PostTag");
    assert_eq!(through.link, "tag");
    assert_eq!(tags.fk, "blog_post_id");
}

#[test]
fn through_link_not_found() {
    let mut defs = blog();
    defs["PostTag"]["relations"]
        .as_object_mut()
        .unwrap()
        .remove("tag");

    let err = assert_err!(build(defs));
    assert!(err.is_schema());
    assert!(err.to_string().contains("through link not found"), "{err}");
}

#[test]
fn invalid_relation_type() {
    let mut defs = blog();
    defs["BlogPost"]["relations"]["author"]["type"] = json!("owns");

    let err = assert_err!(build(defs));
    assert!(err.is_schema());
    assert_eq!(
        err.to_string(),
        "relation `BlogPost.author`: schema error: invalid relation type `owns`"
    );
}

#[test]
fn unknown_target_model() {
    let mut defs = blog();
    defs["BlogPost"]["relations"]["author"]["model"] = json!("Person");

    let err = assert_err!(build(defs));
    assert!(err.to_string().contains("unknown model `Person`"), "{err}");
}

#[test]
fn through_and_polymorphic_are_exclusive() {
    let mut defs = blog();
    defs["BlogPost"]["relations"]["tags"]["polymorphic"] = json!(true);

    let err = assert_err!(build(defs));
    assert!(err.to_string().contains("mutually exclusive"), "{err}");
}

#[test]
fn extends_overrides_in_place() {
    let schema = assert_ok!(build(blog()));
    let card = schema.model("BlogPost").unwrap().preset("card").unwrap();

    let keys: Vec<_> = card.fields.iter().map(|field| field.key()).collect();
    assert_eq!(keys, ["id", "title", "author", "comment_count", "label"]);

    assert!(matches!(card.fields[2].ty, FieldTy::Preset(ref preset) if preset == "short"));
    assert!(card.fields[3].is_computable());
    assert!(matches!(card.fields[4].ty, FieldTy::Formatter(_)));
}

#[test]
fn extends_cycle() {
    let mut defs = blog();
    defs["BlogPost"]["presets"]["base"]["extends"] = json!("card");

    let err = assert_err!(build(defs));
    assert!(err.is_schema());
    assert!(err.to_string().contains("cycle"), "{err}");
}

#[test]
fn placeholder_source_must_be_template_kind() {
    let mut defs = blog();
    defs["BlogPost"]["presets"]["base"]["fields"] =
        json!([{"source": "{title}", "type": "string"}]);

    let err = assert_err!(build(defs));
    assert!(err.to_string().contains("formatter or nested_field"), "{err}");
}

#[test]
fn nested_preset_must_exist() {
    let mut defs = blog();
    defs["BlogPost"]["presets"]["base"]["fields"] =
        json!([{"source": "author", "preset": "missing"}]);

    let err = assert_err!(build(defs));
    assert!(
        err.to_string().contains("model `User` has no preset `missing`"),
        "{err}"
    );
}

#[test]
fn polymorphic_nested_preset_is_not_checked() {
    let defs = json!({
        "Comment": {
            "relations": {
                "subject": {"type": "belongs_to", "polymorphic": {"types": {"post": "Post"}}},
            },
            "presets": {
                "base": {"fields": ["id", {"source": "subject", "preset": "anything"}]},
            },
        },
        "Post": {"presets": {"base": {"fields": ["id"]}}},
    });

    let schema = assert_ok!(build(defs));
    let subject = schema.model("Comment").unwrap().relation("subject").unwrap();
    let polymorphic = subject.polymorphic.as_ref().unwrap();

    assert_eq!(subject.fk, "subject_id");
    assert_eq!(polymorphic.type_column, "subject_type");
    assert_eq!(polymorphic.model_for("post"), "Post");
    assert_eq!(polymorphic.model_for("Video"), "Video");
}

#[test]
fn computables_are_analysed() {
    let schema = assert_ok!(build(blog()));
    let post = schema.model("BlogPost").unwrap();

    let count = post.computable("comment_count").unwrap();
    assert!(count.aggregate);
    assert_eq!(count.has_many.as_deref(), Some("comments"));
    assert_eq!(count.ty, ColumnTy::Integer);

    let byline = post.computable("byline").unwrap();
    assert!(!byline.aggregate);
    assert_eq!(byline.has_many, None);
    assert_eq!(byline.paths, ["author"]);
}

#[test]
fn computable_over_two_has_many_relations() {
    let mut defs = blog();
    defs["BlogPost"]["computables"]["mixed"] = json!("COUNT({comments.id}) + COUNT({tags.id})");

    let err = assert_err!(build(defs));
    assert!(err.to_string().contains("more than one has_many"), "{err}");
}

#[test]
fn path_aliases() {
    let schema = assert_ok!(build(blog()));
    let post = schema.model("BlogPost").unwrap();

    assert_eq!(post.expand_alias("writer.name"), "author.name");
    assert_eq!(post.expand_alias("writer"), "author");
    assert_eq!(post.expand_alias("title"), "title");
}

#[test]
fn path_alias_must_walk() {
    let mut defs = blog();
    defs["BlogPost"]["aliases"]["org"] = json!("author.company.name");

    let err = assert_err!(build(defs));
    assert!(err.is_schema());
}

#[test]
fn declared_field_types_are_recorded() {
    let defs = json!({
        "Event": {
            "presets": {
                "base": {"fields": ["id", {"source": "starts_at", "type": "datetime"}]},
            },
        },
    });

    let schema = assert_ok!(build(defs));
    let event = schema.model("Event").unwrap();

    assert_eq!(event.column_ty("starts_at"), ColumnTy::Datetime);
    assert_eq!(event.column_ty("id"), ColumnTy::String);
}
