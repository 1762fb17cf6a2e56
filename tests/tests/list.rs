use tests::*;

use arbor::{Count, Request, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn documents_follow_preset_order() {
    let driver = ScriptedDriver::new();
    driver.respond(
        r#"FROM "posts""#,
        vec![
            vec![1.into(), "Hello".into(), 10.into(), "Ann".into()],
            vec![2.into(), "Orphan".into(), Value::Null, Value::Null],
        ],
    );

    let db = setup(&driver);
    let docs = db.list(Request::new("Post", "card")).await.unwrap();

    let expected = json!([
        {"id": 1, "title": "Hello", "author": {"id": 10, "name": "Ann"}, "label": "Hello by Ann"},
        {"id": 2, "title": "Orphan", "author": null, "label": "Orphan by "},
    ]);
    assert_eq!(to_json(&docs), expected.to_string());

    let log = driver.exec_log();
    assert_eq!(log.len(), 1);
    assert_eq!(
        log.sql()[0],
        r#"SELECT t0."id", t0."title", t1."id", t1."name" FROM "posts" AS t0 LEFT JOIN "users" AS t1 ON t0."author_id" = t1."id";"#
    );
}

#[tokio::test]
async fn internal_fields_feed_templates_then_disappear() {
    let driver = ScriptedDriver::new();
    driver.respond(
        r#"FROM "posts""#,
        vec![vec![1.into(), "Hello world".into(), 10.into(), "Ann".into()]],
    );

    let db = setup(&driver);
    let docs = db.list(Request::new("Post", "teaser")).await.unwrap();

    let expected = json!([{"id": 1, "short_title": "Hell", "author_name": "Ann"}]);
    assert_eq!(to_json(&docs), expected.to_string());
}

#[tokio::test]
async fn filters_are_bound_as_parameters() {
    let driver = ScriptedDriver::new();
    let db = setup(&driver);

    let request = Request::new("Post", "base")
        .filters(json!({"title__start": "Ru", "id__gt": "3"}))
        .sort("id desc")
        .limit(5);
    let docs = db.list(request).await.unwrap();
    assert_empty!(docs);

    let log = driver.exec_log();
    let query = log.find(r#"FROM "posts""#).unwrap();
    assert!(query.sql.contains(r#"t0."title" ILIKE $1"#), "{}", query.sql);
    assert!(query.sql.contains(r#"t0."id" > $2"#), "{}", query.sql);
    assert!(query.sql.ends_with(r#"ORDER BY t0."id" DESC LIMIT 5;"#), "{}", query.sql);
    assert_eq!(query.params, vec![Value::from("Ru%"), Value::I64(3)]);
}

#[tokio::test]
async fn an_empty_page_skips_tails() {
    let driver = ScriptedDriver::new();
    let db = setup(&driver);

    let request = Request::new("Post", "with_comments").offset(100);
    let docs = db.list(request).await.unwrap();

    assert_empty!(docs);

    let log = driver.exec_log();
    assert_eq!(log.len(), 1);
    assert!(log.sql()[0].contains("OFFSET 100"));
    assert_eq!(log.count(r#"FROM "comments""#), 0);
}

#[tokio::test]
async fn count_reports_the_scalar() {
    let driver = ScriptedDriver::new();
    driver.respond("COUNT(", vec![vec![Value::I64(3)]]);

    let db = setup(&driver);
    let count = db.count(Request::new("Post", "card")).await.unwrap();

    assert_eq!(count, Count { count: 3 });
    assert_eq!(serde_json::to_value(count).unwrap(), json!({"count": 3}));
    assert_eq!(
        driver.exec_log().sql(),
        vec![r#"SELECT COUNT(*) FROM "posts" AS t0;"#.to_string()]
    );
}

#[tokio::test]
async fn count_accepts_numeric_text() {
    let driver = ScriptedDriver::new();
    driver.respond("COUNT(", vec![vec![Value::from("12")]]);

    let db = setup(&driver);
    let count = db.count(Request::new("Post", "base")).await.unwrap();

    assert_eq!(count.count, 12);
}

#[tokio::test]
async fn unknown_models_and_presets_are_rejected() {
    let driver = ScriptedDriver::new();
    let db = setup(&driver);

    assert_err!(db.list(Request::new("Nope", "base")).await);
    assert_err!(db.list(Request::new("Post", "nope")).await);
    assert!(driver.exec_log().is_empty());
}
