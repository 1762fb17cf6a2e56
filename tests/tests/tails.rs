use tests::*;

use arbor::{Config, Request, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn has_many_children_are_grouped_under_their_parent() {
    let driver = ScriptedDriver::new();
    driver
        .respond(
            r#"FROM "posts""#,
            vec![vec![1.into(), 1.into()], vec![2.into(), 2.into()]],
        )
        .respond(
            r#"FROM "comments""#,
            vec![
                vec![100.into(), "first".into(), 1.into()],
                vec![101.into(), "second".into(), 1.into()],
            ],
        );

    let db = setup(&driver);
    let docs = db.list(Request::new("Post", "with_comments")).await.unwrap();

    let expected = json!([
        {"id": 1, "comments": [{"id": 100, "body": "first"}, {"id": 101, "body": "second"}]},
        {"id": 2, "comments": []},
    ]);
    assert_eq!(to_json(&docs), expected.to_string());

    let log = driver.exec_log();
    assert_eq!(log.len(), 2);
    assert_eq!(
        log.find(r#"FROM "comments""#).unwrap().sql,
        r#"SELECT t0."id", t0."body", t0."post_id" FROM "comments" AS t0 WHERE t0."post_id" IN ($1, $2) ORDER BY t0."id" LIMIT 1000;"#
    );
    assert_eq!(
        log.params(r#"FROM "comments""#).unwrap(),
        vec![Value::I64(1), Value::I64(2)]
    );
}

#[tokio::test]
async fn has_many_batches_are_bounded_by_config() {
    let driver = ScriptedDriver::new();
    driver.respond(r#"FROM "posts""#, vec![vec![1.into(), 1.into()]]);

    let config = Config {
        has_many_limit: 25,
        ..Config::default()
    };
    let db = setup_with(&driver, config);
    db.list(Request::new("Post", "with_comments")).await.unwrap();

    let query = driver.exec_log().find(r#"FROM "comments""#).unwrap();
    assert!(query.sql.ends_with("LIMIT 25;"), "{}", query.sql);
}

#[tokio::test]
async fn the_has_many_limit_spans_every_parent_in_a_batch() {
    let driver = ScriptedDriver::new();
    driver
        .respond(
            r#"FROM "posts""#,
            vec![vec![1.into(), 1.into()], vec![2.into(), 2.into()]],
        )
        .respond(
            r#"FROM "comments""#,
            vec![
                vec![100.into(), "first".into(), 1.into()],
                vec![101.into(), "second".into(), 1.into()],
            ],
        );

    let config = Config {
        has_many_limit: 2,
        ..Config::default()
    };
    let db = setup_with(&driver, config);
    let docs = db.list(Request::new("Post", "with_comments")).await.unwrap();

    let expected = json!([
        {"id": 1, "comments": [{"id": 100, "body": "first"}, {"id": 101, "body": "second"}]},
        {"id": 2, "comments": []},
    ]);
    assert_eq!(to_json(&docs), expected.to_string());

    let log = driver.exec_log();
    assert_eq!(log.count(r#"FROM "comments""#), 1);
    assert!(
        log.find(r#"FROM "comments""#)
            .unwrap()
            .sql
            .ends_with(r#"WHERE t0."post_id" IN ($1, $2) ORDER BY t0."id" LIMIT 2;"#)
    );
}

#[tokio::test]
async fn has_one_takes_a_single_child() {
    let driver = ScriptedDriver::new();
    driver
        .respond(
            r#"FROM "users""#,
            vec![
                vec![1.into(), "Ann".into(), 1.into()],
                vec![2.into(), "Bob".into(), 2.into()],
            ],
        )
        .respond(r#"FROM "profiles""#, vec![vec!["Berlin".into(), 1.into()]]);

    let db = setup(&driver);
    let docs = db.list(Request::new("User", "with_profile")).await.unwrap();

    let expected = json!([
        {"id": 1, "name": "Ann", "profile": {"city": "Berlin"}},
        {"id": 2, "name": "Bob", "profile": null},
    ]);
    assert_eq!(to_json(&docs), expected.to_string());

    let query = driver.exec_log().find(r#"FROM "profiles""#).unwrap();
    assert_eq!(
        query.sql,
        r#"SELECT * FROM (SELECT DISTINCT ON (t0."user_id") t0."city", t0."user_id" FROM "profiles" AS t0 WHERE t0."user_id" IN ($1, $2) ORDER BY t0."user_id") AS deduped;"#
    );
}

#[tokio::test]
async fn through_relations_return_the_linked_documents() {
    let driver = ScriptedDriver::new();
    driver
        .respond(
            r#"FROM "posts""#,
            vec![vec![1.into(), 1.into()], vec![2.into(), 2.into()]],
        )
        .respond(
            r#"FROM "post_tags""#,
            vec![
                vec![7.into(), "rust".into(), 1.into()],
                vec![8.into(), "sql".into(), 1.into()],
                vec![Value::Null, Value::Null, 2.into()],
            ],
        );

    let db = setup(&driver);
    let docs = db.list(Request::new("Post", "with_tags")).await.unwrap();

    let expected = json!([
        {"id": 1, "tags": [{"id": 7, "name": "rust"}, {"id": 8, "name": "sql"}]},
        {"id": 2, "tags": []},
    ]);
    assert_eq!(to_json(&docs), expected.to_string());

    let query = driver.exec_log().find(r#"FROM "post_tags""#).unwrap();
    assert_eq!(
        query.sql,
        r#"SELECT t1."id", t1."name", t0."post_id" FROM "post_tags" AS t0 LEFT JOIN "tags" AS t1 ON t0."tag_id" = t1."id" WHERE t0."post_id" IN ($1, $2) LIMIT 1000;"#
    );
}

#[tokio::test]
async fn polymorphic_targets_are_fetched_per_type() {
    let driver = ScriptedDriver::new();
    driver
        .respond(
            r#"FROM "posts""#,
            vec![
                vec![1.into(), 10.into(), "photo".into()],
                vec![2.into(), 20.into(), "video".into()],
                vec![3.into(), 10.into(), "photo".into()],
                vec![4.into(), Value::Null, Value::Null],
            ],
        )
        .respond(r#"FROM "photos""#, vec![vec![10.into(), "a.png".into(), 10.into()]])
        .respond(r#"FROM "videos""#, vec![vec![20.into(), 90.into(), 20.into()]]);

    let db = setup(&driver);
    let docs = db.list(Request::new("Post", "with_subject")).await.unwrap();

    let expected = json!([
        {"id": 1, "subject": {"id": 10, "url": "a.png"}},
        {"id": 2, "subject": {"id": 20, "seconds": 90}},
        {"id": 3, "subject": {"id": 10, "url": "a.png"}},
        {"id": 4, "subject": null},
    ]);
    assert_eq!(to_json(&docs), expected.to_string());

    let log = driver.exec_log();
    assert_eq!(log.len(), 3);
    assert_eq!(log.params(r#"FROM "photos""#).unwrap(), vec![Value::I64(10)]);
    assert_eq!(log.params(r#"FROM "videos""#).unwrap(), vec![Value::I64(20)]);
}

#[tokio::test]
async fn tails_under_belongs_to_objects() {
    let driver = ScriptedDriver::new();
    driver
        .respond(
            r#"FROM "posts""#,
            vec![vec![1.into(), 10.into(), "Ann".into(), 10.into(), 1.into()]],
        )
        .respond(r#"FROM "profiles""#, vec![vec!["Berlin".into(), 10.into()]])
        .respond(r#"FROM "comments""#, vec![vec![100.into(), "hi".into(), 1.into()]]);

    let db = setup(&driver);
    let docs = db.list(Request::new("Post", "full")).await.unwrap();

    let expected = json!([{
        "id": 1,
        "author": {"id": 10, "name": "Ann", "profile": {"city": "Berlin"}},
        "comments": [{"id": 100, "body": "hi"}],
    }]);
    assert_eq!(to_json(&docs), expected.to_string());
    assert_eq!(driver.exec_log().len(), 3);
}

#[tokio::test]
async fn missing_holders_get_null_tails() {
    let driver = ScriptedDriver::new();
    driver.respond(
        r#"FROM "posts""#,
        vec![vec![1.into(), Value::Null, Value::Null, Value::Null, 1.into()]],
    );

    let db = setup(&driver);
    let docs = db.list(Request::new("Post", "full")).await.unwrap();

    let expected = json!([{"id": 1, "author": null, "comments": []}]);
    assert_eq!(to_json(&docs), expected.to_string());

    // No author key, so no profile request
    let log = driver.exec_log();
    assert_eq!(log.count(r#"FROM "profiles""#), 0);
    assert_eq!(log.count(r#"FROM "comments""#), 1);
}

#[tokio::test]
async fn legacy_formatters_render_each_child() {
    let driver = ScriptedDriver::new();
    driver
        .respond(r#"FROM "users""#, vec![vec![1.into(), 1.into()]])
        .respond(
            r#"FROM "posts""#,
            vec![
                vec![10.into(), "A".into(), 1.into()],
                vec![11.into(), "B".into(), 1.into()],
            ],
        );

    let db = setup(&driver);
    let docs = db.list(Request::new("User", "titles")).await.unwrap();

    let expected = json!([{"id": 1, "posts": ["A", "B"]}]);
    assert_eq!(to_json(&docs), expected.to_string());
}
