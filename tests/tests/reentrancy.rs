use tests::*;

use arbor::{Request, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn recursive_presets_stop_at_the_depth_limit() {
    let driver = ScriptedDriver::new();
    driver.respond(
        r#"FROM "users""#,
        vec![
            vec![
                1.into(),
                "Ann".into(),
                2.into(),
                "Bob".into(),
                3.into(),
                "Cy".into(),
            ],
            vec![
                4.into(),
                "Dee".into(),
                Value::Null,
                Value::Null,
                Value::Null,
                Value::Null,
            ],
        ],
    );

    let db = setup(&driver);
    let docs = db.list(Request::new("User", "tree")).await.unwrap();

    let expected = json!([
        {"id": 1, "name": "Ann", "manager": {"id": 2, "name": "Bob", "manager": {"id": 3, "name": "Cy"}}},
        {"id": 4, "name": "Dee", "manager": null},
    ]);
    assert_eq!(to_json(&docs), expected.to_string());

    assert_eq!(
        driver.exec_log().sql(),
        vec![
            r#"SELECT t0."id", t0."name", t1."id", t1."name", t2."id", t2."name" FROM "users" AS t0 LEFT JOIN "users" AS t1 ON t0."manager_id" = t1."id" LEFT JOIN "users" AS t2 ON t1."manager_id" = t2."id";"#
                .to_string()
        ]
    );
}

#[tokio::test]
async fn the_plan_marks_the_truncated_level() {
    let driver = ScriptedDriver::new();
    let db = setup(&driver);

    let plan = db.plan(Request::new("User", "tree")).unwrap();

    assert_eq!(plan.alias("manager"), Some("t1"));
    assert_eq!(plan.alias("manager.manager"), Some("t2"));
    assert!(!plan.is_truncated("manager"));
    assert!(plan.is_truncated("manager.manager"));
}

#[tokio::test]
async fn revisiting_a_model_through_filters_is_a_cycle() {
    let driver = ScriptedDriver::new();
    let db = setup(&driver);

    let request = Request::new("Post", "base").filters(json!({"author.posts.title": "x"}));
    assert_err!(db.list(request).await => is_cycle);
    assert!(driver.exec_log().is_empty());
}

#[tokio::test]
async fn filters_past_the_depth_limit_are_cycles() {
    let driver = ScriptedDriver::new();
    let db = setup(&driver);

    let request =
        Request::new("User", "tree").filters(json!({"manager.manager.manager.name": "x"}));
    assert_err!(db.plan(request) => is_cycle);
}
