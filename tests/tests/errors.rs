use tests::*;

use arbor::Request;
use serde_json::json;

#[tokio::test]
async fn driver_failures_are_query_execution_errors() {
    let driver = ScriptedDriver::new();
    driver.fail(r#"FROM "posts""#, "connection reset");

    let db = setup(&driver);
    let err = assert_err!(db.list(Request::new("Post", "base")).await);

    assert!(err.is_query_execution(), "{err}");
    assert!(err.to_string().contains("connection reset"), "{err}");
    assert_eq!(driver.exec_log().failures(), 1);
}

#[tokio::test]
async fn a_failing_tail_fails_the_request() {
    let driver = ScriptedDriver::new();
    driver
        .respond(r#"FROM "posts""#, vec![vec![1.into(), 1.into()]])
        .fail(r#"FROM "comments""#, "timeout");

    let db = setup(&driver);
    assert_err!(db.list(Request::new("Post", "with_comments")).await => is_query_execution);
}

#[tokio::test]
async fn short_rows_are_rejected() {
    let driver = ScriptedDriver::new();
    driver.respond(r#"FROM "posts""#, vec![vec![1.into()]]);

    let db = setup(&driver);
    assert_err!(db.list(Request::new("Post", "base")).await => is_query_execution);
}

#[tokio::test]
async fn malformed_requests_fail_before_execution() {
    let driver = ScriptedDriver::new();
    let db = setup(&driver);

    let err = assert_err!(
        db.list(Request::new("Post", "base").filters(json!({"title__near": "x"})))
            .await
    );
    assert!(err.is_query_compile(), "{err}");

    assert_err!(db.list(Request::new("Post", "base").sort("id sideways")).await => is_query_compile);

    let err = assert_err!(
        db.list(Request::new("Post", "base").filters(json!({"id__in": 3})))
            .await
    );
    assert!(err.is_query_compile(), "{err}");

    let err = assert_err!(db.count(Request::new("Post", "").filters(json!({"nope.title": "x"}))).await);
    assert!(!err.is_query_execution(), "{err}");

    assert!(driver.exec_log().is_empty());
}
