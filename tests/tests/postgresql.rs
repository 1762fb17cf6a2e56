#![cfg(feature = "postgresql")]

use tests::*;

use arbor::{Db, Request};
use arbor_driver_postgresql::PostgreSQL;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_postgres::NoTls;

const SETUP: &str = r#"
    CREATE TEMP TABLE users (id int PRIMARY KEY, name text, email text, role text, manager_id int);
    CREATE TEMP TABLE posts (id int PRIMARY KEY, author_id int, title text, subject_id int, subject_type text);
    CREATE TEMP TABLE comments (id int PRIMARY KEY, post_id int, body text);

    INSERT INTO users (id, name) VALUES (10, 'Ann'), (11, 'Bob');
    INSERT INTO posts (id, author_id, title) VALUES (1, 10, 'Hello'), (2, 11, 'World'), (3, NULL, 'Orphan');
    INSERT INTO comments (id, post_id, body) VALUES (100, 1, 'first'), (101, 1, 'second'), (102, 2, 'third');
"#;

/// A handle over a session with the blog tables. The tables are temporary,
/// so they vanish with the connection.
async fn connect() -> Db {
    let url = std::env::var("ARBOR_TEST_POSTGRES_URL")
        .unwrap_or_else(|_| "postgresql://localhost:5432/arbor_test".to_string());

    let (client, connection) = tokio_postgres::connect(&url, NoTls)
        .await
        .expect("Failed to connect to PostgreSQL");

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("connection error: {}", e);
        }
    });

    client
        .batch_execute(SETUP)
        .await
        .expect("Failed to create tables");

    Db::builder().build(schema::blog(), PostgreSQL::new(client))
}

#[tokio::test]
async fn lists_nested_documents() {
    let db = connect().await;

    let docs = db
        .list(Request::new("Post", "card").sort("id"))
        .await
        .unwrap();

    let expected = json!([
        {"id": 1, "title": "Hello", "author": {"id": 10, "name": "Ann"}, "label": "Hello by Ann"},
        {"id": 2, "title": "World", "author": {"id": 11, "name": "Bob"}, "label": "World by Bob"},
        {"id": 3, "title": "Orphan", "author": null, "label": "Orphan by "},
    ]);
    assert_eq!(to_json(&docs), expected.to_string());
}

#[tokio::test]
async fn resolves_has_many_tails() {
    let db = connect().await;

    let request = Request::new("Post", "with_comments")
        .filters(json!({"id__lte": 2}))
        .sort("id");
    let docs = db.list(request).await.unwrap();

    let expected = json!([
        {"id": 1, "comments": [{"id": 100, "body": "first"}, {"id": 101, "body": "second"}]},
        {"id": 2, "comments": [{"id": 102, "body": "third"}]},
    ]);
    assert_eq!(to_json(&docs), expected.to_string());
}

#[tokio::test]
async fn counts_with_relation_filters() {
    let db = connect().await;

    let count = db
        .count(Request::new("Post", "").filters(json!({"comments.body__cnt": "IR"})))
        .await
        .unwrap();
    assert_eq!(count.count, 2);

    let count = db.count(Request::new("Post", "")).await.unwrap();
    assert_eq!(count.count, 3);
}
