use tests::*;

use arbor::{CacheConfig, Config, Request};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn plans_are_cached_by_request_shape() {
    let driver = ScriptedDriver::new();
    let db = setup(&driver);
    let cache = db.alias_cache().unwrap().clone();

    assert!(cache.is_empty());

    db.list(Request::new("Post", "card")).await.unwrap();
    assert_eq!(cache.len(), 1);

    // Same shape
    db.list(Request::new("Post", "card").limit(3)).await.unwrap();
    assert_eq!(cache.len(), 1);

    // Filter paths extend the preset-only plan
    let filtered = |body: &str| {
        Request::new("Post", "card").filters(json!({"comments.body__cnt": body}))
    };
    db.list(filtered("x")).await.unwrap();
    assert_eq!(cache.len(), 2);

    // Filter values are not part of the shape
    db.list(filtered("y")).await.unwrap();
    assert_eq!(cache.len(), 2);
    assert!(cache.used_bytes() > 0);
}

#[tokio::test]
async fn cached_and_fresh_plans_agree() {
    let driver = ScriptedDriver::new();
    let cached = setup(&driver);

    let config = Config {
        alias_cache: CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        },
        ..Config::default()
    };
    let uncached = setup_with(&driver, config);
    assert!(uncached.alias_cache().is_none());

    let request = || {
        Request::new("Post", "card")
            .filters(json!({"comments.body__cnt": "x"}))
            .sort("author.email")
    };

    let first = cached.plan(request()).unwrap();
    let second = cached.plan(request()).unwrap();
    let fresh = uncached.plan(request()).unwrap();

    assert_eq!(first, second);
    assert_eq!(*first, *fresh);
    assert_eq!(
        fresh.iter().collect::<Vec<_>>(),
        vec![("", "t0"), ("author", "t1"), ("comments", "t2")]
    );
}

#[tokio::test]
async fn oversized_plans_are_not_cached() {
    let driver = ScriptedDriver::new();
    let config = Config {
        alias_cache: CacheConfig {
            max_bytes: 16,
            ..CacheConfig::default()
        },
        ..Config::default()
    };
    let db = setup_with(&driver, config);

    let docs = db.list(Request::new("Post", "card")).await.unwrap();

    assert_empty!(docs);
    assert!(db.alias_cache().unwrap().is_empty());
}
