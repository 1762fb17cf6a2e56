use tests::*;

use arbor::{Catalog, Config, Db, Request};
use pretty_assertions::assert_eq;
use serde_json::json;

fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog
        .insert("de", "admin", "Administrator")
        .insert("fr", "admin", "Administrateur");
    catalog
}

fn users(driver: &ScriptedDriver) {
    driver.respond(
        r#"FROM "users""#,
        vec![vec![1.into(), "admin".into()], vec![2.into(), "guest".into()]],
    );
}

#[tokio::test]
async fn strings_are_translated_for_the_request_locale() {
    let driver = ScriptedDriver::new();
    users(&driver);

    let db = Db::builder()
        .localizer(catalog())
        .build(schema::blog(), driver.clone());

    let docs = db
        .list(Request::new("User", "localized").locale("fr"))
        .await
        .unwrap();

    let expected = json!([
        {"id": 1, "role": "Administrateur"},
        {"id": 2, "role": "guest"},
    ]);
    assert_eq!(to_json(&docs), expected.to_string());
}

#[tokio::test]
async fn the_default_locale_is_the_fallback() {
    let driver = ScriptedDriver::new();
    users(&driver);

    let config = Config {
        default_locale: Some("de".to_string()),
        ..Config::default()
    };
    let db = Db::builder()
        .config(config)
        .localizer(catalog())
        .build(schema::blog(), driver.clone());

    let docs = db.list(Request::new("User", "localized")).await.unwrap();
    assert_eq!(docs[0].get("role").unwrap().as_str(), Some("Administrator"));

    // No Spanish entry, so the default locale answers
    let docs = db
        .list(Request::new("User", "localized").locale("es"))
        .await
        .unwrap();
    assert_eq!(docs[0].get("role").unwrap().as_str(), Some("Administrator"));
}

#[tokio::test]
async fn without_a_localizer_strings_pass_through() {
    let driver = ScriptedDriver::new();
    users(&driver);

    let db = setup(&driver);
    let docs = db
        .list(Request::new("User", "localized").locale("de"))
        .await
        .unwrap();

    assert_eq!(docs[0].get("role").unwrap().as_str(), Some("admin"));
}

#[tokio::test]
async fn locale_objects_pick_a_translation() {
    let driver = ScriptedDriver::new();
    driver.respond(
        r#"FROM "tags""#,
        vec![vec![1.into(), r#"{"en": "Red", "de": "Rot"}"#.into()]],
    );

    let db = setup(&driver);

    let docs = db
        .list(Request::new("Tag", "localized").locale("de"))
        .await
        .unwrap();
    assert_eq!(to_json(&docs), json!([{"id": 1, "label": "Rot"}]).to_string());

    // Unknown locale and no default: the object is returned as is
    let docs = db
        .list(Request::new("Tag", "localized").locale("fr"))
        .await
        .unwrap();
    assert_eq!(
        to_json(&docs),
        json!([{"id": 1, "label": {"en": "Red", "de": "Rot"}}]).to_string()
    );
}
