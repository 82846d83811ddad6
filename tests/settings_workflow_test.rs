//! End-to-end workflows through the public manager API

mod common;

use common::TestFixture;
use kvsettings::{Error, SettingsManager};
use serde_json::json;
use std::collections::BTreeSet;

#[test]
fn test_locale_lifecycle() {
    let fx = TestFixture::new();
    let settings = fx.manager.group("default");

    assert!(settings.set("app.locale", "ro").unwrap());
    assert_eq!(settings.get("app.locale").unwrap(), json!("ro"));

    assert!(settings.forget("app.locale"));
    assert!(!settings.has("app.locale"));
    assert_eq!(settings.get_or("app.locale", "en").unwrap(), json!("en"));
}

#[test]
fn test_get_without_default_fails_for_missing_key() {
    let fx = TestFixture::new();

    let err = fx.manager.get("app.locale").unwrap_err();
    assert!(matches!(err, Error::SettingNotFound { .. }));
    assert!(err.is_usage_error());
}

#[test]
fn test_read_after_write_across_groups() {
    let fx = TestFixture::new();

    for (group, value) in [("default", 1), ("mail", 2), ("ui", 3)] {
        let settings = fx.manager.group(group);
        // Prime the cache so the write has something to invalidate
        let _ = settings.all().unwrap();
        assert!(settings.set("k", value).unwrap());
        assert_eq!(settings.get("k").unwrap(), json!(value));
    }
}

#[test]
fn test_set_many_visible_together() {
    let fx = TestFixture::new();
    let settings = &fx.manager;
    let _ = settings.all().unwrap();

    assert!(settings.set_many([("a", 1), ("b", 2)]).unwrap());

    let both = settings.get_many(["a", "b"]).unwrap();
    assert_eq!(both["a"], json!(1));
    assert_eq!(both["b"], json!(2));
}

#[test]
fn test_set_many_single_store_write_and_invalidation() {
    use std::sync::atomic::Ordering;

    let fx = TestFixture::new();
    let before = fx.cache.flushes.load(Ordering::SeqCst);

    fx.manager
        .set_many([("a", json!(1)), ("b", json!("two")), ("c", json!([3]))])
        .unwrap();

    assert_eq!(fx.cache.flushes.load(Ordering::SeqCst), before + 1);
    assert_eq!(fx.store.rows(), 3);
}

#[test]
fn test_set_many_accepts_a_decoded_map() {
    let fx = TestFixture::new();
    let source = fx.manager.group("source");
    source.set_many([("x", 1), ("y", 2)]).unwrap();

    let copy = fx.manager.group("copy");
    let snapshot = source.all().unwrap();
    copy.set_many(snapshot.iter().map(|(k, v)| (k.clone(), v.clone())))
        .unwrap();

    assert_eq!(*copy.all().unwrap(), *snapshot);
}

#[test]
fn test_all_groups_lists_written_groups() {
    let fx = TestFixture::new();
    fx.manager.set("app.name", "Demo").unwrap();
    fx.manager.group("mail").set("smtp.port", 25).unwrap();

    let groups: BTreeSet<String> = fx.manager.all_groups().unwrap().into_iter().collect();
    assert_eq!(
        groups,
        BTreeSet::from(["default".to_string(), "mail".to_string()])
    );
}

#[test]
fn test_all_groups_drops_emptied_group() {
    let fx = TestFixture::new();
    let mail = fx.manager.group("mail");
    mail.set("smtp.port", 25).unwrap();
    assert!(mail.forget("smtp.port"));

    assert!(fx.manager.all_groups().unwrap().is_empty());
}

#[test]
fn test_update_keeps_created_at() {
    let fx = TestFixture::new();
    fx.manager.set("counter", 1).unwrap();
    let first = fx.manager.find("counter").unwrap().unwrap();

    fx.manager.set("counter", 2).unwrap();
    let second = fx.manager.find("counter").unwrap().unwrap();

    assert_eq!(first.created_at, second.created_at);
    assert!(second.updated_at >= first.updated_at);
    assert_eq!(second.value, "2");
}

#[test]
fn test_group_scoping_does_not_mutate_original() {
    let fx = TestFixture::new();
    let original = fx.manager.clone();
    let _mail = original.group("mail");

    original.set("k", "v").unwrap();

    assert_eq!(original.group_name(), "default");
    assert!(fx.manager.group("default").has("k"));
    assert!(!fx.manager.group("mail").has("k"));
}

#[test]
fn test_decoded_types_round_through_store() {
    let settings = SettingsManager::builder().build().unwrap();
    settings
        .set_many([
            ("debug", json!(false)),
            ("retries", json!(-3)),
            ("ratio", json!(0.5)),
            ("options", json!({"a": [1, 2]})),
            ("empty", json!(null)),
        ])
        .unwrap();

    let all = settings.all().unwrap();
    assert_eq!(all["debug"], json!(false));
    assert_eq!(all["retries"], json!(-3));
    assert_eq!(all["ratio"], json!(0.5));
    assert_eq!(all["options"], json!({"a": [1, 2]}));
    assert_eq!(all["empty"], json!(null));
}
