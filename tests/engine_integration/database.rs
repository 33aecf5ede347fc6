//! Database over a recording driver

use crate::common::*;
use std::io::Write;

fn user_rows() -> Vec<Row> {
    rows(serde_json::json!([
        {"id##": 1, "name": "ann", "posts[].id##": 10, "posts[].title": "first"},
        {"id##": 1, "name": "ann", "posts[].id##": 11, "posts[].title": "second"},
        {"id##": 2, "name": "bob", "posts[].id##": null, "posts[].title": null},
    ]))
}

fn database() -> (Database, RecordingDriver) {
    init_tracing();
    let driver = RecordingDriver::new().respond("users", user_rows());
    let db = Database::builder().driver(driver.clone()).build().unwrap();
    (db, driver)
}

// ============================================================================
// Direct execution
// ============================================================================

#[test]
fn exec_returns_reshaped_entities() {
    let (db, driver) = database();
    let users = db.exec(&Query::text("users")).unwrap();
    assert_eq!(
        Value::Array(users),
        json(serde_json::json!([
            {"id": 1, "name": "ann", "posts": [{"id": 10, "title": "first"}, {"id": 11, "title": "second"}]},
            {"id": 2, "name": "bob", "posts": []},
        ]))
    );
    assert_eq!(driver.log(), vec!["users"]);
}

#[test]
fn query_returns_raw_rows() {
    let (db, _) = database();
    let raw = db.query("users", &[]).unwrap();
    assert_eq!(raw.len(), 3);
    assert!(raw[0].contains_key("posts[].id##"));
}

#[test]
fn failures_name_the_statement_and_params() {
    let (db, _) = database();
    let err = db
        .exec(&Query::text("fail select").bind(5i64).bind("x"))
        .unwrap_err();
    let message = err.to_string();
    assert!(err.is_execution());
    assert!(message.starts_with("SQL error:"));
    assert!(message.contains("fail select"));
    assert!(message.contains("Int(5)"));
}

#[test]
fn all_object_keys_by_column() {
    let (db, _) = database();
    let titles = db
        .all_object(
            &Query::text("users"),
            "id",
            ObjectMapper::function(|user| {
                let count = user.get("posts").and_then(Value::as_array).map_or(0, <[_]>::len);
                Value::Int(count as i64)
            }),
            None,
        )
        .unwrap();
    assert_eq!(titles["1"], Value::Int(2));
    assert_eq!(titles["2"], Value::Int(0));
}

// ============================================================================
// Transactions
// ============================================================================

#[test]
fn run_commits_a_successful_chain() {
    let (db, driver) = database();
    let node = db.deferred("users").chain(|users| {
        let n = users.as_array().map_or(0, <[_]>::len);
        Ok(TxMonad::new("INSERT audit", vec![Value::Int(n as i64)]))
    });

    let result = db.run(node).unwrap();
    assert_eq!(text_of(&result), "INSERT audit");
    assert_eq!(driver.log(), vec!["BEGIN", "users", "INSERT audit", "COMMIT"]);
}

#[test]
fn run_rolls_back_a_rejected_chain() {
    let (db, driver) = database();
    let node = db
        .deferred("users")
        .chain(|_| Ok(TxMonad::query("fail insert")))
        .chain(|_| Ok(TxMonad::query("unreached")));

    let err = db.run(node).unwrap_err();
    assert_eq!(err.query_text(), Some("fail insert"));
    assert_eq!(driver.log(), vec!["BEGIN", "users", "fail insert", "ROLLBACK"]);
}

#[test]
fn explicit_transaction_handle() {
    let (db, driver) = database();
    let mut tx = db.begin().unwrap();
    let first = db.get_within(&Query::text("users"), &mut tx).unwrap().unwrap();
    assert_eq!(first.get("name"), Some(&Value::from("ann")));
    tx.commit().unwrap();
    assert_eq!(driver.log(), vec!["BEGIN", "users", "COMMIT"]);
}

#[test]
fn deferred_nodes_run_on_a_caller_transaction() {
    let (db, driver) = database();
    let node = TxMonad::join(db.deferred("users"), db.deferred("users"), |a, b| {
        Ok(Value::Bool(a == b))
    });
    let mut tx = db.begin().unwrap();
    assert_eq!(node.run_within(&mut tx).unwrap(), Value::Bool(true));
    tx.rollback().unwrap();
    assert_eq!(driver.log(), vec!["BEGIN", "users", "users", "ROLLBACK"]);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn config_file_drives_the_reshaper() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "log_queries = false\n[reshape]\nspecialize_threshold = 1\n").unwrap();

    let config = EngineConfig::from_file(file.path()).unwrap();
    let db = Database::builder()
        .driver(RecordingDriver::new().respond("users", user_rows()))
        .config(config)
        .build()
        .unwrap();

    db.exec(&Query::text("users")).unwrap();
    assert!(!db.config().log_queries);
    assert_eq!(db.reshaper().plans().len(), 1);
}

#[test]
fn database_is_shared_across_threads() {
    let (db, driver) = database();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let db = db.clone();
            std::thread::spawn(move || db.exec(&Query::text("users")).unwrap().len())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
    assert_eq!(driver.log().len(), 4);
}
