use chrono::NaiveDate;
use serde_json::json;
use sql_record::prelude::*;
use tempfile::tempdir;

fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

async fn accounts(prefix: &str) -> Result<Database, SqlRecordError> {
    let db = Database::open(unique_db_path(prefix)).await?;
    db.execute(
        "CREATE TABLE accounts (
            id INTEGER PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            meta JSON,
            created_at TEXT
        );",
    )
    .await?;
    Ok(db)
}

#[tokio::test]
async fn bulk_insert_returns_ids_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let db = accounts("bulk_ok").await?;
    let accounts = db.table("accounts");
    let rows: Vec<FieldMap> = ["a@x", "b@x", "c@x"]
        .into_iter()
        .map(|email| FieldMap::new().set("email", email))
        .collect();

    let ids = accounts.insert_many(&rows).await?;
    assert_eq!(ids.len(), 3);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(accounts.order_by("id", "ASC")?.get().await?.ids(), ids);
    assert!(accounts.insert_many(&[]).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn bulk_insert_is_all_or_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let db = accounts("bulk_atomic").await?;
    let accounts = db.table("accounts");
    accounts
        .create(&FieldMap::new().set("email", "taken@x"))
        .await?;

    let rows = vec![
        FieldMap::new().set("email", "new1@x"),
        FieldMap::new().set("email", "taken@x"),
        FieldMap::new().set("email", "new2@x"),
    ];
    let err = accounts.insert_many(&rows).await.unwrap_err();
    match &err {
        SqlRecordError::EngineError { code, .. } => assert!(code.is_some()),
        other => panic!("expected engine error, got {other:?}"),
    }
    assert_eq!(err.to_payload().kind, ErrorKind::EngineError);
    assert_eq!(accounts.count().await?, 1);

    let with_empty = vec![FieldMap::new().set("email", "new3@x"), FieldMap::new()];
    assert!(matches!(
        accounts.insert_many(&with_empty).await,
        Err(SqlRecordError::InvalidInsert(_))
    ));
    assert!(matches!(
        accounts.insert(&FieldMap::new()).await,
        Err(SqlRecordError::InvalidInsert(_))
    ));
    assert_eq!(accounts.count().await?, 1);
    Ok(())
}

#[tokio::test]
async fn host_json_objects_insert_and_decode() -> Result<(), Box<dyn std::error::Error>> {
    let db = accounts("json_insert").await?;
    let accounts = db.table("accounts");

    let ids = accounts
        .insert_json(&json!([
            {"email": "j1@x", "meta": {"plan": "pro", "seats": 3}},
            {"email": "j2@x", "meta": "not json"}
        ]))
        .await?;
    assert_eq!(ids.len(), 2);

    let structured = accounts.find(ids[0]).await?.expect("row");
    assert_eq!(
        structured.get("meta"),
        Some(&RowValues::JSON(json!({"plan": "pro", "seats": 3})))
    );
    assert_eq!(structured.data()["meta"]["seats"], json!(3));

    let plain = accounts.find(ids[1]).await?.expect("row");
    assert_eq!(plain.get("meta"), Some(&RowValues::Text("not json".into())));
    assert!(matches!(
        plain.fields().get_json("meta"),
        Err(SqlRecordError::DecodeError(_))
    ));

    assert!(matches!(
        accounts.insert_json(&json!(42)).await,
        Err(SqlRecordError::InvalidInsert(_))
    ));
    Ok(())
}

#[tokio::test]
async fn timestamps_bind_as_sortable_text() -> Result<(), Box<dyn std::error::Error>> {
    let db = accounts("timestamps").await?;
    let accounts = db.table("accounts");
    let day = |d: u32| {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .and_then(|date| date.and_hms_opt(9, 0, 0))
            .expect("valid date")
    };
    for (email, d) in [("t1@x", 1), ("t2@x", 5), ("t3@x", 9)] {
        accounts
            .insert(&FieldMap::new().set("email", email).set("created_at", day(d)))
            .await?;
    }

    let recent = accounts.where_("created_at", ">=", day(5))?;
    assert_eq!(recent.count().await?, 2);
    let newest = accounts.order_by("created_at", "DESC")?.first().await?.expect("row");
    assert_eq!(
        newest.get("created_at").and_then(RowValues::as_timestamp),
        Some(day(9))
    );
    Ok(())
}

#[tokio::test]
async fn raw_execute_and_query() -> Result<(), Box<dyn std::error::Error>> {
    let db = accounts("raw").await?;
    db.execute(
        "INSERT INTO accounts (email) VALUES ('r1@x');
         INSERT INTO accounts (email) VALUES ('r2@x');",
    )
    .await?;

    let rows = db.query("SELECT email FROM accounts ORDER BY id").await?;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.results[1].get("email"), Some(&RowValues::Text("r2@x".into())));

    let json = db.query_json("SELECT COUNT(*) AS n FROM accounts").await?;
    assert_eq!(json, json!([{"n": 2}]));

    let err = db.execute("INSERT INTO nowhere VALUES (1)").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EngineError);
    Ok(())
}

#[tokio::test]
async fn options_apply_pragmas() -> Result<(), Box<dyn std::error::Error>> {
    let path = unique_db_path("pragmas");
    let db = DatabaseOptions::builder(path.clone())
        .wal(true)
        .foreign_keys(true)
        .build()
        .await?;
    assert_eq!(db.path(), path);

    let mode = db.query("PRAGMA journal_mode").await?;
    assert_eq!(
        mode.first().and_then(|r| r.get_by_index(0)).and_then(RowValues::as_text),
        Some("wal")
    );
    let fk = db.query("PRAGMA foreign_keys").await?;
    assert_eq!(fk.first().and_then(|r| r.get_by_index(0)), Some(&RowValues::Int(1)));

    assert!(matches!(
        Database::open("").await,
        Err(SqlRecordError::ConfigError(_))
    ));
    Ok(())
}

#[tokio::test]
async fn closed_database_rejects_every_handle() -> Result<(), Box<dyn std::error::Error>> {
    let db = accounts("closed").await?;
    let accounts = db.table("accounts");
    let id = accounts.insert(&FieldMap::new().set("email", "c@x")).await?;
    let record = accounts.find(id).await?.expect("row");

    db.close().await?;

    assert_eq!(
        db.query("SELECT 1").await.unwrap_err().kind(),
        ErrorKind::ConnectionError
    );
    assert!(matches!(
        accounts.count().await,
        Err(SqlRecordError::ConnectionError(_))
    ));
    assert!(matches!(
        record.update(&FieldMap::new().set("email", "d@x")).await,
        Err(SqlRecordError::ConnectionError(_))
    ));
    assert!(db.close().await.is_err());
    Ok(())
}
