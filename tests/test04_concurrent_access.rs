use std::collections::HashSet;

use sql_record::prelude::*;
use tempfile::tempdir;

fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_inserts_get_their_own_ids() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open(unique_db_path("concurrent_inserts")).await?;
    db.execute("CREATE TABLE events (id INTEGER PRIMARY KEY, label TEXT NOT NULL);")
        .await?;

    let mut handles = Vec::new();
    for i in 0..200 {
        let events = db.table("events");
        handles.push(tokio::spawn(async move {
            let label = format!("event-{i}");
            let id = events.insert(&FieldMap::new().set("label", label.clone())).await?;
            Ok::<_, SqlRecordError>((id, label))
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        let (id, label) = handle.await??;
        assert!(seen.insert(id), "id {id} handed out twice");
        let record = db.table("events").find(id).await?.expect("row");
        assert_eq!(record.get("label"), Some(&RowValues::Text(label)));
    }
    assert_eq!(db.table("events").count().await?, 200);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_and_writers_share_one_connection() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open(unique_db_path("mixed")).await?;
    db.execute(
        "CREATE TABLE counters (id INTEGER PRIMARY KEY, n INTEGER NOT NULL);
         INSERT INTO counters (id, n) VALUES (1, 0);",
    )
    .await?;

    let mut writers = Vec::new();
    for _ in 0..50 {
        let db = db.clone();
        writers.push(tokio::spawn(async move {
            db.execute("UPDATE counters SET n = n + 1 WHERE id = 1").await
        }));
    }
    let mut readers = Vec::new();
    for _ in 0..50 {
        let counters = db.table("counters");
        readers.push(tokio::spawn(async move {
            let row = counters.find(1).await?;
            Ok::<_, SqlRecordError>(row.and_then(|r| r.get("n").and_then(RowValues::as_int).copied()))
        }));
    }

    for writer in writers {
        writer.await??;
    }
    for reader in readers {
        let n = reader.await??.expect("counter row");
        assert!((0..=50).contains(&n));
    }
    let total = db.table("counters").find(1).await?.expect("counter row");
    assert_eq!(total.get("n"), Some(&RowValues::Int(50)));
    Ok(())
}

#[tokio::test]
async fn handles_outlive_the_database_value() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open(unique_db_path("outlive")).await?;
    db.execute("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT);")
        .await?;
    let notes = db.table("notes");
    drop(db);

    let id = notes.insert(&FieldMap::new().set("body", "still open")).await?;
    assert!(notes.find(id).await?.is_some());
    Ok(())
}
