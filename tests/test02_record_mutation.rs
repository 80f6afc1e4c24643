use sql_record::prelude::*;
use tempfile::tempdir;

fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

async fn people(prefix: &str) -> Result<(Database, Table), SqlRecordError> {
    let db = Database::open(unique_db_path(prefix)).await?;
    db.execute("CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER);")
        .await?;
    let table = db.table("people");
    for (name, age) in [("ann", 15), ("bob", 22), ("dan", 30), ("dee", 41)] {
        table
            .insert(&FieldMap::new().set("name", name).set("age", age))
            .await?;
    }
    Ok((db, table))
}

#[tokio::test]
async fn update_by_id_changes_only_named_fields() -> Result<(), Box<dyn std::error::Error>> {
    let (_db, people) = people("update_by_id").await?;
    let bob = people.where_eq("name", "bob")?.first().await?.expect("bob");

    people.update(bob.id(), &FieldMap::new().set("age", 23)).await?;
    let reloaded = people.find(bob.id()).await?.expect("bob");
    assert_eq!(reloaded.get("age"), Some(&RowValues::Int(23)));
    assert_eq!(reloaded.get("name"), Some(&RowValues::Text("bob".into())));

    assert!(matches!(
        people.update(9999, &FieldMap::new().set("age", 1)).await,
        Err(SqlRecordError::RecordNotFound { id: 9999, .. })
    ));
    assert!(matches!(
        people.update(bob.id(), &FieldMap::new()).await,
        Err(SqlRecordError::InvalidInsert(_))
    ));
    Ok(())
}

#[tokio::test]
async fn destroy_by_id_is_not_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let (_db, people) = people("destroy_by_id").await?;
    let ann = people.first().await?.expect("ann");

    people.destroy(ann.id()).await?;
    assert!(people.find(ann.id()).await?.is_none());

    let err = people.destroy(ann.id()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RecordNotFound);
    assert!(matches!(
        people.update(ann.id(), &FieldMap::new().set("age", 2)).await,
        Err(SqlRecordError::RecordNotFound { .. })
    ));
    assert_eq!(people.count().await?, 3);
    Ok(())
}

#[tokio::test]
async fn record_update_leaves_snapshot_until_reload() -> Result<(), Box<dyn std::error::Error>> {
    let (_db, people) = people("snapshot").await?;
    let mut dan = people.where_eq("name", "dan")?.first().await?.expect("dan");

    dan.update(&FieldMap::new().set("age", 31).set("name", "daniel"))
        .await?;
    assert_eq!(dan.get("age"), Some(&RowValues::Int(30)));

    dan.reload().await?;
    assert_eq!(dan.get("age"), Some(&RowValues::Int(31)));
    assert_eq!(dan.data()["name"], serde_json::json!("daniel"));
    assert!(matches!(
        dan.update(&FieldMap::new()).await,
        Err(SqlRecordError::InvalidInsert(_))
    ));
    Ok(())
}

#[tokio::test]
async fn destroyed_record_refuses_further_mutation() -> Result<(), Box<dyn std::error::Error>> {
    let (_db, people) = people("record_destroy").await?;
    let mut dee = people.last().await?.expect("dee");

    dee.destroy().await?;
    assert!(dee.is_destroyed());
    assert!(people.find(dee.id()).await?.is_none());

    assert!(matches!(
        dee.destroy().await,
        Err(SqlRecordError::RecordNotFound { .. })
    ));
    assert!(matches!(
        dee.update(&FieldMap::new().set("age", 1)).await,
        Err(SqlRecordError::RecordNotFound { .. })
    ));
    assert!(matches!(
        dee.reload().await,
        Err(SqlRecordError::RecordNotFound { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn clones_share_destroyed_state() -> Result<(), Box<dyn std::error::Error>> {
    let (_db, people) = people("clone_destroy").await?;
    let mut dee = people.last().await?.expect("dee");
    let stale = dee.clone();

    dee.destroy().await?;
    assert!(stale.is_destroyed());

    // Without AUTOINCREMENT the freed highest key goes to the next insert.
    let zed = people
        .insert(&FieldMap::new().set("name", "zed").set("age", 50))
        .await?;
    assert_eq!(zed, stale.id());

    assert!(matches!(
        stale.update(&FieldMap::new().set("age", 1)).await,
        Err(SqlRecordError::RecordNotFound { .. })
    ));
    let row = people.find(zed).await?.expect("zed");
    assert_eq!(row.get("name"), Some(&RowValues::Text("zed".into())));
    assert_eq!(row.get("age"), Some(&RowValues::Int(50)));
    Ok(())
}

#[tokio::test]
async fn record_notices_rows_removed_elsewhere() -> Result<(), Box<dyn std::error::Error>> {
    let (_db, people) = people("removed_elsewhere").await?;
    let mut ann = people.first().await?.expect("ann");
    people.destroy(ann.id()).await?;

    assert!(matches!(
        ann.update(&FieldMap::new().set("age", 16)).await,
        Err(SqlRecordError::RecordNotFound { .. })
    ));
    assert!(matches!(
        ann.reload().await,
        Err(SqlRecordError::RecordNotFound { .. })
    ));
    assert!(matches!(
        ann.delete().await,
        Err(SqlRecordError::RecordNotFound { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn delete_is_an_alias_for_destroy() -> Result<(), Box<dyn std::error::Error>> {
    let (_db, people) = people("delete_alias").await?;
    let mut bob = people.where_eq("name", "bob")?.first().await?.expect("bob");
    bob.delete().await?;
    assert!(people.find(bob.id()).await?.is_none());
    assert!(bob.delete().await.is_err());
    Ok(())
}

#[tokio::test]
async fn filtered_update_and_destroy() -> Result<(), Box<dyn std::error::Error>> {
    let (_db, people) = people("filtered").await?;

    let minors = people.where_("age", "<", 18)?;
    assert_eq!(minors.update_where(&FieldMap::new().set("age", 18)).await?, 1);
    assert_eq!(minors.count().await?, 0);

    let ds = people.where_("name", "LIKE", "d%")?;
    assert_eq!(ds.destroy_where().await?, 2);
    assert_eq!(people.count().await?, 2);

    assert!(matches!(
        people.destroy_where().await,
        Err(SqlRecordError::InvalidPredicate(_))
    ));
    assert!(matches!(
        people.update_where(&FieldMap::new().set("age", 0)).await,
        Err(SqlRecordError::InvalidPredicate(_))
    ));
    assert_eq!(people.count().await?, 2);
    Ok(())
}
