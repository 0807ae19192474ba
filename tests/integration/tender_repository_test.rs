// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::memory_db;
use page_spider::domain::models::tender::TenderRecord;
use page_spider::domain::repositories::tender_repository::{RepositoryError, TenderRepository};
use page_spider::infrastructure::repositories::tender_repo_impl::TenderRepositoryImpl;

fn record(id: &str, title: &str, release: &str) -> TenderRecord {
    let mut record = TenderRecord::new(id, title, format!("https://www.ccgp.gov.cn/{}.htm", id));
    record.release_time = Some(release.to_string());
    record.open_tender_code = format!("CODE-{}", id);
    record
}

#[tokio::test]
async fn test_upsert_and_query() {
    let repo = TenderRepositoryImpl::new(memory_db().await);

    let saved = repo
        .upsert_batch(&[
            record("a", "甲项目", "2025-01-01"),
            record("b", "乙项目", "2025-02-01"),
        ])
        .await
        .unwrap();
    assert_eq!(saved, 2);
    assert_eq!(repo.count(None).await.unwrap(), 2);

    let all = repo.find_all().await.unwrap();
    assert_eq!(all[0].tender_id, "b");
    assert_eq!(all[1].tender_id, "a");

    let found = repo.find_by_tender_id("a").await.unwrap().unwrap();
    assert_eq!(found.title, "甲项目");
    assert!(repo.find_by_tender_id("zzz").await.unwrap().is_none());

    let by_code = repo.find_by_open_tender_code("CODE-b").await.unwrap();
    assert_eq!(by_code.len(), 1);
}

#[tokio::test]
async fn test_upsert_replaces_fields_but_keeps_flag() {
    let repo = TenderRepositoryImpl::new(memory_db().await);
    repo.upsert_batch(&[record("a", "旧标题", "2025-01-01")])
        .await
        .unwrap();
    repo.update_flag("a", 2).await.unwrap();

    repo.upsert_batch(&[record("a", "新标题", "2025-01-02")])
        .await
        .unwrap();

    let found = repo.find_by_tender_id("a").await.unwrap().unwrap();
    assert_eq!(found.title, "新标题");
    assert_eq!(found.release_time.as_deref(), Some("2025-01-02"));
    assert_eq!(found.flag, 2);
    assert_eq!(repo.count(None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_duplicate_ids_in_one_batch_collapse() {
    let repo = TenderRepositoryImpl::new(memory_db().await);
    let saved = repo
        .upsert_batch(&[
            record("a", "第一次", "2025-01-01"),
            record("a", "第二次", "2025-01-01"),
        ])
        .await
        .unwrap();
    assert_eq!(saved, 1);
    let found = repo.find_by_tender_id("a").await.unwrap().unwrap();
    assert_eq!(found.title, "第二次");
}

#[tokio::test]
async fn test_empty_batch_is_noop() {
    let repo = TenderRepositoryImpl::new(memory_db().await);
    assert_eq!(repo.upsert_batch(&[]).await.unwrap(), 0);
    assert_eq!(repo.count(None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_flag_queries_and_clear() {
    let repo = TenderRepositoryImpl::new(memory_db().await);
    repo.upsert_batch(&[
        record("a", "甲", "2025-01-01"),
        record("b", "乙", "2025-01-02"),
        record("c", "丙", "2025-01-03"),
    ])
    .await
    .unwrap();
    repo.update_flag("b", 1).await.unwrap();

    assert_eq!(repo.count(Some(1)).await.unwrap(), 1);
    assert_eq!(repo.count(Some(0)).await.unwrap(), 2);
    let flagged = repo.find_by_flag(1).await.unwrap();
    assert_eq!(flagged[0].tender_id, "b");

    assert!(matches!(
        repo.update_flag("missing", 1).await,
        Err(RepositoryError::NotFound)
    ));

    assert_eq!(repo.clear().await.unwrap(), 3);
    assert_eq!(repo.count(None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_long_text_is_clipped_to_column_width() {
    let repo = TenderRepositoryImpl::new(memory_db().await);
    let mut long = record("a", &"长".repeat(300), "2025-01-01");
    long.province_name = "省".repeat(40);
    repo.upsert_batch(&[long]).await.unwrap();

    let found = repo.find_by_tender_id("a").await.unwrap().unwrap();
    assert_eq!(found.title.chars().count(), 200);
    assert_eq!(found.province_name.chars().count(), 20);
}

#[tokio::test]
async fn test_file_database_survives_reconnect_and_remigration() {
    use page_spider::config::settings::DatabaseSettings;
    use page_spider::infrastructure::database::connection;
    use std::sync::Arc;

    let dir = tempfile::tempdir().unwrap();
    let settings = DatabaseSettings {
        url: format!("sqlite://{}?mode=rwc", dir.path().join("tender.db").display()),
        max_connections: Some(2),
        min_connections: None,
        connect_timeout: Some(5),
        idle_timeout: None,
    };

    let db = Arc::new(connection::connect_and_migrate(&settings).await.unwrap());
    TenderRepositoryImpl::new(db.clone())
        .upsert_batch(&[record("a", "甲项目", "2025-01-01")])
        .await
        .unwrap();
    db.as_ref().clone().close().await.unwrap();

    let db = Arc::new(connection::connect_and_migrate(&settings).await.unwrap());
    let repo = TenderRepositoryImpl::new(db);
    assert_eq!(repo.count(None).await.unwrap(), 1);
}
