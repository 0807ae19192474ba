// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 记录存储端实现
pub mod fallback_sink;
pub mod http_sink;
pub mod repository_sink;

use crate::config::settings::{SinkSettings, StorageBackend};
use crate::domain::services::record_sink::RecordSink;
use crate::infrastructure::repositories::tender_repo_impl::TenderRepositoryImpl;
use crate::utils::errors::CrawlError;
use fallback_sink::FallbackRecordSink;
use http_sink::HttpRecordSink;
use repository_sink::RepositoryRecordSink;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;

/// 按配置构建存储端
///
/// # 参数
///
/// * `settings` - 存储端配置
/// * `db` - 本地数据库连接，`local` 和 `http_with_local_fallback` 需要
///
/// # 返回值
///
/// * `Ok(Arc<dyn RecordSink>)` - 存储端
/// * `Err(CrawlError::Config)` - 所需的数据库连接缺失，或 HTTP 客户端无法创建
pub fn build_sink(
    settings: &SinkSettings,
    db: Option<Arc<DatabaseConnection>>,
) -> Result<Arc<dyn RecordSink>, CrawlError> {
    let timeout = Duration::from_secs(settings.request_timeout_secs);
    let http = || -> Result<Arc<dyn RecordSink>, CrawlError> {
        let sink = HttpRecordSink::new(settings.api_url.clone(), timeout)
            .map_err(|e| CrawlError::Config(e.to_string()))?;
        Ok(Arc::new(sink))
    };
    let local = |db: Option<Arc<DatabaseConnection>>| -> Result<Arc<dyn RecordSink>, CrawlError> {
        let db = db.ok_or_else(|| {
            CrawlError::Config(format!(
                "storage backend {:?} requires a database connection",
                settings.storage_backend
            ))
        })?;
        Ok(Arc::new(RepositoryRecordSink::new(Arc::new(
            TenderRepositoryImpl::new(db),
        ))))
    };

    match settings.storage_backend {
        StorageBackend::Http => http(),
        StorageBackend::Local => local(db),
        StorageBackend::HttpWithLocalFallback => {
            Ok(Arc::new(FallbackRecordSink::new(http()?, local(db)?)))
        }
    }
}
