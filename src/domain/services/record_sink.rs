// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::tender::TenderRecord;
use crate::domain::repositories::tender_repository::RepositoryError;
use async_trait::async_trait;
use thiserror::Error;

/// 存储端错误类型
#[derive(Error, Debug)]
pub enum SinkError {
    /// 存储端拒绝了这一批记录
    #[error("Batch rejected: {0}")]
    Rejected(String),
    /// 与存储端通信失败
    #[error("Transport error: {0}")]
    Transport(String),
    /// 本地仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// 记录存储端特质
///
/// 爬取控制器每页调用一次，存储端自行决定如何持久化
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// 保存一批记录
    ///
    /// # 参数
    ///
    /// * `records` - 当前页抽取的记录
    ///
    /// # 返回值
    ///
    /// * `Ok(usize)` - 存储端确认保存的数量；空批次直接返回0
    /// * `Err(SinkError)` - 保存失败
    async fn save_records(&self, records: &[TenderRecord]) -> Result<usize, SinkError>;

    /// 存储端名称，用于日志
    fn name(&self) -> &str;
}
