// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::tender::TenderRecord;
use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
}

/// 招标信息仓库特质
///
/// 以 `tender_id` 为主键；重复写入同一ID时覆盖内容字段，创建时间和下游标志保持不变
#[async_trait]
pub trait TenderRepository: Send + Sync {
    /// 批量写入
    ///
    /// # 参数
    ///
    /// * `records` - 待写入的记录，批内重复ID以最后一条为准
    ///
    /// # 返回值
    ///
    /// * `Ok(usize)` - 写入的记录数
    /// * `Err(RepositoryError)` - 写入失败
    async fn upsert_batch(&self, records: &[TenderRecord]) -> Result<usize, RepositoryError>;

    /// 按发布时间、创建时间倒序返回全部记录
    async fn find_all(&self) -> Result<Vec<TenderRecord>, RepositoryError>;

    /// 根据ID查找
    async fn find_by_tender_id(&self, tender_id: &str)
        -> Result<Option<TenderRecord>, RepositoryError>;

    /// 根据项目编号查找
    async fn find_by_open_tender_code(
        &self,
        code: &str,
    ) -> Result<Vec<TenderRecord>, RepositoryError>;

    /// 根据下游标志查找
    async fn find_by_flag(&self, flag: i32) -> Result<Vec<TenderRecord>, RepositoryError>;

    /// 更新下游标志，记录不存在时返回 `NotFound`
    async fn update_flag(&self, tender_id: &str, flag: i32) -> Result<(), RepositoryError>;

    /// 统计记录数，可按标志过滤
    async fn count(&self, flag: Option<i32>) -> Result<u64, RepositoryError>;

    /// 清空全部记录，返回删除数量
    async fn clear(&self) -> Result<u64, RepositoryError>;
}
