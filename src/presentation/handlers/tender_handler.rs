// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::application::dto::tender_request::{
    CountQuery, SaveBatchRequest, SaveResponse, UpdateFlagRequest,
};
use crate::domain::models::tender::TenderRecord;
use crate::domain::models::tender_id::{self, MAX_TENDER_ID_LEN};
use crate::domain::repositories::tender_repository::TenderRepository;
use crate::presentation::errors::AppError;

type Repository = Arc<dyn TenderRepository>;

/// 拒绝缺少ID、ID超出主键宽度或标题与链接都为空的记录
fn check_records(records: &[TenderRecord]) -> Result<(), AppError> {
    if let Some(index) = records
        .iter()
        .position(|r| r.tender_id.trim().is_empty() || !r.is_valid())
    {
        return Err(AppError::bad_request(format!(
            "record {} is invalid: tenderId and title or url are required",
            index
        )));
    }
    if let Some(index) = records
        .iter()
        .position(|r| !tender_id::fits_key(&r.tender_id))
    {
        return Err(AppError::bad_request(format!(
            "record {} is invalid: tenderId exceeds {} characters",
            index, MAX_TENDER_ID_LEN
        )));
    }
    Ok(())
}

/// 健康检查
///
/// 返回服务状态和数据库是否可用
pub async fn health(Extension(repository): Extension<Repository>) -> impl IntoResponse {
    let db_connected = repository.count(None).await.is_ok();
    Json(json!({ "status": "ok", "dbConnected": db_connected }))
}

/// 保存单条招标信息
pub async fn save(
    Extension(repository): Extension<Repository>,
    payload: Result<Json<TenderRecord>, JsonRejection>,
) -> Result<Json<SaveResponse>, AppError> {
    let Json(record) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;
    let records = [record];
    check_records(&records)?;

    let count = repository.upsert_batch(&records).await?;
    Ok(Json(SaveResponse {
        success: true,
        count,
    }))
}

/// 批量保存招标信息
///
/// 请求体可以是 `{"items": [...]}` 或数组
pub async fn save_batch(
    Extension(repository): Extension<Repository>,
    payload: Result<Json<SaveBatchRequest>, JsonRejection>,
) -> Result<Json<SaveResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;
    let records = request.into_items();
    check_records(&records)?;

    let count = repository.upsert_batch(&records).await.map_err(|e| {
        error!("Failed to save tender batch: {}", e);
        e
    })?;
    info!("Saved {} tender records", count);
    Ok(Json(SaveResponse {
        success: true,
        count,
    }))
}

/// 获取全部招标信息
pub async fn list_all(
    Extension(repository): Extension<Repository>,
) -> Result<Json<Vec<TenderRecord>>, AppError> {
    Ok(Json(repository.find_all().await?))
}

/// 清空招标信息
pub async fn clear_all(
    Extension(repository): Extension<Repository>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = repository.clear().await?;
    info!("Cleared {} tender records", deleted);
    Ok(Json(json!({ "success": true, "count": deleted })))
}

/// 统计招标信息数量，可按标志过滤
pub async fn count(
    Extension(repository): Extension<Repository>,
    Query(query): Query<CountQuery>,
) -> Result<Json<u64>, AppError> {
    Ok(Json(repository.count(query.flag).await?))
}

/// 按项目编号查询
pub async fn find_by_no(
    Extension(repository): Extension<Repository>,
    Path(code): Path<String>,
) -> Result<Json<Vec<TenderRecord>>, AppError> {
    Ok(Json(repository.find_by_open_tender_code(&code).await?))
}

/// 按标志查询
pub async fn find_by_flag(
    Extension(repository): Extension<Repository>,
    Path(flag): Path<i32>,
) -> Result<Json<Vec<TenderRecord>>, AppError> {
    Ok(Json(repository.find_by_flag(flag).await?))
}

/// 更新招标标志
pub async fn update_flag(
    Extension(repository): Extension<Repository>,
    Path(tender_id): Path<String>,
    payload: Result<Json<UpdateFlagRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;
    repository.update_flag(&tender_id, request.flag).await?;
    Ok(Json(json!({ "success": true, "message": "标志更新成功" })))
}
