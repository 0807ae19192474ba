// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::application::dto::crawl_request::StartCrawlDto;
use crate::application::use_cases::crawl_use_case::CrawlUseCase;
use crate::domain::models::session::CrawlStatus;
use crate::domain::services::crawl_controller::StartOutcome;
use crate::presentation::errors::AppError;

/// 启动爬取会话
///
/// 已有会话运行时返回 `started: false`，不改变当前会话
pub async fn start_crawl(
    Extension(use_case): Extension<Arc<CrawlUseCase>>,
    payload: Result<Json<StartCrawlDto>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(dto) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;
    let outcome = use_case.start(dto).await?;
    let started = outcome == StartOutcome::Started;
    let status = if started {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(json!({
            "success": true,
            "started": started,
            "status": use_case.status(),
        })),
    ))
}

/// 停止当前会话
pub async fn stop_crawl(Extension(use_case): Extension<Arc<CrawlUseCase>>) -> impl IntoResponse {
    let stopped = use_case.stop();
    Json(json!({ "success": true, "stopped": stopped }))
}

/// 查询当前会话状态
pub async fn crawl_status(
    Extension(use_case): Extension<Arc<CrawlUseCase>>,
) -> Json<CrawlStatus> {
    Json(use_case.status())
}

/// 列出已注册的站点规则
pub async fn list_rules(Extension(use_case): Extension<Arc<CrawlUseCase>>) -> impl IntoResponse {
    let rules: Vec<_> = use_case
        .registry()
        .rules()
        .iter()
        .map(|rule| {
            json!({
                "name": rule.name(),
                "mode": rule.mode(),
                "listItemSelector": rule.list_item_selector(),
            })
        })
        .collect();
    Json(rules)
}
