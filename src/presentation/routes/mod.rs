// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::crawl_use_case::CrawlUseCase;
use crate::domain::repositories::tender_repository::TenderRepository;
use crate::presentation::handlers::{crawl_handler, tender_handler};
use axum::{
    routing::{get, post, put},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// # 返回值
///
/// 返回未注入依赖的路由
pub fn routes() -> Router {
    let tender_routes = Router::new()
        .route("/save", post(tender_handler::save))
        .route("/saveBatch", post(tender_handler::save_batch))
        .route(
            "/all",
            get(tender_handler::list_all).delete(tender_handler::clear_all),
        )
        .route("/count", get(tender_handler::count))
        .route("/byNo/{no}", get(tender_handler::find_by_no))
        .route("/byFlag/{flag}", get(tender_handler::find_by_flag))
        .route("/{tender_id}/flag", put(tender_handler::update_flag));

    let crawl_routes = Router::new()
        .route("/start", post(crawl_handler::start_crawl))
        .route("/stop", post(crawl_handler::stop_crawl))
        .route("/status", get(crawl_handler::crawl_status))
        .route("/rules", get(crawl_handler::list_rules));

    Router::new()
        .route("/api/health", get(tender_handler::health))
        .route("/v1/version", get(version))
        .nest("/api/tender", tender_routes)
        .nest("/api/crawl", crawl_routes)
}

/// 创建注入了依赖的完整应用
///
/// # 参数
///
/// * `repository` - 招标信息仓库
/// * `crawl` - 爬取用例
pub fn app(repository: Arc<dyn TenderRepository>, crawl: Arc<CrawlUseCase>) -> Router {
    routes()
        .layer(Extension(repository))
        .layer(Extension(crawl))
        .layer(TraceLayer::new_for_http())
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
