// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{fast_timing, listing_html, FakePage, RecordingSink};
use async_trait::async_trait;
use page_spider::application::dto::crawl_request::StartCrawlDto;
use page_spider::application::use_cases::crawl_use_case::{
    CrawlUseCase, CrawlUseCaseError, PageOpener,
};
use page_spider::config::settings::Settings;
use page_spider::domain::models::session::{CrawlMode, CrawlState};
use page_spider::domain::rules::default_rule::DEFAULT_RULE_NAME;
use page_spider::domain::rules::RuleRegistry;
use page_spider::domain::services::crawl_controller::{
    ControllerOptions, CrawlController, StartOutcome,
};
use page_spider::engines::traits::{PageDriver, PageError};
use page_spider::utils::errors::CrawlError;
use std::sync::Arc;

/// 总是返回同一个脚本化页面
struct FakeOpener(Arc<FakePage>);

#[async_trait]
impl PageOpener for FakeOpener {
    async fn open(&self, _url: &str) -> Result<Arc<dyn PageDriver>, PageError> {
        Ok(self.0.clone())
    }
}

fn use_case(page: Arc<FakePage>, sink: Arc<RecordingSink>) -> CrawlUseCase {
    let settings = Settings::defaults().unwrap();
    CrawlUseCase::new(
        Arc::new(RuleRegistry::with_builtin_rules()),
        CrawlController::new(
            sink,
            ControllerOptions {
                timing: fast_timing(),
                ..ControllerOptions::default()
            },
        ),
        Arc::new(FakeOpener(page)),
        &settings.crawl,
    )
}

fn two_pages() -> Arc<FakePage> {
    FakePage::dom(vec![
        (
            "https://example.com/list/1",
            listing_html(&["甲项目", "乙项目"], Some("/list/2")),
        ),
        (
            "https://example.com/list/2",
            listing_html(&["丙项目"], None),
        ),
    ])
}

#[tokio::test(start_paused = true)]
async fn test_unmatched_url_without_selector_is_no_rule() {
    let use_case = use_case(two_pages(), RecordingSink::new());
    let result = use_case
        .start(StartCrawlDto::new("https://example.com/list/1"))
        .await;
    assert!(matches!(
        result,
        Err(CrawlUseCaseError::Crawl(CrawlError::NoRule(_)))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_unmatched_url_with_selector_uses_default_rule() {
    let sink = RecordingSink::new();
    let use_case = use_case(two_pages(), sink.clone());

    let mut dto = StartCrawlDto::new("https://example.com/list/1");
    dto.selector = Some("ul.list > li".to_string());
    dto.delay_ms = Some(0);
    assert_eq!(use_case.start(dto).await.unwrap(), StartOutcome::Started);
    use_case.wait().await;

    let status = use_case.status();
    assert_eq!(status.rule_name, DEFAULT_RULE_NAME);
    assert_eq!(status.state, CrawlState::Completed);
    assert_eq!(status.total_crawled, 3);
    assert_eq!(sink.batch_sizes(), vec![2, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_max_pages_limits_session() {
    let sink = RecordingSink::new();
    let use_case = use_case(two_pages(), sink.clone());

    let mut dto = StartCrawlDto::new("https://example.com/list/1");
    dto.mode = CrawlMode::Custom;
    dto.selector = Some("ul.list > li".to_string());
    dto.max_pages = Some(1);
    use_case.start(dto).await.unwrap();
    use_case.wait().await;

    let status = use_case.status();
    assert_eq!(status.state, CrawlState::Completed);
    assert_eq!(status.page_number, 1);
    assert_eq!(sink.batch_sizes(), vec![2]);
}

#[tokio::test(start_paused = true)]
async fn test_rule_resolution_prefers_registry() {
    let use_case = use_case(two_pages(), RecordingSink::new());
    let rule = use_case
        .resolve_rule(
            "http://search.ccgp.gov.cn/bxsearch?searchtype=1",
            None,
            CrawlMode::Auto,
        )
        .unwrap();
    assert_eq!(rule.name(), "CcgpSearchRule");

    let rule = use_case
        .resolve_rule(
            "http://search.ccgp.gov.cn/bxsearch?searchtype=1",
            Some("li"),
            CrawlMode::Custom,
        )
        .unwrap();
    assert_eq!(rule.name(), DEFAULT_RULE_NAME);
}
