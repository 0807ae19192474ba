// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::tender::{TenderField, TenderRecord};
use crate::domain::models::tender_id;
use crate::domain::models::timing::CrawlTiming;
use crate::domain::rules::dom::{link_of, select_first, text_of};
use crate::domain::rules::json_fields::{scalar_text, JsonFieldMap};
use crate::domain::rules::traits::{ApiTrigger, ExtractionMode, SiteRule, UrlPattern};
use crate::engines::envelope::locate_records;
use crate::engines::interceptor::Interceptor;
use crate::engines::traits::{PageDriver, PageError, PageSnapshot};
use crate::utils::errors::CrawlError;
use crate::utils::url_utils::resolve_href;
use async_trait::async_trait;
use scraper::ElementRef;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

const SICHUAN_HOST_PREFIXES: &[&str] = &["www.ccgp-sichuan.gov.cn/", "ccgp-sichuan.gov.cn/"];

const DEFAULT_PROVINCE: &str = "四川省";

/// 接口返回字段的候选键
pub const SICHUAN_FIELDS: JsonFieldMap = JsonFieldMap::new(&[
    (TenderField::Title, &["title", "tenderTitle", "name", "projectName"]),
    (TenderField::Url, &["url", "link", "detailUrl"]),
    (TenderField::ReleaseTime, &["releaseTime", "publishTime", "createTime"]),
    (TenderField::BuyerName, &["buyerName", "purchaser", "buyer"]),
    (TenderField::AgentName, &["agentName", "agency", "agent"]),
    (TenderField::ProvinceName, &["provinceName", "province"]),
    (TenderField::AfficheType, &["afficheType", "announcementType", "type"]),
    (TenderField::ProjectDirectoryName, &["projectDirectoryName", "category", "directory"]),
    (TenderField::DistrictName, &["districtName", "district", "area"]),
    (TenderField::ProjectPurchaseWay, &["projectPurchaseWay", "purchaseWay", "method"]),
    (TenderField::OpenTenderCode, &["openTenderCode", "tenderCode", "code"]),
    (TenderField::Budget, &["budget", "amount"]),
    (TenderField::ExpireTime, &["expireTime", "deadline", "endTime"]),
]);

/// 四川政府采购网规则 (www.ccgp-sichuan.gov.cn)
///
/// 列表由前端脚本通过接口加载，数据从拦截到的接口响应中读取
pub struct CcgpSichuanRule {
    patterns: Vec<UrlPattern>,
    query_button_selector: String,
}

impl CcgpSichuanRule {
    pub fn new() -> Self {
        Self {
            patterns: vec![
                UrlPattern::contains("www.ccgp-sichuan.gov.cn"),
                UrlPattern::contains("ccgp-sichuan.gov.cn"),
            ],
            query_button_selector: "div > button.el-button.el-button--primary.el-button--medium"
                .to_string(),
        }
    }

    pub fn query_button_selector(&self) -> &str {
        &self.query_button_selector
    }

    fn tender_id_for(&self, item: &Value, url: &str, title: &str, page_url: &str) -> String {
        if !url.is_empty() {
            return tender_id::generate(url, title, SICHUAN_HOST_PREFIXES);
        }
        ["id", "tenderId"]
            .iter()
            .find_map(|key| item.get(key).and_then(scalar_text))
            .filter(|id| tender_id::fits_key(id))
            .unwrap_or_else(|| tender_id::fallback(page_url, title))
    }
}

impl Default for CcgpSichuanRule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SiteRule for CcgpSichuanRule {
    fn name(&self) -> &str {
        "CcgpSichuanRule"
    }

    fn url_patterns(&self) -> &[UrlPattern] {
        &self.patterns
    }

    fn list_item_selector(&self) -> &str {
        "div.is-scrolling-none > table > tbody > tr"
    }

    fn next_page_selector(&self) -> &str {
        "div.el-pagination > button.btn-next, .el-pagination .btn-next"
    }

    fn mode(&self) -> ExtractionMode {
        ExtractionMode::Api
    }

    fn extract_item(&self, element: ElementRef<'_>, page_url: &Url) -> Option<TenderRecord> {
        let anchor = select_first(element, "a")?;
        let title = text_of(anchor);
        let url = link_of(anchor, page_url)?;
        if title.is_empty() {
            return None;
        }
        let id = tender_id::generate(&url, &title, SICHUAN_HOST_PREFIXES);
        let mut record = TenderRecord::new(id, title, url);
        record.province_name = DEFAULT_PROVINCE.to_string();
        Some(record)
    }

    fn extract_api_item(&self, item: &Value, page_url: &str) -> Option<TenderRecord> {
        if !item.is_object() {
            return None;
        }
        let mut record = TenderRecord::default();
        SICHUAN_FIELDS.fill(item, &mut record);

        if !record.url.is_empty() {
            if let Some(absolute) = Url::parse(page_url)
                .ok()
                .and_then(|base| resolve_href(&base, &record.url))
            {
                record.url = absolute;
            }
        }
        if record.province_name.is_empty() {
            record.province_name = DEFAULT_PROVINCE.to_string();
        }
        record.tender_id = self.tender_id_for(item, &record.url, &record.title, page_url);
        record.is_valid().then_some(record)
    }

    fn preflight(&self, snapshot: &PageSnapshot, _list_selector: &str) -> Result<(), CrawlError> {
        if snapshot.count(&self.query_button_selector) == 0 {
            return Err(CrawlError::MissingSelector(self.query_button_selector.clone()));
        }
        Ok(())
    }

    async fn crawl_from_api(
        &self,
        page: &dyn PageDriver,
        trigger: &ApiTrigger,
        timing: &CrawlTiming,
    ) -> Result<Vec<TenderRecord>, CrawlError> {
        let network = page.network();
        let captured = match trigger {
            ApiTrigger::Query => {
                self.wait_for_load(page, timing).await;
                debug!("Clicking query button {}", self.query_button_selector);
                Interceptor::intercept(
                    &network,
                    page.click(&self.query_button_selector),
                    timing.intercept_timeout,
                )
                .await?
            }
            ApiTrigger::NextPage(control) => {
                Interceptor::intercept(
                    &network,
                    async {
                        self.click_next_page(page, control, timing).await;
                        Ok::<(), PageError>(())
                    },
                    timing.intercept_timeout,
                )
                .await?
            }
        };

        let page_url = page.current_url().await;
        let items = locate_records(&captured.response_body);
        let records: Vec<TenderRecord> = items
            .iter()
            .filter_map(|item| self.extract_api_item(item, &page_url))
            .collect();
        info!(
            "{}: {} of {} API items converted from {}",
            self.name(),
            records.len(),
            items.len(),
            captured.url
        );
        Ok(records)
    }
}
