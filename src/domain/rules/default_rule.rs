// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::tender::TenderRecord;
use crate::domain::models::tender_id;
use crate::domain::rules::dom::{link_of, select_first, text_of};
use crate::domain::rules::traits::{SiteRule, UrlPattern};
use crate::engines::traits::PageSnapshot;
use crate::utils::errors::CrawlError;
use scraper::ElementRef;
use url::Url;

/// 默认规则名称
pub const DEFAULT_RULE_NAME: &str = "默认规则";

/// 兜底规则
///
/// 不匹配任何URL，只在用户提供了列表项选择器时使用。
/// 标题取第一个链接的文本（没有链接时取元素文本），地址取该链接
#[derive(Debug, Default)]
pub struct DefaultRule;

impl DefaultRule {
    pub fn new() -> Self {
        Self
    }
}

impl SiteRule for DefaultRule {
    fn name(&self) -> &str {
        DEFAULT_RULE_NAME
    }

    fn url_patterns(&self) -> &[UrlPattern] {
        &[]
    }

    fn list_item_selector(&self) -> &str {
        ""
    }

    fn next_page_selector(&self) -> &str {
        r#"a[rel="next"]"#
    }

    fn extract_item(&self, element: ElementRef<'_>, page_url: &Url) -> Option<TenderRecord> {
        let anchor = select_first(element, "a");
        let title = anchor
            .map(text_of)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| text_of(element));
        let url = anchor
            .and_then(|a| link_of(a, page_url))
            .unwrap_or_default();
        let id = tender_id::generate(&url, &title, &[]);
        Some(TenderRecord::new(id, title, url))
    }

    fn preflight(&self, snapshot: &PageSnapshot, list_selector: &str) -> Result<(), CrawlError> {
        if list_selector.trim().is_empty() || snapshot.count(list_selector) == 0 {
            return Err(CrawlError::MissingSelector(list_selector.to_string()));
        }
        Ok(())
    }
}
