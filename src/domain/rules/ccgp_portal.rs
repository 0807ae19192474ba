// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::tender::{TenderField, TenderRecord};
use crate::domain::rules::ccgp_search::extract_summary_item;
use crate::domain::rules::layout::{Delimiter, FieldLayout, LayoutSlot};
use crate::domain::rules::traits::{SiteRule, UrlPattern};
use regex::Regex;
use scraper::ElementRef;
use url::Url;

const PORTAL_SLOTS: &[LayoutSlot] = &[
    LayoutSlot::new(0, TenderField::ReleaseTime),
    LayoutSlot::labelled(1, TenderField::BuyerName, "采购人："),
    LayoutSlot::labelled(2, TenderField::AgentName, "代理机构："),
    LayoutSlot::new(3, TenderField::AfficheType),
    LayoutSlot::new(4, TenderField::ProvinceName),
    LayoutSlot::new(5, TenderField::ProjectDirectoryName),
];

/// 门户列表的摘要布局：换行或 `|` 分隔，空白段不计
pub const PORTAL_LAYOUT: FieldLayout = FieldLayout {
    delimiter: Delimiter::NewlineOrPipe,
    strip_chars: &[],
    min_segments: 4,
    slots: PORTAL_SLOTS,
};

/// 中国政府采购网通用规则
///
/// 匹配 ccgp.gov.cn 下的其他列表页，须排在 [`CcgpSearchRule`](super::ccgp_search::CcgpSearchRule) 之后
pub struct CcgpPortalRule {
    patterns: Vec<UrlPattern>,
}

impl CcgpPortalRule {
    pub fn new() -> Self {
        let patterns = Regex::new(r"(?i)ccgp\.gov\.cn")
            .map(|regex| vec![UrlPattern::Regex(regex)])
            .unwrap_or_else(|_| vec![UrlPattern::contains("ccgp.gov.cn")]);
        Self { patterns }
    }
}

impl Default for CcgpPortalRule {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteRule for CcgpPortalRule {
    fn name(&self) -> &str {
        "CcgpPortalRule"
    }

    fn url_patterns(&self) -> &[UrlPattern] {
        &self.patterns
    }

    fn list_item_selector(&self) -> &str {
        "div.vT-srch-result-list > ul > li"
    }

    fn next_page_selector(&self) -> &str {
        "div > p.pager > a.next"
    }

    fn extract_item(&self, element: ElementRef<'_>, page_url: &Url) -> Option<TenderRecord> {
        extract_summary_item(element, page_url, &PORTAL_LAYOUT)
    }
}
