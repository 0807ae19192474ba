// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::tender::{TenderField, TenderRecord};
use crate::domain::models::tender_id;
use crate::domain::rules::dom::{link_of, select_first, text_of};
use crate::domain::rules::layout::{Delimiter, FieldLayout, LayoutSlot};
use crate::domain::rules::traits::{SiteRule, UrlPattern};
use scraper::ElementRef;
use url::Url;

/// 中国政府采购网的ID主机前缀
pub(crate) const CCGP_HOST_PREFIXES: &[&str] = &["www.ccgp.gov.cn/"];

const SEARCH_SLOTS: &[LayoutSlot] = &[
    LayoutSlot::new(0, TenderField::ReleaseTime),
    LayoutSlot::labelled(1, TenderField::BuyerName, "采购人："),
    LayoutSlot::labelled(2, TenderField::AgentName, "代理机构："),
    LayoutSlot::new(7, TenderField::AfficheType),
    LayoutSlot::new(10, TenderField::ProvinceName),
    LayoutSlot::new(11, TenderField::ProjectDirectoryName),
];

/// 搜索结果摘要的行布局
///
/// 去掉 `|` 后按行拆分，至少8行；省份和品目只在行数足够时出现
pub const SEARCH_LAYOUT: FieldLayout = FieldLayout {
    delimiter: Delimiter::Newline,
    strip_chars: &['|'],
    min_segments: 8,
    slots: SEARCH_SLOTS,
};

/// 抽取"标题链接 + 摘要span"结构的列表项
///
/// 缺少链接、摘要为空或摘要不符合布局时返回 `None`
pub(crate) fn extract_summary_item(
    element: ElementRef<'_>,
    page_url: &Url,
    layout: &FieldLayout,
) -> Option<TenderRecord> {
    let anchor = select_first(element, "a")?;
    let title = text_of(anchor);
    let url = link_of(anchor, page_url).unwrap_or_default();

    let summary = select_first(element, "span").map(text_of)?;
    if summary.is_empty() {
        return None;
    }

    let id = tender_id::generate(&url, &title, CCGP_HOST_PREFIXES);
    let mut record = TenderRecord::new(id, title, url);
    layout.fill(&summary, &mut record).then_some(record)
}

/// 中国政府采购网搜索页规则 (search.ccgp.gov.cn)
pub struct CcgpSearchRule {
    patterns: Vec<UrlPattern>,
    layout: FieldLayout,
}

impl CcgpSearchRule {
    pub fn new() -> Self {
        Self {
            patterns: vec![UrlPattern::contains("search.ccgp.gov.cn")],
            layout: SEARCH_LAYOUT,
        }
    }

    /// 替换摘要布局
    pub fn with_layout(mut self, layout: FieldLayout) -> Self {
        self.layout = layout;
        self
    }
}

impl Default for CcgpSearchRule {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteRule for CcgpSearchRule {
    fn name(&self) -> &str {
        "CcgpSearchRule"
    }

    fn url_patterns(&self) -> &[UrlPattern] {
        &self.patterns
    }

    fn list_item_selector(&self) -> &str {
        ".vT-srch-result-list ul li"
    }

    fn next_page_selector(&self) -> &str {
        "div > p.pager > a.next"
    }

    fn extract_item(&self, element: ElementRef<'_>, page_url: &Url) -> Option<TenderRecord> {
        extract_summary_item(element, page_url, &self.layout)
    }
}
