// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::session::CrawlMode;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// 启动爬取请求
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_custom_selector"))]
pub struct StartCrawlDto {
    /// 列表页URL
    #[validate(url)]
    pub url: String,
    /// 列表项选择器，`custom` 模式必填
    pub selector: Option<String>,
    /// 翻页间隔（毫秒），缺省时使用配置值
    #[validate(range(min = 0, max = 60000))]
    pub delay_ms: Option<u64>,
    #[serde(default)]
    pub mode: CrawlMode,
    /// 最多爬取的页数，缺省时使用配置值
    #[validate(range(min = 1))]
    pub max_pages: Option<u32>,
}

impl StartCrawlDto {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            selector: None,
            delay_ms: None,
            mode: CrawlMode::Auto,
            max_pages: None,
        }
    }

    /// 去除首尾空白后的非空选择器
    pub fn selector(&self) -> Option<&str> {
        self.selector
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

fn validate_custom_selector(dto: &StartCrawlDto) -> Result<(), ValidationError> {
    if dto.mode == CrawlMode::Custom && dto.selector().is_none() {
        let mut error = ValidationError::new("selector_required");
        error.message = Some("custom mode requires a selector".into());
        return Err(error);
    }
    Ok(())
}
