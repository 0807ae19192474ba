// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::interceptor::InterceptError;
use crate::engines::traits::PageError;
use thiserror::Error;

/// 爬取错误类型
///
/// 只有规则解析失败和启动参数错误会以 `Err` 的形式传递给调用方，
/// 页面级与条目级错误都在产生它们的组件边界上被转换为状态和日志。
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("没有规则匹配当前URL: {0}")]
    NoRule(String),

    #[error("页面中不存在必需的元素: {0}")]
    MissingSelector(String),

    #[error("无效的CSS选择器: {0}")]
    InvalidSelector(String),

    #[error("无效的启动参数: {0}")]
    InvalidStart(String),

    #[error("规则 {0} 不支持API模式")]
    UnsupportedMode(String),

    #[error("页面错误: {0}")]
    Page(#[from] PageError),

    #[error("网络拦截错误: {0}")]
    Interception(#[from] InterceptError),

    #[error("配置错误: {0}")]
    Config(String),
}

impl CrawlError {
    /// 判断错误是否属于用户错误（爬取从未开始）
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            CrawlError::NoRule(_)
                | CrawlError::MissingSelector(_)
                | CrawlError::InvalidSelector(_)
                | CrawlError::InvalidStart(_)
        )
    }

    /// 判断错误是否为拦截超时
    pub fn is_interception_timeout(&self) -> bool {
        matches!(self, CrawlError::Interception(InterceptError::Timeout(_)))
    }
}
