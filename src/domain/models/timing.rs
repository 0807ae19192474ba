// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

/// 页面等待参数
///
/// 所有等待都是有界的：轮询间隔固定，次数或总时长有上限
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTiming {
    /// 导航检测的轮询间隔
    pub poll_interval: Duration,
    /// 导航检测的最大轮询次数
    pub max_polls: u32,
    /// 列表项存在时，超过该轮询次数即认为页面已稳定
    pub settle_polls: u32,
    /// 检测到新内容后的额外等待
    pub settle_delay: Duration,
    /// 页面加载等待上限
    pub load_timeout: Duration,
    /// 直接导航后的等待
    pub link_grace: Duration,
    /// 点击后的等待
    pub click_grace: Duration,
    /// 指针事件之间的间隔
    pub pointer_step: Duration,
    /// 网络拦截超时
    pub intercept_timeout: Duration,
}

impl Default for CrawlTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            max_polls: 100,
            settle_polls: 10,
            settle_delay: Duration::from_millis(1000),
            load_timeout: Duration::from_millis(5000),
            link_grace: Duration::from_millis(200),
            click_grace: Duration::from_millis(2000),
            pointer_step: Duration::from_millis(50),
            intercept_timeout: Duration::from_millis(15000),
        }
    }
}
