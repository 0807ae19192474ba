// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 爬取状态
///
/// 状态转换：Idle → Running → Completed，Running 也可以因为停止回到 Idle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CrawlState {
    /// 空闲
    #[default]
    Idle,
    /// 运行中
    Running,
    /// 已完成（没有下一页）
    Completed,
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CrawlState::Idle => write!(f, "idle"),
            CrawlState::Running => write!(f, "running"),
            CrawlState::Completed => write!(f, "completed"),
        }
    }
}

/// 爬取模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CrawlMode {
    /// 使用匹配到的站点规则
    #[default]
    Auto,
    /// 使用用户提供的列表选择器
    Custom,
}

/// API 模式页面失败时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApiFailurePolicy {
    /// 记录失败后继续翻页
    Skip,
    /// 按重试次数重试，仍失败则继续翻页
    #[default]
    Retry,
    /// 结束本次会话
    Stop,
}

/// 爬取会话
///
/// 由爬取控制器独占，启动时创建，停止或完成时结束
#[derive(Debug, Clone, Default)]
pub struct CrawlSession {
    /// 会话ID，用于区分先后启动的会话
    pub id: Uuid,
    pub state: CrawlState,
    /// 当前页码，从1开始
    pub page_number: u32,
    pub total_crawled: u64,
    pub total_saved: u64,
    pub failed_pages: u32,
    pub last_error: Option<String>,
    pub rule_name: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CrawlSession {
    /// 开始新会话，重置所有计数
    pub fn begin(rule_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: CrawlState::Running,
            page_number: 1,
            rule_name: rule_name.into(),
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == CrawlState::Running
    }

    /// 当前状态快照
    pub fn status(&self) -> CrawlStatus {
        CrawlStatus {
            state: self.state,
            is_running: self.is_running(),
            page_number: self.page_number,
            total_crawled: self.total_crawled,
            total_saved: self.total_saved,
            failed_pages: self.failed_pages,
            last_error: self.last_error.clone(),
            rule_name: self.rule_name.clone(),
        }
    }
}

/// 对外暴露的会话状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlStatus {
    pub state: CrawlState,
    pub is_running: bool,
    pub page_number: u32,
    pub total_crawled: u64,
    pub total_saved: u64,
    pub failed_pages: u32,
    pub last_error: Option<String>,
    pub rule_name: String,
}

/// 进度阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlPhase {
    Started,
    Loading,
    Extracted,
    PageFailed,
    Saved,
    SaveFailed,
    Advanced,
    Completed,
    Stopped,
    Aborted,
}

/// 进度通知，每次阶段转换后发送
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlProgress {
    pub phase: CrawlPhase,
    pub status: CrawlStatus,
    pub message: String,
}
