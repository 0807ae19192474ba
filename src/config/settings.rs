// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::session::ApiFailurePolicy;
use crate::domain::models::timing::CrawlTiming;
use crate::domain::services::crawl_controller::ControllerOptions;
use crate::engines::http_page::{HttpPageConfig, DEFAULT_USER_AGENT};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含数据库、服务器、存储端、爬取参数和日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 服务器配置
    pub server: ServerSettings,
    /// 记录存储端配置
    pub sink: SinkSettings,
    /// 爬取参数
    pub crawl: CrawlSettings,
    /// 日志配置
    pub log: LogSettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
    /// Prometheus 导出器端口
    pub metrics_port: u16,
}

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// 远程后端接口
    Http,
    /// 本地数据库
    Local,
    /// 优先远程接口，失败时写入本地数据库
    HttpWithLocalFallback,
}

/// 记录存储端配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SinkSettings {
    /// 后端接口地址，批量保存请求发往 `{api_url}/saveBatch`
    pub api_url: String,
    pub storage_backend: StorageBackend,
    /// 请求超时（秒）
    pub request_timeout_secs: u64,
}

/// 爬取参数设置
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlSettings {
    /// 翻页间隔（毫秒）
    pub delay_ms: u64,
    pub poll_interval_ms: u64,
    pub max_polls: u32,
    pub settle_polls: u32,
    pub settle_delay_ms: u64,
    pub load_timeout_ms: u64,
    pub link_grace_ms: u64,
    pub click_grace_ms: u64,
    pub pointer_step_ms: u64,
    pub intercept_timeout_ms: u64,
    pub api_failure_policy: ApiFailurePolicy,
    pub api_retry_limit: u32,
    /// 最多爬取的页数，0 表示不限
    pub max_pages: u32,
    pub user_agent: String,
    /// 页面请求超时（秒）
    pub page_timeout_secs: u64,
}

impl CrawlSettings {
    /// 转换为等待参数
    pub fn timing(&self) -> CrawlTiming {
        CrawlTiming {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_polls: self.max_polls,
            settle_polls: self.settle_polls,
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            load_timeout: Duration::from_millis(self.load_timeout_ms),
            link_grace: Duration::from_millis(self.link_grace_ms),
            click_grace: Duration::from_millis(self.click_grace_ms),
            pointer_step: Duration::from_millis(self.pointer_step_ms),
            intercept_timeout: Duration::from_millis(self.intercept_timeout_ms),
        }
    }

    /// 转换为控制器参数
    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            timing: self.timing(),
            api_failure_policy: self.api_failure_policy,
            api_retry_limit: self.api_retry_limit,
            max_pages: (self.max_pages > 0).then_some(self.max_pages),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// 转换为页面驱动配置
    pub fn page_config(&self) -> HttpPageConfig {
        HttpPageConfig {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.page_timeout_secs),
        }
    }
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub format: LogFormat,
    /// `EnvFilter` 指令，`RUST_LOG` 存在时被覆盖
    pub filter: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加内置默认值、`config/default`、`config/{APP_ENVIRONMENT}`
    /// 和 `PAGE_SPIDER__` 前缀的环境变量。只在会话开始时读取一次
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("PAGE_SPIDER").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 仅包含内置默认值的配置
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder()?.build()?.try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let timing = CrawlTiming::default();
        Config::builder()
            // Server
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.metrics_port", 9000)?
            // Database
            .set_default("database.url", "sqlite://page_spider.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Sink
            .set_default("sink.api_url", "http://localhost:3000/api/tender")?
            .set_default("sink.storage_backend", "http")?
            .set_default("sink.request_timeout_secs", 30)?
            // Crawl
            .set_default("crawl.delay_ms", 2000)?
            .set_default("crawl.poll_interval_ms", millis(timing.poll_interval))?
            .set_default("crawl.max_polls", timing.max_polls)?
            .set_default("crawl.settle_polls", timing.settle_polls)?
            .set_default("crawl.settle_delay_ms", millis(timing.settle_delay))?
            .set_default("crawl.load_timeout_ms", millis(timing.load_timeout))?
            .set_default("crawl.link_grace_ms", millis(timing.link_grace))?
            .set_default("crawl.click_grace_ms", millis(timing.click_grace))?
            .set_default("crawl.pointer_step_ms", millis(timing.pointer_step))?
            .set_default("crawl.intercept_timeout_ms", millis(timing.intercept_timeout))?
            .set_default("crawl.api_failure_policy", "retry")?
            .set_default("crawl.api_retry_limit", 1)?
            .set_default("crawl.max_pages", 0)?
            .set_default("crawl.user_agent", DEFAULT_USER_AGENT)?
            .set_default("crawl.page_timeout_secs", 30)?
            // Log
            .set_default("log.format", "pretty")?
            .set_default("log.filter", "info,page_spider=debug")
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
