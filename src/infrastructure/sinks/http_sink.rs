// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::tender::TenderRecord;
use crate::domain::services::record_sink::{RecordSink, SinkError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// 后端批量保存接口的响应
#[derive(Debug, Deserialize)]
struct SaveBatchResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    count: Option<usize>,
    #[serde(default)]
    message: Option<String>,
}

/// 远程后端存储端
///
/// 将记录批量提交到 `{api_url}/saveBatch`
pub struct HttpRecordSink {
    /// HTTP 客户端
    client: reqwest::Client,
    /// 后端接口地址
    api_url: String,
}

impl HttpRecordSink {
    /// 创建新的远程存储端
    ///
    /// # 参数
    ///
    /// * `api_url` - 后端接口地址，不含 `/saveBatch`
    /// * `timeout` - 单次请求超时
    ///
    /// # 返回值
    ///
    /// * `Err(SinkError::Transport)` - HTTP 客户端无法创建
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SinkError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/saveBatch", self.api_url)
    }
}

#[async_trait]
impl RecordSink for HttpRecordSink {
    async fn save_records(&self, records: &[TenderRecord]) -> Result<usize, SinkError> {
        if records.is_empty() {
            return Ok(0);
        }

        let response = self
            .client
            .post(self.endpoint())
            .json(&json!({ "items": records }))
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(SinkError::Rejected(format!(
                "backend returned status {}: {}",
                status, body
            )));
        }

        let parsed: SaveBatchResponse = serde_json::from_str(&body)
            .map_err(|e| SinkError::Rejected(format!("unreadable response: {}", e)))?;
        if !parsed.success {
            return Err(SinkError::Rejected(
                parsed
                    .message
                    .unwrap_or_else(|| "backend reported failure".to_string()),
            ));
        }

        let count = parsed.count.unwrap_or(records.len());
        debug!("Backend accepted {} records", count);
        Ok(count)
    }

    fn name(&self) -> &str {
        "http"
    }
}
