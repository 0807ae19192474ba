// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::tender::TenderRecord;
use crate::domain::services::record_sink::{RecordSink, SinkError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// 带后备的存储端
///
/// 主存储端失败时整批改写到后备存储端，两者都失败时返回后备的错误
pub struct FallbackRecordSink {
    primary: Arc<dyn RecordSink>,
    fallback: Arc<dyn RecordSink>,
    name: String,
}

impl FallbackRecordSink {
    /// 创建带后备的存储端
    ///
    /// # 参数
    ///
    /// * `primary` - 主存储端
    /// * `fallback` - 后备存储端
    pub fn new(primary: Arc<dyn RecordSink>, fallback: Arc<dyn RecordSink>) -> Self {
        let name = format!("{}+{}", primary.name(), fallback.name());
        Self {
            primary,
            fallback,
            name,
        }
    }
}

#[async_trait]
impl RecordSink for FallbackRecordSink {
    async fn save_records(&self, records: &[TenderRecord]) -> Result<usize, SinkError> {
        if records.is_empty() {
            return Ok(0);
        }

        match self.primary.save_records(records).await {
            Ok(count) => Ok(count),
            Err(e) => {
                warn!(
                    "Sink {} failed, falling back to {}: {}",
                    self.primary.name(),
                    self.fallback.name(),
                    e
                );
                metrics::counter!("tender_sink_fallbacks_total").increment(1);
                self.fallback.save_records(records).await
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
