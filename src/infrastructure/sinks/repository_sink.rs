// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::tender::TenderRecord;
use crate::domain::repositories::tender_repository::TenderRepository;
use crate::domain::services::record_sink::{RecordSink, SinkError};
use async_trait::async_trait;
use std::sync::Arc;

/// 本地数据库存储端
pub struct RepositoryRecordSink {
    repository: Arc<dyn TenderRepository>,
}

impl RepositoryRecordSink {
    pub fn new(repository: Arc<dyn TenderRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl RecordSink for RepositoryRecordSink {
    async fn save_records(&self, records: &[TenderRecord]) -> Result<usize, SinkError> {
        if records.is_empty() {
            return Ok(0);
        }
        Ok(self.repository.upsert_batch(records).await?)
    }

    fn name(&self) -> &str {
        "local"
    }
}
