// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::tender::TenderRecord;
use serde::{Deserialize, Serialize};

/// 批量保存请求体
///
/// 接受 `{"items": [...]}` 或直接的数组
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SaveBatchRequest {
    Wrapped { items: Vec<TenderRecord> },
    Bare(Vec<TenderRecord>),
}

impl SaveBatchRequest {
    pub fn into_items(self) -> Vec<TenderRecord> {
        match self {
            SaveBatchRequest::Wrapped { items } => items,
            SaveBatchRequest::Bare(items) => items,
        }
    }
}

/// 更新标志请求体
#[derive(Debug, Deserialize)]
pub struct UpdateFlagRequest {
    pub flag: i32,
}

/// 计数查询参数
#[derive(Debug, Deserialize)]
pub struct CountQuery {
    pub flag: Option<i32>,
}

/// 保存结果
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    pub count: usize,
}
