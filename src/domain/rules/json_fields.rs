// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::tender::{TenderField, TenderRecord};
use serde_json::Value;

/// JSON字段候选键表
///
/// 每个字段按顺序尝试候选键，取第一个非空值
#[derive(Debug, Clone, Copy)]
pub struct JsonFieldMap {
    pub entries: &'static [(TenderField, &'static [&'static str])],
}

impl JsonFieldMap {
    pub const fn new(entries: &'static [(TenderField, &'static [&'static str])]) -> Self {
        Self { entries }
    }

    /// 读取字段值；字符串原样返回，数字和布尔转换为文本
    pub fn pick(&self, item: &Value, field: TenderField) -> Option<String> {
        let (_, keys) = self.entries.iter().find(|(f, _)| *f == field)?;
        keys.iter().find_map(|key| scalar_text(item.get(key)?))
    }

    /// 把所有能取到的字段写入记录
    pub fn fill(&self, item: &Value, record: &mut TenderRecord) {
        for (field, _) in self.entries {
            if let Some(value) = self.pick(item, *field) {
                record.set_field(*field, value);
            }
        }
    }
}

/// 标量值的文本形式，空串和非标量返回 `None`
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
