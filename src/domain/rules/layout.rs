// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 位置式字段布局
//!
//! 部分列表页把多个字段挤在同一段文本里，只能按分隔后的位置取值。
//! 这种约定来自对具体页面的观察，因此每条规则都以一张显式的表来声明它。

use crate::domain::models::tender::{TenderField, TenderRecord};

/// 文本分隔方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// 按换行分隔，保留空白段（位置与原始行号一一对应）
    Newline,
    /// 按 `|` 分隔，丢弃空白段
    Pipe,
    /// 按换行或 `|` 分隔，丢弃空白段
    NewlineOrPipe,
}

impl Delimiter {
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        match self {
            Delimiter::Newline => text.split('\n').collect(),
            Delimiter::Pipe => text
                .split('|')
                .filter(|segment| !segment.trim().is_empty())
                .collect(),
            Delimiter::NewlineOrPipe => text
                .split(&['\n', '|'][..])
                .filter(|segment| !segment.trim().is_empty())
                .collect(),
        }
    }
}

/// 位置 -> 字段映射项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSlot {
    pub index: usize,
    pub field: TenderField,
    /// 需要从值中移除的标签，例如 `采购人：`
    pub strip_label: Option<&'static str>,
}

impl LayoutSlot {
    pub const fn new(index: usize, field: TenderField) -> Self {
        Self {
            index,
            field,
            strip_label: None,
        }
    }

    pub const fn labelled(index: usize, field: TenderField, label: &'static str) -> Self {
        Self {
            index,
            field,
            strip_label: Some(label),
        }
    }
}

/// 布局解析结果
pub type LayoutFields = Vec<(TenderField, String)>;

/// 字段布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub delimiter: Delimiter,
    /// 分隔前从文本中删除的字符
    pub strip_chars: &'static [char],
    /// 分隔后的最少段数，不足时整条记录被拒绝
    pub min_segments: usize,
    pub slots: &'static [LayoutSlot],
}

impl FieldLayout {
    /// 按布局解析一段文本
    ///
    /// 段数不足 `min_segments` 时返回 `None`；位置超出实际段数的字段被跳过
    pub fn apply(&self, raw: &str) -> Option<LayoutFields> {
        let cleaned: String = raw
            .chars()
            .filter(|c| !self.strip_chars.contains(c))
            .collect();
        let segments = self.delimiter.split(&cleaned);
        if segments.len() < self.min_segments {
            return None;
        }

        let fields = self
            .slots
            .iter()
            .filter_map(|slot| {
                let segment = segments.get(slot.index)?.trim();
                let value = match slot.strip_label {
                    Some(label) => segment.replace(label, "").trim().to_string(),
                    None => segment.to_string(),
                };
                Some((slot.field, value))
            })
            .collect();
        Some(fields)
    }

    /// 解析并写入记录，返回是否满足布局要求
    pub fn fill(&self, raw: &str, record: &mut TenderRecord) -> bool {
        match self.apply(raw) {
            Some(fields) => {
                for (field, value) in fields {
                    record.set_field(field, value);
                }
                true
            }
            None => false,
        }
    }
}
