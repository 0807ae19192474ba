// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 招标信息记录
///
/// 所有站点规则抽取的结果都会归一化为这一结构，字段名与后端接口保持一致（camelCase）。
/// `tender_id` 是去重键，对同一来源URL/标题总是生成相同的值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenderRecord {
    /// 唯一ID
    pub tender_id: String,
    /// 标题
    pub title: String,
    /// 详情URL（兼容旧规则输出的 `link` 字段）
    #[serde(alias = "link")]
    pub url: String,
    /// 发布时间
    pub release_time: Option<String>,
    /// 采购人
    pub buyer_name: String,
    /// 代理机构
    pub agent_name: String,
    /// 省份
    pub province_name: String,
    /// 区县
    pub district_name: String,
    /// 公告类型
    pub affiche_type: String,
    /// 项目目录名称
    pub project_directory_name: String,
    /// 招标方式
    pub project_purchase_way: String,
    /// 项目编号
    pub open_tender_code: String,
    /// 预算金额
    pub budget: String,
    /// 截止时间
    pub expire_time: Option<String>,
    /// 下游流程标志
    pub flag: i32,
    /// 抓取时间
    pub crawled_at: DateTime<Utc>,
}

impl Default for TenderRecord {
    fn default() -> Self {
        Self {
            tender_id: String::new(),
            title: String::new(),
            url: String::new(),
            release_time: None,
            buyer_name: String::new(),
            agent_name: String::new(),
            province_name: String::new(),
            district_name: String::new(),
            affiche_type: String::new(),
            project_directory_name: String::new(),
            project_purchase_way: String::new(),
            open_tender_code: String::new(),
            budget: String::new(),
            expire_time: None,
            flag: 0,
            crawled_at: Utc::now(),
        }
    }
}

/// 记录中可按名称写入的字段
///
/// 站点规则的位置表和JSON候选键表都以它为目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TenderField {
    Title,
    Url,
    ReleaseTime,
    BuyerName,
    AgentName,
    ProvinceName,
    DistrictName,
    AfficheType,
    ProjectDirectoryName,
    ProjectPurchaseWay,
    OpenTenderCode,
    Budget,
    ExpireTime,
}

impl TenderRecord {
    /// 创建仅包含ID、标题和链接的记录，其余字段为空
    pub fn new(
        tender_id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            tender_id: tender_id.into(),
            title: title.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// 标题和链接同时为空的记录无效，不得转发给存储端
    pub fn is_valid(&self) -> bool {
        !(self.title.trim().is_empty() && self.url.trim().is_empty())
    }

    /// 写入单个字段
    ///
    /// 可为空的时间字段在值为空串时保持 `None`
    pub fn set_field(&mut self, field: TenderField, value: impl Into<String>) {
        let value = value.into();
        match field {
            TenderField::Title => self.title = value,
            TenderField::Url => self.url = value,
            TenderField::ReleaseTime => self.release_time = non_empty(value),
            TenderField::BuyerName => self.buyer_name = value,
            TenderField::AgentName => self.agent_name = value,
            TenderField::ProvinceName => self.province_name = value,
            TenderField::DistrictName => self.district_name = value,
            TenderField::AfficheType => self.affiche_type = value,
            TenderField::ProjectDirectoryName => self.project_directory_name = value,
            TenderField::ProjectPurchaseWay => self.project_purchase_way = value,
            TenderField::OpenTenderCode => self.open_tender_code = value,
            TenderField::Budget => self.budget = value,
            TenderField::ExpireTime => self.expire_time = non_empty(value),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
