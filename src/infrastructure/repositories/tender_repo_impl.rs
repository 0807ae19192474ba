// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::tender::TenderRecord;
use crate::domain::repositories::tender_repository::{RepositoryError, TenderRepository};
use crate::infrastructure::database::entities::tender_info as tender_entity;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::entity::prelude::ChronoDateTimeWithTimeZone;
use sea_orm::{sea_query::Expr, sea_query::OnConflict, *};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 各文本列的宽度
const TITLE_WIDTH: usize = 200;
const URL_WIDTH: usize = 500;
const SHORT_WIDTH: usize = 20;
const NAME_WIDTH: usize = 100;
const TIME_WIDTH: usize = 32;

/// 招标信息仓库实现
pub struct TenderRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl TenderRepositoryImpl {
    /// 创建新的招标信息仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

/// 按字符截断到列宽
fn clip(value: &str, width: usize) -> String {
    value.chars().take(width).collect()
}

fn to_active_model(
    record: &TenderRecord,
    now: ChronoDateTimeWithTimeZone,
) -> tender_entity::ActiveModel {
    tender_entity::ActiveModel {
        tender_id: Set(record.tender_id.clone()),
        flag: Set(record.flag),
        title: Set(clip(&record.title, TITLE_WIDTH)),
        release_time: Set(record.release_time.as_deref().map(|t| clip(t, TIME_WIDTH))),
        url: Set(clip(&record.url, URL_WIDTH)),
        province_name: Set(clip(&record.province_name, SHORT_WIDTH)),
        district_name: Set(clip(&record.district_name, SHORT_WIDTH)),
        project_purchase_way: Set(clip(&record.project_purchase_way, SHORT_WIDTH)),
        open_tender_code: Set(record.open_tender_code.clone()),
        budget: Set(record.budget.clone()),
        project_directory_name: Set(record.project_directory_name.clone()),
        buyer_name: Set(clip(&record.buyer_name, NAME_WIDTH)),
        agent_name: Set(clip(&record.agent_name, NAME_WIDTH)),
        affiche_type: Set(record.affiche_type.clone()),
        expire_time: Set(record.expire_time.as_deref().map(|t| clip(t, TIME_WIDTH))),
        crawled_at: Set(record.crawled_at.into()),
        create_time: Set(now),
        update_time: Set(now),
    }
}

impl From<tender_entity::Model> for TenderRecord {
    fn from(m: tender_entity::Model) -> Self {
        Self {
            tender_id: m.tender_id,
            title: m.title,
            url: m.url,
            release_time: m.release_time,
            buyer_name: m.buyer_name,
            agent_name: m.agent_name,
            province_name: m.province_name,
            district_name: m.district_name,
            affiche_type: m.affiche_type,
            project_directory_name: m.project_directory_name,
            project_purchase_way: m.project_purchase_way,
            open_tender_code: m.open_tender_code,
            budget: m.budget,
            expire_time: m.expire_time,
            flag: m.flag,
            crawled_at: m.crawled_at.into(),
        }
    }
}

/// 批内按ID去重，保留最后一条，顺序按首次出现
fn dedupe(records: &[TenderRecord]) -> Vec<&TenderRecord> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut unique: Vec<&TenderRecord> = Vec::with_capacity(records.len());
    for record in records {
        match positions.get(record.tender_id.as_str()) {
            Some(&index) => unique[index] = record,
            None => {
                positions.insert(record.tender_id.as_str(), unique.len());
                unique.push(record);
            }
        }
    }
    unique
}

#[async_trait]
impl TenderRepository for TenderRepositoryImpl {
    async fn upsert_batch(&self, records: &[TenderRecord]) -> Result<usize, RepositoryError> {
        let unique = dedupe(records);
        if unique.is_empty() {
            return Ok(0);
        }

        let now: ChronoDateTimeWithTimeZone = Utc::now().into();
        let models: Vec<tender_entity::ActiveModel> = unique
            .iter()
            .map(|record| to_active_model(record, now))
            .collect();
        let count = models.len();

        // 重复写入时保留创建时间和下游标志
        let on_conflict = OnConflict::column(tender_entity::Column::TenderId)
            .update_columns([
                tender_entity::Column::Title,
                tender_entity::Column::ReleaseTime,
                tender_entity::Column::Url,
                tender_entity::Column::ProvinceName,
                tender_entity::Column::DistrictName,
                tender_entity::Column::ProjectPurchaseWay,
                tender_entity::Column::OpenTenderCode,
                tender_entity::Column::Budget,
                tender_entity::Column::ProjectDirectoryName,
                tender_entity::Column::BuyerName,
                tender_entity::Column::AgentName,
                tender_entity::Column::AfficheType,
                tender_entity::Column::ExpireTime,
                tender_entity::Column::CrawledAt,
                tender_entity::Column::UpdateTime,
            ])
            .to_owned();

        tender_entity::Entity::insert_many(models)
            .on_conflict(on_conflict)
            .exec_without_returning(self.db.as_ref())
            .await?;

        debug!("Upserted {} tender records", count);
        Ok(count)
    }

    async fn find_all(&self) -> Result<Vec<TenderRecord>, RepositoryError> {
        let models = tender_entity::Entity::find()
            .order_by_desc(tender_entity::Column::ReleaseTime)
            .order_by_desc(tender_entity::Column::CreateTime)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_by_tender_id(
        &self,
        tender_id: &str,
    ) -> Result<Option<TenderRecord>, RepositoryError> {
        let model = tender_entity::Entity::find_by_id(tender_id.to_string())
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_open_tender_code(
        &self,
        code: &str,
    ) -> Result<Vec<TenderRecord>, RepositoryError> {
        let models = tender_entity::Entity::find()
            .filter(tender_entity::Column::OpenTenderCode.eq(code))
            .order_by_desc(tender_entity::Column::ReleaseTime)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_by_flag(&self, flag: i32) -> Result<Vec<TenderRecord>, RepositoryError> {
        let models = tender_entity::Entity::find()
            .filter(tender_entity::Column::Flag.eq(flag))
            .order_by_desc(tender_entity::Column::ReleaseTime)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update_flag(&self, tender_id: &str, flag: i32) -> Result<(), RepositoryError> {
        let now: ChronoDateTimeWithTimeZone = Utc::now().into();
        let result = tender_entity::Entity::update_many()
            .col_expr(tender_entity::Column::Flag, Expr::value(flag))
            .col_expr(tender_entity::Column::UpdateTime, Expr::value(now))
            .filter(tender_entity::Column::TenderId.eq(tender_id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn count(&self, flag: Option<i32>) -> Result<u64, RepositoryError> {
        let mut query = tender_entity::Entity::find();
        if let Some(flag) = flag {
            query = query.filter(tender_entity::Column::Flag.eq(flag));
        }
        Ok(query.count(self.db.as_ref()).await?)
    }

    async fn clear(&self) -> Result<u64, RepositoryError> {
        let result = tender_entity::Entity::delete_many()
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}
