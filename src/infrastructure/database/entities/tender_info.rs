// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tender_info")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub tender_id: String,
    pub flag: i32,
    pub title: String,
    pub release_time: Option<String>,
    pub url: String,
    pub province_name: String,
    pub district_name: String,
    pub project_purchase_way: String,
    pub open_tender_code: String,
    pub budget: String,
    pub project_directory_name: String,
    pub buyer_name: String,
    pub agent_name: String,
    pub affiche_type: String,
    pub expire_time: Option<String>,
    pub crawled_at: ChronoDateTimeWithTimeZone,
    pub create_time: ChronoDateTimeWithTimeZone,
    pub update_time: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
