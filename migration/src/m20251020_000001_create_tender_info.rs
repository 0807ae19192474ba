// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 创建政府采购信息表
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TenderInfo::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TenderInfo::TenderId)
                            .string_len(50)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TenderInfo::Flag).integer().not_null().default(0))
                    .col(ColumnDef::new(TenderInfo::Title).string_len(200).not_null().default(""))
                    .col(ColumnDef::new(TenderInfo::ReleaseTime).string_len(32))
                    .col(ColumnDef::new(TenderInfo::Url).string_len(500).not_null().default(""))
                    .col(ColumnDef::new(TenderInfo::ProvinceName).string_len(20).not_null().default(""))
                    .col(ColumnDef::new(TenderInfo::DistrictName).string_len(20).not_null().default(""))
                    .col(
                        ColumnDef::new(TenderInfo::ProjectPurchaseWay)
                            .string_len(20)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(TenderInfo::OpenTenderCode).string().not_null().default(""))
                    .col(ColumnDef::new(TenderInfo::Budget).string().not_null().default(""))
                    .col(
                        ColumnDef::new(TenderInfo::ProjectDirectoryName)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(TenderInfo::BuyerName).string_len(100).not_null().default(""))
                    .col(ColumnDef::new(TenderInfo::AgentName).string_len(100).not_null().default(""))
                    .col(ColumnDef::new(TenderInfo::AfficheType).string().not_null().default(""))
                    .col(ColumnDef::new(TenderInfo::ExpireTime).string_len(32))
                    .col(
                        ColumnDef::new(TenderInfo::CrawledAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(TenderInfo::CreateTime)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(TenderInfo::UpdateTime)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("index_title")
                    .table(TenderInfo::Table)
                    .col(TenderInfo::Title)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("index_release_time")
                    .table(TenderInfo::Table)
                    .col(TenderInfo::ReleaseTime)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TenderInfo::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TenderInfo {
    Table,
    TenderId,
    Flag,
    Title,
    ReleaseTime,
    Url,
    ProvinceName,
    DistrictName,
    ProjectPurchaseWay,
    OpenTenderCode,
    Budget,
    ProjectDirectoryName,
    BuyerName,
    AgentName,
    AfficheType,
    ExpireTime,
    CrawledAt,
    CreateTime,
    UpdateTime,
}
