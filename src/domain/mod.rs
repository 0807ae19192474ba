// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：招标记录、爬取会话和等待参数
/// - 仓库接口（repositories）：招标记录的持久化抽象
/// - 站点规则（rules）：各站点列表页的匹配、抽取和翻页方式
/// - 服务（services）：爬取控制器与记录存储端
pub mod models;
pub mod repositories;
pub mod rules;
pub mod services;
