// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含系统的技术实现细节，依赖领域层的抽象接口。
///
/// 包含的子模块：
/// - 数据库（database）：连接、迁移和实体映射
/// - 指标（metrics）：Prometheus 导出器
/// - 仓库实现（repositories）：领域仓库接口的数据库实现
/// - 存储端（sinks）：记录存储端的远程、本地和后备实现
pub mod database;
pub mod metrics;
pub mod repositories;
pub mod sinks;
