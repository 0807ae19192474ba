// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 爬取控制器（crawl_controller）：持有爬取会话并驱动逐页循环
/// - 记录存储端（record_sink）：每页记录的持久化接口
pub mod crawl_controller;
pub mod record_sink;
