// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含请求数据结构和用例实现，将表示层与领域服务连接起来
pub mod dto;
pub mod use_cases;
