// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP请求处理器模块
///
/// 每个处理器负责一类API请求
pub mod crawl_handler;
pub mod tender_handler;
