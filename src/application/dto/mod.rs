// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据传输对象模块
///
/// 定义API请求与领域模型之间传输的数据结构
pub mod crawl_request;
pub mod tender_request;
