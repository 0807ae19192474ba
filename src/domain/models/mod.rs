// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// - 招标记录（tender）与ID生成（tender_id）
/// - 爬取会话与进度（session）
/// - 页面等待参数（timing）
pub mod session;
pub mod tender;
pub mod tender_id;
pub mod timing;
