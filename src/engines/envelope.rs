// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::Value;

/// 常见的响应包装路径，按优先级排列
const ENVELOPE_PATHS: &[&[&str]] = &[
    &["data"],
    &["data", "list"],
    &["data", "records"],
    &["data", "data"],
    &["data", "rows"],
    &["result", "rows"],
    &["result", "data"],
    &["result", "list"],
    &[],
    &["records"],
    &["list"],
    &["rows"],
];

/// 在API响应体中定位记录数组
///
/// 依次探测常见的包装形态，返回第一个数组；都不匹配时返回空列表
pub fn locate_records(body: &Value) -> Vec<Value> {
    ENVELOPE_PATHS
        .iter()
        .find_map(|path| {
            path.iter()
                .try_fold(body, |node, key| node.get(key))
                .and_then(Value::as_array)
        })
        .cloned()
        .unwrap_or_default()
}
