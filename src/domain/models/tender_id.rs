// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 招标ID生成
//!
//! 所有函数都是纯函数：不读取时间、不使用随机数。

use sha2::{Digest, Sha256};

/// 存储端主键宽度
pub const MAX_TENDER_ID_LEN: usize = 50;

const SCHEMES: [&str; 2] = ["https://", "http://"];

/// 根据规范URL生成ID
///
/// 去掉协议、已知主机前缀（或 `www.`）、`.html`/`.htm` 扩展名，
/// 并把路径分隔符和查询符号替换为 `_`
pub fn from_url(url: &str, host_prefixes: &[&str]) -> String {
    let mut rest = url.trim();
    for scheme in SCHEMES {
        if let Some(stripped) = rest.strip_prefix(scheme) {
            rest = stripped;
            break;
        }
    }

    match host_prefixes
        .iter()
        .find_map(|prefix| rest.strip_prefix(prefix))
    {
        Some(stripped) => rest = stripped,
        None => {
            if let Some(stripped) = rest.strip_prefix("www.") {
                rest = stripped;
            }
        }
    }

    let without_ext = if rest.contains(".html") {
        rest.replacen(".html", "", 1)
    } else {
        rest.replacen(".htm", "", 1)
    };

    without_ext
        .chars()
        .map(|c| match c {
            '/' | '?' | '=' => '_',
            other => other,
        })
        .collect()
}

/// ID 非空且不超过主键宽度
pub fn fits_key(id: &str) -> bool {
    !id.is_empty() && id.chars().count() <= MAX_TENDER_ID_LEN
}

/// 没有可用标识时的回退ID：`url + title` 的稳定哈希
pub fn fallback(url: &str, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update([0x1f]);
    hasher.update(title.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("h_{}", &digest[..32])
}

/// 生成招标ID
///
/// URL 可用时优先使用 [`from_url`]，否则（或结果超出主键宽度时）回退到 [`fallback`]
pub fn generate(url: &str, title: &str, host_prefixes: &[&str]) -> String {
    let trimmed = url.trim();
    if SCHEMES.iter().any(|scheme| trimmed.starts_with(scheme)) {
        let id = from_url(trimmed, host_prefixes);
        if fits_key(&id) {
            return id;
        }
    }
    fallback(trimmed, title.trim())
}
