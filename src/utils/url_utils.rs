// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 判断链接是否为 `javascript:` 伪协议
pub fn is_javascript_href(href: &str) -> bool {
    href.trim().to_ascii_lowercase().starts_with("javascript:")
}

/// 解析列表项中的链接
///
/// 空链接和 `javascript:` 链接返回 `None`，其余相对链接按页面地址解析为绝对地址
pub fn resolve_href(base_url: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || is_javascript_href(href) {
        return None;
    }
    resolve_url(base_url, href).ok().map(String::from)
}

/// 判断链接是否会触发真正的导航
///
/// 空链接、页内锚点和 `javascript:` 链接都不会离开当前文档
pub fn is_navigable_href(href: &str) -> bool {
    let href = href.trim();
    !href.is_empty() && !href.starts_with('#') && !is_javascript_href(href)
}
