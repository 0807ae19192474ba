// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::url_utils::resolve_href;
use scraper::{ElementRef, Selector};
use url::Url;

/// 元素内第一个匹配的后代
pub fn select_first<'a>(element: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    element.select(&selector).next()
}

/// 元素的文本内容，去除首尾空白
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// 链接元素的绝对地址
pub fn link_of(anchor: ElementRef<'_>, page_url: &Url) -> Option<String> {
    resolve_href(page_url, anchor.value().attr("href")?)
}
