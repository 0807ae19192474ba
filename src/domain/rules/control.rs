// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::PageSnapshot;
use crate::utils::url_utils::{is_javascript_href, is_navigable_href, resolve_href};
use scraper::{ElementRef, Selector};
use url::Url;

/// 分页控件
///
/// 从页面快照中读取的"下一页"元素信息，不持有DOM引用
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageControl {
    /// 定位该控件的选择器
    pub selector: String,
    pub tag: String,
    /// 原始 `href` 属性
    pub href: Option<String>,
    pub disabled: bool,
    pub classes: Vec<String>,
    pub hidden: bool,
    pub text: String,
}

impl PageControl {
    /// 在快照中定位第一个匹配的控件
    pub fn locate(snapshot: &PageSnapshot, selector: &str) -> Option<Self> {
        let parsed = Selector::parse(selector).ok()?;
        let document = snapshot.document();
        let element = document.select(&parsed).next()?;
        Some(Self::from_element(element, selector))
    }

    fn from_element(element: ElementRef<'_>, selector: &str) -> Self {
        let value = element.value();
        let classes: Vec<String> = value.classes().map(str::to_string).collect();
        let disabled = value.attr("disabled").is_some()
            || value
                .attr("aria-disabled")
                .is_some_and(|v| v.eq_ignore_ascii_case("true"))
            || classes.iter().any(|c| c == "disabled" || c == "is-disabled");

        Self {
            selector: selector.to_string(),
            tag: value.name().to_string(),
            href: value.attr("href").map(str::to_string),
            disabled,
            classes,
            hidden: value.attr("hidden").is_some() || style_hides(value.attr("style")),
            text: element.text().collect::<String>().trim().to_string(),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn is_javascript_link(&self) -> bool {
        self.href.as_deref().is_some_and(is_javascript_href)
    }

    /// 可以直接导航的目标地址
    ///
    /// 仅当控件带有普通链接、且解析后的地址与当前地址不同时返回
    pub fn navigation_target(&self, current_url: &str) -> Option<String> {
        let href = self.href.as_deref().filter(|h| is_navigable_href(h))?;
        let base = Url::parse(current_url).ok()?;
        let target = resolve_href(&base, href)?;
        let is_http = target.starts_with("http://") || target.starts_with("https://");
        (is_http && target != current_url).then_some(target)
    }
}

/// 行内样式是否使元素不可见
fn style_hides(style: Option<&str>) -> bool {
    let Some(style) = style else {
        return false;
    };
    let mut width_zero = false;
    let mut height_zero = false;
    for declaration in style.split(';') {
        let Some((name, value)) = declaration.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim().to_ascii_lowercase();
        match name.as_str() {
            "display" if value == "none" => return true,
            "visibility" if value == "hidden" => return true,
            "width" => width_zero = is_zero_length(&value),
            "height" => height_zero = is_zero_length(&value),
            _ => {}
        }
    }
    width_zero && height_zero
}

fn is_zero_length(value: &str) -> bool {
    value
        .trim_end_matches("px")
        .trim()
        .parse::<f64>()
        .is_ok_and(|v| v == 0.0)
}

/// 点击前记录的导航基准
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavigationMark {
    pub url: String,
    /// 第一个列表项的文本，没有列表项时为空
    pub first_item_text: String,
}

impl NavigationMark {
    pub fn capture(snapshot: &PageSnapshot, list_selector: &str) -> Self {
        Self {
            url: snapshot.url.clone(),
            first_item_text: snapshot.first_text(list_selector).unwrap_or_default(),
        }
    }
}

/// 导航检测结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// 地址发生变化
    UrlChanged,
    /// 第一个列表项的内容发生变化
    ContentChanged,
    /// 列表项持续存在超过稳定阈值
    Settled,
    /// 达到轮询上限
    TimedOut,
}
