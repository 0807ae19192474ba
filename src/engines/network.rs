// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// 网络错误类型
#[derive(Error, Debug)]
pub enum NetworkError {
    /// 请求失败
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// 非成功状态码
    #[error("Unexpected status: {0}")]
    Status(u16),
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

/// 页面发起的一次HTTP请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpExchange {
    pub method: String,
    pub url: String,
    /// 请求头，键统一为小写
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

impl HttpExchange {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// 以 JSON 请求体构造 POST 请求
    pub fn post_json(url: impl Into<String>, body: &serde_json::Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert(
            "content-type".to_string(),
            "application/json;charset=UTF-8".to_string(),
        );
        Self {
            method: "POST".to_string(),
            url: url.into(),
            headers,
            body: Some(body.to_string()),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_json_post(&self) -> bool {
        self.method.eq_ignore_ascii_case("POST")
            && self
                .header("content-type")
                .is_some_and(|v| v.contains("application/json"))
    }
}

/// HTTP响应
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpReply {
    pub status: u16,
    /// 响应头，键统一为小写
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpReply {
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self {
            status,
            headers,
            body: body.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 非2xx状态码转换为错误
    pub fn error_for_status(self) -> Result<Self, NetworkError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(NetworkError::Status(self.status))
        }
    }

    pub fn is_json(&self) -> bool {
        self.headers
            .get("content-type")
            .is_some_and(|v| v.contains("application/json"))
    }
}

/// 页面可用的两种HTTP原语
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// 回调式请求对象
    Xhr,
    /// Promise 式调用
    Fetch,
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Primitive::Xhr => write!(f, "xhr"),
            Primitive::Fetch => write!(f, "fetch"),
        }
    }
}

/// HTTP原语特质
#[async_trait]
pub trait HttpPrimitive: Send + Sync {
    async fn send(&self, request: HttpExchange) -> Result<HttpReply, NetworkError>;
}

/// 基于reqwest的HTTP原语
pub struct ReqwestPrimitive {
    client: reqwest::Client,
}

impl ReqwestPrimitive {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// 使用指定超时创建
    pub fn with_timeout(timeout: Duration) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpPrimitive for ReqwestPrimitive {
    async fn send(&self, request: HttpExchange) -> Result<HttpReply, NetworkError> {
        let method = reqwest::Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| NetworkError::Other(format!("method {}: {}", request.method, e)))?;

        let mut headers = HeaderMap::new();
        for (k, v) in &request.headers {
            if let (Ok(k), Ok(v)) = (
                HeaderName::from_bytes(k.as_bytes()),
                HeaderValue::from_str(v),
            ) {
                headers.insert(k, v);
            }
        }

        let mut builder = self.client.request(method, &request.url).headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let response = builder.send().await?;

        let status = response.status().as_u16();
        let mut response_headers = HashMap::new();
        for (k, v) in response.headers() {
            if let Ok(v_str) = v.to_str() {
                response_headers.insert(k.as_str().to_ascii_lowercase(), v_str.to_string());
            }
        }
        let body = response.text().await?;

        Ok(HttpReply {
            status,
            headers: response_headers,
            body,
        })
    }
}

/// 页面网络环境
///
/// 持有页面的两个HTTP原语。拦截器在拦截窗口内替换它们，窗口结束时恢复原值
pub struct NetworkEnvironment {
    xhr: RwLock<Arc<dyn HttpPrimitive>>,
    fetch: RwLock<Arc<dyn HttpPrimitive>>,
    intercepting: AtomicBool,
}

impl NetworkEnvironment {
    pub fn new(xhr: Arc<dyn HttpPrimitive>, fetch: Arc<dyn HttpPrimitive>) -> Self {
        Self {
            xhr: RwLock::new(xhr),
            fetch: RwLock::new(fetch),
            intercepting: AtomicBool::new(false),
        }
    }

    /// 两个槽位共用同一个原语
    pub fn shared(primitive: Arc<dyn HttpPrimitive>) -> Self {
        Self::new(primitive.clone(), primitive)
    }

    fn slot(&self, primitive: Primitive) -> &RwLock<Arc<dyn HttpPrimitive>> {
        match primitive {
            Primitive::Xhr => &self.xhr,
            Primitive::Fetch => &self.fetch,
        }
    }

    /// 当前安装的原语
    pub fn get(&self, primitive: Primitive) -> Arc<dyn HttpPrimitive> {
        self.slot(primitive).read().clone()
    }

    /// 替换原语，返回被替换的旧值
    pub fn replace(
        &self,
        primitive: Primitive,
        replacement: Arc<dyn HttpPrimitive>,
    ) -> Arc<dyn HttpPrimitive> {
        std::mem::replace(&mut *self.slot(primitive).write(), replacement)
    }

    /// 通过指定原语发送请求
    pub async fn send(
        &self,
        primitive: Primitive,
        request: HttpExchange,
    ) -> Result<HttpReply, NetworkError> {
        let handler = self.get(primitive);
        handler.send(request).await
    }

    /// 尝试独占拦截窗口
    pub(crate) fn try_begin_interception(&self) -> bool {
        self.intercepting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn end_interception(&self) {
        self.intercepting.store(false, Ordering::Release);
    }

    pub fn is_intercepting(&self) -> bool {
        self.intercepting.load(Ordering::Acquire)
    }
}
