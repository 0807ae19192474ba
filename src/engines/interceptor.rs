// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::network::{
    HttpExchange, HttpPrimitive, HttpReply, NetworkEnvironment, NetworkError, Primitive,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// 拦截错误类型
#[derive(Error, Debug)]
pub enum InterceptError {
    /// 超时内未观察到匹配的请求
    #[error("No matching request observed within {0:?}")]
    Timeout(Duration),
    /// 同一网络环境上已有拦截在进行
    #[error("An interception is already active on this page")]
    AlreadyActive,
    /// 匹配的请求失败
    #[error("Intercepted request failed: {0}")]
    Request(String),
    /// 响应体不是合法JSON
    #[error("Intercepted response is not valid JSON: {0}")]
    InvalidBody(#[from] serde_json::Error),
    /// 触发动作失败
    #[error("Trigger action failed: {0}")]
    Trigger(String),
}

/// 被捕获的请求/响应对
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    pub primitive: Primitive,
    pub url: String,
    pub method: String,
    pub request_body: Option<String>,
    pub status: u16,
    pub response_body: Value,
}

type CaptureOutcome = Result<InterceptedRequest, InterceptError>;
type CaptureSlot = Arc<Mutex<Option<oneshot::Sender<CaptureOutcome>>>>;

/// 包装原始原语的捕获原语
///
/// 所有请求照常转发；第一个 JSON POST 且响应为 JSON 的请求结果被送入捕获槽
struct CapturingPrimitive {
    primitive: Primitive,
    inner: Arc<dyn HttpPrimitive>,
    slot: CaptureSlot,
}

impl CapturingPrimitive {
    fn deliver(&self, outcome: CaptureOutcome) {
        let sender = self.slot.lock().take();
        if let Some(tx) = sender {
            let _ = tx.send(outcome);
        }
    }

    fn capture(&self, request: &HttpExchange, reply: &HttpReply) -> CaptureOutcome {
        let reply = reply
            .clone()
            .error_for_status()
            .map_err(|e| InterceptError::Request(e.to_string()))?;
        let response_body = serde_json::from_str(&reply.body)?;
        Ok(InterceptedRequest {
            primitive: self.primitive,
            url: request.url.clone(),
            method: request.method.clone(),
            request_body: request.body.clone(),
            status: reply.status,
            response_body,
        })
    }
}

#[async_trait]
impl HttpPrimitive for CapturingPrimitive {
    async fn send(&self, request: HttpExchange) -> Result<HttpReply, NetworkError> {
        let armed = self.slot.lock().is_some();
        if !armed || !request.is_json_post() {
            return self.inner.send(request).await;
        }

        let result = self.inner.send(request.clone()).await;
        match &result {
            Ok(reply) if reply.is_json() => {
                debug!("Captured {} {} via {}", request.method, request.url, self.primitive);
                self.deliver(self.capture(&request, reply));
            }
            Ok(_) => {}
            Err(e) => self.deliver(Err(InterceptError::Request(e.to_string()))),
        }
        result
    }
}

/// 拦截窗口守卫
///
/// 释放时恢复原始原语，只执行一次
struct InterceptionGuard {
    env: Arc<NetworkEnvironment>,
    originals: Option<(Arc<dyn HttpPrimitive>, Arc<dyn HttpPrimitive>)>,
}

impl InterceptionGuard {
    fn install(env: Arc<NetworkEnvironment>, slot: CaptureSlot) -> Self {
        let wrap = |primitive: Primitive| -> Arc<dyn HttpPrimitive> {
            Arc::new(CapturingPrimitive {
                primitive,
                inner: env.get(primitive),
                slot: slot.clone(),
            })
        };
        let xhr = wrap(Primitive::Xhr);
        let fetch = wrap(Primitive::Fetch);
        let original_xhr = env.replace(Primitive::Xhr, xhr);
        let original_fetch = env.replace(Primitive::Fetch, fetch);
        Self {
            env,
            originals: Some((original_xhr, original_fetch)),
        }
    }

    fn release(&mut self) {
        if let Some((xhr, fetch)) = self.originals.take() {
            self.env.replace(Primitive::Xhr, xhr);
            self.env.replace(Primitive::Fetch, fetch);
            self.env.end_interception();
            debug!("Network primitives restored");
        }
    }
}

impl Drop for InterceptionGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// 网络拦截器
pub struct Interceptor;

impl Interceptor {
    /// 在拦截窗口内执行触发动作，等待第一个匹配的请求
    ///
    /// # 参数
    ///
    /// * `env` - 页面网络环境
    /// * `trigger` - 包装原语之后执行的触发动作
    /// * `timeout` - 整个窗口的时限，包括触发动作本身
    ///
    /// # 返回值
    ///
    /// * `Ok(InterceptedRequest)` - 捕获到的请求与解析后的响应体
    /// * `Err(InterceptError)` - 超时、并发拦截、请求失败或触发失败
    pub async fn intercept<F, E>(
        env: &Arc<NetworkEnvironment>,
        trigger: F,
        timeout: Duration,
    ) -> Result<InterceptedRequest, InterceptError>
    where
        F: Future<Output = Result<(), E>>,
        E: fmt::Display,
    {
        if !env.try_begin_interception() {
            return Err(InterceptError::AlreadyActive);
        }

        let (tx, mut rx) = oneshot::channel();
        let slot: CaptureSlot = Arc::new(Mutex::new(Some(tx)));
        let mut guard = InterceptionGuard::install(env.clone(), slot);

        let window = async move {
            if let Err(e) = trigger.await {
                // 触发动作可能在失败前已经发出了匹配的请求
                return match rx.try_recv() {
                    Ok(outcome) => outcome,
                    Err(_) => Err(InterceptError::Trigger(e.to_string())),
                };
            }
            match rx.await {
                Ok(outcome) => outcome,
                Err(_) => Err(InterceptError::Request("capture channel closed".to_string())),
            }
        };
        let outcome = tokio::time::timeout(timeout, window).await;
        guard.release();

        match outcome {
            Ok(result) => result,
            Err(_) => {
                warn!("Interception timed out after {:?}", timeout);
                Err(InterceptError::Timeout(timeout))
            }
        }
    }
}
