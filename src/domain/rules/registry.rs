// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::rules::ccgp_portal::CcgpPortalRule;
use crate::domain::rules::ccgp_search::CcgpSearchRule;
use crate::domain::rules::ccgp_sichuan::CcgpSichuanRule;
use crate::domain::rules::default_rule::DefaultRule;
use crate::domain::rules::traits::SiteRule;
use std::sync::Arc;
use tracing::debug;

/// 站点规则注册表
///
/// 按注册顺序匹配，第一个匹配的规则生效；更具体的规则应先注册
pub struct RuleRegistry {
    rules: Vec<Arc<dyn SiteRule>>,
    default_rule: Arc<dyn SiteRule>,
}

impl RuleRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            default_rule: Arc::new(DefaultRule::new()),
        }
    }

    /// 创建包含内置规则的注册表
    pub fn with_builtin_rules() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(CcgpSearchRule::new()));
        registry.register(Arc::new(CcgpPortalRule::new()));
        registry.register(Arc::new(CcgpSichuanRule::new()));
        registry
    }

    /// 追加规则
    pub fn register(&mut self, rule: Arc<dyn SiteRule>) {
        debug!("Registering site rule {}", rule.name());
        self.rules.push(rule);
    }

    /// 查找第一个匹配URL的规则
    pub fn find(&self, url: &str) -> Option<Arc<dyn SiteRule>> {
        self.rules.iter().find(|rule| rule.matches(url)).cloned()
    }

    /// 解析URL对应的规则，没有匹配时返回兜底规则
    pub fn resolve(&self, url: &str) -> Arc<dyn SiteRule> {
        self.find(url).unwrap_or_else(|| self.default_rule.clone())
    }

    pub fn is_supported(&self, url: &str) -> bool {
        self.find(url).is_some()
    }

    pub fn rules(&self) -> &[Arc<dyn SiteRule>] {
        &self.rules
    }

    pub fn default_rule(&self) -> Arc<dyn SiteRule> {
        self.default_rule.clone()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_builtin_rules()
    }
}
