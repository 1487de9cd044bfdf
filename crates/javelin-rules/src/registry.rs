//! The frozen rule registry and its node-kind dispatch table.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use javelin_config::FormatConfig;
use javelin_syntax::NodeKind;

use crate::{Rule, RuleConfigError};

/// All registered rules plus a `node kind -> rule` dispatch table.
///
/// Built once at startup, then frozen; readers share it via `Arc`.
pub struct RuleRegistry {
    rules: Vec<Arc<dyn Rule>>,
    by_kind: HashMap<NodeKind, Vec<usize>>,
}

impl RuleRegistry {
    pub fn empty() -> RuleRegistryBuilder {
        RuleRegistryBuilder { rules: Vec::new() }
    }

    /// The built-in rule set.
    pub fn with_default_rules() -> Arc<Self> {
        let mut builder = Self::empty();
        for rule in crate::rules::default_rules() {
            builder.register(rule);
        }
        builder.build()
    }

    /// Process-wide shared instance of the default registry.
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<RuleRegistry>> = OnceLock::new();
        SHARED.get_or_init(Self::with_default_rules).clone()
    }

    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn rule(&self, id: &str) -> Option<&Arc<dyn Rule>> {
        self.rules.iter().find(|r| r.id() == id)
    }

    /// Indices of rules subscribed to `kind`, in registration order.
    pub(crate) fn rule_indices_for(&self, kind: NodeKind) -> &[usize] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ask every rule with an options table in `config` to validate it.
    pub fn validate_config(&self, config: &FormatConfig) -> Result<(), RuleConfigError> {
        for rule in &self.rules {
            if let Some(options) = config.rule_options(rule.id()) {
                rule.validate_config(options)?;
            }
        }
        Ok(())
    }
}

pub struct RuleRegistryBuilder {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleRegistryBuilder {
    pub fn register(&mut self, rule: Arc<dyn Rule>) -> &mut Self {
        debug_assert!(
            !self.rules.iter().any(|r| r.id() == rule.id()),
            "duplicate rule id {}",
            rule.id()
        );
        self.rules.push(rule);
        self
    }

    pub fn build(self) -> Arc<RuleRegistry> {
        let mut by_kind: HashMap<NodeKind, Vec<usize>> = HashMap::new();
        for (index, rule) in self.rules.iter().enumerate() {
            for &kind in rule.applicable_kinds() {
                by_kind.entry(kind).or_default().push(index);
            }
        }
        Arc::new(RuleRegistry {
            rules: self.rules,
            by_kind,
        })
    }
}
