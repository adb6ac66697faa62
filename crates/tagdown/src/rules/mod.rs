//! Rule system for HTML to Markdown translation.
//!
//! The [`Registry`] maps lowercase tag names to a single [`Rule`]. It is built
//! once per translator from four layers, weakest first:
//!
//! 1. the ignore list (`{ ignore, !recurse }`),
//! 2. the block list (`{ surrounding_newlines: 2 }`),
//! 3. the built-in [`default_rules`],
//! 4. caller-supplied custom rules.
//!
//! Each layer is applied over the rule already registered, so a later rule only
//! replaces the fields it sets, and factories can reach the rule they
//! replaced through their base.

mod defaults;
mod rule;

pub use defaults::{default_rules, DEFAULT_BLOCK_ELEMENTS, DEFAULT_IGNORE_ELEMENTS};
pub use rule::{
    FactoryFn, PostProcess, PostProcessFn, PostProcessInput, Rule, RuleConfig, RuleContext,
};

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::options::TranslatorOptions;
use crate::{Result, TranslateError};

/// Rule used for tags nothing was registered for: recurse, no decoration.
static DEFAULT_RULE: Lazy<Rule> = Lazy::new(|| Rule::Static(RuleConfig::default()));

/// An ordered set of rules keyed by comma-joined tag lists (`"strong,b"`).
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: IndexMap<String, Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for one or more comma-joined tags. A later rule under the
    /// same key replaces the earlier one.
    pub fn insert(&mut self, tags: &str, rule: impl Into<Rule>) -> &mut Self {
        self.rules.insert(tags.to_string(), rule.into());
        self
    }

    /// Builder form of [`RuleSet::insert`].
    pub fn with(mut self, tags: &str, rule: impl Into<Rule>) -> Self {
        self.insert(tags, rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<S: Into<String>, R: Into<Rule>> FromIterator<(S, R)> for RuleSet {
    fn from_iter<I: IntoIterator<Item = (S, R)>>(iter: I) -> Self {
        Self {
            rules: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Immutable per-translator table of tag → rule.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    rules: HashMap<String, Arc<Rule>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the layered registry for `options` and optional custom rules.
    pub fn build(options: &TranslatorOptions, custom: Option<&RuleSet>) -> Result<Self> {
        let mut registry = Self::new();

        let ignored = DEFAULT_IGNORE_ELEMENTS
            .iter()
            .copied()
            .chain(options.ignore.iter().map(String::as_str));
        for tag in ignored {
            registry.set(tag, RuleConfig::new().ignore(true).recurse(false))?;
        }

        let blocks = DEFAULT_BLOCK_ELEMENTS
            .iter()
            .copied()
            .chain(options.block_elements.iter().map(String::as_str));
        for tag in blocks {
            registry.set(tag, RuleConfig::new().surrounding_newlines(2))?;
        }

        for (tags, rule) in default_rules().iter() {
            registry.set(tags, rule.clone())?;
        }
        if let Some(custom) = custom {
            for (tags, rule) in custom.iter() {
                registry.set(tags, rule.clone())?;
            }
        }

        tracing::debug!(
            tags = registry.len(),
            custom_rules = custom.map_or(0, RuleSet::len),
            "translator registry built"
        );
        Ok(registry)
    }

    /// Layer `rule` over every tag named in the comma-joined `tags`.
    ///
    /// Tags without a previous rule share one rule instance.
    pub fn set(&mut self, tags: &str, rule: impl Into<Rule>) -> Result<()> {
        let rule = rule.into();
        let keys = split_tags(tags);
        if keys.is_empty() {
            return Err(TranslateError::InvalidRule(format!(
                "no tag names in {tags:?}"
            )));
        }

        let shared = Arc::new(rule.clone());
        for key in keys {
            let layered = match self.rules.remove(&key) {
                Some(existing) => Arc::new(rule.clone().layer_over(existing)),
                None => Arc::clone(&shared),
            };
            self.rules.insert(key, layered);
        }
        Ok(())
    }

    /// Rule for `tag`, case-insensitively; unknown tags get the default rule.
    pub fn resolve(&self, tag: &str) -> &Rule {
        self.get(tag).map_or(&*DEFAULT_RULE, |r| r.as_ref())
    }

    /// Registered rule for `tag`, if any.
    pub fn get(&self, tag: &str) -> Option<&Arc<Rule>> {
        self.rules.get(&tag.to_ascii_lowercase())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Split `"b, STRONG"` into `["b", "strong"]`.
fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
