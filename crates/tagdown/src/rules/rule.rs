//! Rule records, factories and their layering.

use std::fmt;
use std::sync::Arc;

use crate::context::TraversalContext;
use crate::node::NodeRef;
use crate::options::TranslatorOptions;
use crate::Result;

/// Type alias for postprocess hooks
pub type PostProcessFn = Arc<dyn Fn(&PostProcessInput<'_>) -> Result<PostProcess> + Send + Sync>;

/// Type alias for rule factories
pub type FactoryFn = Arc<dyn Fn(&mut RuleContext<'_>) -> Result<RuleConfig> + Send + Sync>;

/// What a postprocess hook sees.
pub struct PostProcessInput<'a> {
    /// The node's composed output, prefix and postfix included.
    pub content: &'a str,
    /// Prefix of the merged rule that produced `content`, empty when unset.
    pub prefix: &'a str,
    /// Postfix of the merged rule, empty when unset.
    pub postfix: &'a str,
    pub node: NodeRef<'a>,
    pub options: &'a TranslatorOptions,
}

/// Outcome of a postprocess hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcess {
    /// Replace the node's output.
    Content(String),
    /// Keep the composed output as is.
    NoChange,
    /// Drop the node, including the line breaks it asked for.
    RemoveNode,
}

/// A static rendering rule.
///
/// Every field is optional so that layering one record over another is a
/// field-by-field `new.or(old)`.
#[derive(Clone, Default)]
pub struct RuleConfig {
    /// Suppress the node's own output.
    pub ignore: Option<bool>,
    /// Descend into children. Defaults to `!ignore`.
    pub recurse: Option<bool>,
    /// Line breaks required between this node and its neighbours; 0 is inline.
    pub surrounding_newlines: Option<usize>,
    pub prefix: Option<String>,
    pub postfix: Option<String>,
    /// Skip text escaping inside this subtree.
    pub no_escape: Option<bool>,
    /// Keep text whitespace as written inside this subtree.
    pub preserve_whitespace: Option<bool>,
    /// Literal output used instead of the children.
    pub content: Option<String>,
    /// Insert a space when the output would start with the character that
    /// precedes it, so `**a**` followed by `**b**` does not fuse.
    pub space_if_repeating_char: Option<bool>,
    /// Final transform of the composed output.
    pub postprocess: Option<PostProcessFn>,
}

impl RuleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore(mut self, ignore: bool) -> Self {
        self.ignore = Some(ignore);
        self
    }

    pub fn recurse(mut self, recurse: bool) -> Self {
        self.recurse = Some(recurse);
        self
    }

    pub fn surrounding_newlines(mut self, count: usize) -> Self {
        self.surrounding_newlines = Some(count);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn postfix(mut self, postfix: impl Into<String>) -> Self {
        self.postfix = Some(postfix.into());
        self
    }

    pub fn no_escape(mut self, no_escape: bool) -> Self {
        self.no_escape = Some(no_escape);
        self
    }

    pub fn preserve_whitespace(mut self, preserve: bool) -> Self {
        self.preserve_whitespace = Some(preserve);
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn space_if_repeating_char(mut self, enabled: bool) -> Self {
        self.space_if_repeating_char = Some(enabled);
        self
    }

    pub fn postprocess<F>(mut self, f: F) -> Self
    where
        F: Fn(&PostProcessInput<'_>) -> Result<PostProcess> + Send + Sync + 'static,
    {
        self.postprocess = Some(Arc::new(f));
        self
    }

    /// Layer `over` on top of `self`; fields set in `over` win.
    pub fn merge(&self, over: &RuleConfig) -> RuleConfig {
        RuleConfig {
            ignore: over.ignore.or(self.ignore),
            recurse: over.recurse.or(self.recurse),
            surrounding_newlines: over.surrounding_newlines.or(self.surrounding_newlines),
            prefix: over.prefix.clone().or_else(|| self.prefix.clone()),
            postfix: over.postfix.clone().or_else(|| self.postfix.clone()),
            no_escape: over.no_escape.or(self.no_escape),
            preserve_whitespace: over.preserve_whitespace.or(self.preserve_whitespace),
            content: over.content.clone().or_else(|| self.content.clone()),
            space_if_repeating_char: over
                .space_if_repeating_char
                .or(self.space_if_repeating_char),
            postprocess: over
                .postprocess
                .clone()
                .or_else(|| self.postprocess.clone()),
        }
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore.unwrap_or(false)
    }

    pub fn should_recurse(&self) -> bool {
        self.recurse.unwrap_or(!self.is_ignored())
    }

    pub fn newlines(&self) -> usize {
        self.surrounding_newlines.unwrap_or(0)
    }
}

impl fmt::Debug for RuleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleConfig")
            .field("ignore", &self.ignore)
            .field("recurse", &self.recurse)
            .field("surrounding_newlines", &self.surrounding_newlines)
            .field("prefix", &self.prefix)
            .field("postfix", &self.postfix)
            .field("no_escape", &self.no_escape)
            .field("preserve_whitespace", &self.preserve_whitespace)
            .field("content", &self.content)
            .field("space_if_repeating_char", &self.space_if_repeating_char)
            .field("postprocess", &self.postprocess.is_some())
            .finish()
    }
}

/// A rule defines how to render a matched element
#[derive(Clone)]
pub enum Rule {
    /// A fixed record.
    Static(RuleConfig),
    /// A record computed per visit from the node and traversal state.
    /// `base` is whatever rule occupied the tag before this one was layered.
    Factory {
        factory: FactoryFn,
        base: Option<Arc<Rule>>,
    },
}

impl Rule {
    /// Create a factory rule
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn(&mut RuleContext<'_>) -> Result<RuleConfig> + Send + Sync + 'static,
    {
        Rule::Factory {
            factory: Arc::new(f),
            base: None,
        }
    }

    pub fn is_factory(&self) -> bool {
        matches!(self, Rule::Factory { .. })
    }

    /// The rule this one was layered over, if it is a factory with a base.
    pub fn base(&self) -> Option<&Rule> {
        match self {
            Rule::Factory { base, .. } => base.as_deref(),
            Rule::Static(_) => None,
        }
    }

    /// Produce the record for one visit.
    pub fn resolve(
        &self,
        node: NodeRef<'_>,
        ctx: &mut TraversalContext,
        options: &TranslatorOptions,
    ) -> Result<RuleConfig> {
        match self {
            Rule::Static(config) => Ok(config.clone()),
            Rule::Factory { factory, base } => {
                let mut rule_ctx = RuleContext {
                    node,
                    ctx,
                    options,
                    base: base.as_deref(),
                };
                factory(&mut rule_ctx)
            }
        }
    }

    /// Layer `self` over the rule already registered for a tag.
    ///
    /// Factories keep the existing rule as their base. Static records are
    /// shallow-merged over a static base; over a factory base they become a
    /// factory that resolves the base and then applies the record.
    pub(crate) fn layer_over(self, existing: Arc<Rule>) -> Rule {
        match self {
            Rule::Factory { factory, .. } => Rule::Factory {
                factory,
                base: Some(existing),
            },
            Rule::Static(overlay) => {
                if let Rule::Static(under) = existing.as_ref() {
                    return Rule::Static(under.merge(&overlay));
                }
                Rule::Factory {
                    factory: Arc::new(move |ctx: &mut RuleContext<'_>| -> Result<RuleConfig> {
                        Ok(ctx.base_config()?.merge(&overlay))
                    }),
                    base: Some(existing),
                }
            }
        }
    }
}

impl From<RuleConfig> for Rule {
    fn from(config: RuleConfig) -> Self {
        Rule::Static(config)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Static(config) => f.debug_tuple("Static").field(config).finish(),
            Rule::Factory { base, .. } => f.debug_struct("Factory").field("base", base).finish(),
        }
    }
}

/// Everything a factory can consult when building a rule.
pub struct RuleContext<'a> {
    pub node: NodeRef<'a>,
    pub ctx: &'a mut TraversalContext,
    pub options: &'a TranslatorOptions,
    base: Option<&'a Rule>,
}

impl RuleContext<'_> {
    /// The rule this factory was layered over.
    pub fn base(&self) -> Option<&Rule> {
        self.base
    }

    /// Resolve the base rule for the current node; an empty record when there
    /// is no base.
    pub fn base_config(&mut self) -> Result<RuleConfig> {
        match self.base {
            Some(base) => base.resolve(self.node, self.ctx, self.options),
            None => Ok(RuleConfig::default()),
        }
    }
}
