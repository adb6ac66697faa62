//! # tagdown
//!
//! Convert HTML to Markdown through a per-tag rule table.
//!
//! Every tag resolves to one [`Rule`]. The table is layered from an ignore
//! list, a block list, the built-in rules and finally caller-supplied rules;
//! later layers override single fields of earlier ones, and factory rules can
//! reach the rule they replaced through their base.
//!
//! ## Example (HTML string)
//!
//! ```rust
//! use tagdown::translate;
//!
//! let markdown = translate("<h1>Hello</h1><p>World</p>", None, None).unwrap();
//! assert_eq!(markdown, "# Hello\n\nWorld");
//! ```
//!
//! ## Example (custom rules)
//!
//! ```rust
//! use tagdown::{PostProcess, Rule, RuleConfig, RuleSet, Translator, TranslatorOptions};
//!
//! let rules = RuleSet::new()
//!     .with("mark", RuleConfig::new().prefix("==").postfix("=="))
//!     .with(
//!         "li",
//!         Rule::factory(|rc| {
//!             let base = rc.base_config()?;
//!             Ok(base.merge(&RuleConfig::new().postprocess(|input| {
//!                 Ok(PostProcess::Content(input.content.to_uppercase()))
//!             })))
//!         }),
//!     );
//!
//! let translator = Translator::new(TranslatorOptions::default(), Some(rules)).unwrap();
//! let markdown = translator
//!     .translate("<p><mark>hi</mark></p><ul><li>a</li></ul>")
//!     .unwrap();
//! assert_eq!(markdown, "==hi==\n\n* A");
//! ```
//!
//! ## Example (Node-based)
//!
//! ```rust
//! use tagdown::{Document, Node, Translator, TranslatorOptions};
//!
//! let translator = Translator::new(TranslatorOptions::default(), None).unwrap();
//! let doc = Document::from(Node::element("DIV").with_text("Hello World"));
//! assert_eq!(translator.translate_document(&doc).unwrap(), "Hello World");
//! ```

mod context;
mod emit;
mod error;
pub mod escape;
pub mod html;
pub mod node;
mod options;
mod rules;
mod translator;
pub mod whitespace;

pub use context::{ListKind, TraversalContext};
pub use error::{Result, TranslateError};
#[cfg(feature = "html")]
pub use html::{parse_html, ScraperParser};
pub use html::HtmlParser;
pub use node::{Document, Node, NodeId, NodeRef, NodeType};
pub use options::{CodeBlockStyle, TranslatorOptions};
pub use rules::{
    default_rules, FactoryFn, PostProcess, PostProcessFn, PostProcessInput, Registry, Rule,
    RuleConfig, RuleContext, RuleSet, DEFAULT_BLOCK_ELEMENTS, DEFAULT_IGNORE_ELEMENTS,
};
pub use translator::{translate, translate_files, Translator};
