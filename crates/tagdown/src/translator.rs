//! The public translator: construct once, translate many documents.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::emit::emit;
use crate::html::HtmlParser;
use crate::node::Document;
use crate::options::TranslatorOptions;
use crate::rules::{Registry, RuleSet};
use crate::{Result, TranslateError};

/// Converts HTML to Markdown with a fixed set of options and rules.
///
/// The rule registry is built once in [`Translator::new`] and never changes
/// afterwards, so one translator can serve any number of documents, from
/// several threads at once.
///
/// ```rust
/// use tagdown::{Translator, TranslatorOptions};
///
/// let translator = Translator::new(TranslatorOptions::default(), None).unwrap();
/// let markdown = translator.translate("<p>Hello <b>world</b></p>").unwrap();
/// assert_eq!(markdown, "Hello **world**");
/// ```
#[derive(Clone)]
pub struct Translator {
    options: TranslatorOptions,
    registry: Arc<Registry>,
    parser: Option<Arc<dyn HtmlParser>>,
}

impl Translator {
    /// Build a translator from final options and optional custom rules.
    pub fn new(options: TranslatorOptions, custom_rules: Option<RuleSet>) -> Result<Self> {
        let registry = Registry::build(&options, custom_rules.as_ref())?;
        Ok(Self {
            options,
            registry: Arc::new(registry),
            parser: default_parser(),
        })
    }

    /// Replace the HTML parser.
    pub fn with_parser(mut self, parser: impl HtmlParser + 'static) -> Self {
        self.parser = Some(Arc::new(parser));
        self
    }

    /// Translate one HTML document.
    pub fn translate(&self, html: &str) -> Result<String> {
        let parser = self
            .parser
            .as_ref()
            .ok_or_else(|| TranslateError::Parse("no HTML parser configured".to_string()))?;
        let doc = parser.parse(html)?;
        self.translate_document(&doc)
    }

    /// Translate an already built tree.
    pub fn translate_document(&self, doc: &Document) -> Result<String> {
        emit(doc, &self.options, &self.registry)
    }

    /// Translate a batch of named documents. The result has the same keys in
    /// the same order; the first failing document aborts the batch.
    pub fn translate_files(
        &self,
        files: &IndexMap<String, String>,
    ) -> Result<IndexMap<String, String>> {
        files
            .iter()
            .map(|(name, html)| -> Result<(String, String)> {
                let _span = tracing::debug_span!("translate", file = %name).entered();
                Ok((name.clone(), self.translate(html)?))
            })
            .collect()
    }

    pub fn options(&self) -> &TranslatorOptions {
        &self.options
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl fmt::Debug for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translator")
            .field("options", &self.options)
            .field("rules", &self.registry.len())
            .field("parser", &self.parser.is_some())
            .finish()
    }
}

#[cfg(feature = "html")]
fn default_parser() -> Option<Arc<dyn HtmlParser>> {
    Some(Arc::new(crate::html::ScraperParser))
}

#[cfg(not(feature = "html"))]
fn default_parser() -> Option<Arc<dyn HtmlParser>> {
    None
}

/// One-shot translation with a throwaway [`Translator`].
pub fn translate(
    html: &str,
    options: Option<TranslatorOptions>,
    custom_rules: Option<RuleSet>,
) -> Result<String> {
    Translator::new(options.unwrap_or_default(), custom_rules)?.translate(html)
}

/// One-shot batch translation with a throwaway [`Translator`].
pub fn translate_files(
    files: &IndexMap<String, String>,
    options: Option<TranslatorOptions>,
    custom_rules: Option<RuleSet>,
) -> Result<IndexMap<String, String>> {
    Translator::new(options.unwrap_or_default(), custom_rules)?.translate_files(files)
}
