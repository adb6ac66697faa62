//! Translator configuration.

use regex::Regex;

/// Code block style options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeBlockStyle {
    /// Use fenced code blocks (```)
    #[default]
    Fenced,
    /// Use indented code blocks (4 spaces)
    Indented,
}

/// Options for a [`Translator`](crate::Translator).
///
/// The value is treated as final: merging user settings with defaults happens
/// before it reaches the translator, usually via struct update syntax:
///
/// ```rust
/// use tagdown::TranslatorOptions;
///
/// let options = TranslatorOptions {
///     bullet_marker: "-".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(options.max_consecutive_newlines, 3);
/// ```
#[derive(Debug, Clone)]
pub struct TranslatorOptions {
    /// Bullet list marker
    pub bullet_marker: String,

    /// Code block style
    pub code_block_style: CodeBlockStyle,

    /// Fence string for fenced code blocks
    pub code_fence: String,

    /// Emphasis delimiter
    pub em_delimiter: String,

    /// Strong delimiter
    pub strong_delimiter: String,

    /// Strikethrough delimiter
    pub strike_delimiter: String,

    /// Tags dropped together with their subtree, on top of the built-in list.
    pub ignore: Vec<String>,

    /// Tags rendered as blocks, on top of the built-in list.
    pub block_elements: Vec<String>,

    /// Maximum number of consecutive line breaks in the output.
    /// Values below 1 behave like 1.
    pub max_consecutive_newlines: usize,

    /// Disable Markdown escaping of text everywhere.
    pub no_escape: bool,

    /// User substitutions applied to every text node after escaping.
    pub text_replace: Vec<(Regex, String)>,

    /// Keep `data:` image sources instead of truncating them.
    pub keep_data_images: bool,

    /// Emit links as `[text][n]` with `[n]: url` definitions at the end.
    pub use_link_reference_definitions: bool,

    /// When false, a link whose text equals its target becomes `<url>`.
    pub use_inline_links: bool,
}

impl Default for TranslatorOptions {
    fn default() -> Self {
        Self {
            bullet_marker: "*".to_string(),
            code_block_style: CodeBlockStyle::Fenced,
            code_fence: "```".to_string(),
            em_delimiter: "_".to_string(),
            strong_delimiter: "**".to_string(),
            strike_delimiter: "~~".to_string(),
            ignore: Vec::new(),
            block_elements: Vec::new(),
            max_consecutive_newlines: 3,
            no_escape: false,
            text_replace: Vec::new(),
            keep_data_images: false,
            use_link_reference_definitions: false,
            use_inline_links: true,
        }
    }
}

impl TranslatorOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the unordered list bullet marker.
    pub fn with_bullet_marker(mut self, marker: &str) -> Self {
        self.bullet_marker = marker.to_string();
        self
    }

    /// Set the code block style.
    pub fn with_code_block_style(mut self, style: CodeBlockStyle) -> Self {
        self.code_block_style = style;
        self
    }

    /// Set the fence string.
    pub fn with_code_fence(mut self, fence: &str) -> Self {
        self.code_fence = fence.to_string();
        self
    }

    /// Add tags to the ignore list.
    pub fn with_ignore(mut self, tags: &[&str]) -> Self {
        self.ignore.extend(tags.iter().map(|t| t.to_string()));
        self
    }

    /// Add tags to the block list.
    pub fn with_block_elements(mut self, tags: &[&str]) -> Self {
        self.block_elements.extend(tags.iter().map(|t| t.to_string()));
        self
    }

    /// Set the line break cap.
    pub fn with_max_consecutive_newlines(mut self, max: usize) -> Self {
        self.max_consecutive_newlines = max;
        self
    }

    /// Disable text escaping.
    pub fn with_no_escape(mut self, no_escape: bool) -> Self {
        self.no_escape = no_escape;
        self
    }

    /// Add a text substitution.
    pub fn with_text_replace(mut self, pattern: Regex, replacement: &str) -> Self {
        self.text_replace.push((pattern, replacement.to_string()));
        self
    }

    /// Switch to reference-style links.
    pub fn with_link_reference_definitions(mut self, enabled: bool) -> Self {
        self.use_link_reference_definitions = enabled;
        self
    }
}
