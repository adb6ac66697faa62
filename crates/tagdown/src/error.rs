/// Error type for translation
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TranslateError {
    /// The HTML parser rejected its input.
    #[error("HTML parse error: {0}")]
    Parse(String),

    /// A rule's postprocess hook failed.
    #[error("postprocess for <{tag}> failed: {message}")]
    PostProcess { tag: String, message: String },

    /// A rule factory failed to produce a rule.
    #[error("rule factory for <{tag}> failed: {message}")]
    Factory { tag: String, message: String },

    /// A custom rule could not be registered.
    #[error("invalid rule: {0}")]
    InvalidRule(String),
}

impl TranslateError {
    /// Convenience constructor for hooks reporting a failure.
    pub fn postprocess(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PostProcess {
            tag: tag.into(),
            message: message.into(),
        }
    }

    pub fn factory(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Factory {
            tag: tag.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TranslateError>;
