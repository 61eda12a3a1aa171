use std::fmt;

/// An error raised while assembling textual SPIR-V.
///
/// Both variants carry the 1-based source line number, matching the
/// `<lineno>: error: <message>` format the CLI reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    /// A lexical or grammatical problem.
    Syntax { line: usize, message: String },
    /// An id referenced by user-written source was never defined.
    Verify { line: usize, message: String },
}

impl TextError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax { line, message: message.into() }
    }

    pub(crate) fn verify(line: usize, message: impl Into<String>) -> Self {
        Self::Verify { line, message: message.into() }
    }

    /// The line number this error should be reported against.
    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Self::Syntax { line, .. } | Self::Verify { line, .. } => *line,
        }
    }
}

impl fmt::Display for TextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax { line, message } | Self::Verify { line, message } => {
                write!(f, "{line}: error: {message}")
            }
        }
    }
}

impl std::error::Error for TextError {}

pub type TextResult<T> = Result<T, TextError>;
