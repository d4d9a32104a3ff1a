use std::fmt;

/// A non-fatal finding made while decoding a scene description.
///
/// The scene format favors availability over strictness, so none of these stop
/// parsing. They exist so callers can log what was skipped or defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A property line without exactly one `=`. It was ignored.
    MalformedProperty { line: usize, text: String },
    /// A numeric field that did not parse and was read as zero. `line` is the
    /// `begin` line of the block holding it.
    InvalidNumber {
        line: usize,
        key: String,
        value: String,
    },
    /// The input ended inside the block that began at `line`.
    UnterminatedBlock { line: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedProperty { line, text } => {
                write!(f, "line {line}: ignoring malformed property '{text}'")
            }
            Self::InvalidNumber { line, key, value } => {
                write!(
                    f,
                    "block at line {line}: '{key}' has invalid number '{value}', using 0"
                )
            }
            Self::UnterminatedBlock { line } => {
                write!(f, "line {line}: block is never closed")
            }
        }
    }
}

/// A decoded value together with the diagnostics collected while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Decoded<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
