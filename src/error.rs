use crate::{ErrorKind, GrammarError, ParseMatch};
use std::fmt::{Display, Formatter};

impl GrammarError {
    pub fn new(kind: ErrorKind, what: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            what: what.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn what(&self) -> &str {
        &self.what
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for GrammarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}-{}", self.kind, self.what, self.message)
    }
}

impl std::error::Error for GrammarError {}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl ParseMatch {
    /// Whether the dispatch consumed input (a zero token match still counts as a match).
    pub fn is_match(&self) -> bool {
        match self {
            ParseMatch::Consumed(_) => true,
            ParseMatch::NoMatch => false,
        }
    }

    /// The consumed token count of a match.
    pub fn consumed(&self) -> Option<usize> {
        match self {
            ParseMatch::Consumed(n) => Some(*n),
            ParseMatch::NoMatch => None,
        }
    }
}
