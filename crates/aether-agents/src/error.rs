use thiserror::Error;

/// Why an arithmetic expression could not be evaluated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("empty expression")]
    Empty,

    #[error("malformed number '{0}'")]
    BadNumber(String),

    #[error("unexpected '{found}' at position {pos}")]
    Unexpected { found: String, pos: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unbalanced parenthesis at position {0}")]
    Unbalanced(usize),

    #[error("result is not a finite number")]
    NonFinite,

    #[error("expression nests deeper than {0} levels")]
    TooDeep(usize),
}
