use langrex_automata::{Operator, ResourceLimitError, SyntaxError};
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// Refers to a capture group by position or by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupRef {
    /// 1-based position of the opening parenthesis. 0 is the whole regex.
    Index(usize),
    /// The name given with `(?name:...)` or `(?P<name>...)`.
    Name(String),
}

impl Display for GroupRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GroupRef::Index(index) => write!(f, "{index}"),
            GroupRef::Name(name) => write!(f, "`{name}`"),
        }
    }
}

impl From<usize> for GroupRef {
    fn from(index: usize) -> Self {
        GroupRef::Index(index)
    }
}

impl From<&str> for GroupRef {
    fn from(name: &str) -> Self {
        GroupRef::Name(name.to_string())
    }
}

impl From<String> for GroupRef {
    fn from(name: String) -> Self {
        GroupRef::Name(name)
    }
}

/// Everything that can go wrong when building, combining or running a [`Regex`](crate::Regex).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The pattern text does not parse.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// There is no capture group with this index or name.
    #[error("no capture group {0}")]
    GroupNotFound(GroupRef),
    /// The group exists, but sits under a set operator, which does not keep capture groups.
    #[error("capture group {group} was discarded by the {operator}")]
    Composition {
        /// The group that was asked for.
        group: GroupRef,
        /// The outermost set operator containing the group.
        operator: Operator,
    },
    /// Compiling the pattern needs more states than its limits allow.
    #[error(transparent)]
    ResourceLimit(#[from] ResourceLimitError),
    /// A repetition with its minimum above its maximum.
    #[error("invalid repetition: minimum {min} is larger than maximum {max}")]
    InvalidRepetition {
        /// Requested minimum.
        min: u32,
        /// Requested maximum.
        max: u32,
    },
    /// A capture group name that is not of the form `[A-Za-z_][A-Za-z0-9_]*`.
    #[error("invalid capture group name `{0}`")]
    InvalidGroupName(String),
}

/// Result type of this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
