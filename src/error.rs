use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
};

#[derive(Debug, Eq, PartialEq)]
pub enum StanzaError {
    EmptyStatement,
    InvalidConditionKey(String),
    InvalidOperator(String),
    UnknownAction(String),
    UnknownResourceType(String),
    UnresolvedPlaceholder(String),
}

impl Display for StanzaError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::EmptyStatement => f.write_str("Statement contains no actions"),
            Self::InvalidConditionKey(key) => write!(f, "Invalid condition key: {}", key),
            Self::InvalidOperator(operator) => write!(f, "Invalid condition operator: {}", operator),
            Self::UnknownAction(action) => write!(f, "Unknown action: {}", action),
            Self::UnknownResourceType(resource_type) => write!(f, "Unknown resource type: {}", resource_type),
            Self::UnresolvedPlaceholder(placeholder) => write!(f, "Unresolved placeholder: {}", placeholder),
        }
    }
}

impl Error for StanzaError {}
