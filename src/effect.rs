use {
    serde::{Deserialize, Serialize},
    std::fmt::{Display, Formatter, Result as FmtResult},
};

/// The effect of a statement. Statements start out as [Effect::Allow] and are
/// flipped by [crate::StatementBuilder::deny].
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

impl Default for Effect {
    fn default() -> Self {
        Self::Allow
    }
}

impl Display for Effect {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::Allow => f.write_str("Allow"),
            Self::Deny => f.write_str("Deny"),
        }
    }
}

#[cfg(test)]
mod tests {
    use {crate::Effect, pretty_assertions::assert_eq};

    #[test_log::test]
    fn test_default() {
        assert_eq!(Effect::default(), Effect::Allow);
    }

    #[test_log::test]
    fn test_display() {
        assert_eq!(format!("{}", Effect::Allow), "Allow");
        assert_eq!(format!("{}", Effect::Deny), "Deny");
    }

    #[test_log::test]
    fn test_wire_form() {
        assert_eq!(serde_json::to_string(&Effect::Allow).unwrap(), r#""Allow""#);
        assert_eq!(serde_json::to_string(&Effect::Deny).unwrap(), r#""Deny""#);
        assert_eq!(serde_json::from_str::<Effect>(r#""Deny""#).unwrap(), Effect::Deny);
    }
}
