use {
    crate::StanzaError,
    serde::{Serialize, Serializer},
    std::fmt::{Display, Formatter, Result as FmtResult},
};

/// Set-operator prefix for multivalued condition keys.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SetModifier {
    ForAllValues,
    ForAnyValue,
}

impl Display for SetModifier {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::ForAllValues => f.write_str("ForAllValues"),
            Self::ForAnyValue => f.write_str("ForAnyValue"),
        }
    }
}

/// A condition operator: a base comparison plus the optional `IfExists`
/// suffix and `ForAllValues:`/`ForAnyValue:` set prefix.
///
/// The composed wire form is `[<SetModifier>:]<Base>[IfExists]`, e.g.
/// `ForAnyValue:StringEqualsIfExists`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Operator {
    base: &'static str,
    custom: Option<String>,
    if_exists: bool,
    set_modifier: Option<SetModifier>,
}

macro_rules! operator_ctor {
    ($(#[$attr:meta])* $name:ident, $base:literal) => {
        $(#[$attr])*
        pub fn $name() -> Self {
            Self::base($base)
        }
    };
}

impl Operator {
    fn base(base: &'static str) -> Self {
        Self {
            base,
            custom: None,
            if_exists: false,
            set_modifier: None,
        }
    }

    operator_ctor!(
        /// The `StringEquals` operator.
        string_equals,
        "StringEquals"
    );
    operator_ctor!(
        /// The `StringNotEquals` operator.
        string_not_equals,
        "StringNotEquals"
    );
    operator_ctor!(
        /// The `StringEqualsIgnoreCase` operator.
        string_equals_ignore_case,
        "StringEqualsIgnoreCase"
    );
    operator_ctor!(
        /// The `StringNotEqualsIgnoreCase` operator.
        string_not_equals_ignore_case,
        "StringNotEqualsIgnoreCase"
    );
    operator_ctor!(
        /// The `StringLike` operator.
        string_like,
        "StringLike"
    );
    operator_ctor!(
        /// The `StringNotLike` operator.
        string_not_like,
        "StringNotLike"
    );
    operator_ctor!(
        /// The `NumericEquals` operator.
        numeric_equals,
        "NumericEquals"
    );
    operator_ctor!(
        /// The `NumericNotEquals` operator.
        numeric_not_equals,
        "NumericNotEquals"
    );
    operator_ctor!(
        /// The `NumericLessThan` operator.
        numeric_less_than,
        "NumericLessThan"
    );
    operator_ctor!(
        /// The `NumericLessThanEquals` operator.
        numeric_less_than_equals,
        "NumericLessThanEquals"
    );
    operator_ctor!(
        /// The `NumericGreaterThan` operator.
        numeric_greater_than,
        "NumericGreaterThan"
    );
    operator_ctor!(
        /// The `NumericGreaterThanEquals` operator.
        numeric_greater_than_equals,
        "NumericGreaterThanEquals"
    );
    operator_ctor!(
        /// The `DateEquals` operator.
        date_equals,
        "DateEquals"
    );
    operator_ctor!(
        /// The `DateNotEquals` operator.
        date_not_equals,
        "DateNotEquals"
    );
    operator_ctor!(
        /// The `DateLessThan` operator.
        date_less_than,
        "DateLessThan"
    );
    operator_ctor!(
        /// The `DateLessThanEquals` operator.
        date_less_than_equals,
        "DateLessThanEquals"
    );
    operator_ctor!(
        /// The `DateGreaterThan` operator.
        date_greater_than,
        "DateGreaterThan"
    );
    operator_ctor!(
        /// The `DateGreaterThanEquals` operator.
        date_greater_than_equals,
        "DateGreaterThanEquals"
    );
    operator_ctor!(
        /// The `Bool` operator.
        boolean,
        "Bool"
    );
    operator_ctor!(
        /// The `BinaryEquals` operator.
        binary_equals,
        "BinaryEquals"
    );
    operator_ctor!(
        /// The `IpAddress` operator.
        ip_address,
        "IpAddress"
    );
    operator_ctor!(
        /// The `NotIpAddress` operator.
        not_ip_address,
        "NotIpAddress"
    );
    operator_ctor!(
        /// The `ArnEquals` operator.
        arn_equals,
        "ArnEquals"
    );
    operator_ctor!(
        /// The `ArnNotEquals` operator.
        arn_not_equals,
        "ArnNotEquals"
    );
    operator_ctor!(
        /// The `ArnLike` operator.
        arn_like,
        "ArnLike"
    );
    operator_ctor!(
        /// The `ArnNotLike` operator.
        arn_not_like,
        "ArnNotLike"
    );
    operator_ctor!(
        /// The `Null` operator.
        null,
        "Null"
    );

    /// An operator outside the built-in set, passed through verbatim.
    /// Empty strings are rejected.
    pub fn custom<S: Into<String>>(operator: S) -> Result<Self, StanzaError> {
        let operator = operator.into();
        if operator.is_empty() {
            return Err(StanzaError::InvalidOperator(operator));
        }

        Ok(Self {
            base: "",
            custom: Some(operator),
            if_exists: false,
            set_modifier: None,
        })
    }

    /// Append the `IfExists` suffix. `Null` takes no suffix and is returned
    /// unchanged.
    pub fn if_exists(mut self) -> Self {
        if self.base != "Null" {
            self.if_exists = true;
        }
        self
    }

    /// Prefix the operator with `ForAllValues:`.
    pub fn for_all_values(mut self) -> Self {
        self.set_modifier = Some(SetModifier::ForAllValues);
        self
    }

    /// Prefix the operator with `ForAnyValue:`.
    pub fn for_any_value(mut self) -> Self {
        self.set_modifier = Some(SetModifier::ForAnyValue);
        self
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        if let Some(modifier) = &self.set_modifier {
            write!(f, "{}:", modifier)?;
        }

        match &self.custom {
            Some(custom) => f.write_str(custom)?,
            None => f.write_str(self.base)?,
        }

        if self.if_exists {
            f.write_str("IfExists")?;
        }

        Ok(())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
