use {
    crate::{arn::PLACEHOLDER, descriptor::ServiceSpec, Operator, StanzaError},
    chrono::{DateTime, SecondsFormat, Utc},
    lazy_static::lazy_static,
    log::debug,
    serde::{ser::Serializer, Serialize},
    std::collections::BTreeMap,
};

/// Value family of a condition key. Drives the default operator when the
/// caller supplies none; the mapping is static, never inferred from the
/// runtime type of the value.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ConditionKeyFamily {
    Arn,
    Boolean,
    Date,
    IpAddr,
    Numeric,
    String,
}

impl ConditionKeyFamily {
    pub fn default_operator(&self) -> Operator {
        match self {
            Self::Arn => Operator::arn_equals(),
            Self::Boolean => Operator::boolean(),
            Self::Date => Operator::date_equals(),
            Self::IpAddr => Operator::ip_address(),
            Self::Numeric => Operator::numeric_equals(),
            Self::String => Operator::string_like(),
        }
    }
}

/// A single condition value. Booleans, integers, and timestamps are written
/// in their string wire form, matching how the IAM console displays and
/// generates them; scalar shape is otherwise preserved.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConditionValue {
    String(String),
    Bool(bool),
    Integer(i64),
    List(Vec<String>),
    Timestamp(DateTime<Utc>),
}

impl Serialize for ConditionValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Bool(b) => serializer.serialize_str(if *b {
                "true"
            } else {
                "false"
            }),
            Self::Integer(i) => serializer.serialize_str(&i.to_string()),
            Self::List(l) => l.serialize(serializer),
            Self::Timestamp(t) => serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ConditionValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ConditionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ConditionValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<Vec<String>> for ConditionValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<Vec<&str>> for ConditionValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(String::from).collect())
    }
}

impl From<DateTime<Utc>> for ConditionValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

struct GlobalConditionKey {
    family: ConditionKeyFamily,
    default_op: Option<Operator>,
}

impl GlobalConditionKey {
    fn of(family: ConditionKeyFamily) -> Self {
        Self {
            family,
            default_op: None,
        }
    }

    fn with_default(family: ConditionKeyFamily, default_op: Operator) -> Self {
        Self {
            family,
            default_op: Some(default_op),
        }
    }
}

lazy_static! {
    /// The global `aws:` condition keys and their documented default
    /// operators, where those differ from the family default.
    static ref GLOBAL_CONDITION_KEYS: BTreeMap<&'static str, GlobalConditionKey> = BTreeMap::from([
        (
            "aws:CalledVia",
            GlobalConditionKey::with_default(ConditionKeyFamily::String, Operator::string_equals().for_any_value()),
        ),
        ("aws:CalledViaFirst", GlobalConditionKey::of(ConditionKeyFamily::String)),
        ("aws:CalledViaLast", GlobalConditionKey::of(ConditionKeyFamily::String)),
        (
            "aws:CurrentTime",
            GlobalConditionKey::with_default(ConditionKeyFamily::Date, Operator::date_less_than_equals()),
        ),
        (
            "aws:EpochTime",
            GlobalConditionKey::with_default(ConditionKeyFamily::Date, Operator::date_less_than_equals()),
        ),
        (
            "aws:MultiFactorAuthAge",
            GlobalConditionKey::with_default(ConditionKeyFamily::Numeric, Operator::numeric_less_than()),
        ),
        ("aws:MultiFactorAuthPresent", GlobalConditionKey::of(ConditionKeyFamily::Boolean)),
        ("aws:PrincipalAccount", GlobalConditionKey::of(ConditionKeyFamily::String)),
        (
            "aws:PrincipalArn",
            GlobalConditionKey::with_default(ConditionKeyFamily::Arn, Operator::arn_like()),
        ),
        ("aws:PrincipalOrgID", GlobalConditionKey::of(ConditionKeyFamily::String)),
        (
            "aws:PrincipalOrgPaths",
            GlobalConditionKey::with_default(ConditionKeyFamily::String, Operator::string_equals()),
        ),
        ("aws:PrincipalTag/${TagKey}", GlobalConditionKey::of(ConditionKeyFamily::String)),
        (
            "aws:PrincipalType",
            GlobalConditionKey::with_default(ConditionKeyFamily::String, Operator::string_equals()),
        ),
        ("aws:Referer", GlobalConditionKey::of(ConditionKeyFamily::String)),
        ("aws:RequestTag/${TagKey}", GlobalConditionKey::of(ConditionKeyFamily::String)),
        (
            "aws:RequestedRegion",
            GlobalConditionKey::with_default(ConditionKeyFamily::String, Operator::string_equals()),
        ),
        ("aws:ResourceTag/${TagKey}", GlobalConditionKey::of(ConditionKeyFamily::String)),
        ("aws:SecureTransport", GlobalConditionKey::of(ConditionKeyFamily::Boolean)),
        ("aws:SourceAccount", GlobalConditionKey::of(ConditionKeyFamily::String)),
        (
            "aws:SourceArn",
            GlobalConditionKey::with_default(ConditionKeyFamily::Arn, Operator::arn_like()),
        ),
        ("aws:SourceIp", GlobalConditionKey::of(ConditionKeyFamily::IpAddr)),
        (
            "aws:SourceVpc",
            GlobalConditionKey::with_default(ConditionKeyFamily::String, Operator::string_equals()),
        ),
        ("aws:SourceVpce", GlobalConditionKey::of(ConditionKeyFamily::String)),
        ("aws:TagKeys", GlobalConditionKey::of(ConditionKeyFamily::String)),
        (
            "aws:TokenIssueTime",
            GlobalConditionKey::with_default(ConditionKeyFamily::Date, Operator::date_greater_than_equals()),
        ),
        ("aws:UserAgent", GlobalConditionKey::of(ConditionKeyFamily::String)),
        ("aws:ViaAWSService", GlobalConditionKey::of(ConditionKeyFamily::Boolean)),
        ("aws:VpcSourceIp", GlobalConditionKey::of(ConditionKeyFamily::IpAddr)),
        ("aws:userid", GlobalConditionKey::of(ConditionKeyFamily::String)),
        ("aws:username", GlobalConditionKey::of(ConditionKeyFamily::String)),
    ]);
}

/// Whether a (possibly parametric) key template covers a resolved key:
/// `aws:ResourceTag/${TagKey}` covers `aws:ResourceTag/env`.
pub(crate) fn template_matches(template: &str, key: &str) -> bool {
    match PLACEHOLDER.find(template) {
        None => template == key,
        Some(m) => {
            let prefix = &template[..m.start()];
            let suffix = &template[m.end()..];
            key.len() > prefix.len() + suffix.len() && key.starts_with(prefix) && key.ends_with(suffix)
        }
    }
}

/// A condition request normalized into its canonical `{key, value, operator}`
/// triple: the key is fully resolved (service prefix applied, parametric
/// segment substituted) and the operator is the caller's or the key's
/// documented default.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConditionSpec {
    key: String,
    value: ConditionValue,
    operator: Operator,
}

impl ConditionSpec {
    /// Normalize a condition request against a service's tables.
    ///
    /// A key without a `:` is prefixed with the service prefix. A parametric
    /// key requires `param`, which replaces the `${...}` segment before
    /// storage; distinct parameters produce distinct condition entries.
    pub fn build<V: Into<ConditionValue>>(
        service: &ServiceSpec,
        key: &str,
        param: Option<&str>,
        value: V,
        operator: Option<Operator>,
    ) -> Result<Self, StanzaError> {
        let key = resolve_key(service.prefix(), key, param)?;
        let operator = operator.unwrap_or_else(|| default_operator_for(service, &key));

        Ok(Self {
            key,
            value: value.into(),
            operator,
        })
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &ConditionValue {
        &self.value
    }

    #[inline]
    pub fn operator(&self) -> &Operator {
        &self.operator
    }
}

fn resolve_key(prefix: &str, key: &str, param: Option<&str>) -> Result<String, StanzaError> {
    let mut key = if key.contains(':') {
        key.to_string()
    } else {
        format!("{}:{}", prefix, key)
    };

    if let Some(param) = param {
        match PLACEHOLDER.find(&key).map(|m| m.range()) {
            Some(range) => key.replace_range(range, param),
            None => {
                debug!("Condition key '{}' takes no parameter", key);
                return Err(StanzaError::InvalidConditionKey(key));
            }
        }
    }

    if PLACEHOLDER.is_match(&key) {
        debug!("Condition key '{}' requires a parameter", key);
        return Err(StanzaError::InvalidConditionKey(key));
    }

    Ok(key)
}

fn default_operator_for(service: &ServiceSpec, key: &str) -> Operator {
    if let Some(spec) = service.condition_key(key) {
        return spec.family().default_operator();
    }

    for (template, global) in GLOBAL_CONDITION_KEYS.iter() {
        if template_matches(template, key) {
            return global.default_op.clone().unwrap_or_else(|| global.family.default_operator());
        }
    }

    ConditionKeyFamily::String.default_operator()
}

/// The conditions of a statement, grouped by operator for the wire format:
/// `{ "<Operator>": { "<key>": <value> } }`.
///
/// A key lives in at most one operator group. Re-inserting a key replaces
/// its previous value and operator (last-write-wins), even when the new
/// operator differs.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConditionSet {
    map: BTreeMap<String, BTreeMap<String, ConditionValue>>,
}

impl ConditionSet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, spec: ConditionSpec) {
        let operator = spec.operator.to_string();
        self.map.retain(|_, keys| {
            keys.remove(&spec.key);
            !keys.is_empty()
        });
        self.map.entry(operator).or_default().insert(spec.key, spec.value);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The number of condition keys across all operator groups.
    pub fn len(&self) -> usize {
        self.map.values().map(BTreeMap::len).sum()
    }

    pub fn get(&self, operator: &str, key: &str) -> Option<&ConditionValue> {
        self.map.get(operator).and_then(|keys| keys.get(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &ConditionValue)> {
        self.map
            .iter()
            .flat_map(|(operator, keys)| keys.iter().map(move |(key, value)| (operator.as_str(), key.as_str(), value)))
    }
}

impl Serialize for ConditionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.map.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use {
        crate::{
            ConditionKeyFamily, ConditionKeySpec, ConditionSet, ConditionSpec, ConditionValue, Operator, ServiceSpec,
            StanzaError,
        },
        chrono::{TimeZone, Utc},
        pretty_assertions::assert_eq,
    };

    fn widgets() -> ServiceSpec {
        ServiceSpec::new("widgets")
            .with_condition_key(
                ConditionKeySpec::builder().name("widgets:Owner").family(ConditionKeyFamily::String).build().unwrap(),
            )
            .with_condition_key(
                ConditionKeySpec::builder().name("widgets:Shared").family(ConditionKeyFamily::Boolean).build().unwrap(),
            )
            .with_condition_key(
                ConditionKeySpec::builder()
                    .name("widgets:PartTag/${TagKey}")
                    .family(ConditionKeyFamily::String)
                    .build()
                    .unwrap(),
            )
    }

    #[test_log::test]
    fn test_default_operator_per_family() {
        let spec = ConditionSpec::build(&widgets(), "widgets:Owner", None, "prod", None).unwrap();
        assert_eq!(spec.operator().to_string(), "StringLike");

        let spec = ConditionSpec::build(&widgets(), "widgets:Shared", None, true, None).unwrap();
        assert_eq!(spec.operator().to_string(), "Bool");

        // The default comes from the key table, not from the value's type.
        let spec = ConditionSpec::build(&widgets(), "widgets:Owner", None, true, None).unwrap();
        assert_eq!(spec.operator().to_string(), "StringLike");
    }

    #[test_log::test]
    fn test_global_key_defaults() {
        let spec = ConditionSpec::build(&widgets(), "aws:SourceArn", None, "arn:aws:s3:::bucket", None).unwrap();
        assert_eq!(spec.operator().to_string(), "ArnLike");

        let spec = ConditionSpec::build(&widgets(), "aws:SourceIp", None, "203.0.113.0/24", None).unwrap();
        assert_eq!(spec.operator().to_string(), "IpAddress");

        let spec = ConditionSpec::build(&widgets(), "aws:SecureTransport", None, true, None).unwrap();
        assert_eq!(spec.operator().to_string(), "Bool");

        let spec = ConditionSpec::build(&widgets(), "aws:CalledVia", None, "athena.amazonaws.com", None).unwrap();
        assert_eq!(spec.operator().to_string(), "ForAnyValue:StringEquals");

        let spec = ConditionSpec::build(&widgets(), "aws:MultiFactorAuthAge", None, 3600, None).unwrap();
        assert_eq!(spec.operator().to_string(), "NumericLessThan");

        // Unknown keys fall back to the string family.
        let spec = ConditionSpec::build(&widgets(), "other:Key", None, "v", None).unwrap();
        assert_eq!(spec.operator().to_string(), "StringLike");
    }

    #[test_log::test]
    fn test_bare_key_gets_service_prefix() {
        let spec = ConditionSpec::build(&widgets(), "Owner", None, "alice", None).unwrap();
        assert_eq!(spec.key(), "widgets:Owner");
        assert_eq!(spec.operator().to_string(), "StringLike");
    }

    #[test_log::test]
    fn test_parametric_key_substitution() {
        let spec = ConditionSpec::build(&widgets(), "aws:ResourceTag/${TagKey}", Some("env"), "prod", None).unwrap();
        assert_eq!(spec.key(), "aws:ResourceTag/env");
        assert_eq!(spec.operator().to_string(), "StringLike");

        // Distinct parameters produce distinct entries.
        let other = ConditionSpec::build(&widgets(), "aws:ResourceTag/${TagKey}", Some("team"), "a", None).unwrap();
        let mut set = ConditionSet::new();
        set.insert(spec);
        set.insert(other);
        assert_eq!(set.len(), 2);
    }

    #[test_log::test]
    fn test_parametric_key_errors() {
        let e = ConditionSpec::build(&widgets(), "widgets:Owner", Some("env"), "v", None).unwrap_err();
        assert_eq!(e, StanzaError::InvalidConditionKey("widgets:Owner".to_string()));

        let e = ConditionSpec::build(&widgets(), "aws:ResourceTag/${TagKey}", None, "v", None).unwrap_err();
        assert_eq!(e, StanzaError::InvalidConditionKey("aws:ResourceTag/${TagKey}".to_string()));
    }

    #[test_log::test]
    fn test_last_write_wins() {
        let mut set = ConditionSet::new();
        set.insert(ConditionSpec::build(&widgets(), "widgets:Owner", None, "alice", None).unwrap());
        set.insert(ConditionSpec::build(&widgets(), "widgets:Owner", None, "bob", None).unwrap());

        assert_eq!(set.len(), 1);
        assert_eq!(set.get("StringLike", "widgets:Owner"), Some(&ConditionValue::String("bob".to_string())));
    }

    #[test_log::test]
    fn test_last_write_wins_across_operators() {
        let mut set = ConditionSet::new();
        set.insert(ConditionSpec::build(&widgets(), "widgets:Owner", None, "alice", None).unwrap());
        set.insert(
            ConditionSpec::build(&widgets(), "widgets:Owner", None, "bob", Some(Operator::string_equals())).unwrap(),
        );

        assert_eq!(set.len(), 1);
        assert_eq!(set.get("StringLike", "widgets:Owner"), None);
        assert_eq!(set.get("StringEquals", "widgets:Owner"), Some(&ConditionValue::String("bob".to_string())));
    }

    #[test_log::test]
    fn test_operator_grouping_on_wire() {
        let mut set = ConditionSet::new();
        set.insert(
            ConditionSpec::build(&widgets(), "widgets:Owner", None, "alice", Some(Operator::string_equals())).unwrap(),
        );
        set.insert(
            ConditionSpec::build(&widgets(), "aws:PrincipalOrgID", None, "o-1234567", Some(Operator::string_equals()))
                .unwrap(),
        );
        set.insert(ConditionSpec::build(&widgets(), "aws:SecureTransport", None, true, None).unwrap());

        assert_eq!(
            serde_json::to_string(&set).unwrap(),
            r#"{"Bool":{"aws:SecureTransport":"true"},"StringEquals":{"aws:PrincipalOrgID":"o-1234567","widgets:Owner":"alice"}}"#
        );
    }

    #[test_log::test]
    fn test_value_normalization() {
        assert_eq!(serde_json::to_string(&ConditionValue::from("x")).unwrap(), r#""x""#);
        assert_eq!(serde_json::to_string(&ConditionValue::from(true)).unwrap(), r#""true""#);
        assert_eq!(serde_json::to_string(&ConditionValue::from(false)).unwrap(), r#""false""#);
        assert_eq!(serde_json::to_string(&ConditionValue::from(42)).unwrap(), r#""42""#);
        assert_eq!(
            serde_json::to_string(&ConditionValue::from(vec!["a", "b"])).unwrap(),
            r#"["a","b"]"#
        );

        let when = Utc.with_ymd_and_hms(2020, 4, 1, 0, 0, 0).unwrap();
        assert_eq!(serde_json::to_string(&ConditionValue::from(when)).unwrap(), r#""2020-04-01T00:00:00Z""#);
    }
}
