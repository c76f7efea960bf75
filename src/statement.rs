use {
    crate::{
        arn::ResourceScope,
        condition::{ConditionSet, ConditionSpec, ConditionValue},
        descriptor::{AccessLevel, ActionDescriptor, ServiceSpec},
        display_json,
        serutil::ScalarOrList,
        Effect, Operator, StanzaError,
    },
    log::debug,
    regex::Regex,
    serde::{
        ser::{SerializeMap, Serializer},
        Serialize,
    },
    serde_json::Value,
    std::collections::BTreeSet,
};

/// A finalized policy statement. Produced by [StatementBuilder::build];
/// serialization is a pure read of the accumulated state and may be repeated.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Statement {
    sid: Option<String>,
    effect: Effect,
    actions: Vec<String>,
    resources: Vec<String>,
    conditions: ConditionSet,
}

impl Statement {
    #[inline]
    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    #[inline]
    pub fn effect(&self) -> Effect {
        self.effect
    }

    #[inline]
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    #[inline]
    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    #[inline]
    pub fn conditions(&self) -> &ConditionSet {
        &self.conditions
    }

    /// The statement as a JSON value, ready to be placed into a policy
    /// document's `Statement` array.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl Serialize for Statement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let sid = self.sid.as_deref().filter(|sid| !sid.is_empty());

        let mut len = 3;
        if sid.is_some() {
            len += 1;
        }
        if !self.conditions.is_empty() {
            len += 1;
        }

        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(sid) = sid {
            map.serialize_entry("Sid", sid)?;
        }
        map.serialize_entry("Effect", &self.effect)?;
        map.serialize_entry("Action", &ScalarOrList(&self.actions))?;
        if self.resources.is_empty() {
            // An empty resource set scopes the statement to all resources.
            map.serialize_entry("Resource", "*")?;
        } else {
            map.serialize_entry("Resource", &ScalarOrList(&self.resources))?;
        }
        if !self.conditions.is_empty() {
            map.serialize_entry("Condition", &self.conditions)?;
        }
        map.end()
    }
}

display_json!(Statement);

/// Fluent builder assembling a [Statement] against one service's descriptor
/// tables. Every mutator consumes the builder and returns it (or an error),
/// so calls chain left to right with `?`:
///
/// ```
/// use stanza::{ServiceSpec, StanzaError, StatementBuilder};
///
/// fn build(widgets: &ServiceSpec) -> Result<(), StanzaError> {
///     let statement = StatementBuilder::new(widgets)
///         .sid("AllowWidgetReads")
///         .action("GetWidget")?
///         .resource("widget", &["42"])?
///         .condition("aws:SecureTransport", true)?
///         .build()?;
///     println!("{}", statement);
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct StatementBuilder<'a> {
    service: &'a ServiceSpec,
    sid: Option<String>,
    effect: Effect,
    actions: Vec<String>,
    resources: Vec<String>,
    conditions: ConditionSet,
    applicable_resource_types: BTreeSet<String>,
    applicable_condition_keys: BTreeSet<String>,
    strict: bool,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(service: &'a ServiceSpec) -> Self {
        Self {
            service,
            sid: None,
            effect: Effect::default(),
            actions: Vec::new(),
            resources: Vec::new(),
            conditions: ConditionSet::new(),
            applicable_resource_types: BTreeSet::new(),
            applicable_condition_keys: BTreeSet::new(),
            strict: false,
        }
    }

    /// Set or overwrite the statement id. No format constraint is enforced
    /// here; document assemblers commonly require `^[a-zA-Z0-9]+$`.
    pub fn sid<S: Into<String>>(mut self, sid: S) -> Self {
        self.sid = Some(sid.into());
        self
    }

    pub fn allow(mut self) -> Self {
        self.effect = Effect::Allow;
        self
    }

    pub fn deny(mut self) -> Self {
        self.effect = Effect::Deny;
        self
    }

    /// Make [StatementBuilder::build] fail with
    /// [StanzaError::EmptyStatement] if no actions were selected.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Select one action by its canonical, case-sensitive name. Selecting
    /// the same action twice is idempotent.
    pub fn action(mut self, name: &str) -> Result<Self, StanzaError> {
        let service = self.service;
        let descriptor = service.action(name).ok_or_else(|| {
            debug!("Service '{}' has no action '{}'", service.prefix(), name);
            StanzaError::UnknownAction(format!("{}:{}", service.prefix(), name))
        })?;

        let qualified = format!("{}:{}", service.prefix(), descriptor.name());
        if !self.actions.contains(&qualified) {
            self.actions.push(qualified);
        }
        self.record(descriptor);
        Ok(self)
    }

    /// Select every action of the service as the `prefix:*` wildcard.
    pub fn all_actions(mut self) -> Self {
        let service = self.service;
        let qualified = format!("{}:*", service.prefix());
        if !self.actions.contains(&qualified) {
            self.actions.push(qualified);
        }
        for descriptor in service.actions() {
            self.record(descriptor);
        }
        self
    }

    /// Select every action carrying the given access level, in table order.
    pub fn actions_with_access_level(mut self, level: AccessLevel) -> Self {
        let service = self.service;
        for descriptor in service.actions() {
            if descriptor.access_level() == level {
                let qualified = format!("{}:{}", service.prefix(), descriptor.name());
                if !self.actions.contains(&qualified) {
                    self.actions.push(qualified);
                }
                self.record(descriptor);
            }
        }
        self
    }

    /// Select every action whose canonical name matches the pattern, in
    /// table order.
    pub fn actions_matching(mut self, pattern: &Regex) -> Self {
        let service = self.service;
        for descriptor in service.actions() {
            if pattern.is_match(descriptor.name()) {
                let qualified = format!("{}:{}", service.prefix(), descriptor.name());
                if !self.actions.contains(&qualified) {
                    self.actions.push(qualified);
                }
                self.record(descriptor);
            }
        }
        self
    }

    fn record(&mut self, descriptor: &ActionDescriptor) {
        for association in descriptor.resource_types() {
            self.applicable_resource_types.insert(association.name().to_string());
        }
        for key in descriptor.condition_keys() {
            self.applicable_condition_keys.insert(key.clone());
        }
    }

    /// Target a resource of the named type, with wildcard account/region and
    /// the `aws` partition.
    pub fn resource(self, resource_type: &str, identifiers: &[&str]) -> Result<Self, StanzaError> {
        self.resource_in(resource_type, identifiers, &ResourceScope::default())
    }

    /// Target a resource of the named type within an explicit scope.
    /// Resources accumulate in call order; repeated ARNs are kept as-is.
    pub fn resource_in(
        mut self,
        resource_type: &str,
        identifiers: &[&str],
        scope: &ResourceScope,
    ) -> Result<Self, StanzaError> {
        let service = self.service;
        let descriptor = service.resource_type(resource_type).ok_or_else(|| {
            debug!("Service '{}' has no resource type '{}'", service.prefix(), resource_type);
            StanzaError::UnknownResourceType(resource_type.to_string())
        })?;

        if !self.actions.is_empty() && !self.applicable_resource_types.contains(resource_type) {
            debug!("Resource type '{}' is not associated with any selected action", resource_type);
        }

        let arn = descriptor.arn_template().resolve(identifiers, scope)?;
        self.resources.push(arn);
        Ok(self)
    }

    /// Target a caller-supplied ARN verbatim.
    pub fn raw_resource<S: Into<String>>(mut self, arn: S) -> Self {
        self.resources.push(arn.into());
        self
    }

    /// Attach a condition using the key's documented default operator.
    pub fn condition<V: Into<ConditionValue>>(self, key: &str, value: V) -> Result<Self, StanzaError> {
        self.attach(key, None, value.into(), None)
    }

    /// Attach a condition with an explicit operator.
    pub fn condition_with<V: Into<ConditionValue>>(
        self,
        key: &str,
        value: V,
        operator: Operator,
    ) -> Result<Self, StanzaError> {
        self.attach(key, None, value.into(), Some(operator))
    }

    /// Attach a condition on a parametric key (`aws:ResourceTag/${TagKey}`),
    /// filling the parametric segment with `tag_key`.
    pub fn tag_condition<V: Into<ConditionValue>>(
        self,
        key: &str,
        tag_key: &str,
        value: V,
    ) -> Result<Self, StanzaError> {
        self.attach(key, Some(tag_key), value.into(), None)
    }

    /// Attach a condition on a parametric key with an explicit operator.
    pub fn tag_condition_with<V: Into<ConditionValue>>(
        self,
        key: &str,
        tag_key: &str,
        value: V,
        operator: Operator,
    ) -> Result<Self, StanzaError> {
        self.attach(key, Some(tag_key), value.into(), Some(operator))
    }

    fn attach(
        mut self,
        key: &str,
        param: Option<&str>,
        value: ConditionValue,
        operator: Option<Operator>,
    ) -> Result<Self, StanzaError> {
        let spec = ConditionSpec::build(self.service, key, param, value, operator)?;
        if !self.actions.is_empty() && !self.applicable_condition_keys.contains(spec.key()) {
            debug!("Condition key '{}' is not listed for any selected action", spec.key());
        }
        self.conditions.insert(spec);
        Ok(self)
    }

    /// Resource types associated with the selected actions so far.
    #[inline]
    pub fn applicable_resource_types(&self) -> &BTreeSet<String> {
        &self.applicable_resource_types
    }

    /// Condition keys listed for the selected actions so far.
    #[inline]
    pub fn applicable_condition_keys(&self) -> &BTreeSet<String> {
        &self.applicable_condition_keys
    }

    /// Finalize the accumulated state into a [Statement].
    pub fn build(self) -> Result<Statement, StanzaError> {
        if self.strict && self.actions.is_empty() {
            return Err(StanzaError::EmptyStatement);
        }

        Ok(Statement {
            sid: self.sid,
            effect: self.effect,
            actions: self.actions,
            resources: self.resources,
            conditions: self.conditions,
        })
    }
}
