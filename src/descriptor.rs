use {
    crate::{
        arn::ArnTemplate,
        condition::{template_matches, ConditionKeyFamily},
    },
    derive_builder::Builder,
    serde::{Deserialize, Serialize},
    std::{
        collections::BTreeMap,
        fmt::{Display, Formatter, Result as FmtResult},
    },
};

/// Access classification of an action. Informational; the builder does not
/// enforce it.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum AccessLevel {
    Read,
    Write,
    List,
    Tagging,
    PermissionsManagement,
}

impl Display for AccessLevel {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::Read => f.write_str("Read"),
            Self::Write => f.write_str("Write"),
            Self::List => f.write_str("List"),
            Self::Tagging => f.write_str("Tagging"),
            Self::PermissionsManagement => f.write_str("Permissions management"),
        }
    }
}

/// Association between an action and a resource type it can be scoped to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResourceTypeAssociation {
    name: String,
    required: bool,
}

impl ResourceTypeAssociation {
    pub fn required<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }

    pub fn optional<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// One entry of a service's action table. Immutable once the table is built;
/// the generated catalog layer constructs these through
/// [ActionDescriptorBuilder].
#[derive(Builder, Clone, Debug, Eq, PartialEq)]
#[builder(setter(into))]
pub struct ActionDescriptor {
    /// Canonical action name, case-preserving (`CreateWidget`).
    name: String,

    access_level: AccessLevel,

    /// Resource types this action can be scoped to, each flagged
    /// required/optional.
    #[builder(default)]
    resource_types: Vec<ResourceTypeAssociation>,

    /// Condition keys the action supports.
    #[builder(default)]
    condition_keys: Vec<String>,

    /// Documentation URL. Ignored by the engine.
    #[builder(setter(into, strip_option), default)]
    doc_url: Option<String>,
}

impl ActionDescriptor {
    pub fn builder() -> ActionDescriptorBuilder {
        ActionDescriptorBuilder::default()
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn access_level(&self) -> AccessLevel {
        self.access_level
    }

    #[inline]
    pub fn resource_types(&self) -> &[ResourceTypeAssociation] {
        &self.resource_types
    }

    #[inline]
    pub fn condition_keys(&self) -> &[String] {
        &self.condition_keys
    }

    #[inline]
    pub fn doc_url(&self) -> Option<&str> {
        self.doc_url.as_deref()
    }
}

/// One entry of a service's resource-type table.
#[derive(Builder, Clone, Debug, Eq, PartialEq)]
#[builder(setter(into))]
pub struct ResourceTypeDescriptor {
    name: String,

    arn_template: ArnTemplate,

    /// Condition keys that apply when policy scope targets this resource
    /// type.
    #[builder(default)]
    condition_keys: Vec<String>,

    #[builder(setter(into, strip_option), default)]
    doc_url: Option<String>,
}

impl ResourceTypeDescriptor {
    pub fn builder() -> ResourceTypeDescriptorBuilder {
        ResourceTypeDescriptorBuilder::default()
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn arn_template(&self) -> &ArnTemplate {
        &self.arn_template
    }

    #[inline]
    pub fn condition_keys(&self) -> &[String] {
        &self.condition_keys
    }

    #[inline]
    pub fn doc_url(&self) -> Option<&str> {
        self.doc_url.as_deref()
    }
}

/// A service-specific condition key. The name may contain a parametric
/// segment (`widgets:PartTag/${TagKey}`) filled in at attachment time.
#[derive(Builder, Clone, Debug, Eq, PartialEq)]
#[builder(setter(into))]
pub struct ConditionKeySpec {
    name: String,

    family: ConditionKeyFamily,

    #[builder(setter(into, strip_option), default)]
    doc_url: Option<String>,
}

impl ConditionKeySpec {
    pub fn builder() -> ConditionKeySpecBuilder {
        ConditionKeySpecBuilder::default()
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn family(&self) -> ConditionKeyFamily {
        self.family
    }

    #[inline]
    pub fn doc_url(&self) -> Option<&str> {
        self.doc_url.as_deref()
    }
}

/// The read-only descriptor tables for one service: the action table, the
/// resource-type table, and the service's condition keys. Built once by the
/// generated catalog layer (typically inside `lazy_static!`) and never
/// mutated, so shared references are safe across threads.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ServiceSpec {
    prefix: String,
    actions: BTreeMap<String, ActionDescriptor>,
    resource_types: BTreeMap<String, ResourceTypeDescriptor>,
    condition_keys: Vec<ConditionKeySpec>,
}

impl ServiceSpec {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        Self {
            prefix: prefix.into(),
            actions: BTreeMap::new(),
            resource_types: BTreeMap::new(),
            condition_keys: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: ActionDescriptor) -> Self {
        self.actions.insert(action.name().to_string(), action);
        self
    }

    pub fn with_resource_type(mut self, resource_type: ResourceTypeDescriptor) -> Self {
        self.resource_types.insert(resource_type.name().to_string(), resource_type);
        self
    }

    pub fn with_condition_key(mut self, condition_key: ConditionKeySpec) -> Self {
        self.condition_keys.push(condition_key);
        self
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Look up an action by its canonical name. Case-sensitive.
    #[inline]
    pub fn action(&self, name: &str) -> Option<&ActionDescriptor> {
        self.actions.get(name)
    }

    #[inline]
    pub fn resource_type(&self, name: &str) -> Option<&ResourceTypeDescriptor> {
        self.resource_types.get(name)
    }

    /// Find the condition-key spec covering `key`, accounting for parametric
    /// segments (`widgets:PartTag/${TagKey}` covers `widgets:PartTag/env`).
    pub fn condition_key(&self, key: &str) -> Option<&ConditionKeySpec> {
        self.condition_keys.iter().find(|spec| template_matches(spec.name(), key))
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionDescriptor> {
        self.actions.values()
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &ResourceTypeDescriptor> {
        self.resource_types.values()
    }
}

#[cfg(test)]
mod tests {
    use {
        crate::{
            AccessLevel, ActionDescriptor, ConditionKeyFamily, ConditionKeySpec, ResourceTypeAssociation,
            ResourceTypeDescriptor, ServiceSpec,
        },
        pretty_assertions::assert_eq,
    };

    fn widgets() -> ServiceSpec {
        ServiceSpec::new("widgets")
            .with_action(
                ActionDescriptor::builder()
                    .name("CreateWidget")
                    .access_level(AccessLevel::Write)
                    .resource_types(vec![ResourceTypeAssociation::required("widget")])
                    .condition_keys(vec!["aws:RequestTag/${TagKey}".to_string(), "aws:TagKeys".to_string()])
                    .doc_url("https://docs.example.test/widgets/CreateWidget")
                    .build()
                    .unwrap(),
            )
            .with_resource_type(
                ResourceTypeDescriptor::builder()
                    .name("widget")
                    .arn_template("arn:${Partition}:widgets:${Region}:${Account}:widget/${WidgetId}")
                    .condition_keys(vec!["aws:ResourceTag/${TagKey}".to_string()])
                    .build()
                    .unwrap(),
            )
            .with_condition_key(
                ConditionKeySpec::builder().name("widgets:Owner").family(ConditionKeyFamily::String).build().unwrap(),
            )
    }

    #[test_log::test]
    fn test_lookup_is_case_sensitive() {
        let spec = widgets();
        assert!(spec.action("CreateWidget").is_some());
        assert!(spec.action("createwidget").is_none());
        assert!(spec.action("CREATEWIDGET").is_none());
    }

    #[test_log::test]
    fn test_action_descriptor() {
        let spec = widgets();
        let action = spec.action("CreateWidget").unwrap();
        assert_eq!(action.name(), "CreateWidget");
        assert_eq!(action.access_level(), AccessLevel::Write);
        assert_eq!(action.resource_types().len(), 1);
        assert_eq!(action.resource_types()[0].name(), "widget");
        assert!(action.resource_types()[0].is_required());
        assert_eq!(action.condition_keys().len(), 2);
        assert_eq!(action.doc_url(), Some("https://docs.example.test/widgets/CreateWidget"));
    }

    #[test_log::test]
    fn test_resource_type_descriptor() {
        let spec = widgets();
        let rt = spec.resource_type("widget").unwrap();
        assert_eq!(rt.name(), "widget");
        assert_eq!(rt.arn_template().identifier_names(), vec!["WidgetId"]);
        assert_eq!(rt.condition_keys(), &["aws:ResourceTag/${TagKey}".to_string()]);
        assert_eq!(rt.doc_url(), None);
        assert!(spec.resource_type("gadget").is_none());
    }

    #[test_log::test]
    fn test_condition_key_template_lookup() {
        let spec = widgets();
        assert!(spec.condition_key("widgets:Owner").is_some());
        assert!(spec.condition_key("widgets:Other").is_none());
        assert_eq!(spec.condition_key("widgets:Owner").unwrap().family(), ConditionKeyFamily::String);
    }

    #[test_log::test]
    fn test_access_level_display() {
        assert_eq!(AccessLevel::Read.to_string(), "Read");
        assert_eq!(AccessLevel::PermissionsManagement.to_string(), "Permissions management");
    }

    #[test_log::test]
    fn test_missing_required_field() {
        let e = ActionDescriptor::builder().name("CreateWidget").build();
        assert!(e.is_err());
    }
}
