use {
    crate::StanzaError,
    lazy_static::lazy_static,
    log::debug,
    regex::Regex,
    std::fmt::{Display, Formatter, Result as FmtResult},
};

lazy_static! {
    pub(crate) static ref PLACEHOLDER: Regex = Regex::new(r"\$\{([A-Za-z0-9_]+)\}").unwrap();
}

/// Account, region, and partition of a resource. Unset (or empty) account
/// and region resolve to `*`; an unset partition resolves to `aws`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResourceScope {
    account: Option<String>,
    region: Option<String>,
    partition: Option<String>,
}

impl ResourceScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account<S: Into<String>>(mut self, account: S) -> Self {
        self.account = Some(account.into());
        self
    }

    pub fn region<S: Into<String>>(mut self, region: S) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn partition<S: Into<String>>(mut self, partition: S) -> Self {
        self.partition = Some(partition.into());
        self
    }

    fn account_segment(&self) -> &str {
        match &self.account {
            Some(account) if !account.is_empty() => account,
            _ => "*",
        }
    }

    fn region_segment(&self) -> &str {
        match &self.region {
            Some(region) if !region.is_empty() => region,
            _ => "*",
        }
    }

    fn partition_segment(&self) -> &str {
        match &self.partition {
            Some(partition) if !partition.is_empty() => partition,
            _ => "aws",
        }
    }
}

/// An ARN template containing `${Placeholder}` tokens, e.g.
/// `arn:${Partition}:widgets:${Region}:${Account}:widget/${WidgetId}`.
///
/// Resolution substitutes the service-specific placeholders first, in
/// template order, from the caller's positional identifiers, then fills
/// `${Account}`, `${Region}`, and `${Partition}` from a [ResourceScope].
/// Identifiers are substituted literally; no well-formedness check is made
/// on the result.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArnTemplate {
    template: String,
}

impl ArnTemplate {
    pub fn new<S: Into<String>>(template: S) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// The service-specific placeholder names, in template order, excluding
    /// `Partition`, `Region`, and `Account`.
    pub fn identifier_names(&self) -> Vec<&str> {
        PLACEHOLDER
            .captures_iter(&self.template)
            .map(|c| c.get(1).unwrap().as_str())
            .filter(|name| !matches!(*name, "Partition" | "Region" | "Account"))
            .collect()
    }

    /// Expand the template. A missing identifier fails with
    /// [StanzaError::UnresolvedPlaceholder] rather than leaving a literal
    /// `${...}` token in the ARN.
    pub fn resolve(&self, identifiers: &[&str], scope: &ResourceScope) -> Result<String, StanzaError> {
        let names = self.identifier_names();
        if identifiers.len() > names.len() {
            debug!(
                "Template '{}' takes {} identifier(s); ignoring {} extra",
                self.template,
                names.len(),
                identifiers.len() - names.len()
            );
        }

        let mut arn = self.template.clone();
        for (i, name) in names.iter().enumerate() {
            let token = format!("${{{}}}", name);
            match identifiers.get(i) {
                Some(value) => arn = arn.replacen(&token, value, 1),
                None => {
                    debug!("Template '{}' has no identifier for {}", self.template, token);
                    return Err(StanzaError::UnresolvedPlaceholder(token));
                }
            }
        }

        arn = arn.replacen("${Account}", scope.account_segment(), 1);
        arn = arn.replacen("${Region}", scope.region_segment(), 1);
        arn = arn.replacen("${Partition}", scope.partition_segment(), 1);

        // Identifiers pass through verbatim, so any token still present came
        // from the template itself (e.g. a malformed placeholder name).
        if let Some(m) = PLACEHOLDER.find(&arn) {
            if !identifiers.iter().any(|id| id.contains(m.as_str())) {
                return Err(StanzaError::UnresolvedPlaceholder(m.as_str().to_string()));
            }
        }

        Ok(arn)
    }
}

impl Display for ArnTemplate {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.write_str(&self.template)
    }
}

impl From<&str> for ArnTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

impl From<String> for ArnTemplate {
    fn from(template: String) -> Self {
        Self::new(template)
    }
}
