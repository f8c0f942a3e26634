use std::collections::HashMap;

/// One entry returned by a directory search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub dn: String,
    pub attrs: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attrs: HashMap::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, values: &[&str]) -> Self {
        self.attrs.insert(
            name.to_string(),
            values.iter().map(|value| value.to_string()).collect(),
        );
        self
    }

    /// Attribute names are matched case-insensitively, as LDAP does.
    pub fn values(&self, name: &str) -> &[String] {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeChange {
    Add { attribute: String, values: Vec<String> },
    Delete { attribute: String, values: Vec<String> },
    Replace { attribute: String, values: Vec<String> },
}

impl AttributeChange {
    pub fn delete_value(attribute: &str, value: &str) -> Self {
        Self::Delete {
            attribute: attribute.to_string(),
            values: vec![value.to_string()],
        }
    }
}

/// Outcome of a modify or delete call as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    pub code: u32,
    pub text: String,
}

impl OperationResult {
    pub fn success() -> Self {
        Self {
            code: 0,
            text: String::new(),
        }
    }

    pub fn new(code: u32, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    pub fn description(&self) -> &'static str {
        result_code_description(self.code)
    }
}

impl std::fmt::Display for OperationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.text.is_empty() {
            write!(f, "{} ({})", self.description(), self.code)
        } else {
            write!(f, "{} ({}): {}", self.description(), self.code, self.text)
        }
    }
}

pub const SIZE_LIMIT_EXCEEDED: u32 = 4;

/// RFC 4511 result code names.
pub fn result_code_description(code: u32) -> &'static str {
    match code {
        0 => "success",
        1 => "operationsError",
        2 => "protocolError",
        3 => "timeLimitExceeded",
        4 => "sizeLimitExceeded",
        7 => "authMethodNotSupported",
        8 => "strongerAuthRequired",
        10 => "referral",
        11 => "adminLimitExceeded",
        16 => "noSuchAttribute",
        17 => "undefinedAttributeType",
        18 => "inappropriateMatching",
        19 => "constraintViolation",
        20 => "attributeOrValueExists",
        21 => "invalidAttributeSyntax",
        32 => "noSuchObject",
        34 => "invalidDNSyntax",
        48 => "inappropriateAuthentication",
        49 => "invalidCredentials",
        50 => "insufficientAccessRights",
        51 => "busy",
        52 => "unavailable",
        53 => "unwillingToPerform",
        64 => "namingViolation",
        65 => "objectClassViolation",
        66 => "notAllowedOnNonLeaf",
        67 => "notAllowedOnRDN",
        68 => "entryAlreadyExists",
        80 => "other",
        _ => "unknown",
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("unable to connect to {url}: {reason}")]
    Connect { url: String, reason: String },
    #[error("bind as {dn} failed: {reason}")]
    Bind { dn: String, reason: String },
    #[error("{operation} on {target} failed: {reason}")]
    Operation {
        operation: &'static str,
        target: String,
        reason: String,
    },
    #[error("search under {base} hit the server size limit after {returned} entries")]
    SizeLimit { base: String, returned: usize },
    #[error("directory runtime unavailable: {0}")]
    Runtime(String),
}

impl DirectoryError {
    pub fn operation(operation: &'static str, target: &str, reason: impl ToString) -> Self {
        Self::Operation {
            operation,
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }
}
