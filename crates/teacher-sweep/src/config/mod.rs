use std::env;
use std::fmt;

const DEFAULT_LDAP_URL: &str = "ldap://localhost:389";
const DEFAULT_BASE_DN: &str = "dc=instituto,dc=extremadura,dc=es";
const DEFAULT_PEOPLE_OU: &str = "ou=People";
const DEFAULT_GROUP_OU: &str = "ou=Group";
const DEFAULT_TEACHER_HOME_PREFIX: &str = "/home/profesor";

/// What to do when the read-only inventory query cannot reach the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryPolicy {
    /// Treat the directory as empty and keep going.
    FailOpen,
    /// Abort the run before any candidate is considered.
    FailClosed,
}

impl InventoryPolicy {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" | "fail-open" => Ok(Self::FailOpen),
            "closed" | "fail-closed" => Ok(Self::FailClosed),
            other => Err(ConfigError::InvalidInventoryPolicy(other.to_string())),
        }
    }
}

/// Top-level configuration for a reconciliation run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub directory: DirectoryConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let url = env::var("LDAP_URL").unwrap_or_else(|_| DEFAULT_LDAP_URL.to_string());
        let base_dn = env::var("LDAP_BASE_DN").unwrap_or_else(|_| DEFAULT_BASE_DN.to_string());
        let people_ou =
            env::var("LDAP_PEOPLE_OU").unwrap_or_else(|_| DEFAULT_PEOPLE_OU.to_string());
        let group_ou = env::var("LDAP_GROUP_OU").unwrap_or_else(|_| DEFAULT_GROUP_OU.to_string());
        let admin_dn =
            env::var("LDAP_ADMIN_DN").unwrap_or_else(|_| format!("cn=admin,ou=people,{base_dn}"));
        let admin_password = env::var("LDAP_ADMIN_PASSWORD").unwrap_or_default();
        let teacher_home_prefix = env::var("TEACHER_HOME_PREFIX")
            .unwrap_or_else(|_| DEFAULT_TEACHER_HOME_PREFIX.to_string());
        let inventory_policy = match env::var("INVENTORY_ON_ERROR") {
            Ok(raw) => InventoryPolicy::parse(&raw)?,
            Err(_) => InventoryPolicy::FailOpen,
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let directory = DirectoryConfig {
            url,
            base_dn,
            people_ou,
            group_ou,
            admin_dn,
            admin_password,
            teacher_home_prefix,
            inventory_policy,
        };
        directory.validate()?;

        Ok(Self {
            directory,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Connection and layout settings for the directory service.
#[derive(Clone)]
pub struct DirectoryConfig {
    pub url: String,
    pub base_dn: String,
    pub people_ou: String,
    pub group_ou: String,
    pub admin_dn: String,
    pub admin_password: String,
    pub teacher_home_prefix: String,
    pub inventory_policy: InventoryPolicy,
}

impl DirectoryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scheme_ok = ["ldap://", "ldaps://", "ldapi://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme));
        if !scheme_ok {
            return Err(ConfigError::InvalidUrl(self.url.clone()));
        }
        if self.base_dn.trim().is_empty() {
            return Err(ConfigError::EmptyBaseDn);
        }
        Ok(())
    }

    pub fn people_dn(&self) -> String {
        format!("{},{}", self.people_ou, self.base_dn)
    }

    pub fn group_dn(&self) -> String {
        format!("{},{}", self.group_ou, self.base_dn)
    }

    /// Conventional DN of an account entry. Used when the directory did not hand
    /// back a DN of its own (e.g. for `member` references).
    pub fn user_dn(&self, uid: &str) -> String {
        format!(
            "uid={},{}",
            crate::workflows::directory::escape_dn_value(uid),
            self.people_dn()
        )
    }
}

// Hand-written so the admin password never lands in logs.
impl fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("url", &self.url)
            .field("base_dn", &self.base_dn)
            .field("people_ou", &self.people_ou)
            .field("group_ou", &self.group_ou)
            .field("admin_dn", &self.admin_dn)
            .field("admin_password", &"<redacted>")
            .field("teacher_home_prefix", &self.teacher_home_prefix)
            .field("inventory_policy", &self.inventory_policy)
            .finish()
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidUrl(String),
    EmptyBaseDn,
    InvalidInventoryPolicy(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidUrl(url) => write!(
                f,
                "LDAP_URL must start with ldap://, ldaps:// or ldapi:// (got '{url}')"
            ),
            ConfigError::EmptyBaseDn => write!(f, "LDAP_BASE_DN must not be empty"),
            ConfigError::InvalidInventoryPolicy(value) => write!(
                f,
                "INVENTORY_ON_ERROR must be 'open' or 'closed' (got '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
