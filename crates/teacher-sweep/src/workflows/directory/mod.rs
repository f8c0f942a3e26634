pub mod domain;
pub mod gateway;
pub mod inventory;
pub mod ldap;

pub use domain::{
    result_code_description, AttributeChange, DirectoryEntry, DirectoryError, OperationResult,
};
pub use gateway::{DirectoryConnector, DirectorySession};
pub use inventory::{load_inventory, DirectoryAccount, DirectoryInventory};
pub use ldap::LdapDirectory;

/// Escapes a value for use inside a search filter (RFC 4515).
pub fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\5c"),
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\0' => escaped.push_str("\\00"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Escapes an attribute value for use inside a DN (RFC 4514).
pub fn escape_dn_value(value: &str) -> String {
    let count = value.chars().count();
    let mut escaped = String::with_capacity(value.len() * 2);

    for (index, ch) in value.chars().enumerate() {
        let first = index == 0;
        let last = index + 1 == count;
        match ch {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            '\0' => escaped.push_str("\\00"),
            ' ' if first || last => escaped.push_str("\\20"),
            '#' if first => escaped.push_str("\\23"),
            _ => escaped.push(ch),
        }
    }

    escaped
}
