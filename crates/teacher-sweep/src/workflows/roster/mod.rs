mod parser;

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Authoritative login identifiers, case-sensitive and trimmed.
pub type LoginSet = BTreeSet<String>;

#[derive(Debug)]
pub enum RosterError {
    Io(std::io::Error),
    Xml(quick_xml::Error),
    Malformed(String),
}

impl std::fmt::Display for RosterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterError::Io(err) => write!(f, "failed to read roster document: {}", err),
            RosterError::Xml(err) => write!(f, "roster document is not well-formed: {}", err),
            RosterError::Malformed(reason) => {
                write!(f, "roster document is not well-formed: {}", reason)
            }
        }
    }
}

impl std::error::Error for RosterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterError::Io(err) => Some(err),
            RosterError::Xml(err) => Some(err),
            RosterError::Malformed(_) => None,
        }
    }
}

impl From<std::io::Error> for RosterError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<quick_xml::Error> for RosterError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err)
    }
}

pub struct RosterReader;

impl RosterReader {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<LoginSet, RosterError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Teacher records without user data or with a blank login are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<LoginSet, RosterError> {
        let logins = parser::parse_logins(reader)?
            .into_iter()
            .map(|raw| raw.trim().to_string())
            .filter(|login| !login.is_empty())
            .collect();
        Ok(logins)
    }
}
