//! `<prefix>-<gridcode>-<countercode>` identifiers.

use crate::{
    alphabet::SEPARATOR,
    error::{GridIdError, Result},
};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier {
    pub prefix: String,
    pub grid: String,
    pub counter: String,
}

/// Outcome of parsing a stored identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedIdentifier {
    Valid(Identifier),
    Malformed { raw: String, reason: &'static str },
}

impl Identifier {
    pub fn new(prefix: impl Into<String>, grid: impl Into<String>, counter: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            grid: grid.into(),
            counter: counter.into(),
        }
    }

    /// Splits `raw` into its three parts.
    ///
    /// Exactly three non-empty, separator-delimited parts are
    /// required. Symbols are not checked against any alphabet here.
    pub fn parse(raw: &str) -> ParsedIdentifier {
        let malformed = |reason| ParsedIdentifier::Malformed {
            raw: raw.to_owned(),
            reason,
        };
        let parts: Vec<&str> = raw.split(SEPARATOR).collect();
        match parts.as_slice() {
            [prefix, grid, counter] => {
                if [prefix, grid, counter].iter().any(|part| part.is_empty()) {
                    malformed("empty part")
                } else if raw.chars().any(char::is_whitespace) {
                    malformed("contains whitespace")
                } else {
                    ParsedIdentifier::Valid(Identifier::new(*prefix, *grid, *counter))
                }
            }
            _ => malformed("expected exactly three '-' separated parts"),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            self.prefix, self.grid, self.counter
        )
    }
}

/// Checks a prefix can be used in new identifiers.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() || prefix.contains(SEPARATOR) || prefix.chars().any(char::is_whitespace) {
        Err(GridIdError::InvalidPrefix(prefix.to_owned()))
    } else {
        Ok(())
    }
}
