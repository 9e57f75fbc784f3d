//! Consistency report over the identifiers of a collection.

use crate::{
    alphabet::Alphabet,
    collection::{FeatureCollection, StoredIdentifier},
    counter::CounterEncoder,
    error::Result,
    identifier::{Identifier, ParsedIdentifier},
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub total: usize,
    pub labeled: usize,
    pub unlabeled: Vec<usize>,
    /// `(index, raw value, reason)`.
    pub malformed: Vec<(usize, String, String)>,
    /// Identifiers whose counter isn't made of the alphabet's symbols.
    pub foreign_counters: Vec<(usize, String)>,
    /// Identifiers held by more than one feature, with their holders.
    pub duplicates: BTreeMap<String, Vec<usize>>,
}

impl CheckReport {
    /// True when no identifier is malformed or duplicated.
    pub fn is_clean(&self) -> bool {
        self.malformed.is_empty() && self.duplicates.is_empty()
    }
}

/// Inspects the `field` identifiers of `collection`.
pub fn check(collection: &FeatureCollection, alphabet: &Alphabet, field: &str) -> Result<CheckReport> {
    let counter = CounterEncoder::new(alphabet.clone(), 1)?;
    let mut report = CheckReport {
        total: collection.len(),
        ..CheckReport::default()
    };
    let mut holders: BTreeMap<Identifier, Vec<usize>> = BTreeMap::new();

    for index in 0..collection.len() {
        let raw = match collection.identifier(index, field) {
            StoredIdentifier::Missing => {
                report.unlabeled.push(index);
                continue;
            }
            StoredIdentifier::Other(value) => {
                report
                    .malformed
                    .push((index, value.to_string(), "not a string".to_owned()));
                continue;
            }
            StoredIdentifier::Present(raw) => raw,
        };
        report.labeled += 1;
        match Identifier::parse(&raw) {
            ParsedIdentifier::Malformed { raw, reason } => {
                report.malformed.push((index, raw, reason.to_owned()));
            }
            ParsedIdentifier::Valid(identifier) => {
                if counter.decode(&identifier.counter).is_err() {
                    report.foreign_counters.push((index, raw));
                }
                holders.entry(identifier).or_default().push(index);
            }
        }
    }

    report.duplicates = holders
        .into_iter()
        .filter(|(_, indices)| indices.len() > 1)
        .map(|(identifier, indices)| (identifier.to_string(), indices))
        .collect();
    Ok(report)
}
