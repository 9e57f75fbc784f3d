//! Stable, human readable identifiers for geographic features.
//!
//! An identifier such as `R-9140-172` is made of a feature class
//! prefix, the code of the grid cell holding the feature's centroid,
//! and a counter unique within that prefix and cell. Once written, an
//! identifier is never changed: allocation only labels features which
//! don't have one yet.

mod alphabet;
mod allocator;
mod check;
mod collection;
mod counter;
mod error;
mod grid;
mod identifier;

pub use crate::{
    alphabet::{
        Alphabet, Base, BASE_B10, BASE_B14, BASE_B16, BASE_B32_CAPS, BASE_B32_LOWER, SEPARATOR,
    },
    allocator::{AllocationReport, Allocator, Assignment, Candidate, Scheme, Warning},
    check::{check, CheckReport},
    collection::{FeatureCollection, StoredIdentifier, DEFAULT_FIELD},
    counter::CounterEncoder,
    error::{GridIdError, Result},
    grid::{GridCode, GridEncoder, GridLayout, GRID_CODE_LEN},
    identifier::{validate_prefix, Identifier, ParsedIdentifier},
};
pub use geo;
