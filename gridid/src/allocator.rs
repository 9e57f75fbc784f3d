//! Identifier allocation.
//!
//! Existing identifiers reserve their `(prefix, grid)` counter slots.
//! Unlabeled features then get the lowest free counter at or above the
//! highest one already used in their cell, visiting the features of a
//! cell in ascending `lon + lat` order so reruns over the same input
//! hand out the same identifiers.

use crate::{
    alphabet::Alphabet,
    collection::{FeatureCollection, StoredIdentifier},
    counter::CounterEncoder,
    error::Result,
    grid::{GridCode, GridEncoder, GridLayout},
    identifier::{validate_prefix, Identifier, ParsedIdentifier},
};
use geo::geometry::Coord;
use geojson::JsonValue;
use log::{debug, warn};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashSet},
    fmt,
};

/// Encoding configuration shared by every identifier of a run.
#[derive(Debug, Clone)]
pub struct Scheme {
    grid: GridEncoder,
    counter: CounterEncoder,
}

impl Scheme {
    pub fn new(alphabet: Alphabet, layout: GridLayout, zero_padding: usize) -> Result<Self> {
        let counter = CounterEncoder::new(alphabet.clone(), zero_padding)?;
        let grid = GridEncoder::with_layout(alphabet, layout);
        Ok(Self { grid, counter })
    }

    pub fn grid(&self) -> &GridEncoder {
        &self.grid
    }

    pub fn counter(&self) -> &CounterEncoder {
        &self.counter
    }
}

/// An unlabeled feature waiting for an identifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Position of the feature in its collection.
    pub index: usize,
    pub centroid: Coord<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub index: usize,
    pub identifier: Identifier,
}

/// Per-feature data quality problems. None of them stop a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// Existing identifier that isn't `prefix-grid-counter`; left as
    /// is and not registered.
    Malformed {
        index: usize,
        raw: String,
        reason: &'static str,
    },
    /// Existing counter with symbols outside the alphabet; its slot is
    /// still reserved.
    Undecodable { index: usize, identifier: String },
    /// Existing identifier also held by an earlier feature.
    Duplicate { index: usize, identifier: String },
    /// Identifier property holding something other than a string.
    NotAString { index: usize, value: JsonValue },
    /// Feature without a geometry, or with an empty one.
    NoCentroid { index: usize },
    /// Centroid outside `[-180, 180) x [-90, 90)`.
    OutOfDomain { index: usize, lon: f64, lat: f64 },
    /// Every counter of the feature's cell is taken; left unlabeled.
    CounterSpaceExhausted { index: usize, grid: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::Malformed { index, raw, reason } => {
                write!(f, "feature {index}: malformed identifier {raw:?}, {reason}")
            }
            Warning::Undecodable { index, identifier } => write!(
                f,
                "feature {index}: counter of {identifier} is not in the alphabet"
            ),
            Warning::Duplicate { index, identifier } => {
                write!(f, "feature {index}: duplicate identifier {identifier}")
            }
            Warning::NotAString { index, value } => {
                write!(f, "feature {index}: identifier is not a string, {value}")
            }
            Warning::NoCentroid { index } => write!(f, "feature {index}: no centroid"),
            Warning::OutOfDomain { index, lon, lat } => {
                write!(f, "feature {index}: centroid ({lon}, {lat}) out of domain")
            }
            Warning::CounterSpaceExhausted { index, grid } => {
                write!(f, "feature {index}: no counter left in cell {grid}")
            }
        }
    }
}

/// Outcome of [`Allocator::allocate`].
#[derive(Debug, Clone, Default)]
pub struct AllocationReport {
    pub assignments: Vec<Assignment>,
    /// Features that already had an identifier value.
    pub preserved: usize,
    pub warnings: Vec<Warning>,
}

/// Counter slots of one `(prefix, grid)` pair.
#[derive(Debug)]
struct Slots {
    occupied: HashSet<String>,
    /// `None` once `u64::MAX` has been handed out or registered.
    next: Option<u64>,
}

impl Default for Slots {
    fn default() -> Self {
        Self {
            occupied: HashSet::new(),
            next: Some(0),
        }
    }
}

impl Slots {
    /// Moves `next` past a decoded existing counter.
    fn reserve(&mut self, n: u64) {
        self.next = match (self.next, n.checked_add(1)) {
            (Some(next), Some(after)) => Some(next.max(after)),
            _ => None,
        };
    }
}

pub struct Allocator {
    scheme: Scheme,
    prefix: String,
    cells: BTreeMap<(String, String), Slots>,
    warnings: Vec<Warning>,
}

impl Allocator {
    /// Returns an allocator issuing `prefix` identifiers.
    pub fn new(scheme: Scheme, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self {
            scheme,
            prefix,
            cells: BTreeMap::new(),
            warnings: Vec::new(),
        })
    }

    /// Reserves the slot of an existing identifier, whatever its
    /// prefix.
    pub fn register(&mut self, index: usize, raw: &str) {
        let identifier = match Identifier::parse(raw) {
            ParsedIdentifier::Valid(identifier) => identifier,
            ParsedIdentifier::Malformed { raw, reason } => {
                self.warn(Warning::Malformed { index, raw, reason });
                return;
            }
        };
        let decoded = self.scheme.counter.decode(&identifier.counter);
        let slots = self
            .cells
            .entry((identifier.prefix.clone(), identifier.grid.clone()))
            .or_default();
        let fresh = slots.occupied.insert(identifier.counter.clone());
        if let Ok(n) = decoded {
            slots.reserve(n);
        } else {
            self.warn(Warning::Undecodable {
                index,
                identifier: raw.to_owned(),
            });
        }
        if !fresh {
            self.warn(Warning::Duplicate {
                index,
                identifier: raw.to_owned(),
            });
        }
        debug!("registered {identifier} from feature {index}");
    }

    /// Hands out identifiers to `candidates`.
    pub fn assign(&mut self, candidates: impl IntoIterator<Item = Candidate>) -> Vec<Assignment> {
        let mut by_cell: BTreeMap<GridCode, Vec<Candidate>> = BTreeMap::new();
        for candidate in candidates {
            let Coord { x: lon, y: lat } = candidate.centroid;
            match self.scheme.grid.encode(lon, lat) {
                Ok(code) => by_cell.entry(code).or_default().push(candidate),
                Err(_) => self.warn(Warning::OutOfDomain {
                    index: candidate.index,
                    lon,
                    lat,
                }),
            }
        }

        let mut assignments = Vec::new();
        for (grid, mut members) in by_cell {
            members.sort_by(placement_order);
            for Candidate { index, .. } in members {
                let Some(counter) = self.next_free(grid.as_str()) else {
                    self.warn(Warning::CounterSpaceExhausted {
                        index,
                        grid: grid.to_string(),
                    });
                    continue;
                };
                let identifier = Identifier::new(self.prefix.clone(), grid.as_str(), counter);
                debug!("assigned {identifier} to feature {index}");
                assignments.push(Assignment { index, identifier });
            }
        }
        assignments
    }

    /// Labels every unlabeled feature of `collection` in its `field`
    /// property.
    pub fn allocate(mut self, collection: &mut FeatureCollection, field: &str) -> AllocationReport {
        collection.ensure_field(field);

        let mut preserved = 0;
        let mut candidates = Vec::new();
        for index in 0..collection.len() {
            match collection.identifier(index, field) {
                StoredIdentifier::Present(raw) => {
                    preserved += 1;
                    self.register(index, &raw);
                }
                StoredIdentifier::Other(value) => {
                    preserved += 1;
                    self.warn(Warning::NotAString { index, value });
                }
                StoredIdentifier::Missing => match collection.centroid(index) {
                    Some(centroid) => candidates.push(Candidate { index, centroid }),
                    None => self.warn(Warning::NoCentroid { index }),
                },
            }
        }

        let assignments = self.assign(candidates);
        for Assignment { index, identifier } in &assignments {
            collection.set_identifier(*index, field, identifier.to_string());
        }

        AllocationReport {
            assignments,
            preserved,
            warnings: self.warnings,
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Claims the lowest free counter at or above the cell's next
    /// counter, or `None` when the counters up to `u64::MAX` are all
    /// taken.
    fn next_free(&mut self, grid: &str) -> Option<String> {
        let slots = self
            .cells
            .entry((self.prefix.clone(), grid.to_owned()))
            .or_default();
        let mut n = slots.next?;
        let mut code = self.scheme.counter.encode(n);
        while slots.occupied.contains(&code) {
            let Some(after) = n.checked_add(1) else {
                slots.next = None;
                return None;
            };
            n = after;
            code = self.scheme.counter.encode(n);
        }
        slots.next = n.checked_add(1);
        slots.occupied.insert(code.clone());
        Some(code)
    }

    fn warn(&mut self, warning: Warning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }
}

/// Ascending `lon + lat`, then `lon`, `lat`, and collection index.
fn placement_order(a: &Candidate, b: &Candidate) -> Ordering {
    let key = |c: &Candidate| (c.centroid.x + c.centroid.y, c.centroid.x, c.centroid.y);
    let (a_sum, a_lon, a_lat) = key(a);
    let (b_sum, b_lon, b_lat) = key(b);
    a_sum
        .total_cmp(&b_sum)
        .then(a_lon.total_cmp(&b_lon))
        .then(a_lat.total_cmp(&b_lat))
        .then(a.index.cmp(&b.index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Base;
    use std::collections::HashMap;

    fn scheme(base: Base, padding: usize) -> Scheme {
        Scheme::new(base.into(), GridLayout::Axis, padding).unwrap()
    }

    fn candidate(index: usize, lon: f64, lat: f64) -> Candidate {
        Candidate {
            index,
            centroid: Coord { x: lon, y: lat },
        }
    }

    fn labels(assignments: &[Assignment]) -> HashMap<usize, String> {
        assignments
            .iter()
            .map(|a| (a.index, a.identifier.to_string()))
            .collect()
    }

    #[test]
    fn test_fresh_cell_counts_from_zero_in_placement_order() {
        let mut allocator = Allocator::new(scheme(Base::B10, 3), "R").unwrap();
        let assignments = allocator.assign([
            candidate(0, 149.5, -16.5),
            candidate(1, 149.1, -17.9),
            candidate(2, 149.3, -17.0),
        ]);
        let assigned = labels(&assignments);
        assert_eq!(assigned[&1], "R-9140-000");
        assert_eq!(assigned[&2], "R-9140-001");
        assert_eq!(assigned[&0], "R-9140-002");
    }

    #[test]
    fn test_existing_identifiers_reserve_slots() {
        let mut allocator = Allocator::new(scheme(Base::B10, 3), "R").unwrap();
        allocator.register(10, "R-9140-000");
        allocator.register(11, "R-9140-004");
        // Another prefix in the same cell doesn't reserve R slots.
        allocator.register(12, "A-9140-009");
        let assigned = labels(&allocator.assign([
            candidate(0, 149.1, -17.9),
            candidate(1, 149.3, -17.0),
        ]));
        assert_eq!(assigned[&0], "R-9140-005");
        assert_eq!(assigned[&1], "R-9140-006");
        assert!(allocator.warnings().is_empty());
    }

    #[test]
    fn test_collisions_skip_occupied_codes() {
        let mut allocator = Allocator::new(scheme(Base::B10, 2), "R").unwrap();
        allocator.register(0, "R-9140-5");
        allocator.register(1, "R-9140-06");
        allocator.register(2, "R-9140-07");
        let assigned = labels(&allocator.assign([candidate(3, 149.1, -17.9)]));
        assert_eq!(assigned[&3], "R-9140-08");

        // Slots taken behind the next counter's back are skipped.
        let mut allocator = Allocator::new(scheme(Base::B10, 2), "R").unwrap();
        let slots = allocator
            .cells
            .entry(("R".to_owned(), "9140".to_owned()))
            .or_default();
        slots.occupied.extend(["00".to_owned(), "01".to_owned(), "03".to_owned()]);
        assert_eq!(allocator.next_free("9140").as_deref(), Some("02"));
        assert_eq!(allocator.next_free("9140").as_deref(), Some("04"));

        let mut allocator = Allocator::new(scheme(Base::B10, 2), "R").unwrap();
        allocator.register(0, "R-9140-0A");
        // Undecodable counters reserve the slot but don't move next.
        let assigned = labels(&allocator.assign([candidate(1, 149.1, -17.9)]));
        assert_eq!(assigned[&1], "R-9140-00");
        assert_eq!(
            allocator.warnings(),
            &[Warning::Undecodable {
                index: 0,
                identifier: "R-9140-0A".to_owned()
            }]
        );
    }

    #[test]
    fn test_counter_space_exhaustion() {
        let max = u64::MAX.to_string();
        let mut allocator = Allocator::new(scheme(Base::B10, 3), "R").unwrap();
        allocator.register(0, &format!("R-9140-{max}"));
        let assignments = allocator.assign([candidate(1, 149.1, -17.9)]);
        assert!(assignments.is_empty());
        assert_eq!(
            allocator.warnings(),
            &[Warning::CounterSpaceExhausted {
                index: 1,
                grid: "9140".to_owned()
            }]
        );

        // One counter left: the first candidate takes it.
        let mut allocator = Allocator::new(scheme(Base::B10, 3), "R").unwrap();
        allocator.register(0, &format!("R-9140-{}", u64::MAX - 1));
        let assigned = labels(&allocator.assign([
            candidate(1, 149.1, -17.9),
            candidate(2, 149.3, -17.0),
        ]));
        assert_eq!(assigned[&1], format!("R-9140-{max}"));
        assert!(!assigned.contains_key(&2));
        assert!(matches!(
            allocator.warnings(),
            [Warning::CounterSpaceExhausted { index: 2, .. }]
        ));

        // Other cells are unaffected.
        let mut allocator = Allocator::new(scheme(Base::B10, 3), "R").unwrap();
        allocator.register(0, &format!("R-9140-{max}"));
        let assigned = labels(&allocator.assign([candidate(1, 147.0, -20.0)]));
        assert_eq!(assigned[&1], "R-9038-000");
    }

    #[test]
    fn test_malformed_and_duplicate_warnings() {
        let mut allocator = Allocator::new(scheme(Base::B10, 3), "R").unwrap();
        allocator.register(0, "R-9140");
        allocator.register(1, "R-9140-001");
        allocator.register(2, "R-9140-001");
        assert!(matches!(
            allocator.warnings()[0],
            Warning::Malformed { index: 0, .. }
        ));
        assert_eq!(
            allocator.warnings()[1],
            Warning::Duplicate {
                index: 2,
                identifier: "R-9140-001".to_owned()
            }
        );
        let assigned = labels(&allocator.assign([candidate(3, 149.1, -17.9)]));
        assert_eq!(assigned[&3], "R-9140-002");
    }

    #[test]
    fn test_out_of_domain_candidates_are_skipped() {
        let mut allocator = Allocator::new(scheme(Base::B10, 3), "R").unwrap();
        let assignments = allocator.assign([
            candidate(0, 180.0, 0.0),
            candidate(1, 149.1, -17.9),
        ]);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].index, 1);
        assert!(matches!(
            allocator.warnings(),
            [Warning::OutOfDomain { index: 0, .. }]
        ));
    }

    #[test]
    fn test_assignment_ignores_input_order() {
        let points = [
            (149.1, -17.9),
            (149.3, -17.0),
            (149.5, -16.5),
            (147.0, -20.0),
            (147.2, -19.8),
            (150.0, -18.0),
            // Same lon + lat as the point above.
            (149.0, -17.0),
        ];
        let run = |order: &[usize]| {
            let mut allocator = Allocator::new(scheme(Base::B32Caps, 2), "R").unwrap();
            let assignments =
                allocator.assign(order.iter().map(|&i| candidate(i, points[i].0, points[i].1)));
            labels(&assignments)
        };
        let forward = run(&[0, 1, 2, 3, 4, 5, 6]);
        let backward = run(&[6, 5, 4, 3, 2, 1, 0]);
        let shuffled = run(&[3, 0, 6, 2, 5, 1, 4]);
        assert_eq!(forward, backward);
        assert_eq!(forward, shuffled);
        assert_eq!(forward.len(), points.len());
    }

    const REEFS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "geometry": { "type": "Point", "coordinates": [149.3, -17.0] },
              "properties": { "name": "b" } },
            { "type": "Feature", "geometry": { "type": "Point", "coordinates": [149.1, -17.9] },
              "properties": { "name": "a", "ReefID": "R-9140-003" } },
            { "type": "Feature", "geometry": { "type": "Point", "coordinates": [149.5, -16.5] },
              "properties": { "name": "c", "ReefID": null } },
            { "type": "Feature", "geometry": null,
              "properties": { "name": "d" } },
            { "type": "Feature", "geometry": { "type": "Point", "coordinates": [149.2, -17.5] },
              "properties": { "name": "e", "ReefID": "bogus" } }
        ]
    }"#;

    fn render(collection: &FeatureCollection) -> Vec<u8> {
        let mut buf = Vec::new();
        collection.to_writer(&mut buf).unwrap();
        buf
    }

    fn ids(collection: &FeatureCollection) -> Vec<StoredIdentifier> {
        (0..collection.len())
            .map(|i| collection.identifier(i, "ReefID"))
            .collect()
    }

    #[test]
    fn test_allocate_collection() {
        let mut reefs: FeatureCollection = REEFS.parse().unwrap();
        let allocator = Allocator::new(scheme(Base::B10, 3), "R").unwrap();
        let report = allocator.allocate(&mut reefs, "ReefID");
        assert_eq!(report.preserved, 2);
        assert_eq!(report.assignments.len(), 2);
        assert_eq!(
            report.warnings,
            vec![
                Warning::NoCentroid { index: 3 },
                Warning::Malformed {
                    index: 4,
                    raw: "bogus".to_owned(),
                    reason: "expected exactly three '-' separated parts"
                },
            ]
        );
        let present = |s: &str| StoredIdentifier::Present(s.to_owned());
        assert_eq!(
            ids(&reefs),
            vec![
                present("R-9140-004"),
                present("R-9140-003"),
                present("R-9140-005"),
                StoredIdentifier::Missing,
                present("bogus"),
            ]
        );
    }

    #[test]
    fn test_allocate_is_idempotent() {
        let mut reefs: FeatureCollection = REEFS.parse().unwrap();
        Allocator::new(scheme(Base::B10, 3), "R")
            .unwrap()
            .allocate(&mut reefs, "ReefID");
        let first = render(&reefs);

        let mut again: FeatureCollection = std::str::from_utf8(&first).unwrap().parse().unwrap();
        let report = Allocator::new(scheme(Base::B10, 3), "R")
            .unwrap()
            .allocate(&mut again, "ReefID");
        assert!(report.assignments.is_empty());
        assert_eq!(first, render(&again));
    }

    #[test]
    fn test_allocate_keeps_existing_identifiers() {
        let mut reefs: FeatureCollection = REEFS.parse().unwrap();
        Allocator::new(scheme(Base::B10, 3), "R")
            .unwrap()
            .allocate(&mut reefs, "ReefID");
        let before = ids(&reefs);

        // Add a neighbour, unlabeled, ahead of everything else.
        let mut features: geojson::FeatureCollection = reefs.into();
        let mut newcomer = features.features[0].clone();
        newcomer.set_property("ReefID", JsonValue::Null);
        features.features.insert(0, newcomer);
        let mut grown = FeatureCollection::from(features);

        let report = Allocator::new(scheme(Base::B10, 3), "R")
            .unwrap()
            .allocate(&mut grown, "ReefID");
        assert_eq!(report.assignments.len(), 1);
        let after = ids(&grown);
        assert_eq!(after[0], StoredIdentifier::Present("R-9140-006".to_owned()));
        assert_eq!(&after[1..], &before[..]);
    }

    #[test]
    fn test_allocate_projected_collection() {
        // Web Mercator metres for (145.8, -20.7) and (149.3, -17.0).
        let mut reefs: FeatureCollection = r#"{
            "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": "EPSG:3857" } },
            "features": [
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [16230381.757659288, -2356142.531225169] },
                  "properties": { "name": "a" } },
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [16619999.975435747, -1920825.040377467] },
                  "properties": { "name": "b" } }
            ]
        }"#
        .parse()
        .unwrap();
        let report = Allocator::new(scheme(Base::B10, 3), "R")
            .unwrap()
            .allocate(&mut reefs, "ReefID");
        assert!(report.warnings.is_empty());
        let present = |s: &str| StoredIdentifier::Present(s.to_owned());
        assert_eq!(ids(&reefs), vec![present("R-9038-000"), present("R-9140-000")]);
    }

    #[test]
    fn test_rejects_bad_configuration() {
        assert!(Allocator::new(scheme(Base::B10, 3), "R-1").is_err());
        assert!(Allocator::new(scheme(Base::B10, 3), "").is_err());
        assert!(Scheme::new(Base::B10.into(), GridLayout::Axis, 0).is_err());
    }
}
