//! Longitude/latitude grid cells.
//!
//! The domain `[-180, 180) x [-90, 90)` is cut into `B x B` major
//! cells, each of which is cut again into `B x B` minor cells. That
//! gives `B²` longitude slices and `B²` latitude slices, addressed by
//! four symbols of the alphabet: a major and a minor digit per axis.

use crate::{
    alphabet::Alphabet,
    error::{GridIdError, Result},
};
use geo::geometry::{Coord, Rect};
use std::{fmt, str::FromStr};

pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Number of symbols in a grid code.
pub const GRID_CODE_LEN: usize = 4;

/// Order in which the four grid digits are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridLayout {
    /// `lon_major lon_sub lat_major lat_sub`.
    ///
    /// Layout of every identifier issued so far, e.g. the `9140` in
    /// `R-9140-172`.
    #[default]
    Axis,

    /// `lon_major lat_major lon_sub lat_sub`.
    ///
    /// The first two symbols name the major cell, so codes sharing a
    /// major cell share a prefix.
    Nested,
}

impl fmt::Display for GridLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridLayout::Axis => f.write_str("axis"),
            GridLayout::Nested => f.write_str("nested"),
        }
    }
}

impl FromStr for GridLayout {
    type Err = GridIdError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "axis" => Ok(GridLayout::Axis),
            "nested" => Ok(GridLayout::Nested),
            _ => Err(GridIdError::UnknownLayout(s.to_owned())),
        }
    }
}

/// A four symbol grid cell code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridCode(String);

impl GridCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GridCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<GridCode> for String {
    fn from(code: GridCode) -> String {
        code.0
    }
}

/// Slice indices of a cell, `(major, sub)` per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellIndex {
    lon: (usize, usize),
    lat: (usize, usize),
}

/// Maps coordinates to grid cell codes.
#[derive(Debug, Clone)]
pub struct GridEncoder {
    alphabet: Alphabet,
    layout: GridLayout,
}

impl GridEncoder {
    pub fn new(alphabet: Alphabet) -> Self {
        Self::with_layout(alphabet, GridLayout::default())
    }

    pub fn with_layout(alphabet: Alphabet, layout: GridLayout) -> Self {
        Self { alphabet, layout }
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    /// Width, in degrees, of a major (longitude, latitude) slice.
    fn major_slices(&self) -> (f64, f64) {
        #[allow(clippy::cast_precision_loss)]
        let base = self.alphabet.base() as f64;
        ((MAX_LON - MIN_LON) / base, (MAX_LAT - MIN_LAT) / base)
    }

    /// Returns the code of the cell containing (`lon`, `lat`).
    ///
    /// Coordinates outside `[-180, 180) x [-90, 90)`, including the
    /// upper edges and NaN, are rejected. Points on a slice edge
    /// belong to the slice starting at that edge.
    pub fn encode(&self, lon: f64, lat: f64) -> Result<GridCode> {
        if !(MIN_LON..MAX_LON).contains(&lon) || !(MIN_LAT..MAX_LAT).contains(&lat) {
            return Err(GridIdError::CoordOutOfDomain { lon, lat });
        }
        let base = self.alphabet.base();
        let (lon_slice, lat_slice) = self.major_slices();
        let index = CellIndex {
            lon: split(lon - MIN_LON, lon_slice, base),
            lat: split(lat - MIN_LAT, lat_slice, base),
        };
        self.render(index)
    }

    /// Parses `code`, checking its length and symbols.
    pub fn parse(&self, code: &str) -> Result<GridCode> {
        self.cell_index(code)?;
        Ok(GridCode(code.to_owned()))
    }

    /// Returns the lon/lat rectangle covered by `code`.
    pub fn bounds(&self, code: &str) -> Result<Rect<f64>> {
        let CellIndex { lon, lat } = self.cell_index(code)?;
        #[allow(clippy::cast_precision_loss)]
        let base = self.alphabet.base() as f64;
        let (lon_slice, lat_slice) = self.major_slices();
        #[allow(clippy::cast_precision_loss)]
        let edge = |(major, sub): (usize, usize), slice: f64, min: f64| {
            let sub_slice = slice / base;
            let start = min + major as f64 * slice + sub as f64 * sub_slice;
            (start, start + sub_slice)
        };
        let (west, east) = edge(lon, lon_slice, MIN_LON);
        let (south, north) = edge(lat, lat_slice, MIN_LAT);
        Ok(Rect::new(
            Coord { x: west, y: south },
            Coord { x: east, y: north },
        ))
    }

    fn render(&self, CellIndex { lon, lat }: CellIndex) -> Result<GridCode> {
        let digits = match self.layout {
            GridLayout::Axis => [lon.0, lon.1, lat.0, lat.1],
            GridLayout::Nested => [lon.0, lat.0, lon.1, lat.1],
        };
        let code = digits
            .into_iter()
            .map(|digit| self.alphabet.encode_digit(digit))
            .collect::<Result<String>>()?;
        Ok(GridCode(code))
    }

    fn cell_index(&self, code: &str) -> Result<CellIndex> {
        let invalid = || GridIdError::InvalidGridCode(code.to_owned());
        let digits = code
            .chars()
            .map(|c| self.alphabet.decode_digit(c).map_err(|_| invalid()))
            .collect::<Result<Vec<usize>>>()?;
        let [a, b, c, d] = <[usize; GRID_CODE_LEN]>::try_from(digits).map_err(|_| invalid())?;
        Ok(match self.layout {
            GridLayout::Axis => CellIndex {
                lon: (a, b),
                lat: (c, d),
            },
            GridLayout::Nested => CellIndex {
                lon: (a, c),
                lat: (b, d),
            },
        })
    }
}

/// Splits a non-negative `offset` into `(major, sub)` slice indices.
///
/// Rounding can land a value just below an upper edge on `base`, so
/// both indices are clamped to `base - 1`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn split(offset: f64, slice: f64, base: usize) -> (usize, usize) {
    #[allow(clippy::cast_precision_loss)]
    let sub_slice = slice / base as f64;
    let major = (floor_div(offset, slice) as usize).min(base - 1);
    let sub = (floor_div(offset.rem_euclid(slice), sub_slice) as usize).min(base - 1);
    (major, sub)
}

/// Floor of the exact quotient `a / b`.
///
/// `(a / b).floor()` rounds the quotient before flooring, which moves
/// values that sit a rounding error below a slice edge (`18.0 / 3.6`)
/// into the next slice. Subtracting the exact remainder first keeps
/// them where identifiers already issued put them.
fn floor_div(a: f64, b: f64) -> f64 {
    ((a - a.rem_euclid(b)) / b).round()
}
