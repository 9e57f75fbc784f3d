use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridIdError {
    #[error("invalid alphabet, {0}")]
    InvalidAlphabet(String),

    #[error("unknown base {0:?}, expected one of B10, B14, B16, B32_CAPS, B32_LOWER")]
    UnknownBase(String),

    #[error("unknown grid layout {0:?}, expected axis or nested")]
    UnknownLayout(String),

    #[error("zero padding must be at least 1")]
    ZeroPadding,

    #[error("invalid prefix {0:?}")]
    InvalidPrefix(String),

    #[error("digit {value} out of range for base {base}")]
    DigitOutOfRange { value: usize, base: usize },

    #[error("symbol {0:?} not found in alphabet")]
    SymbolNotFound(char),

    #[error("empty counter code")]
    EmptyCounter,

    #[error("counter code {0:?} overflows u64")]
    Overflow(String),

    #[error("invalid grid code {0:?}")]
    InvalidGridCode(String),

    #[error("coordinate ({lon}, {lat}) outside [-180, 180) x [-90, 90)")]
    CoordOutOfDomain { lon: f64, lat: f64 },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    GeoJson(#[from] geojson::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} is not a GeoJSON FeatureCollection")]
    NotFeatureCollection(PathBuf),

    #[error("unsupported crs {crs} in {path}, expected CRS84 or a known EPSG code")]
    UnsupportedCrs { crs: String, path: PathBuf },
    #[error("reprojection from EPSG:{epsg} failed: {reason}")]
    Projection { epsg: u16, reason: String },
}

pub type Result<T, E = GridIdError> = std::result::Result<T, E>;
