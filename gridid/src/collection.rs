//! GeoJSON feature collections.
//!
//! GeoJSON coordinates are WGS84 longitude/latitude. Older files may
//! carry a legacy `crs` member naming an EPSG system instead; their
//! geometries are reprojected to WGS84 when centroids are taken, and
//! written back untouched.

use crate::error::{GridIdError, Result};
use geo::{geometry::Coord, Centroid, MapCoords};
use geojson::{Feature, GeoJson, JsonObject, JsonValue};
use log::{debug, warn};
use proj4rs::{transform::transform, Proj};
use std::{
    ffi::OsString,
    fmt,
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

/// Default name of the identifier property.
pub const DEFAULT_FIELD: &str = "ReefID";

/// What a feature holds in its identifier property.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredIdentifier {
    /// Absent, `null`, or an empty string.
    Missing,
    Present(String),
    /// Something other than a string, e.g. a number.
    Other(JsonValue),
}

#[derive(Debug, Clone)]
pub struct FeatureCollection {
    inner: geojson::FeatureCollection,
    /// Set when the file declares a CRS other than WGS84.
    reprojection: Option<Reprojection>,
}

impl FeatureCollection {
    /// Reads the GeoJSON FeatureCollection at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("loading {path:?}");
        let rdr = BufReader::new(File::open(path)?);
        Self::from_reader(rdr, path)
    }

    fn from_reader<R: Read>(rdr: R, origin: &Path) -> Result<Self> {
        match GeoJson::from_reader(rdr)? {
            GeoJson::FeatureCollection(inner) => {
                let reprojection = source_crs(&inner, origin)?;
                Ok(Self {
                    inner,
                    reprojection,
                })
            }
            _ => Err(GridIdError::NotFeatureCollection(origin.to_owned())),
        }
    }

    /// Writes the collection to `path`.
    ///
    /// Data goes to a sibling `<name>.tmp` file first, which is then
    /// renamed over `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = {
            let mut name = path.file_name().map(OsString::from).unwrap_or_default();
            name.push(".tmp");
            path.with_file_name(name)
        };
        debug!("writing {tmp_path:?}");
        let mut wtr = BufWriter::new(File::create(&tmp_path)?);
        self.to_writer(&mut wtr)?;
        wtr.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    pub fn to_writer<W: Write>(&self, mut wtr: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut wtr, &self.inner)?;
        writeln!(wtr)?;
        wtr.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.features.is_empty()
    }

    pub fn features(&self) -> &[Feature] {
        &self.inner.features
    }

    /// Returns the identifier property `field` of feature `index`.
    pub fn identifier(&self, index: usize, field: &str) -> StoredIdentifier {
        match self.inner.features[index].property(field) {
            None | Some(JsonValue::Null) => StoredIdentifier::Missing,
            Some(JsonValue::String(s)) if s.is_empty() => StoredIdentifier::Missing,
            Some(JsonValue::String(s)) => StoredIdentifier::Present(s.clone()),
            Some(other) => StoredIdentifier::Other(other.clone()),
        }
    }

    pub fn set_identifier(&mut self, index: usize, field: &str, identifier: String) {
        self.inner.features[index].set_property(field, identifier);
    }

    /// Adds `field` as `null` to every feature lacking it.
    pub fn ensure_field(&mut self, field: &str) {
        for feature in &mut self.inner.features {
            let properties = feature.properties.get_or_insert_with(JsonObject::new);
            properties
                .entry(field.to_owned())
                .or_insert(JsonValue::Null);
        }
    }

    /// Returns the WGS84 lon/lat centroid of feature `index`, if it
    /// has a geometry with one.
    pub fn centroid(&self, index: usize) -> Option<Coord<f64>> {
        let geometry = self.inner.features[index].geometry.as_ref()?;
        let mut geometry = geo::Geometry::<f64>::try_from(geometry.value.clone()).ok()?;
        if let Some(reprojection) = &self.reprojection {
            geometry = match geometry.try_map_coords(|coord| reprojection.to_lon_lat(coord)) {
                Ok(geometry) => geometry,
                Err(e) => {
                    warn!("feature {index}: {e}");
                    return None;
                }
            };
        }
        geometry.centroid().map(|point| point.0)
    }
}

impl FromStr for FeatureCollection {
    type Err = GridIdError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_reader(s.as_bytes(), Path::new("<str>"))
    }
}

impl From<geojson::FeatureCollection> for FeatureCollection {
    fn from(inner: geojson::FeatureCollection) -> Self {
        Self {
            inner,
            reprojection: None,
        }
    }
}

impl From<FeatureCollection> for geojson::FeatureCollection {
    fn from(collection: FeatureCollection) -> Self {
        collection.inner
    }
}

/// EPSG code of WGS84 longitude/latitude.
const WGS84: u16 = 4326;

/// Projection from an EPSG system to WGS84 lon/lat degrees.
#[derive(Clone)]
struct Reprojection {
    epsg: u16,
    src: Arc<Proj>,
    dst: Arc<Proj>,
}

impl Reprojection {
    fn from_epsg(epsg: u16) -> std::result::Result<Self, proj4rs::errors::Error> {
        Ok(Self {
            epsg,
            src: Arc::new(Proj::from_epsg_code(epsg)?),
            dst: Arc::new(Proj::from_epsg_code(WGS84)?),
        })
    }

    fn to_lon_lat(&self, Coord { x, y }: Coord<f64>) -> Result<Coord<f64>> {
        // Geographic systems take and give radians.
        let mut point = if self.src.is_latlong() {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };
        transform(&self.src, &self.dst, &mut point).map_err(|e| GridIdError::Projection {
            epsg: self.epsg,
            reason: e.to_string(),
        })?;
        Ok(Coord {
            x: point.0.to_degrees(),
            y: point.1.to_degrees(),
        })
    }
}

impl fmt::Debug for Reprojection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reprojection")
            .field("epsg", &self.epsg)
            .finish_non_exhaustive()
    }
}

/// Reads a legacy (2008 GeoJSON) `crs` member.
///
/// Absent, CRS84 and EPSG:4326 mean the coordinates are already lon/lat.
/// Any other EPSG code gets a [`Reprojection`]; names that aren't EPSG
/// codes, or codes without a known definition, are refused.
fn source_crs(collection: &geojson::FeatureCollection, origin: &Path) -> Result<Option<Reprojection>> {
    let Some(crs) = collection
        .foreign_members
        .as_ref()
        .and_then(|members| members.get("crs"))
    else {
        return Ok(None);
    };
    let unsupported = || GridIdError::UnsupportedCrs {
        crs: crs.to_string(),
        path: PathBuf::from(origin),
    };
    let name = crs
        .pointer("/properties/name")
        .and_then(JsonValue::as_str)
        .unwrap_or_default();
    if name.ends_with("CRS84") {
        return Ok(None);
    }
    let epsg = epsg_code(name).ok_or_else(unsupported)?;
    if epsg == WGS84 {
        return Ok(None);
    }
    debug!("reprojecting {origin:?} from EPSG:{epsg}");
    Reprojection::from_epsg(epsg)
        .map(Some)
        .map_err(|_| unsupported())
}

/// Code of `EPSG:3857`, `urn:ogc:def:crs:EPSG::3857` style names.
fn epsg_code(name: &str) -> Option<u16> {
    if !name.to_ascii_uppercase().contains("EPSG:") {
        return None;
    }
    name.rsplit(':').next()?.parse().ok()
}
