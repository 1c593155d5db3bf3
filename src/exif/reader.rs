use anyhow::{Context, Result};
use exif::{Exif, In, Tag, Value};
use img_parts::Bytes;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

use super::container::Container;
use super::tags::{self, IfdGroup};
use crate::pipeline::ImageKind;

/// One tag found in an image's EXIF payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExifEntry {
    pub name: String,
    pub group: IfdGroup,
    pub value: String,
}

/// Every tag of an image's EXIF payload, in file order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExifInfo {
    pub entries: Vec<ExifEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gps: Option<(f64, f64)>,
}

impl ExifInfo {
    pub fn tag_names(&self) -> BTreeSet<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// First entry with the given tag name.
    pub fn get(&self, name: &str) -> Option<&ExifEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// GPS position in decimal degrees (latitude, longitude), south and
    /// west negative.
    pub fn gps_coordinates(&self) -> Option<(f64, f64)> {
        self.gps
    }
}

/// Parse a raw TIFF-structured payload with the EXIF codec.
pub(crate) fn parse_payload(payload: &[u8]) -> Result<Exif> {
    exif::Reader::new()
        .read_raw(payload.to_vec())
        .context("Failed to parse EXIF payload")
}

/// Load the image at `path` and return its container and EXIF payload.
pub(crate) fn load(path: &Path) -> Result<(Container, Option<Bytes>)> {
    let Some(kind) = ImageKind::from_path(path) else {
        anyhow::bail!("unsupported format: {}", path.display());
    };
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let container = Container::parse(Bytes::from(bytes), kind)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let payload = container.exif();
    Ok((container, payload))
}

/// Whether the image carries EXIF metadata worth removing.
///
/// A payload the codec cannot make sense of still counts. I/O and container
/// errors count as "no EXIF".
pub fn has_exif(path: &Path) -> bool {
    let (container, payload) = match load(path) {
        Ok(loaded) => loaded,
        Err(e) => {
            log::debug!("has_exif({}): {e:#}", path.display());
            return false;
        }
    };
    if container.has_legacy_exif() {
        return true;
    }
    let Some(payload) = payload else {
        return false;
    };
    match parse_payload(&payload) {
        Ok(exif) => exif.fields().any(|f| !tags::is_structural(f.tag)),
        Err(e) => {
            log::debug!("Unreadable EXIF in {}: {e:#}", path.display());
            true
        }
    }
}

/// Read every tag from the image at `path`.
///
/// An image without EXIF gives an empty [`ExifInfo`]. EXIF kept only in a
/// legacy PNG text chunk is an error, since its tags cannot be listed.
pub fn read_exif(path: &Path) -> Result<ExifInfo> {
    let (container, payload) = load(path)?;
    let Some(payload) = payload else {
        if container.has_legacy_exif() {
            anyhow::bail!("EXIF stored in legacy PNG text chunk in {}", path.display());
        }
        log::debug!("No EXIF data found in {}", path.display());
        return Ok(ExifInfo::default());
    };
    let exif = parse_payload(&payload).with_context(|| format!("Invalid EXIF in {}", path.display()))?;
    Ok(info_from(&exif))
}

pub(crate) fn info_from(exif: &Exif) -> ExifInfo {
    let entries = exif
        .fields()
        .filter(|f| !tags::is_structural(f.tag))
        .map(|f| ExifEntry {
            name: tags::tag_name(f.tag),
            group: IfdGroup::of(f.tag, f.ifd_num),
            value: display_value(f),
        })
        .collect();

    ExifInfo { entries, gps: gps_position(exif) }
}

fn display_value(field: &exif::Field) -> String {
    let s = field.display_value().to_string();
    s.trim().trim_matches('"').to_string()
}

fn gps_position(exif: &Exif) -> Option<(f64, f64)> {
    let lat = coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef)?;
    let lon = coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef)?;
    Some((lat, lon))
}

/// Degrees/minutes/seconds rationals plus hemisphere letter to decimal degrees.
fn coordinate(exif: &Exif, tag: Tag, ref_tag: Tag) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let Value::Rational(ref dms) = field.value else {
        return None;
    };
    let mut coord = 0.0;
    for (part, divisor) in dms.iter().zip([1.0, 60.0, 3600.0]) {
        coord += part.to_f64() / divisor;
    }
    if !coord.is_finite() {
        return None;
    }

    let hemisphere = exif.get_field(ref_tag, In::PRIMARY).and_then(|f| match f.value {
        Value::Ascii(ref v) => v.first().and_then(|s| s.first()).copied(),
        _ => None,
    });
    if matches!(hemisphere, Some(b'S' | b'W')) {
        coord = -coord;
    }
    Some(coord)
}
