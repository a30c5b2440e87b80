//! PCD (Point Cloud Data) loading.
//!
//! Decoding is done by `pcd-rs`; this module checks the header against the
//! file size and turns records into a [`PointCloud`].

use crate::error::{DataError, Result};
use crate::types::{Point, PointCloud};
use glam::Vec3;
use pcd_rs::{DataKind, DynReader, DynRecord, Field, PcdMeta, ValueKind};
use std::fmt::Display;
use std::path::Path;
use tracing::{debug, warn};

/// Gray used when the cloud carries no color field.
const DEFAULT_COLOR: Vec3 = Vec3::splat(0.8);

fn pcd_error(path: &Path, reason: impl Display) -> DataError {
    DataError::Pcd {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn value_size(kind: &ValueKind) -> u64 {
    match kind {
        ValueKind::U8 | ValueKind::I8 => 1,
        ValueKind::U16 | ValueKind::I16 => 2,
        ValueKind::U32 | ValueKind::I32 | ValueKind::F32 => 4,
        ValueKind::F64 => 8,
    }
}

/// Record positions of the fields we consume.
struct Columns {
    x: usize,
    y: usize,
    z: usize,
    rgb: Option<usize>,
}

impl Columns {
    fn resolve(meta: &PcdMeta) -> std::result::Result<Self, String> {
        let fields = &meta.field_defs.fields;
        let find = |name: &str| fields.iter().position(|f| f.name == name);
        let required = |name: &str| find(name).ok_or_else(|| format!("field '{}' missing", name));
        Ok(Self {
            x: required("x")?,
            y: required("y")?,
            z: required("z")?,
            rgb: find("rgb").or_else(|| find("rgba")),
        })
    }
}

/// Reject headers whose declared size cannot fit in `file_len` bytes.
fn check_header(meta: &PcdMeta, file_len: u64) -> std::result::Result<(), String> {
    let mut record_bytes = 0u64;
    let mut record_values = 0u64;
    for field in &meta.field_defs.fields {
        if field.count == 0 {
            return Err(format!("field '{}' has COUNT 0", field.name));
        }
        record_bytes = field
            .count
            .checked_mul(value_size(&field.kind))
            .and_then(|n| record_bytes.checked_add(n))
            .ok_or("record size overflows")?;
        record_values = record_values.saturating_add(field.count);
    }
    // An ascii value takes at least one character plus a separator.
    let min_record = match meta.data {
        DataKind::Binary => record_bytes,
        _ => record_values.saturating_mul(2),
    };
    match meta.num_points.checked_mul(min_record) {
        Some(needed) if needed <= file_len => Ok(()),
        _ => Err(format!(
            "header declares {} points but the file holds {} bytes",
            meta.num_points, file_len
        )),
    }
}

fn scalar(field: &Field) -> Option<f32> {
    let value = match field {
        Field::I8(v) => *v.first()? as f32,
        Field::I16(v) => *v.first()? as f32,
        Field::I32(v) => *v.first()? as f32,
        Field::U8(v) => *v.first()? as f32,
        Field::U16(v) => *v.first()? as f32,
        Field::U32(v) => *v.first()? as f32,
        Field::F32(v) => *v.first()?,
        Field::F64(v) => *v.first()? as f32,
    };
    Some(value)
}

/// Unpack a PCL-style `0x00RRGGBB` color stored as float bits or an integer.
fn packed_rgb(field: &Field) -> Option<Vec3> {
    let bits = match field {
        Field::F32(v) => v.first()?.to_bits(),
        Field::U32(v) => *v.first()?,
        Field::I32(v) => *v.first()? as u32,
        _ => return None,
    };
    let channel = |shift: u32| ((bits >> shift) & 0xff) as f32 / 255.0;
    Some(Vec3::new(channel(16), channel(8), channel(0)))
}

fn to_point(record: &DynRecord, columns: &Columns) -> Option<Point> {
    let coord = |index: usize| record.0.get(index).and_then(scalar);
    let position = Vec3::new(coord(columns.x)?, coord(columns.y)?, coord(columns.z)?);
    let color = match columns.rgb {
        Some(index) => record.0.get(index).and_then(packed_rgb)?,
        None => DEFAULT_COLOR,
    };
    Some(Point::new(position, color))
}

/// Load a point cloud from a `.pcd` file.
///
/// Non-finite points are dropped.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_point_cloud(path: &Path) -> Result<PointCloud> {
    let file_len = std::fs::metadata(path)?.len();
    let reader = DynReader::open(path).map_err(|e| pcd_error(path, e))?;
    check_header(reader.meta(), file_len).map_err(|e| pcd_error(path, e))?;
    let columns = Columns::resolve(reader.meta()).map_err(|e| pcd_error(path, e))?;

    let mut points = Vec::new();
    let mut dropped = 0usize;
    for (i, record) in reader.enumerate() {
        let record = record.map_err(|e| pcd_error(path, e))?;
        let point = to_point(&record, &columns)
            .ok_or_else(|| pcd_error(path, format!("record {} has malformed fields", i)))?;
        if point.position.is_finite() {
            points.push(point);
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        warn!("dropped {} non-finite points", dropped);
    }
    debug!("Loaded {} points", points.len());
    Ok(PointCloud::new(points))
}
