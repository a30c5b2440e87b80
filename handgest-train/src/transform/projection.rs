//! Point cloud frames (`*.pcd`) to RGBD tensors via pinhole projection.

use super::{FrameTransform, RGBD_CHANNELS};
use crate::error::TransformError;
use glam::{EulerRot, Quat, Vec3};
use handgest_data::{PointCloud, load_point_cloud};
use ndarray::Array3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pinhole camera intrinsics at the capture resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub width: u32,
    pub height: u32,
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

/// Gaussian pose perturbation, `[rx, ry, rz, tx, ty, tz]` (radians, meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Jitter {
    pub loc: [f32; 6],
    pub scale: [f32; 6],
}

/// Rigid pose applied to a cloud about its centroid.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Pose {
    rotation: Quat,
    translation: Vec3,
}

/// Renders a point cloud into a `[4, H, W]` RGBD tensor.
///
/// Each cloud is rotated about its centroid by `angle` around X and moved so
/// its centroid sits at depth `z_target` (when positive). With a [`Jitter`],
/// every slot additionally gets its own perturbation, drawn from a generator
/// seeded by `(seed, slot)` so a slot sees a consistent viewpoint.
#[derive(Debug, Clone)]
pub struct PointCloudProjection {
    intrinsics: Intrinsics,
    width: u32,
    height: u32,
    angle: f32,
    z_target: f32,
    jitter: Option<Jitter>,
    seed: u64,
}

impl PointCloudProjection {
    pub fn new(intrinsics: Intrinsics, width: u32, height: u32) -> Self {
        Self {
            intrinsics,
            width,
            height,
            angle: 0.0,
            z_target: 0.0,
            jitter: None,
            seed: 0,
        }
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_z_target(mut self, z_target: f32) -> Self {
        self.z_target = z_target;
        self
    }

    pub fn with_jitter(mut self, jitter: Jitter, seed: u64) -> Self {
        self.jitter = Some(jitter);
        self.seed = seed;
        self
    }

    fn slot_pose(&self, slot: usize) -> Result<Pose, TransformError> {
        let Some(jitter) = self.jitter else {
            return Ok(Pose {
                rotation: Quat::IDENTITY,
                translation: Vec3::ZERO,
            });
        };
        let mut rng = StdRng::seed_from_u64(self.seed ^ slot as u64);
        let mut draw = [0.0f32; 6];
        for (i, value) in draw.iter_mut().enumerate() {
            let normal = Normal::new(jitter.loc[i], jitter.scale[i])
                .map_err(|e| TransformError::Shape(format!("invalid jitter: {}", e)))?;
            *value = normal.sample(&mut rng);
        }
        Ok(Pose {
            rotation: Quat::from_euler(EulerRot::XYZ, draw[0], draw[1], draw[2]),
            translation: Vec3::new(draw[3], draw[4], draw[5]),
        })
    }

    /// Render an already loaded cloud.
    pub fn render(&self, cloud: &PointCloud, slot: usize) -> Result<Array3<f32>, TransformError> {
        let (w, h) = (self.width as usize, self.height as usize);
        let mut tensor = Array3::<f32>::zeros((RGBD_CHANNELS, h, w));
        if cloud.is_empty() {
            return Ok(tensor);
        }

        let centroid = cloud.iter().map(|p| p.position).sum::<Vec3>() / cloud.len() as f32;
        let anchor = if self.z_target > 0.0 {
            Vec3::new(centroid.x, centroid.y, self.z_target)
        } else {
            centroid
        };
        let pose = self.slot_pose(slot)?;
        let rotation = pose.rotation * Quat::from_rotation_x(self.angle);

        let sx = self.width as f32 / self.intrinsics.width as f32;
        let sy = self.height as f32 / self.intrinsics.height as f32;
        let (fx, fy) = (self.intrinsics.fx * sx, self.intrinsics.fy * sy);
        let (cx, cy) = (self.intrinsics.cx * sx, self.intrinsics.cy * sy);

        let mut zbuffer = vec![f32::INFINITY; w * h];
        for point in cloud.iter() {
            let p = rotation * (point.position - centroid) + anchor + pose.translation;
            if p.z <= 0.0 {
                continue;
            }
            let u = (fx * p.x / p.z + cx).floor();
            let v = (fy * p.y / p.z + cy).floor();
            if u < 0.0 || v < 0.0 || u >= w as f32 || v >= h as f32 {
                continue;
            }
            let (u, v) = (u as usize, v as usize);
            let cell = &mut zbuffer[v * w + u];
            if p.z < *cell {
                *cell = p.z;
                tensor[[0, v, u]] = point.color.x;
                tensor[[1, v, u]] = point.color.y;
                tensor[[2, v, u]] = point.color.z;
                tensor[[3, v, u]] = p.z;
            }
        }
        Ok(tensor)
    }
}

impl FrameTransform for PointCloudProjection {
    fn frame_shape(&self) -> [usize; 3] {
        [RGBD_CHANNELS, self.height as usize, self.width as usize]
    }

    fn apply(&self, frame: &Path, slot: usize) -> Result<Array3<f32>, TransformError> {
        let cloud = load_point_cloud(frame)?;
        self.render(&cloud, slot)
    }
}
