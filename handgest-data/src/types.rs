//! Core point cloud types.
//!
//! CPU-side representation of one captured frame.

use glam::Vec3;

/// A colored point in camera space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Position in meters.
    pub position: Vec3,
    /// RGB color (0-1 range).
    pub color: Vec3,
}

impl Point {
    /// Create a new point with position and color.
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self { position, color }
    }
}

/// A single point cloud frame.
#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    pub points: Vec<Point>,
}

impl PointCloud {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_creation() {
        let p = Point::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(p.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p.color, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_point_cloud_len() {
        let cloud = PointCloud::new(vec![Point::new(Vec3::Z, Vec3::ONE); 3]);
        assert_eq!(cloud.len(), 3);
        assert!(!cloud.is_empty());
        assert!(PointCloud::default().is_empty());
    }
}
