// Math utilities for the scene graph

use glam::{Mat4, Vec3};

/// A node's local transform, kept as a 4x4 affine matrix.
///
/// Every builder call post-multiplies the current matrix, so calls compose
/// in the order they are made: `translate` then `scale` scales the object
/// first and then moves it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: Mat4,
}

impl Transform {
    /// Create an identity transform
    pub fn identity() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
        }
    }

    /// Reset to the identity matrix.
    pub fn load_identity(&mut self) -> &mut Self {
        self.matrix = Mat4::IDENTITY;
        self
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.matrix *= Mat4::from_translation(Vec3::new(x, y, z));
        self
    }

    /// Rotate by `angle` radians about the axis `(x, y, z)`.
    ///
    /// The axis does not need to be unit length. A zero axis leaves the
    /// matrix untouched.
    pub fn rotate(&mut self, angle: f32, x: f32, y: f32, z: f32) -> &mut Self {
        if let Some(axis) = Vec3::new(x, y, z).try_normalize() {
            self.matrix *= Mat4::from_axis_angle(axis, angle);
        }
        self
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.matrix *= Mat4::from_scale(Vec3::new(x, y, z));
        self
    }

    /// Generate transformation matrix
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// Translation column of the matrix.
    pub fn translation(&self) -> Vec3 {
        self.matrix.w_axis.truncate()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
