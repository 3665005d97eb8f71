//! Math utilities and types
//!
//! Provides the fundamental math types shared by the scene runtime.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::*;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Compose a local transform matrix.
    ///
    /// Points are scaled first, then rotated, then translated.
    pub fn trs_matrix(position: &Vec3, rotation: &Quat, scale: &Vec3) -> Mat4 {
        Mat4::new_translation(position)
            * rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(scale)
    }

    /// Build a rotation of `degrees` around `axis`
    ///
    /// A zero-length axis yields the identity rotation.
    pub fn quat_from_axis_angle(axis: &Vec3, degrees: f32) -> Quat {
        Unit::try_new(*axis, f32::EPSILON)
            .map_or_else(Quat::identity, |axis| Quat::from_axis_angle(&axis, deg_to_rad(degrees)))
    }

    /// Build a rotation from raw `x y z w` components, normalizing them
    pub fn quat_from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Quat {
        Quat::new_normalize(Quaternion::new(w, x, y, z))
    }

    /// Raw `[x, y, z, w]` components of a rotation
    pub fn quat_to_xyzw(rotation: &Quat) -> [f32; 4] {
        let q = rotation.quaternion();
        [q.i, q.j, q.k, q.w]
    }

    /// Forward direction (-Z) rotated by `rotation`
    pub fn forward(rotation: &Quat) -> Vec3 {
        rotation * Vec3::new(0.0, 0.0, -1.0)
    }

    /// Up direction (+Y) rotated by `rotation`
    pub fn up(rotation: &Quat) -> Vec3 {
        rotation * Vec3::new(0.0, 1.0, 0.0)
    }

    /// Right direction (+X) rotated by `rotation`
    pub fn right(rotation: &Quat) -> Vec3 {
        rotation * Vec3::new(1.0, 0.0, 0.0)
    }

    /// Translation part of an affine matrix
    pub fn translation_of(matrix: &Mat4) -> Vec3 {
        Vec3::new(matrix.m14, matrix.m24, matrix.m34)
    }
}
