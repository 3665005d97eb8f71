//! Spatial queries
//!
//! Bounding volumes and the ray, frustum and box tests the scene runs over
//! its entities.

mod bounding;

pub use bounding::{
    distance_ray_plane, BoundingBox, BoundingSphere, Frustum, FrustumPlane, IntersectionType,
    Plane, Ray, RaycastResult,
};
