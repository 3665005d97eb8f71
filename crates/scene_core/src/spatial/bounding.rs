//! Bounding volumes and intersection routines
//!
//! All tests expect volumes already expressed in world space, except the
//! sphere tests which take the owner's absolute position (and scale for the
//! frustum test) explicitly.

use log::warn;

use crate::foundation::math::{Mat4, Point3, Vec3, Vec4};

/// Result of classifying one volume against another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntersectionType {
    /// Completely outside
    Outside,
    /// Partially overlapping
    Intersect,
    /// Completely inside
    Inside,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl BoundingBox {
    /// Create a box from min and max corners
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Unit cube centred on the origin
    pub fn unit() -> Self {
        Self::from_center_extents(Vec3::zeros(), Vec3::repeat(0.5))
    }

    /// Create a box centred at a point with given half-size
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Center of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half-size of the box
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// The 8 corners
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Axis-aligned envelope of this box's corners after `matrix`
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let mut min = Vec3::repeat(f32::INFINITY);
        let mut max = Vec3::repeat(f32::NEG_INFINITY);
        for corner in self.corners() {
            let point = matrix.transform_point(&Point3::from(corner)).coords;
            min = min.inf(&point);
            max = max.sup(&point);
        }
        Self { min, max }
    }

    /// Check if this box contains a point, boundary included
    pub fn contains_point(&self, point: &Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if `other` lies completely inside this box
    pub fn contains_box(&self, other: &Self) -> bool {
        self.contains_point(&other.min) && self.contains_point(&other.max)
    }

    /// Check if this box overlaps another
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Classify `other` against this box
    pub fn classify_box(&self, other: &Self) -> IntersectionType {
        if !self.intersects(other) {
            IntersectionType::Outside
        } else if self.contains_box(other) {
            IntersectionType::Inside
        } else {
            IntersectionType::Intersect
        }
    }

    /// Slab test. Returns the entry distance, or 0 when the origin is inside.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = ray.direction.map(|d| if d == 0.0 { f32::INFINITY } else { 1.0 / d });

        let mut tmin = f32::NEG_INFINITY;
        let mut tmax = f32::INFINITY;
        for axis in 0..3 {
            let t1 = (self.min[axis] - ray.origin[axis]) * inv_dir[axis];
            let t2 = (self.max[axis] - ray.origin[axis]) * inv_dir[axis];
            // NaN from 0 * inf means the origin sits on a slab of a parallel ray
            let (near, far) = if t1.is_nan() || t2.is_nan() {
                if ray.origin[axis] < self.min[axis] || ray.origin[axis] > self.max[axis] {
                    return None;
                }
                continue;
            } else {
                (t1.min(t2), t1.max(t2))
            };
            tmin = tmin.max(near);
            tmax = tmax.min(far);
        }

        (tmax >= tmin && tmax >= 0.0).then(|| tmin.max(0.0))
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::unit()
    }
}

/// Bounding sphere in the owner's local frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Center relative to the owner
    pub center: Vec3,
    /// Radius
    pub radius: f32,
}

impl BoundingSphere {
    /// Create a sphere
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Smallest sphere around a box
    pub fn from_box(bounds: &BoundingBox) -> Self {
        Self {
            center: bounds.center(),
            radius: bounds.extents().norm(),
        }
    }

    /// Ray test against the sphere placed at `abs_position`
    ///
    /// An origin inside the sphere is a hit at distance 0. Spheres entirely
    /// behind the origin are missed.
    pub fn intersect_ray(&self, abs_position: &Vec3, ray: &Ray) -> Option<f32> {
        let center = self.center + abs_position;
        let squared_radius = self.radius * self.radius;
        let oc = ray.origin - center;

        if oc.norm_squared() <= squared_radius {
            return Some(0.0);
        }

        let a = ray.direction.dot(&ray.direction);
        let b = 2.0 * oc.dot(&ray.direction);
        let c = oc.dot(&oc) - squared_radius;
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let t = (-b - discriminant.sqrt()) / (2.0 * a);
        (t >= 0.0).then_some(t)
    }
}

/// A ray with a normalized direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Origin in world space
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    /// Creates a ray, normalizing `direction`
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros),
        }
    }

    /// Point at distance `t` along the ray
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Plane `normal . p + distance = 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal
    pub normal: Vec3,
    /// Signed offset from the origin
    pub distance: f32,
}

impl Plane {
    /// Create a plane, normalizing the normal
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal: normal.normalize(), distance }
    }

    /// Plane from raw `(a, b, c, d)` coefficients, normalized by `|(a, b, c)|`
    pub fn from_coefficients(coefficients: &Vec4) -> Self {
        let normal = coefficients.xyz();
        let length = normal.norm();
        if length <= f32::EPSILON {
            return Self { normal, distance: coefficients.w };
        }
        Self {
            normal: normal / length,
            distance: coefficients.w / length,
        }
    }

    /// Signed distance from the plane to a point
    pub fn distance_to_point(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// Distance along `ray` to `plane`, `+inf` when parallel or behind
pub fn distance_ray_plane(ray: &Ray, plane: &Plane) -> f32 {
    let dot = plane.normal.dot(&ray.direction);
    if dot.abs() < f32::EPSILON {
        return f32::INFINITY;
    }
    let t = -(plane.normal.dot(&ray.origin) + plane.distance) / dot;
    if t >= 0.0 { t } else { f32::INFINITY }
}

/// Index of each frustum plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum FrustumPlane {
    /// Left
    Left = 0,
    /// Right
    Right,
    /// Bottom
    Bottom,
    /// Top
    Top,
    /// Near
    Near,
    /// Far
    Far,
}

/// Six inward-facing planes of a view volume
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// Left, right, bottom, top, near, far
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six planes
    pub const fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract planes from a view-projection matrix (Gribb-Hartmann)
    pub fn from_matrix(view_proj: &Mat4) -> Self {
        let row = |i: usize| -> Vec4 { view_proj.row(i).transpose() };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));
        Self {
            planes: [
                Plane::from_coefficients(&(r3 + r0)),
                Plane::from_coefficients(&(r3 - r0)),
                Plane::from_coefficients(&(r3 + r1)),
                Plane::from_coefficients(&(r3 - r1)),
                Plane::from_coefficients(&(r3 + r2)),
                Plane::from_coefficients(&(r3 - r2)),
            ],
        }
    }

    /// Plane by name
    pub const fn plane(&self, which: FrustumPlane) -> &Plane {
        &self.planes[which as usize]
    }

    /// Classify a world-space box
    pub fn intersect_box(&self, bounds: &BoundingBox) -> IntersectionType {
        let mut result = IntersectionType::Inside;
        for plane in &self.planes {
            let mut positive = bounds.min;
            let mut negative = bounds.max;
            for axis in 0..3 {
                if plane.normal[axis] >= 0.0 {
                    positive[axis] = bounds.max[axis];
                    negative[axis] = bounds.min[axis];
                }
            }

            if plane.distance_to_point(&positive) < 0.0 {
                return IntersectionType::Outside;
            }
            if plane.distance_to_point(&negative) < 0.0 {
                result = IntersectionType::Intersect;
            }
        }
        result
    }

    /// Classify a sphere owned by something at `abs_position` with `abs_scale`
    ///
    /// The radius is scaled by the largest absolute scale component.
    pub fn intersect_sphere(
        &self,
        sphere: &BoundingSphere,
        abs_position: &Vec3,
        abs_scale: &Vec3,
    ) -> IntersectionType {
        let max_scale = abs_scale.abs().max();
        let radius = sphere.radius * max_scale;
        let center = sphere.center + abs_position;

        let mut result = IntersectionType::Inside;
        for plane in &self.planes {
            let distance = plane.distance_to_point(&center);
            if distance < -radius {
                return IntersectionType::Outside;
            }
            if distance.abs() < radius {
                result = IntersectionType::Intersect;
            }
        }
        result
    }

    /// Check if a point is inside every plane
    pub fn contains_point(&self, point: &Vec3) -> bool {
        self.planes.iter().all(|plane| plane.distance_to_point(point) >= 0.0)
    }
}

impl Default for Frustum {
    fn default() -> Self {
        Self::from_matrix(&Mat4::identity())
    }
}

/// Bounded list of ray hits
#[derive(Debug, Clone, PartialEq)]
pub struct RaycastResult<T> {
    hits: Vec<T>,
    capacity: usize,
}

impl<T> RaycastResult<T> {
    /// Create an empty result holding at most `capacity` hits
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            hits: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a hit. Returns false and drops it once the result is full.
    pub fn push(&mut self, hit: T) -> bool {
        if self.hits.len() >= self.capacity {
            warn!("Raycast result full ({} hits), further hits dropped", self.capacity);
            return false;
        }
        self.hits.push(hit);
        true
    }

    /// Recorded hits in query order
    pub fn hits(&self) -> &[T] {
        &self.hits
    }

    /// Number of recorded hits
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether nothing was hit
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Whether no more hits fit
    pub fn is_full(&self) -> bool {
        self.hits.len() >= self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cube(center: Vec3, half: f32) -> BoundingBox {
        BoundingBox::from_center_extents(center, Vec3::repeat(half))
    }

    #[test]
    fn test_ray_box_entry_distance() {
        let bounds = cube(Vec3::new(0.0, 0.0, -10.0), 1.0);
        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, -2.0));
        assert_relative_eq!(bounds.intersect_ray(&ray).unwrap(), 9.0);
    }

    #[test]
    fn test_ray_box_origin_inside_is_zero() {
        let bounds = cube(Vec3::zeros(), 1.0);
        let ray = Ray::new(Vec3::new(0.2, 0.0, 0.0), Vec3::x());
        assert_eq!(bounds.intersect_ray(&ray), Some(0.0));
    }

    #[test]
    fn test_ray_box_miss_and_behind() {
        let bounds = cube(Vec3::new(0.0, 0.0, -10.0), 1.0);
        let sideways = Ray::new(Vec3::zeros(), Vec3::x());
        let backwards = Ray::new(Vec3::zeros(), Vec3::z());
        assert_eq!(bounds.intersect_ray(&sideways), None);
        assert_eq!(bounds.intersect_ray(&backwards), None);
    }

    #[test]
    fn test_axis_parallel_ray_outside_slab_misses() {
        let bounds = cube(Vec3::zeros(), 1.0);
        let ray = Ray::new(Vec3::new(0.0, 5.0, 10.0), -Vec3::z());
        assert_eq!(bounds.intersect_ray(&ray), None);
    }

    #[test]
    fn test_ray_sphere() {
        let sphere = BoundingSphere::new(Vec3::zeros(), 1.0);
        let position = Vec3::new(0.0, 0.0, -5.0);
        let forward = Ray::new(Vec3::zeros(), -Vec3::z());
        let inside = Ray::new(position, Vec3::x());
        let away = Ray::new(Vec3::zeros(), Vec3::z());

        assert_relative_eq!(sphere.intersect_ray(&position, &forward).unwrap(), 4.0, epsilon = 1e-5);
        assert_eq!(sphere.intersect_ray(&position, &inside), Some(0.0));
        assert_eq!(sphere.intersect_ray(&position, &away), None);
    }

    #[test]
    fn test_distance_ray_plane() {
        let ground = Plane::new(Vec3::y(), 0.0);
        let down = Ray::new(Vec3::new(0.0, 3.0, 0.0), -Vec3::y());
        let parallel = Ray::new(Vec3::new(0.0, 3.0, 0.0), Vec3::x());
        let up = Ray::new(Vec3::new(0.0, 3.0, 0.0), Vec3::y());

        assert_relative_eq!(distance_ray_plane(&down, &ground), 3.0);
        assert!(distance_ray_plane(&parallel, &ground).is_infinite());
        assert!(distance_ray_plane(&up, &ground).is_infinite());
    }

    #[test]
    fn test_transformed_box_envelopes_rotated_corners() {
        let rotation = crate::foundation::math::utils::quat_from_axis_angle(&Vec3::y(), 45.0);
        let matrix = crate::foundation::math::utils::trs_matrix(
            &Vec3::new(10.0, 0.0, 0.0),
            &rotation,
            &Vec3::repeat(1.0),
        );
        let derived = BoundingBox::unit().transformed(&matrix);
        let half_diagonal = 0.5 * std::f32::consts::SQRT_2;

        assert_relative_eq!(derived.min, Vec3::new(10.0 - half_diagonal, -0.5, -half_diagonal), epsilon = 1e-5);
        assert_relative_eq!(derived.max, Vec3::new(10.0 + half_diagonal, 0.5, half_diagonal), epsilon = 1e-5);
    }

    #[test]
    fn test_box_classification() {
        let outer = cube(Vec3::zeros(), 2.0);
        assert_eq!(outer.classify_box(&cube(Vec3::zeros(), 1.0)), IntersectionType::Inside);
        assert_eq!(outer.classify_box(&cube(Vec3::new(2.0, 0.0, 0.0), 1.0)), IntersectionType::Intersect);
        assert_eq!(outer.classify_box(&cube(Vec3::new(5.0, 0.0, 0.0), 1.0)), IntersectionType::Outside);
    }

    #[test]
    fn test_frustum_from_perspective() {
        let proj = Mat4::new_perspective(1.0, 60.0_f32.to_radians(), 0.1, 100.0);
        let frustum = Frustum::from_matrix(&proj);

        assert!(frustum.contains_point(&Vec3::new(0.0, 0.0, -10.0)));
        assert!(!frustum.contains_point(&Vec3::new(0.0, 0.0, 10.0)));
        assert!(!frustum.contains_point(&Vec3::new(0.0, 0.0, -200.0)));

        let near_plane = frustum.plane(FrustumPlane::Near);
        assert_relative_eq!(near_plane.normal.norm(), 1.0, epsilon = 1e-5);

        assert_eq!(frustum.intersect_box(&cube(Vec3::new(0.0, 0.0, -10.0), 1.0)), IntersectionType::Inside);
        assert_eq!(frustum.intersect_box(&cube(Vec3::new(0.0, 0.0, 10.0), 1.0)), IntersectionType::Outside);
        assert_eq!(frustum.intersect_box(&cube(Vec3::new(0.0, 0.0, -100.0), 1.0)), IntersectionType::Intersect);
    }

    #[test]
    fn test_frustum_sphere_uses_largest_scale() {
        let proj = Mat4::new_perspective(1.0, 60.0_f32.to_radians(), 0.1, 100.0);
        let frustum = Frustum::from_matrix(&proj);
        let sphere = BoundingSphere::new(Vec3::zeros(), 1.0);
        let behind = Vec3::new(0.0, 0.0, 3.0);

        assert_eq!(frustum.intersect_sphere(&sphere, &behind, &Vec3::repeat(1.0)), IntersectionType::Outside);
        assert_eq!(
            frustum.intersect_sphere(&sphere, &behind, &Vec3::new(1.0, -5.0, 1.0)),
            IntersectionType::Intersect
        );
        assert_eq!(
            frustum.intersect_sphere(&sphere, &Vec3::new(0.0, 0.0, -20.0), &Vec3::repeat(1.0)),
            IntersectionType::Inside
        );
    }

    #[test]
    fn test_raycast_result_is_bounded() {
        let mut result = RaycastResult::with_capacity(2);
        assert!(result.push(1));
        assert!(result.push(2));
        assert!(!result.push(3));
        assert!(result.is_full());
        assert_eq!(result.hits(), &[1, 2]);
    }
}
