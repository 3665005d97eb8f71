//! Camera payload

use super::{scene_object, Duplicable, Resettable, Serializable};
use crate::foundation::math::{utils, Mat4, Vec4};
use crate::scene::services::Services;
use crate::scene::{Entity, EntityType};
use crate::serialization::KeyValueStore;
use crate::spatial::Frustum;

/// Fixed camera slots created by scene init
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraRole {
    /// Free-flying editor camera
    Editor,
    /// Camera attached to the player
    Game,
}

impl CameraRole {
    /// Camera arena slot reserved for this role
    pub const fn index(self) -> usize {
        match self {
            Self::Editor => 0,
            Self::Game => 1,
        }
    }
}

/// Perspective or orthographic camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Base entity
    pub base: Entity,
    /// Projection matrix
    pub proj_matrix: Mat4,
    /// Inverse of the world matrix
    pub view_matrix: Mat4,
    /// `proj * view`
    pub view_proj_matrix: Mat4,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Width over height
    pub aspect_ratio: f32,
    /// Near clip distance
    pub nearz: f32,
    /// Far clip distance
    pub farz: f32,
    /// Divides the field of view, or the extents when orthographic
    pub zoom: f32,
    /// Orthographic projection
    pub ortho: bool,
    /// Follows viewport resizes
    pub resizeable: bool,
    /// Clear color, RGBA
    pub clear_color: Vec4,
    /// Renders into an offscreen texture
    pub render_texture: bool,
    /// Planes extracted from `view_proj_matrix`
    pub frustum: Frustum,
}

scene_object!(Camera, EntityType::Camera);

impl Camera {
    pub(crate) fn with_base(base: Entity) -> Self {
        Self {
            base,
            proj_matrix: Mat4::identity(),
            view_matrix: Mat4::identity(),
            view_proj_matrix: Mat4::identity(),
            fov: 60.0,
            aspect_ratio: 4.0 / 3.0,
            nearz: 0.1,
            farz: 1000.0,
            zoom: 1.0,
            ortho: false,
            resizeable: true,
            clear_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            render_texture: false,
            frustum: Frustum::default(),
        }
    }

    /// Aspect ratio for a drawable size, 4:3 when degenerate
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect_for(width: u32, height: u32) -> f32 {
        let aspect = width as f32 / height as f32;
        if aspect.is_finite() && aspect > 0.0 { aspect } else { 4.0 / 3.0 }
    }

    /// Set the aspect ratio from a drawable size and rebuild every matrix
    pub fn init(&mut self, width: u32, height: u32) {
        self.aspect_ratio = Self::aspect_for(width, height);
        self.update_proj();
        self.update_view();
    }

    /// Rebuild the projection
    pub fn update_proj(&mut self) {
        let zoom = if self.zoom > 0.0 { self.zoom } else { 1.0 };
        self.proj_matrix = if self.ortho {
            let half_width = self.aspect_ratio / zoom;
            let half_height = 1.0 / zoom;
            Mat4::new_orthographic(-half_width, half_width, -half_height, half_height, self.nearz, self.farz)
        } else {
            Mat4::new_perspective(self.aspect_ratio, utils::deg_to_rad(self.fov / zoom), self.nearz, self.farz)
        };
        self.update_view_proj();
    }

    /// Rebuild the view from the world matrix
    pub fn update_view(&mut self) {
        self.view_matrix = self
            .base
            .transform
            .world_matrix
            .try_inverse()
            .unwrap_or_else(Mat4::identity);
        self.update_view_proj();
    }

    fn update_view_proj(&mut self) {
        self.view_proj_matrix = self.proj_matrix * self.view_matrix;
        self.frustum = Frustum::from_matrix(&self.view_proj_matrix);
    }

    fn clear_payload(&mut self) {
        let base = std::mem::replace(&mut self.base, Entity::new(EntityType::Camera, 0));
        *self = Self::with_base(base);
    }
}

impl Serializable for Camera {
    const KEYS: &'static [&'static str] = &[
        "ortho",
        "resizeable",
        "fov",
        "zoom",
        "nearz",
        "farz",
        "clear_color",
        "render_texture",
    ];

    fn write_fields(&self, data: &mut KeyValueStore) {
        data.set("ortho", self.ortho);
        data.set("resizeable", self.resizeable);
        data.set("fov", self.fov);
        data.set("zoom", self.zoom);
        data.set("nearz", self.nearz);
        data.set("farz", self.farz);
        data.set("clear_color", self.clear_color);
        data.set("render_texture", self.render_texture);
    }

    fn read_fields(&mut self, data: &KeyValueStore) {
        data.read_into("ortho", &mut self.ortho);
        data.read_into("resizeable", &mut self.resizeable);
        data.read_into("fov", &mut self.fov);
        data.read_into("zoom", &mut self.zoom);
        data.read_into("nearz", &mut self.nearz);
        data.read_into("farz", &mut self.farz);
        data.read_into("clear_color", &mut self.clear_color);
        data.read_into("render_texture", &mut self.render_texture);
        self.update_proj();
        self.update_view();
    }
}

impl Duplicable for Camera {
    fn duplicate_from(&mut self, source: &Self) {
        self.fov = source.fov;
        self.aspect_ratio = source.aspect_ratio;
        self.nearz = source.nearz;
        self.farz = source.farz;
        self.zoom = source.zoom;
        self.ortho = source.ortho;
        self.resizeable = source.resizeable;
        self.clear_color = source.clear_color;
        self.render_texture = source.render_texture;
        self.update_proj();
        self.update_view();
    }
}

impl Resettable for Camera {
    fn reset(&mut self, _services: &mut Services) {
        self.clear_payload();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::scene::kinds::SceneObject;
    use approx::assert_relative_eq;

    #[test]
    fn test_aspect_ratio_fallback() {
        assert_relative_eq!(Camera::aspect_for(1280, 720), 1280.0 / 720.0);
        assert_relative_eq!(Camera::aspect_for(1280, 0), 4.0 / 3.0);
    }

    #[test]
    fn test_view_is_inverse_world() {
        let mut camera = Camera::new_slot(0);
        camera.base.transform.world_matrix = Mat4::new_translation(&Vec3::new(0.0, 0.0, 5.0));
        camera.init(800, 600);

        let in_front = camera.view_matrix.transform_point(&nalgebra::Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(in_front.z, -5.0, epsilon = 1e-5);
        assert!(camera.frustum.contains_point(&Vec3::zeros()));
        assert!(!camera.frustum.contains_point(&Vec3::new(0.0, 0.0, 10.0)));
    }

    #[test]
    fn test_fields_round_trip_through_store() {
        let mut camera = Camera::new_slot(0);
        camera.fov = 75.0;
        camera.ortho = true;
        camera.clear_color = Vec4::new(0.6, 0.6, 0.9, 1.0);

        let mut data = KeyValueStore::new();
        camera.write_fields(&mut data);
        let mut loaded = Camera::new_slot(1);
        loaded.read_fields(&data);

        assert_relative_eq!(loaded.fov, 75.0);
        assert!(loaded.ortho);
        assert_relative_eq!(loaded.clear_color, camera.clear_color);
    }

    #[test]
    fn test_reset_restores_defaults_and_keeps_base() {
        let mut camera = Camera::new_slot(4);
        camera.fov = 10.0;
        camera.reset(&mut Services::null());
        assert_relative_eq!(camera.fov, 60.0);
        assert_eq!(camera.base.id, 4);
    }
}
