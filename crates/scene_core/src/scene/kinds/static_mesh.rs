//! Static mesh payload

use log::warn;

use super::{scene_object, Duplicable, Resettable, Serializable};
use crate::scene::services::{CollisionShapeHandle, GeometryHandle, RigidbodyHandle, Services};
use crate::scene::{Entity, EntityType};
use crate::serialization::KeyValueStore;

/// Material assigned when none is given
pub const DEFAULT_MATERIAL: &str = "Blinn_Phong";

/// Physics handles owned by a mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Collision {
    /// Body moved by the physics world
    pub rigidbody: Option<RigidbodyHandle>,
    /// Shape without a body, e.g. a ground plane
    pub shape: Option<CollisionShapeHandle>,
}

/// Renderable geometry placed in the world
#[derive(Debug, Clone, PartialEq)]
pub struct StaticMesh {
    /// Base entity
    pub base: Entity,
    /// Geometry file the mesh was created from
    pub geometry_name: String,
    /// Material name
    pub material: String,
    /// Loaded geometry
    pub geometry: Option<GeometryHandle>,
    /// Physics handles
    pub collision: Collision,
}

scene_object!(StaticMesh, EntityType::StaticMesh);

impl StaticMesh {
    pub(crate) fn with_base(base: Entity) -> Self {
        Self {
            base,
            geometry_name: String::new(),
            material: DEFAULT_MATERIAL.to_string(),
            geometry: None,
            collision: Collision::default(),
        }
    }

    /// Load `geometry_name` and take its bounds as the local box
    ///
    /// Any previously loaded geometry is released first. On failure the mesh
    /// keeps a unit box and no geometry.
    pub fn attach_geometry(&mut self, geometry_name: &str, services: &mut Services) -> bool {
        if let Some(previous) = self.geometry.take() {
            services.geometry.release(previous);
        }
        self.geometry_name = geometry_name.to_string();

        match services.geometry.create(geometry_name) {
            Some(handle) => {
                self.geometry = Some(handle);
                self.base.bounding_box = services.geometry.bounding_box(handle);
                self.base.update_derived_bounding_box();
                true
            }
            None => {
                warn!("Failed to load geometry '{geometry_name}' for '{}'", self.base.name);
                self.base.bounding_box_reset(true);
                false
            }
        }
    }

    fn release(&mut self, services: &mut Services) {
        if let Some(shape) = self.collision.shape.take() {
            services.physics.shape_remove(shape);
        }
        if let Some(body) = self.collision.rigidbody.take() {
            services.physics.body_remove(body);
        }
        if let Some(geometry) = self.geometry.take() {
            services.geometry.release(geometry);
        }
    }
}

impl Serializable for StaticMesh {
    const KEYS: &'static [&'static str] = &["geometry", "material"];

    fn write_fields(&self, data: &mut KeyValueStore) {
        data.set("geometry", self.geometry_name.as_str());
        data.set("material", self.material.as_str());
    }

    fn read_fields(&mut self, data: &KeyValueStore) {
        data.read_into("geometry", &mut self.geometry_name);
        data.read_into("material", &mut self.material);
    }
}

impl Duplicable for StaticMesh {
    fn duplicate_from(&mut self, source: &Self) {
        self.geometry_name.clone_from(&source.geometry_name);
        self.material.clone_from(&source.material);
    }
}

impl Resettable for StaticMesh {
    fn reset(&mut self, services: &mut Services) {
        self.release(services);
        self.geometry_name.clear();
        self.material = DEFAULT_MATERIAL.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::kinds::SceneObject;
    use crate::scene::services::{GeometryProvider, NullGeometry};
    use crate::spatial::{BoundingBox, BoundingSphere};
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    /// Geometry that is always twice the unit box and counts releases
    #[derive(Default)]
    struct Doubled {
        inner: NullGeometry,
    }

    impl GeometryProvider for Doubled {
        fn create(&mut self, filename: &str) -> Option<GeometryHandle> {
            (!filename.is_empty()).then(|| self.inner.create(filename)).flatten()
        }

        fn release(&mut self, handle: GeometryHandle) {
            self.inner.release(handle);
        }

        fn bounding_box(&self, _handle: GeometryHandle) -> BoundingBox {
            BoundingBox::new(Vec3::repeat(-1.0), Vec3::repeat(1.0))
        }

        fn bounding_sphere(&self, handle: GeometryHandle) -> BoundingSphere {
            BoundingSphere::from_box(&self.bounding_box(handle))
        }
    }

    fn services() -> Services {
        Services {
            geometry: Box::new(Doubled::default()),
            ..Services::null()
        }
    }

    #[test]
    fn test_attach_takes_geometry_bounds() {
        let mut services = services();
        let mut mesh = StaticMesh::new_slot(0);
        assert!(mesh.attach_geometry("cube.symbres", &mut services));

        assert!(mesh.geometry.is_some());
        assert_relative_eq!(mesh.base.bounding_box.max, Vec3::repeat(1.0));
        assert_relative_eq!(mesh.base.derived_bounding_box.min, Vec3::repeat(-1.0));
    }

    #[test]
    fn test_failed_attach_keeps_unit_box() {
        let mut services = services();
        let mut mesh = StaticMesh::new_slot(0);
        assert!(!mesh.attach_geometry("", &mut services));
        assert_eq!(mesh.geometry, None);
        assert_eq!(mesh.base.bounding_box, BoundingBox::unit());
    }

    #[test]
    fn test_reset_releases_handles() {
        let mut services = services();
        let mut mesh = StaticMesh::new_slot(0);
        mesh.attach_geometry("cube.symbres", &mut services);
        mesh.collision.rigidbody = Some(RigidbodyHandle(9));
        mesh.material = "Unshaded".to_string();

        mesh.reset(&mut services);
        assert_eq!(mesh.geometry, None);
        assert_eq!(mesh.collision, Collision::default());
        assert_eq!(mesh.material, DEFAULT_MATERIAL);
    }
}
