//! Collaborator interfaces
//!
//! The scene creates geometry, physics and sound resources for its entities
//! but does not know what the handles mean. The null implementations hand
//! out sequential handles so the runtime works headless.

use log::debug;

use crate::foundation::math::{Quat, Vec3};
use crate::spatial::{distance_ray_plane, BoundingBox, BoundingSphere, Plane, Ray};

/// Loaded geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryHandle(pub u32);

/// Physics rigidbody
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RigidbodyHandle(pub u64);

/// Physics collision shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionShapeHandle(pub u64);

/// Playing or paused sound instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle(pub u32);

/// Audio file container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SoundType {
    /// Fully decoded sample
    #[default]
    Wav,
    /// Streamed file
    Stream,
}

impl SoundType {
    /// Kind for a file integer
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Wav),
            1 => Some(Self::Stream),
            _ => None,
        }
    }

    /// Integer written to files
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Wav => 0,
            Self::Stream => 1,
        }
    }
}

/// Distance attenuation model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttenuationType {
    /// No attenuation
    None,
    /// Inverse distance
    #[default]
    Inverse,
    /// Linear falloff
    Linear,
    /// Exponential falloff
    Exponential,
}

impl AttenuationType {
    /// Model for a file integer
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Inverse),
            2 => Some(Self::Linear),
            3 => Some(Self::Exponential),
            _ => None,
        }
    }

    /// Integer written to files
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Inverse => 1,
            Self::Linear => 2,
            Self::Exponential => 3,
        }
    }
}

/// Spatial parameters pushed to a sound instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundParams {
    /// Playback volume
    pub volume: f32,
    /// Loop when finished
    pub looping: bool,
    /// Distance where attenuation starts
    pub min_distance: f32,
    /// Distance where attenuation stops
    pub max_distance: f32,
    /// Attenuation strength
    pub rolloff_factor: f32,
    /// Attenuation model
    pub attenuation: AttenuationType,
}

/// Geometry loading and bounds
pub trait GeometryProvider {
    /// Load or reuse geometry from a file
    fn create(&mut self, filename: &str) -> Option<GeometryHandle>;
    /// Drop one reference
    fn release(&mut self, handle: GeometryHandle);
    /// Local bounding box
    fn bounding_box(&self, handle: GeometryHandle) -> BoundingBox;
    /// Local bounding sphere
    fn bounding_sphere(&self, handle: GeometryHandle) -> BoundingSphere;
}

/// Rigidbody simulation
pub trait PhysicsBackend {
    /// Push a new pose to a body
    fn body_set_pose(&mut self, body: RigidbodyHandle, position: &Vec3, rotation: &Quat);
    /// Destroy a body
    fn body_remove(&mut self, body: RigidbodyHandle);
    /// Destroy a shape
    fn shape_remove(&mut self, shape: CollisionShapeHandle);
    /// Distance to the first static surface along `ray`
    fn ray_cast(&self, ray: &Ray) -> Option<f32>;
}

/// Sound playback
pub trait SoundBackend {
    /// Create an instance playing `filename`
    fn source_create(&mut self, filename: &str, sound_type: SoundType) -> Option<SoundHandle>;
    /// Destroy an instance
    fn source_release(&mut self, handle: SoundHandle);
    /// Update position and attenuation parameters
    fn source_update(&mut self, handle: SoundHandle, position: &Vec3, params: &SoundParams);
    /// Start or stop playback
    fn source_set_playing(&mut self, handle: SoundHandle, playing: bool);
    /// Move the listener
    fn listener_update(&mut self, position: &Vec3, forward: &Vec3, up: &Vec3);
}

/// Geometry provider backed by nothing
///
/// Every file gets its own handle and a unit box.
#[derive(Debug, Default)]
pub struct NullGeometry {
    filenames: Vec<String>,
    live: usize,
}

impl NullGeometry {
    /// Number of handles created and not yet released
    pub const fn live(&self) -> usize {
        self.live
    }

    /// Filename a handle was created from
    pub fn filename(&self, handle: GeometryHandle) -> Option<&str> {
        self.filenames.get(handle.0 as usize).map(String::as_str)
    }
}

impl GeometryProvider for NullGeometry {
    fn create(&mut self, filename: &str) -> Option<GeometryHandle> {
        let index = self
            .filenames
            .iter()
            .position(|existing| existing == filename)
            .unwrap_or_else(|| {
                self.filenames.push(filename.to_string());
                self.filenames.len() - 1
            });
        self.live += 1;
        debug!("Geometry '{filename}' -> {index}");
        u32::try_from(index).ok().map(GeometryHandle)
    }

    fn release(&mut self, _handle: GeometryHandle) {
        self.live = self.live.saturating_sub(1);
    }

    fn bounding_box(&self, _handle: GeometryHandle) -> BoundingBox {
        BoundingBox::unit()
    }

    fn bounding_sphere(&self, _handle: GeometryHandle) -> BoundingSphere {
        BoundingSphere::from_box(&BoundingBox::unit())
    }
}

/// Physics backend with a single ground plane at `y = 0`
#[derive(Debug)]
pub struct NullPhysics {
    ground: Plane,
}

impl Default for NullPhysics {
    fn default() -> Self {
        Self {
            ground: Plane::new(Vec3::y(), 0.0),
        }
    }
}

impl PhysicsBackend for NullPhysics {
    fn body_set_pose(&mut self, _body: RigidbodyHandle, _position: &Vec3, _rotation: &Quat) {}

    fn body_remove(&mut self, _body: RigidbodyHandle) {}

    fn shape_remove(&mut self, _shape: CollisionShapeHandle) {}

    fn ray_cast(&self, ray: &Ray) -> Option<f32> {
        let distance = distance_ray_plane(ray, &self.ground);
        distance.is_finite().then_some(distance)
    }
}

/// Sound backend that only counts instances
#[derive(Debug, Default)]
pub struct NullSound {
    next: u32,
    live: usize,
}

impl NullSound {
    /// Number of instances created and not yet released
    pub const fn live(&self) -> usize {
        self.live
    }
}

impl SoundBackend for NullSound {
    fn source_create(&mut self, filename: &str, _sound_type: SoundType) -> Option<SoundHandle> {
        let handle = SoundHandle(self.next);
        self.next = self.next.wrapping_add(1);
        self.live += 1;
        debug!("Sound source '{filename}' -> {}", handle.0);
        Some(handle)
    }

    fn source_release(&mut self, _handle: SoundHandle) {
        self.live = self.live.saturating_sub(1);
    }

    fn source_update(&mut self, _handle: SoundHandle, _position: &Vec3, _params: &SoundParams) {}

    fn source_set_playing(&mut self, _handle: SoundHandle, _playing: bool) {}

    fn listener_update(&mut self, _position: &Vec3, _forward: &Vec3, _up: &Vec3) {}
}

/// Boxed collaborators handed to the scene
pub struct Services {
    /// Geometry loading
    pub geometry: Box<dyn GeometryProvider>,
    /// Physics
    pub physics: Box<dyn PhysicsBackend>,
    /// Audio
    pub sound: Box<dyn SoundBackend>,
}

impl Services {
    /// Headless collaborators
    pub fn null() -> Self {
        Self {
            geometry: Box::new(NullGeometry::default()),
            physics: Box::new(NullPhysics::default()),
            sound: Box::new(NullSound::default()),
        }
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::null()
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
