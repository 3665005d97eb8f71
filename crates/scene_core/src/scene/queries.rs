//! Ray queries over the scene
//!
//! Every query tests the derived (world-space) bounding box of each active
//! entity whose kind is selected by the [`RayMask`]. Entities flagged
//! `IGNORE_RAYCAST` are skipped.

use super::entity::{EntityFlags, EntityHandle, EntityType, RayMask};
use super::scene_graph::Scene;
use super::transform::TransformHierarchy;
use crate::foundation::math::Vec3;
use crate::spatial::{BoundingBox, Ray, RaycastResult};

struct ClosestHit {
    handle: EntityHandle,
    distance: f32,
    bounds: BoundingBox,
    point: Vec3,
}

impl Scene {
    fn ray_candidates(&self, mask: RayMask) -> impl Iterator<Item = EntityHandle> + '_ {
        EntityType::ARENA_ORDER
            .into_iter()
            .chain(std::iter::once(EntityType::Player))
            .filter(move |kind| mask.intersects(kind.ray_mask()))
            .flat_map(|kind| self.handles_of_kind(kind))
            .filter(|handle| {
                self.entity(*handle)
                    .is_some_and(|entity| !entity.flags.contains(EntityFlags::IGNORE_RAYCAST))
            })
    }

    /// Every entity the ray passes through, in lookup order
    ///
    /// Holds at most [`raycast_capacity`](Scene::raycast_capacity) hits;
    /// further hits are dropped with a warning.
    pub fn ray_intersect(&self, ray: &Ray, mask: RayMask) -> RaycastResult<EntityHandle> {
        let mut result = RaycastResult::with_capacity(self.raycast_capacity);
        for handle in self.ray_candidates(mask) {
            let Some(entity) = self.entity(handle) else { continue };
            if entity.derived_bounding_box.intersect_ray(ray).is_some() && !result.push(handle) {
                break;
            }
        }
        result
    }

    /// Single best hit of the ray
    ///
    /// Candidates are ranked by the distance along the ray to where it enters
    /// their box. A candidate replaces the current best when it is strictly
    /// nearer, or when its box contains the point where the ray enters the
    /// best box, the best box does not contain the candidate box and the
    /// candidate is farther away. An enclosing box is always entered first,
    /// so nested boxes resolve to the outermost one whatever the lookup order.
    pub fn ray_intersect_closest(&self, ray: &Ray, mask: RayMask) -> Option<EntityHandle> {
        let mut best: Option<ClosestHit> = None;
        for handle in self.ray_candidates(mask) {
            let Some(entity) = self.entity(handle) else { continue };
            let bounds = entity.derived_bounding_box;
            let Some(distance) = bounds.intersect_ray(ray) else { continue };

            let replace = match &best {
                None => true,
                Some(current) => {
                    let encloses = bounds.contains_point(&current.point)
                        && !current.bounds.contains_box(&bounds)
                        && distance > current.distance;
                    encloses || distance < current.distance
                }
            };
            if replace {
                best = Some(ClosestHit {
                    handle,
                    distance,
                    bounds,
                    point: ray.point_at(distance),
                });
            }
        }
        best.map(|hit| hit.handle)
    }

    /// Distance between the absolute positions of two live entities
    pub fn entity_distance(&self, first: EntityHandle, second: EntityHandle) -> Option<f32> {
        self.entity(first)?;
        self.entity(second)?;
        Some((self.absolute_position(first) - self.absolute_position(second)).norm())
    }
}
