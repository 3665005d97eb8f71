//! Transform hierarchy
//!
//! Local TRS state plus parent/child links. World matrices are recomputed
//! eagerly: every mutation rebuilds the entity's matrix from its parent's and
//! then recurses into all descendants, so no entity is ever observed with a
//! stale matrix. The cost is O(subtree) per mutation.

use log::warn;

use super::entity::{Entity, EntityFlags, EntityHandle, EntityType};
use crate::foundation::math::{utils, Mat4, Quat, Vec3};

/// Frame a translation or rotation is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformSpace {
    /// The entity's own axes
    Local,
    /// The parent's axes
    Parent,
    /// World axes
    World,
}

/// Local placement and hierarchy links of one entity
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Local position
    pub position: Vec3,
    /// Local per-axis scale
    pub scale: Vec3,
    /// Local rotation
    pub rotation: Quat,
    /// `parent.world_matrix * T * R * S`
    pub world_matrix: Mat4,
    /// Set whenever the world matrix is recomputed
    pub is_modified: bool,
    /// Set for static meshes whose physics body needs the new pose
    pub sync_physics: bool,
    /// Parent, `None` only for the root
    pub parent: Option<EntityHandle>,
    /// Children in insertion order
    pub children: Vec<EntityHandle>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            scale: Vec3::repeat(1.0),
            rotation: Quat::identity(),
            world_matrix: Mat4::identity(),
            is_modified: false,
            sync_physics: false,
            parent: None,
            children: Vec::new(),
        }
    }
}

impl Transform {
    /// Matrix of the local TRS alone
    pub fn local_matrix(&self) -> Mat4 {
        utils::trs_matrix(&self.position, &self.rotation, &self.scale)
    }

    /// Local forward (-Z)
    pub fn forward(&self) -> Vec3 {
        utils::forward(&self.rotation)
    }

    /// Local up (+Y)
    pub fn up(&self) -> Vec3 {
        utils::up(&self.rotation)
    }

    /// Local right (+X)
    pub fn right(&self) -> Vec3 {
        utils::right(&self.rotation)
    }

    /// Point one unit ahead of the local position
    pub fn lookat(&self) -> Vec3 {
        self.position + self.forward()
    }
}

/// Hierarchy operations over any entity container
///
/// Implementors only resolve handles; every operation is provided.
pub trait TransformHierarchy {
    /// Resolve a live entity
    fn entity(&self, handle: EntityHandle) -> Option<&Entity>;

    /// Resolve a live entity mutably
    fn entity_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity>;

    /// Move by `amount` expressed in `space`
    fn translate(&mut self, handle: EntityHandle, amount: &Vec3, space: TransformSpace) {
        let Some(entity) = self.entity(handle) else { return };
        let amount = match space {
            TransformSpace::Local => entity.transform.rotation * amount,
            TransformSpace::Parent => entity
                .transform
                .parent
                .and_then(|parent| self.entity(parent))
                .map_or(*amount, |parent| parent.transform.rotation * amount),
            TransformSpace::World => *amount,
        };

        if let Some(entity) = self.entity_mut(handle) {
            entity.transform.position += amount;
        }
        self.update_world_matrix(handle);
    }

    /// Rotate by `degrees` around `axis`
    ///
    /// Local rotations post-multiply, parent and world rotations pre-multiply.
    fn rotate(&mut self, handle: EntityHandle, axis: &Vec3, degrees: f32, space: TransformSpace) {
        let delta = utils::quat_from_axis_angle(axis, degrees);
        let Some(entity) = self.entity_mut(handle) else { return };
        let rotation = entity.transform.rotation;
        entity.transform.rotation = match space {
            TransformSpace::Local => rotation * delta,
            TransformSpace::Parent | TransformSpace::World => delta * rotation,
        };
        self.update_world_matrix(handle);
    }

    /// Replace the local scale
    fn set_scale(&mut self, handle: EntityHandle, scale: &Vec3) {
        let Some(entity) = self.entity_mut(handle) else { return };
        entity.transform.scale = *scale;
        self.update_world_matrix(handle);
    }

    /// Replace the local position
    fn set_position(&mut self, handle: EntityHandle, position: &Vec3) {
        let Some(entity) = self.entity_mut(handle) else { return };
        entity.transform.position = *position;
        self.update_world_matrix(handle);
    }

    /// Replace the local rotation
    fn set_rotation(&mut self, handle: EntityHandle, rotation: &Quat) {
        let Some(entity) = self.entity_mut(handle) else { return };
        entity.transform.rotation = *rotation;
        self.update_world_matrix(handle);
    }

    /// Identity TRS, keeping parent and children
    fn transform_reset(&mut self, handle: EntityHandle) {
        let Some(entity) = self.entity_mut(handle) else { return };
        entity.transform.position = Vec3::zeros();
        entity.transform.scale = Vec3::repeat(1.0);
        entity.transform.rotation = Quat::identity();
        self.update_world_matrix(handle);
    }

    /// Copy local TRS from `source`, keeping `target`'s children
    ///
    /// With `copy_parent` the target is also moved under the source's parent.
    fn transform_copy(&mut self, target: EntityHandle, source: EntityHandle, copy_parent: bool) {
        let Some(from) = self.entity(source) else { return };
        let (position, scale, rotation, parent) = (
            from.transform.position,
            from.transform.scale,
            from.transform.rotation,
            from.transform.parent,
        );

        let Some(to) = self.entity_mut(target) else { return };
        to.transform.position = position;
        to.transform.scale = scale;
        to.transform.rotation = rotation;

        if copy_parent {
            if let Some(parent) = parent {
                self.parent_set(target, parent, false);
            }
        }
        self.update_world_matrix(target);
    }

    /// Whether `ancestor` is on the parent chain of `handle`
    fn is_ancestor(&self, ancestor: EntityHandle, handle: EntityHandle) -> bool {
        let mut current = self.entity(handle).and_then(|entity| entity.transform.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.entity(parent).and_then(|entity| entity.transform.parent);
        }
        false
    }

    /// Append `child` to `parent`'s children and point it at `parent`
    ///
    /// Rejects duplicates and links that would close a cycle. The child is
    /// not detached from a previous parent; use [`parent_set`](Self::parent_set) for that.
    fn child_add(&mut self, parent: EntityHandle, child: EntityHandle, update: bool) -> bool {
        if parent == child || self.is_ancestor(child, parent) {
            warn!("Cannot add {child:?} as a child of its own descendant {parent:?}");
            return false;
        }
        let Some(child_name) = self.entity(child).map(|entity| entity.name.clone()) else {
            return false;
        };
        let Some(parent_entity) = self.entity_mut(parent) else {
            warn!("Cannot add '{child_name}' to missing parent {parent:?}");
            return false;
        };

        if parent_entity.transform.children.contains(&child) {
            warn!("Parent '{}' already has a child named '{child_name}'", parent_entity.name);
            return false;
        }
        parent_entity.transform.children.push(child);

        if let Some(child_entity) = self.entity_mut(child) {
            child_entity.transform.parent = Some(parent);
        }
        if update {
            self.update_world_matrix(child);
        }
        true
    }

    /// Remove `child` from `parent`'s children and clear its parent link
    fn child_remove(&mut self, parent: EntityHandle, child: EntityHandle) -> bool {
        let removed = self.entity_mut(parent).is_some_and(|parent_entity| {
            let children = &mut parent_entity.transform.children;
            children
                .iter()
                .position(|existing| *existing == child)
                .map(|index| children.remove(index))
                .is_some()
        });

        if let Some(child_entity) = self.entity_mut(child) {
            if child_entity.transform.parent == Some(parent) {
                child_entity.transform.parent = None;
            }
        }
        removed
    }

    /// Move `child` under `parent`
    ///
    /// Returns false, leaving the hierarchy unchanged, when `parent` is
    /// `child` itself or one of its descendants.
    fn parent_set(&mut self, child: EntityHandle, parent: EntityHandle, update: bool) -> bool {
        if child == parent || self.is_ancestor(child, parent) {
            warn!("Rejected re-parenting {child:?} under its own descendant {parent:?}");
            return false;
        }
        if self.entity(parent).is_none() {
            warn!("Cannot re-parent {child:?} to missing parent {parent:?}");
            return false;
        }
        let Some(old_parent) = self.entity(child).map(|entity| entity.transform.parent) else {
            return false;
        };

        if old_parent != Some(parent) {
            if let Some(old_parent) = old_parent {
                if !self.child_remove(old_parent, child) {
                    warn!("{child:?} was not among the children of {old_parent:?}");
                }
            }
            if !self.child_add(parent, child, false) {
                return false;
            }
        }

        if update {
            self.update_world_matrix(child);
        }
        true
    }

    /// Rebuild the world matrix of `handle` and every descendant
    fn update_world_matrix(&mut self, handle: EntityHandle) {
        let parent_world = self
            .entity(handle)
            .and_then(|entity| entity.transform.parent)
            .and_then(|parent| self.entity(parent))
            .map_or_else(Mat4::identity, |parent| parent.transform.world_matrix);

        let Some(entity) = self.entity_mut(handle) else { return };
        entity.transform.world_matrix = parent_world * entity.transform.local_matrix();
        entity.update_derived_bounding_box();
        entity.transform.is_modified = true;
        if entity.kind == EntityType::StaticMesh {
            entity.transform.sync_physics = true;
        }

        let mut index = 0;
        loop {
            let child = self
                .entity(handle)
                .and_then(|entity| entity.transform.children.get(index).copied());
            let Some(child) = child else { break };
            self.update_world_matrix(child);
            index += 1;
        }
    }

    /// Detach from the parent, mark children for deletion and clear the transform
    fn transform_destroy(&mut self, handle: EntityHandle) {
        let Some(entity) = self.entity_mut(handle) else { return };
        let children = std::mem::take(&mut entity.transform.children);
        let parent = entity.transform.parent;

        for child in children {
            if let Some(child_entity) = self.entity_mut(child) {
                child_entity.flags |= EntityFlags::MARKED_FOR_DELETION;
                child_entity.transform.parent = None;
            }
        }
        if let Some(parent) = parent {
            self.child_remove(parent, handle);
        }
        if let Some(entity) = self.entity_mut(handle) {
            entity.transform = Transform::default();
        }
    }

    /// World-space position
    fn absolute_position(&self, handle: EntityHandle) -> Vec3 {
        self.entity(handle)
            .map_or_else(Vec3::zeros, |entity| utils::translation_of(&entity.transform.world_matrix))
    }

    /// World-space rotation, the parent chain's rotations applied outside-in
    fn absolute_rotation(&self, handle: EntityHandle) -> Quat {
        let Some(entity) = self.entity(handle) else {
            return Quat::identity();
        };
        let mut rotation = entity.transform.rotation;
        let mut current = entity.transform.parent;
        while let Some(parent) = current.and_then(|parent| self.entity(parent)) {
            rotation = parent.transform.rotation * rotation;
            current = parent.transform.parent;
        }
        rotation
    }

    /// Component-wise product of scales up the parent chain
    fn absolute_scale(&self, handle: EntityHandle) -> Vec3 {
        let Some(entity) = self.entity(handle) else {
            return Vec3::repeat(1.0);
        };
        let mut scale = entity.transform.scale;
        let mut current = entity.transform.parent;
        while let Some(parent) = current.and_then(|parent| self.entity(parent)) {
            scale.component_mul_assign(&parent.transform.scale);
            current = parent.transform.parent;
        }
        scale
    }

    /// World-space forward
    fn absolute_forward(&self, handle: EntityHandle) -> Vec3 {
        utils::forward(&self.absolute_rotation(handle))
    }

    /// World-space up
    fn absolute_up(&self, handle: EntityHandle) -> Vec3 {
        utils::up(&self.absolute_rotation(handle))
    }

    /// World-space right
    fn absolute_right(&self, handle: EntityHandle) -> Vec3 {
        utils::right(&self.absolute_rotation(handle))
    }

    /// Point one unit ahead of the world-space position
    fn absolute_lookat(&self, handle: EntityHandle) -> Vec3 {
        self.absolute_position(handle) + self.absolute_forward(handle)
    }
}
