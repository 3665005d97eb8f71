//! Fixed-capacity generational arenas
//!
//! Slots are allocated up front. Free slots sit on a LIFO list seeded so the
//! first allocations take the lowest indices; a released slot is the next one
//! handed out. Releasing bumps the slot generation so old handles stop
//! resolving.

use log::error;

use super::entity::{EntityFlags, EntityHandle};
use super::kinds::SceneObject;

/// Pre-allocated pool of one entity kind
#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<T>,
    free: Vec<usize>,
    label: &'static str,
}

impl<T: SceneObject> Arena<T> {
    /// Allocate `capacity` inactive slots. `label` names the kind in logs.
    pub fn new(capacity: usize, label: &'static str) -> Self {
        Self {
            slots: (0..capacity).map(T::new_slot).collect(),
            free: (0..capacity).rev().collect(),
            label,
        }
    }

    /// Claim a free slot and mark it active
    ///
    /// Returns `None` (logged) when every slot is taken.
    pub fn allocate(&mut self) -> Option<EntityHandle> {
        let Some(index) = self.free.pop() else {
            error!("Max {} limit reached!", self.label);
            return None;
        };
        let base = self.slots[index].base_mut();
        base.flags = EntityFlags::ACTIVE;
        Some(base.handle())
    }

    /// Return a slot to the free list
    ///
    /// The base entity is reset and its generation bumped. Releasing an
    /// inactive slot does nothing.
    pub fn release(&mut self, index: usize) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        let base = slot.base_mut();
        if !base.is_active() {
            return false;
        }
        base.reset();
        base.generation = base.generation.wrapping_add(1);
        self.free.push(index);
        true
    }

    /// Release every slot and restore the initial allocation order
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            let base = slot.base_mut();
            if base.is_active() {
                base.reset();
                base.generation = base.generation.wrapping_add(1);
            }
        }
        self.free = (0..self.slots.len()).rev().collect();
    }

    fn resolves(slot: &T, handle: EntityHandle) -> bool {
        let base = slot.base();
        handle.kind == T::KIND && base.generation == handle.generation && base.is_active()
    }

    /// Live object for `handle`
    pub fn get(&self, handle: EntityHandle) -> Option<&T> {
        self.slots.get(handle.index).filter(|slot| Self::resolves(slot, handle))
    }

    /// Live object for `handle`, mutably
    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut T> {
        self.slots.get_mut(handle.index).filter(|slot| Self::resolves(slot, handle))
    }

    /// Active object at `index`, whatever its generation
    pub fn slot(&self, index: usize) -> Option<&T> {
        self.slots.get(index).filter(|slot| slot.base().is_active())
    }

    /// Active objects in slot order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter(|slot| slot.base().is_active())
    }

    /// Active objects in slot order, mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().filter(|slot| slot.base().is_active())
    }

    /// Handles of every active object in slot order
    pub fn handles(&self) -> Vec<EntityHandle> {
        self.iter().map(|slot| slot.base().handle()).collect()
    }

    /// First active object named `name`
    pub fn find(&self, name: &str) -> Option<EntityHandle> {
        self.iter()
            .find(|slot| slot.base().name == name)
            .map(|slot| slot.base().handle())
    }

    /// Total slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Active slots
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Whether no slot is active
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every slot is active
    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Entity, EntityType};

    #[test]
    fn test_allocation_starts_at_lowest_index() {
        let mut arena: Arena<Entity> = Arena::new(3, "entities");
        let handles: Vec<_> = (0..3).filter_map(|_| arena.allocate()).collect();
        let indices: Vec<_> = handles.iter().map(|h| h.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(arena.is_full());
    }

    #[test]
    fn test_full_arena_returns_none_without_touching_slots() {
        let mut arena: Arena<Entity> = Arena::new(1, "entities");
        let handle = arena.allocate().unwrap();
        arena.get_mut(handle).unwrap().rename("kept");

        assert_eq!(arena.allocate(), None);
        assert_eq!(arena.get(handle).unwrap().name, "kept");
    }

    #[test]
    fn test_release_invalidates_handle_and_reuses_slot() {
        let mut arena: Arena<Entity> = Arena::new(4, "entities");
        let first = arena.allocate().unwrap();
        let _second = arena.allocate().unwrap();

        assert!(arena.release(first.index));
        assert!(!arena.release(first.index));
        assert!(arena.get(first).is_none());

        let reused = arena.allocate().unwrap();
        assert_eq!(reused.index, first.index);
        assert_eq!(reused.generation, first.generation + 1);
        assert!(arena.get(reused).is_some());
    }

    #[test]
    fn test_handle_of_wrong_kind_does_not_resolve() {
        let mut arena: Arena<Entity> = Arena::new(1, "entities");
        let handle = arena.allocate().unwrap();
        let foreign = EntityHandle::new(EntityType::Light, handle.index, handle.generation);
        assert!(arena.get(foreign).is_none());
    }

    #[test]
    fn test_clear_restores_allocation_order() {
        let mut arena: Arena<Entity> = Arena::new(2, "entities");
        let first = arena.allocate().unwrap();
        let second = arena.allocate().unwrap();
        arena.release(first.index);
        arena.release(second.index);
        arena.clear();

        assert_eq!(arena.allocate().map(|h| h.index), Some(0));
        assert_eq!(arena.allocate().map(|h| h.index), Some(1));
    }

    #[test]
    fn test_find_and_iteration_skip_inactive() {
        let mut arena: Arena<Entity> = Arena::new(3, "entities");
        let a = arena.allocate().unwrap();
        let b = arena.allocate().unwrap();
        arena.get_mut(a).unwrap().rename("Crate");
        arena.get_mut(b).unwrap().rename("Crate");
        arena.release(a.index);

        assert_eq!(arena.find("Crate"), Some(b));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.handles(), vec![b]);
    }
}
