//! Per-frame scene update

use log::debug;

use super::context::SceneContext;
use super::entity::{EntityFlags, EntityHandle, EntityType};
use super::kinds::{PlayerInput, TriggerMask, TriggerType};
use super::scene_graph::Scene;
use super::transform::{TransformHierarchy, TransformSpace};
use crate::events::{Event, EventArg, EventType};
use crate::foundation::math::Vec3;
use crate::spatial::{BoundingBox, IntersectionType, Ray};

impl Scene {
    /// Advance gameplay by `dt` seconds
    ///
    /// Moves the player from `input`, evaluates triggers against the player
    /// and enemies and spins pickups. Fired one-shot triggers are marked for
    /// deletion and go away in the next [`post_update`](Self::post_update).
    pub fn update(&mut self, ctx: &mut SceneContext, dt: f32, input: &PlayerInput) {
        self.player_update(ctx, dt, input);
        self.triggers_update(ctx);
        self.pickups_update(dt);
    }

    fn player_update(&mut self, ctx: &SceneContext, dt: f32, input: &PlayerInput) {
        let player = self.player_handle();
        if self.entity(player).is_none() {
            return;
        }

        if input.turn != 0.0 {
            let degrees = input.turn * self.player.turn_speed * dt;
            self.rotate(player, &Vec3::y(), degrees, TransformSpace::World);
        }

        let direction = input.direction();
        if direction != Vec3::zeros() {
            let step = direction.normalize() * self.player.speed_for(input) * dt;
            let heading = self.absolute_rotation(player) * step;
            let probe = Ray::new(self.absolute_position(player), heading);
            let blocked = ctx
                .services
                .physics
                .ray_cast(&probe)
                .is_some_and(|distance| distance < self.player.min_forward_distance);
            if blocked {
                debug!("Player movement blocked");
            } else {
                self.translate(player, &step, TransformSpace::Local);
            }
        }

        let ground_probe = Ray::new(self.absolute_position(player), -Vec3::y());
        let ground = ctx.services.physics.ray_cast(&ground_probe);
        let on_ground = ground.is_some_and(|distance| distance <= self.player.min_downward_distance);

        if on_ground && self.player.vertical_velocity <= 0.0 {
            self.player.grounded = true;
            self.player.vertical_velocity = 0.0;
        } else {
            self.player.grounded = false;
        }

        if input.jump && self.player.grounded {
            self.player.vertical_velocity = self.player.jump_speed;
            self.player.grounded = false;
        }

        if !self.player.grounded {
            self.player.vertical_velocity += self.player.gravity * dt;
            let mut rise = self.player.vertical_velocity * dt;
            if let Some(distance) = ground {
                rise = rise.max(-distance);
            }
            self.translate(player, &Vec3::new(0.0, rise, 0.0), TransformSpace::World);
        }
    }

    fn triggers_update(&mut self, ctx: &mut SceneContext) {
        let player = self.player_handle();
        let player_bounds = self.entity(player).map(|entity| entity.derived_bounding_box);
        let enemy_bounds: Vec<(EntityHandle, BoundingBox)> = self
            .enemies
            .iter()
            .filter_map(|enemy| {
                let mesh = enemy.mesh.and_then(|mesh| self.entity(mesh))?;
                Some((enemy.base.handle(), mesh.derived_bounding_box))
            })
            .collect();

        for handle in self.triggers.handles() {
            let Some(trigger) = self.triggers.get_mut(handle) else { continue };
            let volume = trigger.base.derived_bounding_box;
            let overlaps = |other: &BoundingBox| volume.classify_box(other) != IntersectionType::Outside;

            let mut occupant = None;
            if trigger.trigger_mask.contains(TriggerMask::PLAYER) && player_bounds.as_ref().is_some_and(overlaps) {
                occupant = Some(player);
            }
            if occupant.is_none() && trigger.trigger_mask.contains(TriggerMask::ENEMY) {
                occupant = enemy_bounds
                    .iter()
                    .find(|(_, bounds)| overlaps(bounds))
                    .map(|(enemy, _)| *enemy);
            }

            if !trigger.evaluate(occupant.is_some()) {
                continue;
            }
            debug!("Trigger '{}' fired ({} times)", trigger.base.name, trigger.count);

            if trigger.has_event() {
                let mut event = Event::new(EventType::Trigger)
                    .with_sender(handle)
                    .with_arg("trigger_event", EventArg::Int(trigger.trigger_event));
                if let Some(occupant) = occupant {
                    event = event.with_arg("triggering_entity", EventArg::Entity(occupant));
                }
                ctx.events.send(event);
            }
            if trigger.trigger_type == TriggerType::OneShot {
                trigger.base.flags.insert(EntityFlags::MARKED_FOR_DELETION);
            }
        }
    }

    fn pickups_update(&mut self, dt: f32) {
        let spinning: Vec<(EntityHandle, f32)> = self
            .pickups
            .iter()
            .filter(|pickup| !pickup.picked_up && pickup.spin_speed != 0.0)
            .map(|pickup| (pickup.mesh.unwrap_or_else(|| pickup.base.handle()), pickup.spin_speed))
            .collect();
        for (target, spin_speed) in spinning {
            self.rotate(target, &Vec3::y(), spin_speed * dt, TransformSpace::World);
        }
    }

    /// Settle the frame after gameplay ran
    ///
    /// Removes every entity marked for deletion (repeating until the
    /// children those removals mark are gone too), pushes modified
    /// transforms to cameras, sounds and physics, moves the audio listener
    /// to the player and clears `is_modified` everywhere.
    pub fn post_update(&mut self, ctx: &mut SceneContext) {
        loop {
            let marked: Vec<EntityHandle> = self
                .all_handles()
                .into_iter()
                .filter(|handle| {
                    self.entity(*handle)
                        .is_some_and(|entity| entity.flags.contains(EntityFlags::MARKED_FOR_DELETION))
                })
                .collect();
            if marked.is_empty() {
                break;
            }
            for handle in marked {
                self.remove(ctx, handle);
            }
        }

        for camera in self.cameras.iter_mut() {
            if camera.base.transform.is_modified {
                camera.update_view();
            }
        }

        for handle in self.handles_of_kind(EntityType::SoundSource) {
            let modified = self.entity(handle).is_some_and(|entity| entity.transform.is_modified);
            if !modified {
                continue;
            }
            let position = self.absolute_position(handle);
            if let Some(source) = self.sound_sources.get(handle) {
                if let Some(instance) = source.instance {
                    ctx.services.sound.source_update(instance, &position, &source.params());
                }
            }
        }

        for handle in self.handles_of_kind(EntityType::StaticMesh) {
            let Some(mesh) = self.static_meshes.get(handle) else { continue };
            let Some(body) = mesh.collision.rigidbody else { continue };
            if !mesh.base.transform.sync_physics {
                continue;
            }
            let position = self.absolute_position(handle);
            let rotation = self.absolute_rotation(handle);
            ctx.services.physics.body_set_pose(body, &position, &rotation);
            if let Some(mesh) = self.static_meshes.get_mut(handle) {
                mesh.base.transform.sync_physics = false;
            }
        }

        let player = self.player_handle();
        if self.entity(player).is_some() {
            let position = self.absolute_position(player);
            let forward = self.absolute_forward(player);
            let up = self.absolute_up(player);
            ctx.services.sound.listener_update(&position, &forward, &up);
        }

        let mut handles = self.all_handles();
        handles.push(player);
        handles.push(self.root_handle());
        for handle in handles {
            if let Some(entity) = self.entity_mut(handle) {
                entity.transform.is_modified = false;
            }
        }
    }
}
