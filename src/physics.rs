//! The simulation core: bodies, collision, portals, carrying and mechanisms.

use crate::{
    error::{ensure, Result},
    event::EventSink,
    math::{Angle, Axis},
};

//

pub mod body;
pub use body::{Actor, Body, BodyKind, BodyParams, Kind, Mass, ThrowableMaterial};

pub mod carry;

pub mod collision;
use collision::Surroundings;

pub mod control;
pub use control::{Intent, IntentSet};

mod entity_set;
pub use entity_set::{BodyKey, EntitySet};

pub mod forcefield;
pub use forcefield::{ForceField, Gravity};

mod integrator;

pub mod mechanism;
pub use mechanism::{HeightState, Mechanism, MechanismKind, Trigger, TriggerRole};

pub mod portal;
pub use portal::{Portal, PortalLink, PortalState};

//

/// Tuning constants of the simulation that apply to every body.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct WorldParams {
    /// Speed limit in pixels per second.
    pub max_speed: f64,
    /// How far a body can be pushed in one step to get it out of a collider.
    /// Anything deeper than this is left alone.
    pub max_collision_offset: f64,
    /// Resolution of the collision offset search.
    pub collision_offset_step: f64,
    /// How far below a body to look for ground.
    pub ground_probe: f64,
    /// Bodies falling faster than this land on one-way platforms even when ducking.
    pub min_drop_through_speed: f64,
    /// Extra amount clipped off bodies going into a portal,
    /// so they don't touch the wall behind it.
    pub portal_clip_tolerance: f64,
    /// How far from the sides of a portal bodies in it are kept.
    pub portal_edge_inset: f64,
    /// How far behind the exit portal's front edge teleported bodies are placed.
    pub portal_exit_gap: f64,
    /// How close to the back edge of a portal counts as being through it.
    pub through_tolerance: f64,
    /// Upward angle of throws when facing sideways.
    pub horizontal_throw_angle: Angle,
    /// Multiplier for the horizontal part of throws.
    pub throw_horizontal_scale: f64,
    /// Multiplier for walking acceleration.
    pub control_acceleration_scale: f64,
    /// Carried bodies closer than this to their carrier aren't pulled.
    pub hold_dead_zone: f64,
    pub hold_spring: f64,
    pub hold_damping: f64,
    /// Fraction of gravity a carried body can lift its carrier by.
    pub carrier_lift_limit: f64,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            max_speed: 2000.0,
            max_collision_offset: 16.0,
            collision_offset_step: 0.2,
            ground_probe: 0.5,
            min_drop_through_speed: 100.0,
            portal_clip_tolerance: 4.0,
            portal_edge_inset: 1.0,
            portal_exit_gap: 1.0,
            through_tolerance: 1.0,
            horizontal_throw_angle: Angle::Deg(15.0),
            throw_horizontal_scale: 0.5,
            control_acceleration_scale: 0.4,
            hold_dead_zone: 8.0,
            hold_spring: 10_000.0,
            hold_damping: 2_000.0,
            carrier_lift_limit: 0.9,
        }
    }
}

impl WorldParams {
    pub fn validate(&self) -> Result<()> {
        ensure(
            self.collision_offset_step.is_finite() && self.collision_offset_step > 0.0,
            || {
                format!(
                    "collision_offset_step must be positive, got {}",
                    self.collision_offset_step
                )
            },
        )?;
        for (name, val) in [
            ("max_speed", self.max_speed),
            ("max_collision_offset", self.max_collision_offset),
            ("ground_probe", self.ground_probe),
            ("min_drop_through_speed", self.min_drop_through_speed),
            ("portal_clip_tolerance", self.portal_clip_tolerance),
            ("portal_edge_inset", self.portal_edge_inset),
            ("portal_exit_gap", self.portal_exit_gap),
            ("through_tolerance", self.through_tolerance),
            ("hold_dead_zone", self.hold_dead_zone),
            ("hold_spring", self.hold_spring),
            ("hold_damping", self.hold_damping),
            ("carrier_lift_limit", self.carrier_lift_limit),
        ] {
            ensure(val.is_finite() && val >= 0.0, || {
                format!("{name} must be non-negative, got {val}")
            })?;
        }
        Ok(())
    }
}

/// Runs the physics phase of a tick over an [`EntitySet`].
#[derive(Clone, Debug, Default)]
pub struct Physics {
    pub params: WorldParams,
}

impl Physics {
    pub fn new(params: WorldParams) -> Self {
        Self { params }
    }

    /// Advance everything by one fixed step.
    ///
    /// In order: mechanisms and kinematic bodies move,
    /// then every dynamic body follows its carrier if it has one and is integrated
    /// vertically and then horizontally, then portals let in bodies moving into them,
    /// and finally triggers check whether they're being pressed.
    pub fn tick(
        &self,
        set: &mut EntitySet,
        dt: f64,
        forcefield: &dyn ForceField,
        events: &mut impl EventSink,
    ) {
        let _span = crate::tracy_span!("physics tick", "tick");

        if !(dt.is_finite() && dt > 0.0) {
            log::warn!("Skipping physics tick with invalid timestep {dt}");
            return;
        }
        let params = &self.params;

        let dynamics = set.bodies_of_kind(Kind::Dynamic).to_vec();
        for &key in &dynamics {
            control::reset_used(set, key);
        }

        mechanism::advance_mechanisms(set, dt, events);
        for key in set.bodies_of_kind(Kind::Kinematic).to_vec() {
            integrator::move_kinematic(set, key, dt);
        }

        let env = Surroundings::capture(set);

        {
            let _span = crate::tracy_span!("integrate dynamics", "tick");
            for key in dynamics {
                let Some(body) = set.get(key) else {
                    continue;
                };
                if !body.is_finite() {
                    log::warn!("{key:?} has a non-finite position or velocity, skipping it");
                    // let go of it if it's being carried
                    carry::update_carried(set, key, dt, 0.0, params, events);
                    continue;
                }
                let gravity = forcefield.value_at(body.position());

                carry::update_carried(set, key, dt, gravity.y, params, events);
                for axis in [Axis::Vertical, Axis::Horizontal] {
                    integrator::update_position(
                        set, key, axis, dt, &env, params, forcefield, events,
                    );
                }
                portal::clamp_to_opening(set, key, &env, params);
                integrator::update_ground(set, key, dt, &env, params);
            }
        }

        portal::capture_entering(set, &env);
        mechanism::update_triggers(set, &env, params, events);
    }
}
