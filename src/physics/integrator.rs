//! Moving dynamic bodies: velocity integration one axis at a time,
//! followed by collision resolution, and ground detection with damping.

use super::{
    collision::{self, Surroundings},
    portal, Body, BodyKey, BodyKind, EntitySet, ForceField, WorldParams,
};
use crate::{
    event::EventSink,
    math::{self as m, Axis},
};

/// Advance a dynamic body along one axis.
///
/// Portal transitions are checked first, then the velocity is integrated
/// with semi-implicit Euler, and finally the body is pushed out of any static
/// collider it ended up in, stopping it along this axis.
pub(crate) fn update_position(
    set: &mut EntitySet,
    key: BodyKey,
    axis: Axis,
    dt: f64,
    env: &Surroundings,
    params: &WorldParams,
    forcefield: &dyn ForceField,
    events: &mut impl EventSink,
) {
    let engaged = set
        .get(key)
        .and_then(|b| b.actor())
        .map_or(false, |a| !a.portal.is_out());
    if engaged {
        portal::handle_engaged(set, key, env, params, events);
    }

    let Some(body) = set.get_mut(key) else {
        return;
    };
    // looping through portals can build up a lot of speed
    body.velocity = m::clamp_magnitude(body.velocity, params.max_speed);

    let gravity = forcefield.value_at(body.position());
    let accel = axis.of(body.acceleration) + axis.of(gravity);
    let vel = axis.of_mut(&mut body.velocity);
    *vel += accel * dt;
    let step = *vel * dt;
    body.rect.shift(axis, step);

    let offset = collision::resolve(body, axis, dt, env, params);
    if offset != 0.0 {
        log::trace!("{key:?} pushed by {offset} along {axis:?}");
        *axis.of_mut(&mut body.velocity) = 0.0;
        body.rect.shift(axis, offset);
    }
}

/// Check whether a dynamic body is standing on something
/// and apply ground or air damping accordingly.
///
/// Damping only applies when the body isn't actively moving in the direction
/// it's going, or when it's going faster than it could walk.
pub(crate) fn update_ground(
    set: &mut EntitySet,
    key: BodyKey,
    dt: f64,
    env: &Surroundings,
    params: &WorldParams,
) {
    let Some(body) = set.get_mut(key) else {
        return;
    };
    let on_ground = collision::is_colliding_static(
        body,
        Axis::Vertical,
        dt,
        params.ground_probe,
        env,
        params,
    );
    let facing_x = m::sign(body.facing.x);
    let Body { velocity, kind, .. } = body;
    let BodyKind::Dynamic(actor) = kind else {
        return;
    };
    actor.on_ground = on_ground;
    let p = &actor.params;
    if on_ground {
        velocity.y = 0.0;
        if facing_x != m::sign(velocity.x) || velocity.x.abs() > p.horizontal_ground_speed {
            velocity.x *= p.ground_damping.powf(dt);
        }
        actor.coyote_time_left = p.coyote_time;
    } else {
        if facing_x != m::sign(velocity.x) {
            velocity.x *= p.air_damping.powf(dt);
        }
        actor.coyote_time_left -= dt;
    }
}

/// Kinematic bodies simply move by their velocity.
pub(crate) fn move_kinematic(set: &mut EntitySet, key: BodyKey, dt: f64) {
    if let Some(body) = set.get_mut(key) {
        let step = body.velocity * dt;
        body.rect = body.rect.translated(step);
    }
}
