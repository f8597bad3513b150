//! Picking up, carrying and throwing bodies.
//!
//! A carrier and the body it holds refer to each other through
//! [`Actor::carried`][super::Actor::carried] and [`Actor::carrier`][super::Actor::carrier].
//! Those are only ever changed together by the functions in this module.

use super::{BodyKey, EntitySet, WorldParams};
use crate::{
    event::{Event, EventSink},
    math::{Angle, Vec2},
};

/// Connect both ends of a carry link.
pub(crate) fn link(set: &mut EntitySet, carrier: BodyKey, held: BodyKey) {
    if let (Some(c), Some(h)) = set.get2_mut(carrier, held) {
        if let (Some(c), Some(h)) = (c.actor_mut(), h.actor_mut()) {
            c.carried = Some(held);
            h.carrier = Some(carrier);
        }
    }
}

/// Disconnect a carrier from whatever it's holding,
/// returning the body that was held.
pub(crate) fn unlink(set: &mut EntitySet, carrier: BodyKey) -> Option<BodyKey> {
    let held = set.get_mut(carrier)?.actor_mut()?.carried.take()?;
    if let Some(h) = set.get_mut(held).and_then(|b| b.actor_mut()) {
        h.carrier = None;
    }
    Some(held)
}

/// Find the nearest carryable body that nobody is holding yet
/// and the distance to it, measured between centers.
pub fn nearest_carryable(set: &EntitySet, carrier: BodyKey) -> Option<(BodyKey, f64)> {
    let pos = set.get(carrier)?.position();
    set.carryables()
        .iter()
        .filter(|&&k| k != carrier)
        .filter_map(|&k| {
            let body = set.get(k)?;
            if body.actor()?.carrier.is_some() {
                return None;
            }
            Some((k, (body.position() - pos).mag()))
        })
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
}

/// Pick up the nearest carryable body if it's within reach
/// and the carrier isn't holding anything already.
pub fn pick_up(set: &mut EntitySet, carrier: BodyKey, events: &mut impl EventSink) -> bool {
    let Some(actor) = set.get(carrier).and_then(|b| b.actor()) else {
        return false;
    };
    if actor.carried.is_some() {
        return false;
    }
    let reach = actor.params.max_holding_distance;
    match nearest_carryable(set, carrier) {
        Some((held, dist)) if dist <= reach => {
            link(set, carrier, held);
            let weight = set.get(held).and_then(|b| b.actor()).map(|a| a.mass.mass());
            log::debug!("{carrier:?} picked up {held:?} weighing {weight:?}");
            events.push(Event::PickedUp { carrier, held });
            true
        }
        _ => false,
    }
}

/// Throw the held body in the direction the carrier is facing,
/// pushing the carrier back by the same impulse.
///
/// Returns false if nothing was held.
pub fn throw(
    set: &mut EntitySet,
    carrier: BodyKey,
    params: &WorldParams,
    events: &mut impl EventSink,
) -> bool {
    let Some(c_body) = set.get(carrier) else {
        return false;
    };
    let Some((held, throw_force)) = c_body
        .actor()
        .and_then(|a| Some((a.carried?, a.params.throw_force)))
    else {
        return false;
    };

    let facing = c_body.facing;
    let direction = if facing.y == 0.0 && facing.x != 0.0 {
        // sideways throws go a bit upwards
        let elevation = params.horizontal_throw_angle.deg();
        let angle = if facing.x > 0.0 {
            -elevation
        } else {
            180.0 + elevation
        };
        Angle::Deg(angle).unit_vec()
    } else if facing != Vec2::zero() {
        facing.normalized()
    } else {
        Vec2::zero()
    };
    let impulse = direction * throw_force;

    if let (Some(c), Some(h)) = set.get2_mut(carrier, held) {
        let c_inv = c.actor().map_or(0.0, |a| a.mass.inv());
        let h_inv = h.actor().map_or(0.0, |a| a.mass.inv());
        h.velocity.x += impulse.x * params.throw_horizontal_scale * h_inv;
        // old vertical velocity is dropped so throws in the middle of a jump are consistent
        h.velocity.y = impulse.y * h_inv;
        c.velocity -= impulse * c_inv;
    }
    unlink(set, carrier);
    log::debug!("{carrier:?} threw {held:?} with impulse {impulse:?}");
    events.push(Event::Thrown {
        carrier,
        held,
        impulse,
    });
    true
}

/// Throw if holding something, otherwise try to pick something up.
pub fn interact(
    set: &mut EntitySet,
    carrier: BodyKey,
    params: &WorldParams,
    events: &mut impl EventSink,
) -> bool {
    throw(set, carrier, params, events) || pick_up(set, carrier, events)
}

/// Pull a held body towards its carrier with a damped spring,
/// or drop it if it's gotten too far away.
///
/// The carrier is pulled back by the same impulse, except it can't be lifted
/// by more than a fraction of gravity, so it can't hang from what it's holding.
pub(crate) fn update_carried(
    set: &mut EntitySet,
    held: BodyKey,
    dt: f64,
    gravity_y: f64,
    params: &WorldParams,
    events: &mut impl EventSink,
) {
    let Some(carrier) = set.get(held).and_then(|b| b.actor()).and_then(|a| a.carrier) else {
        return;
    };
    let (Some(c), Some(h)) = set.get2_mut(carrier, held) else {
        return;
    };
    let (Some(c_actor), Some(h_actor)) = (c.actor(), h.actor()) else {
        return;
    };
    let reach = c_actor.params.max_holding_distance;
    let (c_inv, h_inv) = (c_actor.mass.inv(), h_actor.mass.inv());

    let offset = c.position() - h.position();
    let dist = offset.mag();
    if !(c.is_finite() && h.is_finite() && dist.is_finite()) {
        unlink(set, carrier);
        log::warn!("Carry link between {carrier:?} and {held:?} went non-finite, releasing");
        events.push(Event::Released { carrier, held });
        return;
    }
    if dist > reach {
        unlink(set, carrier);
        log::debug!("{held:?} got too far from {carrier:?} and was dropped");
        events.push(Event::Released { carrier, held });
        return;
    }
    if dist <= params.hold_dead_zone {
        return;
    }

    let damping = (c.velocity - h.velocity) * (params.hold_damping * dt);
    let impulse = offset * (params.hold_spring * dt) + damping;
    h.velocity += impulse * h_inv;
    let mut recoil = -impulse * c_inv;
    recoil.y = recoil.y.max(-gravity_y * dt * params.carrier_lift_limit);
    c.velocity += recoil;
}
