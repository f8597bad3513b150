//! Discrete collision detection and resolution between dynamic bodies and static colliders.
//!
//! Collision is resolved one axis at a time by searching for the smallest offset
//! along that axis that gets the body out of every collider.

use super::{
    portal::{self, PortalView},
    Body, BodyKey, EntitySet, Kind, WorldParams,
};
use crate::math::{Axis, Rect};

/// A collider as seen by dynamic bodies this tick.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ColliderView {
    pub rect: Rect,
    pub one_way: bool,
}

/// Everything a dynamic body can collide with or go into during a tick,
/// copied out of the entity set so bodies can be mutated while looking at it.
///
/// Statics and portals don't move during the integration phase and mechanisms
/// have already moved by the time this is captured, so one capture per tick is enough.
#[derive(Default)]
pub(crate) struct Surroundings {
    pub colliders: Vec<ColliderView>,
    pub portals: Vec<PortalView>,
}

impl Surroundings {
    pub fn capture(set: &EntitySet) -> Self {
        let colliders = set
            .colliders()
            .filter_map(|key| {
                let body = set.get(key)?;
                Some(ColliderView {
                    rect: body.collision_rect(),
                    one_way: body.collider()?,
                })
            })
            .collect();
        let portals = set
            .bodies_of_kind(Kind::Portal)
            .iter()
            .filter_map(|&key| {
                let body = set.get(key)?;
                Some(PortalView {
                    key,
                    rect: body.rect,
                    orientation: body.portal()?.orientation,
                })
            })
            .collect();
        Self { colliders, portals }
    }

    pub fn portal(&self, key: BodyKey) -> Option<&PortalView> {
        self.portals.iter().find(|p| p.key == key)
    }

    /// Clip the rect by every portal it is inside,
    /// leaving only the part that is on the open side of all of them.
    pub fn clip(&self, rect: Rect, tolerance: f64) -> Rect {
        self.portals.iter().fold(rect, |rect, p| {
            if portal::is_inside(&rect, &p.rect, p.orientation) {
                portal::clip_to_portal(rect, &p.rect, p.orientation, tolerance)
            } else {
                rect
            }
        })
    }
}

/// Check if a dynamic body would be colliding with a static collider
/// if it was moved by `offset` along `axis`.
///
/// One-way platforms only stop bodies falling onto them from above.
/// `dt` is used to check where the body was last tick so that fast bodies
/// can't slip past the top of a one-way platform.
pub(crate) fn is_colliding_static(
    body: &Body,
    axis: Axis,
    dt: f64,
    offset: f64,
    env: &Surroundings,
    params: &WorldParams,
) -> bool {
    let rect = env
        .clip(body.collision_rect(), params.portal_clip_tolerance)
        .shifted(axis, offset);

    let engaged = body
        .actor()
        .and_then(|a| a.portal.engaged_portal())
        .and_then(|k| env.portal(k));
    if let Some(engaged) = engaged {
        // moving into or out of the portal, or fully within its opening:
        // the wall around the portal doesn't apply
        if engaged.orientation.axis() == axis
            || portal::is_aligned(&rect, &engaged.rect, engaged.orientation)
        {
            return false;
        }
    }

    let full_rect = body.collision_rect();
    let v_y = body.velocity.y;
    for coll in &env.colliders {
        if !coll.rect.overlaps(&rect) {
            continue;
        }
        if !coll.one_way {
            return true;
        }
        if axis == Axis::Horizontal || v_y < 0.0 {
            continue;
        }
        if body.facing.y > 0.0 && v_y < params.min_drop_through_speed {
            // deliberately dropping through
            continue;
        }
        if full_rect.bottom() > coll.rect.bottom()
            && full_rect.bottom() - v_y * dt > coll.rect.bottom()
        {
            // below the platform now and last tick too
            continue;
        }
        return true;
    }
    false
}

/// Find the offset along `axis` that gets the body out of all static colliders,
/// trying small offsets before large ones and positive before negative.
///
/// Returns zero both when there's no collision and when no offset
/// within `max_collision_offset` resolves it.
pub(crate) fn resolve(
    body: &Body,
    axis: Axis,
    dt: f64,
    env: &Surroundings,
    params: &WorldParams,
) -> f64 {
    let mut offset = 0.0;
    while offset <= params.max_collision_offset {
        if !is_colliding_static(body, axis, dt, offset, env, params) {
            return offset;
        }
        if !is_colliding_static(body, axis, dt, -offset, env, params) {
            return -offset;
        }
        offset += params.collision_offset_step;
    }
    log::trace!("Could not resolve collision along {axis:?}, letting the body through");
    0.0
}
