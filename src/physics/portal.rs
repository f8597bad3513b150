//! Portals: geometry, the per-body portal state machine and teleportation.
//!
//! A tunnel is two portals sharing a tunnel id. A body moving into one of them
//! is first `Entering` it, gets teleported behind the other once it has gone
//! all the way through, and is then `Exiting` the other one until it no longer
//! touches it. While engaged with a portal, the part of the body that is "inside"
//! the wall is clipped off for collision and drawing.

use super::{collision::Surroundings, BodyKey, EntitySet, WorldParams};
use crate::{
    event::{Event, EventSink},
    math::{Axis, Direction, Rect, Vec2},
};

/// One end of a tunnel.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub struct Portal {
    /// The direction bodies travel when coming out of this portal.
    pub orientation: Direction,
    /// Exactly two portals in a level share each tunnel id.
    pub tunnel_id: String,
}

impl Portal {
    pub fn new(orientation: Direction, tunnel_id: impl Into<String>) -> Self {
        Self {
            orientation,
            tunnel_id: tunnel_id.into(),
        }
    }
}

/// The pair of portals a body is going through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortalLink {
    pub in_portal: BodyKey,
    pub out_portal: BodyKey,
}

impl PortalLink {
    #[inline]
    pub fn involves(&self, portal: BodyKey) -> bool {
        self.in_portal == portal || self.out_portal == portal
    }

    /// The same tunnel traveled the other way.
    #[inline]
    pub fn reversed(self) -> Self {
        Self {
            in_portal: self.out_portal,
            out_portal: self.in_portal,
        }
    }
}

/// Where a dynamic body is relative to portals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PortalState {
    /// Not touching any portal.
    #[default]
    Out,
    /// Moving into `in_portal`, not yet teleported.
    Entering(PortalLink),
    /// Teleported and coming out of `out_portal`.
    Exiting(PortalLink),
}

impl PortalState {
    #[inline]
    pub fn link(&self) -> Option<&PortalLink> {
        match self {
            PortalState::Out => None,
            PortalState::Entering(link) | PortalState::Exiting(link) => Some(link),
        }
    }

    /// The portal the body is currently overlapping with:
    /// the entry portal while entering and the exit portal while exiting.
    #[inline]
    pub fn engaged_portal(&self) -> Option<BodyKey> {
        match self {
            PortalState::Out => None,
            PortalState::Entering(link) => Some(link.in_portal),
            PortalState::Exiting(link) => Some(link.out_portal),
        }
    }

    #[inline]
    pub fn is_out(&self) -> bool {
        matches!(self, PortalState::Out)
    }
}

/// The parts of a portal body needed for geometry, copied out of the entity set.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PortalView {
    pub key: BodyKey,
    pub rect: Rect,
    pub orientation: Direction,
}

//
// Geometry
//

/// Whether the rect fits strictly within the portal's opening,
/// i.e. along the axis perpendicular to the portal's orientation.
pub fn is_aligned(rect: &Rect, portal_rect: &Rect, orientation: Direction) -> bool {
    let lateral = orientation.axis().other();
    rect.start(lateral) > portal_rect.start(lateral) && rect.end(lateral) < portal_rect.end(lateral)
}

/// Whether the rect is overlapping the portal and aligned with its opening.
pub fn is_inside(rect: &Rect, portal_rect: &Rect, orientation: Direction) -> bool {
    rect.overlaps(portal_rect) && is_aligned(rect, portal_rect, orientation)
}

/// Whether the rect has gone all the way through the portal to the wall side of it,
/// give or take `tolerance`.
pub fn is_through(rect: &Rect, portal_rect: &Rect, orientation: Direction, tolerance: f64) -> bool {
    if !is_aligned(rect, portal_rect, orientation) {
        return false;
    }
    match orientation {
        Direction::North => rect.top >= portal_rect.bottom() - tolerance,
        Direction::South => rect.bottom() <= portal_rect.top + tolerance,
        Direction::East => rect.right() <= portal_rect.left + tolerance,
        Direction::West => rect.left >= portal_rect.right() - tolerance,
    }
}

/// Whether a body moving with this velocity would go into a portal with this orientation,
/// i.e. against the portal's exit direction.
pub fn is_entering(orientation: Direction, velocity: Vec2) -> bool {
    match orientation {
        Direction::North => velocity.y > 0.0,
        Direction::South => velocity.y < 0.0,
        Direction::East => velocity.x < 0.0,
        Direction::West => velocity.x > 0.0,
    }
}

/// Cut off the part of the rect that is past the portal's back edge,
/// plus `tolerance` more so the body doesn't touch the wall the portal is set in.
pub fn clip_to_portal(rect: Rect, portal_rect: &Rect, orientation: Direction, tolerance: f64) -> Rect {
    let mut rect = rect;
    match orientation {
        Direction::North => {
            if rect.bottom() > portal_rect.bottom() {
                let overlap = (rect.bottom() - portal_rect.bottom() + tolerance).min(rect.height);
                rect.height -= overlap;
            }
        }
        Direction::South => {
            if rect.top < portal_rect.top {
                let overlap = (portal_rect.top - rect.top + tolerance).min(rect.height);
                rect.top += overlap;
                rect.height -= overlap;
            }
        }
        Direction::East => {
            if rect.left < portal_rect.left {
                let overlap = (portal_rect.left - rect.left + tolerance).min(rect.width);
                rect.left += overlap;
                rect.width -= overlap;
            }
        }
        Direction::West => {
            if rect.right() > portal_rect.right() {
                let overlap = (rect.right() - portal_rect.right() + tolerance).min(rect.width);
                rect.width -= overlap;
            }
        }
    }
    rect
}

//
// State machine
//

/// Start going into `in_portal`, to come out of `out_portal`.
pub(crate) fn enter(set: &mut EntitySet, key: BodyKey, link: PortalLink) {
    if let Some(actor) = set.get_mut(key).and_then(|b| b.actor_mut()) {
        log::debug!("{key:?} entering portal {:?}", link.in_portal);
        actor.portal = PortalState::Entering(link);
    }
}

pub(crate) fn exit(set: &mut EntitySet, key: BodyKey) {
    if let Some(actor) = set.get_mut(key).and_then(|b| b.actor_mut()) {
        log::debug!("{key:?} left portal {:?}", actor.portal.engaged_portal());
        actor.portal = PortalState::Out;
    }
}

/// Check the transitions of a body engaged with a portal:
/// teleport when it's through the entry portal,
/// turn around when it moves back into the exit portal,
/// or let go of the portal once it no longer touches it.
pub(crate) fn handle_engaged(
    set: &mut EntitySet,
    key: BodyKey,
    env: &Surroundings,
    params: &WorldParams,
    events: &mut impl EventSink,
) {
    let Some(body) = set.get(key) else {
        return;
    };
    let Some(actor) = body.actor() else {
        return;
    };
    let state = actor.portal;
    let Some(engaged) = state.engaged_portal().and_then(|k| env.portal(k)) else {
        if !state.is_out() {
            log::warn!("{key:?} engaged with a portal that no longer exists");
            exit(set, key);
        }
        return;
    };

    match state {
        PortalState::Entering(_)
            if is_through(
                &body.rect,
                &engaged.rect,
                engaged.orientation,
                params.through_tolerance,
            ) =>
        {
            teleport(set, key, env, params, events);
        }
        PortalState::Exiting(link) if is_entering(engaged.orientation, body.velocity) => {
            enter(set, key, link.reversed());
        }
        _ => {
            if !is_inside(&body.rect, &engaged.rect, engaged.orientation) {
                exit(set, key);
            }
        }
    }
}

/// Move an entering body to behind its exit portal,
/// pointing its velocity out of the exit portal without changing its speed.
///
/// The body's offset along the opening is kept, so a body that went in near
/// one edge of a portal comes out near the corresponding edge of the other.
/// A held body is carried through along with its carrier, and never goes
/// through on its own before its carrier does.
pub(crate) fn teleport(
    set: &mut EntitySet,
    key: BodyKey,
    env: &Surroundings,
    params: &WorldParams,
    events: &mut impl EventSink,
) {
    let (link, carrier, carried) = match set.get(key).and_then(|b| b.actor()) {
        Some(actor) => match actor.portal.link() {
            Some(link) => (*link, actor.carrier, actor.carried),
            None => return,
        },
        None => return,
    };

    if let Some(carrier) = carrier {
        let carrier_portal = set
            .get(carrier)
            .and_then(|b| b.actor())
            .and_then(|a| a.portal.engaged_portal());
        if carrier_portal != Some(link.out_portal) {
            return;
        }
    }

    let (Some(in_p), Some(out_p)) = (env.portal(link.in_portal), env.portal(link.out_portal)) else {
        log::warn!("{key:?} teleporting through a portal that no longer exists");
        exit(set, key);
        return;
    };

    let Some(body) = set.get_mut(key) else {
        return;
    };
    body.velocity = out_p.orientation.unit_vec() * body.velocity.mag();

    let gap = params.portal_exit_gap;
    let rect = &mut body.rect;
    match out_p.orientation.axis() {
        Axis::Horizontal => {
            rect.top = out_p.rect.top
                + match in_p.orientation.axis() {
                    Axis::Horizontal => rect.top - in_p.rect.top,
                    Axis::Vertical => in_p.rect.right() - rect.right(),
                };
            if out_p.orientation == Direction::West {
                rect.left = out_p.rect.right() - gap;
            } else {
                rect.set_right(out_p.rect.left + gap);
            }
        }
        Axis::Vertical => {
            rect.left = out_p.rect.left
                + match in_p.orientation.axis() {
                    Axis::Vertical => rect.left - in_p.rect.left,
                    Axis::Horizontal => in_p.rect.bottom() - rect.bottom(),
                };
            if out_p.orientation == Direction::North {
                rect.top = out_p.rect.bottom() - gap;
            } else {
                rect.set_bottom(out_p.rect.top + gap);
            }
        }
    }
    if let Some(actor) = body.actor_mut() {
        actor.portal = PortalState::Exiting(link);
    }
    log::debug!(
        "{key:?} teleported from {:?} to {:?}",
        link.in_portal,
        link.out_portal
    );
    events.push(Event::Teleport {
        body: key,
        from: link.in_portal,
        to: link.out_portal,
    });

    if let Some(held) = carried {
        let held_state = set.get(held).and_then(|b| b.actor()).map(|a| a.portal);
        match held_state {
            // already came through with us
            Some(PortalState::Exiting(l)) if l.out_portal == link.out_portal => {}
            Some(PortalState::Entering(l)) if l == link => {
                teleport(set, held, env, params, events);
            }
            Some(_) => {
                enter(set, held, link);
                teleport(set, held, env, params, events);
            }
            None => {}
        }
    }
}

/// Keep a body engaged with a portal from sliding out of the sides of its opening.
pub(crate) fn clamp_to_opening(
    set: &mut EntitySet,
    key: BodyKey,
    env: &Surroundings,
    params: &WorldParams,
) {
    let Some(body) = set.get_mut(key) else {
        return;
    };
    let Some(engaged) = body
        .actor()
        .and_then(|a| a.portal.engaged_portal())
        .and_then(|k| env.portal(k))
    else {
        return;
    };
    if !body.rect.overlaps(&engaged.rect) {
        return;
    }

    let lateral = engaged.orientation.axis().other();
    let min = engaged.rect.start(lateral) + params.portal_edge_inset;
    let max = engaged.rect.end(lateral) - params.portal_edge_inset;
    let start = body.rect.start(lateral);
    let extent = body.rect.extent(lateral);

    let clamped_start = if extent >= max - min {
        // wider than the opening, center it
        (min + max - extent) / 2.0
    } else if start < min {
        min
    } else if start + extent > max {
        max - extent
    } else {
        return;
    };
    body.rect.shift(lateral, clamped_start - start);
    *lateral.of_mut(&mut body.velocity) = 0.0;
}

/// Start bodies moving into portals on their way in.
pub(crate) fn capture_entering(set: &mut EntitySet, env: &Surroundings) {
    let _span = crate::tracy_span!("capture entering", "capture_entering");

    for portal in &env.portals {
        let entering: Vec<BodyKey> = set
            .bodies_of_kind(super::Kind::Dynamic)
            .iter()
            .copied()
            .filter(|k| {
                set.get(*k).map_or(false, |b| {
                    b.actor().map_or(false, |a| a.portal.is_out())
                        && is_inside(&b.rect, &portal.rect, portal.orientation)
                        && is_entering(portal.orientation, b.velocity)
                })
            })
            .collect();
        if entering.is_empty() {
            continue;
        }

        let Some(twin) = set.twin_of(portal.key) else {
            let tunnel_id = set.get(portal.key).and_then(|b| b.portal()).map(|p| &p.tunnel_id);
            log::warn!(
                "Portal {:?} in tunnel {tunnel_id:?} has no twin, not letting bodies in",
                portal.key
            );
            continue;
        };
        for key in entering {
            enter(
                set,
                key,
                PortalLink {
                    in_portal: portal.key,
                    out_portal: twin,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{Body, BodyParams};

    const PORTAL_W: f64 = 96.0;
    const PORTAL_H: f64 = 32.0;

    fn player_at(rect: Rect, velocity: Vec2) -> Body {
        Body::new_dynamic(rect, BodyParams::player()).with_velocity(velocity)
    }

    fn tunnel(set: &mut EntitySet, a: (Rect, Direction), b: (Rect, Direction)) -> (BodyKey, BodyKey) {
        let a = set.insert(Body::new_portal(a.0, Portal::new(a.1, "tunnel")));
        let b = set.insert(Body::new_portal(b.0, Portal::new(b.1, "tunnel")));
        (a, b)
    }

    #[test]
    fn geometry_predicates() {
        let portal = Rect::new(0.0, 100.0, PORTAL_W, PORTAL_H);
        let inside = Rect::new(32.0, 90.0, 32.0, 32.0);
        assert!(is_aligned(&inside, &portal, Direction::North));
        assert!(is_inside(&inside, &portal, Direction::North));
        // touching the side of the opening isn't aligned
        let edge = Rect::new(0.0, 90.0, 32.0, 32.0);
        assert!(!is_aligned(&edge, &portal, Direction::North));

        let below = Rect::new(32.0, 131.5, 32.0, 32.0);
        assert!(is_through(&below, &portal, Direction::North, 1.0));
        assert!(!is_through(&inside, &portal, Direction::North, 1.0));

        assert!(is_entering(Direction::North, Vec2::new(0.0, 10.0)));
        assert!(!is_entering(Direction::North, Vec2::new(0.0, -10.0)));
        assert!(is_entering(Direction::East, Vec2::new(-10.0, 0.0)));
        assert!(is_entering(Direction::West, Vec2::new(10.0, 0.0)));
        assert!(is_entering(Direction::South, Vec2::new(0.0, -10.0)));
    }

    #[test]
    fn clipping_removes_the_part_past_the_portal() {
        let portal = Rect::new(0.0, 100.0, PORTAL_W, PORTAL_H);
        let body = Rect::new(32.0, 110.0, 32.0, 32.0);
        let clipped = clip_to_portal(body, &portal, Direction::North, 4.0);
        assert_eq!(clipped, Rect::new(32.0, 110.0, 32.0, 18.0));

        let wall_portal = Rect::new(100.0, 0.0, PORTAL_H, PORTAL_W);
        let body = Rect::new(90.0, 32.0, 32.0, 32.0);
        let clipped = clip_to_portal(body, &wall_portal, Direction::East, 4.0);
        assert_eq!(clipped, Rect::new(104.0, 32.0, 18.0, 32.0));
        let clipped = clip_to_portal(body, &wall_portal, Direction::West, 4.0);
        assert_eq!(clipped, body);

        // can't clip below zero size
        let deep = Rect::new(32.0, 200.0, 32.0, 32.0);
        assert_eq!(clip_to_portal(deep, &portal, Direction::North, 4.0).height, 0.0);
    }

    #[test]
    fn north_to_south_teleport_keeps_speed_and_offset() {
        let mut set = EntitySet::new();
        let floor_portal = Rect::new(0.0, 300.0, PORTAL_W, PORTAL_H);
        let ceiling_portal = Rect::new(500.0, 0.0, PORTAL_W, PORTAL_H);
        let (a, b) = tunnel(
            &mut set,
            (floor_portal, Direction::North),
            (ceiling_portal, Direction::South),
        );
        let velocity = Vec2::new(120.0, 160.0);
        let body = set.insert(player_at(Rect::new(20.0, 331.5, 32.0, 32.0), velocity));
        enter(
            &mut set,
            body,
            PortalLink {
                in_portal: a,
                out_portal: b,
            },
        );

        let env = Surroundings::capture(&set);
        let params = WorldParams::default();
        let mut events = Vec::new();
        handle_engaged(&mut set, body, &env, &params, &mut events);

        let b_body = set.get(body).unwrap();
        assert!((b_body.velocity.mag() - velocity.mag()).abs() < 1e-9);
        assert!(b_body.velocity.x.abs() < 1e-9 && b_body.velocity.y > 0.0);
        assert_eq!(b_body.rect.left, 520.0);
        assert_eq!(b_body.rect.bottom(), 1.0);
        assert_eq!(
            b_body.actor().unwrap().portal,
            PortalState::Exiting(PortalLink {
                in_portal: a,
                out_portal: b
            })
        );
        assert_eq!(
            events,
            vec![Event::Teleport {
                body,
                from: a,
                to: b
            }]
        );
    }

    #[test]
    fn vertical_to_horizontal_teleport() {
        let mut set = EntitySet::new();
        let floor_portal = Rect::new(0.0, 300.0, PORTAL_W, PORTAL_H);
        let wall_portal = Rect::new(500.0, 0.0, PORTAL_H, PORTAL_W);
        let (a, b) = tunnel(
            &mut set,
            (floor_portal, Direction::North),
            (wall_portal, Direction::West),
        );
        let body = set.insert(player_at(
            Rect::new(10.0, 332.0, 32.0, 32.0),
            Vec2::new(0.0, 300.0),
        ));
        enter(
            &mut set,
            body,
            PortalLink {
                in_portal: a,
                out_portal: b,
            },
        );
        let env = Surroundings::capture(&set);
        teleport(&mut set, body, &env, &WorldParams::default(), &mut Vec::new());

        let moved = set.get(body).unwrap();
        assert!((moved.velocity - Vec2::new(-300.0, 0.0)).mag() < 1e-9);
        // offset from the right end of the floor portal becomes offset from the top
        assert_eq!(moved.rect.top, 96.0 - 42.0);
        assert_eq!(moved.rect.left, 531.0);
    }

    #[test]
    fn horizontal_to_horizontal_teleport() {
        let params = WorldParams::default();

        // in through an east-facing portal, out of a west-facing one
        let mut set = EntitySet::new();
        let (a, b) = tunnel(
            &mut set,
            (Rect::new(0.0, 0.0, PORTAL_H, PORTAL_W), Direction::East),
            (Rect::new(500.0, 200.0, PORTAL_H, PORTAL_W), Direction::West),
        );
        let body = set.insert(player_at(
            Rect::new(-33.0, 20.0, 32.0, 32.0),
            Vec2::new(-250.0, 0.0),
        ));
        enter(
            &mut set,
            body,
            PortalLink {
                in_portal: a,
                out_portal: b,
            },
        );
        let env = Surroundings::capture(&set);
        let mut events = Vec::new();
        handle_engaged(&mut set, body, &env, &params, &mut events);

        let moved = set.get(body).unwrap();
        assert!((moved.velocity - Vec2::new(-250.0, 0.0)).mag() < 1e-9);
        assert_eq!(moved.rect.top, 220.0);
        assert_eq!(moved.rect.left, 531.0);
        assert_eq!(events.len(), 1);

        // in through a west-facing portal, out of an east-facing one
        let mut set = EntitySet::new();
        let (a, b) = tunnel(
            &mut set,
            (Rect::new(0.0, 0.0, PORTAL_H, PORTAL_W), Direction::West),
            (Rect::new(500.0, 200.0, PORTAL_H, PORTAL_W), Direction::East),
        );
        let velocity = Vec2::new(240.0, -70.0);
        let body = set.insert(player_at(Rect::new(32.0, 40.0, 32.0, 32.0), velocity));
        enter(
            &mut set,
            body,
            PortalLink {
                in_portal: a,
                out_portal: b,
            },
        );
        let env = Surroundings::capture(&set);
        handle_engaged(&mut set, body, &env, &params, &mut Vec::new());

        let moved = set.get(body).unwrap();
        assert!((moved.velocity - Vec2::new(250.0, 0.0)).mag() < 1e-9);
        assert_eq!(moved.rect.top, 240.0);
        assert_eq!(moved.rect.right(), 501.0);
        assert_eq!(
            moved.actor().unwrap().portal,
            PortalState::Exiting(PortalLink {
                in_portal: a,
                out_portal: b
            })
        );
    }

    #[test]
    fn horizontal_to_vertical_teleport() {
        let mut set = EntitySet::new();
        let (a, b) = tunnel(
            &mut set,
            (Rect::new(0.0, 0.0, PORTAL_H, PORTAL_W), Direction::East),
            (Rect::new(500.0, 300.0, PORTAL_W, PORTAL_H), Direction::North),
        );
        let body = set.insert(player_at(
            Rect::new(-33.0, 10.0, 32.0, 32.0),
            Vec2::new(-200.0, 0.0),
        ));
        enter(
            &mut set,
            body,
            PortalLink {
                in_portal: a,
                out_portal: b,
            },
        );
        let env = Surroundings::capture(&set);
        teleport(&mut set, body, &env, &WorldParams::default(), &mut Vec::new());

        let moved = set.get(body).unwrap();
        assert!((moved.velocity - Vec2::new(0.0, -200.0)).mag() < 1e-9);
        // offset from the bottom of the wall portal becomes offset from the left
        assert_eq!(moved.rect.left, 500.0 + 96.0 - 42.0);
        assert_eq!(moved.rect.top, 331.0);
    }

    #[test]
    fn reversal_swaps_portals_and_leaving_exits() {
        let mut set = EntitySet::new();
        let (a, b) = tunnel(
            &mut set,
            (Rect::new(0.0, 300.0, PORTAL_W, PORTAL_H), Direction::North),
            (Rect::new(500.0, 0.0, PORTAL_W, PORTAL_H), Direction::South),
        );
        let link = PortalLink {
            in_portal: a,
            out_portal: b,
        };
        let body = set.insert(player_at(
            Rect::new(520.0, 10.0, 32.0, 32.0),
            Vec2::new(0.0, -50.0),
        ));
        set.get_mut(body).unwrap().actor_mut().unwrap().portal = PortalState::Exiting(link);
        let env = Surroundings::capture(&set);
        let params = WorldParams::default();

        handle_engaged(&mut set, body, &env, &params, &mut Vec::new());
        assert_eq!(
            set.get(body).unwrap().actor().unwrap().portal,
            PortalState::Entering(link.reversed())
        );

        set.get_mut(body).unwrap().rect.top = 100.0;
        handle_engaged(&mut set, body, &env, &params, &mut Vec::new());
        assert_eq!(set.get(body).unwrap().actor().unwrap().portal, PortalState::Out);
    }

    #[test]
    fn capture_needs_a_twin() {
        let mut set = EntitySet::new();
        let lonely = set.insert(Body::new_portal(
            Rect::new(0.0, 300.0, PORTAL_W, PORTAL_H),
            Portal::new(Direction::North, "alone"),
        ));
        let body = set.insert(player_at(
            Rect::new(20.0, 290.0, 32.0, 32.0),
            Vec2::new(0.0, 100.0),
        ));
        let env = Surroundings::capture(&set);
        capture_entering(&mut set, &env);
        assert!(set.get(body).unwrap().actor().unwrap().portal.is_out());

        let twin = set.insert(Body::new_portal(
            Rect::new(500.0, 0.0, PORTAL_W, PORTAL_H),
            Portal::new(Direction::South, "alone"),
        ));
        let env = Surroundings::capture(&set);
        capture_entering(&mut set, &env);
        assert_eq!(
            set.get(body).unwrap().actor().unwrap().portal,
            PortalState::Entering(PortalLink {
                in_portal: lonely,
                out_portal: twin
            })
        );
    }

    #[test]
    fn opening_clamp() {
        let mut set = EntitySet::new();
        let (a, b) = tunnel(
            &mut set,
            (Rect::new(0.0, 300.0, PORTAL_W, PORTAL_H), Direction::North),
            (Rect::new(500.0, 0.0, PORTAL_W, PORTAL_H), Direction::South),
        );
        let body = set.insert(player_at(
            Rect::new(-5.0, 310.0, 32.0, 32.0),
            Vec2::new(-40.0, 100.0),
        ));
        enter(
            &mut set,
            body,
            PortalLink {
                in_portal: a,
                out_portal: b,
            },
        );
        let env = Surroundings::capture(&set);
        clamp_to_opening(&mut set, body, &env, &WorldParams::default());
        let clamped = set.get(body).unwrap();
        assert_eq!(clamped.rect.left, 1.0);
        assert_eq!(clamped.velocity, Vec2::new(0.0, 100.0));
        assert!(is_aligned(&clamped.rect, &env.portal(a).unwrap().rect, Direction::North));
    }
}
