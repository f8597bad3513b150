//! Extracting what a renderer needs to know about each body,
//! without giving it access to the simulation.

use crate::{
    math::{Direction, Rect, Vec2},
    physics::{portal, BodyKey, EntitySet, Kind},
};

/// A snapshot of one body for drawing.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawItem {
    pub key: BodyKey,
    pub kind: Kind,
    /// Center of the body, extrapolated along its velocity.
    pub position: Vec2,
    /// Full bounds of the body at `position`.
    pub rect: Rect,
    /// While the body is going through a portal, the part of it that should be visible,
    /// relative to the top left corner of `rect`.
    pub clip: Option<Rect>,
    pub facing: Vec2,
    /// Current length of a mechanism's moving part.
    pub height: Option<f64>,
    /// The blocking part of a mechanism, in world coordinates.
    pub collision_rect: Option<Rect>,
    pub pressed: Option<bool>,
    pub orientation: Option<Direction>,
}

/// Snapshot every body in the set, moving each `t` seconds ahead along its velocity.
pub fn extract(set: &EntitySet, t: f64) -> Vec<DrawItem> {
    let _span = crate::tracy_span!("render extraction", "extract");

    set.iter()
        .map(|(key, body)| {
            let rect = body.rect.translated(body.velocity * t);

            let clip = body
                .actor()
                .and_then(|actor| actor.portal.engaged_portal())
                .and_then(|portal_key| {
                    let portal_body = set.get(portal_key)?;
                    let orientation = portal_body.portal()?.orientation;
                    if !portal::is_aligned(&rect, &portal_body.rect, orientation) {
                        return None;
                    }
                    let visible =
                        portal::clip_to_portal(rect, &portal_body.rect, orientation, 0.0);
                    Some(Rect::new(
                        visible.left - rect.left,
                        visible.top - rect.top,
                        visible.width,
                        visible.height,
                    ))
                });

            let mechanism = body.mechanism();
            DrawItem {
                key,
                kind: body.kind(),
                position: rect.center(),
                rect,
                clip,
                facing: body.facing,
                height: mechanism.map(|m| m.current_height),
                collision_rect: mechanism.map(|m| m.collision_rect(&body.rect)),
                pressed: body.trigger().map(|t| t.is_pressed()),
                orientation: body.portal().map(|p| p.orientation),
            }
        })
        .collect()
}
