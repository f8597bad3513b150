//! Triggers (buttons, level exits) and the mechanisms they drive (doors, lifters).

use super::{collision::Surroundings, BodyKey, BodyKind, EntitySet, Kind, WorldParams};
use crate::{
    error::{ensure, Result},
    event::{Event, EventSink},
    math::{Axis, Rect},
};

/// What a trigger does when pressed, besides notifying its linked mechanisms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub enum TriggerRole {
    Button,
    /// Reaching this finishes the level.
    Finish,
}

/// A pressure plate that notices dynamic bodies touching it.
#[derive(Clone, Debug, PartialEq)]
pub struct Trigger {
    pub role: TriggerRole,
    /// Mechanisms notified when this is pressed and released, in the order they were linked.
    pub targets: Vec<BodyKey>,
    pressed: bool,
}

impl Trigger {
    pub fn new(role: TriggerRole) -> Self {
        Self {
            role,
            targets: Vec::new(),
            pressed: false,
        }
    }

    pub fn button() -> Self {
        Self::new(TriggerRole::Button)
    }

    pub fn finish() -> Self {
        Self::new(TriggerRole::Finish)
    }

    /// Whether something was touching the trigger at the end of the last tick.
    #[inline]
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

/// Which way a mechanism's moving part is going.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub enum HeightState {
    Extending,
    Retracting,
}

impl HeightState {
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            HeightState::Extending => HeightState::Retracting,
            HeightState::Retracting => HeightState::Extending,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MechanismKind {
    /// A bar that closes off its rect.
    /// Vertical doors grow up from the bottom edge, horizontal ones left from the right edge.
    Door { axis: Axis },
    /// A platform moving up and down within its rect.
    Lifter {
        platform_thickness: f64,
        default_state: HeightState,
    },
}

/// A moving obstacle driven by triggers.
///
/// For doors `current_height` is the length of the bar,
/// for lifters it's how far above the bottom of the rect the platform is.
#[derive(Clone, Debug, PartialEq)]
pub struct Mechanism {
    pub kind: MechanismKind,
    pub height_state: HeightState,
    pub current_height: f64,
    pub min_height: f64,
    pub max_height: f64,
    /// Time in seconds to go all the way from min to max height.
    pub duration: f64,
    moving: bool,
}

pub const LIFTER_PLATFORM_THICKNESS: f64 = 10.0;

impl Mechanism {
    /// A door filling the given rect along `axis`.
    pub fn door(rect: &Rect, axis: Axis, open: bool) -> Self {
        let max_height = rect.extent(axis);
        Self {
            kind: MechanismKind::Door { axis },
            height_state: if open {
                HeightState::Retracting
            } else {
                HeightState::Extending
            },
            current_height: if open { 0.0 } else { max_height },
            min_height: 0.0,
            max_height,
            duration: 1.0,
            moving: false,
        }
    }

    /// A lifter moving within the given rect, starting at the top if `raised`.
    /// It returns to where it started whenever it's not triggered.
    pub fn lifter(rect: &Rect, raised: bool) -> Self {
        let max_height = (rect.height - LIFTER_PLATFORM_THICKNESS).max(0.0);
        let default_state = if raised {
            HeightState::Extending
        } else {
            HeightState::Retracting
        };
        Self {
            kind: MechanismKind::Lifter {
                platform_thickness: LIFTER_PLATFORM_THICKNESS,
                default_state,
            },
            height_state: default_state,
            current_height: if raised { max_height } else { 0.0 },
            min_height: 0.0,
            max_height,
            duration: 1.0,
            moving: false,
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure(self.duration.is_finite() && self.duration > 0.0, || {
            format!("mechanism duration must be positive, got {}", self.duration)
        })?;
        ensure(self.min_height <= self.max_height, || {
            format!(
                "min height {} is above max height {}",
                self.min_height, self.max_height
            )
        })
    }

    /// Called on the rising edge of a linked trigger.
    pub fn trigger(&mut self) {
        self.height_state = match self.kind {
            // pressing a button opens doors
            MechanismKind::Door { .. } => HeightState::Retracting,
            MechanismKind::Lifter { default_state, .. } => default_state.opposite(),
        };
    }

    /// Called on the falling edge of a linked trigger.
    pub fn untrigger(&mut self) {
        self.height_state = match self.kind {
            MechanismKind::Door { .. } => HeightState::Extending,
            MechanismKind::Lifter { default_state, .. } => default_state,
        };
    }

    /// Whether the moving part moved during the last tick.
    #[inline]
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Move towards the current target height.
    /// Returns whether the mechanism started or stopped moving.
    ///
    /// A mechanism without a positive duration snaps straight to its target.
    fn advance(&mut self, dt: f64) -> Option<bool> {
        let (target, dir) = match self.height_state {
            HeightState::Extending => (self.max_height, 1.0),
            HeightState::Retracting => (self.min_height, -1.0),
        };
        let prev = self.current_height;
        self.current_height = if self.duration.is_finite() && self.duration > 0.0 {
            let rate = (self.max_height - self.min_height) / self.duration;
            (prev + dir * rate * dt)
                .max(self.min_height)
                .min(self.max_height)
        } else {
            target
        };

        let moving = self.current_height != prev;
        let was_moving = std::mem::replace(&mut self.moving, moving);
        (moving != was_moving).then_some(moving)
    }

    /// The part of `rect` currently blocking dynamic bodies.
    pub fn collision_rect(&self, rect: &Rect) -> Rect {
        let h = self.current_height;
        match self.kind {
            MechanismKind::Door {
                axis: Axis::Vertical,
            } => Rect::new(
                rect.left + rect.width / 4.0,
                rect.bottom() - h,
                rect.width / 2.0,
                h,
            ),
            MechanismKind::Door {
                axis: Axis::Horizontal,
            } => Rect::new(
                rect.right() - h,
                rect.top + rect.height / 4.0,
                h,
                rect.height / 2.0,
            ),
            MechanismKind::Lifter {
                platform_thickness, ..
            } => Rect::new(
                rect.left,
                rect.bottom() - h - platform_thickness,
                rect.width,
                platform_thickness,
            ),
        }
    }
}

/// Move every mechanism towards its target height.
pub(crate) fn advance_mechanisms(set: &mut EntitySet, dt: f64, events: &mut impl EventSink) {
    let _span = crate::tracy_span!("advance mechanisms", "advance_mechanisms");

    let keys = set.bodies_of_kind(Kind::Activated).to_vec();
    for key in keys {
        let Some(BodyKind::Activated(mech)) = set.get_mut(key).map(|b| &mut b.kind) else {
            continue;
        };
        match mech.advance(dt) {
            Some(true) => events.push(Event::MechanismStarted { mechanism: key }),
            Some(false) => events.push(Event::MechanismStopped { mechanism: key }),
            None => {}
        }
    }
}

/// Check which triggers are being touched by dynamic bodies
/// and notify their targets of any changes since last tick.
pub(crate) fn update_triggers(
    set: &mut EntitySet,
    env: &Surroundings,
    params: &WorldParams,
    events: &mut impl EventSink,
) {
    let _span = crate::tracy_span!("update triggers", "update_triggers");

    // parts of bodies that have gone into a portal can't press anything
    let dynamic_rects: Vec<Rect> = set
        .bodies_of_kind(Kind::Dynamic)
        .iter()
        .filter_map(|&k| {
            let rect = set.get(k)?.collision_rect();
            Some(env.clip(rect, params.portal_clip_tolerance))
        })
        .collect();

    let keys = set.bodies_of_kind(Kind::Trigger).to_vec();
    for key in keys {
        let Some(body) = set.get_mut(key) else {
            continue;
        };
        let area = env.clip(body.rect, params.portal_clip_tolerance);
        let pressed = dynamic_rects.iter().any(|r| r.overlaps(&area));
        let BodyKind::Trigger(trigger) = &mut body.kind else {
            continue;
        };
        if trigger.pressed == pressed {
            continue;
        }
        trigger.pressed = pressed;
        let role = trigger.role;
        let targets = trigger.targets.clone();
        log::debug!("{role:?} {key:?} {}", if pressed { "pressed" } else { "released" });

        match (role, pressed) {
            (TriggerRole::Button, true) => events.push(Event::ButtonPressed { trigger: key }),
            (TriggerRole::Button, false) => events.push(Event::ButtonReleased { trigger: key }),
            (TriggerRole::Finish, true) => events.push(Event::LevelFinished { trigger: key }),
            (TriggerRole::Finish, false) => {}
        }

        for target in targets {
            let Some(BodyKind::Activated(mech)) = set.get_mut(target).map(|b| &mut b.kind) else {
                continue;
            };
            if pressed {
                mech.trigger();
                events.push(Event::MechanismTriggered {
                    mechanism: target,
                    by: key,
                });
            } else {
                mech.untrigger();
                events.push(Event::MechanismUntriggered {
                    mechanism: target,
                    by: key,
                });
            }
        }
    }
}
