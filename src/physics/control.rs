//! Movement intents: what a controlled body is trying to do this tick.

use super::{carry, BodyKey, EntitySet, WorldParams};
use crate::{
    event::{Event, EventSink},
    math::Vec2,
};

/// A single thing a controlled body can try to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub enum Intent {
    Left,
    Right,
    Jump,
    /// Slam down when in the air, drop through one-way platforms when on one.
    Duck,
    /// Pick up or throw.
    Interact,
    /// Only affects which way the body is facing, for aiming throws.
    Up,
}

impl Intent {
    pub const ALL: [Intent; 6] = [
        Intent::Left,
        Intent::Right,
        Intent::Jump,
        Intent::Duck,
        Intent::Interact,
        Intent::Up,
    ];

    #[inline]
    fn bit(self) -> u8 {
        1 << self as u8
    }

    /// Intents that happen once per press rather than for as long as they're held.
    #[inline]
    pub fn is_one_shot(self) -> bool {
        matches!(self, Intent::Interact | Intent::Duck)
    }
}

/// A set of intents, stored as bit flags.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IntentSet(u8);

impl IntentSet {
    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[inline]
    pub fn contains(&self, intent: Intent) -> bool {
        self.0 & intent.bit() != 0
    }

    #[inline]
    pub fn insert(&mut self, intent: Intent) {
        self.0 |= intent.bit();
    }

    #[inline]
    pub fn remove(&mut self, intent: Intent) {
        self.0 &= !intent.bit();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// The intents in this set that keep applying while held.
    pub fn held(self) -> Self {
        self.iter().filter(|i| !i.is_one_shot()).collect()
    }

    pub fn iter(self) -> impl Iterator<Item = Intent> {
        Intent::ALL.into_iter().filter(move |i| self.contains(*i))
    }

    /// The direction a body holding these intents is facing.
    ///
    /// Jumping counts as facing up, so jump-throwing throws upwards.
    pub fn facing(self) -> Vec2 {
        let axis = |pos: bool, neg: bool| pos as i8 as f64 - neg as i8 as f64;
        Vec2::new(
            axis(self.contains(Intent::Right), self.contains(Intent::Left)),
            axis(
                self.contains(Intent::Duck),
                self.contains(Intent::Up) || self.contains(Intent::Jump),
            ),
        )
    }
}

impl FromIterator<Intent> for IntentSet {
    fn from_iter<I: IntoIterator<Item = Intent>>(iter: I) -> Self {
        let mut set = Self::empty();
        for intent in iter {
            set.insert(intent);
        }
        set
    }
}

impl std::fmt::Debug for IntentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Apply a body's intents for this tick.
///
/// Each intent takes effect at most once between physics ticks,
/// no matter how many times this is called.
pub fn apply_intents(
    set: &mut EntitySet,
    key: BodyKey,
    intents: IntentSet,
    dt: f64,
    params: &WorldParams,
    events: &mut impl EventSink,
) {
    let Some(body) = set.get_mut(key) else {
        return;
    };
    body.facing = intents.facing();
    let Some(actor) = body.actor_mut() else {
        return;
    };
    let fresh: Vec<Intent> = intents
        .iter()
        .filter(|i| !actor.used_intents.contains(*i))
        .collect();
    for &intent in &fresh {
        actor.used_intents.insert(intent);
    }

    for intent in fresh {
        match intent {
            Intent::Left => walk(set, key, dt, -1.0, params),
            Intent::Right => walk(set, key, dt, 1.0, params),
            Intent::Jump => jump(set, key, events),
            Intent::Duck => duck(set, key, events),
            Intent::Interact => {
                carry::interact(set, key, params, events);
            }
            Intent::Up => {}
        }
    }
}

/// Accelerate towards the walking speed limit in the given direction,
/// without slowing down a body that's already going faster.
fn walk(set: &mut EntitySet, key: BodyKey, dt: f64, sign: f64, params: &WorldParams) {
    if dt == 0.0 {
        return;
    }
    let Some(body) = set.get_mut(key) else {
        return;
    };
    let Some(p) = body.actor().map(|a| {
        if a.on_ground {
            (a.params.horizontal_ground_speed, a.params.horizontal_ground_acceleration)
        } else {
            (a.params.horizontal_air_speed, a.params.horizontal_air_acceleration)
        }
    }) else {
        return;
    };
    let (speed, accel) = p;
    let along = sign * body.velocity.x;
    if speed > along {
        body.velocity.x =
            sign * speed.min(along + accel * dt * params.control_acceleration_scale);
    }
}

fn jump(set: &mut EntitySet, key: BodyKey, events: &mut impl EventSink) {
    let Some(body) = set.get_mut(key) else {
        return;
    };
    let Some(jump_speed) = body.actor_mut().and_then(|a| {
        if a.on_ground || a.coyote_time_left > 0.0 {
            a.coyote_time_left = 0.0;
            Some(a.params.jump_speed)
        } else {
            None
        }
    }) else {
        return;
    };
    body.velocity.y = -jump_speed;
    events.push(Event::Jump { body: key });
}

fn duck(set: &mut EntitySet, key: BodyKey, events: &mut impl EventSink) {
    let Some(body) = set.get_mut(key) else {
        return;
    };
    let Some(duck_speed) = body
        .actor()
        .and_then(|a| (!a.on_ground).then_some(a.params.duck_speed))
    else {
        return;
    };
    body.velocity.y = duck_speed.max(body.velocity.y).max(1.0);
    events.push(Event::Slam { body: key });
}

/// Forget which intents were used, letting them apply again.
/// Called at the start of every physics tick.
pub(crate) fn reset_used(set: &mut EntitySet, key: BodyKey) {
    if let Some(actor) = set.get_mut(key).and_then(|b| b.actor_mut()) {
        actor.used_intents = IntentSet::empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        math::Rect,
        physics::{Body, BodyParams},
    };

    fn player(set: &mut EntitySet, on_ground: bool) -> BodyKey {
        let key = set.insert(Body::new_dynamic(
            Rect::new(0.0, 0.0, 32.0, 32.0),
            BodyParams::player(),
        ));
        set.get_mut(key).unwrap().actor_mut().unwrap().on_ground = on_ground;
        key
    }

    fn intents(list: &[Intent]) -> IntentSet {
        list.iter().copied().collect()
    }

    #[test]
    fn facing_from_intents() {
        assert_eq!(intents(&[Intent::Right]).facing(), Vec2::new(1.0, 0.0));
        assert_eq!(intents(&[Intent::Left, Intent::Right]).facing(), Vec2::zero());
        assert_eq!(
            intents(&[Intent::Left, Intent::Jump]).facing(),
            Vec2::new(-1.0, -1.0)
        );
        assert_eq!(intents(&[Intent::Duck]).facing(), Vec2::new(0.0, 1.0));
        itertools::assert_equal(
            intents(&[Intent::Interact, Intent::Left, Intent::Duck]).held().iter(),
            [Intent::Left],
        );
    }

    #[test]
    fn walking_accelerates_up_to_the_limit() {
        let params = WorldParams::default();
        let mut set = EntitySet::new();
        let key = player(&mut set, true);
        let dt = 1.0 / 120.0;

        apply_intents(&mut set, key, intents(&[Intent::Right]), dt, &params, &mut Vec::new());
        let expected = 4000.0 * dt * 0.4;
        assert!((set.get(key).unwrap().velocity.x - expected).abs() < 1e-9);

        // only once per tick
        apply_intents(&mut set, key, intents(&[Intent::Right]), dt, &params, &mut Vec::new());
        assert!((set.get(key).unwrap().velocity.x - expected).abs() < 1e-9);

        for _ in 0..1000 {
            reset_used(&mut set, key);
            apply_intents(&mut set, key, intents(&[Intent::Right]), dt, &params, &mut Vec::new());
        }
        assert_eq!(set.get(key).unwrap().velocity.x, 250.0);

        // going faster than walking speed isn't slowed down by walking
        set.get_mut(key).unwrap().velocity.x = 400.0;
        reset_used(&mut set, key);
        apply_intents(&mut set, key, intents(&[Intent::Right]), dt, &params, &mut Vec::new());
        assert_eq!(set.get(key).unwrap().velocity.x, 400.0);
    }

    #[test]
    fn jump_needs_ground_or_coyote_time() {
        let params = WorldParams::default();
        let mut set = EntitySet::new();
        let grounded = player(&mut set, true);
        let airborne = player(&mut set, false);
        let mut events = Vec::new();

        for key in [grounded, airborne] {
            apply_intents(&mut set, key, intents(&[Intent::Jump]), 0.01, &params, &mut events);
        }
        assert_eq!(set.get(grounded).unwrap().velocity.y, -460.0);
        assert_eq!(set.get(airborne).unwrap().velocity.y, 0.0);
        assert_eq!(events, vec![Event::Jump { body: grounded }]);

        set.get_mut(airborne).unwrap().actor_mut().unwrap().coyote_time_left = 0.1;
        reset_used(&mut set, airborne);
        apply_intents(&mut set, airborne, intents(&[Intent::Jump]), 0.01, &params, &mut events);
        let a = set.get(airborne).unwrap();
        assert_eq!(a.velocity.y, -460.0);
        assert_eq!(a.actor().unwrap().coyote_time_left, 0.0);
    }

    #[test]
    fn duck_slams_in_the_air() {
        let params = WorldParams::default();
        let mut set = EntitySet::new();
        let grounded = player(&mut set, true);
        let airborne = player(&mut set, false);
        set.get_mut(airborne).unwrap().velocity.y = -300.0;
        let mut events = Vec::new();
        for key in [grounded, airborne] {
            apply_intents(&mut set, key, intents(&[Intent::Duck]), 0.01, &params, &mut events);
        }
        assert_eq!(set.get(grounded).unwrap().velocity.y, 0.0);
        assert_eq!(set.get(airborne).unwrap().velocity.y, 550.0);
        assert_eq!(events, vec![Event::Slam { body: airborne }]);
    }
}
