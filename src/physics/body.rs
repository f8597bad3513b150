use super::{
    control::IntentSet,
    mechanism::{Mechanism, Trigger},
    portal::{Portal, PortalState},
    BodyKey,
};
use crate::{
    error::{ensure, Result},
    math::{Axis, Rect, Vec2},
};

/// A body is a single simulated thing in a level:
/// a wall, a player, a crate, a button, a portal or a door.
///
/// Everything a body does is decided by its [`BodyKind`][self::BodyKind],
/// which also carries the state that only makes sense for that kind.
#[derive(Clone, Debug)]
pub struct Body {
    /// Bounds of the body. For mechanisms this is the whole area the
    /// moving part can occupy; see [`Body::collision_rect`].
    pub rect: Rect,
    /// Velocity in pixels per second.
    pub velocity: Vec2,
    /// Acceleration in pixels per second squared, applied on top of gravity.
    pub acceleration: Vec2,
    /// The direction the body is manually facing.
    /// Zero for bodies nobody is controlling.
    pub facing: Vec2,
    pub kind: BodyKind,
}

/// The role of a body, with the state specific to that role.
#[derive(Clone, Debug)]
pub enum BodyKind {
    /// Dynamic bodies collide with and stay out of statics.
    Static { one_way: bool },
    /// Walks, jumps, falls, gets carried and goes through portals.
    Dynamic(Actor),
    /// Notices dynamic bodies touching it and notifies linked mechanisms.
    Trigger(Trigger),
    /// Moves by its own velocity and is left alone by everything else.
    Kinematic,
    /// One end of a tunnel.
    Portal(Portal),
    /// A door or lifter driven by triggers. Collides like a static.
    Activated(Mechanism),
}

/// Plain tag identifying a [`BodyKind`][self::BodyKind] without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub enum Kind {
    Static,
    Dynamic,
    Trigger,
    Kinematic,
    Portal,
    Activated,
}

impl Body {
    fn new(rect: Rect, kind: BodyKind) -> Self {
        Self {
            rect,
            velocity: Vec2::zero(),
            acceleration: Vec2::zero(),
            facing: Vec2::zero(),
            kind,
        }
    }

    /// A solid block.
    pub fn new_static(rect: Rect) -> Self {
        Self::new(rect, BodyKind::Static { one_way: false })
    }

    /// A platform that can be jumped up through and dropped down through.
    pub fn new_one_way(rect: Rect) -> Self {
        Self::new(rect, BodyKind::Static { one_way: true })
    }

    pub fn new_dynamic(rect: Rect, params: BodyParams) -> Self {
        Self::new(rect, BodyKind::Dynamic(Actor::new(params)))
    }

    /// A dynamic block that can be picked up and thrown.
    pub fn new_throwable(rect: Rect, material: ThrowableMaterial) -> Self {
        let mut actor = Actor::new(BodyParams::throwable(material));
        actor.throwable = true;
        Self::new(rect, BodyKind::Dynamic(actor))
    }

    pub fn new_kinematic(rect: Rect) -> Self {
        Self::new(rect, BodyKind::Kinematic)
    }

    pub fn new_trigger(rect: Rect, trigger: Trigger) -> Self {
        Self::new(rect, BodyKind::Trigger(trigger))
    }

    pub fn new_portal(rect: Rect, portal: Portal) -> Self {
        Self::new(rect, BodyKind::Portal(portal))
    }

    pub fn new_activated(rect: Rect, mechanism: Mechanism) -> Self {
        Self::new(rect, BodyKind::Activated(mechanism))
    }

    pub fn new_door(rect: Rect, axis: Axis, open: bool) -> Self {
        Self::new_activated(rect, Mechanism::door(&rect, axis, open))
    }

    pub fn new_lifter(rect: Rect, raised: bool) -> Self {
        Self::new_activated(rect, Mechanism::lifter(&rect, raised))
    }

    /// Set the velocity of the body in a builder-like chain.
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        match self.kind {
            BodyKind::Static { .. } => Kind::Static,
            BodyKind::Dynamic(_) => Kind::Dynamic,
            BodyKind::Trigger(_) => Kind::Trigger,
            BodyKind::Kinematic => Kind::Kinematic,
            BodyKind::Portal(_) => Kind::Portal,
            BodyKind::Activated(_) => Kind::Activated,
        }
    }

    /// Center of the body's bounds.
    #[inline]
    pub fn position(&self) -> Vec2 {
        self.rect.center()
    }

    /// The rectangle other bodies collide with.
    ///
    /// For mechanisms this is derived from the current height of the moving part,
    /// so it must be read every tick instead of cached.
    pub fn collision_rect(&self) -> Rect {
        match &self.kind {
            BodyKind::Activated(mech) => mech.collision_rect(&self.rect),
            _ => self.rect,
        }
    }

    /// Whether the body stops dynamic bodies, and if so whether it's one-way.
    #[inline]
    pub fn collider(&self) -> Option<bool> {
        match self.kind {
            BodyKind::Static { one_way } => Some(one_way),
            BodyKind::Activated(_) => Some(false),
            _ => None,
        }
    }

    #[inline]
    pub fn actor(&self) -> Option<&Actor> {
        match &self.kind {
            BodyKind::Dynamic(actor) => Some(actor),
            _ => None,
        }
    }

    #[inline]
    pub fn actor_mut(&mut self) -> Option<&mut Actor> {
        match &mut self.kind {
            BodyKind::Dynamic(actor) => Some(actor),
            _ => None,
        }
    }

    #[inline]
    pub fn portal(&self) -> Option<&Portal> {
        match &self.kind {
            BodyKind::Portal(portal) => Some(portal),
            _ => None,
        }
    }

    #[inline]
    pub fn trigger(&self) -> Option<&Trigger> {
        match &self.kind {
            BodyKind::Trigger(trigger) => Some(trigger),
            _ => None,
        }
    }

    #[inline]
    pub fn mechanism(&self) -> Option<&Mechanism> {
        match &self.kind {
            BodyKind::Activated(mech) => Some(mech),
            _ => None,
        }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.rect.is_finite()
            && crate::math::vec_is_finite(self.velocity)
            && crate::math::vec_is_finite(self.acceleration)
    }
}

/// Simulation state of a dynamic body.
#[derive(Clone, Debug)]
pub struct Actor {
    pub params: BodyParams,
    pub mass: Mass,
    pub on_ground: bool,
    /// Time left during which a jump is allowed even though we're in the air.
    pub coyote_time_left: f64,
    pub portal: PortalState,
    /// Whether other bodies can pick this one up.
    pub throwable: bool,
    // the carry link is only changed through physics::carry
    // so that both ends are always updated together
    pub(crate) carried: Option<BodyKey>,
    pub(crate) carrier: Option<BodyKey>,
    pub(crate) used_intents: IntentSet,
}

impl Actor {
    pub fn new(params: BodyParams) -> Self {
        Self {
            mass: Mass::from(params.weight),
            params,
            on_ground: false,
            coyote_time_left: 0.0,
            portal: PortalState::Out,
            throwable: false,
            carried: None,
            carrier: None,
            used_intents: IntentSet::empty(),
        }
    }

    /// The body this one is holding, if any.
    #[inline]
    pub fn carried(&self) -> Option<BodyKey> {
        self.carried
    }

    /// The body holding this one, if any.
    #[inline]
    pub fn carrier(&self) -> Option<BodyKey> {
        self.carrier
    }
}

/// Physical tuning of a dynamic body.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct BodyParams {
    /// Scales how strongly impulses from carrying and throwing affect the body.
    pub weight: f64,
    /// Magnitude of the impulse applied when throwing a held body.
    pub throw_force: f64,
    /// Walking speed limit on the ground.
    pub horizontal_ground_speed: f64,
    pub horizontal_ground_acceleration: f64,
    /// Horizontal speed limit for steering in the air.
    pub horizontal_air_speed: f64,
    pub horizontal_air_acceleration: f64,
    /// Fraction of horizontal velocity kept after one second on the ground.
    pub ground_damping: f64,
    /// Fraction of horizontal velocity kept after one second in the air.
    pub air_damping: f64,
    pub jump_speed: f64,
    /// Downward speed when slamming down from the air.
    pub duck_speed: f64,
    /// How long after leaving the ground a jump is still allowed, in seconds.
    pub coyote_time: f64,
    /// How far away something can be picked up and carried.
    pub max_holding_distance: f64,
}

impl Default for BodyParams {
    fn default() -> Self {
        Self {
            weight: 10.0,
            throw_force: 12_000.0,
            horizontal_ground_speed: 250.0,
            horizontal_ground_acceleration: 4000.0,
            horizontal_air_speed: 100.0,
            horizontal_air_acceleration: 2000.0,
            ground_damping: 1e-10,
            air_damping: 0.8,
            jump_speed: 460.0,
            duck_speed: 550.0,
            coyote_time: 0.25,
            max_holding_distance: 32.0,
        }
    }
}

impl BodyParams {
    /// Parameters for the player character.
    pub fn player() -> Self {
        Self {
            weight: 100.0,
            air_damping: 0.002,
            ..Self::default()
        }
    }

    /// Parameters for a block that can be picked up.
    pub fn throwable(material: ThrowableMaterial) -> Self {
        Self {
            weight: material.weight(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure(self.weight.is_finite() && self.weight > 0.0, || {
            format!("weight must be positive, got {}", self.weight)
        })?;
        for (name, val) in [
            ("throw_force", self.throw_force),
            ("horizontal_ground_speed", self.horizontal_ground_speed),
            ("horizontal_air_speed", self.horizontal_air_speed),
            ("jump_speed", self.jump_speed),
            ("duck_speed", self.duck_speed),
            ("coyote_time", self.coyote_time),
            ("max_holding_distance", self.max_holding_distance),
        ] {
            ensure(val.is_finite() && val >= 0.0, || {
                format!("{name} must be non-negative, got {val}")
            })?;
        }
        for (name, val) in [
            ("ground_damping", self.ground_damping),
            ("air_damping", self.air_damping),
        ] {
            ensure((0.0..=1.0).contains(&val), || {
                format!("{name} must be within [0, 1], got {val}")
            })?;
        }
        Ok(())
    }
}

/// What a throwable block is made of, which decides its weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub enum ThrowableMaterial {
    Iron,
    Wood,
    Gold,
}

impl ThrowableMaterial {
    pub fn weight(self) -> f64 {
        match self {
            ThrowableMaterial::Iron => 50.0,
            ThrowableMaterial::Wood => 20.0,
            ThrowableMaterial::Gold => 125.0,
        }
    }
}

/// Mass of a body.
///
/// This stores both a mass value and its inverse, because the inverse
/// is what impulse calculations actually need.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mass {
    mass: f64,
    inverse: f64,
}

impl From<f64> for Mass {
    #[inline]
    fn from(mass: f64) -> Self {
        Mass {
            mass,
            inverse: 1.0 / mass,
        }
    }
}

impl Mass {
    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    #[inline]
    pub fn inv(&self) -> f64 {
        self.inverse
    }
}
