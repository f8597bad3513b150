use crate::math::Vec2;

/// A (possibly) position-dependent acceleration that is
/// fed to the physics world and applied to all dynamic bodies each tick.
pub trait ForceField {
    fn value_at(&self, position: Vec2) -> Vec2;
}

pub struct NoneField;
impl ForceField for NoneField {
    fn value_at(&self, _: Vec2) -> Vec2 {
        Vec2::zero()
    }
}

/// Constant gravity field over all of space.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub struct Gravity(pub Vec2);

impl Default for Gravity {
    /// Downward gravity of 1000 px/s².
    fn default() -> Self {
        Gravity(Vec2::new(0.0, 1000.0))
    }
}

impl ForceField for Gravity {
    fn value_at(&self, _pos: Vec2) -> Vec2 {
        self.0
    }
}
