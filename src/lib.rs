#[macro_use]
mod util;

pub mod error;
pub use error::{Error, Result};

pub mod event;
pub use event::{Event, EventQueue, EventSink};

pub mod game;
pub use game::{FixedTimestep, Game, GameState, LoopParams};

pub mod input;
pub use input::InputExchange;

pub mod level;
pub use level::{tile_rect, Level, TILE_SIZE};

pub mod math;
pub use math::{uv, Angle, Axis, Direction, Rect, Vec2};

pub mod physics;
pub use physics::{
    forcefield, Body, BodyKey, BodyKind, BodyParams, EntitySet, ForceField, Gravity, Intent,
    IntentSet, Kind, Physics, Portal, PortalState, ThrowableMaterial, Trigger, WorldParams,
};

#[cfg(feature = "serde-types")]
pub mod recipe;
#[cfg(feature = "serde-types")]
pub use recipe::{LevelRecipe, Recipe};

pub mod render;
pub use render::DrawItem;
