//! Serializable descriptions of levels that can be spawned into a [`Level`].
//!
//! Positions and sizes are in tiles, see [`TILE_SIZE`][crate::level::TILE_SIZE].
//! Buttons refer to the mechanisms they drive by their index in the list of entries.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    event::EventSink,
    level::Level,
    math::{Axis, Direction, Rect, Vec2},
    physics::{BodyKey, Gravity, ThrowableMaterial, WorldParams},
};

/// One thing to spawn.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub enum Recipe {
    Wall {
        pos: (i32, i32),
        size: (u32, u32),
    },
    OneWay {
        pos: (i32, i32),
        width: u32,
    },
    Player {
        pos: (i32, i32),
    },
    Throwable {
        pos: (i32, i32),
        material: ThrowableMaterial,
    },
    PortalPair {
        tunnel_id: String,
        a: ((i32, i32), Direction),
        b: ((i32, i32), Direction),
    },
    Button {
        pos: (i32, i32),
        /// Indices of the doors and lifters this button drives.
        #[serde(default)]
        links: Vec<usize>,
    },
    Finish {
        pos: (i32, i32),
    },
    Door {
        pos: (i32, i32),
        length: u32,
        axis: Axis,
        #[serde(default)]
        open: bool,
    },
    Lifter {
        pos: (i32, i32),
        height: u32,
        #[serde(default)]
        raised: bool,
    },
    /// Positioned in pixels, as kinematic bodies don't have to line up with tiles.
    Kinematic {
        rect: Rect,
        #[serde(default)]
        velocity: (f64, f64),
    },
}

impl Recipe {
    fn is_mechanism(&self) -> bool {
        matches!(self, Recipe::Door { .. } | Recipe::Lifter { .. })
    }

    fn spawn<E: EventSink>(&self, level: &mut Level<E>) -> Result<BodyKey> {
        Ok(match self {
            Recipe::Wall { pos, size } => level.spawn_wall(*pos, *size),
            Recipe::OneWay { pos, width } => level.spawn_one_way(*pos, *width),
            Recipe::Player { pos } => level.spawn_player(*pos),
            Recipe::Throwable { pos, material } => level.spawn_throwable(*pos, *material),
            Recipe::PortalPair { tunnel_id, a, b } => {
                level.spawn_portal_pair(*a, *b, tunnel_id.as_str()).0
            }
            // linked after everything is spawned
            Recipe::Button { pos, .. } => level.spawn_button(*pos, &[])?,
            Recipe::Finish { pos } => level.spawn_finish(*pos),
            Recipe::Door {
                pos,
                length,
                axis,
                open,
            } => level.spawn_door(*pos, *length, *axis, *open),
            Recipe::Lifter {
                pos,
                height,
                raised,
            } => level.spawn_lifter(*pos, *height, *raised),
            Recipe::Kinematic { rect, velocity } => {
                level.spawn_kinematic(*rect, Vec2::new(velocity.0, velocity.1))
            }
        })
    }
}

/// A whole level.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct LevelRecipe {
    #[serde(default)]
    pub params: WorldParams,
    #[serde(default)]
    pub gravity: Gravity,
    pub entries: Vec<Recipe>,
}

impl LevelRecipe {
    /// Check that every button link points at a mechanism.
    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;
        for entry in &self.entries {
            if let Recipe::Button { links, .. } = entry {
                for &idx in links {
                    if !self.entries.get(idx).map_or(false, Recipe::is_mechanism) {
                        return Err(Error::UnknownRecipeTarget(idx));
                    }
                }
            }
        }
        Ok(())
    }

    /// Spawn everything into an existing level, returning the key of each entry in order.
    /// For portal pairs this is the first portal of the pair.
    ///
    /// Nothing is spawned if the recipe is invalid.
    pub fn spawn_into<E: EventSink>(&self, level: &mut Level<E>) -> Result<Vec<BodyKey>> {
        self.validate()?;
        let keys = self
            .entries
            .iter()
            .map(|e| e.spawn(level))
            .collect::<Result<Vec<BodyKey>>>()?;
        for (entry, &key) in self.entries.iter().zip(&keys) {
            if let Recipe::Button { links, .. } = entry {
                for &idx in links {
                    level.link(key, keys[idx])?;
                }
            }
        }
        log::debug!("Spawned {} recipe entries", keys.len());
        Ok(keys)
    }

    /// Create a new level from this recipe.
    pub fn build(&self) -> Result<Level> {
        let mut level = Level::new(self.params)?;
        level.gravity = self.gravity;
        self.spawn_into(&mut level)?;
        level.validate()?;
        Ok(level)
    }
}
