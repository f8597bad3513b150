//! A level: the bodies in it, the physics driving them and the input controlling them.

use std::{collections::HashMap, sync::Arc};

use crate::{
    error::Result,
    event::{EventQueue, EventSink},
    game::GameState,
    input::InputExchange,
    math::{Axis, Direction, Rect, Vec2},
    physics::{
        control, Body, BodyKey, BodyParams, EntitySet, Gravity, IntentSet, Kind, Physics, Portal,
        ThrowableMaterial, Trigger, WorldParams,
    },
    render::{self, DrawItem},
};

/// Side length of a tile in pixels. Spawning positions and sizes are given in tiles.
pub const TILE_SIZE: f64 = 32.0;
/// One-way platforms are thin lines at the top of their tile.
/// Whether they stop a body depends on where it was coming from,
/// so the thickness only needs to be visible and well above rounding error.
pub const ONE_WAY_THICKNESS: f64 = 1.0;

/// A rect in pixels from a position and size in tiles.
pub fn tile_rect(pos: (i32, i32), size: (u32, u32)) -> Rect {
    Rect::new(
        pos.0 as f64 * TILE_SIZE,
        pos.1 as f64 * TILE_SIZE,
        size.0 as f64 * TILE_SIZE,
        size.1 as f64 * TILE_SIZE,
    )
}

/// Everything in a running level.
///
/// Bodies can be spawned and despawned between ticks.
/// Events from ticking go into `events`, which defaults to an [`EventQueue`].
pub struct Level<E: EventSink = EventQueue> {
    pub bodies: EntitySet,
    pub physics: Physics,
    pub gravity: Gravity,
    pub events: E,
    input: Arc<InputExchange>,
    intents: HashMap<BodyKey, IntentSet>,
    player: Option<BodyKey>,
    last_dt: f64,
    draw_list: Vec<DrawItem>,
}

impl Level<EventQueue> {
    pub fn new(params: WorldParams) -> Result<Self> {
        Self::with_events(params, EventQueue::new())
    }
}

impl<E: EventSink> Level<E> {
    pub fn with_events(params: WorldParams, events: E) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            bodies: EntitySet::new(),
            physics: Physics::new(params),
            gravity: Gravity::default(),
            events,
            input: Arc::new(InputExchange::new()),
            intents: HashMap::new(),
            player: None,
            last_dt: 0.0,
            draw_list: Vec::new(),
        })
    }

    //
    // Spawning
    //

    /// Add any body, positioned in pixels.
    pub fn spawn(&mut self, body: Body) -> BodyKey {
        self.bodies.insert(body)
    }

    pub fn spawn_wall(&mut self, pos: (i32, i32), size: (u32, u32)) -> BodyKey {
        self.spawn(Body::new_static(tile_rect(pos, size)))
    }

    pub fn spawn_one_way(&mut self, pos: (i32, i32), width: u32) -> BodyKey {
        let mut rect = tile_rect(pos, (width, 1));
        rect.height = ONE_WAY_THICKNESS;
        self.spawn(Body::new_one_way(rect))
    }

    /// Spawn the player-controlled body. Replaces the previous player, if any, as the one
    /// returned by [`player`][Self::player], but doesn't remove it.
    pub fn spawn_player(&mut self, pos: (i32, i32)) -> BodyKey {
        let key = self.spawn(Body::new_dynamic(
            tile_rect(pos, (1, 1)),
            BodyParams::player(),
        ));
        self.player = Some(key);
        key
    }

    pub fn spawn_throwable(&mut self, pos: (i32, i32), material: ThrowableMaterial) -> BodyKey {
        self.spawn(Body::new_throwable(tile_rect(pos, (1, 1)), material))
    }

    /// Spawn two portals connected to each other.
    ///
    /// Portals are three tiles wide and one tile deep.
    pub fn spawn_portal_pair(
        &mut self,
        (pos1, orientation1): ((i32, i32), Direction),
        (pos2, orientation2): ((i32, i32), Direction),
        tunnel_id: impl Into<String>,
    ) -> (BodyKey, BodyKey) {
        let tunnel_id = tunnel_id.into();
        let portal_rect = |pos, orientation: Direction| match orientation.axis() {
            Axis::Vertical => tile_rect(pos, (3, 1)),
            Axis::Horizontal => tile_rect(pos, (1, 3)),
        };
        let a = self.spawn(Body::new_portal(
            portal_rect(pos1, orientation1),
            Portal::new(orientation1, tunnel_id.clone()),
        ));
        let b = self.spawn(Body::new_portal(
            portal_rect(pos2, orientation2),
            Portal::new(orientation2, tunnel_id),
        ));
        (a, b)
    }

    /// Spawn a two tiles wide button that opens or moves the given mechanisms.
    ///
    /// Nothing is spawned if any of the targets isn't a mechanism.
    pub fn spawn_button(&mut self, pos: (i32, i32), linked_to: &[BodyKey]) -> Result<BodyKey> {
        for &target in linked_to {
            self.bodies.get_kind(target, Kind::Activated)?;
        }
        let key = self.spawn(Body::new_trigger(tile_rect(pos, (2, 1)), Trigger::button()));
        for &target in linked_to {
            self.bodies.link(key, target)?;
        }
        Ok(key)
    }

    /// Spawn the exit of the level.
    pub fn spawn_finish(&mut self, pos: (i32, i32)) -> BodyKey {
        self.spawn(Body::new_trigger(tile_rect(pos, (1, 1)), Trigger::finish()))
    }

    /// Spawn a door two tiles thick and `length` tiles long along `axis`.
    pub fn spawn_door(&mut self, pos: (i32, i32), length: u32, axis: Axis, open: bool) -> BodyKey {
        let size = match axis {
            Axis::Vertical => (2, length),
            Axis::Horizontal => (length, 2),
        };
        self.spawn(Body::new_door(tile_rect(pos, size), axis, open))
    }

    /// Spawn a lifter two tiles wide whose platform travels `height` tiles.
    pub fn spawn_lifter(&mut self, pos: (i32, i32), height: u32, raised: bool) -> BodyKey {
        self.spawn(Body::new_lifter(tile_rect(pos, (2, height)), raised))
    }

    pub fn spawn_kinematic(&mut self, rect: Rect, velocity: Vec2) -> BodyKey {
        self.spawn(Body::new_kinematic(rect).with_velocity(velocity))
    }

    /// Make a trigger notify a mechanism when it's pressed or released.
    pub fn link(&mut self, trigger: BodyKey, target: BodyKey) -> Result<()> {
        self.bodies.link(trigger, target)
    }

    /// Remove a body and everything referring to it.
    pub fn despawn(&mut self, key: BodyKey) -> Option<Body> {
        if self.player == Some(key) {
            self.player = None;
        }
        self.intents.remove(&key);
        self.input.forget(key);
        self.bodies.remove(key)
    }

    /// Tear everything down, e.g. to restart or load another level.
    pub fn clear(&mut self) {
        log::debug!("Clearing level with {} bodies", self.bodies.len());
        self.bodies.clear();
        self.intents.clear();
        self.input.clear();
        self.player = None;
        self.draw_list.clear();
    }

    /// Check that the level is consistent enough to run.
    pub fn validate(&self) -> Result<()> {
        self.physics.params.validate()?;
        self.bodies.validate()?;
        for (_, body) in self.bodies.iter() {
            if let Some(mech) = body.mechanism() {
                mech.validate()?;
            }
            if let Some(actor) = body.actor() {
                actor.params.validate()?;
            }
        }
        Ok(())
    }

    //
    // Running
    //

    /// Shared handle for feeding intents in, possibly from another thread.
    pub fn input(&self) -> &Arc<InputExchange> {
        &self.input
    }

    /// Take a fresh snapshot of intents from the input exchange.
    pub fn poll_input(&mut self) {
        self.intents = self.input.take();
    }

    /// Set a body's intents directly, bypassing the input exchange until the next poll.
    pub fn set_intents(&mut self, key: BodyKey, intents: IntentSet) {
        self.intents.insert(key, intents);
    }

    /// Apply every controlled body's intents.
    ///
    /// One-shot intents only act on the first call after they were set,
    /// held ones keep acting until they're changed.
    pub fn tick_actors(&mut self, dt: f64) {
        let _span = crate::tracy_span!("tick actors", "tick_actors");

        let dynamics = self.bodies.bodies_of_kind(Kind::Dynamic).to_vec();
        for key in dynamics {
            let Some(&intents) = self.intents.get(&key) else {
                continue;
            };
            control::apply_intents(
                &mut self.bodies,
                key,
                intents,
                dt,
                &self.physics.params,
                &mut self.events,
            );
        }
        for intents in self.intents.values_mut() {
            *intents = intents.held();
        }
    }

    pub fn tick_physics(&mut self, dt: f64) {
        self.physics
            .tick(&mut self.bodies, dt, &self.gravity, &mut self.events);
        self.last_dt = dt;
    }

    /// Snapshot every body for drawing, `fraction` of a tick after the last one.
    pub fn render(&self, fraction: f64) -> Vec<DrawItem> {
        render::extract(&self.bodies, fraction * self.last_dt)
    }

    /// What was captured the last time the level was drawn as a [`GameState`].
    pub fn draw_list(&self) -> &[DrawItem] {
        &self.draw_list
    }

    //
    // Accessors
    //

    /// The body most recently spawned with [`spawn_player`][Self::spawn_player].
    pub fn player(&self) -> Option<BodyKey> {
        self.player
    }

    pub fn body(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key)
    }

    pub fn rect(&self, key: BodyKey) -> Option<Rect> {
        self.bodies.get(key).map(|b| b.rect)
    }

    pub fn velocity(&self, key: BodyKey) -> Option<Vec2> {
        self.bodies.get(key).map(|b| b.velocity)
    }
}

impl<E: EventSink> GameState for Level<E> {
    fn tick(&mut self, dt: f64, first_in_frame: bool) -> Option<()> {
        if first_in_frame {
            self.poll_input();
        }
        self.tick_actors(dt);
        self.tick_physics(dt);
        Some(())
    }

    fn draw(&mut self, interpolation: f64) {
        self.draw_list = self.render(interpolation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::Error,
        event::Event,
        physics::{HeightState, Intent},
    };

    const DT: f64 = 1.0 / 120.0;

    fn level() -> Level {
        let mut level = Level::new(WorldParams::default()).unwrap();
        level.spawn_wall((0, 5), (10, 1));
        level
    }

    fn run(level: &mut Level, ticks: usize) {
        for i in 0..ticks {
            level.tick(DT, i == 0);
        }
    }

    #[test]
    fn player_lands_on_floor() {
        let mut level = level();
        let player = level.spawn_player((2, 3));
        run(&mut level, 120);
        let body = level.body(player).unwrap();
        assert!(body.actor().unwrap().on_ground);
        assert_eq!(body.velocity.y, 0.0);
        assert!((level.rect(player).unwrap().bottom() - 160.0).abs() < 0.5);
    }

    #[test]
    fn pick_up_and_throw_through_input() {
        let mut level = level();
        let player = level.spawn_player((2, 4));
        let block = level.spawn_throwable((3, 4), ThrowableMaterial::Wood);

        level.input().press(player, Intent::Interact);
        run(&mut level, 10);
        let actor = level.body(player).unwrap().actor().unwrap();
        assert_eq!(actor.carried(), Some(block));
        let picked_up = level
            .events
            .iter()
            .filter(|e| matches!(e, Event::PickedUp { .. }))
            .count();
        assert_eq!(picked_up, 1);

        level.input().press(player, Intent::Right);
        level.input().press(player, Intent::Interact);
        run(&mut level, 1);
        assert!(level.events.iter().any(|e| matches!(
            e,
            Event::Thrown { carrier, held, .. } if *carrier == player && *held == block
        )));
        assert_eq!(level.body(block).unwrap().actor().unwrap().carrier(), None);
        assert!(level.velocity(block).unwrap().y < 0.0);
    }

    #[test]
    fn button_opens_door() {
        let mut level = level();
        let door = level.spawn_door((6, 1), 4, Axis::Vertical, false);
        let button = level.spawn_button((1, 4), &[door]).unwrap();
        level.spawn_player((1, 4));

        run(&mut level, 60);
        assert!(level.body(button).unwrap().trigger().unwrap().is_pressed());
        let mech = level.body(door).unwrap().mechanism().unwrap();
        assert_eq!(mech.height_state, HeightState::Retracting);
        assert!(mech.current_height < mech.max_height);
        itertools::assert_equal(
            level
                .events
                .drain()
                .filter(|e| matches!(e, Event::MechanismTriggered { .. })),
            [Event::MechanismTriggered {
                mechanism: door,
                by: button,
            }],
        );
    }

    #[test]
    fn button_targets_must_be_mechanisms() {
        let mut level = level();
        let wall = level.spawn_wall((0, 0), (1, 1));
        let count = level.bodies.len();
        assert!(matches!(
            level.spawn_button((1, 4), &[wall]),
            Err(Error::WrongKind { .. })
        ));
        assert_eq!(level.bodies.len(), count);
    }

    #[test]
    fn finish_ends_level() {
        let mut level = level();
        let finish = level.spawn_finish((4, 4));
        level.spawn_player((4, 3));
        run(&mut level, 60);
        assert!(level
            .events
            .iter()
            .any(|e| *e == Event::LevelFinished { trigger: finish }));
    }

    #[test]
    fn tunnels_must_be_paired() {
        let mut level = level();
        let (a, _) = level.spawn_portal_pair(
            ((8, 0), Direction::South),
            ((8, 4), Direction::North),
            "yellow",
        );
        assert!(level.validate().is_ok());
        assert_eq!(level.rect(a), Some(Rect::new(256.0, 0.0, 96.0, 32.0)));

        let (c, _) = level.spawn_portal_pair(
            ((0, 1), Direction::East),
            ((9, 1), Direction::West),
            "green",
        );
        assert_eq!(level.rect(c), Some(Rect::new(0.0, 32.0, 32.0, 96.0)));

        level.despawn(a);
        assert_eq!(
            level.validate(),
            Err(Error::UnpairedTunnel {
                tunnel_id: "yellow".to_string(),
                count: 1
            })
        );
    }

    #[test]
    fn render_extrapolates_by_last_dt() {
        let mut level = level();
        level.gravity = Gravity(Vec2::zero());
        let mover = level.spawn_kinematic(Rect::new(0.0, 0.0, 32.0, 32.0), Vec2::new(120.0, 0.0));
        level.tick_physics(DT);
        assert!((level.rect(mover).unwrap().left - 1.0).abs() < 1e-9);

        level.draw(0.5);
        let item = level
            .draw_list()
            .iter()
            .find(|i| i.key == mover)
            .unwrap();
        assert!((item.rect.left - 1.5).abs() < 1e-9);
    }

    #[test]
    fn clear_removes_everything() {
        let mut level = level();
        let player = level.spawn_player((2, 4));
        level.input().press(player, Intent::Left);
        run(&mut level, 1);
        level.clear();
        assert!(level.bodies.is_empty());
        assert_eq!(level.player(), None);
        assert!(level.input().take().is_empty());
        assert!(level.draw_list().is_empty());
    }
}
