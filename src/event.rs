//! Things that happened during a tick that the outside world may want to react to,
//! e.g. by playing a sound or switching levels.

use crate::{math::Vec2, physics::BodyKey};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    Jump {
        body: BodyKey,
    },
    /// A body in the air slammed downwards.
    Slam {
        body: BodyKey,
    },
    Teleport {
        body: BodyKey,
        from: BodyKey,
        to: BodyKey,
    },
    PickedUp {
        carrier: BodyKey,
        held: BodyKey,
    },
    /// A held body got too far from its carrier and was dropped.
    Released {
        carrier: BodyKey,
        held: BodyKey,
    },
    Thrown {
        carrier: BodyKey,
        held: BodyKey,
        impulse: Vec2,
    },
    ButtonPressed {
        trigger: BodyKey,
    },
    ButtonReleased {
        trigger: BodyKey,
    },
    MechanismTriggered {
        mechanism: BodyKey,
        by: BodyKey,
    },
    MechanismUntriggered {
        mechanism: BodyKey,
        by: BodyKey,
    },
    /// A mechanism's moving part started moving. Useful for starting a looping sound.
    MechanismStarted {
        mechanism: BodyKey,
    },
    MechanismStopped {
        mechanism: BodyKey,
    },
    /// Something reached the exit of the level.
    LevelFinished {
        trigger: BodyKey,
    },
}

/// Something that gathers events as they happen.
///
/// Pushing an event never fails and never affects the simulation.
pub trait EventSink {
    fn push(&mut self, evt: Event);
}

impl EventSink for Vec<Event> {
    #[inline]
    fn push(&mut self, evt: Event) {
        Vec::push(self, evt);
    }
}

/// Discards every event.
impl EventSink for () {
    #[inline]
    fn push(&mut self, _: Event) {}
}

/// A queue of events waiting to be handled.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: Vec<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Take every queued event out, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.events.drain(..)
    }
}

impl EventSink for EventQueue {
    #[inline]
    fn push(&mut self, evt: Event) {
        self.events.push(evt);
    }
}
