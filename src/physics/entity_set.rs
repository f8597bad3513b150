use super::{Body, BodyKind, Kind, PortalState};
use crate::error::{Error, Result};

use itertools::Itertools;
use std::collections::HashMap;
use thunderdome as td;

/// Key type to look up a body stored in a level.
///
/// Every reference from one body to another (carrying, portal links, trigger links)
/// is one of these, so a removed body can never be reached through a stale reference;
/// lookups with its key just return `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyKey(pub(crate) td::Index);

impl BodyKey {
    /// Get the underlying [`thunderdome::Index`][thunderdome::Index] of this key.
    /// Useful for creating your own mappings from bodies to other things
    /// such as sprites.
    #[inline]
    pub fn index(&self) -> td::Index {
        self.0
    }
}

/// Storage for all bodies in a level, partitioned into groups by role.
///
/// Groups are kept in insertion order, which is also the order
/// the simulation visits them in.
#[derive(Default)]
pub struct EntitySet {
    bodies: td::Arena<Body>,
    statics: Vec<BodyKey>,
    dynamics: Vec<BodyKey>,
    triggers: Vec<BodyKey>,
    kinematics: Vec<BodyKey>,
    portals: Vec<BodyKey>,
    activated: Vec<BodyKey>,
    carryables: Vec<BodyKey>,
    tunnels: HashMap<String, Vec<BodyKey>>,
}

impl EntitySet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Access a [`Body`][super::Body], if it still exists.
    #[inline]
    pub fn get(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key.0)
    }

    /// Mutably access a [`Body`][super::Body], if it still exists.
    #[inline]
    pub fn get_mut(&mut self, key: BodyKey) -> Option<&mut Body> {
        self.bodies.get_mut(key.0)
    }

    /// Mutably access two different bodies at once.
    ///
    /// Panics if the keys are the same.
    #[inline]
    pub fn get2_mut(&mut self, a: BodyKey, b: BodyKey) -> (Option<&mut Body>, Option<&mut Body>) {
        assert_ne!(a, b, "Tried to borrow the same body twice");
        self.bodies.get2_mut(a.0, b.0)
    }

    #[inline]
    pub fn contains(&self, key: BodyKey) -> bool {
        self.bodies.contains(key.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Iterate over every body in the set, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyKey, &Body)> {
        self.bodies.iter().map(|(idx, body)| (BodyKey(idx), body))
    }

    /// Like [`get`][Self::get], but an error instead of `None`
    /// for a missing body or a body of the wrong kind.
    pub fn get_kind(&self, key: BodyKey, expected: Kind) -> Result<&Body> {
        let body = self.get(key).ok_or(Error::MissingBody(key))?;
        if body.kind() != expected {
            return Err(Error::WrongKind {
                key,
                expected,
                found: body.kind(),
            });
        }
        Ok(body)
    }

    /// Insert a body, sorting it into the groups matching its kind.
    pub fn insert(&mut self, body: Body) -> BodyKey {
        let kind = body.kind();
        let throwable = body.actor().map(|a| a.throwable).unwrap_or(false);
        let tunnel_id = body.portal().map(|p| p.tunnel_id.clone());

        let key = BodyKey(self.bodies.insert(body));
        self.group_mut(kind).push(key);
        if throwable {
            self.carryables.push(key);
        }
        if let Some(tunnel_id) = tunnel_id {
            self.tunnels.entry(tunnel_id).or_default().push(key);
        }
        key
    }

    /// Remove a body, returning it if it still existed.
    ///
    /// Everything referring to the removed body lets go of it:
    /// carry links are severed on the other end,
    /// bodies engaged with a removed portal are set back to [`PortalState::Out`],
    /// and triggers drop it from their targets.
    pub fn remove(&mut self, key: BodyKey) -> Option<Body> {
        let body = self.bodies.remove(key.0)?;
        let kind = body.kind();
        self.group_mut(kind).retain(|k| *k != key);
        self.carryables.retain(|k| *k != key);

        match &body.kind {
            BodyKind::Dynamic(actor) => {
                if let Some(other) = actor.carried.and_then(|k| self.get_mut(k)) {
                    if let Some(other_actor) = other.actor_mut() {
                        other_actor.carrier = None;
                    }
                }
                if let Some(other) = actor.carrier.and_then(|k| self.get_mut(k)) {
                    if let Some(other_actor) = other.actor_mut() {
                        other_actor.carried = None;
                    }
                }
            }
            BodyKind::Portal(portal) => {
                if let Some(tunnel) = self.tunnels.get_mut(&portal.tunnel_id) {
                    tunnel.retain(|k| *k != key);
                    if tunnel.is_empty() {
                        self.tunnels.remove(&portal.tunnel_id);
                    }
                }
                for dyn_key in &self.dynamics {
                    if let Some(actor) = self.bodies.get_mut(dyn_key.0).and_then(Body::actor_mut) {
                        if actor.portal.link().map_or(false, |l| l.involves(key)) {
                            log::debug!("Portal {key:?} removed while {dyn_key:?} was in it");
                            actor.portal = PortalState::Out;
                        }
                    }
                }
            }
            BodyKind::Activated(_) => {
                for trig_key in &self.triggers {
                    if let Some(BodyKind::Trigger(trigger)) =
                        self.bodies.get_mut(trig_key.0).map(|b| &mut b.kind)
                    {
                        trigger.targets.retain(|k| *k != key);
                    }
                }
            }
            _ => {}
        }

        Some(body)
    }

    /// Remove every body.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.statics.clear();
        self.dynamics.clear();
        self.triggers.clear();
        self.kinematics.clear();
        self.portals.clear();
        self.activated.clear();
        self.carryables.clear();
        self.tunnels.clear();
    }

    fn group_mut(&mut self, kind: Kind) -> &mut Vec<BodyKey> {
        match kind {
            Kind::Static => &mut self.statics,
            Kind::Dynamic => &mut self.dynamics,
            Kind::Trigger => &mut self.triggers,
            Kind::Kinematic => &mut self.kinematics,
            Kind::Portal => &mut self.portals,
            Kind::Activated => &mut self.activated,
        }
    }

    /// All bodies of the given kind, in insertion order.
    #[inline]
    pub fn bodies_of_kind(&self, kind: Kind) -> &[BodyKey] {
        match kind {
            Kind::Static => &self.statics,
            Kind::Dynamic => &self.dynamics,
            Kind::Trigger => &self.triggers,
            Kind::Kinematic => &self.kinematics,
            Kind::Portal => &self.portals,
            Kind::Activated => &self.activated,
        }
    }

    /// Everything dynamic bodies collide with: statics and mechanisms.
    pub fn colliders(&self) -> impl Iterator<Item = BodyKey> + '_ {
        self.statics.iter().chain(&self.activated).copied()
    }

    /// Dynamic bodies that can be picked up.
    #[inline]
    pub fn carryables(&self) -> &[BodyKey] {
        &self.carryables
    }

    /// Portals sharing the given tunnel id.
    #[inline]
    pub fn bodies_in_tunnel(&self, tunnel_id: &str) -> &[BodyKey] {
        self.tunnels.get(tunnel_id).map_or(&[], |t| t.as_slice())
    }

    /// Iterate over all tunnels and the portals in them.
    pub fn tunnels(&self) -> impl Iterator<Item = (&str, &[BodyKey])> {
        self.tunnels.iter().map(|(id, t)| (id.as_str(), t.as_slice()))
    }

    /// The other portal in the same tunnel as the given one.
    ///
    /// `None` if the key isn't a portal or the tunnel doesn't have exactly two portals.
    pub fn twin_of(&self, portal: BodyKey) -> Option<BodyKey> {
        let tunnel_id = &self.get(portal)?.portal()?.tunnel_id;
        match self.bodies_in_tunnel(tunnel_id) {
            [a, b] if *a == portal => Some(*b),
            [a, b] if *b == portal => Some(*a),
            _ => None,
        }
    }

    /// Make a trigger notify a mechanism when it's pressed or released.
    pub fn link(&mut self, trigger: BodyKey, target: BodyKey) -> Result<()> {
        self.get_kind(target, Kind::Activated)?;
        self.get_kind(trigger, Kind::Trigger)?;
        if let Some(BodyKind::Trigger(trig)) = self.get_mut(trigger).map(|b| &mut b.kind) {
            if !trig.targets.contains(&target) {
                trig.targets.push(target);
            }
        }
        Ok(())
    }

    /// Check that every tunnel has exactly two portals.
    ///
    /// Tunnels are checked in order of their ids, so the same level always
    /// reports the same error.
    pub fn validate(&self) -> Result<()> {
        for (tunnel_id, portals) in self.tunnels().sorted_by_key(|(id, _)| *id) {
            if portals.len() != 2 {
                return Err(Error::UnpairedTunnel {
                    tunnel_id: tunnel_id.to_string(),
                    count: portals.len(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        math::{Axis, Direction, Rect},
        physics::{carry, BodyParams, Portal, PortalLink, ThrowableMaterial, Trigger},
    };

    fn block() -> Rect {
        Rect::new(0.0, 0.0, 32.0, 32.0)
    }

    #[test]
    fn groups_follow_kinds() {
        let mut set = EntitySet::new();
        let wall = set.insert(Body::new_static(block()));
        let player = set.insert(Body::new_dynamic(block(), BodyParams::player()));
        let crate_ = set.insert(Body::new_throwable(block(), ThrowableMaterial::Wood));
        let door = set.insert(Body::new_door(block(), Axis::Vertical, false));

        assert_eq!(set.bodies_of_kind(Kind::Static), &[wall]);
        assert_eq!(set.bodies_of_kind(Kind::Dynamic), &[player, crate_]);
        assert_eq!(set.carryables(), &[crate_]);
        itertools::assert_equal(set.colliders(), [wall, door]);

        set.remove(crate_);
        assert!(set.carryables().is_empty());
        assert_eq!(set.bodies_of_kind(Kind::Dynamic), &[player]);
        assert!(set.get(crate_).is_none());
    }

    #[test]
    fn tunnels_and_twins() {
        let mut set = EntitySet::new();
        let a = set.insert(Body::new_portal(block(), Portal::new(Direction::North, "t")));
        assert_eq!(set.twin_of(a), None);
        assert_eq!(
            set.validate(),
            Err(Error::UnpairedTunnel {
                tunnel_id: "t".into(),
                count: 1
            })
        );
        let b = set.insert(Body::new_portal(block(), Portal::new(Direction::South, "t")));
        assert_eq!(set.twin_of(a), Some(b));
        assert_eq!(set.twin_of(b), Some(a));
        assert!(set.validate().is_ok());
    }

    #[test]
    fn removal_severs_references() {
        let mut set = EntitySet::new();
        let carrier = set.insert(Body::new_dynamic(block(), BodyParams::player()));
        let held = set.insert(Body::new_throwable(block(), ThrowableMaterial::Iron));
        carry::link(&mut set, carrier, held);

        let a = set.insert(Body::new_portal(block(), Portal::new(Direction::North, "t")));
        let b = set.insert(Body::new_portal(block(), Portal::new(Direction::East, "t")));
        set.get_mut(carrier).unwrap().actor_mut().unwrap().portal =
            PortalState::Entering(PortalLink {
                in_portal: a,
                out_portal: b,
            });

        let door = set.insert(Body::new_door(block(), Axis::Vertical, false));
        let button = set.insert(Body::new_trigger(block(), Trigger::button()));
        set.link(button, door).unwrap();

        set.remove(held);
        assert_eq!(set.get(carrier).unwrap().actor().unwrap().carried(), None);

        set.remove(b);
        assert_eq!(
            set.get(carrier).unwrap().actor().unwrap().portal,
            PortalState::Out
        );
        assert_eq!(set.bodies_in_tunnel("t"), &[a]);

        set.remove(door);
        assert!(set.get(button).unwrap().trigger().unwrap().targets.is_empty());
    }

    #[test]
    fn link_checks_kinds() {
        let mut set = EntitySet::new();
        let wall = set.insert(Body::new_static(block()));
        let button = set.insert(Body::new_trigger(block(), Trigger::button()));
        assert_eq!(
            set.link(button, wall),
            Err(Error::WrongKind {
                key: wall,
                expected: Kind::Activated,
                found: Kind::Static
            })
        );
        set.remove(wall);
        assert_eq!(set.link(button, wall), Err(Error::MissingBody(wall)));
    }
}
