// =============================================================================
// EVENT HUB - frame-synchronous game and contact dispatch
// =============================================================================
//! Synchronous event dispatch for simulation code.
//!
//! Events are delivered immediately on the publishing call stack, during
//! the simulation phases of the frame. Nothing is queued and nothing
//! crosses threads: the hub is deliberately `!Sync`, and handlers receive
//! the application context rather than the hub itself, so a handler can
//! never re-enter dispatch or edit subscriber lists mid-iteration.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::trace;

use crate::component::EntityId;

/// Marker for an application's game event enum.
///
/// The kernel publishes exactly one event itself: `ENTITY_DESTROYED`,
/// raised synchronously when an entity is released, before its components
/// are torn down.
pub trait EventTag: Copy + Eq + Hash + std::fmt::Debug + Send + 'static {
    /// The tag the registry publishes on entity release.
    const ENTITY_DESTROYED: Self;
}

/// Token returned by every subscription, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Whether a contact pair just started or just stopped touching.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactKind {
    /// The pair began overlapping this physics step.
    Begin,
    /// The pair stopped overlapping this physics step.
    End,
}

/// One side's view of a physics contact.
///
/// Contacts are dispatched twice, once oriented for each participant:
/// `entity` is always the subscriber's side.
#[derive(Clone, Copy, Debug)]
pub struct ContactEvent {
    /// Begin or end of overlap.
    pub kind: ContactKind,
    /// The subscriber's entity.
    pub entity: EntityId,
    /// The entity it touched.
    pub other: EntityId,
    /// Collision category of `entity`.
    pub category: u16,
    /// Collision category of `other`.
    pub other_category: u16,
}

impl ContactEvent {
    /// The same contact seen from the other participant.
    #[must_use]
    pub fn swapped(&self) -> ContactEvent {
        ContactEvent {
            kind: self.kind,
            entity: self.other,
            other: self.entity,
            category: self.other_category,
            other_category: self.category,
        }
    }
}

type GameHandler<E, C> = Box<dyn FnMut(E, EntityId, &mut C) + Send>;
type ContactHandler<C> = Box<dyn FnMut(&ContactEvent, &mut C) + Send>;

/// Subscription routing for game events and physics contacts.
///
/// Game events route by tag and by target entity; contacts route by
/// collision category and by participating entity. All four tables are
/// independent: a single publish walks the relevant two in that order.
pub struct EventHub<E: EventTag, C> {
    next_token: u64,
    tag_subs: HashMap<E, Vec<(SubscriptionId, GameHandler<E, C>)>>,
    entity_subs: HashMap<EntityId, Vec<(SubscriptionId, GameHandler<E, C>)>>,
    contact_layer_subs: HashMap<u16, Vec<(SubscriptionId, ContactHandler<C>)>>,
    contact_entity_subs: HashMap<EntityId, Vec<(SubscriptionId, ContactHandler<C>)>>,
}

impl<E: EventTag, C> Default for EventHub<E, C> {
    fn default() -> Self {
        EventHub::new()
    }
}

impl<E: EventTag, C> EventHub<E, C> {
    /// Creates an empty hub.
    #[must_use]
    pub fn new() -> Self {
        EventHub {
            next_token: 0,
            tag_subs: HashMap::new(),
            entity_subs: HashMap::new(),
            contact_layer_subs: HashMap::new(),
            contact_entity_subs: HashMap::new(),
        }
    }

    fn next_token(&mut self) -> SubscriptionId {
        let token = SubscriptionId(self.next_token);
        self.next_token += 1;
        token
    }

    /// Calls `handler` for every publish of `tag`, whatever entity it
    /// targets.
    pub fn subscribe<F>(&mut self, tag: E, handler: F) -> SubscriptionId
    where
        F: FnMut(E, EntityId, &mut C) + Send + 'static,
    {
        let token = self.next_token();
        self.tag_subs.entry(tag).or_default().push((token, Box::new(handler)));
        token
    }

    /// Calls `handler` for every event published at `entity`, whatever
    /// its tag. Subscribers watching an entity should drop their
    /// subscription when `ENTITY_DESTROYED` arrives for it.
    pub fn subscribe_entity<F>(&mut self, entity: EntityId, handler: F) -> SubscriptionId
    where
        F: FnMut(E, EntityId, &mut C) + Send + 'static,
    {
        let token = self.next_token();
        self.entity_subs.entry(entity).or_default().push((token, Box::new(handler)));
        token
    }

    /// Calls `handler` for every contact whose near side carries the
    /// collision category `category`.
    pub fn subscribe_contacts_for_layer<F>(&mut self, category: u16, handler: F) -> SubscriptionId
    where
        F: FnMut(&ContactEvent, &mut C) + Send + 'static,
    {
        let token = self.next_token();
        self.contact_layer_subs.entry(category).or_default().push((token, Box::new(handler)));
        token
    }

    /// Calls `handler` for every contact `entity` takes part in, oriented
    /// with `entity` as the near side.
    pub fn subscribe_contacts_for_entity<F>(&mut self, entity: EntityId, handler: F) -> SubscriptionId
    where
        F: FnMut(&ContactEvent, &mut C) + Send + 'static,
    {
        let token = self.next_token();
        self.contact_entity_subs.entry(entity).or_default().push((token, Box::new(handler)));
        token
    }

    /// Removes one subscription by its token. Returns `true` if it was
    /// still registered.
    pub fn unsubscribe(&mut self, token: SubscriptionId) -> bool {
        let mut removed = false;
        self.tag_subs.values_mut().for_each(|subs| {
            let before = subs.len();
            subs.retain(|(t, _)| *t != token);
            removed |= subs.len() != before;
        });
        self.entity_subs.values_mut().for_each(|subs| {
            let before = subs.len();
            subs.retain(|(t, _)| *t != token);
            removed |= subs.len() != before;
        });
        self.contact_layer_subs.values_mut().for_each(|subs| {
            let before = subs.len();
            subs.retain(|(t, _)| *t != token);
            removed |= subs.len() != before;
        });
        self.contact_entity_subs.values_mut().for_each(|subs| {
            let before = subs.len();
            subs.retain(|(t, _)| *t != token);
            removed |= subs.len() != before;
        });
        removed
    }

    /// Drops every entity-targeted subscription for `entity`, game and
    /// contact alike. Call when tearing down whatever owned them.
    pub fn clear_entity_subscriptions(&mut self, entity: EntityId) {
        self.entity_subs.remove(&entity);
        self.contact_entity_subs.remove(&entity);
    }

    /// Dispatches `tag` at `entity` to tag subscribers, then to
    /// subscribers watching that entity. Handlers run before this
    /// returns.
    pub fn publish(&mut self, tag: E, entity: EntityId, ctx: &mut C) {
        trace!(?tag, ?entity, "publish");
        if let Some(subs) = self.tag_subs.get_mut(&tag) {
            for (_, handler) in subs.iter_mut() {
                handler(tag, entity, ctx);
            }
        }
        if let Some(subs) = self.entity_subs.get_mut(&entity) {
            for (_, handler) in subs.iter_mut() {
                handler(tag, entity, ctx);
            }
        }
    }

    /// Dispatches a physics contact to both participants' subscribers.
    ///
    /// Each side sees the event oriented with itself as the near side;
    /// layer subscribers first, then entity subscribers.
    pub fn publish_contact(&mut self, contact: &ContactEvent, ctx: &mut C) {
        self.publish_contact_side(contact, ctx);
        self.publish_contact_side(&contact.swapped(), ctx);
    }

    fn publish_contact_side(&mut self, contact: &ContactEvent, ctx: &mut C) {
        if let Some(subs) = self.contact_layer_subs.get_mut(&contact.category) {
            for (_, handler) in subs.iter_mut() {
                handler(contact, ctx);
            }
        }
        if let Some(subs) = self.contact_entity_subs.get_mut(&contact.entity) {
            for (_, handler) in subs.iter_mut() {
                handler(contact, ctx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Ev {
        Destroyed,
        Scored,
    }

    impl EventTag for Ev {
        const ENTITY_DESTROYED: Ev = Ev::Destroyed;
    }

    #[derive(Default)]
    struct Ctx {
        hits: Vec<(Ev, EntityId)>,
        contacts: Vec<(EntityId, EntityId, ContactKind)>,
    }

    fn id(index: u32) -> EntityId {
        EntityId::new(index, 0)
    }

    #[test]
    fn tag_then_entity_subscribers_in_order() {
        let mut hub: EventHub<Ev, Ctx> = EventHub::new();
        let mut ctx = Ctx::default();
        let target = id(3);

        hub.subscribe(Ev::Scored, |ev, e, ctx: &mut Ctx| ctx.hits.push((ev, e)));
        hub.subscribe_entity(target, |ev, e, ctx: &mut Ctx| ctx.hits.push((ev, id(e.index() + 100))));

        hub.publish(Ev::Scored, target, &mut ctx);
        assert_eq!(ctx.hits, vec![(Ev::Scored, target), (Ev::Scored, id(103))]);

        // Other entities only reach the tag subscriber.
        ctx.hits.clear();
        hub.publish(Ev::Scored, id(7), &mut ctx);
        assert_eq!(ctx.hits, vec![(Ev::Scored, id(7))]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut hub: EventHub<Ev, Ctx> = EventHub::new();
        let mut ctx = Ctx::default();

        let token = hub.subscribe(Ev::Scored, |ev, e, ctx: &mut Ctx| ctx.hits.push((ev, e)));
        hub.publish(Ev::Scored, id(0), &mut ctx);
        assert_eq!(ctx.hits.len(), 1);

        assert!(hub.unsubscribe(token));
        assert!(!hub.unsubscribe(token));
        hub.publish(Ev::Scored, id(0), &mut ctx);
        assert_eq!(ctx.hits.len(), 1);
    }

    #[test]
    fn contacts_reach_both_sides_oriented() {
        let mut hub: EventHub<Ev, Ctx> = EventHub::new();
        let mut ctx = Ctx::default();
        let (a, b) = (id(1), id(2));

        hub.subscribe_contacts_for_entity(a, |c, ctx: &mut Ctx| {
            ctx.contacts.push((c.entity, c.other, c.kind));
        });
        hub.subscribe_contacts_for_entity(b, |c, ctx: &mut Ctx| {
            ctx.contacts.push((c.entity, c.other, c.kind));
        });

        let ev = ContactEvent {
            kind: ContactKind::Begin,
            entity: a,
            other: b,
            category: 0x0001,
            other_category: 0x0002,
        };
        hub.publish_contact(&ev, &mut ctx);
        assert_eq!(
            ctx.contacts,
            vec![(a, b, ContactKind::Begin), (b, a, ContactKind::Begin)]
        );
    }

    #[test]
    fn layer_subscription_matches_near_side_category() {
        let mut hub: EventHub<Ev, Ctx> = EventHub::new();
        let mut ctx = Ctx::default();

        hub.subscribe_contacts_for_layer(0x0004, |c, ctx: &mut Ctx| {
            ctx.contacts.push((c.entity, c.other, c.kind));
        });

        let ev = ContactEvent {
            kind: ContactKind::End,
            entity: id(5),
            other: id(6),
            category: 0x0001,
            other_category: 0x0004,
        };
        // Only the swapped orientation carries category 0x0004 near-side.
        hub.publish_contact(&ev, &mut ctx);
        assert_eq!(ctx.contacts, vec![(id(6), id(5), ContactKind::End)]);
    }

    #[test]
    fn clearing_an_entity_drops_its_subscriptions() {
        let mut hub: EventHub<Ev, Ctx> = EventHub::new();
        let mut ctx = Ctx::default();
        let target = id(9);

        hub.subscribe_entity(target, |ev, e, ctx: &mut Ctx| ctx.hits.push((ev, e)));
        hub.clear_entity_subscriptions(target);
        hub.publish(Ev::Destroyed, target, &mut ctx);
        assert!(ctx.hits.is_empty());
    }
}
