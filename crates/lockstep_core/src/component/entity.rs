// =============================================================================
// ENTITY - table rows with generational ids
// =============================================================================
//! Entities and the fixed-capacity entity table.
//!
//! An [`EntityId`] packs a table index and a generation counter into a
//! single `u64`. The generation is bumped every time a slot is recycled,
//! so a stale id held across a despawn can never silently address the
//! new occupant.

use std::any::TypeId;

use lockstep_shared::Transform;

use super::pool::ComponentHandle;

/// Number of low bits used for the table index.
const INDEX_BITS: u32 = 32;
const INDEX_MASK: u64 = (1 << INDEX_BITS) - 1;

/// Opaque handle to an entity slot.
///
/// Valid until the entity is destroyed and its slot recycled. Lookups with
/// a stale id return `None` rather than aliasing the slot's next occupant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Sentinel id that never names a live entity.
    pub const NULL: EntityId = EntityId(u64::MAX);

    #[inline]
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        EntityId((u64::from(generation) << INDEX_BITS) | u64::from(index))
    }

    /// Table index of this id.
    #[inline]
    #[must_use]
    pub fn index(self) -> u32 {
        (self.0 & INDEX_MASK) as u32
    }

    /// Recycle generation of this id.
    #[inline]
    #[must_use]
    pub fn generation(self) -> u32 {
        (self.0 >> INDEX_BITS) as u32
    }

    /// `true` for the [`EntityId::NULL`] sentinel.
    #[inline]
    #[must_use]
    pub fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

/// Record of one component attached to an entity.
#[derive(Clone, Copy, Debug)]
pub struct ComponentRef {
    /// Pool the component lives in, keyed by component type.
    pub type_id: TypeId,
    /// Slot within that pool.
    pub handle: ComponentHandle,
}

/// A simulation entity: a transform, an enabled flag and a list of
/// attached components.
///
/// Entities carry no behaviour of their own. Everything that updates
/// lives in components; the entity is the shared spatial anchor they
/// read and write during the simulation phases.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    /// World-space pose. Simulation-owned; render code must never read
    /// this directly, only the render copies committed at Synchronise.
    pub transform: Transform,
    /// Disabled entities keep their components but skip phase updates.
    pub enabled: bool,
    alive: bool,
    name: String,
    components: Vec<ComponentRef>,
}

impl Entity {
    fn empty(index: u32) -> Self {
        Entity {
            id: EntityId::new(index, 0),
            transform: Transform::IDENTITY,
            enabled: false,
            alive: false,
            name: String::new(),
            components: Vec::new(),
        }
    }

    /// The id of this entity's slot.
    #[inline]
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// `true` from spawn until release is requested.
    ///
    /// A released entity stays addressable (components still reference
    /// it) until teardown runs at the next Synchronise, but reports
    /// `false` here for the whole grace period.
    #[inline]
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Debug/search name. Empty by default; never required to be unique.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the debug/search name.
    pub fn set_name(&mut self, name: &str) {
        self.name.clear();
        self.name.push_str(name);
    }

    /// Components currently attached, in attach order.
    #[inline]
    #[must_use]
    pub fn components(&self) -> &[ComponentRef] {
        &self.components
    }

    pub(crate) fn attach(&mut self, cref: ComponentRef) {
        self.components.push(cref);
    }

    pub(crate) fn detach(&mut self, handle: ComponentHandle) -> Option<ComponentRef> {
        let pos = self.components.iter().position(|c| c.handle == handle)?;
        Some(self.components.remove(pos))
    }

    pub(crate) fn mark_dead(&mut self) {
        self.alive = false;
    }
}

/// Fixed-capacity entity table.
///
/// All slots are allocated at construction. Spawning pops a free index,
/// recycling pushes it back; capacity exhaustion panics.
#[derive(Debug)]
pub struct EntityArena {
    slots: Box<[Entity]>,
    free: Vec<u32>,
    alive: usize,
}

impl EntityArena {
    /// Allocates `capacity` slots, all initially free.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "entity capacity must be non-zero");
        assert!(capacity <= INDEX_MASK as usize, "entity capacity too large");
        let slots: Box<[Entity]> = (0..capacity as u32).map(Entity::empty).collect();
        // Reverse so the first spawn takes slot 0.
        let free: Vec<u32> = (0..capacity as u32).rev().collect();
        EntityArena { slots, free, alive: 0 }
    }

    /// Total slot count.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Entities currently alive (released-but-not-torn-down excluded).
    #[inline]
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.alive
    }

    /// Claims a free slot and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if every slot is in use. Size the table for the worst case.
    pub fn spawn(&mut self) -> EntityId {
        let Some(index) = self.free.pop() else {
            panic!("entity table exhausted ({} slots)", self.slots.len());
        };
        let slot = &mut self.slots[index as usize];
        debug_assert!(!slot.alive);
        debug_assert!(slot.components.is_empty());
        slot.alive = true;
        slot.enabled = true;
        slot.transform = Transform::IDENTITY;
        slot.name.clear();
        self.alive += 1;
        slot.id
    }

    /// Returns the free list to its reusable state for `id`'s slot.
    ///
    /// Callers must have detached every component first.
    pub(crate) fn recycle(&mut self, id: EntityId) {
        let slot = &mut self.slots[id.index() as usize];
        debug_assert_eq!(slot.id, id, "recycle of stale entity id");
        debug_assert!(slot.components.is_empty(), "recycle with components attached");
        slot.name.clear();
        slot.enabled = false;
        let next_gen = id.generation().wrapping_add(1);
        slot.id = EntityId::new(id.index(), next_gen);
        self.free.push(id.index());
    }

    pub(crate) fn mark_dead(&mut self, id: EntityId) {
        let slot = &mut self.slots[id.index() as usize];
        debug_assert_eq!(slot.id, id);
        slot.mark_dead();
        self.alive -= 1;
    }

    pub(crate) fn pop_component(&mut self, id: EntityId) -> Option<ComponentRef> {
        self.slots[id.index() as usize].components.pop()
    }

    /// Borrows the entity for `id`, if the id is still current.
    ///
    /// Succeeds for released entities until their teardown completes; the
    /// grace period keeps component hooks working during the final frame.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        if id.is_null() {
            return None;
        }
        let slot = self.slots.get(id.index() as usize)?;
        (slot.id == id).then_some(slot)
    }

    /// Mutable variant of [`EntityArena::get`].
    #[inline]
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        if id.is_null() {
            return None;
        }
        let slot = self.slots.get_mut(id.index() as usize)?;
        (slot.id == id).then_some(slot)
    }

    /// Iterates every slot, live or not.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_pack_and_unpack() {
        let id = EntityId::new(7, 3);
        assert_eq!(id.index(), 7);
        assert_eq!(id.generation(), 3);
        assert!(!id.is_null());
        assert!(EntityId::NULL.is_null());
    }

    #[test]
    fn spawn_takes_lowest_slot_first() {
        let mut arena = EntityArena::new(4);
        let a = arena.spawn();
        let b = arena.spawn();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(arena.alive_count(), 2);
    }

    #[test]
    fn stale_id_misses_after_recycle() {
        let mut arena = EntityArena::new(2);
        let a = arena.spawn();
        arena.mark_dead(a);
        arena.recycle(a);
        assert!(arena.get(a).is_none());

        let a2 = arena.spawn();
        assert_eq!(a2.index(), a.index());
        assert_ne!(a2.generation(), a.generation());
        assert!(arena.get(a2).is_some());
    }

    #[test]
    #[should_panic(expected = "entity table exhausted")]
    fn spawn_past_capacity_panics() {
        let mut arena = EntityArena::new(1);
        let _ = arena.spawn();
        let _ = arena.spawn();
    }
}
