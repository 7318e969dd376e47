// =============================================================================
// TYPED POOL - fixed-capacity slab with deferred membership moves
// =============================================================================
//! One fixed-capacity pool per component type.
//!
//! Every slot is always in exactly one of four membership sets: free,
//! used, acquire-pending or release-pending. Acquire and release requests
//! only move slots into the pending sets; the actual initialise/cleanup
//! work and the moves into free/used happen inside [`TypedPool::synchronise`],
//! so the used set is stable for the whole of Core and Render.

use std::any::{type_name, Any, TypeId};
use std::marker::PhantomData;

use crate::time::GameTime;

use super::entity::{EntityArena, EntityId};
use super::lifecycle::{Component, ComponentState};

/// Opaque handle to a pool slot: index plus recycle generation.
///
/// A handle goes stale when its slot is released and recycled; stale
/// handles miss on lookup instead of aliasing the next occupant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ComponentHandle {
    index: u32,
    generation: u32,
}

impl ComponentHandle {
    /// Slot index within the pool.
    #[inline]
    #[must_use]
    pub fn index(self) -> u32 {
        self.index
    }
}

/// Which membership set a slot currently belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Membership {
    Free,
    Used,
    AcquirePending,
    ReleasePending,
}

/// Membership set sizes, for diagnostics and capacity audits.
///
/// The four set sizes always sum to `capacity`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolCounts {
    /// Total slots in the pool.
    pub capacity: usize,
    /// Slots on the free list.
    pub free: usize,
    /// Live slots traversed by phase updates.
    pub used: usize,
    /// Acquired this frame, awaiting initialise.
    pub acquire_pending: usize,
    /// Released this frame, awaiting cleanup.
    pub release_pending: usize,
}

struct Slot<T> {
    data: T,
    state: ComponentState,
    membership: Membership,
    /// Simulation-side participation flag, flipped freely during Core.
    enabled: bool,
    /// Render-side copy of `enabled`, refreshed only at Synchronise.
    render_enabled: bool,
    generation: u32,
    entity: EntityId,
}

/// Fixed-capacity pool of `T` components.
///
/// Constructed once per registered type by the [`super::Registry`]; all
/// storage is claimed up front and never grows.
pub struct TypedPool<T, C> {
    slots: Box<[Slot<T>]>,
    free: Vec<u32>,
    used: Vec<u32>,
    acquire_pending: Vec<u32>,
    release_pending: Vec<u32>,
    priority: i32,
    _ctx: PhantomData<fn(&mut C)>,
}

impl<T: Component<C> + Default, C: 'static> TypedPool<T, C> {
    /// Allocates a pool of `capacity` default-constructed slots.
    ///
    /// Lower `priority` pools are traversed first in every phase.
    #[must_use]
    pub fn new(capacity: usize, priority: i32) -> Self {
        assert!(capacity > 0, "component pool capacity must be non-zero");
        let slots: Box<[Slot<T>]> = (0..capacity)
            .map(|_| Slot {
                data: T::default(),
                state: ComponentState::Inactive,
                membership: Membership::Free,
                enabled: false,
                render_enabled: false,
                generation: 0,
                entity: EntityId::NULL,
            })
            .collect();
        // Reverse so the first acquire takes slot 0.
        let free: Vec<u32> = (0..capacity as u32).rev().collect();
        TypedPool {
            slots,
            free,
            used: Vec::with_capacity(capacity),
            acquire_pending: Vec::with_capacity(capacity),
            release_pending: Vec::with_capacity(capacity),
            priority,
            _ctx: PhantomData,
        }
    }

    /// Claims a free slot for `entity` and runs [`Component::reset`] on it.
    ///
    /// The slot joins the acquire-pending set; `initialise` runs at the
    /// next Synchronise. Until then the caller may configure the
    /// component's data through [`TypedPool::get_mut`].
    ///
    /// # Panics
    ///
    /// Panics if the free list is empty. Pool sizes are a startup
    /// decision; running dry is a bug, not a runtime condition.
    pub fn acquire(&mut self, entity: EntityId) -> ComponentHandle {
        let Some(index) = self.free.pop() else {
            panic!(
                "component pool exhausted: {} ({} slots)",
                type_name::<T>(),
                self.slots.len()
            );
        };
        let slot = &mut self.slots[index as usize];
        debug_assert_eq!(slot.membership, Membership::Free);
        debug_assert_eq!(slot.state, ComponentState::Inactive);
        slot.membership = Membership::AcquirePending;
        slot.enabled = true;
        slot.render_enabled = false;
        slot.entity = entity;
        slot.data.reset();
        self.acquire_pending.push(index);
        ComponentHandle { index, generation: slot.generation }
    }

    /// Queues a slot for release at the next Synchronise.
    ///
    /// The slot stays visible to in-flight phase traversals for the rest
    /// of the frame. Releasing a slot that was acquired this same frame
    /// cancels the acquisition: `initialise` and `cleanup` both stay
    /// unrun for it.
    ///
    /// # Panics
    ///
    /// Panics on a stale handle or a double release.
    pub fn release_deferred(&mut self, handle: ComponentHandle) {
        let slot = &mut self.slots[handle.index as usize];
        assert_eq!(
            slot.generation,
            handle.generation,
            "release of stale {} handle",
            type_name::<T>()
        );
        match slot.membership {
            Membership::Used => {}
            Membership::AcquirePending => {
                let pos = self
                    .acquire_pending
                    .iter()
                    .position(|&i| i == handle.index)
                    .unwrap_or_else(|| unreachable!("acquire-pending slot missing from list"));
                self.acquire_pending.swap_remove(pos);
            }
            Membership::Free | Membership::ReleasePending => {
                panic!("double release of {} slot {}", type_name::<T>(), handle.index);
            }
        }
        slot.membership = Membership::ReleasePending;
        self.release_pending.push(handle.index);
    }

    /// Borrows the component behind `handle`, if the handle is current.
    /// Pending slots are reachable; free ones are not.
    #[must_use]
    pub fn get(&self, handle: ComponentHandle) -> Option<&T> {
        let slot = self.slots.get(handle.index as usize)?;
        (slot.generation == handle.generation && slot.membership != Membership::Free)
            .then_some(&slot.data)
    }

    /// Mutable variant of [`TypedPool::get`].
    #[must_use]
    pub fn get_mut(&mut self, handle: ComponentHandle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        (slot.generation == handle.generation && slot.membership != Membership::Free)
            .then_some(&mut slot.data)
    }

    /// Lifecycle state of the slot behind `handle`.
    #[must_use]
    pub fn state(&self, handle: ComponentHandle) -> Option<ComponentState> {
        let slot = self.slots.get(handle.index as usize)?;
        (slot.generation == handle.generation).then_some(slot.state)
    }

    /// Sets the simulation-side enabled flag. Takes effect for phase
    /// updates immediately; the render side follows at the next
    /// Synchronise.
    pub fn set_enabled(&mut self, handle: ComponentHandle, enabled: bool) {
        if let Some(slot) = self.slots.get_mut(handle.index as usize) {
            if slot.generation == handle.generation {
                slot.enabled = enabled;
            }
        }
    }

    /// Resolves all pending membership moves and commits render data.
    ///
    /// Order matters and is fixed:
    ///
    /// 1. release-pending slots are cleaned up and returned to free
    /// 2. the render-enabled flag is refreshed from the simulation flag
    /// 3. render data is committed for eligible used slots
    /// 4. acquire-pending slots are initialised and join used
    ///
    /// Cleanup before initialise means a slot released and re-acquired
    /// across the same Synchronise observes a full cleanup/initialise
    /// pair, never a half-open one.
    pub fn synchronise(&mut self, entities: &mut EntityArena, ctx: &mut C) {
        // 1. Cleanup. Slots that never reached Initialised skip the hook.
        let any_released = !self.release_pending.is_empty();
        for i in 0..self.release_pending.len() {
            let index = self.release_pending[i];
            let slot = &mut self.slots[index as usize];
            debug_assert_eq!(slot.membership, Membership::ReleasePending);
            if slot.state >= ComponentState::Initialised {
                slot.data.cleanup(ctx);
            }
            slot.state = ComponentState::Inactive;
            slot.membership = Membership::Free;
            slot.generation = slot.generation.wrapping_add(1);
            slot.entity = EntityId::NULL;
            slot.enabled = false;
            slot.render_enabled = false;
            self.free.push(index);
        }
        self.release_pending.clear();
        if any_released {
            let slots = &self.slots;
            self.used.retain(|&i| slots[i as usize].membership == Membership::Used);
        }

        // 2 + 3. Refresh render flags and commit render data. Slots with a
        // simulation capability wait for their first update before the
        // first commit; pure-render slots commit as soon as they are used.
        let sim_gated = T::HAS_CORE_UPDATE || T::HAS_PHYSICS_UPDATE;
        for i in 0..self.used.len() {
            let index = self.used[i];
            let slot = &mut self.slots[index as usize];
            slot.render_enabled = slot.enabled;
            if T::HAS_SYNCHRONISE_RENDER_DATA
                && (!sim_gated || slot.state >= ComponentState::FirstUpdated)
            {
                if let Some(entity) = entities.get(slot.entity) {
                    slot.data.synchronise_render_data(entity, ctx);
                    slot.state = ComponentState::Synchronised;
                }
            }
        }

        // 4. Initialise this frame's acquisitions.
        for i in 0..self.acquire_pending.len() {
            let index = self.acquire_pending[i];
            let slot = &mut self.slots[index as usize];
            debug_assert_eq!(slot.membership, Membership::AcquirePending);
            if let Some(entity) = entities.get_mut(slot.entity) {
                slot.data.initialise(entity, ctx);
            }
            slot.state = ComponentState::Initialised;
            slot.membership = Membership::Used;
            self.used.push(index);
        }
        self.acquire_pending.clear();
    }

    /// Core traversal over the used set, skipping disabled slots.
    pub fn core_update(&mut self, entities: &mut EntityArena, time: &GameTime, ctx: &mut C) {
        for i in 0..self.used.len() {
            let index = self.used[i];
            let slot = &mut self.slots[index as usize];
            if !slot.enabled {
                continue;
            }
            let Some(entity) = entities.get_mut(slot.entity) else {
                continue;
            };
            if slot.state == ComponentState::Initialised {
                slot.data.first_core_update(entity, time, ctx);
                slot.state = ComponentState::FirstUpdated;
            }
            slot.data.core_update(entity, time, ctx);
        }
    }

    /// Physics sub-step traversal over the used set.
    pub fn physics_update(&mut self, entities: &mut EntityArena, time: &GameTime, ctx: &mut C) {
        for i in 0..self.used.len() {
            let index = self.used[i];
            let slot = &mut self.slots[index as usize];
            if !slot.enabled {
                continue;
            }
            let Some(entity) = entities.get_mut(slot.entity) else {
                continue;
            };
            // Types with a Core capability promote there instead, so the
            // first-update hook is not skipped over.
            if slot.state == ComponentState::Initialised && !T::HAS_CORE_UPDATE {
                slot.state = ComponentState::FirstUpdated;
            }
            slot.data.physics_update(entity, time, ctx);
        }
    }

    /// Render traversal. Slots that commit render data are held back
    /// until their first commit has happened.
    pub fn render_update(&mut self, time: &GameTime, ctx: &mut C) {
        for i in 0..self.used.len() {
            let index = self.used[i];
            let slot = &mut self.slots[index as usize];
            if !slot.render_enabled {
                continue;
            }
            if T::HAS_SYNCHRONISE_RENDER_DATA && slot.state != ComponentState::Synchronised {
                continue;
            }
            slot.data.render_update(time, ctx);
        }
    }

    /// Current membership set sizes.
    #[must_use]
    pub fn counts(&self) -> PoolCounts {
        PoolCounts {
            capacity: self.slots.len(),
            free: self.free.len(),
            used: self.used.len(),
            acquire_pending: self.acquire_pending.len(),
            release_pending: self.release_pending.len(),
        }
    }
}

/// Type-erased face of a [`TypedPool`], as stored by the registry.
pub(crate) trait PoolDriver<C>: Send {
    fn priority(&self) -> i32;
    fn type_name(&self) -> &'static str;
    fn component_type(&self) -> TypeId;
    fn has_physics_update(&self) -> bool;
    fn has_core_update(&self) -> bool;
    fn has_render_update(&self) -> bool;
    fn release_deferred(&mut self, handle: ComponentHandle);
    fn synchronise(&mut self, entities: &mut EntityArena, ctx: &mut C);
    fn core_update(&mut self, entities: &mut EntityArena, time: &GameTime, ctx: &mut C);
    fn physics_update(&mut self, entities: &mut EntityArena, time: &GameTime, ctx: &mut C);
    fn render_update(&mut self, time: &GameTime, ctx: &mut C);
    fn counts(&self) -> PoolCounts;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T, C> PoolDriver<C> for TypedPool<T, C>
where
    T: Component<C> + Default,
    C: 'static,
{
    fn priority(&self) -> i32 {
        self.priority
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn component_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn has_physics_update(&self) -> bool {
        T::HAS_PHYSICS_UPDATE
    }

    fn has_core_update(&self) -> bool {
        T::HAS_CORE_UPDATE
    }

    fn has_render_update(&self) -> bool {
        T::HAS_RENDER_UPDATE
    }

    fn release_deferred(&mut self, handle: ComponentHandle) {
        TypedPool::release_deferred(self, handle);
    }

    fn synchronise(&mut self, entities: &mut EntityArena, ctx: &mut C) {
        TypedPool::synchronise(self, entities, ctx);
    }

    fn core_update(&mut self, entities: &mut EntityArena, time: &GameTime, ctx: &mut C) {
        TypedPool::core_update(self, entities, time, ctx);
    }

    fn physics_update(&mut self, entities: &mut EntityArena, time: &GameTime, ctx: &mut C) {
        TypedPool::physics_update(self, entities, time, ctx);
    }

    fn render_update(&mut self, time: &GameTime, ctx: &mut C) {
        TypedPool::render_update(self, time, ctx);
    }

    fn counts(&self) -> PoolCounts {
        TypedPool::counts(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
