// =============================================================================
// REGISTRY - priority-ordered pool traversal and entity lifetime
// =============================================================================
//! The [`Registry`] owns the entity table and one pool per registered
//! component type, and drives every pool through the frame phases in
//! priority order.

use std::any::{type_name, TypeId};
use std::collections::HashMap;

use tracing::{debug, trace};

use crate::events::{EventHub, EventTag};
use crate::time::GameTime;

use super::entity::{ComponentRef, Entity, EntityArena, EntityId};
use super::lifecycle::Component;
use super::pool::{ComponentHandle, PoolCounts, PoolDriver, TypedPool};

/// Entity table plus registered component pools.
///
/// `C` is the application context threaded into every component hook.
///
/// Component types are registered once at startup, each with its own
/// capacity and a traversal priority. Within a phase, pools run lowest
/// priority first; within a pool, slots run in used-list order. The
/// ordering is deterministic and identical on every frame.
pub struct Registry<C: 'static> {
    entities: EntityArena,
    pools: HashMap<TypeId, Box<dyn PoolDriver<C>>>,
    physics_order: Vec<TypeId>,
    core_order: Vec<TypeId>,
    render_order: Vec<TypeId>,
    sync_order: Vec<TypeId>,
    teardown: Vec<EntityId>,
    orders_dirty: bool,
    started: bool,
}

impl<C: 'static> Registry<C> {
    /// Creates a registry with a fixed number of entity slots.
    #[must_use]
    pub fn new(entity_capacity: usize) -> Self {
        Registry {
            entities: EntityArena::new(entity_capacity),
            pools: HashMap::new(),
            physics_order: Vec::new(),
            core_order: Vec::new(),
            render_order: Vec::new(),
            sync_order: Vec::new(),
            teardown: Vec::with_capacity(entity_capacity),
            orders_dirty: false,
            started: false,
        }
    }

    /// Registers a component type with its pool capacity and traversal
    /// priority (lower runs first). Registration is a startup-only
    /// operation.
    ///
    /// # Panics
    ///
    /// Panics if the type is already registered, or if any phase has
    /// already run.
    pub fn register_component<T: Component<C> + Default>(&mut self, capacity: usize, priority: i32) {
        assert!(
            !self.started,
            "component registration after the first frame: {}",
            type_name::<T>()
        );
        let type_id = TypeId::of::<T>();
        assert!(
            !self.pools.contains_key(&type_id),
            "component type registered twice: {}",
            type_name::<T>()
        );
        debug!(component = type_name::<T>(), capacity, priority, "registered component pool");
        self.pools.insert(type_id, Box::new(TypedPool::<T, C>::new(capacity, priority)));
        self.orders_dirty = true;
    }

    /// Rebuilds the per-phase traversal orders from pool priorities.
    ///
    /// Runs lazily before the next traversal after a registration; call
    /// it directly to pay the sort cost at a chosen moment instead.
    pub fn refresh_update_lists(&mut self) {
        let mut entries: Vec<(i32, &'static str, TypeId)> = self
            .pools
            .values()
            .map(|p| (p.priority(), p.type_name(), p.component_type()))
            .collect();
        // Name as tie-break keeps the order independent of map iteration.
        entries.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        self.physics_order.clear();
        self.core_order.clear();
        self.render_order.clear();
        self.sync_order.clear();
        for &(_, _, type_id) in &entries {
            let pool = &self.pools[&type_id];
            if pool.has_physics_update() {
                self.physics_order.push(type_id);
            }
            if pool.has_core_update() {
                self.core_order.push(type_id);
            }
            if pool.has_render_update() {
                self.render_order.push(type_id);
            }
            self.sync_order.push(type_id);
        }
        self.orders_dirty = false;
    }

    // Every phase driver funnels through here, so the first drive also
    // closes the registration window.
    fn begin_phase(&mut self) {
        self.started = true;
        if self.orders_dirty {
            self.refresh_update_lists();
        }
    }

    // -------------------------------------------------------------------------
    // Entities
    // -------------------------------------------------------------------------

    /// Claims a free entity slot.
    ///
    /// # Panics
    ///
    /// Panics if the table is full.
    pub fn spawn_entity(&mut self) -> EntityId {
        self.entities.spawn()
    }

    /// Marks `id` dead, publishes the entity-destroyed event synchronously
    /// and queues teardown of the entity and all its components for the
    /// next Synchronise.
    ///
    /// Subscribers run before this returns, while the entity's components
    /// are still attached and queryable.
    ///
    /// # Panics
    ///
    /// Panics on a stale id or a second release of the same entity.
    pub fn release_entity<E: EventTag>(
        &mut self,
        id: EntityId,
        hub: &mut EventHub<E, C>,
        ctx: &mut C,
    ) {
        let Some(entity) = self.entities.get(id) else {
            panic!("release of stale entity id {id:?}");
        };
        assert!(entity.is_alive(), "double release of entity {id:?}");
        trace!(entity = ?id, "entity released");
        self.entities.mark_dead(id);
        self.teardown.push(id);
        hub.publish(E::ENTITY_DESTROYED, id, ctx);
    }

    /// Releases every live entity, then runs a full Synchronise so the
    /// world is empty on return.
    ///
    /// Entities whose (non-empty) name appears in `keep_names` survive.
    pub fn clear_all<E: EventTag>(
        &mut self,
        keep_names: &[&str],
        hub: &mut EventHub<E, C>,
        ctx: &mut C,
    ) {
        let doomed: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|e| e.is_alive())
            .filter(|e| e.name().is_empty() || !keep_names.contains(&e.name()))
            .map(Entity::id)
            .collect();
        debug!(released = doomed.len(), kept = keep_names.len(), "clearing world");
        for id in doomed {
            self.release_entity(id, hub, ctx);
        }
        self.synchronise(ctx);
    }

    /// Borrows the entity for `id`, if the id is still current.
    #[inline]
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Mutable variant of [`Registry::entity`].
    #[inline]
    #[must_use]
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Linear search over every slot for the first entity named `name`.
    ///
    /// Names are unbound at teardown, so dead slots never match. An empty
    /// query never matches. O(capacity); meant for wiring things up, not
    /// per-frame lookups.
    #[must_use]
    pub fn find_entity_by_name(&self, name: &str) -> Option<EntityId> {
        if name.is_empty() {
            return None;
        }
        self.entities.iter().find(|e| e.name() == name).map(Entity::id)
    }

    /// Entities currently alive.
    #[inline]
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.entities.alive_count()
    }

    /// Total entity slots.
    #[inline]
    #[must_use]
    pub fn entity_capacity(&self) -> usize {
        self.entities.capacity()
    }

    // -------------------------------------------------------------------------
    // Components
    // -------------------------------------------------------------------------

    /// Acquires a `T` from its pool and attaches it to `entity`.
    ///
    /// The component's `initialise` has not run yet; configure its data
    /// through [`Registry::component_mut`] before the next Synchronise.
    ///
    /// # Panics
    ///
    /// Panics if `T` is unregistered, the pool is exhausted, or `entity`
    /// is dead or stale.
    pub fn add_component<T: Component<C> + Default>(&mut self, entity: EntityId) -> ComponentHandle {
        let handle = self.typed_pool_mut::<T>().acquire(entity);
        let Some(ent) = self.entities.get_mut(entity) else {
            panic!("add_component::<{}> on stale entity {entity:?}", type_name::<T>());
        };
        assert!(ent.is_alive(), "add_component::<{}> on dead entity", type_name::<T>());
        ent.attach(ComponentRef { type_id: TypeId::of::<T>(), handle });
        handle
    }

    /// Detaches the first `T` on `entity` and queues its slot for release
    /// at the next Synchronise. Returns the released handle.
    ///
    /// # Panics
    ///
    /// Panics if the entity has no `T` attached.
    pub fn remove_component<T: Component<C> + Default>(
        &mut self,
        entity: EntityId,
    ) -> ComponentHandle {
        let type_id = TypeId::of::<T>();
        let Some(ent) = self.entities.get_mut(entity) else {
            panic!("remove_component::<{}> on stale entity {entity:?}", type_name::<T>());
        };
        let Some(cref) = ent
            .components()
            .iter()
            .find(|c| c.type_id == type_id)
            .copied()
            .and_then(|c| ent.detach(c.handle))
        else {
            panic!("remove_component: entity has no {}", type_name::<T>());
        };
        self.typed_pool_mut::<T>().release_deferred(cref.handle);
        cref.handle
    }

    /// Borrows a component by handle. `None` on a stale handle.
    #[must_use]
    pub fn component<T: Component<C> + Default>(&self, handle: ComponentHandle) -> Option<&T> {
        self.typed_pool::<T>().get(handle)
    }

    /// Mutable variant of [`Registry::component`].
    #[must_use]
    pub fn component_mut<T: Component<C> + Default>(
        &mut self,
        handle: ComponentHandle,
    ) -> Option<&mut T> {
        self.typed_pool_mut::<T>().get_mut(handle)
    }

    /// Direct access to the pool for `T`, for enabled-flag flips and
    /// lifecycle-state queries.
    ///
    /// # Panics
    ///
    /// Panics if `T` is unregistered.
    #[must_use]
    pub fn pool<T: Component<C> + Default>(&self) -> &TypedPool<T, C> {
        self.typed_pool::<T>()
    }

    /// Mutable variant of [`Registry::pool`].
    #[must_use]
    pub fn pool_mut<T: Component<C> + Default>(&mut self) -> &mut TypedPool<T, C> {
        self.typed_pool_mut::<T>()
    }

    /// Membership set sizes for the pool of `T`.
    #[must_use]
    pub fn pool_counts<T: Component<C> + Default>(&self) -> PoolCounts {
        self.typed_pool::<T>().counts()
    }

    fn typed_pool<T: Component<C> + Default>(&self) -> &TypedPool<T, C> {
        let Some(pool) = self.pools.get(&TypeId::of::<T>()) else {
            panic!("component type not registered: {}", type_name::<T>());
        };
        let Some(pool) = pool.as_any().downcast_ref::<TypedPool<T, C>>() else {
            unreachable!("pool stored under wrong type id");
        };
        pool
    }

    fn typed_pool_mut<T: Component<C> + Default>(&mut self) -> &mut TypedPool<T, C> {
        let Some(pool) = self.pools.get_mut(&TypeId::of::<T>()) else {
            panic!("component type not registered: {}", type_name::<T>());
        };
        let Some(pool) = pool.as_any_mut().downcast_mut::<TypedPool<T, C>>() else {
            unreachable!("pool stored under wrong type id");
        };
        pool
    }

    // -------------------------------------------------------------------------
    // Phases
    // -------------------------------------------------------------------------

    /// Core traversal: every Core-capable pool, priority order.
    pub fn core_update(&mut self, time: &GameTime, ctx: &mut C) {
        self.begin_phase();
        for type_id in &self.core_order {
            if let Some(pool) = self.pools.get_mut(type_id) {
                pool.core_update(&mut self.entities, time, ctx);
            }
        }
    }

    /// Physics sub-step traversal: every physics-capable pool, priority
    /// order. Call once per fixed step.
    pub fn physics_update(&mut self, time: &GameTime, ctx: &mut C) {
        self.begin_phase();
        for type_id in &self.physics_order {
            if let Some(pool) = self.pools.get_mut(type_id) {
                pool.physics_update(&mut self.entities, time, ctx);
            }
        }
    }

    /// Render traversal: every render-capable pool, priority order.
    pub fn render_update(&mut self, time: &GameTime, ctx: &mut C) {
        self.begin_phase();
        for type_id in &self.render_order {
            if let Some(pool) = self.pools.get_mut(type_id) {
                pool.render_update(time, ctx);
            }
        }
    }

    /// Resolves all structural changes queued since the last Synchronise.
    ///
    /// Released entities are torn down first (their components join the
    /// release-pending sets), then every pool synchronises in priority
    /// order: cleanup, render-flag refresh, render-data commit,
    /// initialise.
    pub fn synchronise(&mut self, ctx: &mut C) {
        self.begin_phase();
        for i in 0..self.teardown.len() {
            let id = self.teardown[i];
            while let Some(cref) = self.entities.pop_component(id) {
                if let Some(pool) = self.pools.get_mut(&cref.type_id) {
                    pool.release_deferred(cref.handle);
                }
            }
            self.entities.recycle(id);
        }
        self.teardown.clear();

        for type_id in &self.sync_order {
            if let Some(pool) = self.pools.get_mut(type_id) {
                pool.synchronise(&mut self.entities, ctx);
            }
        }
    }
}
