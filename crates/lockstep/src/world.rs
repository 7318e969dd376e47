// =============================================================================
// WORLD - the assembled frame pipeline
// =============================================================================
//! [`World`] wires the kernel pieces together and implements [`Phases`],
//! so either scheduler can run it. [`WorldFrame`] is the matching render
//! half: the backend plus the draw list the last Synchronise recorded.
//!
//! Per frame:
//!
//! - **Core**: apply queued despawns and spawns, drive the flow state,
//!   run the fixed physics steps owed this frame, run the Core
//!   traversal, flush component-raised events.
//! - **Synchronise**: advance the time chain, resolve flow transitions,
//!   resolve all structural changes, commit render data, then run the
//!   Render traversal to record this frame's [`DrawCall`]s into the
//!   [`WorldFrame`].
//! - **Render**: replay the recorded draw list into the backend. This is
//!   all that runs on the render thread; the registry and pools never
//!   cross over to it.
//!
//! Components never see the registry or the hub. They talk back through
//! queues on [`GameContext`], which the world drains at fixed points in
//! Core; that keeps structural mutation out of the traversals entirely.

use std::mem;

use crossbeam_channel::Sender;
use tracing::{debug, info};

use lockstep_core::component::{EntityId, Registry};
use lockstep_core::events::{ContactEvent, EventHub, EventTag};
use lockstep_core::flow::FlowGraph;
use lockstep_core::sync::{Phases, RenderFrame, Scheduler};
use lockstep_core::time::{Clock, GameTime, SystemClock};
use lockstep_core::{KernelConfig, PhysicsBackend, RenderBackend};
use lockstep_shared::{Transform, Vec2, Vec3};

use crate::components::{LifetimeComponent, QuadComponent};
use crate::states::{BootState, PlayState};

/// Game events for the reference world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameEvent {
    /// Raised by the registry when an entity is released.
    EntityDestroyed,
    /// Raised by a [`LifetimeComponent`] as it expires.
    LifetimeExpired,
}

impl EventTag for GameEvent {
    const ENTITY_DESTROYED: GameEvent = GameEvent::EntityDestroyed;
}

/// Request to spawn one quad, queued by flow states and drained in Core.
#[derive(Clone, Debug)]
pub struct QuadSpec {
    /// Optional entity name, for lookups.
    pub name: Option<String>,
    /// Starting position.
    pub position: Vec3,
    /// Constant planar velocity.
    pub velocity: Vec2,
    /// Material key passed through to the renderer.
    pub material: u32,
    /// Seconds until self-destruction, if any.
    pub lifetime: Option<f32>,
}

/// Running totals, kept on the context so hooks can bump them.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorldStats {
    /// Frames completed by Core.
    pub frames: u64,
    /// Entities destroyed.
    pub destroyed: u32,
    /// Lifetimes that ran out.
    pub expired: u32,
}

/// One committed draw, recorded during Synchronise and replayed by the
/// render thread.
#[derive(Clone, Copy, Debug)]
pub struct DrawCall {
    /// Interpolated world transform.
    pub transform: Transform,
    /// Material key passed through to the backend.
    pub material: u32,
}

/// The render half of the world: the backend plus the draw list the
/// last Synchronise recorded. In threaded mode this is the only state
/// the render thread ever holds.
pub struct WorldFrame {
    renderer: Box<dyn RenderBackend>,
    draws: Vec<DrawCall>,
}

impl WorldFrame {
    /// Wraps a render backend.
    #[must_use]
    pub fn new(renderer: Box<dyn RenderBackend>) -> Self {
        WorldFrame { renderer, draws: Vec::new() }
    }

    /// The draws committed by the last Synchronise.
    #[must_use]
    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }
}

impl RenderFrame for WorldFrame {
    fn render_update(&mut self) {
        self.renderer.begin_frame([0.02, 0.02, 0.05, 1.0]);
        for draw in &self.draws {
            self.renderer.submit(&draw.transform, draw.material);
        }
        self.renderer.present();
    }
}

/// Everything component and state hooks may touch.
///
/// Structural requests (spawns, despawns, event publishes) go into the
/// queues here and are applied by the world at defined points, never
/// mid-traversal.
pub struct GameContext {
    /// The physics engine. Stepped by the world during Core.
    pub physics: Box<dyn PhysicsBackend>,
    /// Interpolation fraction for this frame's render-data commit.
    pub interpolation: f32,
    /// Quads currently held by the pool, refreshed at the top of Core.
    pub quads_alive: usize,
    /// Spawn requests, drained after the flow state's Core hook.
    pub spawns: Vec<QuadSpec>,
    /// Entities to release, drained at the top of Core.
    pub despawns: Vec<EntityId>,
    /// Events to publish, flushed after the Core traversal.
    pub events: Vec<(GameEvent, EntityId)>,
    /// Draws recorded by Render-traversal hooks, swapped into the
    /// [`WorldFrame`] at the end of Synchronise.
    pub draws: Vec<DrawCall>,
    /// Running totals.
    pub stats: WorldStats,
}

/// The assembled engine: time chain, flow graph, registry, event hub and
/// context, run as one [`Phases`] implementation.
pub struct World {
    time: GameTime,
    flow: FlowGraph<GameContext>,
    registry: Registry<GameContext>,
    hub: EventHub<GameEvent, GameContext>,
    ctx: GameContext,
    halt_tx: Option<Sender<()>>,
    threaded: bool,
    contact_scratch: Vec<ContactEvent>,
}

impl World {
    /// Builds the reference world over the wall clock.
    #[must_use]
    pub fn new(config: &KernelConfig, physics: Box<dyn PhysicsBackend>) -> Self {
        Self::with_clock(config, Box::new(SystemClock::new()), physics)
    }

    /// Builds the reference world over an explicit clock, for
    /// deterministic runs.
    #[must_use]
    pub fn with_clock(
        config: &KernelConfig,
        clock: Box<dyn Clock>,
        physics: Box<dyn PhysicsBackend>,
    ) -> Self {
        let mut time = GameTime::new(clock, config.step_ticks());
        time.set_time_scale(config.time_scale);

        let mut registry = Registry::new(config.entity_capacity);
        registry.register_component::<QuadComponent>(config.entity_capacity, 10);
        registry.register_component::<LifetimeComponent>(config.entity_capacity, 0);

        let mut flow = FlowGraph::new();
        let boot = flow.add_state(BootState::default(), true);
        let play = flow.add_state(PlayState::default(), false);
        flow.connect(boot, play, 0);
        // PlayState's exit stays unwired: the graph halts when the world
        // empties, and the frame loop quits on the halt.

        let mut hub = EventHub::new();
        hub.subscribe(GameEvent::EntityDestroyed, |_, _, ctx: &mut GameContext| {
            ctx.stats.destroyed += 1;
        });
        hub.subscribe(GameEvent::LifetimeExpired, |_, _, ctx: &mut GameContext| {
            ctx.stats.expired += 1;
        });

        info!(
            entities = config.entity_capacity,
            tick_hz = config.tick_hz,
            threaded = config.threaded_render,
            "world assembled"
        );
        World {
            time,
            flow,
            registry,
            hub,
            ctx: GameContext {
                physics,
                interpolation: 0.0,
                quads_alive: 0,
                spawns: Vec::new(),
                despawns: Vec::new(),
                events: Vec::new(),
                draws: Vec::new(),
                stats: WorldStats::default(),
            },
            halt_tx: None,
            threaded: config.threaded_render,
            contact_scratch: Vec::new(),
        }
    }

    /// Sends on `tx` when the flow graph halts, so the frame loop can be
    /// quit by the world itself.
    pub fn quit_on_halt(&mut self, tx: Sender<()>) {
        self.halt_tx = Some(tx);
    }

    /// Runs under the scheduler selected by the config until the quit
    /// channel fires, and hands both halves back.
    #[must_use]
    pub fn run(
        mut self,
        mut frame: WorldFrame,
        quit: &crossbeam_channel::Receiver<()>,
    ) -> (Self, WorldFrame) {
        if self.threaded {
            Scheduler::run_threaded(self, frame, quit)
        } else {
            Scheduler::run_single_threaded(&mut self, &mut frame, quit);
            (self, frame)
        }
    }

    /// Running totals so far.
    #[must_use]
    pub fn stats(&self) -> WorldStats {
        self.ctx.stats
    }

    /// The time chain.
    #[must_use]
    pub fn time(&self) -> &GameTime {
        &self.time
    }

    /// The entity registry.
    #[must_use]
    pub fn registry(&self) -> &Registry<GameContext> {
        &self.registry
    }

    /// Mutable registry access, for wiring worlds up outside the frame
    /// loop.
    #[must_use]
    pub fn registry_mut(&mut self) -> &mut Registry<GameContext> {
        &mut self.registry
    }

    /// The event hub, for wiring subscriptions outside the frame loop.
    #[must_use]
    pub fn hub_mut(&mut self) -> &mut EventHub<GameEvent, GameContext> {
        &mut self.hub
    }

    /// `true` once the flow graph has halted.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.flow.is_halted()
    }

    fn apply_despawns(&mut self) {
        let despawns = mem::take(&mut self.ctx.despawns);
        for id in despawns {
            if self.registry.entity(id).is_some_and(|e| e.is_alive()) {
                self.registry.release_entity(id, &mut self.hub, &mut self.ctx);
            }
        }
    }

    fn apply_spawns(&mut self) {
        let spawns = mem::take(&mut self.ctx.spawns);
        for spec in spawns {
            let id = self.registry.spawn_entity();
            if let Some(entity) = self.registry.entity_mut(id) {
                entity.transform.position = spec.position;
                if let Some(name) = &spec.name {
                    entity.set_name(name);
                }
            }
            let quad = self.registry.add_component::<QuadComponent>(id);
            if let Some(quad) = self.registry.component_mut::<QuadComponent>(quad) {
                quad.velocity = spec.velocity;
                quad.material = spec.material;
            }
            if let Some(seconds) = spec.lifetime {
                let life = self.registry.add_component::<LifetimeComponent>(id);
                if let Some(life) = self.registry.component_mut::<LifetimeComponent>(life) {
                    life.remaining = seconds;
                }
            }
            debug!(entity = ?id, material = spec.material, "spawned quad");
        }
    }

    fn run_physics_steps(&mut self) {
        let dt = self.time.step_seconds();
        for _ in 0..self.time.steps_this_frame() {
            let contacts = &mut self.contact_scratch;
            self.ctx.physics.step(dt, &mut |contact| contacts.push(contact));
            for i in 0..self.contact_scratch.len() {
                let contact = self.contact_scratch[i];
                self.hub.publish_contact(&contact, &mut self.ctx);
            }
            self.contact_scratch.clear();
            self.registry.physics_update(&self.time, &mut self.ctx);
            self.flow.physics_update(&mut self.ctx);
        }
    }

    fn flush_events(&mut self) {
        let events = mem::take(&mut self.ctx.events);
        for (tag, entity) in events {
            self.hub.publish(tag, entity, &mut self.ctx);
        }
    }
}

impl Phases for World {
    type Frame = WorldFrame;

    fn core_update(&mut self) {
        self.ctx.stats.frames += 1;
        self.apply_despawns();
        let counts = self.registry.pool_counts::<QuadComponent>();
        self.ctx.quads_alive = counts.used + counts.acquire_pending;

        self.flow.core_update(&mut self.ctx);
        self.apply_spawns();
        self.run_physics_steps();
        self.registry.core_update(&self.time, &mut self.ctx);
        self.flush_events();

        if self.flow.is_halted() {
            if let Some(tx) = self.halt_tx.take() {
                info!("flow graph halted; requesting quit");
                let _ = tx.send(());
            }
        }
    }

    fn synchronise(&mut self, frame: &mut WorldFrame) {
        self.time.frame_started();
        self.ctx.interpolation = self.time.interpolation_fraction();
        self.flow.synchronise(&mut self.ctx);
        self.registry.synchronise(&mut self.ctx);

        // Record this frame's draws and hand them over. The render
        // thread replays the list; it never sees the registry.
        self.flow.render_update(&mut self.ctx);
        self.registry.render_update(&self.time, &mut self.ctx);
        mem::swap(&mut frame.draws, &mut self.ctx.draws);
        self.ctx.draws.clear();
    }
}
