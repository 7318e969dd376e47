// =============================================================================
// REFERENCE COMPONENTS
// =============================================================================
//! The two components the reference world runs on.
//!
//! [`QuadComponent`] is the full-lifecycle example: physics integration,
//! render-data commit with interpolation, render submission.
//! [`LifetimeComponent`] is the minimal Core-only example and shows how
//! hooks request structural changes through the context queues.

use lockstep_core::component::{Component, Entity};
use lockstep_core::time::{GameTime, TimeSource};
use lockstep_shared::{Transform, Vec2, Vec3};

use crate::world::{DrawCall, GameContext, GameEvent};

/// A moving quad: integrated at the fixed physics rate, rendered with
/// interpolation between its last two tick poses.
///
/// The simulation-owned pose lives in `prev`/`curr` (and is mirrored to
/// the entity transform); `render_transform` is the render-owned copy,
/// written only during the Synchronise commit.
#[derive(Debug, Default)]
pub struct QuadComponent {
    /// Constant planar velocity, units per second.
    pub velocity: Vec2,
    /// Material key passed to the renderer.
    pub material: u32,
    prev: Vec3,
    curr: Vec3,
    render_transform: Transform,
}

impl QuadComponent {
    /// The pose the renderer last saw.
    #[must_use]
    pub fn render_transform(&self) -> &Transform {
        &self.render_transform
    }
}

impl Component<GameContext> for QuadComponent {
    const HAS_PHYSICS_UPDATE: bool = true;
    const HAS_RENDER_UPDATE: bool = true;
    const HAS_SYNCHRONISE_RENDER_DATA: bool = true;

    fn reset(&mut self) {
        *self = QuadComponent::default();
    }

    fn initialise(&mut self, entity: &mut Entity, _ctx: &mut GameContext) {
        self.prev = entity.transform.position;
        self.curr = entity.transform.position;
    }

    fn physics_update(&mut self, entity: &mut Entity, time: &GameTime, _ctx: &mut GameContext) {
        self.prev = self.curr;
        self.curr = self.curr + Vec3::from_planar(self.velocity * time.step_seconds(), 0.0);
        entity.transform.position = self.curr;
    }

    fn synchronise_render_data(&mut self, entity: &Entity, ctx: &mut GameContext) {
        self.render_transform = entity.transform;
        self.render_transform.position = self.prev.lerp(self.curr, ctx.interpolation);
    }

    fn render_update(&mut self, _time: &GameTime, ctx: &mut GameContext) {
        ctx.draws.push(DrawCall { transform: self.render_transform, material: self.material });
    }
}

/// Counts down on the game clock and releases its entity on expiry.
#[derive(Debug, Default)]
pub struct LifetimeComponent {
    /// Seconds of game time left.
    pub remaining: f32,
    expired: bool,
}

impl Component<GameContext> for LifetimeComponent {
    const HAS_CORE_UPDATE: bool = true;

    fn reset(&mut self) {
        self.remaining = 0.0;
        self.expired = false;
    }

    fn core_update(&mut self, entity: &mut Entity, time: &GameTime, ctx: &mut GameContext) {
        if self.expired {
            return;
        }
        self.remaining -= time.game().frame_delta_seconds();
        if self.remaining <= 0.0 {
            self.expired = true;
            ctx.despawns.push(entity.id());
            ctx.events.push((GameEvent::LifetimeExpired, entity.id()));
        }
    }
}
