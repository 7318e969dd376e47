// =============================================================================
// REFERENCE FLOW STATES
// =============================================================================
//! Flow states for the reference world: boot spawns a wave and leaves
//! immediately; play watches it drain and exits when nothing is left.

use tracing::debug;

use lockstep_core::flow::{ExitRequest, FlowState};
use lockstep_shared::{Vec2, Vec3};

use crate::world::{GameContext, QuadSpec};

/// Queues the opening wave of quads on entry, then exits at once. A
/// zero-duration state: it never survives its first Synchronise.
#[derive(Debug)]
pub struct BootState {
    /// Quads per row of the wave.
    pub columns: u32,
    /// Rows in the wave.
    pub rows: u32,
    /// Seconds each quad lives.
    pub lifetime: f32,
}

impl Default for BootState {
    fn default() -> Self {
        BootState { columns: 8, rows: 3, lifetime: 2.0 }
    }
}

impl FlowState<GameContext> for BootState {
    fn exit_count(&self) -> u8 {
        1
    }

    fn on_enter(&mut self, ctx: &mut GameContext, exits: &mut ExitRequest) {
        for row in 0..self.rows {
            for col in 0..self.columns {
                ctx.spawns.push(QuadSpec {
                    name: (row == 0 && col == 0).then(|| "wave-anchor".to_string()),
                    position: Vec3::new(col as f32 * 1.5, row as f32 * 1.5, 0.0),
                    velocity: Vec2::new(if row % 2 == 0 { 0.5 } else { -0.5 }, -0.1),
                    material: row,
                    lifetime: Some(self.lifetime),
                });
            }
        }
        debug!(quads = self.rows * self.columns, "boot wave queued");
        exits.request(0);
    }
}

/// Runs while the wave is alive; exits once every quad has expired. Its
/// single exit is left unwired so the graph halts and the frame loop
/// quits.
#[derive(Debug, Default)]
pub struct PlayState {
    seen_any: bool,
}

impl FlowState<GameContext> for PlayState {
    fn exit_count(&self) -> u8 {
        1
    }

    fn core_update(&mut self, ctx: &mut GameContext, exits: &mut ExitRequest) {
        if ctx.quads_alive > 0 {
            self.seen_any = true;
        } else if self.seen_any && !exits.is_pending() {
            debug!("wave drained; leaving play");
            exits.request(0);
        }
    }
}
