// =============================================================================
// HEADLESS BACKENDS
// =============================================================================
//! Render and physics backends with no hardware behind them, for tests,
//! servers and the soak binary.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lockstep_core::events::ContactEvent;
use lockstep_core::{PhysicsBackend, RenderBackend};
use lockstep_shared::Transform;

/// Counters shared out of a [`NullRenderer`], safe to read from another
/// thread while the renderer runs.
#[derive(Clone, Debug, Default)]
pub struct RenderTap {
    frames: Arc<AtomicU64>,
    submits: Arc<AtomicU64>,
    last_frame_submits: Arc<AtomicU64>,
}

impl RenderTap {
    /// Frames presented so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Draws submitted across all frames.
    #[must_use]
    pub fn total_submits(&self) -> u64 {
        self.submits.load(Ordering::Relaxed)
    }

    /// Draws submitted in the most recently presented frame.
    #[must_use]
    pub fn last_frame_submits(&self) -> u64 {
        self.last_frame_submits.load(Ordering::Relaxed)
    }
}

/// A renderer that counts instead of drawing.
#[derive(Debug, Default)]
pub struct NullRenderer {
    tap: RenderTap,
    current_frame_submits: u64,
}

impl NullRenderer {
    /// A handle onto this renderer's counters.
    #[must_use]
    pub fn tap(&self) -> RenderTap {
        self.tap.clone()
    }
}

impl RenderBackend for NullRenderer {
    fn begin_frame(&mut self, _clear: [f32; 4]) {
        self.current_frame_submits = 0;
    }

    fn submit(&mut self, _transform: &Transform, _material: u32) {
        self.current_frame_submits += 1;
        self.tap.submits.fetch_add(1, Ordering::Relaxed);
    }

    fn present(&mut self) {
        self.tap.last_frame_submits.store(self.current_frame_submits, Ordering::Relaxed);
        self.tap.frames.fetch_add(1, Ordering::Relaxed);
    }
}

/// A physics engine that does nothing but count steps. Motion in the
/// reference world is integrated by the components themselves.
#[derive(Debug, Default)]
pub struct NullPhysics {
    /// Fixed steps taken.
    pub steps: u64,
}

impl PhysicsBackend for NullPhysics {
    fn step(&mut self, _dt: f32, _sink: &mut dyn FnMut(ContactEvent)) {
        self.steps += 1;
    }
}

/// A physics engine that replays scripted contacts, one batch per step.
/// For testing contact routing without a real narrow phase.
#[derive(Debug, Default)]
pub struct ScriptedPhysics {
    queued: VecDeque<Vec<ContactEvent>>,
    /// Fixed steps taken.
    pub steps: u64,
}

impl ScriptedPhysics {
    /// Queues the contacts the next un-scripted step will report.
    pub fn queue_step(&mut self, contacts: Vec<ContactEvent>) {
        self.queued.push_back(contacts);
    }
}

impl PhysicsBackend for ScriptedPhysics {
    fn step(&mut self, _dt: f32, sink: &mut dyn FnMut(ContactEvent)) {
        self.steps += 1;
        if let Some(batch) = self.queued.pop_front() {
            for contact in batch {
                sink(contact);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockstep_core::component::EntityId;
    use lockstep_core::events::ContactKind;

    #[test]
    fn null_renderer_counts_per_frame() {
        let mut renderer = NullRenderer::default();
        let tap = renderer.tap();
        let t = Transform::IDENTITY;

        renderer.begin_frame([0.0; 4]);
        renderer.submit(&t, 1);
        renderer.submit(&t, 2);
        renderer.present();
        renderer.begin_frame([0.0; 4]);
        renderer.submit(&t, 1);
        renderer.present();

        assert_eq!(tap.frames(), 2);
        assert_eq!(tap.total_submits(), 3);
        assert_eq!(tap.last_frame_submits(), 1);
    }

    #[test]
    fn scripted_physics_replays_batches_in_order() {
        let mut physics = ScriptedPhysics::default();
        let contact = ContactEvent {
            kind: ContactKind::Begin,
            entity: EntityId::NULL,
            other: EntityId::NULL,
            category: 1,
            other_category: 2,
        };
        physics.queue_step(vec![contact]);

        let mut seen = Vec::new();
        physics.step(0.016, &mut |c| seen.push(c.kind));
        physics.step(0.016, &mut |c| seen.push(c.kind));
        assert_eq!(seen, vec![ContactKind::Begin]);
        assert_eq!(physics.steps, 2);
    }
}
