// =============================================================================
// BACKEND - render and physics seams
// =============================================================================
//! Traits the kernel drives but never implements.
//!
//! The kernel owns frame structure and ordering; what a draw call or a
//! physics step actually does lives behind these seams. Headless test
//! doubles implement them in a few lines.

use lockstep_shared::Transform;

use crate::events::ContactEvent;

/// A renderer, driven only from the Render phase.
pub trait RenderBackend: Send {
    /// Starts a frame with the given clear colour.
    fn begin_frame(&mut self, clear: [f32; 4]);

    /// Queues one draw at `transform` with an application-defined
    /// material key.
    fn submit(&mut self, transform: &Transform, material: u32);

    /// Flushes the frame to the target.
    fn present(&mut self);
}

/// A fixed-step physics engine, driven only from the Core phase.
pub trait PhysicsBackend: Send {
    /// Advances the world by one fixed step of `dt` seconds. Contacts
    /// that began or ended during the step are reported through `sink`
    /// before this returns.
    fn step(&mut self, dt: f32, sink: &mut dyn FnMut(ContactEvent));
}

/// Category/mask collision filtering.
///
/// Two filters collide when each one's mask admits the other's category.
/// A shared non-zero group overrides the masks: positive forces the
/// collision, negative suppresses it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionFilter {
    /// The single category bit(s) this body belongs to.
    pub category: u16,
    /// Categories this body is willing to touch.
    pub mask: u16,
    /// Override group; zero means no group.
    pub group: i16,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        CollisionFilter { category: 0x0001, mask: u16::MAX, group: 0 }
    }
}

impl CollisionFilter {
    /// Whether these two filters should generate contacts at all.
    #[must_use]
    pub fn collides_with(&self, other: &CollisionFilter) -> bool {
        if self.group != 0 && self.group == other.group {
            return self.group > 0;
        }
        (self.mask & other.category) != 0 && (other.mask & self.category) != 0
    }
}
