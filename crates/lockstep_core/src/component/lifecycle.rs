// =============================================================================
// LIFECYCLE - the component contract
// =============================================================================
//! The [`Component`] trait and its lifecycle state machine.

use crate::time::GameTime;

use super::entity::Entity;

/// Lifecycle state of a pooled component slot.
///
/// States advance strictly forward while the slot is in use and reset to
/// `Inactive` when it returns to the free list:
///
/// ```text
/// Inactive -> Initialised -> FirstUpdated -> Synchronised
/// ```
///
/// The state gates render-data commits. A component with a simulation
/// update capability is not committed to the render set until it has been
/// updated at least once, so the renderer never sees a half-built object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum ComponentState {
    /// On the free list, or acquired but not yet initialised.
    #[default]
    Inactive,
    /// [`Component::initialise`] has run (during Synchronise).
    Initialised,
    /// At least one Core or physics update has run.
    FirstUpdated,
    /// Render data has been committed at least once.
    Synchronised,
}

/// Behaviour attached to an entity through a fixed-capacity pool.
///
/// `C` is the application context threaded through every hook; it carries
/// whatever the application's components need (backends, event hub access,
/// spawn queues).
///
/// All hooks default to no-ops. The four `HAS_*` capability flags tell the
/// registry which phase traversals a pool takes part in at all; a pool
/// whose type declares no capability for a phase is skipped without
/// touching its slots. Declare only what you implement.
///
/// Hooks run under the phase discipline:
///
/// - `initialise`, `cleanup` and `synchronise_render_data` run during
///   Synchronise, the only phase where render-visible data may change.
/// - `first_core_update`, `core_update` and `physics_update` run during
///   Core and must not touch render-visible data.
/// - `render_update` runs on the simulation thread at the tail of
///   Synchronise, after the commit, and records this slot's contribution
///   to the frame the render thread will draw. It must only read data
///   committed this Synchronise.
pub trait Component<C>: Send + 'static {
    /// Pool takes part in the physics sub-step traversal.
    const HAS_PHYSICS_UPDATE: bool = false;
    /// Pool takes part in the Core traversal.
    const HAS_CORE_UPDATE: bool = false;
    /// Pool takes part in the Render traversal.
    const HAS_RENDER_UPDATE: bool = false;
    /// Pool takes part in the render-data commit during Synchronise.
    const HAS_SYNCHRONISE_RENDER_DATA: bool = false;

    /// Returns the slot to a blank state when it is acquired from the
    /// free list. Runs before the caller configures the component, so
    /// nothing set up here survives to `initialise` unless the caller
    /// leaves it alone.
    fn reset(&mut self) {}

    /// One-time setup, run during the Synchronise after acquisition.
    fn initialise(&mut self, _entity: &mut Entity, _ctx: &mut C) {}

    /// Teardown, run during the Synchronise that recycles the slot.
    ///
    /// The owning entity may already be gone; release external resources
    /// here, not entity state.
    fn cleanup(&mut self, _ctx: &mut C) {}

    /// Runs once, immediately before the first `core_update`.
    fn first_core_update(&mut self, _entity: &mut Entity, _time: &GameTime, _ctx: &mut C) {}

    /// Per-frame simulation logic.
    fn core_update(&mut self, _entity: &mut Entity, _time: &GameTime, _ctx: &mut C) {}

    /// Fixed-step physics logic; may run zero or several times per frame.
    fn physics_update(&mut self, _entity: &mut Entity, _time: &GameTime, _ctx: &mut C) {}

    /// Copies simulation state into this component's render-owned fields.
    fn synchronise_render_data(&mut self, _entity: &Entity, _ctx: &mut C) {}

    /// Records this slot's committed render data into the frame being
    /// handed to the render thread. Read-only with respect to simulation
    /// state.
    fn render_update(&mut self, _time: &GameTime, _ctx: &mut C) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_order_forward() {
        assert!(ComponentState::Inactive < ComponentState::Initialised);
        assert!(ComponentState::Initialised < ComponentState::FirstUpdated);
        assert!(ComponentState::FirstUpdated < ComponentState::Synchronised);
    }

    #[test]
    fn default_state_is_inactive() {
        assert_eq!(ComponentState::default(), ComponentState::Inactive);
    }
}
