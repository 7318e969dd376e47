// =============================================================================
// FLOW GRAPH - coarse application states with labelled exits
// =============================================================================
//! Application flow as a graph of states wired by numbered exits.
//!
//! A state declares how many exits it has; the graph wires each exit to a
//! target state (or deliberately leaves it open). States never name their
//! successors, so the same state type can be wired differently per
//! application.
//!
//! Transitions only ever resolve during Synchronise. A state entered
//! during resolution may immediately request an exit, and the graph keeps
//! collapsing such zero-duration states within the same Synchronise until
//! it lands on one that stays.

use tracing::{debug, trace};

/// Index of a state added to a [`FlowGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(usize);

/// A state's handle for requesting its own exit.
///
/// At most one exit may be pending at a time; the request sticks until
/// the next Synchronise resolves it.
#[derive(Debug)]
pub struct ExitRequest {
    exit_count: u8,
    pending: Option<u8>,
}

impl ExitRequest {
    fn new(exit_count: u8) -> Self {
        ExitRequest { exit_count, pending: None }
    }

    /// Requests that the owning state leave through `exit`.
    ///
    /// # Panics
    ///
    /// Panics if an exit is already pending, or `exit` is out of range
    /// for the state.
    pub fn request(&mut self, exit: u8) {
        assert!(
            self.pending.is_none(),
            "exit {exit} requested while exit {} already pending",
            self.pending.unwrap_or(0)
        );
        assert!(exit < self.exit_count, "exit {exit} out of range ({} exits)", self.exit_count);
        self.pending = Some(exit);
    }

    /// `true` once an exit has been requested this visit.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// One coarse application state.
///
/// All hooks default to no-ops except `exit_count`, which sizes the
/// state's outgoing edge table. Hooks that may request a transition
/// receive the state's [`ExitRequest`]; render never does, because
/// structural decisions belong to the simulation phases.
pub trait FlowState<C>: Send {
    /// Number of labelled exits this state can leave through.
    fn exit_count(&self) -> u8;

    /// Runs on entry, during Synchronise. Requesting an exit here makes
    /// the state zero-duration.
    fn on_enter(&mut self, _ctx: &mut C, _exits: &mut ExitRequest) {}

    /// Runs just before the transition away, during Synchronise.
    fn on_exit(&mut self, _ctx: &mut C) {}

    /// Core-phase logic while current.
    fn core_update(&mut self, _ctx: &mut C, _exits: &mut ExitRequest) {}

    /// Physics sub-step logic while current.
    fn physics_update(&mut self, _ctx: &mut C, _exits: &mut ExitRequest) {}

    /// Synchronise-phase logic while current, after transitions resolve.
    fn synchronise(&mut self, _ctx: &mut C, _exits: &mut ExitRequest) {}

    /// Render-phase logic while current. Read-only by discipline.
    fn render_update(&mut self, _ctx: &mut C) {}
}

struct Node<C> {
    state: Box<dyn FlowState<C>>,
    edges: Vec<Option<NodeId>>,
    exits: ExitRequest,
}

/// The wired set of flow states and the one currently running.
///
/// Entry into the initial state is lazy: nothing runs until the first
/// Synchronise, so an application can finish wiring the graph and its
/// world before any state logic fires.
pub struct FlowGraph<C> {
    nodes: Vec<Node<C>>,
    current: Option<usize>,
    started: bool,
}

impl<C> Default for FlowGraph<C> {
    fn default() -> Self {
        FlowGraph::new()
    }
}

impl<C> FlowGraph<C> {
    /// An empty graph with no initial state.
    #[must_use]
    pub fn new() -> Self {
        FlowGraph { nodes: Vec::new(), current: None, started: false }
    }

    /// Adds a state. The first one added with `initial` becomes where
    /// the graph starts.
    ///
    /// # Panics
    ///
    /// Panics on a second initial state, or if the graph already started.
    pub fn add_state<S: FlowState<C> + 'static>(&mut self, state: S, initial: bool) -> NodeId {
        assert!(!self.started, "flow graph already started");
        let exit_count = state.exit_count();
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            state: Box::new(state),
            edges: vec![None; exit_count as usize],
            exits: ExitRequest::new(exit_count),
        });
        if initial {
            assert!(self.current.is_none(), "initial state already chosen");
            self.current = Some(id.0);
        }
        id
    }

    /// Wires exit `exit` of `from` to `to`. Unwired exits halt the graph
    /// when taken.
    ///
    /// # Panics
    ///
    /// Panics if the exit is out of range or already wired, or the graph
    /// already started.
    pub fn connect(&mut self, from: NodeId, to: NodeId, exit: u8) {
        assert!(!self.started, "flow graph already started");
        assert!(to.0 < self.nodes.len(), "connect to unknown state");
        let node = &mut self.nodes[from.0];
        assert!(
            (exit as usize) < node.edges.len(),
            "exit {exit} out of range ({} exits)",
            node.edges.len()
        );
        assert!(node.edges[exit as usize].is_none(), "exit {exit} already wired");
        node.edges[exit as usize] = Some(to);
    }

    /// The state currently running, if any.
    #[must_use]
    pub fn current(&self) -> Option<NodeId> {
        self.current.map(NodeId)
    }

    /// `true` once the graph has left through an unwired exit.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.started && self.current.is_none()
    }

    /// Core-phase drive of the current state.
    pub fn core_update(&mut self, ctx: &mut C) {
        if let Some(i) = self.current {
            let node = &mut self.nodes[i];
            node.state.core_update(ctx, &mut node.exits);
        }
    }

    /// Physics sub-step drive of the current state.
    pub fn physics_update(&mut self, ctx: &mut C) {
        if let Some(i) = self.current {
            let node = &mut self.nodes[i];
            node.state.physics_update(ctx, &mut node.exits);
        }
    }

    /// Render-phase drive of the current state.
    pub fn render_update(&mut self, ctx: &mut C) {
        if let Some(i) = self.current {
            self.nodes[i].state.render_update(ctx);
        }
    }

    /// Resolves pending transitions, then runs the current state's
    /// Synchronise hook.
    ///
    /// The first call performs the lazy entry into the initial state.
    /// Zero-duration states are collapsed here: entry, exit request and
    /// departure all land within one call.
    pub fn synchronise(&mut self, ctx: &mut C) {
        if !self.started {
            self.started = true;
            if let Some(i) = self.current {
                trace!(state = i, "flow graph entering initial state");
                let node = &mut self.nodes[i];
                node.state.on_enter(ctx, &mut node.exits);
            }
        }
        self.resolve_transitions(ctx);
        if let Some(i) = self.current {
            let node = &mut self.nodes[i];
            node.state.synchronise(ctx, &mut node.exits);
        }
    }

    fn resolve_transitions(&mut self, ctx: &mut C) {
        while let Some(i) = self.current {
            let node = &mut self.nodes[i];
            let Some(exit) = node.exits.pending.take() else {
                break;
            };
            node.state.on_exit(ctx);
            match node.edges[exit as usize] {
                Some(NodeId(next)) => {
                    trace!(from = i, exit, to = next, "flow transition");
                    self.current = Some(next);
                    let node = &mut self.nodes[next];
                    node.state.on_enter(ctx, &mut node.exits);
                }
                None => {
                    debug!(from = i, exit, "flow graph halted on unwired exit");
                    self.current = None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Ctx {
        log: Vec<String>,
    }

    /// Logs lifecycle calls; optionally exits on enter or after N cores.
    struct Probe {
        name: &'static str,
        exits: u8,
        exit_on_enter: Option<u8>,
        exit_after_cores: Option<(u32, u8)>,
        cores: u32,
    }

    impl Probe {
        fn new(name: &'static str, exits: u8) -> Self {
            Probe { name, exits, exit_on_enter: None, exit_after_cores: None, cores: 0 }
        }

        fn exit_on_enter(mut self, exit: u8) -> Self {
            self.exit_on_enter = Some(exit);
            self
        }

        fn exit_after_cores(mut self, cores: u32, exit: u8) -> Self {
            self.exit_after_cores = Some((cores, exit));
            self
        }
    }

    impl FlowState<Ctx> for Probe {
        fn exit_count(&self) -> u8 {
            self.exits
        }

        fn on_enter(&mut self, ctx: &mut Ctx, exits: &mut ExitRequest) {
            ctx.log.push(format!("enter {}", self.name));
            if let Some(exit) = self.exit_on_enter {
                exits.request(exit);
            }
        }

        fn on_exit(&mut self, ctx: &mut Ctx) {
            ctx.log.push(format!("exit {}", self.name));
        }

        fn core_update(&mut self, ctx: &mut Ctx, exits: &mut ExitRequest) {
            ctx.log.push(format!("core {}", self.name));
            self.cores += 1;
            if let Some((after, exit)) = self.exit_after_cores {
                if self.cores == after {
                    exits.request(exit);
                }
            }
        }
    }

    #[test]
    fn entry_is_lazy_until_first_synchronise() {
        let mut graph: FlowGraph<Ctx> = FlowGraph::new();
        let mut ctx = Ctx::default();
        graph.add_state(Probe::new("boot", 1), true);

        assert!(ctx.log.is_empty());
        graph.core_update(&mut ctx);
        // Not yet entered, but already current and updating.
        assert_eq!(ctx.log, vec!["core boot"]);

        graph.synchronise(&mut ctx);
        assert_eq!(ctx.log, vec!["core boot", "enter boot"]);
    }

    #[test]
    fn requested_exit_resolves_at_synchronise() {
        let mut graph: FlowGraph<Ctx> = FlowGraph::new();
        let mut ctx = Ctx::default();
        let menu = graph.add_state(Probe::new("menu", 1).exit_after_cores(2, 0), true);
        let play = graph.add_state(Probe::new("play", 1), false);
        graph.connect(menu, play, 0);

        graph.synchronise(&mut ctx);
        graph.core_update(&mut ctx);
        graph.synchronise(&mut ctx);
        assert_eq!(graph.current(), Some(menu), "one core is not enough");

        graph.core_update(&mut ctx);
        graph.synchronise(&mut ctx);
        assert_eq!(graph.current(), Some(play));
        assert_eq!(
            ctx.log,
            vec!["enter menu", "core menu", "core menu", "exit menu", "enter play"]
        );
    }

    #[test]
    fn zero_duration_states_collapse_in_one_synchronise() {
        let mut graph: FlowGraph<Ctx> = FlowGraph::new();
        let mut ctx = Ctx::default();
        let a = graph.add_state(Probe::new("a", 1).exit_on_enter(0), true);
        let b = graph.add_state(Probe::new("b", 1).exit_on_enter(0), false);
        let c = graph.add_state(Probe::new("c", 0), false);
        graph.connect(a, b, 0);
        graph.connect(b, c, 0);

        graph.synchronise(&mut ctx);
        assert_eq!(graph.current(), Some(c));
        assert_eq!(ctx.log, vec!["enter a", "exit a", "enter b", "exit b", "enter c"]);
    }

    #[test]
    fn unwired_exit_halts_the_graph() {
        let mut graph: FlowGraph<Ctx> = FlowGraph::new();
        let mut ctx = Ctx::default();
        graph.add_state(Probe::new("end", 1).exit_on_enter(0), true);

        graph.synchronise(&mut ctx);
        assert!(graph.is_halted());
        assert_eq!(graph.current(), None);

        // A halted graph ignores further drives.
        graph.core_update(&mut ctx);
        graph.synchronise(&mut ctx);
        assert_eq!(ctx.log, vec!["enter end", "exit end"]);
    }

    #[test]
    #[should_panic(expected = "already pending")]
    fn double_exit_request_panics() {
        let mut exits = ExitRequest::new(2);
        exits.request(0);
        exits.request(1);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_exit_panics() {
        let mut exits = ExitRequest::new(1);
        exits.request(1);
    }

    #[test]
    #[should_panic(expected = "already wired")]
    fn rewiring_an_exit_panics() {
        let mut graph: FlowGraph<Ctx> = FlowGraph::new();
        let a = graph.add_state(Probe::new("a", 1), true);
        let b = graph.add_state(Probe::new("b", 0), false);
        graph.connect(a, b, 0);
        graph.connect(a, b, 0);
    }
}
