//! The frame loop, threaded and single-threaded.
//!
//! ## The baton protocol
//!
//! The pipeline state is split in two. The [`Phases`] object is the
//! simulation half; the threaded scheduler keeps it on the simulation
//! thread and never shares it. The [`RenderFrame`] is the render half;
//! it is the only state both threads touch, and two semaphores pass it
//! back and forth like a baton:
//!
//! - `render_ready` (initially 1): a permit means the render thread is
//!   done with the last committed frame, so Synchronise may write it.
//! - `update_ready` (initially 0): a permit means Synchronise has
//!   committed a fresh frame, so the render thread may read it.
//!
//! The simulation thread runs `Core; acquire(render_ready);
//! Synchronise(frame); release(update_ready)` per frame; the render
//! thread runs `acquire(update_ready); Render(frame);
//! release(render_ready)`. The initial permit on `render_ready` lets the
//! very first Synchronise through, and the render thread blocks until
//! that first commit. From then on Core for frame N+1 overlaps Render
//! for frame N - which is fine, because Core only has the simulation
//! half and Render only has the frame. The frame itself is never
//! borrowed on both threads at once: exactly one permit (or one live
//! borrow) exists in the system at any moment, so the semaphore pair is
//! a hand-off mutex over the frame cell.

#![allow(unsafe_code)]

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, TryRecvError};
use tracing::info;

use super::semaphore::Semaphore;

/// The simulation half of a frame pipeline, as driven by the
/// [`Scheduler`].
///
/// In threaded mode this object stays on the simulation thread for the
/// whole run. The associated [`RenderFrame`] is the only state that
/// crosses to the render thread, and `synchronise` is the only place
/// the simulation may touch it: commit everything the next Render needs
/// into the frame there, because Core runs without it.
pub trait Phases: Send {
    /// The render half: the renderer plus whatever Synchronise commits.
    type Frame: RenderFrame;

    /// Simulation logic for the next frame.
    fn core_update(&mut self);

    /// Commit point: the one place with both halves in hand.
    fn synchronise(&mut self, frame: &mut Self::Frame);
}

/// The render half of a frame pipeline.
///
/// In threaded mode the frame lives in the baton cell and is borrowed
/// only under a semaphore permit, alternating between Synchronise on
/// the simulation thread and `render_update` on the render thread.
pub trait RenderFrame: Send {
    /// Draws the last committed frame.
    fn render_update(&mut self);
}

struct Baton<F> {
    frame: UnsafeCell<F>,
    render_ready: Semaphore,
    update_ready: Semaphore,
    quitting: AtomicBool,
}

// SAFETY: the cell is only dereferenced while holding a semaphore
// permit - render_ready on the simulation thread, update_ready on the
// render thread. The permits plus the live borrows always sum to one,
// so the two `&mut` can never coexist, and the semaphore's internal
// lock orders each hand-off.
unsafe impl<F: Send> Sync for Baton<F> {}

/// Runs a [`Phases`] implementation until told to quit.
pub struct Scheduler;

impl Scheduler {
    /// Runs the pipelined two-thread frame loop on the calling thread,
    /// with Render on a spawned thread.
    ///
    /// Returns both halves once the render thread has joined. Any
    /// message (or a disconnect) on `quit` ends the loop after the
    /// current frame.
    ///
    /// # Panics
    ///
    /// Panics if the render thread cannot be spawned or panicked.
    pub fn run_threaded<P>(mut phases: P, frame: P::Frame, quit: &Receiver<()>) -> (P, P::Frame)
    where
        P: Phases,
        P::Frame: 'static,
    {
        let baton = Arc::new(Baton {
            frame: UnsafeCell::new(frame),
            render_ready: Semaphore::new(1),
            update_ready: Semaphore::new(0),
            quitting: AtomicBool::new(false),
        });

        info!("frame loop starting (threaded)");
        let render_thread = {
            let baton = Arc::clone(&baton);
            let spawned = thread::Builder::new().name("render".into()).spawn(move || loop {
                baton.update_ready.acquire();
                if baton.quitting.load(Ordering::Acquire) {
                    break;
                }
                // SAFETY: we hold the update_ready permit; the borrow
                // ends before render_ready is handed back.
                unsafe { (*baton.frame.get()).render_update() };
                baton.render_ready.release();
            });
            match spawned {
                Ok(handle) => handle,
                Err(e) => panic!("failed to spawn render thread: {e}"),
            }
        };

        loop {
            match quit.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }
            // Core holds only the simulation half, so it may overlap an
            // in-flight render.
            phases.core_update();
            baton.render_ready.acquire();
            // SAFETY: we hold the render_ready permit; the borrow ends
            // before update_ready is handed over.
            unsafe { phases.synchronise(&mut *baton.frame.get()) };
            baton.update_ready.release();
        }

        baton.quitting.store(true, Ordering::Release);
        baton.update_ready.release();
        if render_thread.join().is_err() {
            panic!("render thread panicked");
        }
        info!("frame loop stopped");

        let Ok(baton) = Arc::try_unwrap(baton) else {
            panic!("render thread leaked a baton handle");
        };
        (phases, baton.frame.into_inner())
    }

    /// Runs all three phases on the calling thread, one frame at a time.
    /// Same phase order and quit handling as the threaded mode, with no
    /// pipelining.
    pub fn run_single_threaded<P: Phases>(
        phases: &mut P,
        frame: &mut P::Frame,
        quit: &Receiver<()>,
    ) {
        info!("frame loop starting (single-threaded)");
        loop {
            match quit.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }
            phases.core_update();
            phases.synchronise(frame);
            frame.render_update();
        }
        info!("frame loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{bounded, Sender};
    use parking_lot::Mutex;
    use std::time::Duration;

    struct Sim {
        log: Arc<Mutex<Vec<(&'static str, u32)>>>,
        frame: u32,
        frames_to_run: u32,
        quit_tx: Sender<()>,
    }

    struct Frame {
        log: Arc<Mutex<Vec<(&'static str, u32)>>>,
        rendered: u32,
    }

    impl Phases for Sim {
        type Frame = Frame;

        fn core_update(&mut self) {
            self.frame += 1;
            self.log.lock().push(("core", self.frame));
            if self.frame == self.frames_to_run {
                let _ = self.quit_tx.send(());
            }
        }

        fn synchronise(&mut self, _frame: &mut Frame) {
            self.log.lock().push(("sync", self.frame));
        }
    }

    impl RenderFrame for Frame {
        fn render_update(&mut self) {
            self.rendered += 1;
            self.log.lock().push(("render", self.rendered));
        }
    }

    type Log = Arc<Mutex<Vec<(&'static str, u32)>>>;

    fn pair(frames_to_run: u32, quit_tx: Sender<()>) -> (Sim, Frame, Log) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sim = Sim { log: Arc::clone(&log), frame: 0, frames_to_run, quit_tx };
        let frame = Frame { log: Arc::clone(&log), rendered: 0 };
        (sim, frame, log)
    }

    fn position(log: &[(&'static str, u32)], entry: (&'static str, u32)) -> Option<usize> {
        log.iter().position(|&e| e == entry)
    }

    #[test]
    fn threaded_loop_honours_the_baton_ordering() {
        let (quit_tx, quit_rx) = bounded(1);
        let (sim, frame, log) = pair(20, quit_tx);

        let (sim, _frame) = Scheduler::run_threaded(sim, frame, &quit_rx);
        assert_eq!(sim.frame, 20);

        let log = log.lock();
        for k in 1.. {
            // Render K strictly after the synchronise that committed
            // frame K.
            let Some(render_k) = position(&log, ("render", k)) else { break };
            let sync_k = position(&log, ("sync", k));
            assert!(sync_k.is_some_and(|s| s < render_k), "render {k} before its commit");
            // And strictly before the next commit.
            if let Some(sync_next) = position(&log, ("sync", k + 1)) {
                assert!(render_k < sync_next, "synchronise {} overtook render {k}", k + 1);
            }
        }
    }

    #[test]
    fn frame_borrows_never_overlap_across_threads() {
        struct ExclusionSim {
            in_sync: Arc<AtomicBool>,
            in_render: Arc<AtomicBool>,
            overlap: Arc<AtomicBool>,
            frame: u32,
            quit_tx: Sender<()>,
        }

        struct ExclusionFrame {
            in_sync: Arc<AtomicBool>,
            in_render: Arc<AtomicBool>,
            overlap: Arc<AtomicBool>,
        }

        impl Phases for ExclusionSim {
            type Frame = ExclusionFrame;

            fn core_update(&mut self) {
                self.frame += 1;
                if self.frame == 300 {
                    let _ = self.quit_tx.send(());
                }
            }

            fn synchronise(&mut self, _frame: &mut ExclusionFrame) {
                if self.in_render.load(Ordering::SeqCst) {
                    self.overlap.store(true, Ordering::SeqCst);
                }
                self.in_sync.store(true, Ordering::SeqCst);
                thread::sleep(Duration::from_micros(200));
                if self.in_render.load(Ordering::SeqCst) {
                    self.overlap.store(true, Ordering::SeqCst);
                }
                self.in_sync.store(false, Ordering::SeqCst);
            }
        }

        impl RenderFrame for ExclusionFrame {
            fn render_update(&mut self) {
                if self.in_sync.load(Ordering::SeqCst) {
                    self.overlap.store(true, Ordering::SeqCst);
                }
                self.in_render.store(true, Ordering::SeqCst);
                thread::sleep(Duration::from_micros(200));
                if self.in_sync.load(Ordering::SeqCst) {
                    self.overlap.store(true, Ordering::SeqCst);
                }
                self.in_render.store(false, Ordering::SeqCst);
            }
        }

        let (quit_tx, quit_rx) = bounded(1);
        let in_sync = Arc::new(AtomicBool::new(false));
        let in_render = Arc::new(AtomicBool::new(false));
        let overlap = Arc::new(AtomicBool::new(false));
        let sim = ExclusionSim {
            in_sync: Arc::clone(&in_sync),
            in_render: Arc::clone(&in_render),
            overlap: Arc::clone(&overlap),
            frame: 0,
            quit_tx,
        };
        let frame = ExclusionFrame { in_sync, in_render, overlap: Arc::clone(&overlap) };

        let _ = Scheduler::run_threaded(sim, frame, &quit_rx);
        assert!(
            !overlap.load(Ordering::SeqCst),
            "a frame borrow was live on both threads at once"
        );
    }

    #[test]
    fn single_threaded_loop_interleaves_phases() {
        let (quit_tx, quit_rx) = bounded(1);
        let (mut sim, mut frame, log) = pair(3, quit_tx);

        Scheduler::run_single_threaded(&mut sim, &mut frame, &quit_rx);
        assert_eq!(sim.frame, 3);
        assert_eq!(frame.rendered, 3);
        assert_eq!(
            *log.lock(),
            vec![
                ("core", 1),
                ("sync", 1),
                ("render", 1),
                ("core", 2),
                ("sync", 2),
                ("render", 2),
                ("core", 3),
                ("sync", 3),
                ("render", 3),
            ]
        );
    }

    #[test]
    fn dropped_quit_sender_ends_the_loop() {
        let (quit_tx, quit_rx) = bounded::<()>(1);
        drop(quit_tx);
        let (noop_tx, _noop_rx) = bounded(1);
        let (mut sim, mut frame, _log) = pair(u32::MAX, noop_tx);
        Scheduler::run_single_threaded(&mut sim, &mut frame, &quit_rx);
        assert_eq!(sim.frame, 0);
    }
}
