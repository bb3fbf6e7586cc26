//! Frame scheduling and clock capabilities.
//!
//! Everything in the reading core runs on a single cooperative thread. Work
//! that must happen "next frame" is handed to a [`Scheduler`]; the host
//! decides what a frame is (a display refresh, a terminal redraw tick, or an
//! explicit step in a test).

use std::cell::{Cell, RefCell};
use std::time::Instant;

/// Task run once on a future frame; receives the frame time in milliseconds.
pub type TickTask = Box<dyn FnOnce(f64)>;

/// Cancellation handle returned by [`Scheduler::schedule_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

pub trait Scheduler {
    /// Queue `task` for the next frame.
    fn schedule_tick(&self, task: TickTask) -> TickHandle;

    /// Drop a queued task. Unknown or already-run handles are ignored.
    fn cancel(&self, handle: TickHandle);
}

/// Monotonic time source in milliseconds.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Scheduler driven by explicit `run_frame` calls from the host loop.
#[derive(Default)]
pub struct FrameScheduler {
    next_id: Cell<u64>,
    queue: RefCell<Vec<(TickHandle, TickTask)>>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every task queued before this call.
    ///
    /// Tasks scheduled while the frame runs wait for the next frame, so a
    /// self-rescheduling task runs exactly once per frame. Returns the number
    /// of tasks run.
    pub fn run_frame(&self, now_ms: f64) -> usize {
        let due = std::mem::take(&mut *self.queue.borrow_mut());
        let count = due.len();
        for (_, task) in due {
            task(now_ms);
        }
        count
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl Scheduler for FrameScheduler {
    fn schedule_tick(&self, task: TickTask) -> TickHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let handle = TickHandle(id);
        self.queue.borrow_mut().push((handle, task));
        handle
    }

    fn cancel(&self, handle: TickHandle) {
        self.queue.borrow_mut().retain(|(queued, _)| *queued != handle);
    }
}

/// Wall clock measured from construction.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-advanced clock for deterministic stepping.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn set(&self, now_ms: f64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: f64) -> f64 {
        let now = self.now.get() + delta_ms;
        self.now.set(now);
        now
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_run_frame_runs_queued_tasks_once() {
        let scheduler = FrameScheduler::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = seen.clone();
        scheduler.schedule_tick(Box::new(move |now| sink.borrow_mut().push(now)));

        assert_eq!(scheduler.run_frame(16.0), 1);
        assert_eq!(scheduler.run_frame(32.0), 0);
        assert_eq!(*seen.borrow(), vec![16.0]);
    }

    #[test]
    fn test_cancel_removes_task() {
        let scheduler = FrameScheduler::new();
        let ran = Rc::new(Cell::new(false));

        let flag = ran.clone();
        let handle = scheduler.schedule_tick(Box::new(move |_| flag.set(true)));
        scheduler.cancel(handle);
        scheduler.cancel(handle);

        scheduler.run_frame(0.0);
        assert!(!ran.get());
    }

    #[test]
    fn test_task_scheduled_during_frame_waits_for_next_frame() {
        let scheduler = Rc::new(FrameScheduler::new());
        let frames = Rc::new(RefCell::new(Vec::new()));

        let inner_scheduler = scheduler.clone();
        let inner_frames = frames.clone();
        scheduler.schedule_tick(Box::new(move |_| {
            let sink = inner_frames.clone();
            inner_scheduler.schedule_tick(Box::new(move |now| sink.borrow_mut().push(now)));
        }));

        scheduler.run_frame(1.0);
        assert!(frames.borrow().is_empty());
        assert_eq!(scheduler.pending(), 1);

        scheduler.run_frame(2.0);
        assert_eq!(*frames.borrow(), vec![2.0]);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(100.0);
        assert_eq!(clock.advance(50.0), 150.0);
        clock.set(10.0);
        assert_eq!(clock.now_ms(), 10.0);
    }
}
