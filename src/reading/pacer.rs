//! Pacer: converts elapsed time into a continuous word position.
//!
//! State machine: `Stopped -> Playing -> (PausedAtBoundary, nested in
//! Playing) -> Stopped`. While playing, the position is always
//! `(now - anchor) / 1000 * words_per_second`; every seek or speed change
//! recomputes the anchor so the position never jumps.

use crate::engine::config::{validate_pause_multiplier, validate_speed, PacingConfig};
use crate::engine::error::{FlowError, FlowResult};
use crate::engine::scheduler::{Clock, Scheduler, TickHandle};
use crate::engine::timing::{anchor_for, boundary_pause_ms, index_at};
use std::cell::RefCell;
use std::ops::Range;
use std::rc::{Rc, Weak};
use tracing::{debug, info, trace, warn};

/// What the tick callback asks the pacer to do after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickRequest {
    Continue,
    /// Freeze at this word, one of [`TickFrame::crossed`], for one boundary
    /// pause.
    PauseAtBoundary(usize),
    /// Stop and fire the completion signal.
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacerPhase {
    Stopped,
    Playing,
    PausedAtBoundary,
    Destroyed,
}

/// What the tick callback sees for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TickFrame {
    pub index: f64,
    /// Words reached since the previous frame, including the current one. A
    /// slow frame can cover several.
    pub crossed: Range<usize>,
}

impl TickFrame {
    pub fn word(&self) -> usize {
        self.index.floor() as usize
    }
}

pub type ObserverError = Box<dyn std::error::Error>;

type TickCallback = Box<dyn FnMut(&TickFrame) -> TickRequest>;
type CompletionObserver = Box<dyn FnMut() -> Result<(), ObserverError>>;

struct PacerState {
    playing: bool,
    continuous_index: f64,
    anchor_time: f64,
    /// Frame time the boundary pause ends; 0 when not paused.
    pause_until: f64,
    last_paused_word: Option<usize>,
    /// First word not yet offered to the tick callback.
    next_unchecked: usize,
    speed: u32,
    newline_pause_multiplier: f64,
    total_words: usize,
    completed: bool,
    destroyed: bool,
    pending: Option<TickHandle>,
    /// Bumped on every schedule/stop; frames from older loops are ignored.
    generation: u64,
    on_tick: Option<TickCallback>,
    on_complete: Vec<CompletionObserver>,
}

/// Shared handle to one pacing loop. Clones drive the same state.
#[derive(Clone)]
pub struct Pacer {
    state: Rc<RefCell<PacerState>>,
    scheduler: Rc<dyn Scheduler>,
    clock: Rc<dyn Clock>,
}

impl Pacer {
    pub fn new(scheduler: Rc<dyn Scheduler>, clock: Rc<dyn Clock>, config: &PacingConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(PacerState {
                playing: false,
                continuous_index: 0.0,
                anchor_time: 0.0,
                pause_until: 0.0,
                last_paused_word: None,
                next_unchecked: 0,
                speed: config.speed,
                newline_pause_multiplier: config.newline_pause_multiplier,
                total_words: 0,
                completed: false,
                destroyed: false,
                pending: None,
                generation: 0,
                on_tick: None,
                on_complete: Vec::new(),
            })),
            scheduler,
            clock,
        }
    }

    /// Installs the per-frame callback, replacing any previous one.
    pub fn set_tick_callback(&self, callback: impl FnMut(&TickFrame) -> TickRequest + 'static) {
        let mut s = self.state.borrow_mut();
        if !s.destroyed {
            s.on_tick = Some(Box::new(callback));
        }
    }

    /// Adds a completion observer. A failing observer is logged and skipped.
    pub fn on_complete(&self, observer: impl FnMut() -> Result<(), ObserverError> + 'static) {
        let mut s = self.state.borrow_mut();
        if !s.destroyed {
            s.on_complete.push(Box::new(observer));
        }
    }

    pub fn set_total_words(&self, total: usize) {
        self.state.borrow_mut().total_words = total;
    }

    pub fn start(&self, from_index: f64) -> FlowResult<()> {
        {
            let s = self.state.borrow();
            if s.destroyed {
                return Err(FlowError::Destroyed);
            }
            if s.playing {
                return Err(FlowError::AlreadyPlaying);
            }
            validate_seek(from_index, s.total_words)?;
        }

        let now = self.clock.now_ms();
        {
            let mut s = self.state.borrow_mut();
            s.continuous_index = from_index;
            s.anchor_time = anchor_for(from_index, now, s.speed);
            s.pause_until = 0.0;
            s.last_paused_word = None;
            s.next_unchecked = from_index.floor() as usize;
            s.completed = false;
            s.playing = true;
            info!(from = from_index, speed = s.speed, "Pacer started");
        }
        schedule_frame(&self.state, &self.scheduler);
        Ok(())
    }

    /// Stops playback; the position freezes. Safe to call in any state.
    pub fn stop(&self) {
        let mut s = self.state.borrow_mut();
        if let Some(handle) = s.pending.take() {
            self.scheduler.cancel(handle);
        }
        s.generation += 1;
        if s.playing {
            s.playing = false;
            s.pause_until = 0.0;
            debug!(index = s.continuous_index, "Pacer stopped");
        }
    }

    /// Stops if playing, otherwise starts from the current position (from
    /// the beginning once the content was read to the end). Returns whether
    /// the pacer is now playing.
    pub fn toggle(&self) -> FlowResult<bool> {
        let (playing, from) = {
            let s = self.state.borrow();
            let at_end = s.completed || s.continuous_index >= s.total_words as f64;
            (s.playing, if at_end { 0.0 } else { s.continuous_index })
        };

        if playing {
            self.stop();
            Ok(false)
        } else {
            self.start(from)?;
            Ok(true)
        }
    }

    /// Seeks to `index`. While playing the rate is unchanged and any boundary
    /// pause is dropped.
    pub fn jump_to(&self, index: f64) -> FlowResult<()> {
        let now = self.clock.now_ms();
        let mut s = self.state.borrow_mut();
        if s.destroyed {
            return Err(FlowError::Destroyed);
        }
        validate_seek(index, s.total_words)?;
        rebase(&mut s, index, now);
        debug!(index, playing = s.playing, "Pacer jumped");
        Ok(())
    }

    /// Changes the rate from this instant on without moving the position.
    pub fn set_speed(&self, wpm: u32) -> FlowResult<()> {
        let wpm = validate_speed(wpm)?;
        let now = self.clock.now_ms();
        let mut s = self.state.borrow_mut();
        if s.destroyed {
            return Err(FlowError::Destroyed);
        }
        s.speed = wpm;
        let index = s.continuous_index;
        rebase(&mut s, index, now);
        debug!(speed = wpm, index, "Pacer speed changed");
        Ok(())
    }

    pub fn set_newline_pause_multiplier(&self, multiplier: f64) -> FlowResult<()> {
        let multiplier = validate_pause_multiplier(multiplier)?;
        self.state.borrow_mut().newline_pause_multiplier = multiplier;
        Ok(())
    }

    /// Stops and rewinds to the first word; used when content is replaced.
    pub fn reset(&self) {
        self.stop();
        let mut s = self.state.borrow_mut();
        s.continuous_index = 0.0;
        s.last_paused_word = None;
        s.next_unchecked = 0;
        s.completed = false;
    }

    /// Cancels the loop and drops every callback. Idempotent.
    pub fn destroy(&self) {
        let (tick, observers) = {
            let mut s = self.state.borrow_mut();
            if s.destroyed {
                return;
            }
            if let Some(handle) = s.pending.take() {
                self.scheduler.cancel(handle);
            }
            s.generation += 1;
            s.playing = false;
            s.pause_until = 0.0;
            s.destroyed = true;
            (s.on_tick.take(), std::mem::take(&mut s.on_complete))
        };
        drop(tick);
        drop(observers);
        info!("Pacer destroyed");
    }

    pub fn continuous_index(&self) -> f64 {
        self.state.borrow().continuous_index
    }

    /// Word under the cursor, clamped to the content.
    pub fn current_word(&self) -> usize {
        let s = self.state.borrow();
        let word = s.continuous_index.floor() as usize;
        word.min(s.total_words.saturating_sub(1))
    }

    pub fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    pub fn phase(&self) -> PacerPhase {
        let s = self.state.borrow();
        if s.destroyed {
            PacerPhase::Destroyed
        } else if !s.playing {
            PacerPhase::Stopped
        } else if s.pause_until > 0.0 {
            PacerPhase::PausedAtBoundary
        } else {
            PacerPhase::Playing
        }
    }

    pub fn speed(&self) -> u32 {
        self.state.borrow().speed
    }

    pub fn total_words(&self) -> usize {
        self.state.borrow().total_words
    }

    pub fn pause_until(&self) -> f64 {
        self.state.borrow().pause_until
    }

    pub fn last_paused_word(&self) -> Option<usize> {
        self.state.borrow().last_paused_word
    }

    pub fn is_completed(&self) -> bool {
        self.state.borrow().completed
    }
}

fn validate_seek(index: f64, total_words: usize) -> FlowResult<()> {
    if index.is_finite() && index >= 0.0 && index < total_words as f64 {
        Ok(())
    } else {
        Err(FlowError::SeekOutOfRange {
            index,
            total: total_words,
        })
    }
}

/// Moves the position to `index` keeping the rate continuous from `now`.
fn rebase(s: &mut PacerState, index: f64, now: f64) {
    let word = index.floor() as usize;
    s.continuous_index = index;
    s.completed = false;
    if s.last_paused_word == Some(word) {
        s.next_unchecked = word + 1;
    } else {
        s.last_paused_word = None;
        s.next_unchecked = word;
    }
    if s.playing {
        s.anchor_time = anchor_for(index, now, s.speed);
        s.pause_until = 0.0;
    }
}

/// A computed index that is negative or not finite means the anchor was
/// corrupted; fatal in debug builds, pinned to the start otherwise.
fn sanitize_index(value: f64) -> f64 {
    debug_assert!(
        value.is_finite() && value >= 0.0,
        "computed word index {value} is invalid"
    );
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        0.0
    }
}

fn schedule_frame(state: &Rc<RefCell<PacerState>>, scheduler: &Rc<dyn Scheduler>) {
    let generation = {
        let mut s = state.borrow_mut();
        s.generation += 1;
        s.generation
    };
    let weak_state = Rc::downgrade(state);
    let weak_scheduler = Rc::downgrade(scheduler);
    let handle = scheduler.schedule_tick(Box::new(move |now| {
        on_frame(&weak_state, &weak_scheduler, generation, now);
    }));
    state.borrow_mut().pending = Some(handle);
}

fn on_frame(
    state: &Weak<RefCell<PacerState>>,
    scheduler: &Weak<dyn Scheduler>,
    generation: u64,
    now: f64,
) {
    let (Some(state), Some(scheduler)) = (state.upgrade(), scheduler.upgrade()) else {
        return;
    };

    let (previous, frame) = {
        let mut s = state.borrow_mut();
        if s.destroyed || !s.playing || s.generation != generation {
            return;
        }
        s.pending = None;
        let previous = s.continuous_index;

        if s.pause_until > 0.0 {
            if now < s.pause_until {
                drop(s);
                schedule_frame(&state, &scheduler);
                return;
            }
            // Resume from the frozen position, not from the old anchor.
            s.anchor_time = anchor_for(s.continuous_index, now, s.speed);
            s.pause_until = 0.0;
            trace!(index = s.continuous_index, "Boundary pause elapsed");
        } else {
            let computed = sanitize_index(index_at(now - s.anchor_time, s.speed));
            s.continuous_index = computed.max(s.continuous_index);
        }
        let index = s.continuous_index;
        let end = (index.floor() as usize + 1).max(s.next_unchecked);
        let frame = TickFrame {
            index,
            crossed: s.next_unchecked..end,
        };
        (previous, frame)
    };

    match run_tick_callback(&state, &frame) {
        TickRequest::Continue => {}
        TickRequest::PauseAtBoundary(word) => {
            begin_boundary_pause(&state, word, &frame, previous, now)
        }
        TickRequest::Complete => {
            complete(&state, scheduler.as_ref());
            return;
        }
    }
    {
        // Left alone when a pause or a seek from the callback moved it.
        let mut s = state.borrow_mut();
        if s.next_unchecked == frame.crossed.start {
            s.next_unchecked = frame.crossed.end;
        }
    }
    if state.borrow().continuous_index >= state.borrow().total_words as f64 {
        complete(&state, scheduler.as_ref());
        return;
    }

    let reschedule = {
        let s = state.borrow();
        s.playing && s.pending.is_none() && !s.destroyed
    };
    if reschedule {
        schedule_frame(&state, &scheduler);
    }
}

fn run_tick_callback(state: &Rc<RefCell<PacerState>>, frame: &TickFrame) -> TickRequest {
    let Some(mut callback) = state.borrow_mut().on_tick.take() else {
        return TickRequest::Continue;
    };
    // Not borrowed while the callback runs, so it may call back into the pacer.
    let request = callback(frame);

    let mut s = state.borrow_mut();
    if s.on_tick.is_none() && !s.destroyed {
        s.on_tick = Some(callback);
    }
    request
}

/// Pauses at `word`. A word the frame ran past pulls the position back to
/// it, never behind where the previous frame left it.
fn begin_boundary_pause(
    state: &Rc<RefCell<PacerState>>,
    word: usize,
    frame: &TickFrame,
    previous: f64,
    now: f64,
) {
    let mut s = state.borrow_mut();
    if !s.playing || !frame.crossed.contains(&word) || s.last_paused_word == Some(word) {
        return;
    }
    s.last_paused_word = Some(word);
    s.next_unchecked = word + 1;

    let duration = boundary_pause_ms(s.speed, s.newline_pause_multiplier);
    if duration <= 0.0 {
        return;
    }
    if word < frame.word() {
        s.continuous_index = (word as f64).max(previous);
    }
    s.pause_until = now + duration;
    debug!(word, duration_ms = duration, "Boundary pause");
}

fn complete(state: &Rc<RefCell<PacerState>>, scheduler: &dyn Scheduler) {
    let mut observers = {
        let mut s = state.borrow_mut();
        if let Some(handle) = s.pending.take() {
            scheduler.cancel(handle);
        }
        s.generation += 1;
        s.playing = false;
        s.pause_until = 0.0;
        s.continuous_index = s.continuous_index.min(s.total_words as f64);
        if s.completed {
            return;
        }
        s.completed = true;
        std::mem::take(&mut s.on_complete)
    };

    info!(observers = observers.len(), "Pacer reached the end of content");
    for observer in observers.iter_mut() {
        if let Err(err) = observer() {
            warn!(%err, "Completion observer failed");
        }
    }

    let mut s = state.borrow_mut();
    if !s.destroyed {
        observers.append(&mut s.on_complete);
        s.on_complete = observers;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scheduler::{FrameScheduler, ManualClock};
    use std::cell::Cell;

    struct Rig {
        scheduler: Rc<FrameScheduler>,
        clock: Rc<ManualClock>,
        pacer: Pacer,
    }

    impl Rig {
        fn new(speed: u32, total: usize) -> Self {
            let scheduler = Rc::new(FrameScheduler::new());
            let clock = Rc::new(ManualClock::new(0.0));
            let config = PacingConfig {
                speed,
                ..PacingConfig::default()
            };
            let pacer = Pacer::new(scheduler.clone(), clock.clone(), &config);
            pacer.set_total_words(total);
            Self {
                scheduler,
                clock,
                pacer,
            }
        }

        fn frame(&self, now: f64) {
            self.clock.set(now);
            self.scheduler.run_frame(now);
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn pause_on(frame: &TickFrame, word: usize) -> TickRequest {
        if frame.crossed.contains(&word) {
            TickRequest::PauseAtBoundary(word)
        } else {
            TickRequest::Continue
        }
    }

    #[test]
    fn test_rate_is_linear_in_time() {
        let rig = Rig::new(300, 1000);
        rig.pacer.start(0.0).unwrap();

        rig.frame(100.0);
        let t1 = rig.pacer.continuous_index();
        rig.frame(1100.0);
        let t2 = rig.pacer.continuous_index();

        // 300 wpm = 5 words/s
        assert!(approx(t1, 0.5));
        assert!(approx(t2 - t1, 1000.0 / 1000.0 * 5.0));
    }

    #[test]
    fn test_start_from_index_anchors_in_the_past() {
        let rig = Rig::new(600, 1000);
        rig.clock.set(5000.0);
        rig.pacer.start(20.0).unwrap();

        rig.frame(5500.0);
        assert!(approx(rig.pacer.continuous_index(), 25.0));
        assert_eq!(rig.pacer.current_word(), 25);
    }

    #[test]
    fn test_start_validation() {
        let rig = Rig::new(300, 0);
        assert!(matches!(
            rig.pacer.start(0.0),
            Err(FlowError::SeekOutOfRange { total: 0, .. })
        ));

        rig.pacer.set_total_words(10);
        assert!(rig.pacer.start(10.0).is_err());
        assert!(rig.pacer.start(f64::NAN).is_err());
        rig.pacer.start(0.0).unwrap();
        assert!(matches!(rig.pacer.start(0.0), Err(FlowError::AlreadyPlaying)));
    }

    #[test]
    fn test_jump_then_speed_change_keeps_position() {
        let rig = Rig::new(300, 1000);
        rig.pacer.start(0.0).unwrap();
        rig.frame(1000.0);

        rig.pacer.jump_to(40.0).unwrap();
        rig.pacer.set_speed(600).unwrap();
        assert_eq!(rig.pacer.continuous_index(), 40.0);

        // only the rate changed: 600 wpm = 10 words/s
        rig.frame(1500.0);
        assert!(approx(rig.pacer.continuous_index(), 45.0));
    }

    #[test]
    fn test_speed_change_mid_play_has_no_discontinuity() {
        let rig = Rig::new(300, 1000);
        rig.pacer.start(0.0).unwrap();
        rig.frame(2000.0);
        assert!(approx(rig.pacer.continuous_index(), 10.0));

        rig.pacer.set_speed(120).unwrap();
        assert!(approx(rig.pacer.continuous_index(), 10.0));
        rig.frame(2016.0);
        assert!(rig.pacer.continuous_index() - 10.0 < 0.1);
        rig.frame(3000.0);
        // 120 wpm = 2 words/s for one second
        assert!(approx(rig.pacer.continuous_index(), 12.0));
    }

    #[test]
    fn test_jump_out_of_range_is_rejected_without_mutation() {
        let rig = Rig::new(300, 10);
        rig.pacer.jump_to(4.0).unwrap();

        let err = rig.pacer.jump_to(10.0).unwrap_err();
        assert!(matches!(err, FlowError::SeekOutOfRange { total: 10, .. }));
        assert!(rig.pacer.jump_to(-1.0).is_err());
        assert_eq!(rig.pacer.continuous_index(), 4.0);
    }

    #[test]
    fn test_boundary_pause_freezes_for_scaled_duration() {
        let rig = Rig::new(400, 100);
        rig.pacer.set_newline_pause_multiplier(1.5).unwrap();
        rig.pacer
            .set_tick_callback(|frame| pause_on(frame, 3));
        rig.pacer.start(0.0).unwrap();

        // 400 wpm: word 3.2 is reached at 480ms
        rig.frame(480.0);
        let frozen = rig.pacer.continuous_index();
        assert!(approx(frozen, 3.2));
        assert_eq!(rig.pacer.phase(), PacerPhase::PausedAtBoundary);
        assert!(approx(rig.pacer.pause_until(), 480.0 + 225.0));
        assert_eq!(rig.pacer.last_paused_word(), Some(3));

        rig.frame(600.0);
        rig.frame(704.0);
        assert_eq!(rig.pacer.continuous_index(), frozen);

        // resume exactly where it froze, and do not pause on word 3 again
        rig.frame(705.0);
        assert_eq!(rig.pacer.continuous_index(), frozen);
        assert_eq!(rig.pacer.phase(), PacerPhase::Playing);

        rig.frame(855.0);
        assert!(approx(rig.pacer.continuous_index(), frozen + 1.0));
    }

    #[test]
    fn test_slow_frame_still_pauses_at_skipped_boundary() {
        let rig = Rig::new(300, 100);
        rig.pacer.set_tick_callback(|frame| pause_on(frame, 1));
        rig.pacer.start(0.0).unwrap();

        rig.frame(180.0);
        assert!(approx(rig.pacer.continuous_index(), 0.9));

        // one long frame runs from 0.9 to 2.1, straight over word 1
        rig.frame(420.0);
        assert_eq!(rig.pacer.phase(), PacerPhase::PausedAtBoundary);
        assert_eq!(rig.pacer.last_paused_word(), Some(1));
        assert_eq!(rig.pacer.continuous_index(), 1.0);
        assert!(approx(rig.pacer.pause_until(), 420.0 + 400.0));

        rig.frame(819.0);
        assert_eq!(rig.pacer.continuous_index(), 1.0);
        rig.frame(820.0);
        assert_eq!(rig.pacer.phase(), PacerPhase::Playing);
        rig.frame(1020.0);
        assert!(approx(rig.pacer.continuous_index(), 2.0));
    }

    #[test]
    fn test_pause_is_honored_before_completion_in_one_frame() {
        let rig = Rig::new(300, 4);
        rig.pacer.set_tick_callback(|frame| pause_on(frame, 1));
        rig.pacer.start(0.0).unwrap();

        rig.frame(1000.0);
        assert!(!rig.pacer.is_completed());
        assert_eq!(rig.pacer.phase(), PacerPhase::PausedAtBoundary);
        assert_eq!(rig.pacer.continuous_index(), 1.0);
    }

    #[test]
    fn test_crossed_words_are_offered_once() {
        let rig = Rig::new(300, 100);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        rig.pacer.set_tick_callback(move |frame| {
            sink.borrow_mut().push(frame.crossed.clone());
            TickRequest::Continue
        });
        rig.pacer.start(0.0).unwrap();

        rig.frame(100.0);
        rig.frame(150.0);
        rig.frame(700.0);
        assert_eq!(*seen.borrow(), vec![0..1, 1..1, 1..4]);
    }

    #[test]
    fn test_zero_multiplier_never_pauses() {
        let rig = Rig::new(300, 100);
        rig.pacer.set_newline_pause_multiplier(0.0).unwrap();
        rig.pacer
            .set_tick_callback(|frame| TickRequest::PauseAtBoundary(frame.word()));
        rig.pacer.start(0.0).unwrap();

        rig.frame(1000.0);
        assert_eq!(rig.pacer.phase(), PacerPhase::Playing);
        rig.frame(2000.0);
        assert!(approx(rig.pacer.continuous_index(), 10.0));
    }

    #[test]
    fn test_speed_change_during_pause_resumes_without_repausing() {
        let rig = Rig::new(300, 100);
        rig.pacer.set_newline_pause_multiplier(4.0).unwrap();
        rig.pacer.set_tick_callback(|frame| pause_on(frame, 2));
        rig.pacer.start(0.0).unwrap();
        rig.frame(500.0);
        assert_eq!(rig.pacer.phase(), PacerPhase::PausedAtBoundary);

        rig.clock.set(550.0);
        rig.pacer.set_speed(600).unwrap();
        assert_eq!(rig.pacer.phase(), PacerPhase::Playing);

        rig.frame(600.0);
        assert_eq!(rig.pacer.phase(), PacerPhase::Playing);
        // 2.5 + 50ms at 10 words/s
        assert!(approx(rig.pacer.continuous_index(), 3.0));
    }

    #[test]
    fn test_completion_fires_exactly_once() {
        let rig = Rig::new(600, 5);
        let fired = Rc::new(Cell::new(0));
        let sink = fired.clone();
        rig.pacer.on_complete(move || {
            sink.set(sink.get() + 1);
            Ok(())
        });

        rig.pacer.start(0.0).unwrap();
        rig.frame(300.0);
        assert_eq!(fired.get(), 0);
        rig.frame(600.0);
        rig.frame(700.0);
        rig.frame(800.0);

        assert_eq!(fired.get(), 1);
        assert!(!rig.pacer.is_playing());
        assert!(rig.pacer.is_completed());
        assert_eq!(rig.pacer.continuous_index(), 5.0);
        assert_eq!(rig.pacer.current_word(), 4);
        assert_eq!(rig.scheduler.pending(), 0);
    }

    #[test]
    fn test_callback_can_request_completion() {
        let rig = Rig::new(300, 100);
        let fired = Rc::new(Cell::new(0));
        let sink = fired.clone();
        rig.pacer.on_complete(move || {
            sink.set(sink.get() + 1);
            Ok(())
        });
        rig.pacer.set_tick_callback(|_| TickRequest::Complete);

        rig.pacer.start(0.0).unwrap();
        rig.frame(16.0);
        assert_eq!(fired.get(), 1);
        assert!(!rig.pacer.is_playing());
    }

    #[test]
    fn test_failing_observer_does_not_block_others() {
        let rig = Rig::new(600, 2);
        let fired = Rc::new(Cell::new(0));
        rig.pacer.on_complete(|| Err("observer exploded".into()));
        let sink = fired.clone();
        rig.pacer.on_complete(move || {
            sink.set(sink.get() + 1);
            Ok(())
        });

        rig.pacer.start(0.0).unwrap();
        rig.frame(1000.0);
        assert_eq!(fired.get(), 1);

        // observers survive for the next play segment
        rig.pacer.start(0.0).unwrap();
        rig.frame(2000.0);
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn test_toggle_restarts_after_completion() {
        let rig = Rig::new(600, 3);
        assert!(rig.pacer.toggle().unwrap());
        rig.frame(1000.0);
        assert!(rig.pacer.is_completed());

        assert!(rig.pacer.toggle().unwrap());
        assert_eq!(rig.pacer.continuous_index(), 0.0);
        assert!(!rig.pacer.toggle().unwrap());
        assert!(!rig.pacer.is_playing());
    }

    #[test]
    fn test_stop_freezes_and_is_idempotent() {
        let rig = Rig::new(300, 100);
        let ticks = Rc::new(Cell::new(0));
        let sink = ticks.clone();
        rig.pacer.set_tick_callback(move |_| {
            sink.set(sink.get() + 1);
            TickRequest::Continue
        });
        rig.pacer.start(0.0).unwrap();
        rig.frame(1000.0);
        assert_eq!(ticks.get(), 1);

        rig.pacer.stop();
        rig.pacer.stop();
        let frozen = rig.pacer.continuous_index();
        rig.frame(2000.0);
        assert_eq!(ticks.get(), 1);
        assert_eq!(rig.pacer.continuous_index(), frozen);
        assert_eq!(rig.scheduler.pending(), 0);
    }

    #[test]
    fn test_destroy_after_stop_is_silent() {
        let rig = Rig::new(300, 100);
        let calls = Rc::new(Cell::new(0));
        let sink = calls.clone();
        rig.pacer.set_tick_callback(move |_| {
            sink.set(sink.get() + 1);
            TickRequest::Continue
        });
        rig.pacer.start(0.0).unwrap();

        rig.pacer.stop();
        rig.pacer.destroy();
        rig.pacer.destroy();
        rig.pacer.stop();
        rig.frame(1000.0);

        assert_eq!(calls.get(), 0);
        assert_eq!(rig.pacer.phase(), PacerPhase::Destroyed);
        assert!(matches!(rig.pacer.start(0.0), Err(FlowError::Destroyed)));
        assert!(matches!(rig.pacer.jump_to(1.0), Err(FlowError::Destroyed)));
    }

    #[test]
    fn test_destroy_while_playing_cancels_pending_tick() {
        let rig = Rig::new(300, 100);
        rig.pacer.start(0.0).unwrap();
        assert_eq!(rig.scheduler.pending(), 1);

        rig.pacer.destroy();
        assert_eq!(rig.scheduler.pending(), 0);
    }

    #[test]
    fn test_restart_within_frame_runs_one_loop() {
        let rig = Rig::new(300, 1000);
        let ticks = Rc::new(Cell::new(0));
        let sink = ticks.clone();
        rig.pacer.set_tick_callback(move |_| {
            sink.set(sink.get() + 1);
            TickRequest::Continue
        });

        // a task queued ahead of the pacer's tick restarts playback, so the
        // already-dequeued tick from the first loop must do nothing
        let pacer = rig.pacer.clone();
        rig.scheduler.schedule_tick(Box::new(move |_| {
            pacer.stop();
            pacer.start(0.0).unwrap();
        }));
        rig.pacer.start(0.0).unwrap();
        rig.frame(100.0);
        rig.frame(200.0);
        rig.frame(300.0);

        assert_eq!(ticks.get(), 2);
        assert_eq!(rig.scheduler.pending(), 1);
    }

    #[test]
    fn test_index_never_runs_backward_while_playing() {
        let rig = Rig::new(300, 1000);
        rig.pacer.start(0.0).unwrap();
        rig.frame(1000.0);
        let before = rig.pacer.continuous_index();

        rig.scheduler.run_frame(900.0);
        assert!(rig.pacer.continuous_index() >= before);
    }

    #[test]
    fn test_reset_rewinds_and_stops() {
        let rig = Rig::new(300, 100);
        rig.pacer.start(10.0).unwrap();
        rig.frame(1000.0);

        rig.pacer.reset();
        assert!(!rig.pacer.is_playing());
        assert_eq!(rig.pacer.continuous_index(), 0.0);
        assert_eq!(rig.scheduler.pending(), 0);
    }
}
