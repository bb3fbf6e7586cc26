// Timing math shared by the pacer and the host status line.

/// Words per second for a words-per-minute speed.
pub fn words_per_second(wpm: u32) -> f64 {
    wpm.max(1) as f64 / 60.0
}

/// Milliseconds one word is on screen at `wpm`; kept fractional.
pub fn word_duration_ms(wpm: u32) -> f64 {
    60_000.0 / wpm.max(1) as f64
}

/// Length of the freeze at a line/paragraph boundary.
///
/// Scales inversely with speed and linearly with the multiplier.
pub fn boundary_pause_ms(wpm: u32, multiplier: f64) -> f64 {
    word_duration_ms(wpm) * multiplier
}

/// Continuous index reached `elapsed_ms` after the anchor.
pub fn index_at(elapsed_ms: f64, wpm: u32) -> f64 {
    elapsed_ms / 1000.0 * words_per_second(wpm)
}

/// Anchor time that places `index` at `now_ms` for the given speed.
pub fn anchor_for(index: f64, now_ms: f64, wpm: u32) -> f64 {
    now_ms - (index / words_per_second(wpm)) * 1000.0
}

/// Whole seconds left to read `remaining_words`, for display.
pub fn remaining_seconds(remaining_words: f64, wpm: u32) -> u64 {
    (remaining_words.max(0.0) / words_per_second(wpm)).ceil() as u64
}
