// Bionic emphasis: bold the leading half of every alphabetic run.

use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

/// Runs this short or shorter are left plain.
const MIN_EMPHASIS_RUN: usize = 3;

/// Byte ranges of `word` to emphasize.
///
/// Each alphabetic run of more than two graphemes gets its first
/// `ceil(len / 2)` graphemes marked. HTML entities (`&amp;`) never count as
/// part of a run.
pub fn emphasis_ranges(word: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut run: Vec<(usize, usize)> = Vec::new();
    let mut skip_until = 0;

    for (offset, grapheme) in word.grapheme_indices(true) {
        if offset < skip_until {
            continue;
        }

        if grapheme == "&" {
            if let Some(len) = entity_len(&word[offset..]) {
                close_run(&mut run, &mut ranges);
                skip_until = offset + len;
                continue;
            }
        }

        if is_alphabetic(grapheme) {
            run.push((offset, offset + grapheme.len()));
        } else {
            close_run(&mut run, &mut ranges);
        }
    }
    close_run(&mut run, &mut ranges);

    ranges
}

fn close_run(run: &mut Vec<(usize, usize)>, ranges: &mut Vec<Range<usize>>) {
    if run.len() >= MIN_EMPHASIS_RUN {
        let lead = run.len().div_ceil(2);
        ranges.push(run[0].0..run[lead - 1].1);
    }
    run.clear();
}

fn is_alphabetic(grapheme: &str) -> bool {
    grapheme.chars().next().is_some_and(char::is_alphabetic)
}

/// Length of an entity such as `&amp;` or `&#8212;` at the start of `s`.
fn entity_len(s: &str) -> Option<usize> {
    let end = s.char_indices().take(12).find(|&(_, c)| c == ';')?.0;
    let body = &s[1..end];
    let valid = !body.is_empty()
        && body
            .chars()
            .enumerate()
            .all(|(i, c)| c.is_ascii_alphanumeric() || (i == 0 && c == '#'));
    valid.then_some(end + 1)
}
