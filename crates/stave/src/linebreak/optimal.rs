//! Total-fit line breaking.
//!
//! Dynamic programming over break points `0..=n`: `best[j]` is the cheapest
//! way to set columns `0..j` as complete systems. A line `i..j` is built
//! from `best[i]` and costs [`SpacingEngine::determine_penalty_for_line`].
//! For every `j` the candidates are visited from the shortest line to the
//! longest, and a candidate replaces the recorded one only when
//! [`SpacingEngine::is_better_option`] says it is strictly better.

use std::ops::RangeInclusive;

use log::{debug, trace};

use stave_core::units::LUnits;

use super::LinesBreaker;
use crate::spacing::{SpacingEngine, WIDTH_TOLERANCE};

#[derive(Debug, Clone, Copy)]
struct BreakEntry {
    /// Total penalty of the lines up to this break.
    penalty: f32,
    /// Break point where the last line starts.
    predecessor: usize,
    /// Number of systems up to this break.
    systems: usize,
}

/// Minimises the summed line penalties over the whole score.
#[derive(Debug, Default, Clone, Copy)]
pub struct OptimalBreaker {
    justify_last_line: bool,
}

impl OptimalBreaker {
    /// Creates the breaker. Unless `justify_last_line` is set, a last line
    /// that fits costs nothing.
    pub fn new(justify_last_line: bool) -> Self {
        Self { justify_last_line }
    }
}

impl LinesBreaker for OptimalBreaker {
    fn break_lines(&self, engine: &SpacingEngine) -> Vec<RangeInclusive<usize>> {
        let n = engine.num_columns();
        if n == 0 {
            return Vec::new();
        }

        let mut best: Vec<Option<BreakEntry>> = vec![None; n + 1];
        best[0] = Some(BreakEntry {
            penalty: 0.0,
            predecessor: 0,
            systems: 0,
        });

        for j in 1..=n {
            let mut min_width: LUnits = 0.0;
            for i in (0..j).rev() {
                let single = i == j - 1;
                if !single && engine.has_system_break(i) {
                    break;
                }
                min_width += engine.minimum_width(i);

                let Some(start) = best[i] else {
                    continue;
                };
                let line_width = engine.line_width(start.systems);
                let fits = min_width <= line_width + WIDTH_TOLERANCE;
                if !single && !fits {
                    break;
                }

                let penalty = if j == n && !self.justify_last_line && fits {
                    0.0
                } else {
                    engine.determine_penalty_for_line(start.systems, i, j - 1)
                };
                let total = start.penalty + penalty;
                trace!(i, j, penalty, total; "Line candidate");

                let accept = match best[j] {
                    Some(current) => {
                        engine.is_better_option(start.penalty, penalty, current.penalty, i, j)
                    }
                    None => true,
                };
                if accept {
                    best[j] = Some(BreakEntry {
                        penalty: total,
                        predecessor: i,
                        systems: start.systems + 1,
                    });
                }
            }
        }

        let mut lines = Vec::new();
        let mut j = n;
        while j > 0 {
            let Some(entry) = best[j] else {
                break;
            };
            lines.push(entry.predecessor..=j - 1);
            j = entry.predecessor;
        }
        lines.reverse();

        debug!(
            systems = lines.len(),
            penalty = best[n].map_or(0.0, |entry| entry.penalty);
            "Lines broken"
        );
        lines
    }
}
