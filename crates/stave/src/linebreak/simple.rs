//! Greedy line filling.

use std::ops::RangeInclusive;

use log::debug;

use super::LinesBreaker;
use crate::spacing::SpacingEngine;

/// Fills each system with columns, at their optimum-force width, while they
/// fit. A column wider than the line gets a system of its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleBreaker;

impl SimpleBreaker {
    pub fn new() -> Self {
        Self
    }
}

impl LinesBreaker for SimpleBreaker {
    fn break_lines(&self, engine: &SpacingEngine) -> Vec<RangeInclusive<usize>> {
        let mut lines = Vec::new();
        let mut first = 0;
        let mut width = 0.0;

        for column in 0..engine.num_columns() {
            let column_width = engine.get_column_width(column);
            if column > first && width + column_width > engine.line_width(lines.len()) {
                lines.push(first..=column - 1);
                first = column;
                width = 0.0;
            }
            width += column_width;

            if engine.has_system_break(column) {
                lines.push(first..=column);
                first = column + 1;
                width = 0.0;
            }
        }
        if first < engine.num_columns() {
            lines.push(first..=engine.num_columns() - 1);
        }

        debug!(systems = lines.len(); "Lines broken greedily");
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linebreak::tests::{check_partition, score};

    #[test]
    fn test_fills_lines_greedily() {
        let engine = score(5, &[], 1.0e6);
        let width = engine.get_column_width(0);
        let narrow = score(5, &[], width * 2.5);

        let lines = SimpleBreaker::new().break_lines(&narrow);
        assert_eq!(lines, vec![0..=1, 2..=3, 4..=4]);
    }

    #[test]
    fn test_single_line_when_everything_fits() {
        let engine = score(5, &[], 1.0e6);
        assert_eq!(SimpleBreaker::new().break_lines(&engine), vec![0..=4]);
    }

    #[test]
    fn test_breaks_at_system_break() {
        let engine = score(5, &[1], 1.0e6);
        let lines = SimpleBreaker::new().break_lines(&engine);
        assert_eq!(lines, vec![0..=1, 2..=4]);
        check_partition(&engine, &lines).unwrap();
    }

    #[test]
    fn test_overwide_column_gets_own_line() {
        let engine = score(3, &[], 100.0);
        assert_eq!(
            SimpleBreaker::new().break_lines(&engine),
            vec![0..=0, 1..=1, 2..=2]
        );
    }
}
