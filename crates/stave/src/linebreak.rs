//! Line breaking.
//!
//! A line breaker partitions the columns of a spaced score into systems. It
//! only talks to the [`SpacingEngine`] through its column queries and its
//! penalty function, so new strategies can be added without touching the
//! engine. The strategy is chosen by [`BreakerKind`].

mod optimal;
mod simple;

pub use optimal::OptimalBreaker;
pub use simple::SimpleBreaker;

use std::ops::RangeInclusive;

use crate::{
    config::{BreakerKind, LineBreakConfig},
    spacing::SpacingEngine,
};

/// Trait implemented by every line-breaking strategy.
pub trait LinesBreaker {
    /// Returns the column range of every system, in score order.
    ///
    /// Every column of the engine appears in exactly one range, and no range
    /// contains a system break before its last column.
    fn break_lines(&self, engine: &SpacingEngine) -> Vec<RangeInclusive<usize>>;
}

/// Creates the breaker selected by the configuration.
pub fn breaker_for(config: &LineBreakConfig) -> Box<dyn LinesBreaker> {
    match config.breaker() {
        BreakerKind::Simple => Box::new(SimpleBreaker::new()),
        BreakerKind::Optimal => Box::new(OptimalBreaker::new(config.justify_last_line())),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use proptest::prelude::*;

    use stave_core::{
        shape::MeasuredShape,
        symbol::{BarlineKind, SymbolEntry, SymbolKind, SymbolTable},
        units::{LUnits, TimeUnits},
    };

    use super::*;
    use crate::config::AppConfig;

    fn meter(entry: &SymbolEntry, _staff: usize) -> MeasuredShape {
        match entry.kind() {
            SymbolKind::Barline(_) => MeasuredShape::new(20.0, 180.0),
            _ => MeasuredShape::new(200.0, 180.0),
        }
    }

    /// A spaced score of `measures` measures of four quarter notes, with a
    /// system break after the measures listed in `breaks`.
    pub(crate) fn score(measures: usize, breaks: &[usize], line_width: LUnits) -> SpacingEngine {
        let mut entries = Vec::new();
        for measure in 0..measures {
            let start = measure as TimeUnits * 256.0;
            for beat in 0..4 {
                entries.push(
                    SymbolEntry::new(start + beat as TimeUnits * 64.0, SymbolKind::Note)
                        .with_duration(64.0),
                );
            }
            entries.push(SymbolEntry::new(
                start + 256.0,
                SymbolKind::Barline(BarlineKind::Simple),
            ));
            if breaks.contains(&measure) {
                entries.push(SymbolEntry::new(start + 256.0, SymbolKind::SystemBreak));
            }
        }

        let table = SymbolTable::from_entries(vec![1], entries).unwrap();
        let config = AppConfig::default()
            .with_line_break(LineBreakConfig::default().with_line_width(line_width));
        let mut engine = SpacingEngine::new(&config, &table, &meter);
        engine.do_spacing();
        engine
    }

    pub(crate) fn check_partition(
        engine: &SpacingEngine,
        lines: &[RangeInclusive<usize>],
    ) -> Result<(), TestCaseError> {
        let mut next = 0;
        for line in lines {
            prop_assert_eq!(*line.start(), next);
            prop_assert!(line.start() <= line.end());
            for column in *line.start()..*line.end() {
                prop_assert!(
                    !engine.has_system_break(column),
                    "system break inside line {:?}",
                    line
                );
            }
            next = line.end() + 1;
        }
        prop_assert_eq!(next, engine.num_columns());
        Ok(())
    }

    #[test]
    fn test_breaker_for_config() {
        let engine = score(6, &[], 3000.0);
        let simple = breaker_for(&LineBreakConfig::default().with_breaker(BreakerKind::Simple));
        let optimal = breaker_for(&LineBreakConfig::default());

        for breaker in [simple, optimal] {
            let lines = breaker.break_lines(&engine);
            assert!(lines.len() > 1);
            check_partition(&engine, &lines).unwrap();
        }
    }

    #[test]
    fn test_empty_score_has_no_lines() {
        let engine = score(0, &[], 3000.0);
        assert!(SimpleBreaker::new().break_lines(&engine).is_empty());
        assert!(OptimalBreaker::new(false).break_lines(&engine).is_empty());
    }

    mod proptest_tests {
        use super::*;

        fn breaks_strategy() -> impl Strategy<Value = (usize, Vec<usize>)> {
            (1usize..12).prop_flat_map(|measures| {
                (
                    Just(measures),
                    prop::collection::vec(0..measures, 0..3),
                )
            })
        }

        proptest! {
            #[test]
            fn test_breakers_partition_columns(
                (measures, breaks) in breaks_strategy(),
                line_width in 1500.0f32..12000.0,
                justify_last_line in any::<bool>(),
            ) {
                let engine = score(measures, &breaks, line_width);
                check_partition(&engine, &SimpleBreaker::new().break_lines(&engine))?;
                check_partition(&engine, &OptimalBreaker::new(justify_last_line).break_lines(&engine))?;
            }
        }
    }
}
