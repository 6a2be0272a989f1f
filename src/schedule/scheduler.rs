use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{Result, ScheduleError};
use crate::footage::FootageIndex;
use crate::schedule::types::{derive_seed, ClipPlacement, Policy};

/// Generates a reproducible, non-overlapping set of clip placements.
pub struct ClipScheduler {
    policy: Policy,
}

impl ClipScheduler {
    pub fn new(policy: Policy) -> Self {
        Self { policy }
    }

    /// Produce the placement list for the given footage.
    ///
    /// Placements are sorted by timeline position unless the policy asks
    /// for shuffle, in which case draw order is kept. An empty result is
    /// valid output when the target length rounds to zero clips.
    pub fn schedule(&self, footage: &FootageIndex) -> Result<Vec<ClipPlacement>> {
        self.check_feasible(footage)?;

        let count = self.policy.placement_count();
        if count == 0 {
            debug!("target length {:.2}s needs no clips", self.policy.total_length);
            return Ok(Vec::new());
        }

        let mut rng = SmallRng::seed_from_u64(derive_seed(&self.policy.seed));
        let gap = self.policy.spacing.min_gap(self.policy.period);

        // The bag starts holding every entry; draws shrink it until the
        // timeline sampler takes over.
        let mut bag: Vec<usize> = (0..footage.len()).collect();
        let mut placements: Vec<ClipPlacement> = Vec::with_capacity(count);

        for _ in 0..count {
            let placement = if bag.is_empty() {
                self.draw_from_timeline(&mut rng, footage, &placements, gap)?
            } else {
                self.draw_from_bag(&mut rng, &mut bag, footage, &placements, gap)?
            };

            debug!(
                "cutting {} at {:.2}s (timeline {:.2}s)",
                placement.source_path.display(),
                placement.source_offset,
                placement.timeline_start
            );
            placements.push(placement);
        }

        if !self.policy.shuffle {
            placements.sort_by(|a, b| a.timeline_start.total_cmp(&b.timeline_start));
        }

        Ok(placements)
    }

    /// Reject policies that can never be satisfied, before any sampling.
    fn check_feasible(&self, footage: &FootageIndex) -> Result<()> {
        if self.policy.period <= 0.0 {
            return Err(ScheduleError::infeasible(format!(
                "period must be positive, got {:.2}s",
                self.policy.period
            ))
            .into());
        }

        let min_duration = footage.min_duration().ok_or_else(|| {
            ScheduleError::infeasible("no footage files to sample from")
        })?;

        if self.policy.period > min_duration {
            return Err(ScheduleError::infeasible(format!(
                "period {:.2}s does not fit in the shortest source file ({:.2}s)",
                self.policy.period, min_duration
            ))
            .into());
        }

        Ok(())
    }

    /// Bag draw: remove one entry at random, then sample an offset inside
    /// it. The offset always satisfies the in-bounds constraint; only the
    /// spacing constraint needs rejection.
    fn draw_from_bag(
        &self,
        rng: &mut SmallRng,
        bag: &mut Vec<usize>,
        footage: &FootageIndex,
        placed: &[ClipPlacement],
        gap: f64,
    ) -> Result<ClipPlacement> {
        let bag_pos = rng.gen_range(0..bag.len());
        let entry = &footage.entries()[bag.swap_remove(bag_pos)];
        let span = entry.duration - self.policy.period;

        for _ in 0..self.policy.max_attempts {
            let offset = uniform(rng, span);
            let timeline_start = entry.start + offset;

            if clear_of(placed, timeline_start, gap) {
                return Ok(ClipPlacement {
                    timeline_start,
                    source_offset: offset,
                    source_path: entry.path.clone(),
                    duration: self.policy.period,
                });
            }
        }

        Err(self.exhausted(placed.len()))
    }

    /// Timeline draw: a uniform point on the virtual timeline, resolved
    /// to the covering entry. Twice-as-long files are twice as likely to
    /// be hit, which is the intended bias once the bag is empty.
    fn draw_from_timeline(
        &self,
        rng: &mut SmallRng,
        footage: &FootageIndex,
        placed: &[ClipPlacement],
        gap: f64,
    ) -> Result<ClipPlacement> {
        let span = footage.total_duration() - self.policy.period;

        for _ in 0..self.policy.max_attempts {
            let timeline_start = uniform(rng, span);
            let entry = match footage.entry_at(timeline_start) {
                Some(entry) => entry,
                None => continue,
            };
            let offset = timeline_start - entry.start;

            if offset + self.policy.period <= entry.duration
                && clear_of(placed, timeline_start, gap)
            {
                return Ok(ClipPlacement {
                    timeline_start,
                    source_offset: offset,
                    source_path: entry.path.clone(),
                    duration: self.policy.period,
                });
            }
        }

        Err(self.exhausted(placed.len()))
    }

    fn exhausted(&self, placed: usize) -> crate::error::CollageError {
        ScheduleError::infeasible(format!(
            "gave up after {} attempts placing clip {} of {}; the footage cannot hold \
             this many non-overlapping {:.2}s clips",
            self.policy.max_attempts,
            placed + 1,
            self.policy.placement_count(),
            self.policy.period,
        ))
        .into()
    }
}

/// Uniform draw on `[0, span)`, degrading to 0 when the span collapses
/// (a clip exactly as long as its source file).
fn uniform(rng: &mut SmallRng, span: f64) -> f64 {
    if span <= 0.0 {
        0.0
    } else {
        rng.gen_range(0.0..span)
    }
}

fn clear_of(placed: &[ClipPlacement], timeline_start: f64, gap: f64) -> bool {
    placed.iter().all(|p| (p.timeline_start - timeline_start).abs() >= gap)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::error::CollageError;
    use crate::schedule::types::Spacing;

    fn index_of(durations: &[f64]) -> FootageIndex {
        let paths: Vec<PathBuf> =
            (0..durations.len()).map(|i| PathBuf::from(format!("clip{i}.mp4"))).collect();
        let mut remaining = durations.to_vec();
        FootageIndex::build(&paths, |_| Ok(remaining.remove(0))).unwrap()
    }

    fn assert_within_sources(placements: &[ClipPlacement], footage: &FootageIndex) {
        for p in placements {
            let entry = footage
                .entries()
                .iter()
                .find(|e| e.path == p.source_path)
                .expect("placement references an indexed file");
            assert!(p.source_offset >= 0.0);
            assert!(
                p.source_end() <= entry.duration + 1e-9,
                "clip runs past the end of {}",
                entry.path.display()
            );
        }
    }

    fn assert_spaced(placements: &[ClipPlacement], gap: f64) {
        for (i, a) in placements.iter().enumerate() {
            for b in placements.iter().skip(i + 1) {
                assert!(
                    (a.timeline_start - b.timeline_start).abs() >= gap - 1e-9,
                    "placements at {:.3} and {:.3} are closer than {:.3}",
                    a.timeline_start,
                    b.timeline_start,
                    gap
                );
            }
        }
    }

    #[test]
    fn test_two_files_twelve_seconds() {
        let footage = index_of(&[10.0, 5.0]);
        let placements =
            ClipScheduler::new(Policy::new(2.0, 12.0)).schedule(&footage).unwrap();

        assert_eq!(placements.len(), 6);
        assert_within_sources(&placements, &footage);
        assert_spaced(&placements, 2.0);

        // Chronological playback order when not shuffling
        for pair in placements.windows(2) {
            assert!(pair[0].timeline_start <= pair[1].timeline_start);
        }
    }

    #[test]
    fn test_every_file_sampled_before_repeats() {
        let footage = index_of(&[30.0, 30.0, 30.0, 30.0]);
        let placements =
            ClipScheduler::new(Policy::new(2.0, 8.0).with_shuffle(true))
                .schedule(&footage)
                .unwrap();

        // 4 draws, 4 files in the bag: each file exactly once
        let mut seen: Vec<_> = placements.iter().map(|p| p.source_path.clone()).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_determinism() {
        let footage = index_of(&[10.0, 5.0, 20.0]);
        let policy = Policy::new(1.5, 10.0).with_seed("fixed");

        let first = ClipScheduler::new(policy.clone()).schedule(&footage).unwrap();
        let second = ClipScheduler::new(policy).schedule(&footage).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_seed_changes_layout() {
        let footage = index_of(&[60.0, 60.0]);

        let a = ClipScheduler::new(Policy::new(2.0, 10.0).with_seed("one"))
            .schedule(&footage)
            .unwrap();
        let b = ClipScheduler::new(Policy::new(2.0, 10.0).with_seed("two"))
            .schedule(&footage)
            .unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_period_longer_than_shortest_file() {
        let footage = index_of(&[1.0]);
        let result = ClipScheduler::new(Policy::new(2.0, 10.0)).schedule(&footage);

        assert!(matches!(
            result,
            Err(CollageError::Schedule(ScheduleError::Infeasible { .. }))
        ));
    }

    #[test]
    fn test_non_positive_period() {
        let footage = index_of(&[10.0]);
        let result = ClipScheduler::new(Policy::new(0.0, 10.0)).schedule(&footage);

        assert!(matches!(
            result,
            Err(CollageError::Schedule(ScheduleError::Infeasible { .. }))
        ));
    }

    #[test]
    fn test_zero_length_yields_empty_schedule() {
        let footage = index_of(&[10.0]);
        let placements =
            ClipScheduler::new(Policy::new(2.0, 0.0)).schedule(&footage).unwrap();

        assert!(placements.is_empty());
    }

    #[test]
    fn test_overfull_schedule_fails_instead_of_hanging() {
        // 5 seconds of footage cannot hold 50 non-overlapping 2s starts.
        let footage = index_of(&[5.0]);
        let policy = Policy::new(2.0, 100.0).with_max_attempts(500);

        let result = ClipScheduler::new(policy).schedule(&footage);
        assert!(matches!(
            result,
            Err(CollageError::Schedule(ScheduleError::Infeasible { .. }))
        ));
    }

    #[test]
    fn test_double_spacing() {
        let footage = index_of(&[120.0, 120.0]);
        let placements = ClipScheduler::new(
            Policy::new(2.0, 16.0).with_spacing(Spacing::DoublePeriod),
        )
        .schedule(&footage)
        .unwrap();

        assert_eq!(placements.len(), 8);
        assert_spaced(&placements, 4.0);
    }

    #[test]
    fn test_ceil_rounds_partial_periods_up() {
        let footage = index_of(&[60.0]);
        let placements =
            ClipScheduler::new(Policy::new(2.0, 13.0)).schedule(&footage).unwrap();

        // ceil(13 / 2) = 7: output may exceed the request by under one period
        assert_eq!(placements.len(), 7);
    }

    #[test]
    fn test_clip_filling_entire_file() {
        // Only one valid offset exists; the degenerate span must not panic.
        let footage = index_of(&[2.0, 50.0]);
        let placements =
            ClipScheduler::new(Policy::new(2.0, 4.0)).schedule(&footage).unwrap();

        assert_eq!(placements.len(), 2);
        assert_within_sources(&placements, &footage);
    }
}
