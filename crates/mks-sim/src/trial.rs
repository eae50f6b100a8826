// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use mks_core::MksError;
use rand::Rng;

/// Where a trial stands after a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrialState {
    /// The task has not truly succeeded yet; draw another episode.
    Retry,
    /// The task succeeded; the trial's elapsed time is final.
    Win,
}

/// Result of drawing one episode inside a trial.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Draw {
    Charged { cost_s: f64, next: TrialState },
    /// The episode is unusable for this run; nothing is charged or tallied.
    Discarded,
}

/// Draw bookkeeping across all trials of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrialCounters {
    pub draws: u64,
    pub discarded: u64,
}

/// Runs one trial: draws until `Win`, summing charged time.
///
/// Fails with `ResourceLimit` once `max_draws` draws (discarded ones included)
/// did not reach a win.
pub fn run_trial<R, F>(
    rng: &mut R,
    max_draws: usize,
    counters: &mut TrialCounters,
    mut draw: F,
) -> Result<f64, MksError>
where
    R: Rng + ?Sized,
    F: FnMut(&mut R) -> Result<Draw, MksError>,
{
    let mut elapsed = 0.0;
    let mut attempts = 0usize;
    let mut state = TrialState::Retry;
    loop {
        match state {
            TrialState::Win => return Ok(elapsed),
            TrialState::Retry => {
                if attempts >= max_draws {
                    return Err(MksError::resource_limit(format!(
                        "trial did not reach a success within {max_draws} draws; \
                         the episode pool may contain no usable success"
                    )));
                }
                attempts += 1;
                match draw(rng)? {
                    Draw::Charged { cost_s, next } => {
                        counters.draws += 1;
                        elapsed += cost_s;
                        state = next;
                    }
                    Draw::Discarded => counters.discarded += 1,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Draw, TrialCounters, TrialState, run_trial};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn sums_costs_until_win() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut counters = TrialCounters::default();
        let mut script = vec![
            Draw::Charged {
                cost_s: 1.5,
                next: TrialState::Retry,
            },
            Draw::Discarded,
            Draw::Charged {
                cost_s: 2.0,
                next: TrialState::Win,
            },
        ]
        .into_iter();
        let elapsed = run_trial(&mut rng, 10, &mut counters, |_| {
            Ok(script.next().expect("script covers every draw"))
        })
        .expect("trial wins");
        assert_eq!(elapsed, 3.5);
        assert_eq!(counters, TrialCounters { draws: 2, discarded: 1 });
    }

    #[test]
    fn draw_cap_turns_endless_retry_into_resource_limit() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut counters = TrialCounters::default();
        let err = run_trial(&mut rng, 25, &mut counters, |_| {
            Ok(Draw::Charged {
                cost_s: 1.0,
                next: TrialState::Retry,
            })
        })
        .expect_err("never wins");
        assert_eq!(err.code(), "resource_limit");
        assert_eq!(counters.draws, 25);
    }
}
