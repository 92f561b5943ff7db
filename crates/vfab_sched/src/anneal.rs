//! Earliest-deadline-first seeding refined by simulated annealing.
//!
//! The search space is the *order* in which tasks are handed to the greedy
//! first-fit placer. Each move swaps two positions in the order and re-places
//! the whole batch with deadlines enforced. Infeasible neighbours are
//! reverted outright. Feasible ones are accepted with the Metropolis
//! criterion, using completion time (makespan) as the energy.

use crate::error::ScheduleError;
use crate::greedy::{self, PlacementFailure};
use crate::matrix::ScheduleMatrix;
use crate::task::ConfigurationTask;
use crate::{RegionScheduler, ScheduleOutcome};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Default starting temperature.
pub const DEFAULT_TEMPERATURE: f64 = 10_000.0;

/// Default cooling rate; the temperature is multiplied by `1 - rate` per outer iteration.
pub const DEFAULT_COOLING_RATE: f64 = 0.001;

/// Default number of consecutive outer iterations without a new best before stopping.
pub const DEFAULT_ITERATION_THRESHOLD: usize = 6;

/// Annealing stops once the temperature falls to this value.
const MIN_TEMPERATURE: f64 = 1.0;

/// Inner-loop moves per outer iteration, as a divisor of the task count.
const MOVES_DIVISOR: usize = 3;

/// Tuning knobs for [`AnnealingScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnealingParams {
    /// Starting temperature.
    pub temperature: f64,
    /// Fractional temperature decrease per outer iteration.
    pub cooling_rate: f64,
    /// Stall limit: outer iterations without a new best solution.
    pub iteration_threshold: usize,
    /// RNG seed; `None` seeds from system entropy.
    pub seed: Option<u64>,
}

impl Default for AnnealingParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            cooling_rate: DEFAULT_COOLING_RATE,
            iteration_threshold: DEFAULT_ITERATION_THRESHOLD,
            seed: None,
        }
    }
}

/// The spatio-temporal region scheduler.
#[derive(Debug, Clone, Default)]
pub struct AnnealingScheduler {
    params: AnnealingParams,
}

impl AnnealingScheduler {
    /// Creates a scheduler with the given parameters.
    pub fn new(params: AnnealingParams) -> Self {
        Self { params }
    }

    /// Returns the scheduler's parameters.
    pub fn params(&self) -> &AnnealingParams {
        &self.params
    }
}

impl RegionScheduler for AnnealingScheduler {
    fn schedule(
        &self,
        region_count: usize,
        tasks: &[ConfigurationTask],
    ) -> Result<ScheduleOutcome, ScheduleError> {
        if region_count == 0 {
            return Err(ScheduleError::NoRegions);
        }
        let started = Instant::now();

        let mut order = tasks.to_vec();
        order.sort_by_key(|t| t.deadline);
        let t_max = order.iter().map(|t| t.exec_time).sum::<usize>() + 1;

        let seed = greedy::allocate(&order, region_count, t_max, false).map_err(|failure| {
            let task = match failure {
                PlacementFailure::Deadline(id) | PlacementFailure::NoFit(id) => id,
            };
            let required = order
                .iter()
                .find(|t| t.id == task)
                .map_or(0, |t| t.region_count);
            ScheduleError::Unplaceable {
                task,
                required,
                available: region_count,
            }
        })?;
        let initial_completion = seed.completion_time();
        let seed_feasible = seed.meets_deadlines(&order);

        let mut rng = match self.params.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        let mut current_energy = initial_completion;
        let mut best: Option<(ScheduleMatrix, usize)> =
            seed_feasible.then(|| (seed.clone(), initial_completion));

        let n = order.len();
        let moves = n / MOVES_DIVISOR;
        let mut temperature = self.params.temperature;
        let mut stall = 0;
        let mut iterations = 0;

        while temperature > MIN_TEMPERATURE && stall < self.params.iteration_threshold {
            iterations += 1;
            let mut found_best = false;

            for _ in 0..moves {
                let a = rng.gen_range(0..n);
                let b = rng.gen_range(0..n);
                order.swap(a, b);

                let neighbour = match greedy::allocate(&order, region_count, t_max, true) {
                    Ok(m) => m,
                    Err(_) => {
                        order.swap(a, b);
                        continue;
                    }
                };
                let neighbour_energy = neighbour.completion_time();

                let p = acceptance_probability(current_energy, neighbour_energy, temperature);
                if p > rng.gen::<f64>() {
                    current_energy = neighbour_energy;
                    if best.as_ref().map_or(true, |(_, e)| current_energy < *e) {
                        best = Some((neighbour, current_energy));
                        found_best = true;
                    }
                } else {
                    order.swap(a, b);
                }
            }

            if found_best {
                stall = 0;
            } else {
                stall += 1;
            }
            temperature *= 1.0 - self.params.cooling_rate;
        }

        let (solution, deadlines_met) = match best {
            Some((matrix, _)) => (matrix, true),
            None => (seed, false),
        };
        if !deadlines_met {
            log::warn!(
                "no schedule meets every deadline; running the EDF seed ({initial_completion} slots)"
            );
        }

        let outcome = ScheduleOutcome {
            completion_time: solution.completion_time(),
            solution,
            initial_completion_time: initial_completion,
            t_max,
            iterations,
            stall_count: stall,
            duration: started.elapsed(),
            deadlines_met,
        };
        log::debug!(
            "annealing: {} tasks, {} regions, {} -> {} slots after {} iterations",
            n,
            region_count,
            outcome.initial_completion_time,
            outcome.completion_time,
            iterations
        );
        Ok(outcome)
    }
}

/// Metropolis acceptance: always take an improvement, otherwise
/// `exp((current - neighbour) / temperature)`.
fn acceptance_probability(current: usize, neighbour: usize, temperature: f64) -> f64 {
    if neighbour < current {
        1.0
    } else {
        ((current as f64 - neighbour as f64) / temperature).exp()
    }
}
