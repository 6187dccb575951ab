//! Genetic optimizer over strategy genomes.
//!
//! Per generation: Evaluate (rayon-parallel, order-preserving) → Select
//! (tournament) → Recombine (uniform crossover) → Mutate (bounded), with
//! the top elites carried over unmodified. Every stochastic step draws
//! from sequenced, blake3-derived sub-seeds, so the outcome is identical
//! for a given master seed regardless of thread count.

use rand::rngs::StdRng;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use fxlab_core::engine::CancelToken;
use fxlab_core::rng::SeedHierarchy;
use fxlab_core::store::BarStore;
use fxlab_core::strategy::Genome;

use crate::config::RunConfig;
use crate::fitness::FitnessResult;
use crate::runner::run_backtest;

/// Why the evolve loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    GenerationCeiling,
    Plateau,
    Cancelled,
}

/// Per-generation digest surfaced through the progress callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generation: usize,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    /// Every genome whose evaluation failed this generation, so a bad
    /// genome stays identifiable in the history rather than surviving
    /// only as a count.
    pub failed_genomes: Vec<Genome>,
    pub best_genome: Genome,
}

/// The finished evolve run.
#[derive(Debug, Clone)]
pub struct EvolveOutcome {
    pub best: FitnessResult,
    pub generations_run: usize,
    pub stop_reason: StopReason,
    pub history: Vec<GenerationSummary>,
}

pub struct GeneticOptimizer<'a> {
    store: &'a BarStore,
    config: &'a RunConfig,
    cancel: CancelToken,
}

impl<'a> GeneticOptimizer<'a> {
    pub fn new(store: &'a BarStore, config: &'a RunConfig) -> Self {
        Self {
            store,
            config,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the evolve loop to termination. `on_generation` fires once per
    /// completed generation, after evaluation, on the calling thread.
    pub fn evolve(&self, mut on_generation: impl FnMut(&GenerationSummary)) -> EvolveOutcome {
        let opt = &self.config.optimizer;
        let seeds = SeedHierarchy::new(self.config.seed);

        let mut init_rng = seeds.rng_for("population", 0);
        let mut population: Vec<Genome> = (0..opt.population)
            .map(|_| Genome::random(opt.template, &mut init_rng))
            .collect();

        let mut history: Vec<GenerationSummary> = Vec::new();
        let mut best_overall: Option<FitnessResult> = None;
        let mut stagnant = 0usize;
        let mut stop_reason = StopReason::GenerationCeiling;
        let mut generations_run = 0usize;

        for generation in 0..opt.generations {
            let results = self.evaluate(&population);
            generations_run += 1;

            let mut ranked: Vec<usize> = (0..results.len()).collect();
            ranked.sort_by(|&a, &b| {
                results[b]
                    .fitness
                    .partial_cmp(&results[a].fitness)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let best_index = ranked[0];

            let summary = GenerationSummary {
                generation,
                best_fitness: results[best_index].fitness,
                mean_fitness: results.iter().map(|r| r.fitness).sum::<f64>()
                    / results.len() as f64,
                failed_genomes: results
                    .iter()
                    .filter(|r| r.failed)
                    .map(|r| r.genome.clone())
                    .collect(),
                best_genome: results[best_index].genome.clone(),
            };
            on_generation(&summary);
            history.push(summary);

            let improved = match &best_overall {
                Some(best) => results[best_index].fitness > best.fitness,
                None => true,
            };
            if improved {
                best_overall = Some(results[best_index].clone());
                stagnant = 0;
            } else {
                stagnant += 1;
            }

            // Cancellation is observed at generation granularity; the
            // generation that just evaluated is kept.
            if self.cancel.is_cancelled() {
                stop_reason = StopReason::Cancelled;
                break;
            }
            if opt.plateau_generations > 0 && stagnant >= opt.plateau_generations {
                stop_reason = StopReason::Plateau;
                break;
            }
            if generation + 1 == opt.generations {
                break;
            }

            let mut breed_rng = seeds.rng_for("evolve", generation as u64);
            population = self.next_generation(&results, &ranked, &mut breed_rng);
        }

        EvolveOutcome {
            best: best_overall.expect("at least one generation evaluated"),
            generations_run,
            stop_reason,
            history,
        }
    }

    /// Parallel fitness evaluation. `collect` preserves input order, so
    /// the result vector is independent of worker scheduling.
    fn evaluate(&self, population: &[Genome]) -> Vec<FitnessResult> {
        let config_hash = self.config.config_hash();
        population
            .par_iter()
            .map(|genome| {
                run_backtest(self.store, self.config, genome, CancelToken::new())
                    .unwrap_or_else(|_| FitnessResult::failure(genome.clone(), config_hash.clone()))
            })
            .collect()
    }

    fn next_generation(
        &self,
        results: &[FitnessResult],
        ranked: &[usize],
        rng: &mut StdRng,
    ) -> Vec<Genome> {
        let opt = &self.config.optimizer;
        let mut next = Vec::with_capacity(opt.population);

        // Elites survive unmodified.
        for &index in ranked.iter().take(opt.elitism) {
            next.push(results[index].genome.clone());
        }

        while next.len() < opt.population {
            let a = self.tournament(results, rng);
            let b = self.tournament(results, rng);
            let mut child = if rng.gen_bool(opt.crossover_rate) {
                // Parents share a template by construction.
                Genome::crossover(&results[a].genome, &results[b].genome, rng)
                    .unwrap_or_else(|_| results[a].genome.clone())
            } else {
                results[a].genome.clone()
            };
            child.mutate(opt.mutation_rate, rng);
            next.push(child);
        }
        next
    }

    /// Index of the fittest of `tournament_size` uniformly drawn entrants.
    fn tournament(&self, results: &[FitnessResult], rng: &mut StdRng) -> usize {
        let opt = &self.config.optimizer;
        let mut best = rng.gen_range(0..results.len());
        for _ in 1..opt.tournament_size {
            let challenger = rng.gen_range(0..results.len());
            if results[challenger].fitness > results[best].fitness {
                best = challenger;
            }
        }
        best
    }
}
