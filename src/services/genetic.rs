//! Genetic-algorithm timetable optimization.
//!
//! A chromosome is a full candidate schedule, one gene per required
//! session. Fitness runs every gene through the conflict kernel against
//! the rest of its chromosome and penalizes uniqueness violations far
//! harder than availability violations, plus spread terms for day load
//! and teacher workload. Lower is better.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::greedy::UnscheduledSession;
use super::{load_snapshot, session_demands, SessionDemand, Snapshot};
use crate::api::{ClassroomId, CourseId, GroupId, TeacherId};
use crate::config::EngineConfig;
use crate::conflict::{conflicts_for, Placement};
use crate::db::TimetableRepository;
use crate::error::{EngineError, EngineResult};
use crate::models::{TimeOfDay, TimetableEntry, Weekday};

const HARD_PENALTY: f64 = 1000.0;
const SOFT_PENALTY: f64 = 100.0;
const DAY_SPREAD_PENALTY: f64 = 10.0;
const WORKLOAD_PENALTY: f64 = 5.0;
/// Stop after this many stagnant generations once fitness is acceptable.
const STAGNATION_LIMIT: u32 = 20;
const ACCEPTABLE_FITNESS: f64 = 100.0;

/// Evolutionary parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneticParams {
    pub population_size: usize,
    pub max_generations: u32,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub elitism_rate: f64,
    /// Seed for reproducible runs; unseeded runs draw from entropy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GeneticParams {
    fn default() -> Self {
        GeneticParams {
            population_size: 50,
            max_generations: 100,
            mutation_rate: 0.1,
            crossover_rate: 0.8,
            elitism_rate: 0.1,
            seed: None,
        }
    }
}

impl GeneticParams {
    fn validate(&self) -> EngineResult<()> {
        if self.population_size < 2 {
            return Err(EngineError::validation(
                "populationSize must be at least 2",
            ));
        }
        for (name, rate) in [
            ("mutationRate", self.mutation_rate),
            ("crossoverRate", self.crossover_rate),
            ("elitismRate", self.elitism_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(EngineError::validation(format!(
                    "{} must lie in [0, 1], got {}",
                    name, rate
                )));
            }
        }
        Ok(())
    }
}

/// Parameters for a genetic generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneticRequest {
    pub semester: String,
    pub academic_year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default)]
    pub params: GeneticParams,
}

/// One placement within a chromosome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    pub course_id: CourseId,
    pub group_id: GroupId,
    pub teacher_id: TeacherId,
    pub classroom_id: ClassroomId,
    pub day: Weekday,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub duration: u16,
}

type Chromosome = Vec<Gene>;

/// Fitness breakdown for the returned schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessReport {
    pub fitness: f64,
    /// Total conflict count across all genes, caps included.
    pub conflicts: usize,
    /// Uniqueness violations (overlapping shared entities).
    pub hard: usize,
    /// Availability violations.
    pub soft: usize,
}

/// Run statistics reported with the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneticMetadata {
    pub algorithm: String,
    pub generations: u32,
    pub population_size: usize,
}

/// Result of a genetic generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneticOutcome {
    pub entries: Vec<TimetableEntry>,
    pub fitness: FitnessReport,
    pub metadata: GeneticMetadata,
    /// Sessions with no capacity-qualified classroom or admissible slot;
    /// these never enter the population.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unschedulable: Vec<UnscheduledSession>,
}

/// Evolve a timetable for the requested semester.
///
/// The optimizer never fails on inability to improve; it returns the best
/// chromosome seen. Control yields to the runtime between generations.
pub async fn generate_genetic(
    repo: &dyn TimetableRepository,
    config: &EngineConfig,
    request: &GeneticRequest,
) -> EngineResult<GeneticOutcome> {
    request.params.validate()?;
    let snapshot = load_snapshot(repo, &request.semester, request.department.as_deref()).await?;

    let (schedulable, unschedulable) = partition_demands(&snapshot, config);
    info!(
        sessions = schedulable.len(),
        unschedulable = unschedulable.len(),
        population = request.params.population_size,
        "starting genetic optimization"
    );

    if schedulable.is_empty() {
        return Ok(GeneticOutcome {
            entries: Vec::new(),
            fitness: FitnessReport {
                fitness: 0.0,
                conflicts: 0,
                hard: 0,
                soft: 0,
            },
            metadata: GeneticMetadata {
                algorithm: "genetic".to_string(),
                generations: 0,
                population_size: request.params.population_size,
            },
            unschedulable,
        });
    }

    let optimizer = Optimizer::new(&snapshot, config, &request.params, schedulable);
    let mut rng = match request.params.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let (best, report, generations) = optimizer.evolve(&mut rng).await;

    let entries = best
        .iter()
        .map(|gene| {
            TimetableEntry::new(
                gene.course_id.clone(),
                gene.group_id.clone(),
                gene.teacher_id.clone(),
                gene.classroom_id.clone(),
                gene.day,
                gene.start_time,
                gene.duration,
                request.semester.clone(),
                request.academic_year.clone(),
            )
        })
        .collect();

    Ok(GeneticOutcome {
        entries,
        fitness: report,
        metadata: GeneticMetadata {
            algorithm: "genetic".to_string(),
            generations,
            population_size: request.params.population_size,
        },
        unschedulable,
    })
}

/// Split demands into those the optimizer can place and those it cannot.
///
/// Rather than injecting genes with undersized classrooms, sessions with
/// no qualifying room (or no slot fitting their duration) are surfaced.
fn partition_demands(
    snapshot: &Snapshot,
    config: &EngineConfig,
) -> (Vec<SessionDemand>, Vec<UnscheduledSession>) {
    let mut schedulable = Vec::new();
    let mut unschedulable = Vec::new();

    for demand in session_demands(&snapshot.courses, &snapshot.directory) {
        let has_room = demand.required_capacity.is_some_and(|size| {
            snapshot.classrooms.iter().any(|room| room.capacity >= size)
        });
        let has_slot = !config.grid.slots(demand.duration).is_empty();

        if has_room && has_slot {
            schedulable.push(demand);
        } else {
            let reason = if demand.required_capacity.is_none() {
                format!("Student group {} not found", demand.group_id)
            } else if has_slot {
                "No classroom with sufficient capacity".to_string()
            } else {
                "Session duration exceeds the working window".to_string()
            };
            unschedulable.push(UnscheduledSession {
                course_id: demand.course_id,
                student_group_id: demand.group_id,
                session: demand.session_index,
                reasons: vec![reason],
            });
        }
    }

    (schedulable, unschedulable)
}

struct Optimizer<'a> {
    snapshot: &'a Snapshot,
    config: &'a EngineConfig,
    params: &'a GeneticParams,
    demands: Vec<SessionDemand>,
    /// Candidate start times per demand (duration-dependent).
    slots: Vec<Vec<TimeOfDay>>,
    /// Capacity-qualified classroom indices per demand.
    rooms: Vec<Vec<usize>>,
}

impl<'a> Optimizer<'a> {
    fn new(
        snapshot: &'a Snapshot,
        config: &'a EngineConfig,
        params: &'a GeneticParams,
        demands: Vec<SessionDemand>,
    ) -> Self {
        let slots = demands
            .iter()
            .map(|d| config.grid.slots(d.duration))
            .collect();
        let rooms = demands
            .iter()
            .map(|d| {
                let size = d.required_capacity.unwrap_or(u32::MAX);
                snapshot
                    .classrooms
                    .iter()
                    .enumerate()
                    .filter(|(_, room)| room.capacity >= size)
                    .map(|(idx, _)| idx)
                    .collect()
            })
            .collect();

        Optimizer {
            snapshot,
            config,
            params,
            demands,
            slots,
            rooms,
        }
    }

    fn random_gene(&self, index: usize, rng: &mut ChaCha8Rng) -> Gene {
        let demand = &self.demands[index];
        let day = Weekday::ALL[rng.gen_range(0..Weekday::ALL.len())];
        let slots = &self.slots[index];
        let start = slots[rng.gen_range(0..slots.len())];
        let rooms = &self.rooms[index];
        let room = &self.snapshot.classrooms[rooms[rng.gen_range(0..rooms.len())]];

        Gene {
            course_id: demand.course_id.clone(),
            group_id: demand.group_id.clone(),
            teacher_id: demand.teacher_id.clone(),
            classroom_id: room.id.clone(),
            day,
            start_time: start,
            end_time: start.plus_minutes(demand.duration),
            duration: demand.duration,
        }
    }

    fn random_chromosome(&self, rng: &mut ChaCha8Rng) -> Chromosome {
        (0..self.demands.len())
            .map(|i| self.random_gene(i, rng))
            .collect()
    }

    /// Kernel-driven fitness over an in-memory chromosome.
    fn fitness(&self, chromosome: &Chromosome) -> FitnessReport {
        let entries: Vec<TimetableEntry> = chromosome
            .iter()
            .map(|gene| {
                TimetableEntry::new(
                    gene.course_id.clone(),
                    gene.group_id.clone(),
                    gene.teacher_id.clone(),
                    gene.classroom_id.clone(),
                    gene.day,
                    gene.start_time,
                    gene.duration,
                    "",
                    "",
                )
            })
            .collect();

        let mut conflicts = 0;
        let mut hard = 0;
        let mut soft = 0;

        for (i, gene) in chromosome.iter().enumerate() {
            let same_day: Vec<&TimetableEntry> = entries
                .iter()
                .enumerate()
                .filter(|(j, e)| *j != i && e.day == gene.day)
                .map(|(_, e)| e)
                .collect();
            let placement = Placement {
                course_id: gene.course_id.clone(),
                student_group_id: gene.group_id.clone(),
                teacher_id: gene.teacher_id.clone(),
                classroom_id: gene.classroom_id.clone(),
                day: gene.day,
                start: gene.start_time,
                end: gene.end_time,
            };

            let found = conflicts_for(
                &placement,
                &same_day,
                &self.snapshot.directory,
                &self.config.caps,
            );
            conflicts += found.len();
            hard += found.iter().filter(|c| c.kind.is_overlap()).count();
            soft += found.iter().filter(|c| c.kind.is_availability()).count();
        }

        let day_spread = day_count_deviation(chromosome);
        let workload_spread = teacher_workload_deviation(chromosome);
        let fitness = HARD_PENALTY * hard as f64
            + SOFT_PENALTY * soft as f64
            + DAY_SPREAD_PENALTY * day_spread
            + WORKLOAD_PENALTY * workload_spread;

        FitnessReport {
            fitness,
            conflicts,
            hard,
            soft,
        }
    }

    /// Tournament of size 3 over the scored population.
    fn select<'p>(
        &self,
        population: &'p [Chromosome],
        scores: &[FitnessReport],
        rng: &mut ChaCha8Rng,
    ) -> &'p Chromosome {
        let mut best = rng.gen_range(0..population.len());
        for _ in 0..2 {
            let challenger = rng.gen_range(0..population.len());
            if scores[challenger].fitness < scores[best].fitness {
                best = challenger;
            }
        }
        &population[best]
    }

    /// Single-point crossover with probability `crossover_rate`.
    fn crossover(
        &self,
        p1: &Chromosome,
        p2: &Chromosome,
        rng: &mut ChaCha8Rng,
    ) -> (Chromosome, Chromosome) {
        let cut_space = p1.len().min(p2.len());
        if cut_space == 0 || rng.gen::<f64>() >= self.params.crossover_rate {
            return (p1.clone(), p2.clone());
        }
        let cut = rng.gen_range(0..cut_space);

        let child1 = p1[..cut].iter().chain(p2[cut..].iter()).cloned().collect();
        let child2 = p2[..cut].iter().chain(p1[cut..].iter()).cloned().collect();
        (child1, child2)
    }

    /// Per-gene mutation: new start time, new day, or new classroom.
    fn mutate(&self, chromosome: &mut Chromosome, rng: &mut ChaCha8Rng) {
        for (index, gene) in chromosome.iter_mut().enumerate() {
            if rng.gen::<f64>() >= self.params.mutation_rate {
                continue;
            }
            match rng.gen_range(0..3) {
                0 => {
                    let slots = &self.slots[index];
                    gene.start_time = slots[rng.gen_range(0..slots.len())];
                    gene.end_time = gene.start_time.plus_minutes(gene.duration);
                }
                1 => {
                    gene.day = Weekday::ALL[rng.gen_range(0..Weekday::ALL.len())];
                }
                _ => {
                    let rooms = &self.rooms[index];
                    let room = &self.snapshot.classrooms[rooms[rng.gen_range(0..rooms.len())]];
                    gene.classroom_id = room.id.clone();
                }
            }
        }
    }

    /// The generational loop. Returns the best-ever chromosome, its
    /// fitness, and the number of generations executed.
    async fn evolve(&self, rng: &mut ChaCha8Rng) -> (Chromosome, FitnessReport, u32) {
        let mut population: Vec<Chromosome> = (0..self.params.population_size)
            .map(|_| self.random_chromosome(rng))
            .collect();

        let mut best: Option<(Chromosome, FitnessReport)> = None;
        let mut stagnant = 0u32;
        let mut generations = 0u32;

        for generation in 0..self.params.max_generations {
            generations = generation + 1;
            let scores: Vec<FitnessReport> =
                population.iter().map(|c| self.fitness(c)).collect();

            // Rank by ascending fitness
            let mut order: Vec<usize> = (0..population.len()).collect();
            order.sort_by(|&a, &b| {
                scores[a]
                    .fitness
                    .partial_cmp(&scores[b].fitness)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let leader = order[0];
            let improved = match &best {
                Some((_, incumbent)) => scores[leader].fitness < incumbent.fitness,
                None => true,
            };
            if improved {
                best = Some((population[leader].clone(), scores[leader]));
                stagnant = 0;
            } else {
                stagnant += 1;
            }

            let best_fitness = best.as_ref().map(|(_, r)| r.fitness).unwrap_or(f64::MAX);
            debug!(generation, best_fitness, stagnant, "generation evaluated");
            if stagnant >= STAGNATION_LIMIT && best_fitness < ACCEPTABLE_FITNESS {
                break;
            }

            let elite_count = (self.params.population_size as f64 * self.params.elitism_rate)
                .floor() as usize;
            let mut next: Vec<Chromosome> = order
                .iter()
                .take(elite_count)
                .map(|&i| population[i].clone())
                .collect();

            while next.len() < self.params.population_size {
                let p1 = self.select(&population, &scores, rng);
                let p2 = self.select(&population, &scores, rng);
                let (mut c1, mut c2) = self.crossover(p1, p2, rng);
                self.mutate(&mut c1, rng);
                self.mutate(&mut c2, rng);
                next.push(c1);
                if next.len() < self.params.population_size {
                    next.push(c2);
                }
            }
            population = next;

            // Keep long optimizations cooperative
            tokio::task::yield_now().await;
        }

        let (chromosome, report) = match best {
            Some(found) => found,
            None => {
                let fallback = population.remove(0);
                let report = self.fitness(&fallback);
                (fallback, report)
            }
        };
        info!(
            generations,
            fitness = report.fitness,
            hard = report.hard,
            soft = report.soft,
            "genetic optimization finished"
        );
        (chromosome, report, generations)
    }
}

/// Population standard deviation of per-day gene counts over all six days.
fn day_count_deviation(chromosome: &Chromosome) -> f64 {
    let counts: Vec<f64> = Weekday::ALL
        .iter()
        .map(|day| chromosome.iter().filter(|g| g.day == *day).count() as f64)
        .collect();
    std_deviation(&counts)
}

/// Population standard deviation of gene counts grouped by teacher.
fn teacher_workload_deviation(chromosome: &Chromosome) -> f64 {
    let mut per_teacher: HashMap<&TeacherId, f64> = HashMap::new();
    for gene in chromosome {
        *per_teacher.entry(&gene.teacher_id).or_insert(0.0) += 1.0;
    }
    let counts: Vec<f64> = per_teacher.into_values().collect();
    std_deviation(&counts)
}

fn std_deviation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
