//! Side-by-side comparison of the scheduling algorithms.
//!
//! Runs DSATUR, Welsh–Powell, and a reduced genetic optimization over the
//! same entity snapshot and reports per-algorithm placement counts. An
//! algorithm failing is captured in its own report and never aborts the
//! others.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::genetic::{generate_genetic, FitnessReport, GeneticParams, GeneticRequest};
use super::graph::{generate_graph_coloring, ColoringStrategy, GraphColoringRequest};
use crate::config::EngineConfig;
use crate::db::TimetableRepository;
use crate::error::EngineResult;

/// Reduced population for comparison runs.
const COMPARE_POPULATION: usize = 20;
/// Reduced generation count for comparison runs.
const COMPARE_GENERATIONS: u32 = 30;

/// Parameters for a comparison run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareRequest {
    pub semester: String,
    pub academic_year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// Outcome of one algorithm within a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmReport {
    pub algorithm: String,
    pub total_slots: usize,
    pub unscheduled: usize,
    /// Scheduled share in percent.
    pub success_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fitness: Option<FitnessReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AlgorithmReport {
    fn failed(algorithm: &str, error: String) -> Self {
        AlgorithmReport {
            algorithm: algorithm.to_string(),
            total_slots: 0,
            unscheduled: 0,
            success_rate: 0.0,
            metadata: None,
            fitness: None,
            error: Some(error),
        }
    }
}

/// Result of a comparison run, one report per algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonOutcome {
    pub reports: Vec<AlgorithmReport>,
}

fn success_rate(total_slots: usize, unscheduled: usize) -> f64 {
    let demand = total_slots + unscheduled;
    if demand == 0 {
        return 100.0;
    }
    total_slots as f64 / demand as f64 * 100.0
}

/// Run all three algorithms over the same inputs.
pub async fn compare_algorithms(
    repo: &dyn TimetableRepository,
    config: &EngineConfig,
    request: &CompareRequest,
) -> EngineResult<ComparisonOutcome> {
    info!(semester = %request.semester, "comparing scheduling algorithms");
    let mut reports = Vec::with_capacity(3);

    for strategy in [ColoringStrategy::Dsatur, ColoringStrategy::WelshPowell] {
        let coloring_request = GraphColoringRequest {
            semester: request.semester.clone(),
            academic_year: request.academic_year.clone(),
            department: request.department.clone(),
            strategy,
        };
        let report = match generate_graph_coloring(repo, config, &coloring_request).await {
            Ok(outcome) => AlgorithmReport {
                algorithm: strategy.to_string(),
                total_slots: outcome.total_slots,
                unscheduled: outcome.unscheduled.len(),
                success_rate: success_rate(outcome.total_slots, outcome.unscheduled.len()),
                metadata: serde_json::to_value(&outcome.metadata).ok(),
                fitness: None,
                error: None,
            },
            Err(err) => {
                warn!(algorithm = %strategy, error = %err, "comparison run failed");
                AlgorithmReport::failed(strategy.as_str(), err.to_string())
            }
        };
        reports.push(report);
    }

    let genetic_request = GeneticRequest {
        semester: request.semester.clone(),
        academic_year: request.academic_year.clone(),
        department: request.department.clone(),
        params: GeneticParams {
            population_size: COMPARE_POPULATION,
            max_generations: COMPARE_GENERATIONS,
            ..Default::default()
        },
    };
    let report = match generate_genetic(repo, config, &genetic_request).await {
        Ok(outcome) => AlgorithmReport {
            algorithm: "genetic".to_string(),
            total_slots: outcome.entries.len(),
            unscheduled: outcome.unschedulable.len(),
            success_rate: success_rate(outcome.entries.len(), outcome.unschedulable.len()),
            metadata: serde_json::to_value(&outcome.metadata).ok(),
            fitness: Some(outcome.fitness),
            error: None,
        },
        Err(err) => {
            warn!(algorithm = "genetic", error = %err, "comparison run failed");
            AlgorithmReport::failed("genetic", err.to_string())
        }
    };
    reports.push(report);

    Ok(ComparisonOutcome { reports })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LocalRepository;
    use crate::models::{Classroom, Course, StudentGroup, Teacher};

    fn request() -> CompareRequest {
        CompareRequest {
            semester: "fall".into(),
            academic_year: "2025-2026".into(),
            department: None,
        }
    }

    #[test]
    fn test_success_rate() {
        assert_eq!(success_rate(0, 0), 100.0);
        assert_eq!(success_rate(3, 1), 75.0);
        assert_eq!(success_rate(0, 4), 0.0);
        assert_eq!(success_rate(5, 0), 100.0);
    }

    #[tokio::test]
    async fn test_reports_cover_all_three_algorithms() {
        let repo = LocalRepository::new();
        repo.seed_teacher(Teacher::new("t1", "Dr. Ada"));
        repo.seed_group(StudentGroup::new("sg1", "CS-1", 30).with_semester("fall"));
        repo.seed_classroom(Classroom::new("cl1", "Room A", 40));
        repo.seed_course(
            Course::new("c1", "Algorithms", "t1")
                .with_semester("fall")
                .with_frequency(2)
                .with_group("sg1"),
        );

        let outcome = compare_algorithms(&repo, &EngineConfig::default(), &request())
            .await
            .unwrap();
        let names: Vec<&str> = outcome.reports.iter().map(|r| r.algorithm.as_str()).collect();
        assert_eq!(names, vec!["dsatur", "welsh-powell", "genetic"]);

        for report in &outcome.reports {
            assert!(report.error.is_none(), "{}: {:?}", report.algorithm, report.error);
            assert_eq!(report.total_slots, 2);
            assert_eq!(report.unscheduled, 0);
            assert_eq!(report.success_rate, 100.0);
            assert!(report.metadata.is_some());
        }
        assert!(outcome.reports[2].fitness.is_some());
        assert!(outcome.reports[0].fitness.is_none());
    }

    #[tokio::test]
    async fn test_empty_snapshot_reports_full_success() {
        let repo = LocalRepository::new();
        let outcome = compare_algorithms(&repo, &EngineConfig::default(), &request())
            .await
            .unwrap();
        for report in &outcome.reports {
            assert_eq!(report.total_slots, 0);
            assert_eq!(report.success_rate, 100.0);
        }
    }

    #[tokio::test]
    async fn test_partial_placement_success_rate() {
        let repo = LocalRepository::new();
        repo.seed_teacher(Teacher::new("t1", "Dr. Ada"));
        repo.seed_group(StudentGroup::new("sg1", "CS-1", 30).with_semester("fall"));
        repo.seed_group(StudentGroup::new("sg2", "Huge", 500).with_semester("fall"));
        repo.seed_classroom(Classroom::new("cl1", "Room A", 40));
        repo.seed_course(
            Course::new("c1", "Algorithms", "t1")
                .with_semester("fall")
                .with_group("sg1")
                .with_group("sg2"),
        );

        let outcome = compare_algorithms(&repo, &EngineConfig::default(), &request())
            .await
            .unwrap();
        for report in &outcome.reports {
            assert_eq!(report.total_slots, 1, "{}", report.algorithm);
            assert_eq!(report.unscheduled, 1, "{}", report.algorithm);
            assert_eq!(report.success_rate, 50.0, "{}", report.algorithm);
        }
    }
}
