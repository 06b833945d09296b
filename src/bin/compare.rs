//! Algorithm comparison demo binary.
//!
//! Seeds an in-memory repository with a small department and prints the
//! comparator's report as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin tt-compare
//! ```
//!
//! # Environment Variables
//!
//! - `TIMETABLE_START` / `TIMETABLE_END` / `TIMETABLE_STEP`: slot grid
//! - `MAX_TEACHER_DAILY_LECTURES` and friends: daily caps
//! - `RUST_LOG`: log level (default: info)

use std::env;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use timetable_engine::config::EngineConfig;
use timetable_engine::db::LocalRepository;
use timetable_engine::models::{Classroom, Course, StudentGroup, Teacher};
use timetable_engine::services::compare::{compare_algorithms, CompareRequest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(false)
        .init();

    let config = EngineConfig::from_env().map_err(anyhow::Error::msg)?;
    info!(?config, "engine configured");

    let repo = LocalRepository::new();
    seed_demo_department(&repo);

    let request = CompareRequest {
        semester: "fall".to_string(),
        academic_year: "2025-2026".to_string(),
        department: Some("cs".to_string()),
    };
    let outcome = compare_algorithms(&repo, &config, &request).await?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn seed_demo_department(repo: &LocalRepository) {
    for (id, name) in [
        ("t1", "Dr. Hamilton"),
        ("t2", "Dr. Hopper"),
        ("t3", "Dr. Dijkstra"),
    ] {
        repo.seed_teacher(Teacher::new(id, name).with_department("cs"));
    }

    for (id, name, size) in [("sg1", "CS Year 1", 55), ("sg2", "CS Year 2", 38), ("sg3", "CS Year 3", 24)] {
        let mut group = StudentGroup::new(id, name, size).with_semester("fall");
        group.department = Some("cs".to_string());
        repo.seed_group(group);
    }

    for (id, name, capacity) in [
        ("cl1", "Lecture Hall A", 120),
        ("cl2", "Room 204", 60),
        ("cl3", "Seminar Room", 30),
    ] {
        repo.seed_classroom(Classroom::new(id, name, capacity));
    }

    let courses = [
        ("c1", "Algorithms", "t1", "sg2", 2, 90),
        ("c2", "Intro to Programming", "t2", "sg1", 3, 60),
        ("c3", "Operating Systems", "t3", "sg3", 2, 120),
        ("c4", "Discrete Mathematics", "t1", "sg1", 2, 60),
        ("c5", "Compilers", "t3", "sg2", 1, 90),
    ];
    for (id, name, teacher, group, frequency, duration) in courses {
        repo.seed_course(
            Course::new(id, name, teacher)
                .with_semester("fall")
                .with_department("cs")
                .with_frequency(frequency)
                .with_duration(duration)
                .with_group(group),
        );
    }
}
