//! Universal invariants every generator's output must satisfy: derived
//! end times, classroom capacity, pairwise distinctness of overlapping
//! entries, availability, daily caps, and kernel round-trips.

use timetable_engine::config::EngineConfig;
use timetable_engine::conflict::{check_conflicts, Placement};
use timetable_engine::db::LocalRepository;
use timetable_engine::models::{
    AvailabilityCalendar, Classroom, Course, EntityDirectory, StudentGroup, Teacher, TimeOfDay,
    TimetableEntry, Weekday,
};
use timetable_engine::services::genetic::{generate_genetic, GeneticParams, GeneticRequest};
use timetable_engine::services::graph::{
    generate_graph_coloring, ColoringStrategy, GraphColoringRequest,
};
use timetable_engine::services::greedy::{generate_greedy, GreedyRequest};

fn t(s: &str) -> TimeOfDay {
    s.parse().unwrap()
}

struct Fixture {
    teachers: Vec<Teacher>,
    groups: Vec<StudentGroup>,
    classrooms: Vec<Classroom>,
    courses: Vec<Course>,
}

impl Fixture {
    /// Three teachers, groups, and rooms with assorted calendars; six
    /// weekly sessions in total.
    fn new() -> Self {
        let all_week = |cal: AvailabilityCalendar, days: &[Weekday]| {
            days.iter().fold(cal, |cal, &day| {
                cal.with_window(day, t("09:00"), t("17:00"))
            })
        };

        let teachers = vec![
            // Unavailable on Monday: windows declared for the other days only
            Teacher::new("t1", "Dr. Hamilton").with_calendar(all_week(
                AvailabilityCalendar::unconstrained(),
                &[
                    Weekday::Tuesday,
                    Weekday::Wednesday,
                    Weekday::Thursday,
                    Weekday::Friday,
                    Weekday::Saturday,
                ],
            )),
            Teacher::new("t2", "Dr. Hopper").with_calendar(
                AvailabilityCalendar::unconstrained().with_blackout(
                    Weekday::Wednesday,
                    t("12:00"),
                    t("14:00"),
                ),
            ),
            Teacher::new("t3", "Dr. Dijkstra"),
        ];

        let groups = vec![
            StudentGroup::new("sg1", "CS Year 1", 55).with_semester("fall"),
            StudentGroup::new("sg2", "CS Year 2", 38).with_semester("fall"),
            StudentGroup::new("sg3", "CS Year 3", 24)
                .with_semester("fall")
                .with_calendar(all_week(
                    AvailabilityCalendar::unconstrained(),
                    &[Weekday::Monday, Weekday::Tuesday, Weekday::Wednesday],
                )),
        ];

        let classrooms = vec![
            Classroom::new("cl1", "Lecture Hall A", 120),
            Classroom::new("cl2", "Room 204", 60),
            Classroom::new("cl3", "Seminar Room", 30).with_calendar(
                AvailabilityCalendar::unconstrained().with_blackout(
                    Weekday::Friday,
                    t("09:00"),
                    t("17:00"),
                ),
            ),
        ];

        let courses = vec![
            Course::new("c1", "Algorithms", "t1")
                .with_semester("fall")
                .with_frequency(2)
                .with_duration(90)
                .with_group("sg2"),
            Course::new("c2", "Intro to Programming", "t2")
                .with_semester("fall")
                .with_frequency(2)
                .with_duration(60)
                .with_group("sg1"),
            Course::new("c3", "Operating Systems", "t3")
                .with_semester("fall")
                .with_frequency(2)
                .with_duration(120)
                .with_group("sg3"),
        ];

        Fixture {
            teachers,
            groups,
            classrooms,
            courses,
        }
    }

    fn seed(&self, repo: &LocalRepository) {
        for teacher in &self.teachers {
            repo.seed_teacher(teacher.clone());
        }
        for group in &self.groups {
            repo.seed_group(group.clone());
        }
        for classroom in &self.classrooms {
            repo.seed_classroom(classroom.clone());
        }
        for course in &self.courses {
            repo.seed_course(course.clone());
        }
    }

    fn directory(&self) -> EntityDirectory {
        EntityDirectory::new(
            self.courses.iter().cloned(),
            self.groups.iter().cloned(),
            self.classrooms.iter().cloned(),
            self.teachers.iter().cloned(),
        )
    }

    fn total_sessions(&self) -> usize {
        self.courses
            .iter()
            .map(|c| c.frequency as usize * c.student_group_ids.len())
            .sum()
    }

    fn assert_invariants(&self, entries: &[TimetableEntry], label: &str) {
        let directory = self.directory();
        let config = EngineConfig::default();

        for entry in entries {
            // End time is always derived
            assert_eq!(
                entry.end_time,
                entry.start_time.plus_minutes(entry.duration),
                "{label}: end time not derived for {entry:?}"
            );

            // Capacity
            let group = directory.group(&entry.student_group_id).expect("known group");
            let room = directory.classroom(&entry.classroom_id).expect("known room");
            assert!(
                room.capacity >= group.size,
                "{label}: {} ({}) in undersized {} ({})",
                group.name,
                group.size,
                room.name,
                room.capacity
            );

            // Availability for all three involved entities
            let teacher = directory.teacher(&entry.teacher_id).expect("known teacher");
            for (name, ok) in [
                (
                    "teacher",
                    teacher
                        .calendar
                        .permits(entry.day, entry.start_time, entry.end_time),
                ),
                (
                    "classroom",
                    room.calendar
                        .permits(entry.day, entry.start_time, entry.end_time),
                ),
                (
                    "group",
                    group
                        .calendar
                        .permits(entry.day, entry.start_time, entry.end_time),
                ),
            ] {
                assert!(ok, "{label}: {name} availability violated by {entry:?}");
            }
        }

        // Overlapping same-day pairs differ in all four identifiers
        for (i, a) in entries.iter().enumerate() {
            for b in entries.iter().skip(i + 1) {
                if a.day != b.day
                    || !timetable_engine::models::overlaps(
                        a.start_time,
                        a.end_time,
                        b.start_time,
                        b.end_time,
                    )
                {
                    continue;
                }
                assert_ne!(a.course_id, b.course_id, "{label}: course overlap");
                assert_ne!(a.student_group_id, b.student_group_id, "{label}: group overlap");
                assert_ne!(a.teacher_id, b.teacher_id, "{label}: teacher overlap");
                assert_ne!(a.classroom_id, b.classroom_id, "{label}: classroom overlap");
            }
        }

        // Daily caps
        for day in Weekday::ALL {
            let on_day: Vec<&TimetableEntry> = entries.iter().filter(|e| e.day == day).collect();
            for teacher in &self.teachers {
                let count = on_day.iter().filter(|e| e.teacher_id == teacher.id).count();
                assert!(
                    count as u32 <= config.caps.teacher,
                    "{label}: teacher {} exceeds daily cap on {day}",
                    teacher.id
                );
            }
            for group in &self.groups {
                let count = on_day
                    .iter()
                    .filter(|e| e.student_group_id == group.id)
                    .count();
                assert!(count as u32 <= config.caps.group, "{label}: group cap on {day}");
            }
            for room in &self.classrooms {
                let count = on_day.iter().filter(|e| e.classroom_id == room.id).count();
                assert!(
                    count as u32 <= config.caps.classroom,
                    "{label}: classroom cap on {day}"
                );
            }
        }
    }
}

fn greedy_request() -> GreedyRequest {
    GreedyRequest {
        semester: "fall".into(),
        academic_year: "2025-2026".into(),
        department: None,
        debug: false,
    }
}

#[tokio::test]
async fn greedy_output_upholds_invariants_and_replays_cleanly() {
    let fixture = Fixture::new();
    let repo = LocalRepository::new();
    fixture.seed(&repo);
    let config = EngineConfig::default();

    let outcome = generate_greedy(&repo, &config, &greedy_request()).await.unwrap();
    assert_eq!(outcome.scheduled, fixture.total_sessions());
    assert!(outcome.unscheduled.is_empty());
    fixture.assert_invariants(&outcome.entries, "greedy");

    // Replaying the output one entry at a time through the kernel, with
    // previously accepted entries as the pending set, raises nothing.
    let directory = fixture.directory();
    let mut accepted: Vec<TimetableEntry> = Vec::new();
    for entry in &outcome.entries {
        let placement = Placement {
            course_id: entry.course_id.clone(),
            student_group_id: entry.student_group_id.clone(),
            teacher_id: entry.teacher_id.clone(),
            classroom_id: entry.classroom_id.clone(),
            day: entry.day,
            start: entry.start_time,
            end: entry.end_time,
        };
        let conflicts = check_conflicts(&repo, &placement, None, &accepted, &directory, &config.caps)
            .await
            .unwrap();
        assert!(conflicts.is_empty(), "replay conflict for {entry:?}: {conflicts:?}");
        accepted.push(entry.clone());
    }
}

#[tokio::test]
async fn greedy_is_deterministic() {
    let fixture = Fixture::new();
    let shape = |entries: &[TimetableEntry]| -> Vec<String> {
        entries
            .iter()
            .map(|e| {
                format!(
                    "{}/{}/{} {} {}",
                    e.course_id, e.student_group_id, e.classroom_id, e.day, e.start_time
                )
            })
            .collect()
    };

    let repo = LocalRepository::new();
    fixture.seed(&repo);
    let first = generate_greedy(&repo, &EngineConfig::default(), &greedy_request())
        .await
        .unwrap();

    let repo = LocalRepository::new();
    fixture.seed(&repo);
    let second = generate_greedy(&repo, &EngineConfig::default(), &greedy_request())
        .await
        .unwrap();

    assert_eq!(shape(&first.entries), shape(&second.entries));
}

#[tokio::test]
async fn graph_coloring_output_upholds_invariants() {
    let fixture = Fixture::new();

    for strategy in [ColoringStrategy::WelshPowell, ColoringStrategy::Dsatur] {
        let repo = LocalRepository::new();
        fixture.seed(&repo);

        let outcome = generate_graph_coloring(
            &repo,
            &EngineConfig::default(),
            &GraphColoringRequest {
                semester: "fall".into(),
                academic_year: "2025-2026".into(),
                department: None,
                strategy,
            },
        )
        .await
        .unwrap();

        assert_eq!(
            outcome.total_slots,
            fixture.total_sessions(),
            "{strategy}: {:?}",
            outcome.unscheduled
        );
        assert_eq!(outcome.metadata.total_nodes, fixture.total_sessions());
        fixture.assert_invariants(&outcome.entries, strategy.as_str());
    }
}

#[tokio::test]
async fn genetic_output_upholds_invariants() {
    let fixture = Fixture::new();
    let repo = LocalRepository::new();
    fixture.seed(&repo);

    let outcome = generate_genetic(
        &repo,
        &EngineConfig::default(),
        &GeneticRequest {
            semester: "fall".into(),
            academic_year: "2025-2026".into(),
            department: None,
            params: GeneticParams {
                population_size: 30,
                max_generations: 80,
                seed: Some(2024),
                ..Default::default()
            },
        },
    )
    .await
    .unwrap();

    assert_eq!(outcome.entries.len(), fixture.total_sessions());
    assert!(outcome.unschedulable.is_empty());
    assert_eq!(
        outcome.fitness.hard, 0,
        "optimizer left hard violations: {:?}",
        outcome.fitness
    );
    assert_eq!(
        outcome.fitness.soft, 0,
        "optimizer left availability violations: {:?}",
        outcome.fitness
    );
    fixture.assert_invariants(&outcome.entries, "genetic");
}

#[tokio::test]
async fn generators_skip_undersized_classrooms() {
    // Only one room can hold the group; every algorithm must use it
    let repo = LocalRepository::new();
    repo.seed_teacher(Teacher::new("t1", "Dr. Ada"));
    repo.seed_group(StudentGroup::new("sg1", "CS-1", 80).with_semester("fall"));
    repo.seed_classroom(Classroom::new("small", "Closet", 20));
    repo.seed_classroom(Classroom::new("big", "Hall", 100));
    repo.seed_course(
        Course::new("c1", "Algorithms", "t1")
            .with_semester("fall")
            .with_frequency(2)
            .with_group("sg1"),
    );

    let config = EngineConfig::default();

    let greedy = generate_greedy(&repo, &config, &greedy_request()).await.unwrap();
    assert!(greedy.entries.iter().all(|e| e.classroom_id.value() == "big"));

    for strategy in [ColoringStrategy::WelshPowell, ColoringStrategy::Dsatur] {
        let coloring = generate_graph_coloring(
            &repo,
            &config,
            &GraphColoringRequest {
                semester: "fall".into(),
                academic_year: "2025-2026".into(),
                department: None,
                strategy,
            },
        )
        .await
        .unwrap();
        assert!(coloring.entries.iter().all(|e| e.classroom_id.value() == "big"));
    }

    let genetic = generate_genetic(
        &repo,
        &config,
        &GeneticRequest {
            semester: "fall".into(),
            academic_year: "2025-2026".into(),
            department: None,
            params: GeneticParams {
                population_size: 10,
                max_generations: 10,
                seed: Some(1),
                ..Default::default()
            },
        },
    )
    .await
    .unwrap();
    assert!(genetic.entries.iter().all(|e| e.classroom_id.value() == "big"));
}
