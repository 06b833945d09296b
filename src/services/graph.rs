//! Graph-coloring timetable generation.
//!
//! Each required session becomes a node; edges join sessions that can
//! never share a time slot (same teacher, same group, or same course).
//! Colors are `(day, start time)` pairs over the configured grid. After
//! coloring, classrooms are assigned in a second pass.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::greedy::UnscheduledSession;
use super::{load_snapshot, session_demands, SessionDemand, Snapshot};
use crate::api::ClassroomId;
use crate::config::EngineConfig;
use crate::db::TimetableRepository;
use crate::error::EngineResult;
use crate::models::{overlaps, Classroom, TimeOfDay, TimetableEntry, Weekday};

/// Node ordering heuristic for the coloring pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColoringStrategy {
    WelshPowell,
    Dsatur,
}

impl ColoringStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColoringStrategy::WelshPowell => "welsh-powell",
            ColoringStrategy::Dsatur => "dsatur",
        }
    }
}

impl fmt::Display for ColoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColoringStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "welsh-powell" | "welsh_powell" | "welshpowell" => Ok(ColoringStrategy::WelshPowell),
            "dsatur" => Ok(ColoringStrategy::Dsatur),
            other => Err(format!(
                "unknown coloring strategy '{}': expected dsatur or welsh-powell",
                other
            )),
        }
    }
}

/// Parameters for a graph-coloring generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphColoringRequest {
    pub semester: String,
    pub academic_year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub strategy: ColoringStrategy,
}

/// Graph statistics reported with the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColoringMetadata {
    pub algorithm: String,
    pub total_nodes: usize,
    pub total_edges: usize,
    pub colors_used: usize,
}

/// Result of a graph-coloring generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColoringOutcome {
    pub entries: Vec<TimetableEntry>,
    pub total_slots: usize,
    pub unscheduled: Vec<UnscheduledSession>,
    pub metadata: ColoringMetadata,
}

/// Session-conflict graph over per-session demand nodes.
struct ConflictGraph {
    demands: Vec<SessionDemand>,
    adjacency: Vec<Vec<usize>>,
    edge_count: usize,
}

impl ConflictGraph {
    /// Connect sessions that must not share a time slot: same teacher,
    /// same student group, or two sessions of the same course.
    fn build(demands: Vec<SessionDemand>) -> Self {
        let n = demands.len();
        let mut adjacency = vec![Vec::new(); n];
        let mut edge_count = 0;

        for i in 0..n {
            for j in (i + 1)..n {
                let a = &demands[i];
                let b = &demands[j];
                let clashes = a.teacher_id == b.teacher_id
                    || a.group_id == b.group_id
                    || a.course_id == b.course_id;
                if clashes {
                    adjacency[i].push(j);
                    adjacency[j].push(i);
                    edge_count += 1;
                }
            }
        }

        ConflictGraph {
            demands,
            adjacency,
            edge_count,
        }
    }

    fn degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }
}

/// Generate a timetable by coloring the session-conflict graph.
pub async fn generate_graph_coloring(
    repo: &dyn TimetableRepository,
    config: &EngineConfig,
    request: &GraphColoringRequest,
) -> EngineResult<ColoringOutcome> {
    let snapshot = load_snapshot(repo, &request.semester, request.department.as_deref()).await?;
    Ok(color_snapshot(&snapshot, config, request))
}

/// Pure coloring pass over an already-loaded snapshot.
pub(crate) fn color_snapshot(
    snapshot: &Snapshot,
    config: &EngineConfig,
    request: &GraphColoringRequest,
) -> ColoringOutcome {
    let demands = session_demands(&snapshot.courses, &snapshot.directory);
    let graph = ConflictGraph::build(demands);
    let palette = color_palette(config);
    info!(
        strategy = %request.strategy,
        nodes = graph.demands.len(),
        edges = graph.edge_count,
        colors = palette.len(),
        "starting graph coloring"
    );

    let coloring = match request.strategy {
        ColoringStrategy::WelshPowell => welsh_powell(&graph, &palette, snapshot, config),
        ColoringStrategy::Dsatur => dsatur(&graph, &palette, snapshot, config),
    };

    let mut entries = Vec::new();
    let mut unscheduled = Vec::new();
    // Intervals already booked per classroom and day within this pass
    let mut room_bookings: HashMap<(ClassroomId, Weekday), Vec<(TimeOfDay, TimeOfDay)>> =
        HashMap::new();

    for (node, demand) in graph.demands.iter().enumerate() {
        let Some(color) = coloring[node] else {
            unscheduled.push(UnscheduledSession {
                course_id: demand.course_id.clone(),
                student_group_id: demand.group_id.clone(),
                session: demand.session_index,
                reasons: vec!["No feasible time slot".to_string()],
            });
            continue;
        };

        let (day, start) = palette[color];
        let end = start.plus_minutes(demand.duration);
        let room = snapshot.classrooms.iter().find(|room| {
            if !fits_room(room, demand, day, start, end) {
                return false;
            }
            match room_bookings.get(&(room.id.clone(), day)) {
                Some(booked) => {
                    booked.len() < config.caps.classroom as usize
                        && !booked.iter().any(|&(s, e)| overlaps(start, end, s, e))
                }
                None => true,
            }
        });

        match room {
            Some(room) => {
                room_bookings
                    .entry((room.id.clone(), day))
                    .or_default()
                    .push((start, end));
                entries.push(TimetableEntry::new(
                    demand.course_id.clone(),
                    demand.group_id.clone(),
                    demand.teacher_id.clone(),
                    room.id.clone(),
                    day,
                    start,
                    demand.duration,
                    request.semester.clone(),
                    request.academic_year.clone(),
                ));
            }
            None => unscheduled.push(UnscheduledSession {
                course_id: demand.course_id.clone(),
                student_group_id: demand.group_id.clone(),
                session: demand.session_index,
                reasons: vec![format!("No classroom available on {} at {}", day, start)],
            }),
        }
    }

    let colors_used = coloring.iter().flatten().collect::<HashSet<_>>().len();
    info!(
        scheduled = entries.len(),
        unscheduled = unscheduled.len(),
        colors_used,
        "graph coloring finished"
    );

    ColoringOutcome {
        total_slots: entries.len(),
        entries,
        unscheduled,
        metadata: ColoringMetadata {
            algorithm: request.strategy.to_string(),
            total_nodes: graph.demands.len(),
            total_edges: graph.edge_count,
            colors_used,
        },
    }
}

/// The `(day, start)` color space in day-major order.
fn color_palette(config: &EngineConfig) -> Vec<(Weekday, TimeOfDay)> {
    let mut palette = Vec::new();
    for day in Weekday::ALL {
        for slot in config.grid.base_slots() {
            palette.push((day, slot));
        }
    }
    palette
}

fn fits_room(
    room: &Classroom,
    demand: &SessionDemand,
    day: Weekday,
    start: TimeOfDay,
    end: TimeOfDay,
) -> bool {
    match demand.required_capacity {
        Some(size) => room.capacity >= size && room.calendar.permits(day, start, end),
        None => false,
    }
}

/// Whether `color` is admissible for `node`.
///
/// Durations are honored end-to-end: a colored neighbor blocks not just
/// its own color but every color whose real interval overlaps it on the
/// same day. Start times that would run past the working window are never
/// feasible, and the slot must be admissible for the node's teacher and
/// group and backed by at least one capacity-qualified, available
/// classroom.
fn color_feasible(
    node: usize,
    color: usize,
    graph: &ConflictGraph,
    palette: &[(Weekday, TimeOfDay)],
    coloring: &[Option<usize>],
    snapshot: &Snapshot,
    config: &EngineConfig,
) -> bool {
    let demand = &graph.demands[node];
    let (day, start) = palette[color];
    if start.minutes() + demand.duration > config.grid.end.minutes() {
        return false;
    }
    let end = start.plus_minutes(demand.duration);

    for &neighbor in &graph.adjacency[node] {
        let Some(neighbor_color) = coloring[neighbor] else {
            continue;
        };
        let (n_day, n_start) = palette[neighbor_color];
        let n_end = n_start.plus_minutes(graph.demands[neighbor].duration);
        if n_day == day && overlaps(start, end, n_start, n_end) {
            return false;
        }
    }

    if let Some(teacher) = snapshot.directory.teacher(&demand.teacher_id) {
        if !teacher.calendar.permits(day, start, end) {
            return false;
        }
    }
    if let Some(group) = snapshot.directory.group(&demand.group_id) {
        if !group.calendar.permits(day, start, end) {
            return false;
        }
    }

    // Daily caps: colored sessions of this teacher/group already on `day`
    let mut teacher_on_day = 0u32;
    let mut group_on_day = 0u32;
    for (other, other_demand) in graph.demands.iter().enumerate() {
        match coloring[other] {
            Some(c) if palette[c].0 == day => {
                if other_demand.teacher_id == demand.teacher_id {
                    teacher_on_day += 1;
                }
                if other_demand.group_id == demand.group_id {
                    group_on_day += 1;
                }
            }
            _ => {}
        }
    }
    if teacher_on_day >= config.caps.teacher || group_on_day >= config.caps.group {
        return false;
    }

    snapshot
        .classrooms
        .iter()
        .any(|room| fits_room(room, demand, day, start, end))
}

fn lowest_feasible_color(
    node: usize,
    graph: &ConflictGraph,
    palette: &[(Weekday, TimeOfDay)],
    coloring: &[Option<usize>],
    snapshot: &Snapshot,
    config: &EngineConfig,
) -> Option<usize> {
    (0..palette.len())
        .find(|&color| color_feasible(node, color, graph, palette, coloring, snapshot, config))
}

/// Welsh–Powell: visit nodes by descending degree, assigning the lowest
/// feasible color to each.
fn welsh_powell(
    graph: &ConflictGraph,
    palette: &[(Weekday, TimeOfDay)],
    snapshot: &Snapshot,
    config: &EngineConfig,
) -> Vec<Option<usize>> {
    let mut order: Vec<usize> = (0..graph.demands.len()).collect();
    order.sort_by(|&a, &b| graph.degree(b).cmp(&graph.degree(a)).then(a.cmp(&b)));

    let mut coloring = vec![None; graph.demands.len()];
    for node in order {
        coloring[node] = lowest_feasible_color(node, graph, palette, &coloring, snapshot, config);
    }
    coloring
}

/// DSATUR: repeatedly color the node with the highest saturation (distinct
/// colors among its colored neighbors), breaking ties by higher degree.
fn dsatur(
    graph: &ConflictGraph,
    palette: &[(Weekday, TimeOfDay)],
    snapshot: &Snapshot,
    config: &EngineConfig,
) -> Vec<Option<usize>> {
    let n = graph.demands.len();
    let mut coloring: Vec<Option<usize>> = vec![None; n];
    let mut saturation: Vec<HashSet<usize>> = vec![HashSet::new(); n];
    let mut remaining: HashSet<usize> = (0..n).collect();

    while !remaining.is_empty() {
        // Highest saturation, then highest degree, then lowest index
        let &node = remaining
            .iter()
            .max_by(|&&a, &&b| {
                saturation[a]
                    .len()
                    .cmp(&saturation[b].len())
                    .then(graph.degree(a).cmp(&graph.degree(b)))
                    .then(b.cmp(&a))
            })
            .expect("remaining is non-empty");
        remaining.remove(&node);

        let color = lowest_feasible_color(node, graph, palette, &coloring, snapshot, config);
        coloring[node] = color;

        if let Some(color) = color {
            for &neighbor in &graph.adjacency[node] {
                if remaining.contains(&neighbor) {
                    saturation[neighbor].insert(color);
                }
            }
        }
    }

    coloring
}
