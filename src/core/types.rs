//! Core type definitions used throughout the codebase

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for study peers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(pub Uuid);

impl PeerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for study groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub Uuid);

impl GroupId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

/// Task priority levels with explicit ordering values
///
/// Higher numeric value = higher priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Priority {
    Low = 0,
    Medium = 1,
    High = 2,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Perceived difficulty of a piece of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Baseline hours for a task of this difficulty
    pub fn base_hours(&self) -> f64 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 2.0,
            Difficulty::Hard => 3.5,
        }
    }
}

/// How focused the student expects to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusLevel {
    Low,
    Medium,
    High,
}

impl FocusLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusLevel::Low => "low",
            FocusLevel::Medium => "medium",
            FocusLevel::High => "high",
        }
    }

    /// Multiplier applied to estimated hours
    pub fn multiplier(&self) -> f64 {
        match self {
            FocusLevel::Low => 1.3,
            FocusLevel::Medium => 1.0,
            FocusLevel::High => 0.8,
        }
    }
}

/// A unit of coursework tracked by the planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub due_date: NaiveDate,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    /// Hours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<FocusLevel>,
    pub completed: bool,
    pub created_at: NaiveDateTime,
}

impl Task {
    pub fn new(
        name: impl Into<String>,
        due_date: NaiveDate,
        priority: Priority,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: TaskId::new(),
            name: name.into(),
            due_date,
            priority,
            course: None,
            estimated_time: None,
            difficulty: None,
            focus: None,
            completed: false,
            created_at,
        }
    }

    pub fn with_course(mut self, course: impl Into<String>) -> Self {
        self.course = Some(course.into());
        self
    }

    pub fn with_estimate(mut self, hours: f64) -> Self {
        self.estimated_time = Some(hours);
        self
    }
}

/// Category of a calendar entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Study,
    Class,
    Exam,
    Meeting,
    Reminder,
    #[default]
    Event,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Study => "study",
            EventKind::Class => "class",
            EventKind::Exam => "exam",
            EventKind::Meeting => "meeting",
            EventKind::Reminder => "reminder",
            EventKind::Event => "event",
        }
    }
}

/// A single entry on the schedule for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub title: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub priority: Priority,
}

/// Events keyed by date, each day ordered by start time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleMap {
    days: BTreeMap<NaiveDate, Vec<ScheduleEntry>>,
}

impl ScheduleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry for a date, keeping the day ordered by start time
    pub fn merge(&mut self, date: NaiveDate, entry: ScheduleEntry) {
        let day = self.days.entry(date).or_default();
        let pos = day
            .iter()
            .position(|e| e.start_time > entry.start_time)
            .unwrap_or(day.len());
        day.insert(pos, entry);
    }

    pub fn events_on(&self, date: NaiveDate) -> &[ScheduleEntry] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Events between two dates inclusive, in date order
    pub fn events_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<(NaiveDate, &ScheduleEntry)> {
        self.days
            .range(from..=to)
            .flat_map(|(date, events)| events.iter().map(move |e| (*date, e)))
            .collect()
    }

    /// Find the first event whose title matches (case-insensitive substring,
    /// either direction)
    pub fn find_by_title(&self, title: &str) -> Option<(NaiveDate, &ScheduleEntry)> {
        let needle = title.to_lowercase();
        self.days.iter().find_map(|(date, events)| {
            events
                .iter()
                .find(|e| {
                    let t = e.title.to_lowercase();
                    t.contains(&needle) || needle.contains(&t)
                })
                .map(|e| (*date, e))
        })
    }

    /// Remove and return the first event matching `title` on `date`
    pub fn take(&mut self, date: NaiveDate, title: &str) -> Option<ScheduleEntry> {
        let day = self.days.get_mut(&date)?;
        let idx = day.iter().position(|e| e.title == title)?;
        let entry = day.remove(idx);
        if day.is_empty() {
            self.days.remove(&date);
        }
        Some(entry)
    }

    pub fn len(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Another student available for peer study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    pub id: PeerId,
    pub name: String,
    pub courses: Vec<String>,
    pub topics: Vec<String>,
    pub availability: Vec<String>,
}

impl Peer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PeerId::new(),
            name: name.into(),
            courses: Vec::new(),
            topics: Vec::new(),
            availability: Vec::new(),
        }
    }

    pub fn with_course(mut self, course: impl Into<String>) -> Self {
        self.courses.push(course.into());
        self
    }

    pub fn with_availability(mut self, slot: impl Into<String>) -> Self {
        self.availability.push(slot.into());
        self
    }
}

/// A study group students can join
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub course: Option<String>,
    pub members: usize,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GroupId::new(),
            name: name.into(),
            course: None,
            members: 0,
        }
    }

    pub fn with_course(mut self, course: impl Into<String>) -> Self {
        self.course = Some(course.into());
        self
    }
}
