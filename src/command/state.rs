//! Application state the dispatcher reads and mutates
//!
//! The host owns the canonical task list, schedule, peers and groups. The
//! dispatcher only reads them through [`AppState`] and requests changes
//! through its mutation callbacks.

use crate::command::result::{Modal, UiStep, UiTransition, View};
use crate::core::error::{AssistError, Result};
use crate::core::types::{Group, GroupId, Peer, PeerId, ScheduleEntry, ScheduleMap, Task, TaskId};
use chrono::NaiveDate;

pub trait AppState: Send {
    fn tasks(&self) -> &[Task];
    fn schedule(&self) -> &ScheduleMap;
    fn peers(&self) -> &[Peer];
    fn groups(&self) -> &[Group];

    fn append_task(&mut self, task: Task) -> Result<()>;
    /// Replace the task with the same id
    fn update_task(&mut self, task: Task) -> Result<()>;
    fn complete_task(&mut self, id: TaskId) -> Result<()>;
    fn merge_schedule_entry(&mut self, date: NaiveDate, entry: ScheduleEntry) -> Result<()>;
    fn take_schedule_entry(&mut self, date: NaiveDate, title: &str) -> Result<ScheduleEntry>;

    fn select_task(&mut self, id: TaskId) -> Result<()>;
    fn select_peer(&mut self, id: PeerId) -> Result<()>;
    fn select_group(&mut self, id: GroupId) -> Result<()>;
    fn open_view(&mut self, view: View) -> Result<()>;
    fn open_modal(&mut self, modal: Modal) -> Result<()>;

    /// Perform a transition returned in an action result
    fn apply(&mut self, transition: &UiTransition) -> Result<()> {
        match transition.step {
            UiStep::OpenView { view } => self.open_view(view),
            UiStep::OpenModal { modal } => self.open_modal(modal),
            UiStep::SelectTask { task_id } => self.select_task(task_id),
            UiStep::SelectPeer { peer_id } => self.select_peer(peer_id),
            UiStep::SelectGroup { group_id } => self.select_group(group_id),
        }
    }
}

/// Plain in-memory state, used by the REPL and in tests
#[derive(Debug, Clone, Default)]
pub struct InMemoryAppState {
    pub tasks: Vec<Task>,
    pub schedule: ScheduleMap,
    pub peers: Vec<Peer>,
    pub groups: Vec<Group>,
    pub selected_task: Option<TaskId>,
    pub selected_peer: Option<PeerId>,
    pub selected_group: Option<GroupId>,
    pub current_view: Option<View>,
    pub open_modal: Option<Modal>,
}

impl InMemoryAppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn with_peers(mut self, peers: Vec<Peer>) -> Self {
        self.peers = peers;
        self
    }

    pub fn with_groups(mut self, groups: Vec<Group>) -> Self {
        self.groups = groups;
        self
    }

    fn task_index(&self, id: TaskId) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| AssistError::TaskNotFound(id.0.to_string()))
    }
}

impl AppState for InMemoryAppState {
    fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    fn schedule(&self) -> &ScheduleMap {
        &self.schedule
    }

    fn peers(&self) -> &[Peer] {
        &self.peers
    }

    fn groups(&self) -> &[Group] {
        &self.groups
    }

    fn append_task(&mut self, task: Task) -> Result<()> {
        self.tasks.push(task);
        Ok(())
    }

    fn update_task(&mut self, task: Task) -> Result<()> {
        let idx = self.task_index(task.id)?;
        self.tasks[idx] = task;
        Ok(())
    }

    fn complete_task(&mut self, id: TaskId) -> Result<()> {
        let idx = self.task_index(id)?;
        self.tasks[idx].completed = true;
        Ok(())
    }

    fn merge_schedule_entry(&mut self, date: NaiveDate, entry: ScheduleEntry) -> Result<()> {
        self.schedule.merge(date, entry);
        Ok(())
    }

    fn take_schedule_entry(&mut self, date: NaiveDate, title: &str) -> Result<ScheduleEntry> {
        self.schedule
            .take(date, title)
            .ok_or_else(|| AssistError::EventNotFound(title.to_string()))
    }

    fn select_task(&mut self, id: TaskId) -> Result<()> {
        self.task_index(id)?;
        self.selected_task = Some(id);
        Ok(())
    }

    fn select_peer(&mut self, id: PeerId) -> Result<()> {
        self.selected_peer = Some(id);
        Ok(())
    }

    fn select_group(&mut self, id: GroupId) -> Result<()> {
        if !self.groups.iter().any(|g| g.id == id) {
            return Err(AssistError::GroupNotFound(id.0.to_string()));
        }
        self.selected_group = Some(id);
        Ok(())
    }

    fn open_view(&mut self, view: View) -> Result<()> {
        self.open_modal = None;
        self.current_view = Some(view);
        Ok(())
    }

    fn open_modal(&mut self, modal: Modal) -> Result<()> {
        self.open_modal = Some(modal);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Priority;
    use chrono::NaiveDate;

    fn task(name: &str) -> Task {
        let day = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        Task::new(name, day, Priority::Medium, day.and_hms_opt(8, 0, 0).unwrap())
    }

    #[test]
    fn test_complete_unknown_task_fails() {
        let mut state = InMemoryAppState::new();
        let err = state.complete_task(TaskId::new()).unwrap_err();
        assert!(matches!(err, AssistError::TaskNotFound(_)));
    }

    #[test]
    fn test_update_replaces_by_id() {
        let original = task("Essay");
        let mut state = InMemoryAppState::new().with_tasks(vec![original.clone()]);
        let mut changed = original.clone();
        changed.priority = Priority::High;
        state.update_task(changed).unwrap();
        assert_eq!(state.tasks[0].priority, Priority::High);
        assert_eq!(state.tasks.len(), 1);
    }

    #[test]
    fn test_apply_transitions() {
        let t = task("Essay");
        let id = t.id;
        let mut state = InMemoryAppState::new().with_tasks(vec![t]);

        state.apply(&UiTransition::now(UiStep::OpenModal { modal: Modal::Goals })).unwrap();
        assert_eq!(state.open_modal, Some(Modal::Goals));

        state.apply(&UiTransition::deferred(UiStep::OpenView { view: View::Tasks }, 300)).unwrap();
        assert_eq!(state.current_view, Some(View::Tasks));
        assert_eq!(state.open_modal, None);

        state.apply(&UiTransition::now(UiStep::SelectTask { task_id: id })).unwrap();
        assert_eq!(state.selected_task, Some(id));
    }

    #[test]
    fn test_apply_reports_unknown_selection() {
        let mut state = InMemoryAppState::new();
        let err = state
            .apply(&UiTransition::now(UiStep::SelectTask { task_id: TaskId::new() }))
            .unwrap_err();
        assert!(matches!(err, AssistError::TaskNotFound(_)));
        assert_eq!(state.selected_task, None);
    }
}
