//! Task edit panel over a project, with undo/redo.
//!
//! Selecting a task opens the panel; every edit is committed to the project
//! immediately (no save step) and the prior project snapshot goes onto the
//! undo stack. Closing the panel keeps everything already committed.

use crate::error::{PlanError, PlanResult};
use crate::types::{Project, Task};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Closed,
    Open {
        task_id: String,
    },
}

#[derive(Debug)]
pub struct TaskEditor {
    project: Project,
    panel: PanelState,
    undo: Vec<Project>,
    redo: Vec<Project>,
}

impl TaskEditor {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            panel: PanelState::Closed,
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Consume the editor, keeping every committed edit
    pub fn into_project(self) -> Project {
        self.project
    }

    pub fn panel(&self) -> &PanelState {
        &self.panel
    }

    pub fn select(&mut self, task_id: &str) -> PlanResult<&Task> {
        if self.project.find_task(task_id).is_none() {
            return Err(PlanError::NotFound(format!("task '{}'", task_id)));
        }
        debug!(task = task_id, "panel opened");
        self.panel = PanelState::Open {
            task_id: task_id.to_string(),
        };
        self.selected()
            .ok_or_else(|| PlanError::NotFound(format!("task '{}'", task_id)))
    }

    pub fn close(&mut self) {
        self.panel = PanelState::Closed;
    }

    pub fn selected(&self) -> Option<&Task> {
        match &self.panel {
            PanelState::Open { task_id } => self.project.find_task(task_id),
            PanelState::Closed => None,
        }
    }

    /// Apply an edit to the selected task and commit the result.
    pub fn apply<F>(&mut self, edit: F) -> PlanResult<&Task>
    where
        F: FnOnce(&Task) -> Task,
    {
        self.try_apply(|task| Ok(edit(task)))
    }

    /// Fallible variant of [`TaskEditor::apply`]. On error nothing is committed.
    pub fn try_apply<F>(&mut self, edit: F) -> PlanResult<&Task>
    where
        F: FnOnce(&Task) -> PlanResult<Task>,
    {
        let current = self
            .selected()
            .ok_or_else(|| PlanError::Validation("no task selected".to_string()))?;
        let task_id = current.id.clone();
        let mut updated = edit(current)?;
        // the panel owns the task's identity; edits cannot move it
        updated.id = task_id.clone();
        if updated == *current {
            debug!(task = %task_id, "edit changed nothing, not recorded");
            return self
                .selected()
                .ok_or_else(|| PlanError::NotFound(format!("task '{}'", task_id)));
        }

        let next = self
            .project
            .with_task(updated)
            .ok_or_else(|| PlanError::NotFound(format!("task '{}'", task_id)))?;
        let previous = std::mem::replace(&mut self.project, next);
        self.undo.push(previous);
        self.redo.clear();

        self.selected()
            .ok_or_else(|| PlanError::NotFound(format!("task '{}'", task_id)))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Returns false when there is nothing to undo
    pub fn undo(&mut self) -> bool {
        match self.undo.pop() {
            Some(previous) => {
                let current = std::mem::replace(&mut self.project, previous);
                self.redo.push(current);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.redo.pop() {
            Some(next) => {
                let current = std::mem::replace(&mut self.project, next);
                self.undo.push(current);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::allocation::{add_material, remove_material, set_allocation};
    use crate::types::WorkPackage;
    use chrono::NaiveDate;

    fn project() -> Project {
        let day = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let mut task = Task::new("t1", "Survey", day, day);
        task.resources = std::sync::Arc::new(vec![crate::types::ResourceAssignment::new(
            "Ana", "Architect", "Senior",
        )]);
        Project {
            name: "Office".to_string(),
            work_packages: vec![WorkPackage {
                id: "wp1".to_string(),
                name: "Design".to_string(),
                tasks: vec![task, Task::new("t2", "Permits", day, day)],
            }],
        }
    }

    #[test]
    fn test_starts_closed() {
        let editor = TaskEditor::new(project());
        assert_eq!(editor.panel(), &PanelState::Closed);
        assert!(editor.selected().is_none());
    }

    #[test]
    fn test_select_unknown_task() {
        let mut editor = TaskEditor::new(project());
        assert!(matches!(editor.select("nope"), Err(PlanError::NotFound(_))));
        assert_eq!(editor.panel(), &PanelState::Closed);
    }

    #[test]
    fn test_edit_requires_open_panel() {
        let mut editor = TaskEditor::new(project());
        assert!(editor.apply(add_material).is_err());
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_edits_commit_eagerly_and_survive_close() {
        let mut editor = TaskEditor::new(project());
        editor.select("t1").unwrap();
        editor.apply(|t| set_allocation(t, 0, 2, "0.75")).unwrap();
        editor.close();

        assert_eq!(editor.panel(), &PanelState::Closed);
        let task = editor.project().find_task("t1").unwrap();
        assert_eq!(task.resources[0].allocation.get(2), Some(0.75));
    }

    #[test]
    fn test_undo_redo() {
        let original = project();
        let mut editor = TaskEditor::new(original.clone());
        editor.select("t2").unwrap();
        editor.apply(add_material).unwrap();
        editor.apply(add_material).unwrap();
        assert_eq!(editor.selected().unwrap().materials.len(), 2);

        assert!(editor.undo());
        assert_eq!(editor.selected().unwrap().materials.len(), 1);
        assert!(editor.undo());
        assert_eq!(editor.project(), &original);
        assert!(!editor.undo());

        assert!(editor.redo());
        assert_eq!(editor.selected().unwrap().materials.len(), 1);
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut editor = TaskEditor::new(project());
        editor.select("t2").unwrap();
        editor.apply(add_material).unwrap();
        editor.undo();
        assert!(editor.can_redo());
        editor.apply(add_material).unwrap();
        assert!(!editor.can_redo());
    }

    #[test]
    fn test_failed_edit_commits_nothing() {
        let mut editor = TaskEditor::new(project());
        editor.select("t1").unwrap();
        let result = editor.try_apply(|_| Err(PlanError::Validation("bad".to_string())));
        assert!(result.is_err());
        assert!(!editor.can_undo());
        assert_eq!(editor.project(), &project());
    }

    #[test]
    fn test_no_op_edit_is_not_recorded() {
        let mut editor = TaskEditor::new(project());
        editor.select("t2").unwrap();
        editor.apply(|t| remove_material(t, 5)).unwrap();
        assert!(!editor.can_undo());
        assert_eq!(editor.project(), &project());
    }

    #[test]
    fn test_into_project_keeps_edits() {
        let mut editor = TaskEditor::new(project());
        editor.select("t1").unwrap();
        editor.apply(|t| set_allocation(t, 0, 0, "0.5")).unwrap();
        editor.close();

        let project = editor.into_project();
        let task = project.find_task("t1").unwrap();
        assert_eq!(task.resources[0].allocation.get(0), Some(0.5));
    }
}
