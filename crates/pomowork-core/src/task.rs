//! Task backlog and the pinned ("active") task pointer.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

/// Direction for a one-step move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Ordered tasks plus the optional pinned task id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskBacklog {
    tasks: Vec<Task>,
    active_id: Option<String>,
}

impl TaskBacklog {
    pub fn new(tasks: Vec<Task>, active_id: Option<String>) -> Self {
        Self { tasks, active_id }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Label stamped on a finished Focus record: the pinned task, else the
    /// first open task.
    pub fn effective_label(&self) -> Option<&str> {
        self.active_id
            .as_deref()
            .and_then(|id| self.get(id))
            .or_else(|| self.first_open())
            .map(|t| t.text.as_str())
    }

    /// Text handed to the coach: like [`Self::effective_label`] but a
    /// pinned task that is already done does not count.
    pub fn coaching_label(&self) -> Option<&str> {
        self.active_id
            .as_deref()
            .and_then(|id| self.get(id))
            .filter(|t| !t.completed)
            .or_else(|| self.first_open())
            .map(|t| t.text.as_str())
    }

    fn first_open(&self) -> Option<&Task> {
        self.tasks.iter().find(|t| !t.completed)
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Append a task. The first task ever added to an empty backlog is pinned.
    pub fn add(&mut self, text: &str) -> Result<&Task, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "task".into(),
                message: "text must not be empty".into(),
            });
        }
        let task = Task {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            completed: false,
        };
        if self.tasks.is_empty() {
            self.active_id = Some(task.id.clone());
        }
        self.tasks.push(task);
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    pub fn toggle(&mut self, id: &str) -> Result<bool, ValidationError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| unknown(id))?;
        task.completed = !task.completed;
        Ok(task.completed)
    }

    /// Delete a task. Removing the pinned task re-pins the first other open
    /// task, or clears the pointer.
    pub fn remove(&mut self, id: &str) -> Result<Task, ValidationError> {
        let index = self.position(id)?;
        let removed = self.tasks.remove(index);
        if self.active_id.as_deref() == Some(id) {
            self.active_id = self.first_open().map(|t| t.id.clone());
        }
        Ok(removed)
    }

    pub fn set_active(&mut self, id: Option<&str>) -> Result<(), ValidationError> {
        if let Some(id) = id {
            self.position(id)?;
        }
        self.active_id = id.map(str::to_string);
        Ok(())
    }

    /// Swap with the neighbour. Moving past either end is a no-op.
    pub fn move_task(&mut self, id: &str, direction: MoveDirection) -> Result<(), ValidationError> {
        let index = self.position(id)?;
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => Some(index + 1).filter(|&i| i < self.tasks.len()),
        };
        if let Some(target) = target {
            self.tasks.swap(index, target);
        }
        Ok(())
    }

    /// Take the task at `from` out and insert it at `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), ValidationError> {
        let len = self.tasks.len();
        for index in [from, to] {
            if index >= len {
                return Err(ValidationError::OutOfBounds {
                    collection: "tasks".into(),
                    index,
                    len,
                });
            }
        }
        let task = self.tasks.remove(from);
        self.tasks.insert(to, task);
        Ok(())
    }

    pub fn shuffle(&mut self) {
        self.tasks.shuffle(&mut rand::thread_rng());
    }

    fn position(&self, id: &str) -> Result<usize, ValidationError> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| unknown(id))
    }
}

fn unknown(id: &str) -> ValidationError {
    ValidationError::UnknownId {
        kind: "task".into(),
        id: id.into(),
    }
}
