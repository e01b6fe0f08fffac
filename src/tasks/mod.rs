pub mod builtin;
pub mod task;

pub use task::{Exec, FailurePolicy, Guard, Step, Task};

/// Built-in targets followed by user-defined tasks
#[derive(Debug, Clone, Default)]
pub struct TaskSet {
    tasks: Vec<Task>,
}

impl TaskSet {
    #[must_use]
    pub fn new(builtin: Vec<Task>, user: Vec<Task>) -> Self {
        TaskSet {
            tasks: builtin.into_iter().chain(user).collect(),
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn all(&self) -> &[Task] {
        &self.tasks
    }
}
