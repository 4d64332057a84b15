//! Trigger tasks and the ordered task set.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::frame::{Frame, Size};
use crate::template::TemplatePlan;
use crate::util::{TriggerError, TriggerResult};

/// Horizontal offset of the default drag.
pub const DEFAULT_DRAG_OFFSET: (i32, i32) = (100, 0);

/// Duration of the default drag.
pub const DEFAULT_DRAG_DURATION: Duration = Duration::from_millis(500);

/// Input synthesized when a trigger matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    /// Left-button press and release at the match center.
    Click,
    /// Press at the match center, move by `(dx, dy)` over `duration`, release.
    Drag {
        dx: i32,
        dy: i32,
        duration: Duration,
    },
}

impl ActionKind {
    /// Drag by `DEFAULT_DRAG_OFFSET` over `DEFAULT_DRAG_DURATION`.
    pub fn default_drag() -> Self {
        ActionKind::Drag {
            dx: DEFAULT_DRAG_OFFSET.0,
            dy: DEFAULT_DRAG_OFFSET.1,
            duration: DEFAULT_DRAG_DURATION,
        }
    }

    /// Past-tense verb used in log lines.
    pub fn verb(&self) -> &'static str {
        match self {
            ActionKind::Click => "Clicked",
            ActionKind::Drag { .. } => "Dragged from",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Click => write!(f, "click"),
            ActionKind::Drag { dx, dy, duration } => {
                write!(f, "drag({dx:+}, {dy:+}) over {}ms", duration.as_millis())
            }
        }
    }
}

/// One reference image and the action it triggers.
#[derive(Debug)]
pub struct TriggerTask {
    name: String,
    template: Frame,
    plan: TemplatePlan,
    action: ActionKind,
}

impl TriggerTask {
    /// Creates a task and precomputes its template statistics.
    pub fn new(name: impl Into<String>, template: Frame, action: ActionKind) -> TriggerResult<Self> {
        let plan = TemplatePlan::from_frame(&template)?;
        Ok(Self {
            name: name.into(),
            template,
            plan,
            action,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &Frame {
        &self.template
    }

    pub fn template_size(&self) -> Size {
        self.template.size()
    }

    pub fn plan(&self) -> &TemplatePlan {
        &self.plan
    }

    pub fn action(&self) -> &ActionKind {
        &self.action
    }
}

/// Ordered set of tasks with unique names.
///
/// Iteration order is insertion order, which is also evaluation order.
#[derive(Debug, Default)]
pub struct TaskSet {
    tasks: Vec<Arc<TriggerTask>>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a task. Fails with `DuplicateTask` if the name is taken.
    pub fn add(&mut self, task: TriggerTask) -> TriggerResult<()> {
        if self.contains(task.name()) {
            return Err(TriggerError::DuplicateTask {
                name: task.name().to_string(),
            });
        }
        self.tasks.push(Arc::new(task));
        Ok(())
    }

    /// Removes the task named `name`.
    pub fn remove(&mut self, name: &str) -> TriggerResult<Arc<TriggerTask>> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.name() == name)
            .ok_or_else(|| TriggerError::UnknownTask {
                name: name.to_string(),
            })?;
        Ok(self.tasks.remove(idx))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.iter().any(|t| t.name() == name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TriggerTask>> {
        self.tasks.iter()
    }

    /// Returns a cheap copy of the current task list.
    pub fn snapshot(&self) -> Vec<Arc<TriggerTask>> {
        self.tasks.clone()
    }
}
