//! Hierarchical status tree for build progress reporting.
//!
//! A `Task` is a named node in a tree of units of work. The build
//! orchestrator creates children as work begins and records outcomes
//! through `set_state`; a rendering layer observes the tree through the
//! read accessors. Handles are cheap clones sharing the underlying node.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

/// Unique identifier for a status node.
///
/// Uses UUID v4 for generation and provides a short form display
/// for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Create a new unique task identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return first 8 characters of the UUID for display.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of a status node.
///
/// A node starts `Pending` and is moved by the orchestrator through
/// `InProgress` into exactly one of the terminal states per build
/// attempt. Reasons and captured output travel as messages alongside
/// the state rather than inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    /// Initial state before any transition.
    #[default]
    Pending,
    /// Work has started and has not yet finished.
    InProgress,
    /// Work finished successfully.
    Success,
    /// Work was intentionally not performed (e.g. already running).
    Warning,
    /// Work failed.
    Failed,
}

impl TaskState {
    /// Whether this state ends a single build attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Success | TaskState::Warning | TaskState::Failed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Pending => write!(f, "pending"),
            TaskState::InProgress => write!(f, "in progress"),
            TaskState::Success => write!(f, "success"),
            TaskState::Warning => write!(f, "warning"),
            TaskState::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug)]
struct TaskNode {
    id: TaskId,
    name: String,
    state: TaskState,
    messages: Vec<String>,
    children: Vec<Task>,
}

/// A handle to a node in the status tree.
///
/// Cloning a `Task` yields another handle to the same node, so the
/// caller can keep a root handle while the orchestrator records
/// progress on children. The tracker does not enforce state-machine
/// legality; callers own the usage pattern.
#[derive(Debug, Clone)]
pub struct Task {
    inner: Arc<Mutex<TaskNode>>,
}

impl Task {
    /// Create a new root node.
    pub fn root(name: &str) -> Self {
        Self::new_node(name)
    }

    fn new_node(name: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TaskNode {
                id: TaskId::new(),
                name: name.to_string(),
                state: TaskState::Pending,
                messages: Vec::new(),
                children: Vec::new(),
            })),
        }
    }

    fn node(&self) -> MutexGuard<'_, TaskNode> {
        // The tree must stay observable even after a writer panicked.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create a new child node under this node and return a handle to it.
    ///
    /// Duplicate names are permitted; every call yields a distinct node.
    /// Children keep insertion order.
    pub fn child(&self, name: &str) -> Task {
        let child = Self::new_node(name);
        self.node().children.push(child.clone());
        child
    }

    /// Record the node's state with no messages attached.
    pub fn set_state(&self, state: TaskState) {
        self.set_state_with(state, &[]);
    }

    /// Record the node's state and append free-form messages.
    ///
    /// Messages accumulate across calls; earlier ones are never dropped.
    pub fn set_state_with(&self, state: TaskState, messages: &[&str]) {
        let mut node = self.node();
        node.state = state;
        node.messages.extend(messages.iter().map(|m| m.to_string()));
    }

    pub fn id(&self) -> TaskId {
        self.node().id
    }

    pub fn name(&self) -> String {
        self.node().name.clone()
    }

    pub fn state(&self) -> TaskState {
        self.node().state
    }

    pub fn messages(&self) -> Vec<String> {
        self.node().messages.clone()
    }

    /// Handles to this node's children, in insertion order.
    pub fn children(&self) -> Vec<Task> {
        self.node().children.clone()
    }

    /// Find the first direct child with the given name.
    pub fn find_child(&self, name: &str) -> Option<Task> {
        self.node()
            .children
            .iter()
            .find(|c| c.name() == name)
            .cloned()
    }

    /// Check if the node is in a terminal state for one build attempt.
    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }
}
