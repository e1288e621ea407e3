//! Plain-text rendering of the status tree.
//!
//! The tracker is independent of any renderer; this module walks the
//! tree through the public accessors and produces indented lines with
//! status glyphs, suitable for terminal output.

use crate::tracker::{Task, TaskState};

/// Status glyphs used in front of each node.
pub mod glyph {
    /// Success (green checkmark in color terminals)
    pub const SUCCESS: &str = "✓";

    /// Failure
    pub const FAILED: &str = "✗";

    /// Warning (intentional skip)
    pub const WARNING: &str = "⚠";

    /// Pending or in progress
    pub const PENDING: &str = "·";
}

fn glyph_for(state: TaskState) -> &'static str {
    match state {
        TaskState::Success => glyph::SUCCESS,
        TaskState::Failed => glyph::FAILED,
        TaskState::Warning => glyph::WARNING,
        TaskState::Pending | TaskState::InProgress => glyph::PENDING,
    }
}

/// Render the tree rooted at `task` as indented lines.
///
/// The first message of a node is shown inline in parentheses;
/// remaining messages (e.g. captured build output) are indented
/// beneath the node, one line per output line.
pub fn render_tree(task: &Task) -> String {
    let mut out = String::new();
    render_node(task, 0, &mut out);
    out
}

fn render_node(task: &Task, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let messages = task.messages();

    out.push_str(&indent);
    out.push_str(glyph_for(task.state()));
    out.push(' ');
    out.push_str(&task.name());
    if let Some(first) = messages.first() {
        out.push_str(&format!(" ({})", first));
    }
    out.push('\n');

    for message in messages.iter().skip(1) {
        for line in message.lines() {
            out.push_str(&indent);
            out.push_str("    ");
            out.push_str(line);
            out.push('\n');
        }
    }

    for child in task.children() {
        render_node(&child, depth + 1, out);
    }
}

/// Print the rendered tree to stdout.
pub fn print_tree(task: &Task) {
    print!("{}", render_tree(task));
}
