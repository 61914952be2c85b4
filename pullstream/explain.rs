use colored::Colorize;

/// Format a single plan-tree line at `depth`, optionally colorizing the operator name.
pub(crate) fn node_line(depth: usize, name: &str, colored: bool) -> String {
    let indent = "  ".repeat(depth);
    let name = if colored {
        name.cyan().to_string()
    } else {
        name.to_string()
    };
    format!("{}{}\n", indent, name)
}
