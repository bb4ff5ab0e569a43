//! Debug-only ASCII tree renderer, walking [`Workflow::children`] — never
//! the execution path — to show the shape of a composed workflow.

use crate::workflow::Workflow;

/// Render `root` and its declared children as an ASCII tree, one line per
/// node, branch labels (`"WHEN TRUE"`, `"TRY (PRIMARY)"`, ...) indenting
/// each subtree.
pub fn to_tree_string(root: &dyn Workflow) -> String {
    let mut out = String::new();
    render_node(root.name(), root, &mut out, "", true);
    out
}

fn render_node(label: &str, workflow: &dyn Workflow, out: &mut String, prefix: &str, is_root: bool) {
    if is_root {
        out.push_str(workflow.name());
        out.push('\n');
    } else {
        out.push_str(prefix);
        out.push_str("└── ");
        out.push_str(label);
        out.push_str(" → ");
        out.push_str(workflow.name());
        out.push('\n');
    }

    let children = workflow.children();
    let child_prefix = if is_root {
        String::new()
    } else {
        format!("{prefix}    ")
    };

    for (label, child) in &children {
        render_node(label, child.as_ref(), out, &child_prefix, false);
    }
}
