//! Derives a layout tree from a store snapshot.
//!
//! The store keeps a flat id map where steps and sub-problems are both
//! plain nodes; the layout engine wants problems with an ordered step trunk
//! and side-tagged children. This module does that reshaping: step children
//! become [`StepLayout`] entries, their problem children become sub-problem
//! subtrees, and everything the geometry cannot anchor (a sub-problem with
//! no spawning step) is dropped silently.

use std::collections::HashSet;

use crate::config::LayoutConfig;
use crate::layout::{ProblemNode, StepLayout};
use crate::steps::parse_steps_from_solution;
use crate::store::{NodeKind, STEP_TITLE_RE, Side, TreeNode, TreeStore};

/// Builds the layout tree rooted at `root_id`, or at the store's designated
/// root when `root_id` is `None`. Returns `None` for an empty store or an
/// unknown root.
pub fn build_layout_tree(
    store: &TreeStore,
    root_id: Option<&str>,
    config: &LayoutConfig,
) -> Option<ProblemNode> {
    let root_id = root_id.or_else(|| store.root_id())?;
    let mut visited = HashSet::new();
    build_problem(store, root_id, None, None, config, &mut visited)
}

/// The `kind` tag decides; the title prefix is only consulted for nodes
/// written before the tag existed.
fn is_step(node: &TreeNode) -> bool {
    match node.kind {
        NodeKind::Step => true,
        NodeKind::Problem => STEP_TITLE_RE.is_match(&node.title),
    }
}

fn step_index(node: &TreeNode, position: usize) -> u32 {
    if let Some(number) = node.context.step_number {
        return number;
    }
    if let Some(caps) = STEP_TITLE_RE.captures(&node.title)
        && let Ok(number) = caps[1].parse()
    {
        return number;
    }
    position as u32 + 1
}

fn estimate_step_height(content: &str, config: &LayoutConfig) -> f32 {
    let lines = content.lines().count().max(1) as f32;
    config.step_base_height + (lines - 1.0) * config.step_line_height
}

fn build_problem(
    store: &TreeStore,
    id: &str,
    parent_step_id: Option<String>,
    side: Option<Side>,
    config: &LayoutConfig,
    visited: &mut HashSet<String>,
) -> Option<ProblemNode> {
    // The store refuses reparenting cycles, but imported children lists are
    // not re-verified node by node; never recurse into a node twice.
    if !visited.insert(id.to_string()) {
        return None;
    }
    let node = store.get(id)?;
    let mut problem = ProblemNode::new(id, config);
    problem.parent_step_id = parent_step_id;
    problem.side = side;

    let mut position = 0usize;
    for child_id in &node.children {
        let Some(child) = store.get(child_id) else {
            continue;
        };
        if !is_step(child) {
            // A problem parked directly under another problem has no step to
            // hang from; it stays in the store but not in the diagram.
            continue;
        }
        let index = step_index(child, position);
        position += 1;
        let content = if child.problem.is_empty() {
            &child.solution
        } else {
            &child.problem
        };
        problem.steps.push(StepLayout::new(
            child_id.clone(),
            index,
            estimate_step_height(content, config),
        ));
        for grandchild_id in &child.children {
            let Some(grandchild) = store.get(grandchild_id) else {
                continue;
            };
            if is_step(grandchild) {
                continue;
            }
            let side = grandchild.context.sub_problem_side.unwrap_or(Side::Right);
            if let Some(sub) = build_problem(
                store,
                grandchild_id,
                Some(child_id.clone()),
                Some(side),
                config,
                visited,
            ) {
                problem.children.push(sub);
            }
        }
    }

    // A solved node whose steps were never materialized as store children
    // still shows its trunk: split the solution text on the fly.
    if problem.steps.is_empty() && !node.solution.is_empty() {
        for (i, parsed) in parse_steps_from_solution(&node.solution).iter().enumerate() {
            problem.steps.push(StepLayout::new(
                format!("{id}-step-{}", i + 1),
                i as u32 + 1,
                estimate_step_height(&parsed.content, config),
            ));
        }
    }

    problem.steps.sort_by_key(|step| step.index);
    Some(problem)
}
