//! Free-text to step decomposition.
//!
//! Solve output arrives as prose with `Step N:` markers. The splitter here
//! and the adapter's step classifier share that convention: whatever writes
//! steps into the store must keep `Step N` titles (or the explicit `kind`
//! tag) for the diagram to pick them up.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::store::{NodeStatus, StoreError, TreeStore};

static STEP_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Step\s+\d+[:\s]").unwrap());
static STEP_TITLE_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Step\s+(\d+)[:\s]+\s*(.*)$").unwrap());
static HEADER_ONLY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s*$").unwrap());
static HEADER_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s+").unwrap());
static HEADER_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)\s+#{1,6}\s*$").unwrap());
static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStep {
    pub title: String,
    pub content: String,
}

/// The external LLM capability. This crate only consumes it; transport,
/// retries and prompt construction live with the host application.
pub trait Solver {
    fn solve(&self, prompt: &str, context: &PromptContext) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    pub parent_problem: Option<String>,
    pub parent_solution: Option<String>,
    pub ancestor_summary: String,
    pub current_step: Option<String>,
}

impl PromptContext {
    /// Context for solving `node_id`, assembled from the node and its
    /// parent as recorded in the store.
    pub fn for_node(store: &TreeStore, node_id: &str) -> Self {
        let Some(node) = store.get(node_id) else {
            return Self::default();
        };
        let parent = node.parent_id.as_deref().and_then(|id| store.get(id));
        Self {
            parent_problem: parent.map(|p| p.problem.clone()),
            parent_solution: parent
                .map(|p| p.solution.clone())
                .filter(|s| !s.is_empty()),
            ancestor_summary: node.context.ancestor_summary.clone(),
            current_step: node.context.step_number.map(|n| format!("Step {n}")),
        }
    }
}

/// Splits solve output into steps on `Step N` markers.
///
/// Text before the first marker becomes a leading `Solution` step, the
/// marker line itself becomes the title, and markdown header artifacts are
/// stripped from the content. Text without any marker is a single
/// `Solution` step.
pub fn parse_steps_from_solution(solution: &str) -> Vec<ParsedStep> {
    if solution.is_empty() {
        return Vec::new();
    }
    let markers: Vec<_> = STEP_MARKER_RE.find_iter(solution).collect();
    if markers.is_empty() {
        return vec![ParsedStep {
            title: "Solution".to_string(),
            content: solution.to_string(),
        }];
    }

    let mut steps = Vec::new();
    let preamble = solution[..markers[0].start()].trim();
    if !preamble.is_empty() {
        steps.push(ParsedStep {
            title: "Solution".to_string(),
            content: preamble.to_string(),
        });
    }

    for (idx, marker) in markers.iter().enumerate() {
        let start = marker.start();
        let end = markers
            .get(idx + 1)
            .map(|next| next.start())
            .unwrap_or(solution.len());
        let chunk = &solution[start..end];
        let mut lines = chunk.lines();
        let title_line = lines.next().unwrap_or("");
        let title = match STEP_TITLE_LINE_RE.captures(title_line) {
            Some(caps) => {
                let number = &caps[1];
                let rest = caps[2].trim();
                if rest.is_empty() {
                    format!("Step {number}")
                } else {
                    format!("Step {number}: {rest}")
                }
            }
            None => title_line.trim().to_string(),
        };
        let body = lines.collect::<Vec<_>>().join("\n");
        steps.push(ParsedStep {
            title,
            content: clean_markdown(&body),
        });
    }
    steps
}

fn clean_markdown(text: &str) -> String {
    let text = HEADER_ONLY_RE.replace_all(text, "");
    let text = HEADER_PREFIX_RE.replace_all(&text, "");
    let text = HEADER_SUFFIX_RE.replace_all(&text, "");
    let text = BLANK_RUN_RE.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Records solve output on a node: stores the solution text, marks the node
/// solved, and materializes one step child per parsed step. Returns the
/// created step ids in trunk order.
pub fn apply_solution(
    store: &mut TreeStore,
    node_id: &str,
    solution: &str,
) -> Result<Vec<String>, StoreError> {
    store.update_node(node_id, |node| {
        node.solution = solution.to_string();
        node.status = NodeStatus::Solved;
    })?;
    let mut created = Vec::new();
    for (idx, step) in parse_steps_from_solution(solution).into_iter().enumerate() {
        let id = store.create_step(node_id, idx as u32 + 1, &step.title, &step.content)?;
        created.push(id);
    }
    Ok(created)
}
