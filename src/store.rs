use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Legacy exports tagged steps only through their title.
pub(crate) static STEP_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Step\s+(\d+)").unwrap());

/// Version written by [`TreeStore::export_tree`]. Version 0 (absent field)
/// marks exports from before the explicit `kind` tag existed.
const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Problem,
    Step,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Open,
    Solving,
    Solved,
    Failed,
}

/// Horizontal half-plane a sub-problem subtree occupies relative to its
/// parent's trunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeContext {
    #[serde(default)]
    pub ancestor_summary: String,
    #[serde(default)]
    pub assumptions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_problem_side: Option<Side>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub kind: NodeKind,
    pub title: String,
    #[serde(default)]
    pub problem: String,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub context: NodeContext,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("node id already present: {0}")]
    DuplicateId(String),
    #[error("parent node not found: {0}")]
    MissingParent(String),
    #[error("node not found: {0}")]
    MissingNode(String),
    #[error("attaching {child} under {parent} would create a cycle")]
    WouldCycle { child: String, parent: String },
    #[error("invalid tree export: {0}")]
    Import(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TreeExport {
    #[serde(default)]
    version: u32,
    root_id: Option<String>,
    nodes: Vec<TreeNode>,
}

/// In-memory map of nodes plus a designated root. Owns no layout knowledge;
/// the layout engine only ever sees the tree the adapter derives from a
/// snapshot of this store.
#[derive(Debug, Clone, Default)]
pub struct TreeStore {
    nodes: BTreeMap<String, TreeNode>,
    root_id: Option<String>,
}

impl TreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root_id(&self) -> Option<&str> {
        self.root_id.as_deref()
    }

    pub fn get(&self, id: &str) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Inserts a node and registers it with its parent. Rejects duplicate
    /// ids, dangling parents, and attachments that would make a node its own
    /// ancestor; trees stay acyclic by construction.
    pub fn add_node(&mut self, node: TreeNode) -> Result<(), StoreError> {
        if self.nodes.contains_key(&node.id) {
            return Err(StoreError::DuplicateId(node.id));
        }
        if let Some(parent_id) = node.parent_id.clone() {
            if !self.nodes.contains_key(&parent_id) {
                return Err(StoreError::MissingParent(parent_id));
            }
            if self.is_ancestor(&node.id, &parent_id) {
                return Err(StoreError::WouldCycle {
                    child: node.id,
                    parent: parent_id,
                });
            }
            let parent = self
                .nodes
                .get_mut(&parent_id)
                .expect("parent presence checked above");
            if !parent.children.contains(&node.id) {
                parent.children.push(node.id.clone());
            }
        }
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Reparents an existing node. Attaching a node beneath one of its own
    /// descendants (or itself) is refused so the tree can never cycle.
    pub fn attach(&mut self, id: &str, new_parent_id: &str) -> Result<(), StoreError> {
        if !self.nodes.contains_key(id) {
            return Err(StoreError::MissingNode(id.to_string()));
        }
        if !self.nodes.contains_key(new_parent_id) {
            return Err(StoreError::MissingParent(new_parent_id.to_string()));
        }
        if self.is_ancestor(id, new_parent_id) {
            return Err(StoreError::WouldCycle {
                child: id.to_string(),
                parent: new_parent_id.to_string(),
            });
        }
        let old_parent = self
            .nodes
            .get(id)
            .and_then(|node| node.parent_id.clone());
        if let Some(old_parent) = old_parent
            && let Some(parent) = self.nodes.get_mut(&old_parent)
        {
            parent.children.retain(|child| child != id);
        }
        if let Some(parent) = self.nodes.get_mut(new_parent_id)
            && !parent.children.contains(&id.to_string())
        {
            parent.children.push(id.to_string());
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent_id = Some(new_parent_id.to_string());
        }
        Ok(())
    }

    pub fn update_node(
        &mut self,
        id: &str,
        update: impl FnOnce(&mut TreeNode),
    ) -> Result<(), StoreError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| StoreError::MissingNode(id.to_string()))?;
        update(node);
        Ok(())
    }

    /// Removes a node and its whole subtree, detaching it from the parent's
    /// child list. Deleting the root clears `root_id`.
    pub fn delete_node(&mut self, id: &str) -> Result<(), StoreError> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| StoreError::MissingNode(id.to_string()))?;
        let parent_id = node.parent_id.clone();
        for descendant in self.descendants(id) {
            self.nodes.remove(&descendant);
        }
        self.nodes.remove(id);
        if let Some(parent_id) = parent_id
            && let Some(parent) = self.nodes.get_mut(&parent_id)
        {
            parent.children.retain(|child| child != id);
        }
        if self.root_id.as_deref() == Some(id) {
            self.root_id = None;
        }
        Ok(())
    }

    /// Creates the root problem node and designates it as the tree root.
    pub fn create_root(&mut self, problem: &str) -> String {
        let id = self.fresh_id("node");
        let root = TreeNode {
            id: id.clone(),
            parent_id: None,
            kind: NodeKind::Problem,
            title: "Root Problem".to_string(),
            problem: problem.to_string(),
            solution: String::new(),
            status: NodeStatus::Open,
            children: Vec::new(),
            context: NodeContext::default(),
        };
        self.nodes.insert(id.clone(), root);
        self.root_id = Some(id.clone());
        id
    }

    /// Creates a sub-problem under `parent_id` (normally a step node),
    /// carrying the accumulated ancestor summary into its context.
    pub fn create_sub_problem(
        &mut self,
        parent_id: &str,
        problem: &str,
        side: Option<Side>,
    ) -> Result<String, StoreError> {
        let parent = self
            .nodes
            .get(parent_id)
            .ok_or_else(|| StoreError::MissingParent(parent_id.to_string()))?;
        let mut summary_lines: Vec<String> = self
            .ancestors(parent_id)
            .iter()
            .map(|node| format!("{}: {}", node.title, node.problem))
            .collect();
        summary_lines.push(format!("{}: {}", parent.title, parent.problem));
        let assumptions = parent.context.assumptions.clone();

        let id = self.fresh_id("node");
        let node = TreeNode {
            id: id.clone(),
            parent_id: Some(parent_id.to_string()),
            kind: NodeKind::Problem,
            title: format!("Sub-problem: {}", truncate(problem, 50)),
            problem: problem.to_string(),
            solution: String::new(),
            status: NodeStatus::Open,
            children: Vec::new(),
            context: NodeContext {
                ancestor_summary: summary_lines.join("\n"),
                assumptions,
                step_number: None,
                sub_problem_side: side,
            },
        };
        self.add_node(node)?;
        Ok(id)
    }

    /// Creates a step node under a problem. Step titles keep the `Step N`
    /// convention so legacy readers of exports still classify them.
    pub fn create_step(
        &mut self,
        problem_id: &str,
        index: u32,
        title: &str,
        content: &str,
    ) -> Result<String, StoreError> {
        let id = self.fresh_id("step");
        let node = TreeNode {
            id: id.clone(),
            parent_id: Some(problem_id.to_string()),
            kind: NodeKind::Step,
            title: title.to_string(),
            problem: content.to_string(),
            solution: String::new(),
            status: NodeStatus::Open,
            children: Vec::new(),
            context: NodeContext {
                step_number: Some(index),
                ..NodeContext::default()
            },
        };
        self.add_node(node)?;
        Ok(id)
    }

    /// Chain of ancestors of `id`, root first, excluding the node itself.
    pub fn ancestors(&self, id: &str) -> Vec<&TreeNode> {
        let mut chain = Vec::new();
        let mut current = self.nodes.get(id).and_then(|node| node.parent_id.as_deref());
        while let Some(ancestor_id) = current {
            let Some(node) = self.nodes.get(ancestor_id) else {
                break;
            };
            chain.push(node);
            current = node.parent_id.as_deref();
        }
        chain.reverse();
        chain
    }

    /// Ids of every node below `id`, preorder.
    pub fn descendants(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack: Vec<String> = self
            .nodes
            .get(id)
            .map(|node| node.children.clone())
            .unwrap_or_default();
        stack.reverse();
        while let Some(child_id) = stack.pop() {
            if let Some(child) = self.nodes.get(&child_id) {
                for grandchild in child.children.iter().rev() {
                    stack.push(grandchild.clone());
                }
            }
            out.push(child_id);
        }
        out
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root_id = None;
    }

    pub fn export_tree(&self) -> String {
        let export = TreeExport {
            version: EXPORT_VERSION,
            root_id: self.root_id.clone(),
            nodes: self.nodes.values().cloned().collect(),
        };
        serde_json::to_string_pretty(&export).expect("tree export is always serializable")
    }

    /// Rebuilds a store from an exported tree. Version-0 exports predate the
    /// explicit `kind` tag, so their steps are recognized once by title and
    /// re-tagged; children referencing absent nodes are dropped rather than
    /// rejected.
    pub fn import_tree(data: &str) -> Result<Self, StoreError> {
        let export: TreeExport = serde_json::from_str(data)?;
        let mut nodes: BTreeMap<String, TreeNode> = export
            .nodes
            .into_iter()
            .map(|node| (node.id.clone(), node))
            .collect();
        if export.version == 0 {
            migrate_legacy_kinds(&mut nodes);
        }
        let known: Vec<String> = nodes.keys().cloned().collect();
        for id in &known {
            let stale: Vec<String> = nodes[id]
                .children
                .iter()
                .filter(|child| !nodes.contains_key(*child))
                .cloned()
                .collect();
            if !stale.is_empty()
                && let Some(node) = nodes.get_mut(id)
            {
                node.children.retain(|child| !stale.contains(child));
            }
        }
        let root_id = export.root_id.filter(|id| nodes.contains_key(id));
        Ok(Self { nodes, root_id })
    }

    fn is_ancestor(&self, candidate: &str, id: &str) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == candidate {
                return true;
            }
            current = self
                .nodes
                .get(node_id)
                .and_then(|node| node.parent_id.as_deref());
        }
        false
    }

    fn fresh_id(&self, prefix: &str) -> String {
        let mut n = self.nodes.len() + 1;
        loop {
            let id = format!("{prefix}-{n}");
            if !self.nodes.contains_key(&id) {
                return id;
            }
            n += 1;
        }
    }
}

fn migrate_legacy_kinds(nodes: &mut BTreeMap<String, TreeNode>) {
    for node in nodes.values_mut() {
        if node.kind == NodeKind::Problem
            && let Some(caps) = STEP_TITLE_RE.captures(&node.title)
        {
            node.kind = NodeKind::Step;
            if node.context.step_number.is_none() {
                node.context.step_number = caps[1].parse().ok();
            }
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_cycles_at_attach_time() {
        let mut store = TreeStore::new();
        let root = store.create_root("ship the release");
        let step = store.create_step(&root, 1, "Step 1: plan", "write the plan").unwrap();
        let sub = store
            .create_sub_problem(&step, "nested", Some(Side::Right))
            .unwrap();

        let err = store.attach(&root, &sub).unwrap_err();
        assert!(matches!(err, StoreError::WouldCycle { .. }));
        let err = store.attach(&step, &step).unwrap_err();
        assert!(matches!(err, StoreError::WouldCycle { .. }));

        // Moving a subtree sideways is still allowed.
        let step2 = store.create_step(&root, 2, "Step 2: build", "build it").unwrap();
        store.attach(&sub, &step2).unwrap();
        assert_eq!(store.get(&sub).unwrap().parent_id.as_deref(), Some(step2.as_str()));
        assert!(store.get(&step).unwrap().children.is_empty());
    }

    #[test]
    fn delete_removes_subtree_and_parent_link() {
        let mut store = TreeStore::new();
        let root = store.create_root("root");
        let step = store.create_step(&root, 1, "Step 1", "a").unwrap();
        let sub = store
            .create_sub_problem(&step, "nested", Some(Side::Left))
            .unwrap();
        store.delete_node(&step).unwrap();
        assert!(store.get(&step).is_none());
        assert!(store.get(&sub).is_none());
        assert!(store.get(&root).unwrap().children.is_empty());
    }

    #[test]
    fn export_then_import_round_trips_root() {
        let mut store = TreeStore::new();
        let root = store.create_root("root");
        store.create_step(&root, 1, "Step 1", "a").unwrap();
        let restored = TreeStore::import_tree(&store.export_tree()).unwrap();
        assert_eq!(restored.root_id(), Some(root.as_str()));
        assert_eq!(restored.len(), 2);
    }

    #[test]
    fn legacy_import_infers_step_kind_from_title() {
        let data = r#"{
            "rootId": "p",
            "nodes": [
                {"id": "p", "title": "Root Problem", "children": ["s"]},
                {"id": "s", "parentId": "p", "title": "Step 2: measure", "children": []}
            ]
        }"#;
        let store = TreeStore::import_tree(data).unwrap();
        let step = store.get("s").unwrap();
        assert_eq!(step.kind, NodeKind::Step);
        assert_eq!(step.context.step_number, Some(2));
        assert_eq!(store.get("p").unwrap().kind, NodeKind::Problem);
    }

    #[test]
    fn import_drops_dangling_children() {
        let data = r#"{
            "version": 1,
            "rootId": "p",
            "nodes": [
                {"id": "p", "title": "Root Problem", "children": ["gone", "s"]},
                {"id": "s", "parentId": "p", "kind": "step", "title": "Step 1", "children": []}
            ]
        }"#;
        let store = TreeStore::import_tree(data).unwrap();
        assert_eq!(store.get("p").unwrap().children, vec!["s".to_string()]);
    }

    #[test]
    fn ancestor_summary_accumulates_down_the_chain() {
        let mut store = TreeStore::new();
        let root = store.create_root("top problem");
        let step = store.create_step(&root, 1, "Step 1: split", "split it").unwrap();
        let sub = store
            .create_sub_problem(&step, "smaller problem", Some(Side::Right))
            .unwrap();
        let summary = &store.get(&sub).unwrap().context.ancestor_summary;
        assert!(summary.contains("Root Problem: top problem"));
        assert!(summary.contains("Step 1: split"));
    }
}
