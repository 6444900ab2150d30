use crate::layout::{ProblemNode, tree_bounds};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub origin_x: f32,
    pub origin_y: f32,
    pub nodes: Vec<NodeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub parent_step_id: Option<String>,
    pub side: Option<String>,
    pub x: f32,
    pub y: f32,
    pub box_width: f32,
    pub header_height: f32,
    pub subtree_width: f32,
    pub left_subtree_width: f32,
    pub right_subtree_width: f32,
    pub steps: Vec<StepDump>,
}

#[derive(Debug, Serialize)]
pub struct StepDump {
    pub id: String,
    pub index: u32,
    pub y: f32,
    pub height: f32,
}

impl LayoutDump {
    pub fn from_tree(root: &ProblemNode) -> Self {
        let (min_x, min_y, max_x, max_y) = tree_bounds(root);
        let mut nodes = Vec::new();
        flatten(root, &mut nodes);
        LayoutDump {
            width: max_x - min_x,
            height: max_y - min_y,
            origin_x: min_x,
            origin_y: min_y,
            nodes,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("layout dump is always serializable")
    }
}

fn flatten(node: &ProblemNode, out: &mut Vec<NodeDump>) {
    out.push(NodeDump {
        id: node.id.clone(),
        parent_step_id: node.parent_step_id.clone(),
        side: node.side.map(|side| format!("{side:?}").to_lowercase()),
        x: node.x,
        y: node.y,
        box_width: node.box_width,
        header_height: node.header_height,
        subtree_width: node.subtree_width,
        left_subtree_width: node.left_subtree_width,
        right_subtree_width: node.right_subtree_width,
        steps: node
            .steps
            .iter()
            .map(|step| StepDump {
                id: step.id.clone(),
                index: step.index,
                y: step.y,
                height: step.height,
            })
            .collect(),
    });
    for child in &node.children {
        flatten(child, out);
    }
}

pub fn write_layout_dump(path: &Path, root: &ProblemNode) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &LayoutDump::from_tree(root))?;
    Ok(())
}
