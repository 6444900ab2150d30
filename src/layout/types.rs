use crate::config::LayoutConfig;
use crate::store::Side;

/// One step box in a problem's trunk. `y` is assigned by the position pass;
/// until then it is 0.
#[derive(Debug, Clone, PartialEq)]
pub struct StepLayout {
    pub id: String,
    /// 1-based sequence number. Steps stack in ascending order and children
    /// on a side are placed outward in this order.
    pub index: u32,
    pub height: f32,
    pub y: f32,
}

impl StepLayout {
    pub fn new(id: impl Into<String>, index: u32, height: f32) -> Self {
        Self {
            id: id.into(),
            index,
            height,
            y: 0.0,
        }
    }
}

/// A problem with its ordered step trunk and side-tagged sub-problem
/// subtrees. This is the layout engine's whole world: it is rebuilt from the
/// store on every change and annotated in place by [`compute_layout`].
///
/// [`compute_layout`]: crate::layout::compute_layout
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemNode {
    pub id: String,
    /// Step of the logical parent that spawned this node; `None` for the
    /// root.
    pub parent_step_id: Option<String>,
    /// Required for every non-root node, `None` for the root.
    pub side: Option<Side>,
    pub box_width: f32,
    pub header_height: f32,
    pub steps: Vec<StepLayout>,
    pub children: Vec<ProblemNode>,
    /// Horizontal center of this node's header box.
    pub x: f32,
    /// Top of the header box.
    pub y: f32,
    /// Total horizontal span of this node and all descendants.
    pub subtree_width: f32,
    pub left_subtree_width: f32,
    pub right_subtree_width: f32,
}

impl ProblemNode {
    pub fn new(id: impl Into<String>, config: &LayoutConfig) -> Self {
        Self {
            id: id.into(),
            parent_step_id: None,
            side: None,
            box_width: config.box_width,
            header_height: config.header_height,
            steps: Vec::new(),
            children: Vec::new(),
            x: 0.0,
            y: 0.0,
            subtree_width: 0.0,
            left_subtree_width: 0.0,
            right_subtree_width: 0.0,
        }
    }

    /// Header plus the full step stack.
    pub fn trunk_height(&self) -> f32 {
        self.header_height + self.steps.iter().map(|step| step.height).sum::<f32>()
    }

    pub fn step(&self, id: &str) -> Option<&StepLayout> {
        self.steps.iter().find(|step| step.id == id)
    }

    /// Full horizontal span of the subtree: left block, own box, right block.
    pub fn span(&self) -> f32 {
        self.left_subtree_width + self.box_width + self.right_subtree_width
    }
}
