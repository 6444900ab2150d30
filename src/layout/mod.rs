//! Two-pass recursive tree layout.
//!
//! Pass 1 walks bottom-up and measures how much horizontal room every
//! subtree needs. Same-side siblings accumulate by *sum*, not max: each one
//! gets a disjoint horizontal band, which makes the no-overlap guarantee
//! hold by construction at the cost of some whitespace. Pass 2 walks
//! top-down, stacks each node's steps into a gapless vertical trunk and
//! pushes child subtrees outward from the trunk edge, ordered by the index
//! of the step that spawned them.
//!
//! Both passes are pure functions of the input tree and the config; running
//! them twice on the same tree yields bit-identical coordinates.

pub(crate) mod types;
pub use types::*;

use crate::config::{ConfigError, LayoutConfig};
use crate::store::Side;

/// Annotates every node of the tree with its trunk position and subtree
/// widths, placing the root trunk at the origin.
pub fn compute_layout(root: &mut ProblemNode, config: &LayoutConfig) -> Result<(), ConfigError> {
    compute_layout_at(root, 0.0, 0.0, config)
}

/// Same as [`compute_layout`] with a caller-supplied root origin.
pub fn compute_layout_at(
    root: &mut ProblemNode,
    origin_x: f32,
    origin_y: f32,
    config: &LayoutConfig,
) -> Result<(), ConfigError> {
    config.validate()?;
    measure_subtree(root, config);
    assign_positions(root, origin_x, origin_y, config);
    Ok(())
}

/// Bounding box of the laid-out tree: headers plus step stacks of every
/// node, `(min_x, min_y, max_x, max_y)`.
pub fn tree_bounds(node: &ProblemNode) -> (f32, f32, f32, f32) {
    let mut min_x = node.x - node.box_width / 2.0;
    let mut max_x = node.x + node.box_width / 2.0;
    let mut min_y = node.y;
    let mut max_y = node.y + node.trunk_height();
    for child in &node.children {
        let (cx0, cy0, cx1, cy1) = tree_bounds(child);
        min_x = min_x.min(cx0);
        min_y = min_y.min(cy0);
        max_x = max_x.max(cx1);
        max_y = max_y.max(cy1);
    }
    (min_x, min_y, max_x, max_y)
}

fn side_width(children: &[ProblemNode], side: Side, gap: f32) -> f32 {
    let mut total = 0.0f32;
    let mut count = 0usize;
    for child in children {
        if child.side == Some(side) {
            total += child.subtree_width;
            count += 1;
        }
    }
    if count > 0 {
        total + gap * (count as f32 - 1.0)
    } else {
        0.0
    }
}

/// Pass 1: bottom-up width measurement.
fn measure_subtree(node: &mut ProblemNode, config: &LayoutConfig) {
    for child in &mut node.children {
        measure_subtree(child, config);
    }
    let gap = config.horizontal_gap;
    node.left_subtree_width = side_width(&node.children, Side::Left, gap);
    node.right_subtree_width = side_width(&node.children, Side::Right, gap);

    // An empty side contributes neither width nor a gap.
    let mut required = node.left_subtree_width + node.box_width + node.right_subtree_width;
    if node.left_subtree_width > 0.0 {
        required += gap;
    }
    if node.right_subtree_width > 0.0 {
        required += gap;
    }
    node.subtree_width = node.box_width.max(required);
}

/// Pass 2: top-down position assignment.
fn assign_positions(node: &mut ProblemNode, trunk_x: f32, top_y: f32, config: &LayoutConfig) {
    node.x = trunk_x;
    node.y = top_y;

    // Steps stack straight down from the header, no inter-step gap.
    let mut step_y = top_y + node.header_height;
    for step in &mut node.steps {
        step.y = step_y;
        step_y += step.height;
    }

    place_side(node, Side::Left, config);
    place_side(node, Side::Right, config);
}

fn place_side(node: &mut ProblemNode, side: Side, config: &LayoutConfig) {
    let gap = config.horizontal_gap;
    // Resolve step order and tops up front; children are borrowed mutably
    // below.
    let steps: Vec<(String, u32, f32)> = node
        .steps
        .iter()
        .map(|step| (step.id.clone(), step.index, step.y))
        .collect();
    let resolve = |parent_step_id: &Option<String>| -> Option<(u32, f32)> {
        let id = parent_step_id.as_deref()?;
        steps
            .iter()
            .find(|(step_id, _, _)| step_id == id)
            .map(|(_, index, y)| (*index, *y))
    };

    // Children on this side, ordered by the index of the step that spawned
    // them (stable, so same-step children keep their adapter order). A child
    // whose step cannot be resolved is skipped without advancing the offset;
    // the adapter never emits such a child.
    let mut placed: Vec<(u32, f32, usize)> = Vec::new();
    for (idx, child) in node.children.iter().enumerate() {
        if child.side != Some(side) {
            continue;
        }
        if let Some((step_index, step_top)) = resolve(&child.parent_step_id) {
            placed.push((step_index, step_top, idx));
        }
    }
    placed.sort_by_key(|(step_index, _, _)| *step_index);

    let mut offset = match side {
        Side::Left => node.x - node.box_width / 2.0 - gap,
        Side::Right => node.x + node.box_width / 2.0 + gap,
    };
    for (_, step_top, idx) in placed {
        let child = &mut node.children[idx];
        // The near edge of the child's whole subtree touches the running
        // offset; the trunk sits inside the subtree past the far-side block.
        let child_x = match side {
            Side::Left => offset - child.right_subtree_width - child.box_width / 2.0,
            Side::Right => offset + child.left_subtree_width + child.box_width / 2.0,
        };
        let span = child.span();
        assign_positions(child, child_x, step_top, config);
        offset = match side {
            Side::Left => offset - span - gap,
            Side::Right => offset + span + gap,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str, step_id: &str, side: Side, config: &LayoutConfig) -> ProblemNode {
        let mut node = ProblemNode::new(id, config);
        node.parent_step_id = Some(step_id.to_string());
        node.side = Some(side);
        node
    }

    fn two_step_root(config: &LayoutConfig) -> ProblemNode {
        let mut root = ProblemNode::new("root", config);
        root.steps.push(StepLayout::new("s1", 1, config.step_base_height));
        root.steps.push(StepLayout::new("s2", 2, config.step_base_height));
        root
    }

    #[test]
    fn leaf_subtree_width_is_box_width() {
        let config = LayoutConfig::default();
        let mut root = ProblemNode::new("root", &config);
        compute_layout(&mut root, &config).unwrap();
        assert_eq!(root.subtree_width, config.box_width);
        assert_eq!(root.left_subtree_width, 0.0);
        assert_eq!(root.right_subtree_width, 0.0);
    }

    #[test]
    fn empty_side_adds_no_phantom_gap() {
        let config = LayoutConfig::default();
        let mut root = two_step_root(&config);
        root.children.push(leaf("a", "s1", Side::Right, &config));
        compute_layout(&mut root, &config).unwrap();
        assert_eq!(root.left_subtree_width, 0.0);
        assert_eq!(
            root.subtree_width,
            config.box_width * 2.0 + config.horizontal_gap
        );
    }

    #[test]
    fn same_side_siblings_accumulate_by_sum() {
        let config = LayoutConfig::default();
        let mut root = two_step_root(&config);
        root.children.push(leaf("a", "s1", Side::Right, &config));
        root.children.push(leaf("b", "s2", Side::Right, &config));
        compute_layout(&mut root, &config).unwrap();
        assert_eq!(
            root.right_subtree_width,
            config.box_width * 2.0 + config.horizontal_gap
        );
    }

    #[test]
    fn children_order_follows_step_index_not_insertion() {
        let config = LayoutConfig::default();
        let mut root = two_step_root(&config);
        // Inserted in reverse step order on purpose.
        root.children.push(leaf("later", "s2", Side::Right, &config));
        root.children.push(leaf("earlier", "s1", Side::Right, &config));
        compute_layout(&mut root, &config).unwrap();
        let later = root.children.iter().find(|c| c.id == "later").unwrap();
        let earlier = root.children.iter().find(|c| c.id == "earlier").unwrap();
        assert!(earlier.x < later.x, "step-1 child must sit nearer the trunk");
    }

    #[test]
    fn dangling_step_reference_is_skipped_without_advancing() {
        let config = LayoutConfig::default();
        let mut root = two_step_root(&config);
        root.children.push(leaf("ghost", "no-such-step", Side::Right, &config));
        root.children.push(leaf("real", "s1", Side::Right, &config));
        compute_layout(&mut root, &config).unwrap();
        let real = root.children.iter().find(|c| c.id == "real").unwrap();
        let expected_x = config.box_width / 2.0 + config.horizontal_gap + config.box_width / 2.0;
        assert_eq!(real.x, expected_x);
        let ghost = root.children.iter().find(|c| c.id == "ghost").unwrap();
        assert_eq!((ghost.x, ghost.y), (0.0, 0.0));
    }

    #[test]
    fn recompute_is_idempotent() {
        let config = LayoutConfig::default();
        let mut root = two_step_root(&config);
        root.children.push(leaf("a", "s1", Side::Left, &config));
        root.children.push(leaf("b", "s2", Side::Right, &config));
        compute_layout(&mut root, &config).unwrap();
        let first = root.clone();
        compute_layout(&mut root, &config).unwrap();
        assert_eq!(root, first);
    }

    #[test]
    fn invalid_config_fails_before_touching_the_tree() {
        let config = LayoutConfig {
            box_width: -1.0,
            ..LayoutConfig::default()
        };
        let mut root = ProblemNode::new("root", &config);
        assert!(compute_layout(&mut root, &config).is_err());
    }
}
