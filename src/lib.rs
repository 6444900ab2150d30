pub mod adapter;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod layout;
pub mod layout_dump;
pub mod steps;
pub mod store;

pub use adapter::build_layout_tree;
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, load_config};
pub use layout::{ProblemNode, StepLayout, compute_layout, compute_layout_at, tree_bounds};
pub use store::{Side, TreeStore};
