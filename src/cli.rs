use crate::adapter::build_layout_tree;
use crate::config::load_config;
use crate::layout::compute_layout_at;
use crate::layout_dump::{LayoutDump, write_layout_dump};
use crate::store::TreeStore;
use anyhow::Result;
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "steptree",
    version,
    about = "Two-pass layout for problem-decomposition trees"
)]
pub struct Args {
    /// Input tree export (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout dump. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON5 file overriding layout geometry
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Lay out the subtree rooted at this node instead of the stored root
    #[arg(long = "root")]
    pub root: Option<String>,

    /// X coordinate of the root trunk
    #[arg(long = "origin-x", default_value_t = 0.0)]
    pub origin_x: f32,

    /// Y coordinate of the root header top
    #[arg(long = "origin-y", default_value_t = 0.0)]
    pub origin_y: f32,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let input = read_input(args.input.as_deref())?;
    let store = TreeStore::import_tree(&input)?;
    let mut tree = build_layout_tree(&store, args.root.as_deref(), &config.layout)
        .ok_or_else(|| anyhow::anyhow!("no root problem found in input"))?;
    compute_layout_at(&mut tree, args.origin_x, args.origin_y, &config.layout)?;

    match args.output.as_deref() {
        Some(path) => write_layout_dump(path, &tree)?,
        None => println!("{}", LayoutDump::from_tree(&tree).to_json()),
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
