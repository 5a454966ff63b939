//! Command-line harness: builds (or loads) a graph, requests a region at its
//! output and prints the region the input has to cover.

use clap::Parser;
use lazyasg::analysis::region_propagation::{PropagationConfig, PropagationMode, RegionPropagation};
use lazyasg::asg::Asg;
use lazyasg::nn::{Conv2dConfig, UNet, UNetConfig};
use lazyasg::region::Region;
use lazyasg::serialization::{load_graph, save_graph};
use lazyasg::tensor::GraphContext;
use std::path::PathBuf;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Receptive-field calculator for tiled evaluation", long_about = None)]
struct Args {
    /// Load the graph from a JSON file instead of building a U-Net
    #[arg(short, long)]
    graph: Option<PathBuf>,

    /// U-Net depth (number of pooling steps)
    #[arg(long, default_value_t = 4)]
    depth: usize,

    /// Convolutions per U-Net block
    #[arg(long, default_value_t = 2)]
    convs_per_block: usize,

    /// Convolution kernel size
    #[arg(long, default_value_t = 3)]
    kernel_size: usize,

    /// Requested output region, `low:high` per dimension, comma separated
    #[arg(short, long, default_value = "-2:386,-2:386", allow_hyphen_values = true)]
    region: Region,

    /// Re-propagate even when a node's region did not change
    #[arg(long)]
    eager: bool,

    /// Write the graph, with accumulated regions, to this JSON file
    #[arg(short, long)]
    save: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut graph = match &args.graph {
        Some(path) => load_graph(path)?,
        None => build_unet(&args)?,
    };
    log::info!("Graph has {} nodes", graph.nodes.len());

    let mode = if args.eager { PropagationMode::Eager } else { PropagationMode::SkipUnchanged };
    let engine = RegionPropagation::new(PropagationConfig::default().with_mode(mode));

    let outputs = graph.outputs.clone();
    if outputs.is_empty() {
        return Err("graph has no output node".into());
    }
    for output in outputs {
        let stats = engine.run(&mut graph, output, &args.region)?;
        println!(
            "Output node {}: {} node visits ({} skipped)",
            output, stats.visits, stats.skipped
        );
    }

    for &input in &graph.inputs {
        let node = graph.get_node(input)?;
        let label = node.name.clone().unwrap_or_else(|| input.to_string());
        match &node.requested_region {
            Some(region) => {
                println!("Input '{}': {}", label, region);
                println!("Span per dimension: {:?}", region.spans());
            }
            None => println!("Input '{}': not reached", label),
        }
    }

    if let Some(path) = &args.save {
        save_graph(path, &graph)?;
        println!("Graph saved to {}", path.display());
    }
    Ok(())
}

fn build_unet(args: &Args) -> Result<Asg, Box<dyn std::error::Error>> {
    let context = GraphContext::new().shared();
    let config = UNetConfig::default()
        .with_depth(args.depth)
        .with_convs_per_block(args.convs_per_block)
        .with_conv(Conv2dConfig::new(args.kernel_size));
    UNet::build(&context, &config)?;
    let graph = context.borrow().main_graph().clone();
    Ok(graph)
}
