//! Integration tests for region propagation through whole graphs.

use lazyasg::analysis::region_propagation::{
    PropagationConfig, PropagationError, PropagationMode, RegionPropagation,
};
use lazyasg::asg::{Asg, NodeType};
use lazyasg::nn::{UNet, UNetConfig};
use lazyasg::region::Region;
use lazyasg::serialization::{from_json, load_graph, save_graph, to_json};
use lazyasg::tensor::{GraphContext, Tensor};

fn region(bounds: &[(i64, i64)]) -> Region {
    Region::from_bounds(bounds).unwrap()
}

fn build_unet(mode: PropagationMode) -> UNet {
    let context = GraphContext::with_config(PropagationConfig::default().with_mode(mode)).shared();
    UNet::build(&context, &UNetConfig::default()).unwrap()
}

#[test]
fn unet_input_region_matches_reference() {
    let unet = build_unet(PropagationMode::Eager);
    let stats = unet.output.request_region(&region(&[(-2, 386), (-2, 386)])).unwrap();

    let input_region = unet.input.requested_region().unwrap().unwrap();
    assert_eq!(input_region.bounds(), vec![(-94, 478), (-94, 478)]);
    assert_eq!(input_region.spans(), vec![572, 572]);
    assert_eq!(stats.visits, 61);
    assert_eq!(stats.skipped, 0);

    // Encoder ends reached through the skip connections.
    assert_eq!(unet.skips[0].requested_region().unwrap().unwrap().bounds(), vec![(-92, 476), (-92, 476)]);
}

#[test]
fn skip_unchanged_matches_eager_on_every_node() {
    let eager = build_unet(PropagationMode::Eager);
    let lazy = build_unet(PropagationMode::SkipUnchanged);
    let request = region(&[(-2, 386), (-2, 386)]);

    eager.output.request_region(&request).unwrap();
    lazy.output.request_region(&request).unwrap();

    let eager_graph = eager.input.context.borrow().main_graph().clone();
    let lazy_graph = lazy.input.context.borrow().main_graph().clone();
    assert_eq!(eager_graph.nodes.len(), lazy_graph.nodes.len());
    for (id, node) in &eager_graph.nodes {
        assert_eq!(
            node.requested_region,
            lazy_graph.get_node(*id).unwrap().requested_region,
            "node {:?} differs",
            node.name
        );
    }
}

#[test]
fn repeated_requests_only_grow() {
    let unet = build_unet(PropagationMode::SkipUnchanged);
    let requests = [
        region(&[(0, 100), (0, 100)]),
        region(&[(50, 80), (-10, 20)]),
        region(&[(-30, 60), (90, 200)]),
        region(&[(10, 20), (10, 20)]),
    ];

    let mut previous: Option<Region> = None;
    for request in &requests {
        unet.output.request_region(request).unwrap();
        let current = unet.input.requested_region().unwrap().unwrap();
        if let Some(prev) = &previous {
            assert!(current.contains(prev), "{} does not contain {}", current, prev);
        }
        previous = Some(current);
    }

    let output_region = unet.output.requested_region().unwrap().unwrap();
    assert_eq!(output_region.bounds(), vec![(-30, 100), (-10, 200)]);
}

#[test]
fn unchanged_request_is_skipped_at_the_root() {
    let unet = build_unet(PropagationMode::SkipUnchanged);
    let request = region(&[(0, 64), (0, 64)]);

    let first = unet.output.request_region(&request).unwrap();
    let before = unet.input.requested_region();
    let second = unet.output.request_region(&region(&[(8, 16), (8, 16)])).unwrap();

    assert!(first.propagated > 0);
    assert_eq!((second.visits, second.propagated, second.skipped), (1, 0, 1));
    assert_eq!(unet.input.requested_region(), before);
}

#[test]
fn cycle_in_loaded_graph_is_detected() {
    let mut asg = Asg::new(0, None);
    let input = asg.add_input("input");
    let a = asg.add_node(None, None, NodeType::Convolution { input, margin: 1 }).unwrap();
    let b = asg.add_node(None, None, NodeType::Pooling { input: a, factor: 2 }).unwrap();
    asg.set_output(b);

    // Rewire a -> b through serialization, which does not reject cycles.
    let mut json: serde_json::Value = serde_json::from_str(&to_json(&asg).unwrap()).unwrap();
    json["nodes"][a.to_string()]["node_type"]["Convolution"]["input"] = serde_json::json!(b);
    let mut cyclic = from_json(&json.to_string()).unwrap();

    for mode in [PropagationMode::Eager, PropagationMode::SkipUnchanged] {
        cyclic.reset_regions();
        let engine = RegionPropagation::new(PropagationConfig::default().with_mode(mode));
        let err = engine.run(&mut cyclic, b, &region(&[(0, 4)]));
        assert_eq!(err, Err(PropagationError::CycleDetected(b)));
    }
}

#[test]
fn diamond_is_not_a_cycle() {
    let context = GraphContext::new().shared();
    let input = Tensor::new_input(&context, "input");
    let shared = input.conv(1).unwrap();
    let left = shared.pool(2).unwrap().upsample(2).unwrap();
    let out = Tensor::concat(&[&shared, &left]).unwrap();

    out.request_region(&region(&[(1, 11)])).unwrap();
    // left: upsample [1,11] -> [0,6], pool -> [0,12]; merged with [1,11] at `shared`.
    assert_eq!(shared.requested_region().unwrap().unwrap().bounds(), vec![(0, 12)]);
    assert_eq!(input.requested_region().unwrap().unwrap().bounds(), vec![(-1, 13)]);
}

#[test]
fn dimension_mismatch_surfaces_from_handle() {
    let context = GraphContext::new().shared();
    let input = Tensor::new_input(&context, "input");
    let out = input.conv(1).unwrap();

    out.request_region(&region(&[(0, 4), (0, 4)])).unwrap();
    let err = out.request_region(&region(&[(0, 4)])).unwrap_err();
    assert_eq!(
        err,
        PropagationError::DimensionMismatch { node_id: out.node_id, expected: 2, actual: 1 }
    );
}

#[test]
fn saved_graph_keeps_accumulated_regions() {
    let unet = build_unet(PropagationMode::SkipUnchanged);
    unet.output.request_region(&region(&[(0, 16), (0, 16)])).unwrap();
    let graph = unet.input.context.borrow().main_graph().clone();

    let path = std::env::temp_dir().join(format!("lazyasg_unet_{}.json", std::process::id()));
    save_graph(&path, &graph).unwrap();
    let loaded = load_graph(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded, graph);
    assert_eq!(
        loaded.requested_region(unet.input.node_id).unwrap(),
        unet.input.requested_region().unwrap().as_ref()
    );
}
