//! Graph (de)serialization.
//!
//! Graphs are stored as JSON: node wiring, parameters, component labels and
//! any regions accumulated so far. Loaded graphs are validated before they
//! are returned; cycles are left for propagation to report.

use crate::asg::{Asg, AsgError};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid graph: {0}")]
    InvalidGraph(#[from] AsgError),
}

type Result<T> = std::result::Result<T, SerializationError>;

pub fn to_json(asg: &Asg) -> Result<String> {
    Ok(serde_json::to_string_pretty(asg)?)
}

pub fn from_json(json: &str) -> Result<Asg> {
    let asg: Asg = serde_json::from_str(json)?;
    asg.validate()?;
    Ok(asg)
}

pub fn save_graph<P: AsRef<Path>>(path: P, asg: &Asg) -> Result<()> {
    fs::write(path.as_ref(), to_json(asg)?)?;
    log::debug!("Saved graph {} to {}", asg.id, path.as_ref().display());
    Ok(())
}

pub fn load_graph<P: AsRef<Path>>(path: P) -> Result<Asg> {
    let json = fs::read_to_string(path.as_ref())?;
    let asg = from_json(&json)?;
    log::debug!("Loaded graph with {} nodes from {}", asg.nodes.len(), path.as_ref().display());
    Ok(asg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asg::NodeType;

    #[test]
    fn test_json_keeps_wiring() {
        let mut asg = Asg::new(3, Some("tiny".into()));
        let input = asg.add_input("input");
        let up = asg
            .add_node(Some("u".into()), Some("upsample".into()), NodeType::Upsample { input, factor: 2 })
            .unwrap();
        asg.set_output(up);

        let restored = from_json(&to_json(&asg).unwrap()).unwrap();
        assert_eq!(restored, asg);
    }

    #[test]
    fn test_loaded_graph_with_sparse_ids_accepts_new_nodes() {
        let json = r#"{
            "id": 0, "name": null, "inputs": [0], "outputs": [2],
            "nodes": {
                "0": {"id": 0, "name": "input", "component": null, "node_type": "Input"},
                "2": {"id": 2, "name": "conv", "component": null,
                      "node_type": {"Convolution": {"input": 0, "margin": 1}}}
            }
        }"#;
        let mut asg = from_json(json).unwrap();
        let pool = asg
            .add_node(Some("pool".into()), None, NodeType::Pooling { input: 0, factor: 2 })
            .unwrap();

        assert_eq!(pool, 3);
        assert_eq!(asg.nodes.len(), 3);
        assert_eq!(asg.get_node(2).unwrap().name.as_deref(), Some("conv"));
        assert_eq!(asg.get_node(pool).unwrap().name.as_deref(), Some("pool"));
    }

    #[test]
    fn test_from_json_rejects_dangling_input() {
        let json = r#"{
            "id": 0, "name": null, "inputs": [], "outputs": [1],
            "nodes": {
                "1": {"id": 1, "name": null, "component": null,
                      "node_type": {"Convolution": {"input": 5, "margin": 1}}}
            }
        }"#;
        assert!(matches!(
            from_json(json),
            Err(SerializationError::InvalidGraph(AsgError::NodeNotFound(5)))
        ));
    }

    #[test]
    fn test_from_json_rejects_inverted_region() {
        let json = r#"{
            "id": 0, "name": null, "inputs": [0], "outputs": [0],
            "nodes": {
                "0": {"id": 0, "name": null, "component": null, "node_type": "Input",
                      "requested_region": [[4, 1]]}
            }
        }"#;
        assert!(matches!(from_json(json), Err(SerializationError::JsonError(_))));
    }
}
