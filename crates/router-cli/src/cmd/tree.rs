use crate::output::{confidence, print_json, print_table};
use anyhow::Context;
use router_core::tree::default_graph;
use serde_json::json;

pub fn run(json: bool) -> anyhow::Result<()> {
    let graph = default_graph().context("failed to build decision graph")?;

    if json {
        return print_json(&json!({
            "nodes": graph.nodes(),
            "edges": graph.edges(),
            "order": graph.topological_order(),
        }));
    }

    let rows = graph
        .topological_order()
        .into_iter()
        .filter_map(|id| graph.node(id))
        .map(|node| {
            let next: Vec<String> = graph
                .outgoing(&node.node_id)
                .into_iter()
                .map(|e| match &e.condition {
                    Some(label) => format!("{label}: {}", e.to),
                    None => e.to.clone(),
                })
                .collect();
            vec![
                node.node_id.clone(),
                node.node_type.to_string(),
                confidence(node.confidence),
                node.command().unwrap_or("-").to_string(),
                if next.is_empty() { "-".to_string() } else { next.join(", ") },
            ]
        })
        .collect();
    print_table(&["NODE", "TYPE", "CONFIDENCE", "COMMAND", "NEXT"], rows);
    Ok(())
}
