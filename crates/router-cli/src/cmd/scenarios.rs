use crate::output::{confidence, print_json, print_table};
use anyhow::Context;
use router_core::simulate::{sample_scenarios, DecisionSimulator, PathAnalysis};
use serde::Serialize;

#[derive(Serialize)]
struct ScenarioResult {
    name: String,
    expected: String,
    actual: String,
    confidence: f64,
    matched: bool,
}

pub fn run(json: bool) -> anyhow::Result<()> {
    let sim = DecisionSimulator::new().context("failed to build decision graph")?;
    let scenarios = sample_scenarios();
    let paths: Vec<_> = scenarios
        .iter()
        .map(|s| sim.simulate_routing_decision(&s.context))
        .collect();

    let results: Vec<ScenarioResult> = scenarios
        .iter()
        .zip(&paths)
        .map(|(s, path)| ScenarioResult {
            name: s.name.clone(),
            expected: s.expected_command.clone(),
            actual: path.final_recommendation.clone(),
            confidence: path.confidence_score,
            matched: s.expected_command == path.final_recommendation,
        })
        .collect();
    let analysis = PathAnalysis::from_paths(&paths);

    if json {
        return print_json(&serde_json::json!({
            "scenarios": results,
            "analysis": analysis,
        }));
    }

    let rows = results
        .iter()
        .map(|r| {
            vec![
                r.name.clone(),
                r.expected.clone(),
                r.actual.clone(),
                confidence(r.confidence),
                if r.matched { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_table(&["SCENARIO", "EXPECTED", "ACTUAL", "CONFIDENCE", "MATCH"], rows);

    let matched = results.iter().filter(|r| r.matched).count();
    println!();
    println!(
        "{matched}/{} matched; confidence min {} mean {} max {}",
        results.len(),
        confidence(analysis.min_confidence),
        confidence(analysis.mean_confidence),
        confidence(analysis.max_confidence)
    );
    if let Some(cmd) = analysis.most_common_recommendation() {
        println!("most common: {cmd}");
    }
    Ok(())
}
