use crate::cmd::Workspace;
use crate::output::{confidence, list, print_json};
use serde_json::json;

pub fn run(ws: &Workspace, input: &str, recent: &[String], json: bool) -> anyhow::Result<()> {
    let engine = ws.engine()?;
    let rec = engine.get_routing_recommendation(input, recent);
    let explanation = engine.explain_recommendation(&rec);

    if json {
        return print_json(&json!({
            "recommendation": rec,
            "explanation": explanation,
        }));
    }

    let factors = &explanation.context_factors;
    let breakdown = &explanation.confidence_breakdown;
    println!("{}  (confidence {})", rec.command(), confidence(rec.confidence()));
    println!("{}", explanation.decision_path);
    println!();
    println!(
        "project:   {} files, {} ({})",
        factors.file_count, factors.project_type, factors.project_complexity
    );
    println!("patterns:  {}", list(&factors.detected_patterns));
    println!(
        "confidence: base {} {:+.2} from context; {}",
        confidence(breakdown.base_confidence),
        breakdown.context_adjustments,
        breakdown.learning_adjustments
    );
    if !explanation.alternative_paths.is_empty() {
        println!();
        println!("alternatives:");
        for alt in &explanation.alternative_paths {
            println!("  {}  {}", alt.command, alt.reason);
        }
    }
    Ok(())
}
