use crate::cmd::Workspace;
use crate::output::{confidence, list, print_json, print_table};
use router_core::recommendation::RoutingRecommendation;

pub fn run(
    ws: &Workspace,
    input: &str,
    recent: &[String],
    max: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let engine = ws.engine()?;

    match max {
        Some(n) => {
            let recs = engine.get_multiple_recommendations(input, recent, n);
            if json {
                return print_json(&recs);
            }
            if recs.is_empty() {
                println!("No recommendations.");
                return Ok(());
            }
            let rows = recs
                .iter()
                .enumerate()
                .map(|(i, rec)| {
                    vec![
                        (i + 1).to_string(),
                        rec.command().to_string(),
                        confidence(rec.confidence()),
                        rec.reasoning().to_string(),
                    ]
                })
                .collect();
            print_table(&["#", "COMMAND", "CONFIDENCE", "REASONING"], rows);
        }
        None => {
            let rec = engine.get_routing_recommendation(input, recent);
            if json {
                return print_json(&rec);
            }
            print_recommendation(&rec);
            let seen = engine.suggested_commands(input);
            if !seen.is_empty() {
                println!("previously ran: {}", list(seen));
            }
        }
    }
    Ok(())
}

fn print_recommendation(rec: &RoutingRecommendation) {
    println!("{}  (confidence {})", rec.command(), confidence(rec.confidence()));
    println!("{}", rec.reasoning());
    println!("factors:      {}", list(rec.context_factors()));
    println!("alternatives: {}", list(rec.alternative_commands()));
}
