use crate::output::{confidence, list, print_json};
use anyhow::Context;
use clap::Args;
use router_core::simulate::{DecisionSimulator, SimulationContext};
use router_core::tree::DecisionPath;

#[derive(Args)]
pub struct SimulateArgs {
    /// Free-text description of the request (recorded, not interpreted)
    #[arg(long)]
    request: Option<String>,
    /// Files the change touches
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    file_count: Option<i64>,
    /// Estimated lines changed
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    lines: Option<i64>,
    /// Complexity label (informational)
    #[arg(long)]
    complexity: Option<String>,
    /// The problem needs investigation before changing anything
    #[arg(long)]
    research: bool,
    /// The change reaches production
    #[arg(long)]
    production: bool,
    /// The change adds new functionality
    #[arg(long)]
    new_feature: bool,
    /// Several components or people must coordinate
    #[arg(long)]
    coordination: bool,
    /// Failure would be safety critical
    #[arg(long)]
    safety_critical: bool,
    /// short, medium or extended
    #[arg(long)]
    duration: Option<String>,
}

impl SimulateArgs {
    fn into_context(self) -> SimulationContext {
        SimulationContext {
            request: self.request,
            file_count: self.file_count,
            lines_estimate: self.lines,
            complexity: self.complexity,
            research_needed: self.research.then_some(true),
            production_impact: self.production.then_some(true),
            new_functionality: self.new_feature.then_some(true),
            coordination_required: self.coordination.then_some(true),
            safety_critical: self.safety_critical.then_some(true),
            duration: self.duration,
        }
    }
}

pub fn run(args: SimulateArgs, json: bool) -> anyhow::Result<()> {
    walk_and_print(&args.into_context(), json)
}

pub(crate) fn walk_and_print(ctx: &SimulationContext, json: bool) -> anyhow::Result<()> {
    let sim = DecisionSimulator::new().context("failed to build decision graph")?;
    let path = sim.simulate_routing_decision(ctx);
    if json {
        return print_json(&path);
    }
    print_path(&path);
    Ok(())
}

fn print_path(path: &DecisionPath) {
    println!(
        "{}  (confidence {})",
        path.final_recommendation,
        confidence(path.confidence_score)
    );
    println!();
    for (step, reason) in path.reasoning.iter().enumerate() {
        println!("{:>2}. {reason}", step + 1);
    }
    println!();
    println!("path:         {}", path.node_ids().join(" -> "));
    println!("alternatives: {}", list(&path.alternatives));
}
