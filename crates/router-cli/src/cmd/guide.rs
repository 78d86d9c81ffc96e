use crate::cmd::simulate::walk_and_print;
use clap::Args;
use router_core::simulate::{
    map_answers_to_context, Criticality, Duration, FileScope, Purpose, Questionnaire,
    Understanding,
};

/// Answers to the guided questions. Run `router guide --help` for the
/// accepted values of each.
#[derive(Args)]
pub struct GuideArgs {
    /// What are you trying to do? (fix-bug, add-feature, understand-code, refactor, deploy, other)
    #[arg(long)]
    purpose: Purpose,
    /// How many files will change? (one, few, several, many, not-sure)
    #[arg(long)]
    scope: FileScope,
    /// Do you understand the problem? (clear, needs-clarification, needs-research)
    #[arg(long)]
    understanding: Understanding,
    /// Does this touch production? (development, low-risk, high-risk, safety-critical)
    #[arg(long)]
    criticality: Criticality,
    /// How long should it take? (quick, medium, long, multi-day)
    #[arg(long = "time", value_name = "DURATION")]
    duration: Duration,
}

pub fn run(args: GuideArgs, json: bool) -> anyhow::Result<()> {
    let answers = Questionnaire {
        purpose: args.purpose,
        file_scope: args.scope,
        understanding: args.understanding,
        criticality: args.criticality,
        duration: args.duration,
    };
    tracing::debug!(?answers, "mapping questionnaire answers");
    walk_and_print(&map_answers_to_context(&answers), json)
}
