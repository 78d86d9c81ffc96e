use crate::cmd::Workspace;
use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use router_core::engine::RoutingEngine;
use router_core::feedback::{Feedback, FeedbackContext};
use router_core::paths;
use router_core::types::Complexity;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum FeedbackSubcommand {
    /// Rate a recommendation and remember what was actually run
    Add {
        /// The request the recommendation was for
        #[arg(long)]
        input: String,
        /// Command that was recommended
        #[arg(long)]
        recommended: String,
        /// Command that was actually run (if different)
        #[arg(long)]
        actual: Option<String>,
        /// 1 (useless) to 5 (exactly right)
        #[arg(long)]
        rating: u8,
        /// Override the project file count recorded with the feedback
        #[arg(long)]
        file_count: Option<usize>,
        /// Override the project complexity recorded with the feedback
        #[arg(long)]
        complexity: Option<Complexity>,
    },

    /// Summarize recorded feedback
    Stats,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(ws: &Workspace, subcmd: FeedbackSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        FeedbackSubcommand::Add {
            input,
            recommended,
            actual,
            rating,
            file_count,
            complexity,
        } => {
            let engine = ws.engine()?;
            let signals = engine.analyze_project();
            let feedback = Feedback {
                user_input: input,
                actual_command: actual.unwrap_or_else(|| recommended.clone()),
                recommended_command: recommended,
                user_rating: rating,
                context: FeedbackContext {
                    file_count: file_count.unwrap_or(signals.file_count),
                    project_complexity: complexity.unwrap_or(signals.complexity),
                },
            };
            add(ws, engine, feedback, json)
        }
        FeedbackSubcommand::Stats => stats(ws, json),
    }
}

// ---------------------------------------------------------------------------
// add
// ---------------------------------------------------------------------------

fn add(
    ws: &Workspace,
    mut engine: RoutingEngine,
    feedback: Feedback,
    json: bool,
) -> anyhow::Result<()> {
    feedback.validate().context("invalid feedback")?;
    let summary = format!(
        "{} rated {}/5",
        feedback.recommended_command, feedback.user_rating
    );
    if !engine.learn_from_feedback(feedback) {
        anyhow::bail!("feedback was not recorded");
    }

    let model = paths::model_path(ws.root);
    if !engine.save_model(&model) {
        anyhow::bail!("failed to save routing model to {}", model.display());
    }

    if json {
        print_json(&engine.learning_stats())?;
    } else {
        println!("Recorded: {summary}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// stats
// ---------------------------------------------------------------------------

fn stats(ws: &Workspace, json: bool) -> anyhow::Result<()> {
    let engine = ws.engine()?;
    let stats = engine.learning_stats();

    if json {
        return print_json(&stats);
    }

    println!("feedback entries: {}", stats.feedback_entries);
    println!("known requests:   {}", stats.user_patterns);
    match stats.average_rating {
        Some(avg) => println!("average rating:   {avg:.2}"),
        None => println!("average rating:   -"),
    }
    Ok(())
}
