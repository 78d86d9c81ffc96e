use crate::cmd::Workspace;
use crate::output::{list, print_json};

pub fn run(ws: &Workspace, json: bool) -> anyhow::Result<()> {
    let engine = ws.engine()?;
    let signals = engine.analyze_project();

    if json {
        return print_json(&signals);
    }

    let frameworks = signals.detected_frameworks();
    let languages: Vec<String> = signals
        .languages
        .iter()
        .map(|(lang, n)| format!("{lang} ({n})"))
        .collect();

    println!("project:      {}", engine.project_path().display());
    println!("type:         {}", signals.project_type);
    println!("files:        {}", signals.file_count);
    println!("complexity:   {}", signals.complexity);
    println!("coverage:     ~{}%", signals.test_coverage_estimate);
    println!("tests:        {}", if signals.has_tests { "yes" } else { "no" });
    println!("docs:         {}", if signals.has_docs { "yes" } else { "no" });
    println!(
        "frameworks:   {}",
        if frameworks.is_empty() { "-".to_string() } else { frameworks.join(", ") }
    );
    println!(
        "languages:    {}",
        if languages.is_empty() { "-".to_string() } else { languages.join(", ") }
    );
    println!("commands:     {}", list(engine.available_commands()));
    Ok(())
}
