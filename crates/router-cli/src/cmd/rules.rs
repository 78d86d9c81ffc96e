use crate::cmd::Workspace;
use crate::output::{confidence, print_json, print_table};

pub fn run(ws: &Workspace, json: bool) -> anyhow::Result<()> {
    let engine = ws.engine()?;
    let rules = engine.rules();

    if json {
        return print_json(&rules);
    }

    let rows = rules
        .iter()
        .map(|r| {
            vec![
                r.name.clone(),
                r.priority.to_string(),
                r.recommendation.clone(),
                confidence(r.confidence_base),
            ]
        })
        .collect();
    print_table(&["NAME", "PRIORITY", "COMMAND", "BASE"], rows);
    Ok(())
}
