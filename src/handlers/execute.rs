//! Execute handler: evaluates an expression and reports the produced datasets.

use anyhow::{bail, Result};
use owo_colors::OwoColorize;

use crate::config::Config;
use crate::gateway::EvaluationGateway;
use crate::model::sort_by_role;
use crate::orchestrator::{ExecuteOutcome, Session};
use crate::printer::{structure_table, MarkdownPrinter};
use crate::workspace::DatasetEntry;

#[allow(dead_code)]
pub struct ExecuteHandler;

impl ExecuteHandler {
    pub async fn run(expression: &str, markdown: bool) -> Result<()> {
        let cfg = Config::load();
        let gateway = EvaluationGateway::from_config(&cfg)?;
        let session = Session::new(gateway);

        let datasets = match session.execute(expression).await {
            ExecuteOutcome::Published { datasets } => datasets,
            ExecuteOutcome::Rejected { error } => {
                bail!("evaluation failed: {}", error.summary());
            }
            // One-shot mode runs a single evaluation; nothing can supersede it.
            ExecuteOutcome::Superseded => return Ok(()),
        };

        if datasets.is_empty() {
            println!("Evaluation produced no datasets.");
            return Ok(());
        }

        let snapshot = session.snapshot().await;
        for (name, entry) in &snapshot.datasets {
            match entry {
                DatasetEntry::StructureLoaded { variables } => {
                    if markdown {
                        MarkdownPrinter::default().print(&structure_table(name, variables));
                    } else {
                        println!("{} ({} variables)", name.green(), variables.len());
                        let mut ordered = variables.clone();
                        sort_by_role(&mut ordered);
                        for v in &ordered {
                            println!(
                                "  {:<24} {:<12} {}",
                                v.name,
                                v.r#type.as_deref().unwrap_or("-"),
                                v.role.as_str()
                            );
                        }
                    }
                }
                DatasetEntry::Failed { error } => {
                    println!("{}: {}", name.red(), error.summary());
                }
                _ => {}
            }
        }
        Ok(())
    }
}
