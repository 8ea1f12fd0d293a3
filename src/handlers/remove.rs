//! Remove handler: deletes a dataset on the service.

use anyhow::{bail, Result};
use owo_colors::OwoColorize;

use crate::config::Config;
use crate::gateway::EvaluationGateway;
use crate::orchestrator::Session;

#[allow(dead_code)]
pub struct RemoveHandler;

impl RemoveHandler {
    pub async fn run(name: &str) -> Result<()> {
        let cfg = Config::load();
        let gateway = EvaluationGateway::from_config(&cfg)?;
        let session = Session::new(gateway);

        match session.remove(name).await {
            Ok(()) => {
                println!("{} {}", "Deleted".green(), name);
                Ok(())
            }
            Err(error) => {
                bail!(
                    "deleting '{}' failed: {} (the dataset still exists on the service)",
                    name,
                    error.summary()
                );
            }
        }
    }
}
