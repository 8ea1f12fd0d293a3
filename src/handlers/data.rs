//! Data handler: fetches one dataset's rows, as a preview or a raw dump.

use std::io::Write;

use anyhow::{bail, Result};
use futures_util::StreamExt;

use crate::config::Config;
use crate::gateway::EvaluationGateway;
use crate::orchestrator::Session;
use crate::printer::{data_preview, TextPrinter};
use crate::workspace::DatasetEntry;

#[allow(dead_code)]
pub struct DataHandler;

impl DataHandler {
    pub async fn run(name: &str, output: Option<&str>, limit: Option<usize>) -> Result<()> {
        let cfg = Config::load();
        let gateway = EvaluationGateway::from_config(&cfg)?;
        let session = Session::new(gateway);

        if let Some(target) = output {
            return dump_raw(&session, name, target).await;
        }

        let limit = limit
            .or_else(|| cfg.get_usize("DISPLAY_LIMIT"))
            .unwrap_or(5);

        match session.fetch_data(name).await {
            DatasetEntry::Loaded { data } => {
                TextPrinter::from_config(&cfg).print(name);
                print!("{}", data_preview(&data, limit));
                Ok(())
            }
            DatasetEntry::Failed { error } => {
                bail!("fetching data for '{}' failed: {}", name, error.summary());
            }
            _ => bail!("no data received for '{}'", name),
        }
    }
}

/// Stream the payload to a file, or to stdout for "-", without buffering it.
async fn dump_raw(session: &Session<EvaluationGateway>, name: &str, target: &str) -> Result<()> {
    let mut stream = session.gateway().stream_data(name);

    let mut sink: Box<dyn Write> = if target == "-" {
        Box::new(std::io::stdout().lock())
    } else {
        Box::new(std::fs::File::create(target)?)
    };

    let mut written = 0usize;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        sink.write_all(&bytes)?;
        written += bytes.len();
    }
    sink.flush()?;

    if target != "-" {
        println!("Wrote {} bytes to {}", written, target);
    }
    Ok(())
}
