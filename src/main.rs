mod cli;
mod config;
mod gateway;
mod handlers;
mod history;
mod model;
mod orchestrator;
mod printer;
mod tui;
mod utils;
mod workspace;

use anyhow::{bail, Result};
use config::Config;
use history::ExpressionHistory;
use is_terminal::IsTerminal;
use std::io::{self, Read};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // Optional: override the service URL via CLI before loading config
    if let Some(url) = args.url.as_deref() {
        std::env::set_var("SERVICE_URL", url);
    }

    let cfg = Config::load();

    // stdin handling (pipe support)
    let mut expr_from_stdin = String::new();
    let stdin_is_tty = io::stdin().is_terminal();
    if !stdin_is_tty {
        io::stdin().read_to_string(&mut expr_from_stdin)?;
    }

    // The workbench needs the terminal; it cannot run with piped stdin
    if args.repl.is_some() && !stdin_is_tty {
        bail!("--repl cannot be used with stdin input");
    }

    // Resolve the expression: script file first, then stdin, then the
    // positional argument, joined as successive statements.
    let arg_expr = args.expression.clone().unwrap_or_default();
    let mut expression = if !expr_from_stdin.trim().is_empty() && !arg_expr.is_empty() {
        format!("{}\n{}", expr_from_stdin.trim_end(), arg_expr)
    } else if !expr_from_stdin.trim().is_empty() {
        expr_from_stdin.trim_end().to_string()
    } else {
        arg_expr
    };
    if let Some(path) = &args.file {
        let file_expr = utils::read_expression_file(path)?;
        expression = if expression.is_empty() {
            file_expr
        } else {
            format!("{}\n{}", file_expr.trim_end(), expression)
        };
    }

    // History shortcuts
    if args.list_sessions {
        let history = ExpressionHistory::from_config(&cfg);
        for p in history.list() {
            println!("{}", p.display());
        }
        return Ok(());
    }
    if let Some(id) = &args.show_history {
        let history = ExpressionHistory::from_config(&cfg);
        if !history.exists(id) {
            bail!("session not found: {}", cfg.history_path().join(id).display());
        }
        for expr in history.read(id)? {
            println!("{}", expr);
        }
        return Ok(());
    }

    // Effective markdown switch with config default
    let md = if args.no_md {
        false
    } else if args.md {
        true
    } else {
        cfg.get_bool("PRETTIFY_MARKDOWN")
    };

    // Route to handler
    if let Some(session_id) = args.repl.as_deref() {
        return handlers::repl::run(session_id).await;
    }
    if let Some(name) = args.data.as_deref() {
        return handlers::data::DataHandler::run(name, args.output.as_deref(), args.limit).await;
    }
    if let Some(name) = args.remove.as_deref() {
        return handlers::remove::RemoveHandler::run(name).await;
    }

    if expression.trim().is_empty() {
        bail!("Provide a VTL expression (argument, stdin, or --file), or pick a mode (--data, --remove, --repl)");
    }
    handlers::execute::ExecuteHandler::run(&expression, md).await
}
