use clap::{ArgGroup, Parser};

#[derive(Parser, Debug, Clone)]
#[command(name = "vtlpad", about = "Workbench CLI for a remote VTL evaluation service", version)]
#[command(after_help = "Example: vtlpad 'a := get(\"1104\")'")]
#[command(group(ArgGroup::new("mode").args(["data", "remove", "repl", "show_history", "list_sessions"]).multiple(false)))]
#[command(group(ArgGroup::new("md_switch").args(["md", "no_md"]).multiple(false)))]
pub struct Cli {
    /// The VTL expression to evaluate.
    #[arg(value_name = "EXPRESSION")]
    pub expression: Option<String>,

    /// Read the expression from a .vtl script file.
    #[arg(long = "file", value_name = "PATH")]
    pub file: Option<String>,

    /// Base URL of the evaluation service (overrides SERVICE_URL).
    #[arg(long)]
    pub url: Option<String>,

    /// Fetch row data for a dataset.
    #[arg(long = "data", value_name = "DATASET")]
    pub data: Option<String>,

    /// With --data: stream the raw payload to a file ("-" for stdout)
    /// instead of rendering a preview.
    #[arg(long = "output", value_name = "PATH", requires = "data")]
    pub output: Option<String>,

    /// Delete a dataset from the service.
    #[arg(long = "remove", value_name = "DATASET")]
    pub remove: Option<String>,

    /// Maximum number of rows shown when previewing data.
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Render dataset structures as Markdown tables.
    #[arg(long)]
    pub md: bool,
    /// Plain text output.
    #[arg(long = "no-md")]
    pub no_md: bool,

    /// Open the interactive workbench, keeping expression history under the
    /// given session id.
    #[arg(long, value_name = "SESSION", num_args = 0..=1, default_missing_value = "default")]
    pub repl: Option<String>,

    /// Print the expression history of a session.
    #[arg(long = "show-history", value_name = "SESSION")]
    pub show_history: Option<String>,

    /// List saved history sessions.
    #[arg(short = 'l', long = "list-sessions", visible_alias = "ls")]
    pub list_sessions: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
