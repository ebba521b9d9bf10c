//! Command line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use courier_infrastructure::CollectionFormat;

/// Courier: send, script and convert API requests.
#[derive(Debug, Parser)]
#[command(name = "courier", version, about, long_about = None)]
pub struct Cli {
    /// Settings file (TOML or JSON)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Data directory, overriding the settings
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a request and run its scripts
    Send(SendArgs),
    /// Print a code snippet for an HTTP request
    Codegen(CodegenArgs),
    /// List the code generation languages
    Languages,
    /// Import a collection file into the store
    Import(ImportArgs),
    /// Export a stored collection to a file
    Export(ExportArgs),
}

/// Arguments of `send`.
#[derive(Debug, Args)]
pub struct SendArgs {
    /// Request file
    pub request: PathBuf,

    /// Environment file, native or Postman
    #[arg(long, value_name = "FILE")]
    pub env: Option<PathBuf>,

    /// Globals file, native or Postman
    #[arg(long, value_name = "FILE")]
    pub globals: Option<PathBuf>,

    /// Stored collection whose variables take part in resolution
    #[arg(long, value_name = "ID")]
    pub collection: Option<String>,

    /// Save the request into the collection after sending
    #[arg(long, requires = "collection")]
    pub save: bool,
}

/// Arguments of `codegen`.
#[derive(Debug, Args)]
pub struct CodegenArgs {
    /// Request file
    pub request: PathBuf,

    /// Language id, see `courier languages`
    #[arg(short, long)]
    pub lang: String,

    /// Add explanatory comments
    #[arg(long)]
    pub comments: bool,
}

/// Arguments of `import`.
#[derive(Debug, Args)]
pub struct ImportArgs {
    /// File to import
    pub file: PathBuf,

    /// Input format; detected from the document when omitted
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Also write the imported collection as a native file
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

/// Arguments of `export`.
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Collection id
    pub collection: String,

    /// Output file
    #[arg(long, value_name = "FILE")]
    pub out: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = FormatArg::Postman)]
    pub format: FormatArg,
}

/// Interchange formats accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Courier collection file
    Native,
    /// Postman Collection v2.1
    Postman,
}

impl From<FormatArg> for CollectionFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Native => Self::Native,
            FormatArg::Postman => Self::Postman,
        }
    }
}
