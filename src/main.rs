use anyhow::Context;
use clap::{Parser, Subcommand};
use planboard::cli::{self, MaterialEdit, ResourceEdit};
use planboard::config::AllocationPolicy;
use planboard::types::{MaterialField, ResourceAssignment};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "planboard")]
#[command(about = "Project planning: workbook import, resource allocation, budgets.")]
#[command(long_about = "Planboard - project planning from the command line

COMMANDS:
  import    - Convert an Excel workbook to JSON (one record list per sheet)
  watch     - Re-import a workbook whenever it changes
  summary   - Progress and budget per work package
  validate  - Check project files
  allocate  - Set one resource x month allocation cell
  material  - Add, remove or edit a task's materials
  resource  - Add or remove a task's resources
  export    - Write a task's allocation matrix to .xlsx

EXAMPLES:
  planboard import roster.xlsx > roster.json
  planboard import roster.xlsx --download ./out --quiet
  planboard allocate project.yaml --task t1 --resource 0 --month 2 --value 0.5
  planboard material project.yaml --task t1 set 0 unit_price 12.5

Logging: set RUST_LOG (e.g. RUST_LOG=planboard=debug).")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Convert an Excel workbook to JSON.

Each sheet becomes a list of records keyed by the sheet's first row.
Empty cells are left out. The JSON goes to stdout; use --download to also
write it to <dir>/converted_data.json (identical bytes).")]
    /// Convert an Excel workbook to JSON
    Import {
        /// Path to workbook (.xlsx or .xls)
        input: PathBuf,

        /// Directory to write converted_data.json into
        #[arg(short, long)]
        download: Option<PathBuf>,

        /// Do not print the JSON to stdout
        #[arg(short, long)]
        quiet: bool,

        /// Show per-sheet record counts
        #[arg(short, long)]
        verbose: bool,
    },

    /// Re-import a workbook whenever it changes on disk
    Watch {
        /// Path to workbook
        file: PathBuf,

        /// Show per-sheet record counts
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show progress and budget per work package
    Summary {
        /// Path to project YAML file
        file: PathBuf,

        /// List every task
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate project files
    Validate {
        /// Path to project YAML file(s)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    #[command(long_about = "Set one resource x month allocation cell.

The value is a fraction of full time. What happens to values outside 0..1
depends on --policy (or PLANBOARD_ALLOCATION_POLICY):
  reject      - refuse the edit (default setting)
  clamp       - store the nearest bound
  permissive  - store as entered")]
    /// Set one resource x month allocation cell
    Allocate {
        /// Path to project YAML file
        file: PathBuf,

        /// Task id
        #[arg(short, long)]
        task: String,

        /// Resource index (0-based)
        #[arg(short, long)]
        resource: usize,

        /// Month index (0 = January)
        #[arg(short, long)]
        month: usize,

        /// Allocation fraction
        #[arg(long, allow_hyphen_values = true)]
        value: String,

        /// Handling of values outside 0..1
        #[arg(long, value_enum, env = "PLANBOARD_ALLOCATION_POLICY")]
        policy: Option<AllocationPolicy>,

        /// Preview the edit without writing
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Add, remove or edit a task's materials
    Material {
        /// Path to project YAML file
        file: PathBuf,

        /// Task id
        #[arg(short, long)]
        task: String,

        /// Preview the edit without writing
        #[arg(short = 'n', long)]
        dry_run: bool,

        #[command(subcommand)]
        action: MaterialAction,
    },

    /// Add or remove a task's resources
    Resource {
        /// Path to project YAML file
        file: PathBuf,

        /// Task id
        #[arg(short, long)]
        task: String,

        /// Preview the edit without writing
        #[arg(short = 'n', long)]
        dry_run: bool,

        #[command(subcommand)]
        action: ResourceAction,
    },

    /// Write a task's allocation matrix and materials to .xlsx
    Export {
        /// Path to project YAML file
        file: PathBuf,

        /// Output Excel file path (.xlsx)
        output: PathBuf,

        /// Task id
        #[arg(short, long)]
        task: String,
    },
}

#[derive(Subcommand)]
enum MaterialAction {
    /// Append a blank material
    Add,
    /// Remove the material at an index
    Remove { index: usize },
    /// Set name, units or unit_price on the material at an index
    Set {
        index: usize,
        field: MaterialField,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
}

#[derive(Subcommand)]
enum ResourceAction {
    /// Append a resource with a zero allocation
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        role: String,
        #[arg(long, default_value = "")]
        profile: String,
    },
    /// Remove the resource at an index
    Remove { index: usize },
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "planboard=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Import {
            input,
            download,
            quiet,
            verbose,
        } => cli::import(input.clone(), download, quiet, verbose)
            .with_context(|| format!("import of {} failed", input.display())),

        Commands::Watch { file, verbose } => cli::watch(file, verbose).context("watch failed"),

        Commands::Summary { file, verbose } => cli::summary(file.clone(), verbose)
            .with_context(|| format!("cannot summarize {}", file.display())),

        Commands::Validate { files } => cli::validate(files).context("validation failed"),

        Commands::Allocate {
            file,
            task,
            resource,
            month,
            value,
            policy,
            dry_run,
        } => cli::allocate(file, task, resource, month, value, policy, dry_run)
            .context("allocation edit failed"),

        Commands::Material {
            file,
            task,
            dry_run,
            action,
        } => {
            let edit = match action {
                MaterialAction::Add => MaterialEdit::Add,
                MaterialAction::Remove { index } => MaterialEdit::Remove(index),
                MaterialAction::Set {
                    index,
                    field,
                    value,
                } => MaterialEdit::Set {
                    index,
                    field,
                    value,
                },
            };
            cli::material(file, task, edit, dry_run).context("material edit failed")
        }

        Commands::Resource {
            file,
            task,
            dry_run,
            action,
        } => {
            let edit = match action {
                ResourceAction::Add {
                    name,
                    role,
                    profile,
                } => ResourceEdit::Add(ResourceAssignment::new(name, role, profile)),
                ResourceAction::Remove { index } => ResourceEdit::Remove(index),
            };
            cli::resource(file, task, edit, dry_run).context("resource edit failed")
        }

        Commands::Export { file, output, task } => {
            cli::export(file, task, output).context("export failed")
        }
    }
}
