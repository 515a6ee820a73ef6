use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use gtd::commands::edit::EditArgs;
use gtd::output::{Format, LabelKind};
use gtd::store::files::FileStore;
use gtd::views::{Filter, State};

#[derive(Parser)]
#[command(
    name = "gtd",
    version,
    long_version = gtd::build_info::long_version(),
    about = "Getting Things Done task manager with TaskWarrior import/export"
)]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "json")]
    format: Format,
    /// Shorthand for --format pretty
    #[arg(long, global = true, hide = true)]
    pretty: bool,
    /// Diagnostic log level on stderr (RUST_LOG overrides)
    #[arg(long, global = true, default_value = gtd::logging::DEFAULT_LEVEL)]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new .gtd/ directory here
    Init,
    /// Add a task from a GTD line, e.g. `Pay bills +finance @home due:2025-04-01`
    Add {
        /// Task line; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        line: Vec<String>,
        /// Free-form notes
        #[arg(long, short)]
        notes: Option<String>,
    },
    /// Display a single task
    Show {
        id: u64,
        /// Print the task as a GTD line instead
        #[arg(long)]
        syntax: bool,
    },
    /// List and filter tasks
    List(ListArgs),
    /// Edit task fields
    Edit {
        id: u64,
        #[command(flatten)]
        args: EditFlags,
    },
    /// Mark a task completed
    Complete { id: u64 },
    /// Mark a completed task active again
    Restore { id: u64 },
    /// Delete a task
    Delete { id: u64 },
    /// Tasks with a due date grouped by day
    Calendar {
        /// Include completed tasks
        #[arg(long)]
        all: bool,
    },
    /// Contexts in use
    Contexts,
    /// Tags in use
    Tags,
    /// Projects in use
    Projects,
    /// Show how a GTD line is parsed, without saving anything
    Parse {
        #[arg(required = true, num_args = 1..)]
        line: Vec<String>,
    },
    /// Import a TaskWarrior export (JSON, NDJSON) or TaskChampion database
    Import {
        /// File to read, or `-` for stdin
        source: String,
        /// Report what would be imported without writing tasks
        #[arg(long)]
        dry_run: bool,
    },
    /// Export tasks as TaskWarrior NDJSON
    Export {
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ListArgs {
    /// Filter by context (with or without `@`)
    #[arg(long)]
    context: Option<String>,
    /// Filter by tag (with or without `+`)
    #[arg(long)]
    tag: Option<String>,
    /// Filter by project
    #[arg(long)]
    project: Option<String>,
    /// Only tasks not yet completed
    #[arg(long, conflicts_with = "completed")]
    active: bool,
    /// Only completed tasks
    #[arg(long)]
    completed: bool,
    /// Only tasks with a due date
    #[arg(long)]
    due: bool,
}

impl From<ListArgs> for Filter {
    fn from(args: ListArgs) -> Self {
        let state = match (args.active, args.completed) {
            (true, _) => State::Active,
            (_, true) => State::Completed,
            _ => State::Any,
        };
        Filter {
            context: args.context,
            tag: args.tag,
            project: args.project,
            state,
            due_only: args.due,
        }
    }
}

#[derive(Args)]
struct EditFlags {
    /// Replace title, context, project, tags and due date from a GTD line
    #[arg(long)]
    syntax: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long, conflicts_with = "clear_context")]
    context: Option<String>,
    #[arg(long, conflicts_with = "clear_project")]
    project: Option<String>,
    /// Replace tags (comma-separated)
    #[arg(long, value_delimiter = ',', conflicts_with = "clear_tags")]
    tag: Option<Vec<String>>,
    /// Due date as YYYY-MM-DD
    #[arg(long, conflicts_with = "clear_due")]
    due: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long)]
    clear_context: bool,
    #[arg(long)]
    clear_project: bool,
    #[arg(long)]
    clear_tags: bool,
    #[arg(long)]
    clear_due: bool,
}

impl From<EditFlags> for EditArgs {
    fn from(flags: EditFlags) -> Self {
        EditArgs {
            syntax: flags.syntax,
            title: flags.title,
            context: flags.context,
            project: flags.project,
            tags: flags.tag,
            due: flags.due,
            notes: flags.notes,
            clear_context: flags.clear_context,
            clear_project: flags.clear_project,
            clear_tags: flags.clear_tags,
            clear_due: flags.clear_due,
        }
    }
}

fn run(cli: Cli, format: Format) -> gtd::error::Result<()> {
    gtd::logging::init(&cli.log_level)?;

    // Commands that need no repository
    match &cli.command {
        Commands::Init => {
            let cwd = std::env::current_dir()?;
            return gtd::commands::init::run(&cwd);
        }
        Commands::Parse { line } => {
            return gtd::commands::parse::run(&line.join(" "), format);
        }
        _ => {}
    }

    let root = gtd::store::find_repo_root()?;
    let store = FileStore::open(&root)?;

    match cli.command {
        Commands::Init | Commands::Parse { .. } => unreachable!(),
        Commands::Add { line, notes } => {
            gtd::commands::add::run(&store, &line.join(" "), notes, format)
        }
        Commands::Show { id, syntax } => gtd::commands::show::run(&store, id, syntax, format),
        Commands::List(args) => gtd::commands::list::run(&store, &args.into(), format),
        Commands::Edit { id, args } => gtd::commands::edit::run(&store, id, args.into(), format),
        Commands::Complete { id } => gtd::commands::lifecycle::complete(&store, id, format),
        Commands::Restore { id } => gtd::commands::lifecycle::restore(&store, id, format),
        Commands::Delete { id } => gtd::commands::delete::run(&store, id, format),
        Commands::Calendar { all } => gtd::commands::calendar::run(&store, all, format),
        Commands::Contexts => gtd::commands::labels::run(&store, LabelKind::Contexts, format),
        Commands::Tags => gtd::commands::labels::run(&store, LabelKind::Tags, format),
        Commands::Projects => gtd::commands::labels::run(&store, LabelKind::Projects, format),
        Commands::Import { source, dry_run } => {
            let config = store.config()?;
            gtd::commands::import::run(&store, &source, dry_run, &config.import, format)
        }
        Commands::Export { output } => {
            gtd::commands::export::run(&store, output.as_deref(), format)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let format = if cli.pretty {
        Format::Pretty
    } else {
        cli.format
    };
    if let Err(e) = run(cli, format) {
        log::debug!("event=command_failed code={}", e.code());
        match format {
            Format::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "error": e.code(),
                        "message": e.to_string()
                    })
                );
            }
            _ => eprintln!("error: {e}"),
        }
        std::process::exit(1);
    }
}
