//! tortilla - git history as a step-by-step tutorial

mod cli;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use cli::hooks::EditorKind;
use cli::manual::ManualSelection;
use std::path::PathBuf;
use tortilla::config::TortillaConfig;
use tortilla::manual::ManualFormat;
use tortilla::repo::GitRepo;

#[derive(Parser)]
#[command(name = "tortilla")]
#[command(about = "Author tutorials as git history: one commit per step")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the repository (defaults to current directory)
    #[arg(short = 'C', long, global = true, default_value = ".")]
    path: PathBuf,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, change and inspect steps
    #[command(subcommand)]
    Step(StepCommand),

    /// Resume an edit after changing the stopped step
    Continue,

    /// Abandon an edit and restore the original history
    Abort,

    /// Amend HEAD while editing a step
    Amend {
        /// New subject (the step prefix is kept)
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Manual rendering
    #[command(subcommand)]
    Manual(ManualCommand),

    /// Git hook management
    #[command(subcommand)]
    Hooks(HooksCommand),

    /// Git hook entry point
    #[command(hide = true)]
    Hook {
        /// Hook name (pre-commit, prepare-commit-msg, commit-msg, pre-rebase)
        name: String,
        /// Arguments git passes to the hook
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Scripted editor entry point
    #[command(hide = true)]
    Editor {
        /// Which editor git is asking for
        kind: EditorArg,
        /// File git wants edited
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum StepCommand {
    /// Commit the staged changes as the next sub step
    Push {
        /// Step subject
        #[arg(short, long)]
        message: String,
        /// Allow a step without changes
        #[arg(long)]
        allow_empty: bool,
    },
    /// Close the current super step with its instruction file and tag
    Tag {
        /// Step subject
        #[arg(short, long)]
        message: String,
    },
    /// Discard the most recent step
    Pop {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Stop at a step to change it; later steps are renumbered on continue
    Edit {
        /// Step id (N or N.M)
        step: String,
    },
    /// Replace a step's subject
    Reword {
        /// Step id (N or N.M)
        step: String,
        /// New subject
        #[arg(short, long)]
        message: String,
    },
    /// Remove a step and renumber the steps after it
    Remove {
        /// Step id (N removes the super step and its sub steps)
        step: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Re-derive every step number and tag from history
    Renumber,
    /// List step commits, oldest first
    List,
}

#[derive(Subcommand)]
enum ManualCommand {
    /// Convert instruction files between development and production format
    Render(RenderArgs),
}

#[derive(Args)]
struct RenderArgs {
    /// Target format
    #[arg(long, value_enum)]
    format: FormatArg,
    /// Super step whose manual to convert (defaults to the latest)
    #[arg(long, conflicts_with = "all")]
    step: Option<u32>,
    /// Convert every manual
    #[arg(long)]
    all: bool,
}

#[derive(Subcommand)]
enum HooksCommand {
    /// Write tortilla's hooks into the repository
    Install,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Template source
    Dev,
    /// Rendered output
    Prod,
}

#[derive(Clone, Copy, ValueEnum)]
enum EditorArg {
    /// Rebase to-do list
    Sequence,
    /// Commit message
    Message,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = GitRepo::open(&cli.path)
        .and_then(|repo| TortillaConfig::load(repo.root()))
        .map(|c| c.log)
        .unwrap_or_default();
    cli::init_logging(&log_config, cli.verbose);

    let path = cli.path.as_path();
    match cli.command {
        Commands::Step(command) => match command {
            StepCommand::Push {
                message,
                allow_empty,
            } => cli::step::run_push(path, &message, allow_empty)?,
            StepCommand::Tag { message } => cli::step::run_tag(path, &message)?,
            StepCommand::Pop { yes } => cli::step::run_pop(path, yes)?,
            StepCommand::Edit { step } => cli::step::run_edit(path, &step)?,
            StepCommand::Reword { step, message } => {
                cli::step::run_reword(path, &step, &message)?;
            }
            StepCommand::Remove { step, yes } => cli::step::run_remove(path, &step, yes)?,
            StepCommand::Renumber => cli::step::run_renumber(path)?,
            StepCommand::List => cli::step::run_list(path)?,
        },
        Commands::Continue => cli::rebase::run_continue(path)?,
        Commands::Abort => cli::rebase::run_abort(path)?,
        Commands::Amend { message } => cli::rebase::run_amend(path, message.as_deref())?,
        Commands::Manual(ManualCommand::Render(args)) => {
            let format = match args.format {
                FormatArg::Dev => ManualFormat::Development,
                FormatArg::Prod => ManualFormat::Production,
            };
            let selection = match (args.step, args.all) {
                (Some(n), _) => ManualSelection::Step(n),
                (None, true) => ManualSelection::All,
                (None, false) => ManualSelection::Current,
            };
            cli::manual::run_render(path, format, selection)?;
        }
        Commands::Hooks(HooksCommand::Install) => cli::hooks::run_install(path)?,
        Commands::Hook { name, args } => cli::hooks::run_hook_command(path, &name, &args)?,
        Commands::Editor { kind, file } => {
            let kind = match kind {
                EditorArg::Sequence => EditorKind::Sequence,
                EditorArg::Message => EditorKind::Message,
            };
            cli::hooks::run_editor(kind, &file)?;
        }
    }

    Ok(())
}
