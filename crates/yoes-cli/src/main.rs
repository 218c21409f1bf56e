#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use std::env;
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "yoes: headword relationship graph for encyclopedia editors",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format. Defaults to `pretty` on a terminal and `text` otherwise.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Project",
        about = "Initialize a yoes project",
        long_about = "Initialize a yoes project in the current directory: config, store, and .gitignore.",
        after_help = "EXAMPLES:\n    # Initialize a project in the current directory\n    yoes init\n\n    # Recreate missing files in an existing project\n    yoes init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Headwords",
        about = "Add a headword",
        long_about = "Add a headword to the graph. Adding an existing headword changes nothing.",
        after_help = "EXAMPLES:\n    # Add a root topic\n    yoes add Force --level 0\n\n    # Add a topic whose depth is not decided yet\n    yoes add \"Kinetic energy\""
    )]
    Add(cmd::add::AddArgs),

    #[command(
        next_help_heading = "Headwords",
        about = "Set a headword's level",
        long_about = "Set the declared level of a headword. Level 0 makes it a hierarchy root.",
        after_help = "EXAMPLES:\n    # Promote to a root\n    yoes level Force 0\n\n    # Mark as unclassified\n    yoes level Force unknown"
    )]
    Level(cmd::level::LevelArgs),

    #[command(
        next_help_heading = "Headwords",
        about = "Remove a headword and its edges",
        long_about = "Remove a headword. Every edge into or out of it is removed too.",
        after_help = "EXAMPLES:\n    yoes remove Phlogiston"
    )]
    Remove(cmd::remove::RemoveArgs),

    #[command(
        next_help_heading = "Headwords",
        about = "List headwords",
        long_about = "List every headword with its level and edge counts.",
        after_help = "EXAMPLES:\n    # Everything\n    yoes list\n\n    # Only roots, as JSON\n    yoes list --level 0 --format json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Headwords",
        about = "Show one headword",
        long_about = "Show a headword with its outgoing and incoming edges and its position in the hierarchy.",
        after_help = "EXAMPLES:\n    yoes show motion"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Edges",
        about = "Link two headwords",
        long_about = "Create or retype the edge from one headword to another. rdepends and superclass are stored as depends and subclass with the endpoints swapped.",
        after_help = "EXAMPLES:\n    # Motion sits under Force in the hierarchy\n    yoes link Motion Force --kind subclass\n\n    # Energy must be introduced before Motion\n    yoes link Motion Energy --kind depends"
    )]
    Link(cmd::link::LinkArgs),

    #[command(
        next_help_heading = "Edges",
        about = "Remove the edge between two headwords",
        long_about = "Remove the edge stored from one headword to another, if there is one.",
        after_help = "EXAMPLES:\n    yoes unlink Motion Force"
    )]
    Unlink(cmd::unlink::UnlinkArgs),

    #[command(
        next_help_heading = "Structure",
        about = "Print the hierarchy forest",
        long_about = "Build the subclass hierarchy from the level-0 roots and print it, with cycles and unattached headwords.",
        after_help = "EXAMPLES:\n    # The whole forest\n    yoes tree\n\n    # One subtree as JSON\n    yoes tree --root Force --format json"
    )]
    Tree(cmd::tree::TreeArgs),

    #[command(
        next_help_heading = "Structure",
        about = "Check a teaching order against dependencies",
        long_about = "Report every depends edge whose target comes after its source in the order. Without --order, the flattened hierarchy is checked.",
        after_help = "EXAMPLES:\n    # Check the hierarchy order\n    yoes check\n\n    # Check an explicit order and fail on violations\n    yoes check --order Atom,Molecule,Cell --strict"
    )]
    Check(cmd::check::CheckArgs),
}

impl Cli {
    /// Resolve the output mode from flags, environment, and user config.
    fn output_mode(&self) -> OutputMode {
        let user_output = match yoes_core::config::load_user_config() {
            Ok(config) => config.output,
            Err(err) => {
                warn!("ignoring user config: {err:#}");
                None
            }
        };
        output::resolve_output_mode(self.format, self.json, user_output.as_deref())
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("YOES_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "yoes=debug,yoes_core=debug"
        } else {
            "warn"
        })
    });

    let format = env::var("YOES_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, output: OutputMode) -> anyhow::Result<()> {
    let cwd = env::current_dir()?;
    debug!(command = ?cli.command, cwd = %cwd.display(), "dispatch");

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, output, &cwd),
        Commands::Add(args) => cmd::add::run_add(args, output, &cwd),
        Commands::Level(args) => cmd::level::run_level(args, output, &cwd),
        Commands::Remove(args) => cmd::remove::run_remove(args, output, &cwd),
        Commands::List(args) => cmd::list::run_list(args, output, &cwd),
        Commands::Show(args) => cmd::show::run_show(args, output, &cwd),
        Commands::Link(args) => cmd::link::run_link(args, output, &cwd),
        Commands::Unlink(args) => cmd::unlink::run_unlink(args, output, &cwd),
        Commands::Tree(args) => cmd::tree::run_tree(args, output, &cwd),
        Commands::Check(args) => cmd::check::run_check(args, output, &cwd),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = cli.output_mode();
    match run(&cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let cli_error = CliError::from(&err);
            if let Err(render_err) = render_error(output, &cli_error) {
                eprintln!("error: {err:#} ({render_err})");
            }
            ExitCode::FAILURE
        }
    }
}
