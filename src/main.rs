use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use git_workbench::{Repository, format_diff};

#[derive(Parser)]
#[command(name = "git-workbench")]
#[command(about = "Inspect git repository state as structured data")]
struct Cli {
    /// Path to the repository working tree
    #[arg(short = 'C', long = "repo", default_value = ".")]
    repo: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show working tree status
    Status,
    /// Show unstaged (or staged) changes with line numbers
    Diff {
        /// Show the staged diff instead of the unstaged one
        #[arg(long)]
        staged: bool,
    },
    /// List local branches with tracking state
    Branches,
    /// List stash entries
    Stashes,
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
    /// Generate the man page
    Man,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    run(Cli::parse())
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let repo = Repository::open(&cli.repo);

    match cli.command {
        Commands::Status => {
            let status = repo.status()?;
            if status.is_empty() {
                println!("clean");
                return Ok(());
            }
            for entry in status
                .staged
                .iter()
                .chain(&status.unstaged)
                .chain(&status.untracked)
            {
                println!("{}\t{}", entry.status_description(), entry.path);
            }
        }
        Commands::Diff { staged } => {
            let diff = if staged {
                repo.staged_diff()?
            } else {
                repo.diff()?
            };
            print!("{}", format_diff(&diff));
        }
        Commands::Branches => {
            for branch in repo.branches()? {
                let marker = if branch.is_current { "*" } else { " " };
                let tracking = match &branch.upstream {
                    Some(upstream) => format!(" [{upstream}]"),
                    None => String::new(),
                };
                println!(
                    "{} {}{} {}",
                    marker, branch.name, tracking, branch.last_commit
                );
            }
        }
        Commands::Stashes => {
            for stash in repo.stashes()? {
                println!("{}: {} ({})", stash.index, stash.message, stash.branch);
            }
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
        }
        Commands::Man => {
            let man = clap_mangen::Man::new(Cli::command());
            man.render(&mut io::stdout())?;
        }
    }

    Ok(())
}
