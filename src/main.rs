use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use twig::CommitDisplayFormat;
use twig::areas::repository::Repository;
use twig::artifacts::core::PagerWriter;
use twig::errors::ErrorKind;
use twig::observability::init_tracing;

#[derive(Parser)]
#[command(
    name = "twig",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "A minimal version control engine",
    long_about = "A content-addressable store of blobs, trees and commits with a staging \
    index, branches and a working directory kept in sync through status and checkout.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
"
)]
struct Cli {
    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
        #[arg(long = "initial-branch", short = 'b', help = "Name of the first branch")]
        initial_branch: Option<String>,
    },
    #[command(
        name = "add",
        about = "Stage files for the next commit",
        long_about = "This command stores the content of the given files and records them in the index. \
        Tracked files missing from disk are staged for removal."
    )]
    Add {
        #[arg(index = 1, required = true, help = "Files or directories to stage")]
        paths: Vec<PathBuf>,
    },
    #[command(
        name = "commit",
        about = "Record the staged snapshot as a new commit",
        long_about = "This command creates a new commit on the current branch from HEAD's tree and the staged changes."
    )]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
        #[arg(long, help = "Override the author, as 'Name <email>'")]
        author: Option<String>,
    },
    #[command(
        name = "status",
        about = "Show the working tree status",
        long_about = "This command lists staged changes, unstaged changes and untracked files."
    )]
    Status {
        #[arg(long, help = "Print one 'XY path' line per changed path")]
        porcelain: bool,
    },
    #[command(
        name = "branch",
        about = "List, create or delete branches",
        long_about = "Without arguments this command lists branches, marking the current one. \
        Creating a branch also makes it current."
    )]
    Branch {
        #[arg(short = 'b', long = "create", conflicts_with = "delete", help = "Create a branch and switch to it")]
        create: Option<String>,
        #[arg(short = 'd', long = "delete", help = "Delete a branch")]
        delete: Option<String>,
    },
    #[command(
        name = "checkout",
        about = "Switch branches and update the working directory",
        long_about = "This command rewrites tracked files to match the target branch, discarding local changes to them."
    )]
    Checkout {
        #[arg(short = 'b', help = "Create the branch at the current tip instead")]
        create: bool,
        #[arg(index = 1, help = "The branch to switch to")]
        branch: String,
    },
    #[command(
        name = "log",
        about = "Show the history of the current branch",
        long_about = "This command lists commits from the tip of the current branch back to the root."
    )]
    Log {
        #[arg(short = 'n', long = "max-count", help = "Show at most this many commits")]
        limit: Option<usize>,
        #[arg(long, help = "Print one line per commit")]
        oneline: bool,
        #[arg(long = "no-pager", help = "Do not page the output")]
        no_pager: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(error) = init_tracing(cli.verbose) {
        eprintln!("warning: {error:#}");
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::debug!(?error, "command failed");
            eprintln!("error: {error:#}");
            ExitCode::from(ErrorKind::classify(&error).exit_code())
        }
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    let pwd = std::env::current_dir()?;

    match command {
        Commands::Init {
            path,
            initial_branch,
        } => {
            let path = path.unwrap_or(pwd);
            let mut repository = Repository::new(&path, Box::new(std::io::stdout()))?;

            repository.init(initial_branch.as_deref())
        }
        Commands::Add { paths } => {
            let repository = Repository::open(&pwd, Box::new(std::io::stdout()))?;

            repository.add(&paths)
        }
        Commands::Commit { message, author } => {
            let repository = Repository::open(&pwd, Box::new(std::io::stdout()))?;

            repository.commit(&message, author.as_deref())
        }
        Commands::Status { porcelain } => {
            let repository = Repository::open(&pwd, Box::new(std::io::stdout()))?;

            repository.status(porcelain)
        }
        Commands::Branch { create, delete } => {
            let repository = Repository::open(&pwd, Box::new(std::io::stdout()))?;

            repository.branch(create.as_deref(), delete.as_deref())
        }
        Commands::Checkout { create, branch } => {
            let repository = Repository::open(&pwd, Box::new(std::io::stdout()))?;

            repository.checkout(&branch, create)
        }
        Commands::Log {
            limit,
            oneline,
            no_pager,
        } => {
            let format = if oneline {
                CommitDisplayFormat::OneLine
            } else {
                CommitDisplayFormat::Medium
            };

            if PagerWriter::should_page(no_pager) {
                let (writer, pager) = PagerWriter::paged();
                let repository = Repository::open(&pwd, Box::new(writer))?;
                repository.log(limit, format)?;

                minus::page_all(pager)?;
                Ok(())
            } else {
                let repository = Repository::open(&pwd, Box::new(std::io::stdout()))?;

                repository.log(limit, format)
            }
        }
    }
}
