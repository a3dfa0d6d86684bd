use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

mod flows;
mod render;

use flows::{CheckOptions, InstallOptions};

#[derive(Parser)]
#[command(name = "condaboot")]
#[command(about = "Conda bootstrap for locked-down notebook hosts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a distribution installer and bootstrap the prefix
    Install {
        /// Published distribution to install (mambaforge, miniforge, miniconda, anaconda)
        #[arg(long, conflicts_with = "url")]
        distribution: Option<String>,
        /// Installer URL overriding the distribution catalog
        #[arg(long)]
        url: Option<String>,
        /// Expected installer digest, hex-encoded
        #[arg(long, requires = "url")]
        sha256: Option<String>,
        /// Installation prefix
        #[arg(long, default_value = "/usr/local")]
        prefix: PathBuf,
        /// Host interpreter to interpose
        #[arg(long, default_value = "/usr/bin/python3")]
        interpreter: PathBuf,
        /// Target python as major.minor; probed from the interpreter when omitted
        #[arg(long)]
        python_version: Option<String>,
        /// KEY=VALUE pair exported by the trampoline; repeatable
        #[arg(long = "env", value_name = "KEY=VALUE")]
        env_overrides: Vec<String>,
        /// Extra conda spec merged into the environment update; repeatable
        #[arg(long = "extra-spec", value_name = "SPEC")]
        extra_specs: Vec<String>,
        /// Extra channel merged into the environment update; repeatable
        #[arg(long = "channel", value_name = "CHANNEL")]
        channels: Vec<String>,
        /// Extra pip requirement merged into the environment update; repeatable
        #[arg(long = "pip-arg", value_name = "REQUIREMENT")]
        pip_args: Vec<String>,
        /// Environment file to apply, local path or URL
        #[arg(long)]
        env_file: Option<String>,
        /// Trampoline style: activate or exec-real
        #[arg(long, default_value = "activate")]
        trampoline: String,
        /// Bootstrap even when the environment already checks out
        #[arg(long)]
        force: bool,
        /// Skip the kernel restart after bootstrapping
        #[arg(long)]
        no_restart: bool,
    },
    /// Verify that the bootstrapped environment is usable
    Check {
        /// Installation prefix
        #[arg(long, default_value = "/usr/local")]
        prefix: PathBuf,
        /// Host interpreter the bootstrap interposed
        #[arg(long, default_value = "/usr/bin/python3")]
        interpreter: PathBuf,
        /// Target python as major.minor; probed from the interpreter when omitted
        #[arg(long)]
        python_version: Option<String>,
        /// Trampoline style: activate or exec-real
        #[arg(long, default_value = "activate")]
        trampoline: String,
    },
    /// List packages installed into the prefix
    List {
        /// Installation prefix
        #[arg(long, default_value = "/usr/local")]
        prefix: PathBuf,
        /// Emit the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// Install additional packages into the prefix
    Add {
        /// Installation prefix
        #[arg(long, default_value = "/usr/local")]
        prefix: PathBuf,
        /// Package specs to install
        #[arg(required = true)]
        specs: Vec<String>,
    },
    /// Report the on-disk state of the prefix
    Doctor {
        /// Installation prefix
        #[arg(long, default_value = "/usr/local")]
        prefix: PathBuf,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Install {
            distribution,
            url,
            sha256,
            prefix,
            interpreter,
            python_version,
            env_overrides,
            extra_specs,
            channels,
            pip_args,
            env_file,
            trampoline,
            force,
            no_restart,
        } => flows::install_flow(InstallOptions {
            distribution,
            url,
            sha256,
            prefix,
            interpreter,
            python_version,
            env_overrides,
            extra_specs,
            channels,
            pip_args,
            env_file,
            trampoline,
            force,
            no_restart,
        }),
        Commands::Check {
            prefix,
            interpreter,
            python_version,
            trampoline,
        } => flows::check_flow(CheckOptions {
            prefix,
            interpreter,
            python_version,
            trampoline,
        }),
        Commands::List { prefix, json } => flows::list_flow(prefix, json),
        Commands::Add { prefix, specs } => flows::add_flow(prefix, specs),
        Commands::Doctor { prefix } => flows::doctor_flow(prefix),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "condaboot",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}
