use std::{error::Error, io};

use clap::Parser;

use resolution_core::cli::{
    args::{CliArgs, Command},
    command_handlers::{do_artifacts, do_substitutions, CoreOptions},
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = CliArgs::parse();

    let options = CoreOptions {
        current_build: cli_args.current_build,
        sort_order: cli_args.sort_order,
        build_project_dependencies: cli_args.no_build_project_dependencies.then_some(false),
    };
    let mut out = io::stdout().lock();

    match cli_args.cmd {
        Command::Substitutions { scenario } => do_substitutions(&options, &scenario, &mut out),
        Command::Artifacts { scenario } => do_artifacts(&options, &scenario, &mut out),
    }
}
