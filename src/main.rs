use clap::Parser;

mod cli;
mod commands;
mod domain;
mod services;

use cli::Cli;
use commands::AppContext;
use domain::errors::RoleError;
use domain::models::{ErrorBody, JsonErr};

fn main() {
    let cli = Cli::parse();
    let json = cli.json;
    if let Err(error) = run(&cli) {
        report_error(json, &error);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let ctx = AppContext::from_cli(cli)?;
    if commands::handle_setup_commands(cli, &ctx)? {
        return Ok(());
    }
    commands::handle_runtime_commands(cli, &ctx)
}

fn report_error(json: bool, error: &anyhow::Error) {
    let code = error
        .downcast_ref::<RoleError>()
        .map(RoleError::code)
        .unwrap_or("ERROR");
    if json {
        let envelope = JsonErr {
            ok: false,
            error: ErrorBody {
                code: code.to_string(),
                message: error.to_string(),
            },
        };
        if let Ok(rendered) = serde_json::to_string_pretty(&envelope) {
            println!("{rendered}");
        }
    } else {
        eprintln!("error: {error}");
    }
}
