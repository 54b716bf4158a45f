use crate::cli::{Cli, Commands, SetupAgent};
use crate::commands::{confirm, AppContext};
use crate::domain::models::SetupReport;
use crate::services::config::{config_path, load_config, write_config, AppConfig};
use crate::services::output::print_one;
use crate::services::setup::{
    install_codex_skill, install_portable_prompt, merged_setup_config,
};
use crate::services::storage::{audit, content_digest};

/// Handle the setup command; returns false when another handler owns the
/// invocation.
pub fn handle_setup_commands(cli: &Cli, ctx: &AppContext) -> anyhow::Result<bool> {
    let Commands::Setup {
        agent,
        skill_dir,
        codex_dir,
        home_dir,
        force,
        yes,
    } = &cli.command
    else {
        return Ok(false);
    };

    let config_file = config_path(&ctx.project_root);
    let mut cfg = if config_file.exists() {
        load_config(&config_file)?
    } else {
        AppConfig::default()
    };

    let chosen_agent = (*agent).unwrap_or(cfg.setup.agent);
    let result = match chosen_agent {
        SetupAgent::None => {
            install_portable_prompt(&ctx.project_root, skill_dir.as_deref(), *force)?
        }
        SetupAgent::Codex => install_codex_skill(codex_dir.as_deref(), *force)?,
    };

    cfg.setup = merged_setup_config(
        &cfg.setup,
        chosen_agent,
        skill_dir.as_deref(),
        codex_dir.as_deref(),
        home_dir.as_deref(),
    );

    let should_persist = *yes
        || (!ctx.json
            && confirm(
                &format!("Persist setup defaults to {}?", config_file.display()),
                true,
            ));
    if should_persist {
        write_config(&config_file, &cfg)?;
    }

    let digest = content_digest(&result.content);
    audit(
        &ctx.user_home,
        "setup",
        serde_json::json!({
            "agent": chosen_agent.as_str(),
            "destination": result.destination.to_string_lossy(),
            "status": result.action,
            "sha256": &digest,
        }),
    );

    let report = SetupReport {
        agent: chosen_agent.as_str().to_string(),
        destination: result.destination.to_string_lossy().into_owned(),
        status: result.action.to_string(),
        sha256: digest,
    };
    print_one(ctx.json, report, |r| {
        format!(
            "agent: {}\ndestination: {}\nstatus: {}",
            r.agent, r.destination, r.status
        )
    })?;

    Ok(true)
}
