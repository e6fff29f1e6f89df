use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use dealboard::cli::{Cli, Commands, ConfigAction, OutputOptions};
use dealboard::commands::{
    BoardOptions, cmd_batch, cmd_board, cmd_config_get, cmd_config_set, cmd_config_show,
    cmd_detect, cmd_list, cmd_move, cmd_range,
};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .ok();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let output = OutputOptions { json: cli.json };

    let result = match cli.command {
        Commands::Range { preset, today } => cmd_range(preset, today.as_deref(), output),
        Commands::Detect { from, to, today } => cmd_detect(&from, &to, today.as_deref(), output),
        Commands::Board {
            workspace,
            archived,
            pages,
            find,
            filter,
        } => {
            cmd_board(
                BoardOptions {
                    workspace: workspace.as_deref(),
                    archived,
                    pages,
                    find: find.as_deref(),
                    filter: &filter,
                },
                output,
            )
            .await
        }
        Commands::List {
            workspace,
            archived,
            pages,
            filter,
        } => cmd_list(workspace.as_deref(), archived, pages, &filter, output).await,
        Commands::Move {
            deal,
            from,
            to,
            index,
            workspace,
        } => cmd_move(&deal, &from, &to, index, workspace.as_deref(), output).await,
        Commands::Batch {
            action,
            ids,
            stage,
            yes,
            workspace,
        } => {
            cmd_batch(
                action,
                &ids,
                stage.as_deref(),
                yes,
                workspace.as_deref(),
                output,
            )
            .await
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cmd_config_show(output),
            ConfigAction::Get { key } => cmd_config_get(&key, output),
            ConfigAction::Set { key, value } => cmd_config_set(&key, &value, output),
        },
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
