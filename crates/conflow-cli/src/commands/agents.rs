//! Agent list commands

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};
use conflow_core_types::RequestContext;
use conflow_engine::{create_entity, list_entities, CreateEntityRequest, EngineContext};
use conflow_store::PlaceholderEnv;

#[derive(Debug, Args)]
pub struct AgentsArgs {
    #[command(subcommand)]
    pub command: AgentsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AgentsCommand {
    /// Add an agent and create its workspace directory
    Create(CreateArgs),
    /// Print the agent list as JSON
    List(ListArgs),
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long, env = "CONFLOW_CONFIG", default_value = "conflow.json")]
    pub config: PathBuf,

    #[arg(long)]
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    /// Parent directory for workspaces not named in the config
    #[arg(long, env = "CONFLOW_WORKSPACE_ROOT", default_value = ".")]
    pub workspace_root: PathBuf,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long, env = "CONFLOW_CONFIG", default_value = "conflow.json")]
    pub config: PathBuf,
}

pub async fn execute(args: AgentsArgs) -> anyhow::Result<()> {
    match args.command {
        AgentsCommand::Create(create_args) => execute_create(create_args).await,
        AgentsCommand::List(list_args) => execute_list(list_args).await,
    }
}

async fn execute_create(args: CreateArgs) -> anyhow::Result<()> {
    let engine = EngineContext::open_file(
        &args.config,
        &args.workspace_root,
        PlaceholderEnv::from_process(),
    );
    let mut request = CreateEntityRequest::new(args.id);
    if let Some(name) = args.name {
        request = request.with_name(name);
    }

    let result = create_entity(request, &RequestContext::new(), &engine)
        .await
        .with_context(|| format!("creating agent in {}", args.config.display()))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn execute_list(args: ListArgs) -> anyhow::Result<()> {
    // Listing never writes; the workspace root is unused.
    let engine = EngineContext::open_file(&args.config, ".", PlaceholderEnv::from_process());
    let listing = list_entities(&engine)
        .await
        .with_context(|| format!("reading {}", args.config.display()))?;

    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}
