use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use offerdesk_auth::{FileSessionStore, MemorySessionStore, RememberingSessionStore};
use offerdesk_client::{
    ApiClient, ClientConfig, Credentials, ListQuery, Resource, ResourceClient, ReqwestTransport,
};
use offerdesk_core::{Record, Role, as_record};
use offerdesk_normalize::{FieldMapConfig, HiddenFields};

type Store = RememberingSessionStore<MemorySessionStore, FileSessionStore>;
type Client = ApiClient<ReqwestTransport, Store>;

#[derive(Parser)]
#[command(name = "offerdesk")]
#[command(about = "Command-line access to the offer platform admin API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session.
    Login(LoginArgs),
    /// Sign out and forget the stored session.
    Logout,
    /// Print the signed-in user.
    Whoami,
    /// Exchange the stored refresh token for a new access token.
    Refresh,
    List(ListArgs),
    Get(ItemArgs),
    Create(WriteArgs),
    Update(UpdateArgs),
    Delete(ItemArgs),
}

#[derive(Args)]
struct LoginArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    /// Keep the session on disk across runs. Without it the session only
    /// lasts for this invocation.
    #[arg(long)]
    remember: bool,
}

#[derive(Args)]
struct ViewArgs {
    /// Field names to drop from output (case-insensitive).
    #[arg(long = "hide", value_delimiter = ',')]
    hidden: Vec<String>,
    /// Normalize for this role instead of the signed-in user's.
    #[arg(long)]
    role: Option<Role>,
}

#[derive(Args)]
struct ListArgs {
    resource: Resource,
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
    #[arg(long)]
    search: Option<String>,
    #[command(flatten)]
    view: ViewArgs,
}

#[derive(Args)]
struct ItemArgs {
    resource: Resource,
    id: String,
    #[command(flatten)]
    view: ViewArgs,
}

#[derive(Args)]
struct WriteArgs {
    resource: Resource,
    /// UI-shaped JSON object.
    #[arg(long)]
    data: String,
    #[command(flatten)]
    view: ViewArgs,
}

#[derive(Args)]
struct UpdateArgs {
    resource: Resource,
    id: String,
    /// UI-shaped JSON object.
    #[arg(long)]
    data: String,
    #[command(flatten)]
    view: ViewArgs,
}

#[tokio::main]
async fn main() {
    offerdesk_observability::init();

    if let Err(error) = run().await {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = ClientConfig::from_env().context("invalid client configuration")?;
    let client = Arc::new(build_client(&config)?);

    match cli.command {
        Commands::Login(args) => {
            let credentials = Credentials::new(args.email, args.password);
            let session = client.login(&credentials, args.remember).await?;
            print_json(&Value::Object(session.user))
        }
        Commands::Logout => {
            client.logout().await?;
            Ok(())
        }
        Commands::Whoami => match client.current_user()? {
            Some(user) => print_json(&Value::Object(user)),
            None => Err(anyhow!("not signed in")),
        },
        Commands::Refresh => {
            client
                .refresh_session()
                .await
                .context("token refresh failed; sign in again")?;
            tracing::info!("session refreshed");
            Ok(())
        }
        Commands::List(args) => {
            let resources = resource_client(&client, &config, &args.view)?;
            let mut query = ListQuery::new();
            query.page = args.page;
            query.limit = args.limit;
            query.search = args.search;
            let page = resources.list(args.resource, &query).await?;
            tracing::info!(
                page = page.pagination.page,
                total = page.pagination.total,
                pages = page.total_pages(),
                "listed {}",
                args.resource
            );
            print_json(&Value::Array(
                page.rows.into_iter().map(Value::Object).collect(),
            ))
        }
        Commands::Get(args) => {
            let resources = resource_client(&client, &config, &args.view)?;
            let record = resources.get(args.resource, &args.id).await?;
            print_json(&Value::Object(record))
        }
        Commands::Create(args) => {
            let resources = resource_client(&client, &config, &args.view)?;
            let record = resources
                .create(args.resource, &parse_record(&args.data)?)
                .await?;
            print_json(&Value::Object(record))
        }
        Commands::Update(args) => {
            let resources = resource_client(&client, &config, &args.view)?;
            let record = resources
                .update(args.resource, &args.id, &parse_record(&args.data)?)
                .await?;
            print_json(&Value::Object(record))
        }
        Commands::Delete(args) => {
            let resources = resource_client(&client, &config, &args.view)?;
            resources.delete(args.resource, &args.id).await?;
            Ok(())
        }
    }
}

fn build_client(config: &ClientConfig) -> Result<Client> {
    let path = session_path(config)?;
    tracing::debug!(session_file = %path.display(), base_url = %config.base_url, "using session file");

    let store = Arc::new(RememberingSessionStore::new(
        MemorySessionStore::new(),
        FileSessionStore::new(path),
    ));
    Ok(ApiClient::from_config(config, store)?)
}

fn session_path(config: &ClientConfig) -> Result<PathBuf> {
    config
        .session_file
        .clone()
        .or_else(FileSessionStore::default_path)
        .ok_or_else(|| anyhow!("no data directory on this platform; set OFFERDESK_SESSION_FILE"))
}

fn resource_client(
    client: &Arc<Client>,
    config: &ClientConfig,
    view: &ViewArgs,
) -> Result<ResourceClient<ReqwestTransport, Store>> {
    let fields = match &config.field_config {
        Some(path) => FieldMapConfig::from_path(path)?,
        None => {
            tracing::warn!("no field map configured; records will come back empty");
            FieldMapConfig::new()
        }
    };

    let mut resources = ResourceClient::new(Arc::clone(client), Arc::new(fields))
        .with_hidden_fields(HiddenFields::new(&view.hidden));
    if let Some(role) = view.role {
        resources = resources.with_role(role);
    }
    Ok(resources)
}

fn parse_record(raw: &str) -> Result<Record> {
    let value: Value = serde_json::from_str(raw).context("--data must be valid JSON")?;
    as_record(value).ok_or_else(|| anyhow!("--data must be a JSON object"))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
