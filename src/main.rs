use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use storefront::api::ApiClient;
use storefront::config::{ConfigError, StorefrontConfig};
use storefront::notify::TracingNotifier;
use storefront::router::Router;
use storefront::routes::{ActionOutcome, FormData, Navigation, RouteContext, RouteFailure};
use storefront::session::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("token store: {0}")]
    Store(#[from] StoreError),
    #[error("invalid form field `{0}`; expected key=value")]
    InvalidField(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "storefront", about = "Resolve storefront routes against the commerce API")]
struct Cli {
    /// Overrides APP_API_BASEURL.
    #[arg(long)]
    base_url: Option<String>,

    /// Overrides APP_TOKEN_FILE.
    #[arg(long)]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a route's loader, e.g. `load "/products?page=2"`.
    Load { path: String },
    /// Run a route's action with form fields.
    Submit {
        path: String,
        #[arg(long = "field", short = 'f', value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = match cli.base_url.as_deref() {
        Some(base_url) => StorefrontConfig::new(base_url)?,
        None => StorefrontConfig::from_env()?,
    };
    let token_file = cli.token_file.or_else(|| config.token_file.clone());
    let persisted = token_file.is_some();

    let store: Arc<dyn TokenStore> = match token_file {
        Some(path) => Arc::new(FileTokenStore::open(path)?),
        None => Arc::new(MemoryTokenStore::new()),
    };
    tracing::info!(api = %config.api_base_url, persisted, signed_in = store.get().is_some(), "storefront starting");

    let api = ApiClient::new(config, store)?;
    let router = Router::storefront(RouteContext::new(api, Arc::new(TracingNotifier)));

    let rendered = match cli.command {
        Command::Load { path } => render_load(router.load(&path).await),
        Command::Submit { path, fields } => {
            let form = parse_fields(&fields)?;
            render_submit(router.submit(&path, &form).await)
        }
    };
    print_json(&rendered)
}

fn parse_fields(fields: &[String]) -> Result<FormData, CliError> {
    let mut form = FormData::new();
    for field in fields {
        let Some((key, value)) = field.split_once('=') else {
            return Err(CliError::InvalidField(field.clone()));
        };
        form.insert(key.trim(), value);
    }
    Ok(form)
}

fn render_load(result: Result<Navigation<Value>, RouteFailure>) -> Value {
    match result {
        Ok(Navigation::Render(view)) => json!({ "view": view }),
        Ok(Navigation::Redirect(to)) => json!({ "redirect": to }),
        Err(failure) => json!({ "error": failure }),
    }
}

fn render_submit(result: Result<ActionOutcome, RouteFailure>) -> Value {
    match result {
        Ok(ActionOutcome::Redirect(to)) => json!({ "redirect": to }),
        Ok(ActionOutcome::Rejected { error }) => json!({ "error": { "message": error } }),
        Ok(ActionOutcome::Handled) => json!({ "handled": true }),
        Err(failure) => json!({ "error": failure }),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
