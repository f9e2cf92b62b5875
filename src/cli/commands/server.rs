use clap::Subcommand;
use serde_json::Value;

use crate::cli::utils::{base_url, output_value};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Show server information from the API root endpoint")]
    Info {
        #[arg(default_value = "http://localhost:3000", help = "Server URL")]
        url: String,
    },

    #[command(about = "Check server health from the /health endpoint")]
    Health {
        #[arg(default_value = "http://localhost:3000", help = "Server URL")]
        url: String,
    },

    #[command(about = "Resolve the user id a bearer token carries")]
    Whoami {
        #[arg(help = "Bearer token")]
        token: String,
        #[arg(long, default_value = "http://localhost:3000", help = "Server URL")]
        url: String,
    },
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = reqwest::Client::new();

    let (path, url, token) = match cmd {
        ServerCommands::Info { url } => ("/", url, None),
        ServerCommands::Health { url } => ("/health", url, None),
        ServerCommands::Whoami { token, url } => ("/get-user-id", url, Some(token)),
    };

    let mut request = client.get(format!("{}{}", base_url(&url), path));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request.send().await?;
    let status = response.status();
    let body: Value = response.json().await?;

    if !status.is_success() {
        output_value(&OutputFormat::Json, &body)?;
        anyhow::bail!("{} returned {}", path, status);
    }

    let data = body.get("data").cloned().unwrap_or(body);
    output_value(&output_format, &data)
}
