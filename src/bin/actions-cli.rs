use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};

#[derive(Parser)]
#[command(name = "actions-cli")]
#[command(about = "Management CLI for the chain-actions service", long_about = None)]
struct Cli {
    #[arg(short, long, env = "CHAIN_ACTIONS_URL", default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show service status
    Status,
    /// List the actions compiled for a contract
    Actions {
        /// Contract id
        contract_id: i64,
    },
    /// Resolve (and create if needed) the caller's wallet
    Wallet {
        #[arg(long, env = "CHAIN_ACTIONS_IDENTITY_TOKEN")]
        token: String,
        #[arg(long)]
        pin: Option<String>,
    },
    /// Invoke an action
    Invoke {
        /// Action key, e.g. 3_transfer_0
        action_key: String,
        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
        #[arg(long, env = "CHAIN_ACTIONS_IDENTITY_TOKEN")]
        token: String,
        #[arg(long)]
        pin: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{base}/api/v1/status")).send().await?;
            print_response(res).await?;
        }
        Commands::Actions { contract_id } => {
            let res = client
                .get(format!("{base}/api/v1/contracts/{contract_id}/actions"))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Wallet { token, pin } => {
            let res = client
                .post(format!("{base}/api/v1/wallet"))
                .json(&json!({ "identityToken": token, "pin": pin }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Invoke {
            action_key,
            args,
            token,
            pin,
        } => {
            let args: Map<String, Value> = serde_json::from_str(&args)
                .map_err(|e| format!("--args must be a JSON object: {e}"))?;
            let res = client
                .post(format!("{base}/api/v1/execute"))
                .json(&json!({
                    "actionKey": action_key,
                    "args": args,
                    "identityToken": token,
                    "pin": pin,
                }))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
