use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "breaker-cli")]
#[command(about = "Management CLI for shared circuit breakers", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "BREAKER_ADMIN_KEY", default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check admin service status
    Status,
    /// List every registered breaker
    List,
    /// Show one breaker, e.g. `db:contacts-db`
    Show { key: String },
    /// Force a breaker closed
    Reset { key: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let request = match &cli.command {
        Commands::Status => client.get(admin_url(&cli.url, &["admin", "status"])?),
        Commands::List => client.get(admin_url(&cli.url, &["admin", "breakers"])?),
        Commands::Show { key } => {
            client.get(admin_url(&cli.url, &["admin", "breakers", key.as_str()])?)
        }
        Commands::Reset { key } => {
            client.post(admin_url(&cli.url, &["admin", "breakers", key.as_str(), "reset"])?)
        }
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

/// Append path segments to the admin base URL, percent-encoding each one.
fn admin_url(base: &str, segments: &[&str]) -> Result<url::Url, Box<dyn std::error::Error>> {
    let mut url = url::Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| format!("admin URL cannot be a base: {}", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
