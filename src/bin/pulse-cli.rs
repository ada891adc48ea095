use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "pulse-cli")]
#[command(about = "Probe and load CLI for the pulse-demo service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call the health probe
    Health,
    /// Fetch the welcome message
    Welcome,
    /// Fetch sample data (answers after a random delay)
    Data,
    /// Trigger the simulated error
    Error,
    /// Print the metrics exposition, optionally only lines containing a pattern
    Metrics {
        #[arg(short, long)]
        grep: Option<String>,
    },
    /// Send repeated requests to one path and summarize the status codes
    Load {
        #[arg(short, long, default_value = "/")]
        path: String,
        #[arg(short, long, default_value_t = 10)]
        count: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => print_json(client.get(format!("{base}/health")).send().await?).await?,
        Commands::Welcome => print_json(client.get(format!("{base}/")).send().await?).await?,
        Commands::Data => print_json(client.get(format!("{base}/api/data")).send().await?).await?,
        Commands::Error => print_json(client.get(format!("{base}/api/error")).send().await?).await?,
        Commands::Metrics { grep } => {
            let res = client.get(format!("{base}/metrics")).send().await?;
            let status = res.status();
            let body = res.text().await?;
            if !status.is_success() {
                eprintln!("Error: metrics endpoint returned status {}", status);
                eprintln!("Response: {}", body);
                return Ok(());
            }
            for line in body.lines() {
                if grep.as_deref().map_or(true, |pattern| line.contains(pattern)) {
                    println!("{}", line);
                }
            }
        }
        Commands::Load { path, count } => {
            let url = format!("{base}{path}");
            let mut statuses = std::collections::BTreeMap::new();
            for _ in 0..count {
                let status = client.get(&url).send().await?.status().as_u16();
                *statuses.entry(status).or_insert(0u32) += 1;
            }
            for (status, n) in statuses {
                println!("{} {}", status, n);
            }
        }
    }

    Ok(())
}

async fn print_json(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let request_id = res
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    eprintln!("{} (request id {})", status, request_id);

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
