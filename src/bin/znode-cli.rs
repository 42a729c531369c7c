use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "znode-cli")]
#[command(about = "Command line client for the ZooKeeper REST proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    /// API key sent as X-API-Key
    #[arg(short, long, env = "API_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the children of a znode
    Ls { path: String },
    /// Show a znode's data and stat
    Get { path: String },
    /// Check whether a znode exists
    Stat { path: String },
    /// Create a znode, with any missing parents
    Create {
        path: String,
        data: Option<String>,
        #[arg(long)]
        ephemeral: bool,
        #[arg(long)]
        sequence: bool,
    },
    /// Replace a znode's data
    Set { path: String, data: String },
    /// Delete a znode
    Rm {
        path: String,
        #[arg(short, long)]
        recursive: bool,
    },
    /// Check proxy and ZooKeeper connectivity
    Health,
}

struct Proxy {
    client: reqwest::Client,
    base: String,
    headers: HeaderMap,
}

impl Proxy {
    fn new(url: &str, key: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut headers = HeaderMap::new();
        if let Some(key) = key {
            headers.insert("x-api-key", HeaderValue::from_str(key)?);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base: url.trim_end_matches('/').to_string(),
            headers,
        })
    }

    fn node(&self, method: Method, path: &str) -> RequestBuilder {
        let path = path.trim_start_matches('/');
        let url = if path.is_empty() {
            format!("{}/znodes/v1", self.base)
        } else {
            format!("{}/znodes/v1/{}", self.base, path)
        };
        self.client.request(method, url).headers(self.headers.clone())
    }
}

/// Structured JSON for object and array arguments, text otherwise.
fn data_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let proxy = Proxy::new(&cli.url, cli.key.as_deref())?;

    match cli.command {
        Commands::Ls { path } => {
            let mut request = proxy.node(Method::GET, &path);
            if !path.trim_start_matches('/').is_empty() {
                request = request.query(&[("view", "children")]);
            }
            print_response(request.send().await?).await?;
        }
        Commands::Get { path } => {
            let res = proxy.node(Method::GET, &path).send().await?;
            print_response(res).await?;
        }
        Commands::Stat { path } => {
            let res = proxy.node(Method::HEAD, &path).send().await?;
            match res.status() {
                s if s.is_success() => println!("{} exists", path),
                reqwest::StatusCode::NOT_FOUND => println!("{} does not exist", path),
                s => eprintln!("Error: proxy returned status {}", s),
            }
        }
        Commands::Create {
            path,
            data,
            ephemeral,
            sequence,
        } => {
            let body = json!({
                "data": data.as_deref().map(data_value).unwrap_or(Value::Null),
                "ephemeral": ephemeral,
                "sequence": sequence,
            });
            let res = proxy.node(Method::POST, &path).json(&body).send().await?;
            print_response(res).await?;
        }
        Commands::Set { path, data } => {
            let body = json!({ "data": data_value(&data) });
            let res = proxy.node(Method::PUT, &path).json(&body).send().await?;
            print_response(res).await?;
        }
        Commands::Rm { path, recursive } => {
            let res = proxy
                .node(Method::DELETE, &path)
                .query(&[("recursive", recursive)])
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Health => {
            let res = proxy
                .client
                .get(format!("{}/health", proxy.base))
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
        eprintln!("Error: proxy returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
