use clap::Parser;
use ferrumkv::config::{Config, DEFAULT_BASE_DIR, DEFAULT_LISTEN_ADDR};
use ferrumkv::{store, web};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// ferrumkv server
#[derive(Parser, Debug)]
#[command(name = "ferrumkv")]
#[command(about = "Minimal key-value store over HTTP")]
#[command(version)]
struct Args {
    /// Base directory of the database
    #[arg(short, long, default_value = DEFAULT_BASE_DIR)]
    base: String,

    /// Network address to listen on
    #[arg(short, long, default_value = DEFAULT_LISTEN_ADDR)]
    addr: String,

    /// Keep data in memory instead of the base directory
    #[arg(short, long)]
    memory: bool,

    /// Allow cross-origin requests from any origin
    #[arg(long)]
    cors: bool,
}

impl Args {
    fn into_config(self) -> Config {
        let builder = Config::builder()
            .listen_addr(self.addr)
            .cors(self.cors);

        if self.memory {
            builder.memory().build()
        } else {
            builder.base_dir(self.base).build()
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ferrumkv=debug,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Args::parse().into_config();
    info!("ferrumkv v{} starting...", ferrumkv::VERSION);

    let store = match store::open(&config.backend) {
        Ok(s) => s,
        Err(e) if e.is_config() => {
            error!("Invalid database directory: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            error!("Error initializing database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = web::run_web_server(&config.listen_addr, store, config.cors).await {
        error!("Web server error: {}", e);
        std::process::exit(1);
    }
}
