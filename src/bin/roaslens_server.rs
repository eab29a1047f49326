//! RoasLens API Server binary
//!
//! HTTP REST API for ROAS change analysis.

use clap::Parser;
use roaslens::api::{run_api_server, ApiConfig};

#[derive(Parser, Debug)]
#[command(name = "roaslens-server")]
#[command(version)]
#[command(about = "RoasLens API Server - HTTP REST API for ROAS change analysis")]
#[command(long_about = r#"
RoasLens API Server - HTTP REST API

Endpoints:
  - POST /api/v1/analyze         - Analyze a report on the server's filesystem
  - POST /api/v1/analyze/upload  - Analyze a report sent as the request body
  - POST /api/v1/columns         - Show the resolved column mapping

Additional endpoints:
  - GET  /health                 - Health check
  - GET  /version                - Server version info
  - GET  /                       - API documentation

Example usage:
  roaslens-server                           # Start on localhost:8080
  roaslens-server --host 0.0.0.0 --port 3000

  curl -X POST http://localhost:8080/api/v1/analyze \
    -H "Content-Type: application/json" \
    -d '{"file_path": "report.xlsx", "mode": "week"}'

  curl -X POST "http://localhost:8080/api/v1/analyze/upload?filename=report.csv" \
    --data-binary @report.csv
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "ROASLENS_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "ROASLENS_PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ApiConfig {
        host: args.host,
        port: args.port,
    };

    run_api_server(config).await
}
