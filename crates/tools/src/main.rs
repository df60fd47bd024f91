use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use compute::client::EvaluationClient;
use compute::config::ComputeConfig;
use compute::transport::ReqwestTransport;
use formats::geojson_bounds::geojson_bounds_str;
use formats::kernel::{GeometryKernel, NativeKernel};
use scene::World;
use scene::camera::{Camera, FramingPolicy};
use scene::ingest::ingest;
use tools::{CliTransport, EvaluationSummary, PayloadSummary, parse_param};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Evaluate Grasshopper definitions on a Compute server")]
struct Args {
    /// Compute server base URL
    #[arg(long, env = "COMPUTE_URL")]
    compute_url: Option<String>,

    /// Value of the RhinoComputeKey header
    #[arg(long, env = "RHINO_COMPUTE_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// HTTP timeout in seconds (0 disables it)
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a definition and summarize the returned geometry
    Evaluate {
        /// Local path or http(s) URL of the .gh file
        #[arg(long, default_value = "box.gh")]
        definition: String,

        /// Input as NAME=VALUE or NAME:TYPE=VALUE (repeatable)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<formats::protocol::Param>,

        /// Also write the raw response JSON here
        #[arg(long)]
        save_response: Option<PathBuf>,
    },

    /// Decode one geometry item payload and describe it
    Inspect {
        /// File holding the item's `data` text
        payload: PathBuf,
    },

    /// Print the fit-to-data bounds of a GeoJSON file
    Bbox {
        geojson: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = real_main(Args::parse()).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn real_main(args: Args) -> Result<(), String> {
    match args.command {
        Command::Evaluate {
            ref definition,
            ref params,
            ref save_response,
        } => {
            let mut config = ComputeConfig::new(args.compute_url.clone().unwrap_or_default());
            if let Some(key) = &args.api_key {
                config = config.with_api_key(key.as_str());
            }
            let timeout = (args.timeout_secs > 0).then(|| Duration::from_secs(args.timeout_secs));
            cmd_evaluate(config, timeout, definition, params, save_response.as_ref()).await
        }
        Command::Inspect { payload } => cmd_inspect(&payload),
        Command::Bbox { geojson } => cmd_bbox(&geojson),
    }
}

async fn cmd_evaluate(
    config: ComputeConfig,
    timeout: Option<Duration>,
    definition: &str,
    params: &[formats::protocol::Param],
    save_response: Option<&PathBuf>,
) -> Result<(), String> {
    // Fail on a bad URL before touching the filesystem or network.
    config.validate().map_err(|e| e.to_string())?;

    let http = ReqwestTransport::new(timeout).map_err(|e| e.to_string())?;
    let client = EvaluationClient::new(config, CliTransport::new(http));

    let definition = client
        .fetch_definition(definition)
        .await
        .map_err(|e| e.to_string())?;
    info!(
        hash = definition.content_hash(),
        bytes = definition.bytes().len(),
        "definition loaded"
    );

    let response = client
        .evaluate(&definition, params)
        .await
        .map_err(|e| e.to_string())?;

    if let Some(path) = save_response {
        let raw = serde_json::to_string_pretty(&response).map_err(|e| e.to_string())?;
        std::fs::write(path, raw).map_err(|e| format!("write {path:?}: {e}"))?;
    }

    let mut world = World::new();
    let report = ingest(&mut world, &response, &NativeKernel::new());
    let camera = Camera::evaluation_viewer();
    let framing = FramingPolicy::evaluation_results().frame(&report.bounds, camera.fov_deg);

    let summary =
        EvaluationSummary::new(definition.content_hash(), &response, &report, framing);
    let out = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
    println!("{out}");
    Ok(())
}

fn cmd_inspect(path: &PathBuf) -> Result<(), String> {
    let payload = std::fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    let object = NativeKernel::new().decode(&payload);
    let summary = PayloadSummary::new(&payload, &object);
    let out = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
    println!("{out}");
    Ok(())
}

fn cmd_bbox(path: &PathBuf) -> Result<(), String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    let bounds = geojson_bounds_str(&text)
        .map_err(|e| format!("parse {path:?}: {e}"))?
        .ok_or_else(|| format!("{path:?} has no coordinates"))?;
    let out = serde_json::to_string(&bounds.corners()).map_err(|e| e.to_string())?;
    println!("{out}");
    Ok(())
}
