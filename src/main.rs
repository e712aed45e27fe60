use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use dbml_refs::{
    config::schema::load_config, dbml, frontend::http::run_server,
    upstream::HttpSchemaSource,
};

const DEFAULT_LOG_FILTER: &str = "dbml_refs=info,warp=info";

#[derive(Debug, Parser)]
#[clap(
    name = "dbml-refs",
    version,
    about = "Infer missing foreign-key relationships in DBML schemas"
)]
struct Args {
    /// TOML config file. Environment variables prefixed with DBML_REFS__ override it.
    #[clap(short, long)]
    config_path: Option<PathBuf>,

    /// Augment a single DBML file (`-` for stdin), print the result and exit
    #[clap(long)]
    one_off: Option<String>,

    /// Emit logs as JSON
    #[clap(long)]
    json_logs: bool,
}

fn prepare_tracing(json_logs: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // Logs go to stderr so that one-off output on stdout stays clean
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    if json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_input(path: &str) -> io::Result<String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
    }
}

fn run_one_off(path: &str) -> i32 {
    let raw = match read_input(path) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            return 2;
        }
    };

    let augmentation = dbml::augment(&raw);
    if augmentation.tables.is_empty() {
        eprintln!("No table declarations found in {path}");
        return 1;
    }

    info!(
        "Inferred {} relationship(s) across {} table(s)",
        augmentation.generated.len(),
        augmentation.tables.len()
    );
    println!("{}", augmentation.dbml);
    0
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    prepare_tracing(args.json_logs);

    if let Some(path) = &args.one_off {
        process::exit(run_one_off(path));
    }

    let config = match load_config(args.config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading the config: {e}");
            process::exit(2);
        }
    };

    let source = match HttpSchemaSource::new(&config.upstream) {
        Ok(source) => Arc::new(source),
        Err(e) => {
            error!("Error setting up the schema source client: {e}");
            process::exit(2);
        }
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            // Keep serving; the process can still be killed
            error!("Error listening for the shutdown signal: {e}");
            std::future::pending::<()>().await;
        }
        info!("Shutting down");
    };

    if let Err(e) = run_server(source, config.frontend.http, shutdown).await {
        error!("{e}");
        process::exit(1);
    }
}
