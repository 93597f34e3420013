use subway::config::{self, Config, DEFAULT_CONFIG_PATH, ENV_FILE};
use subway::server::{shutdown_signal, Server};
use subway::{app, logger};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // `.env` feeds the environment layer, PORT included
    config::load_env_file(ENV_FILE)?;

    // Optional first argument: config file path, extension optional
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Size the Tokio runtime from `server.workers`
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        logger::log_debug(&format!("[CONFIG] Using {workers} worker threads"));
    } else {
        logger::log_debug("[CONFIG] Using default worker threads (CPU cores)");
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let routes = app::build_routes(&cfg)?;
    let server = Server::bind(&cfg, routes)?;
    server.run_until(shutdown_signal()).await?;
    Ok(())
}
