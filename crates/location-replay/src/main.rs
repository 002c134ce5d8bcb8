use location_replay::{Settings, run_replay, setup_logging};

fn main() {
    setup_logging();
    let settings = Settings::from_cli();

    // The component is single-threaded, so everything runs on the current thread
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start the async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(run_replay(settings)) {
        tracing::error!("Replay failed: {}", e);
        std::process::exit(1);
    }
}
