use std::sync::Arc;
use std::time::Instant;

use worker_offload::config::OffloadConfig;
use worker_offload::error::Result;
use worker_offload::greeting;
use worker_offload::worker::{CancelToken, ComputationRegistry, Controller};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = OffloadConfig::from_env()?;

    for line in greeting::hello_lines(&config.greeting_name, &[1, 2, 3, 4, 5]) {
        println!("{line}");
    }

    let registry = Arc::new(ComputationRegistry::with_builtins(&config));
    eprintln!("\n⚙️  worker-offload v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Computations: {}", registry.list().join(", "));
    eprintln!("   Worker target: {}", config.worker_target);

    // ── Blocking run: the heavy loop on the main flow ──────────────────
    if let Some(heavy) = registry.get("heavy_loop") {
        eprintln!("\nCalculating on the main flow... nothing else can run.");
        let started = Instant::now();
        let result = heavy.compute(&serde_json::Value::from("start"), &CancelToken::new())?;
        eprintln!(
            "Blocking result: {result} (main flow unavailable for {:?})",
            started.elapsed()
        );
    }

    // ── Offloaded run: same work on a worker ───────────────────────────
    eprintln!("\nCalculating with a worker... main flow stays responsive.");
    let mut controller = Controller::with_registry(Arc::clone(&registry));
    if controller.create(&config.worker_target).is_some() {
        controller.send("start");
    }

    let mut updates = controller.subscribe();
    let mut ticker = tokio::time::interval(config.tick_interval);
    let mut ticks: u64 = 0;
    loop {
        if updates.borrow_and_update().is_settled() {
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {
                ticks += 1;
                tracing::info!(ticks, "Main flow still responsive");
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    let snapshot = controller.snapshot();
    match (&snapshot.result, &snapshot.error) {
        (Some(result), _) => eprintln!("Worker result: {result} ({ticks} ticks while waiting)"),
        (None, Some(error)) => eprintln!("Error: {error}"),
        (None, None) => eprintln!("Worker produced no outcome"),
    }

    controller.dispose();
    Ok(())
}
