use simulation::{SimulationConfig, SimulationError};
use tracing_subscriber::EnvFilter;

pub mod fake;
pub mod simulation;

fn main() -> Result<(), SimulationError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quilt=info")),
        )
        .init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async_main())
}

async fn async_main() -> Result<(), SimulationError> {
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            CONCURRENT PRODUCERS, OUT-OF-ORDER STITCH        ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    for config in [
        SimulationConfig::default(),
        SimulationConfig {
            products: 50,
            reviews_per_product: 5,
            related_per_product: 3,
            seed: Some(7),
        },
    ] {
        let (data, stats) = simulation::run(config).await?;
        stats.print();

        if let Some(first) = data.stripped().to_json().ok().and_then(|v| v.get(0).cloned()) {
            println!("\nFirst product:");
            println!("{}", serde_json::to_string_pretty(&first).unwrap_or_default());
        }
    }

    println!("\n✓ All simulations stitched successfully!");
    Ok(())
}
