use crate::fake;
use async_stream::stream;
use futures::stream::{Stream, StreamExt};
use quilt_core::{make, CoreError, NodePath, Tree};
use quilt_stitch::{Patches, StitchError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Stitch(#[from] StitchError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Producer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Stitched catalog has {found} products, expected {expected}")]
    Mismatch { expected: usize, found: usize },
}

/// Shape of a simulated catalog.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    pub products: usize,
    pub reviews_per_product: usize,
    pub related_per_product: usize,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            products: 10,
            reviews_per_product: 3,
            related_per_product: 2,
            seed: None,
        }
    }
}

/// Statistics collected during a simulation run
#[derive(Clone, Debug)]
pub struct SimulationStats {
    pub products: usize,
    pub patches: usize,
    pub stitched: usize,
    pub written_bytes: usize,
    pub produce_time: Duration,
    pub stitch_time: Duration,
}

impl SimulationStats {
    pub fn print(&self) {
        println!("\n╔════════════════════════════════════════════════════════════╗");
        println!("║              Stitch Simulation Statistics                  ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║  Products:                  {:>30} ║", self.products);
        println!("║  Patches produced:          {:>30} ║", self.patches);
        println!("║  Patches stitched:          {:>30} ║", self.stitched);
        println!("║  Written size (bytes):      {:>30} ║", self.written_bytes);
        println!("║  Produce time:              {:>29}s ║", format!("{:.3}", self.produce_time.as_secs_f64()));
        println!("║  Stitch time:               {:>29}s ║", format!("{:.3}", self.stitch_time.as_secs_f64()));
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

fn rng_for(seed: Option<u64>, salt: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(salt)),
        None => StdRng::from_entropy(),
    }
}

/// Yields stored patches in a random order, the way a transport might
/// deliver them.
fn arrival_order(items: Vec<String>, seed: Option<u64>) -> impl Stream<Item = String> {
    stream! {
        let mut items = items;
        let mut rng = rng_for(seed, u64::MAX);
        items.shuffle(&mut rng);
        for item in items {
            yield item;
        }
    }
}

/// One producer: a product attached to the results list, then its reviews
/// and related products, each attached to the product's own lists.
async fn produce(
    results: Tree,
    patches: Arc<Mutex<Patches>>,
    config: SimulationConfig,
    index: usize,
) -> Result<(), SimulationError> {
    let mut rng = rng_for(config.seed, index as u64);

    let mut product = make(json!({ "reviews": [], "relatedProducts": [] }), Some(&results))?;
    for (key, value) in fake::product(&mut rng).as_object().into_iter().flatten() {
        product.set(&NodePath::parse(key), value.clone())?;
    }
    patches.lock().await.push(&product)?;
    tokio::task::yield_now().await;

    let reviews = product
        .subtree(&NodePath::parse("reviews"))
        .ok_or_else(|| CoreError::PathNotFound("reviews".into()))?;
    for _ in 0..config.reviews_per_product {
        let review = make(fake::review(&mut rng), Some(&reviews))?;
        patches.lock().await.push(&review)?;
        if rng.gen_bool(0.5) {
            tokio::task::yield_now().await;
        }
    }

    let related = product
        .subtree(&NodePath::parse("relatedProducts"))
        .ok_or_else(|| CoreError::PathNotFound("relatedProducts".into()))?;
    for _ in 0..config.related_per_product {
        let item = make(fake::product(&mut rng), Some(&related))?;
        patches.lock().await.push(&item)?;
    }

    tracing::debug!(index, reference = ?product.reference(), "producer finished");
    Ok(())
}

/// Produce a catalog from concurrent tasks, shuffle the patches and stitch
/// them back together.
pub async fn run(config: SimulationConfig) -> Result<(Tree, SimulationStats), SimulationError> {
    let start = Instant::now();

    let results: Tree = make(json!([]), None)?;
    let patches = Arc::new(Mutex::new(Patches::new()));
    patches.lock().await.push(&results)?;

    let handles: Vec<_> = (0..config.products)
        .map(|index| {
            tokio::spawn(produce(
                results.clone(),
                Arc::clone(&patches),
                config.clone(),
                index,
            ))
        })
        .collect();
    for outcome in futures::future::join_all(handles).await {
        outcome??;
    }
    let produce_time = start.elapsed();

    let collected = patches.lock().await.clone();
    let written = collected.write()?;
    tracing::info!(
        patches = collected.len(),
        bytes = written.len(),
        "patches collected"
    );

    let start = Instant::now();
    let mut delivered: Patches = Patches::new();
    let imported: Patches = Patches::read(&written)?;
    let mut incoming = Box::pin(arrival_order(imported.iter().map(String::from).collect(), config.seed));
    while let Some(text) = incoming.next().await {
        delivered.push_text(text)?;
    }

    let report = delivered.report()?;
    let stitched = report.stitched_count;
    let data = match (report.data, report.unstitched.len()) {
        (Some(data), 0) => data,
        (None, _) => return Err(StitchError::NoMainPatch.into()),
        (Some(_), remaining) => {
            return Err(StitchError::IncompletePatchSet { remaining }.into());
        }
    };
    let stitch_time = start.elapsed();

    let found = data.root().len();
    if found != config.products {
        return Err(SimulationError::Mismatch {
            expected: config.products,
            found,
        });
    }

    let stats = SimulationStats {
        products: found,
        patches: collected.len(),
        stitched,
        written_bytes: written.len(),
        produce_time,
        stitch_time,
    };
    Ok((data, stats))
}
