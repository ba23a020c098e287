mod fs_loader;
mod steps;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use gpu::RecordingSurface;
use navigation::{Engine, EngineConfig, EngineEvent, InputEvent};
use streaming::ResourceCache;
use tour::{AuthoringStyle, Tour};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::fs_loader::FsImageLoader;
use crate::steps::Step;

const TICK_S: f64 = 1.0 / 60.0;
/// Simulated seconds a walk waits for one step to settle.
const SETTLE_LIMIT_S: f64 = 60.0;

#[derive(Parser, Debug)]
#[command(author, version, about = "Validate and walk panorama tours headlessly")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a tour definition and report its nodes and edges
    Validate {
        tour: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a scripted session against a tour and print where it ends up
    Walk {
        tour: PathBuf,

        /// Directory image URLs are resolved against (default: the tour's directory)
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Engine config JSON
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        width: Option<u32>,

        #[arg(long)]
        height: Option<u32>,

        /// click:X,Y | hover:X,Y | look:DX,DY | back | home (repeatable)
        #[arg(long = "step")]
        steps: Vec<Step>,
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
        Command::Validate { tour, json } => cmd_validate(tour, json),
        Command::Walk {
            tour,
            assets,
            config,
            width,
            height,
            steps,
        } => cmd_walk(tour, assets, config, width, height, steps).await,
    }
}

fn load_tour(path: &Path) -> Result<Tour, String> {
    Tour::load(path).map_err(|e| format!("{}: {e}", path.display()))
}

fn cmd_validate(path: PathBuf, json: bool) -> Result<(), String> {
    let tour = load_tour(&path)?;
    let graph = tour.graph();
    let style = match tour.style() {
        AuthoringStyle::Geometric => "geometric",
        AuthoringStyle::Mask => "mask",
    };

    if json {
        let nodes: Vec<serde_json::Value> = graph
            .iter()
            .map(|node| {
                let edges: Vec<serde_json::Value> = node
                    .hotspots
                    .edges()
                    .into_iter()
                    .map(|e| serde_json::json!({ "key": e.key, "target": e.target.as_str() }))
                    .collect();
                serde_json::json!({ "id": node.id.as_str(), "image": node.image, "edges": edges })
            })
            .collect();
        let summary = serde_json::json!({
            "name": tour.name(),
            "initial": tour.initial().as_str(),
            "style": style,
            "nodes": nodes,
            "resources": tour.resource_urls(),
        });
        let text = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
        println!("{text}");
        return Ok(());
    }

    println!(
        "{}: {} nodes, {style} hotspots, starts at {}",
        tour.name().unwrap_or("tour"),
        graph.len(),
        tour.initial()
    );
    for node in graph.iter() {
        let edges = node.hotspots.edges();
        println!("  {} ({}) -> {} edge(s)", node.id, node.image, edges.len());
        for edge in edges {
            println!("    {} -> {}", edge.key, edge.target);
        }
    }
    Ok(())
}

async fn cmd_walk(
    path: PathBuf,
    assets: Option<PathBuf>,
    config: Option<PathBuf>,
    width: Option<u32>,
    height: Option<u32>,
    steps: Vec<Step>,
) -> Result<(), String> {
    let tour = load_tour(&path)?;
    let mut cfg = match config {
        Some(p) => EngineConfig::load(&p).map_err(|e| format!("{}: {e}", p.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(w) = width {
        cfg.viewport.width = w;
    }
    if let Some(h) = height {
        cfg.viewport.height = h;
    }
    cfg.validate().map_err(|e| e.to_string())?;

    let root = assets.unwrap_or_else(|| {
        path.parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    });
    let cache = ResourceCache::new(Arc::new(FsImageLoader::new(root)));
    let mut engine = Engine::new(tour, cfg, cache, RecordingSurface::bounded(1));

    let report = engine.preload().await;
    info!(ready = report.ready.len(), failed = report.failed.len(), "preloaded");
    for err in &report.failed {
        warn!(%err, "resource unavailable");
    }

    engine.start();
    settle(&mut engine).await?;
    report_events(&mut engine)?;
    print_position(&engine, "start");

    let (cx, cy) = {
        let (w, h) = engine.camera().viewport();
        (w as f64 / 2.0, h as f64 / 2.0)
    };
    for step in steps {
        match step {
            Step::Click { x, y } => engine.handle_input(InputEvent::Click { x, y }),
            Step::Hover { x, y } => {
                engine.handle_input(InputEvent::PointerMove { x, y });
                match engine.hovered() {
                    Some(h) => println!(
                        "hover: {} -> {}{}",
                        h.key,
                        h.target,
                        h.label.as_deref().map(|l| format!(" ({l})")).unwrap_or_default()
                    ),
                    None => println!("hover: nothing"),
                }
            }
            Step::Look { dx, dy } => {
                engine.handle_input(InputEvent::PointerDown { x: cx, y: cy });
                engine.handle_input(InputEvent::PointerMove { x: cx + dx, y: cy + dy });
                engine.handle_input(InputEvent::PointerUp { x: cx + dx, y: cy + dy });
            }
            Step::Back => {
                if !engine.go_back() {
                    println!("back: nothing to go back to");
                }
            }
            Step::Home => {
                engine.go_home();
            }
        }
        settle(&mut engine).await?;
        report_events(&mut engine)?;
        print_position(&engine, &step.to_string());
    }
    Ok(())
}

/// Tick at 60 Hz until no transition is in flight.
async fn settle(engine: &mut Engine<RecordingSurface>) -> Result<(), String> {
    let mut elapsed = 0.0;
    loop {
        engine.tick(TICK_S);
        if !engine.is_transitioning() {
            return Ok(());
        }
        elapsed += TICK_S;
        if elapsed > SETTLE_LIMIT_S {
            return Err(format!("transition did not settle within {SETTLE_LIMIT_S}s"));
        }
        // Let blocking decodes make progress.
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

fn report_events(engine: &mut Engine<RecordingSurface>) -> Result<(), String> {
    for event in engine.drain_events() {
        match event.payload {
            EngineEvent::TransitionFailed {
                to, error, from, ..
            } => {
                if from.is_none() {
                    return Err(format!("cannot show initial node {to}: {error}"));
                }
                println!("transition to {to} failed: {error}");
            }
            EngineEvent::TransitionCommitted { to, kind, .. } => {
                info!(frame = event.frame_index, node = %to, ?kind, "committed");
            }
            _ => {}
        }
    }
    Ok(())
}

fn print_position(engine: &Engine<RecordingSurface>, label: &str) {
    let node = engine
        .current_node()
        .map(|n| n.id.to_string())
        .unwrap_or_else(|| "-".to_string());
    let view = engine.camera().view();
    println!(
        "{label}: at {node} (lon {:.1}, lat {:.1}, fov {:.1}), history {}",
        view.lon_deg,
        view.lat_deg,
        view.fov_deg,
        engine.history().len()
    );
}
