/// Example: Run the assist loop against the simulated arena
///
/// Uses a manual clock, so the session runs as fast as the CPU allows while
/// every wait still advances simulated time.
///
/// Usage:
///   cargo run --release --example simulate_session -- --ticks 500 --targets 4
use aim_assistant::simulation::{Arena, ArenaConfig};
use aim_assistant::{AssistConfig, AssistLoop, Clock, ManualClock};
use clap::Parser;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "simulate-session")]
#[command(about = "Drive the aim assistant against a simulated shooting range")]
struct Args {
    /// Number of loop iterations to run
    #[arg(long, default_value_t = 300)]
    ticks: u64,

    /// Targets alive in the arena at any time
    #[arg(long, default_value_t = 3)]
    targets: usize,

    /// Pointer counts per capture pixel (overrides the config file)
    #[arg(long)]
    sensitivity: Option<f32>,

    /// Arena spawn seed
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// JSON configuration file
    #[arg(long)]
    config: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    aim_assistant::init()?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AssistConfig::from_file(path)?,
        None => AssistConfig::default(),
    };
    if let Some(sensitivity) = args.sensitivity {
        config.scheduler.sensitivity = sensitivity;
    }
    config.validate()?;

    let arena = Arena::new(ArenaConfig {
        view_width: config.capture.width,
        view_height: config.capture.height,
        num_targets: args.targets,
        sensitivity: config.scheduler.sensitivity,
        seed: args.seed,
        ..ArenaConfig::default()
    });
    let clock = ManualClock::new();
    let start = clock.now();

    println!("🎯 Simulated session");
    println!("═══════════════════════════════════════════\n");

    let mut assist = AssistLoop::new(
        &config,
        arena.clone(),
        arena.clone(),
        arena.clone(),
        clock.clone(),
    );
    arena.set_toggle_down(true);
    assist.tick();
    arena.set_toggle_down(false);

    let wall_start = Instant::now();
    let stats = assist.run_ticks(args.ticks.saturating_sub(1)).clone();
    let wall = wall_start.elapsed();
    let simulated = clock.now() - start;

    println!("📊 Results:");
    println!("  Ticks: {}", stats.ticks);
    println!("  Frames processed: {}", stats.frames);
    println!("  Shots fired: {}", stats.shots);
    println!("  Targets destroyed: {}", arena.destroyed());
    if stats.shots > 0 {
        println!(
            "  Hit rate: {:.1}%",
            arena.destroyed() as f64 * 100.0 / stats.shots as f64
        );
    }
    println!("  Simulated time: {:.2}s", simulated.as_secs_f64());
    println!("  Wall time: {:.1}ms", wall.as_secs_f64() * 1000.0);
    println!("  Last action: {}", stats.last_action);

    Ok(())
}
