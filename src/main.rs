//! Gravity CA CLI - Run simulations from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use gravity_ca::{
    compute::{Field, GravityMap, SimulationStats},
    schema::{MapConfig, Seed},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        let program = args.first().map_or("gravity-ca", String::as_str);
        eprintln!("Usage: {} <config.json> [ticks]", program);
        eprintln!();
        eprintln!("Run a Gravity CA simulation from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to map configuration file");
        eprintln!("  ticks        Number of full update cycles (default: 100)");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let ticks: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);

    let config = MapConfig::load(&config_path).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        std::process::exit(1);
    });

    // Load or create seed
    let seed_path = config_path.with_extension("seed.json");
    let seed = if seed_path.exists() {
        let seed_str = fs::read_to_string(&seed_path).unwrap_or_else(|e| {
            eprintln!("Error reading seed file: {}", e);
            std::process::exit(1);
        });
        Seed::from_json_str(&seed_str).unwrap_or_else(|e| {
            eprintln!("Error parsing seed: {}", e);
            std::process::exit(1);
        })
    } else {
        Seed::default()
    };

    let mut map = GravityMap::new(&config).unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });
    let seeded = seed.apply(&mut map).unwrap_or_else(|e| {
        eprintln!("Error applying seed: {}", e);
        std::process::exit(1);
    });

    println!("Gravity CA Simulation");
    println!("=====================");
    println!(
        "Grid: {}x{} = {} cells ({})",
        config.width,
        config.height,
        config.grid_size(),
        config.topology
    );
    println!("Max gravity: {}", config.max_gravity);
    println!("Max mass: {}", config.max_mass);
    println!(
        "Spawn: {} per cell per tick, {} mass each",
        config.spawn.chance,
        config.spawn_mass()
    );
    println!("Seeded cells: {}", seeded);
    println!("Ticks: {}", ticks);
    println!();

    // Paused update refreshes the aggregates without advancing.
    map.update();
    print_stats("Initial state", map.stats());
    let initial_mass = map.grid().checked_total(Field::Mass);

    map.set_running(true);
    let spawn_mass = config.spawn_mass();
    let mut spawned = 0usize;

    println!("Running simulation...");
    let start = Instant::now();

    for i in 0..ticks {
        spawned += map.scatter_mass(config.spawn.chance, spawn_mass);
        map.tick();

        // Print progress every 10%
        if (i + 1) % (ticks / 10).max(1) == 0 {
            let stats = map.stats();
            let elapsed = start.elapsed().as_secs_f32();
            println!(
                "  Tick {}/{}: mass={:.4e} in {} cells, gravity max={:.4e}, {:.1} ticks/s",
                i + 1,
                ticks,
                stats.mass.total,
                stats.mass.occupied,
                stats.gravity.max,
                (i + 1) as f32 / elapsed
            );
        }
    }

    let elapsed = start.elapsed();

    println!();
    map.set_running(false);
    map.update();
    print_stats("Final state", map.stats());
    print_exact_mass(initial_mass, map.grid().checked_total(Field::Mass));
    println!("Generation: {}", map.generation());
    println!("Spawned cells: {}", spawned);
    println!(
        "Time: {:.2}s ({:.1} ticks/s)",
        elapsed.as_secs_f32(),
        ticks as f32 / elapsed.as_secs_f32()
    );
}

fn print_stats(label: &str, stats: &SimulationStats) {
    println!("{}:", label);
    println!(
        "  Mass: total {:.6e}, range [{:.6e}, {:.6e}], {} cells",
        stats.mass.total, stats.mass.min, stats.mass.max, stats.mass.occupied
    );
    println!(
        "  Gravity: total {:.6e}, range [{:.6e}, {:.6e}], {} cells",
        stats.gravity.total, stats.gravity.min, stats.gravity.max, stats.gravity.occupied
    );
    println!();
}

/// Exact `u128` mass totals; `None` means the sum overflowed.
fn print_exact_mass(initial: Option<u128>, last: Option<u128>) {
    match (initial, last) {
        (Some(initial), Some(last)) => println!("Exact mass: {} -> {}", initial, last),
        _ => println!("Exact mass: exceeds u128"),
    }
}

fn print_example_config() {
    let config = MapConfig::default();
    let seed = Seed::default();

    println!("Example configuration (config.json):");
    println!("{}", serde_json::to_string_pretty(&config).unwrap());
    println!();
    println!("Example seed (config.seed.json):");
    println!("{}", serde_json::to_string_pretty(&seed).unwrap());
}
