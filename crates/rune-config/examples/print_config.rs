/// Example program to print the loaded configuration
///
/// Run with: cargo run -p rune-config --example print_config

fn main() {
    let config = rune_config::RuneConfig::load();

    println!("=== Rune Configuration ===\n");

    println!("Transition Settings:");
    println!("  Initial Capacity: {}", config.transitions.initial_capacity);
    println!("  Check Invariants: {}", config.transitions.check_invariants);
    println!("  Log Events: {}", config.transitions.log_events);
    println!();

    println!("Demo Settings:");
    println!("  Frames: {}", config.demo.frames);
    println!("  Frame Interval: {} ms", config.demo.frame_interval_ms);
    println!();

    match toml::to_string_pretty(&config) {
        Ok(toml_str) => {
            println!("=== Serialized Configuration ===");
            println!("{}", toml_str);
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {}", e);
        }
    }
}
