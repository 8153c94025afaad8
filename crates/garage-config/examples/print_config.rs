/// Example program to print the loaded configuration
///
/// Run with: cargo run -p garage-config --example print_config

fn main() {
    let config = garage_config::GarageConfig::load();

    println!("=== Garage Motion Configuration ===\n");

    println!("Motion:");
    println!("  Reduced Motion: {}", config.motion.reduced_motion);
    println!();

    println!("Counter:");
    println!("  Duration: {}s", config.counter.duration);
    println!("  Easing: {}", config.counter.easing);
    println!("  Prefix/Suffix: {:?}/{:?}", config.counter.prefix, config.counter.suffix);
    println!();

    println!("Stagger:");
    println!("  Delay: {}s", config.stagger.stagger);
    println!("  Duration: {}s", config.stagger.duration);
    println!("  Easing: {}", config.stagger.easing);
    println!();

    println!("Scroll Reveal:");
    println!("  Start: {}", config.scroll_reveal.start);
    println!("  Duration: {}s", config.scroll_reveal.duration);
    println!("  Stagger: {}s", config.scroll_reveal.stagger);
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
