use chain_map::HashMap;
use clap::Parser;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "initial_capacity", default_value_t = 8)]
    initial_capacity: usize,

    #[arg(short = 'n', long = "count", default_value_t = 1000)]
    count: u64,

    /// Fraction of the inserted keys to delete afterwards.
    #[arg(short = 'd', long = "delete_fraction", default_value_t = 0.9)]
    delete_fraction: f64,
}

fn report(map: &HashMap<u64, u64>) {
    println!(
        "Load factor: {:.2}% ({} pairs in {} buckets)",
        map.load_factor() * 100.0,
        map.len(),
        map.capacity()
    );
    println!("Chain length histogram:");
    for (length, buckets) in map.chain_histogram().iter().enumerate() {
        if *buckets > 0 {
            println!("  {length:>3}: {buckets}");
        }
    }
    map.debug_stats().print();
}

fn main() -> Result<(), chain_map::Error> {
    env_logger::init();
    let args = Args::parse();

    println!("Creating HashMap with capacity: {}", args.initial_capacity);
    let mut map: HashMap<u64, u64> = HashMap::with_capacity(args.initial_capacity)?;

    println!("Inserting {} u64 keys...", args.count);
    let mut resizes = 0;
    for key in 0..args.count {
        let before = map.capacity();
        map.set(key, key * 2);
        if map.capacity() != before {
            resizes += 1;
        }
    }
    println!("Grew {resizes} times");
    report(&map);

    let doomed = (args.count as f64 * args.delete_fraction.clamp(0.0, 1.0)) as u64;
    println!("Deleting {doomed} keys...");
    resizes = 0;
    for key in 0..doomed {
        let before = map.capacity();
        map.delete(&key)?;
        if map.capacity() != before {
            resizes += 1;
        }
    }
    println!("Shrank {resizes} times");
    report(&map);

    Ok(())
}
