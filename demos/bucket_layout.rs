use bucket_hash::ChainedTable;
use bucket_hash::DirectTable;
use bucket_hash::ProbeStrategy;
use bucket_hash::ProbingTable;
use bucket_hash::SlotState;
use bucket_hash::TableConfig;
use bucket_hash::TableError;
use clap::Parser;
use clap::ValueEnum;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Kind {
    Chained,
    Linear,
    Quadratic,
    Double,
    Direct,
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 't', long = "table", value_enum, default_value_t = Kind::Chained)]
    kind: Kind,

    #[arg(short = 'n', long = "keys", default_value_t = 12)]
    keys: usize,

    /// Keys removed again after inserting, to show tombstones.
    #[arg(short = 'r', long = "remove", default_value_t = 0)]
    remove: usize,

    #[arg(short = 'c', long = "capacity", default_value_t = 16)]
    capacity: usize,

    #[arg(short = 's', long = "seed", default_value_t = 7)]
    seed: u64,
}

fn main() -> Result<(), TableError> {
    let args = Args::parse();

    let mut rng = SmallRng::seed_from_u64(args.seed);
    let upper = (args.keys as u64).max(1) * 8;
    let mut keys: Vec<u64> = Vec::with_capacity(args.keys);
    while keys.len() < args.keys {
        let key = rng.random_range(0..upper);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    let removed = &keys[..args.remove.min(keys.len())];

    println!(
        "Inserting {} keys into a {:?} table with {} initial slots",
        keys.len(),
        args.kind,
        args.capacity
    );

    match args.kind {
        Kind::Chained => {
            let config = TableConfig::chained().with_initial_capacity(args.capacity);
            let mut table = ChainedTable::with_config(config)?;
            for &key in &keys {
                table.set(key, ())?;
            }
            for key in removed {
                table.remove(key)?;
            }

            for index in 0..table.capacity() {
                let chain: Vec<String> = table
                    .bucket(index)
                    .into_iter()
                    .flatten()
                    .map(|(key, _)| key.to_string())
                    .collect();
                println!("[{index:>4}] {}", chain.join(" -> "));
            }
            table.stats().print();
        }
        Kind::Linear | Kind::Quadratic | Kind::Double => {
            let strategy = match args.kind {
                Kind::Linear => ProbeStrategy::Linear,
                Kind::Quadratic => ProbeStrategy::Quadratic,
                _ => ProbeStrategy::DoubleHashing,
            };
            let config = TableConfig::probing().with_initial_capacity(args.capacity);
            let mut table = ProbingTable::with_config(config, strategy)?;
            for &key in &keys {
                table.set(key, ())?;
            }
            for key in removed {
                table.remove(key)?;
            }

            let mut occupants = vec![None; table.capacity()];
            for &key in table.keys() {
                if let Some(slot) = table.slot_of(&key)? {
                    occupants[slot] = Some(key);
                }
            }
            for (index, occupant) in occupants.iter().enumerate() {
                match (table.slot_state(index), occupant) {
                    (Some(SlotState::Occupied), Some(key)) => {
                        let home = table.bucket_index_for(key)?;
                        if home == index {
                            println!("[{index:>4}] {key}");
                        } else {
                            println!("[{index:>4}] {key} (home {home})");
                        }
                    }
                    (Some(SlotState::Tombstone), _) => println!("[{index:>4}] <deleted>"),
                    _ => println!("[{index:>4}]"),
                }
            }
            table.stats().print();
        }
        Kind::Direct => {
            let config = TableConfig::direct().with_initial_capacity(args.capacity);
            let mut table = DirectTable::with_config(config)?;
            let mut collisions = 0;
            for &key in &keys {
                match table.set(key, ()) {
                    Ok(_) => {}
                    Err(TableError::HashCollision { index }) => {
                        println!("key {key} collides in slot {index}");
                        collisions += 1;
                    }
                    Err(error) => return Err(error),
                }
            }
            for key in removed {
                table.remove(key)?;
            }

            for index in 0..table.capacity() {
                match table.slot(index) {
                    Some((key, _)) => println!("[{index:>4}] {key}"),
                    None => println!("[{index:>4}]"),
                }
            }
            table.stats().print();
            println!("Rejected keys: {collisions}");
        }
    }

    Ok(())
}
