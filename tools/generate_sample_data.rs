//! Sample Data Generator
//!
//! Writes a synthetic labelled transaction CSV in the layout the training job
//! expects. Useful for demos and for smoke-testing the train/serve loop.
//!
//! Usage: generate-sample-data [OUTPUT_CSV] [COUNT] [FRAUD_RATE] [SEED]

use anyhow::{Context, Result};
use fraudshield::{
    config::AppConfig,
    logging,
    types::transaction::{Channel, DeviceType, TimeOfDay, TransactionType},
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::path::Path;
use tracing::info;

const COUNTRIES: [&str; 4] = ["India", "USA", "UK", "UAE"];

/// One CSV row: identifiers, features and label
#[derive(Debug, Serialize)]
struct LabeledTransaction {
    transaction_id: String,
    customer_id: String,
    amount: f64,
    transaction_type: TransactionType,
    channel: Channel,
    country: String,
    time_of_day: TimeOfDay,
    device_type: DeviceType,
    is_fraud: u8,
}

/// Transaction generator for sample data
struct TransactionGenerator {
    rng: StdRng,
    transaction_counter: u64,
}

impl TransactionGenerator {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            transaction_counter: 0,
        }
    }

    fn next_ids(&mut self) -> (String, String) {
        self.transaction_counter += 1;
        (
            format!("TXN{:06}", self.transaction_counter),
            format!("CUST{:04}", self.rng.gen_range(1..500)),
        )
    }

    /// Generate an everyday transaction
    fn generate_legitimate(&mut self) -> LabeledTransaction {
        let (transaction_id, customer_id) = self.next_ids();

        LabeledTransaction {
            transaction_id,
            customer_id,
            amount: (self.rng.gen_range(50.0..8000.0_f64) * 100.0).round() / 100.0,
            transaction_type: self.choose(&TransactionType::ALL),
            channel: self.choose(&Channel::ALL),
            country: self.choose(&COUNTRIES[..2]).to_string(),
            time_of_day: self.choose(&[TimeOfDay::Morning, TimeOfDay::Afternoon]),
            device_type: self.choose(&DeviceType::ALL),
            is_fraud: 0,
        }
    }

    /// Generate a suspicious transaction
    fn generate_suspicious(&mut self) -> LabeledTransaction {
        let (transaction_id, customer_id) = self.next_ids();

        LabeledTransaction {
            transaction_id,
            customer_id,
            amount: (self.rng.gen_range(20_000.0..100_000.0_f64) * 100.0).round() / 100.0, // High amount
            transaction_type: self.choose(&[TransactionType::Withdrawal, TransactionType::Transfer]),
            channel: self.choose(&[Channel::Atm, Channel::Web]),
            country: self.choose(&COUNTRIES).to_string(),
            time_of_day: TimeOfDay::Night,
            device_type: self.choose(&[DeviceType::Android, DeviceType::Windows]),
            is_fraud: 1,
        }
    }

    fn choose<T: Copy>(&mut self, choices: &[T]) -> T {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

fn main() -> Result<()> {
    let config = AppConfig::load()?;
    logging::init(&config.logging, "generate_sample_data")?;

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let output = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or(config.training.data_path.as_str());
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(500);
    let fraud_rate: f64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let seed: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(42);

    if !(0.0..=1.0).contains(&fraud_rate) {
        anyhow::bail!("fraud rate must be within [0, 1], got {}", fraud_rate);
    }

    info!(
        output = %output,
        count = count,
        fraud_rate = fraud_rate,
        seed = seed,
        "Configuration loaded"
    );

    if let Some(parent) = Path::new(output).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut writer =
        csv::Writer::from_path(output).with_context(|| format!("Failed to create {}", output))?;

    let mut generator = TransactionGenerator::new(seed);
    let mut legitimate_count = 0;
    let mut suspicious_count = 0;

    for _ in 0..count {
        let row = if generator.rng.gen_bool(fraud_rate) {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            legitimate_count += 1;
            generator.generate_legitimate()
        };
        writer.serialize(&row)?;
    }
    writer.flush()?;

    info!(
        "Completed! Wrote {} transactions ({} legitimate, {} suspicious) to {}",
        count, legitimate_count, suspicious_count, output
    );

    Ok(())
}
