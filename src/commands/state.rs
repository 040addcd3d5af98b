//! `gantry state` - inspect the instance state store

use anyhow::Result;
use colored::Colorize;
use provision::{InstanceStore, paths};

pub fn list() -> Result<()> {
    let store = InstanceStore::open(paths::state_file())?;

    println!();
    if store.is_empty() {
        println!("  {} No instances recorded", "ℹ".blue());
        return Ok(());
    }

    for (address, document) in store.iter() {
        println!(
            "  {} {} ({})",
            "•".cyan(),
            address.bold(),
            document.provider.dimmed()
        );
    }

    println!();
    println!(
        "  {} instance(s), last updated {}",
        store.len(),
        store.last_updated().format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(())
}

pub fn show(address: &str) -> Result<()> {
    let store = InstanceStore::open(paths::state_file())?;
    let document = store.find(address)?;
    println!("{}", serde_json::to_string_pretty(document)?);
    Ok(())
}
