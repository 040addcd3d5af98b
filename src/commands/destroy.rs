//! `gantry destroy` - tear down one instance

use anyhow::Result;
use colored::Colorize;
use provision::{DestroyOutcome, Engine, InstanceStore, paths};

use super::confirm_proceed;
use crate::cli::DestroyArgs;

pub fn run(args: &DestroyArgs) -> Result<()> {
    let mut store = InstanceStore::open(paths::state_file())?;

    println!();
    if !store.exists(&args.address) {
        println!(
            "  {} {} skipped (no instance recorded)",
            "⊘".yellow(),
            args.address
        );
        return Ok(());
    }

    let provider = store.find(&args.address)?.provider.clone();
    println!(
        "  {} destroy {} ({})",
        "→".cyan(),
        args.address.bold(),
        provider.dimmed()
    );

    if !args.yes && !confirm_proceed()? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(());
    }

    let engine = Engine::docker();
    match engine.destroy(&args.address, &mut store)? {
        DestroyOutcome::Removed => {
            println!("  {} {} destroyed", "✓".green(), args.address);
        }
        DestroyOutcome::Skipped { reason } => {
            println!("  {} {} skipped ({reason})", "⊘".yellow(), args.address);
        }
    }
    Ok(())
}
