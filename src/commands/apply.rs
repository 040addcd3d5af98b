//! `gantry apply` - reconcile declared instances against recorded state

use anyhow::{Result, bail};
use colored::Colorize;
use provision::{Engine, InstanceKind, InstanceStore, ReconcileResult, ReconcileSummary, paths};

use super::{confirm_proceed, render_error};
use crate::cli::ApplyArgs;
use crate::config::Manifest;

pub fn run(args: &ApplyArgs) -> Result<()> {
    let manifest = Manifest::load(&args.file)?;
    if manifest.instances.is_empty() {
        println!();
        println!("  {} Nothing declared", "ℹ".blue());
        return Ok(());
    }

    let mut store = InstanceStore::open(paths::state_file())?;

    // 1. Show the plan: create/update/read is decided by store existence
    println!();
    for instance in &manifest.instances {
        let verb = match instance.kind {
            InstanceKind::Resource => {
                if store.exists(&instance.address) {
                    "update".yellow()
                } else {
                    "create".green()
                }
            }
            InstanceKind::Data => "read".cyan(),
            InstanceKind::Artifact => "skip".dimmed(),
        };
        println!(
            "  {verb} {} ({})",
            instance.address.bold(),
            instance.provider.dimmed()
        );
    }
    println!();

    if args.dry_run {
        println!("  {} Dry run - no changes made", "ℹ".blue());
        return Ok(());
    }

    // 2. Confirm (unless --yes)
    if !args.yes && !confirm_proceed()? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(());
    }

    // 3. Reconcile sequentially, in manifest order
    println!();
    let engine = Engine::docker();
    let mut summary = ReconcileSummary::default();

    for instance in &manifest.instances {
        let result = engine.apply(instance, &mut store);
        summary.record(&result);

        match &result {
            ReconcileResult::Created => {
                println!("  {} {} created", "✓".green(), instance.address);
            }
            ReconcileResult::Updated => {
                println!("  {} {} updated", "✓".green(), instance.address);
            }
            ReconcileResult::Read => {
                println!("  {} {} read", "✓".green(), instance.address);
            }
            ReconcileResult::Skipped { reason } => {
                println!("  {} {} skipped ({reason})", "⊘".yellow(), instance.address);
            }
            ReconcileResult::Failed { error } => {
                println!(
                    "  {} {} failed: {}",
                    "✗".red(),
                    instance.address,
                    render_error(error)
                );
            }
        }
    }

    print_summary(&summary);

    if !summary.is_success() {
        bail!("{} instance(s) failed", summary.failed);
    }
    Ok(())
}

fn print_summary(summary: &ReconcileSummary) {
    println!();
    if summary.is_success() {
        println!("  {} Instances reconciled", "✓".green().bold());
    } else {
        println!("  {} Reconciled with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} created", summary.created);
    }
    if summary.updated > 0 {
        println!("    • {} updated", summary.updated);
    }
    if summary.read > 0 {
        println!("    • {} read", summary.read);
    }
    if summary.skipped > 0 {
        println!("    • {} skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {}", summary.failed, "failed".red());
    }
}
