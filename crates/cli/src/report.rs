//! Console rendering of batch progress.

use reelpress_core::format::format_elapsed;
use reelpress_core::{BatchProgress, ItemOutcome, RunSummary};

/// Prints one progress event to stdout.
pub fn print_event(event: &BatchProgress) {
    match event {
        BatchProgress::Started {
            total,
            plan,
            mode,
            fraction,
            input_dir,
            output_dir,
        } => {
            println!(
                "Converting {} file(s) from {} to {}",
                total,
                input_dir.display(),
                output_dir.display()
            );
            println!(
                "Mode: {} | CPU: {} of {} cores ({} threads, {} pools)",
                mode, fraction, plan.total_units, plan.workers, plan.pools
            );
        }
        BatchProgress::ItemStarted { index, total, name } => {
            println!("[{}/{}] {}...", index, total, name);
        }
        BatchProgress::ItemFinished {
            index,
            total,
            name,
            log,
            outcome,
        } => match outcome {
            ItemOutcome::Skipped => {
                println!("[{}/{}] SKIP {} (output exists)", index, total, name);
            }
            ItemOutcome::Succeeded {
                conversion,
                finalize,
            } => {
                let size = finalize
                    .size
                    .map(|s| format!(", {}", s))
                    .unwrap_or_default();
                println!(
                    "[{}/{}] OK   {} in {}{}",
                    index,
                    total,
                    name,
                    format_elapsed(conversion.elapsed()),
                    size
                );
                for warning in &finalize.warnings {
                    println!("      warning: {}", warning);
                }
            }
            ItemOutcome::Failed { conversion } => {
                println!(
                    "[{}/{}] FAIL {} after {}: {}",
                    index,
                    total,
                    name,
                    format_elapsed(conversion.elapsed()),
                    conversion.failure_reason().unwrap_or("unknown error")
                );
                println!("      log: {}", log.display());
                for line in &conversion.log_tail {
                    println!("      | {}", line);
                }
            }
        },
        BatchProgress::Finished { summary } => print_summary(summary),
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    for line in summary_lines(summary) {
        println!("{}", line);
    }
}

fn summary_lines(summary: &RunSummary) -> Vec<String> {
    let elapsed = summary
        .finished_at
        .map(|end| (end - summary.started_at).to_std().unwrap_or_default())
        .unwrap_or_default();

    let mut lines = vec![
        format!("Done in {}", format_elapsed(elapsed)),
        format!("  Discovered: {}", summary.discovered),
        format!("  Processed:  {}", summary.processed),
        format!("  Skipped:    {}", summary.skipped),
        format!("  Succeeded:  {}", summary.succeeded),
        format!("  Failed:     {}", summary.failed),
    ];
    if summary.warnings > 0 {
        lines.push(format!("  Warnings:   {}", summary.warnings));
    }
    lines.push(format!("Logs: {}", summary.log_dir.display()));
    lines
}
