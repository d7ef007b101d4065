//! End-of-run summaries.
//!
//! Written to stderr so stdout carries only the response JSON.

use emitter::{RelaySummary, RunSummary};
use query::QuerySummary;

pub fn print_run_summary(summary: &RunSummary) {
    eprintln!("\n=== Run Statistics ===\n");
    eprintln!("Overview");
    eprintln!("   ├─ Duration: {:.2}s", summary.duration.as_secs_f64());
    eprintln!("   ├─ Stop reason: {:?}", summary.stop_reason);
    eprintln!("   ├─ Batches: {} (failed: {})", summary.batches_sent, summary.failed_batches);
    eprintln!("   ├─ Records sent: {}", summary.records_sent);
    eprintln!("   ├─ Records acknowledged: {}", summary.records_acknowledged);
    eprintln!("   └─ Throughput: {:.1} records/s", summary.records_per_sec());
    eprintln!("\n{}", summary.send_stats);
}

pub fn print_query_summary(summary: &QuerySummary) {
    eprintln!("\n=== Query Statistics ===\n");
    eprintln!("   ├─ Duration: {:.2}s", summary.duration.as_secs_f64());
    eprintln!("   ├─ Executions: {} (failed: {})", summary.executions, summary.failures);
    match summary.last_average {
        Some(average) => eprintln!("   ├─ Last average speed: {average:.2}"),
        None => eprintln!("   ├─ Last average speed: n/a"),
    }
    eprintln!("   └─ Interrupted: {}", summary.interrupted);
    eprintln!("\n{}", summary.stats);
}

pub fn print_relay_summary(summary: &RelaySummary) {
    eprintln!("\n=== Relay Statistics ===\n");
    eprintln!(
        "   ├─ Payloads: {} (skipped: {})",
        summary.payloads, summary.payloads_skipped
    );
    eprintln!("   ├─ Documents: {}", summary.documents);
    eprintln!(
        "   ├─ Flushes: {} (failed: {})",
        summary.flushes, summary.failed_flushes
    );
    eprintln!("   └─ Inserted: {}", summary.inserted);
    eprintln!();
}
