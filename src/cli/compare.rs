use crate::cli::CommonArgs;
use crate::harness::{Comparison, StrategyHarness, Workload};
use crate::metrics::get_metrics_string;
use crate::strategy::StrategyKind;
use crate::telemetry::init_tracing;
use anyhow::{Context, Result};

pub async fn execute(args: &CommonArgs, only: Option<StrategyKind>) -> Result<()> {
    let mut config = args.load_config()?;
    init_tracing(&config.global.log_filter);

    if let Some(kind) = only {
        config.harness.strategies = vec![kind];
    }

    let workload = Workload::standard(config.harness.entries);
    let harness = StrategyHarness::new(config);
    let comparison = harness
        .compare(&workload)
        .await
        .context("Strategy run failed")?;

    print_comparison(&comparison, args.json)?;

    if args.metrics {
        println!();
        print!("{}", get_metrics_string());
    }

    Ok(())
}

fn print_comparison(comparison: &Comparison, json: bool) -> Result<()> {
    if json {
        let output = serde_json::to_string_pretty(comparison)
            .context("Failed to serialize comparison")?;
        println!("{}", output);
        return Ok(());
    }

    println!("=== Cache Strategy Comparison ===\n");
    print!("{}", comparison.render_table());

    for report in &comparison.reports {
        let verdict = match report.strategy {
            StrategyKind::CacheAside if report.stale_reads > 0 => {
                "⚠️ served stale data after updates"
            }
            StrategyKind::WriteBehind if report.store_consistent => {
                "✅ fast writes, store caught up after drain"
            }
            _ if report.stale_reads == 0 && report.store_consistent => {
                "✅ cache and store consistent"
            }
            _ => "⚠️ inconsistent",
        };
        println!("{:<14} {}", report.strategy.as_str(), verdict);
    }

    Ok(())
}
