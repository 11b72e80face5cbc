use anyhow::Context;

use clubrisk_terminal::club::ClubRecord;
use clubrisk_terminal::config::AppConfig;
use clubrisk_terminal::directory::ClubDirectory;

/// One-shot query against the configured source.
///
///   risk_query                      list every club the source knows
///   risk_query Arsenal "Aston Villa" one assessment for the given clubs
fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let source = config.build_source();
    let names: Vec<String> = std::env::args().skip(1).collect();

    if names.is_empty() {
        let directory = ClubDirectory::load(source.as_ref())?;
        println!("{} clubs from {}", directory.len(), source.label());
        for name in directory.names() {
            println!("  {name}");
        }
        return Ok(());
    }

    let records = source
        .assess(&names)
        .with_context(|| format!("risk assessment via {}", source.label()))?;
    for name in &names {
        if !records.iter().any(|r| &r.name == name) {
            println!("{name}: no data");
        }
    }
    for record in &records {
        print_record(record);
    }
    Ok(())
}

fn print_record(record: &ClubRecord) {
    let score = record
        .score
        .map(|s| format!("{s:.1}"))
        .unwrap_or_else(|| "-".to_string());
    println!("{}: {} ({})", record.name, score, record.category().label());
    for (label, value) in record.key_figures() {
        println!("  {label}: {value}");
    }
    for strategy in &record.strategies {
        println!("  - {strategy}");
    }
}
