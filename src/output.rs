use crate::models::{BatchResults, Statistics};
use crate::store::PromptVersion;
use crate::tracker::{QualityReport, QualityStatus, ScoreAck};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Print a value as pretty JSON
fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing results to JSON: {}", e),
    }
}

/// Print batch results in the specified format
pub fn print_batch(results: &BatchResults, format: OutputFormat) {
    match format {
        OutputFormat::Plain => print_batch_plain(results),
        OutputFormat::Json => print_json(results),
    }
}

fn print_batch_plain(batch: &BatchResults) {
    println!("=== Evaluation ({:?}) ===", batch.status);
    println!();

    println!("📊 STATISTICS");
    println!("-------------");
    print_statistics_plain(&batch.statistics);
    println!();

    println!("📝 DETAILED RESULTS");
    println!("-------------------");
    for (i, result) in batch.results.iter().enumerate() {
        println!("Result #{}: {}", i + 1, result.scenario_name);
        println!("User: {}", result.user_message);
        match &result.error {
            Some(error) => println!("Response: <none> ({})", error),
            None => println!("Response: {}", result.response_text),
        }
        println!("Semantic Scores:");
        let d = &result.dimensions;
        println!("  • consistency: {:.3}", d.consistency.semantic);
        println!("  • engagement: {:.3}", d.engagement.semantic);
        println!("  • brand_alignment: {:.3}", d.brand_alignment.semantic);
        println!("  • authenticity: {:.3}", d.authenticity.semantic);
        println!(
            "Rubric: consistency {:.0}, engagement {:.0}, brand {:.0}, authenticity {:.0}",
            result.rules.consistency,
            result.rules.engagement,
            result.rules.brand_alignment,
            result.rules.authenticity
        );
        println!(
            "Cumulative: {:.3}  Sentiment: {:+.3}  Overall: {:.2}",
            result.cumulative_semantic, result.sentiment, result.overall
        );
        println!();
    }
}

/// Print statistics in plain text format
fn print_statistics_plain(stats: &Statistics) {
    let mut metrics: Vec<_> = stats.mean.keys().collect();
    metrics.sort();

    if metrics.is_empty() {
        println!("No statistics available.");
        return;
    }

    println!(
        "{:<16} {:<8} {:<8} {:<8}",
        "Metric", "Mean", "Median", "Mode"
    );
    println!("{}", "-".repeat(45));

    for metric in metrics {
        let mean = stats.mean.get(metric).unwrap_or(&0.0);
        let median = stats.median.get(metric).unwrap_or(&0.0);
        let mode = stats.mode.get(metric).unwrap_or(&0.0);

        println!(
            "{:<16} {:<8.3} {:<8.3} {:<8.3}",
            metric, mean, median, mode
        );
    }
}

pub fn print_quality(report: &QualityReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Plain => {
            println!("Prompt: {}", report.prompt_id);
            match (report.status, report.average, report.degraded) {
                (QualityStatus::Ok, Some(average), Some(degraded)) => {
                    let verdict = if degraded { "Quality Degraded" } else { "OK" };
                    println!(
                        "Average: {:.2} | Threshold: {:.2} | {}",
                        average, report.threshold, verdict
                    );
                }
                _ => println!(
                    "Insufficient data ({} scores) | Threshold: {:.2}",
                    report.scores.len(),
                    report.threshold
                ),
            }
            println!("Scores: {:?}", report.scores);
        }
    }
}

pub fn print_ack(ack: &ScoreAck, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(ack),
        OutputFormat::Plain => println!("Recorded for {}: {:?}", ack.prompt_id, ack.scores),
    }
}

pub fn print_history(prompt_id: &str, history: &[PromptVersion], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(history),
        OutputFormat::Plain => {
            if history.is_empty() {
                println!("No versions recorded for {}.", prompt_id);
                return;
            }
            for (i, version) in history.iter().enumerate() {
                println!(
                    "v{} [{}] {}",
                    i + 1,
                    version.timestamp.to_rfc3339(),
                    version.reason
                );
                if let Some(from) = &version.improved_from {
                    println!("  improved from: {}", from);
                }
                println!("  {}", version.prompt_text.lines().next().unwrap_or_default());
            }
        }
    }
}

pub fn print_chat(response: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "response": response })),
        OutputFormat::Plain => println!("Maya: {}", response),
    }
}
