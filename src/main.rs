//! End-to-end demo: run a short simulated live interview and print the
//! resulting integrity report.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use log::info;
use tokio::time::Duration;

use proctor::{
    Database, EventBus, Interview, LiveMonitor, Processor, SimulatedAnalyzer, FrameAnalyzer,
};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let db_path = std::env::temp_dir().join("proctor-demo").join("proctor.db");
    let db = Database::new(db_path)?;
    let bus = Arc::new(EventBus::new());

    let interview = Interview::new(
        "Backend engineer screen",
        "Dana Whitfield",
        "Rory Chen",
        Utc::now(),
        1,
    );
    let interview_id = interview.id.clone();
    db.insert_interview(&interview).await?;
    info!("created interview {interview_id}");

    let processor = Arc::new(Processor::new(db, Arc::clone(&bus)));
    processor.start_interview(&interview_id).await?;

    // Print live updates as the monitor accepts events.
    let mut updates = bus.subscribe(&interview_id);
    let printer = tokio::spawn(async move {
        while let Ok(update) = updates.recv().await {
            println!(
                "[live] {} (score {})",
                update.event.description, update.integrity_score
            );
        }
    });

    let analyzer: Arc<dyn FrameAnalyzer> = Arc::new(SimulatedAnalyzer::new());
    let mut monitor = LiveMonitor::new();
    monitor.start_monitoring(
        interview_id.clone(),
        Arc::clone(&processor),
        Arc::clone(&analyzer),
    )?;

    tokio::time::sleep(Duration::from_secs(30)).await;

    monitor.stop_monitoring().await?;
    processor.end_interview(&interview_id).await?;
    printer.abort();

    let report = processor.report_for(&interview_id).await?;
    println!("\n{}", serde_json::to_string_pretty(&report)?);
    println!("\n{}", report.summary);
    for recommendation in &report.recommendations {
        println!("- {recommendation}");
    }

    Ok(())
}
