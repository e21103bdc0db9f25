//! Demonstration of the heart rate sync controller.
//!
//! This example shows how to:
//! 1. Create an in-memory health store
//! 2. Start the controller (permission check and initial load)
//! 3. Save readings through the form intents
//! 4. Filter the loaded history
//!
//! Run with: cargo run --example sync_demo

use std::sync::Arc;

use synheart_heart_rate::{
    audit::create_shared_log, record::DISPLAY_FORMAT, InMemoryStore, RecordSyncController,
    ZoneSource,
};

#[tokio::main]
async fn main() {
    println!("Synheart Heart Rate - Sync Demo");
    println!("===============================");
    println!();

    let store = Arc::new(InMemoryStore::new());
    let access_log = create_shared_log();
    let controller = RecordSyncController::new(store)
        .with_zone(ZoneSource::System)
        .with_access_log(access_log.clone());

    if let Err(e) = controller.start().await {
        eprintln!("Error starting: {}", e.user_message());
        return;
    }

    let yesterday = chrono::Local::now() - chrono::Duration::days(1);
    let readings = [
        ("64", yesterday.format(DISPLAY_FORMAT).to_string()),
        ("90", String::new()),
        ("190", String::new()),
        ("abc", String::new()),
    ];

    for (bpm, at) in readings {
        controller.set_bpm_input(bpm);
        controller.set_timestamp_input(at);
        match controller.save_form().await {
            Ok(sample) => println!("Saved   {sample}"),
            Err(e) => println!("Refused {bpm:?}: {}", e.user_message()),
        }
    }

    println!();
    println!("All readings:");
    for sample in controller.snapshot().filtered_records {
        println!("  {sample}");
    }

    println!();
    println!("Filter \"90\":");
    for sample in controller.filter("90") {
        println!("  {sample}");
    }

    println!();
    println!("{}", access_log.summary());
}
