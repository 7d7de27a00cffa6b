//! Simple consumer example for a legacy broker

use kafka_legacy_client::*;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    println!("Legacy Kafka client - Simple Consumer Example");
    println!("=============================================");

    let consumer = ConsumerBuilder::new()
        .brokers(vec!["localhost:9092"])
        .topic("legacy-topic")
        .max_fetch_bytes(1024 * 1024)
        .poll_interval(Duration::from_millis(500))
        .build()
        .await?;

    // Start from the oldest offset the broker still holds
    let earliest = consumer.get_offsets(EARLIEST_TIME, 1).await?;
    let latest = consumer.get_offsets(LATEST_TIME, 1).await?;
    println!("Earliest offsets: {:?}, latest: {:?}", earliest, latest);
    if let Some(offset) = earliest.first() {
        consumer.seek(*offset);
    }

    // Example 1: poll-based consumption
    println!("\nExample 1: Poll-based consumption (5 polls)");
    for i in 0..5 {
        let records = consumer.poll().await?;
        if records.is_empty() {
            println!("   Poll {}: No messages available", i + 1);
            tokio::time::sleep(Duration::from_millis(500)).await;
            continue;
        }
        println!("   Poll {}: Received {} messages", i + 1, records.len());
        for record in &records {
            println!(
                "      offset={} value='{}'",
                record.offset,
                String::from_utf8_lossy(record.payload())
            );
        }
    }

    // Example 2: channel-based consumption for 30 seconds
    println!("\nExample 2: Channel-based consumption (30 seconds)");
    let (tx, mut rx) = mpsc::channel::<ConsumeRecord>(256);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let printer = tokio::spawn(async move {
        let mut count = 0;
        while let Some(record) = rx.recv().await {
            count += 1;
            println!(
                "   [{}] offset={} value='{}'",
                count,
                record.offset,
                String::from_utf8_lossy(record.payload())
            );
        }
        count
    });

    let stopper = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        let _ = shutdown_tx.send(());
    });

    consumer.consume_on_channel(tx, shutdown_rx).await?;
    let _ = stopper.await;
    let count = printer.await.unwrap_or(0);

    println!("\nConsumed {} messages, next offset {}", count, consumer.offset());
    consumer.close().await
}
