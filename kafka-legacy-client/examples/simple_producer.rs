//! Simple producer example for a legacy broker

use kafka_legacy_client::*;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    println!("Legacy Kafka client - Simple Producer Example");
    println!("=============================================");

    let client = KafkaClient::new(
        ClientConfigBuilder::new()
            .brokers(vec!["localhost:9092"])
            .connection_timeout(Duration::from_secs(5))
            .build(),
    );

    // Example 1: one message per request
    let producer = client.producer().topic("legacy-topic").build().await?;
    println!("Connected, publishing to legacy-topic:0");

    for i in 0..5 {
        producer.publish(format!("Hello legacy Kafka! #{}", i)).await?;
        println!("   Published message {}", i);
    }
    producer.close().await?;

    // Example 2: gzip-compressed batches
    println!("\nPublishing gzip batches");
    let producer = client
        .producer()
        .topic("legacy-topic")
        .compression(CompressionType::Gzip)
        .build()
        .await?;

    for batch in 0..3 {
        let payloads: Vec<String> = (0..10)
            .map(|i| format!("batch {} message {}", batch, i))
            .collect();
        producer.publish_batch(payloads).await?;
        println!("   Published batch {} (10 messages, one envelope)", batch);
    }
    producer.close().await?;

    let metrics = metrics::global_metrics().snapshot();
    println!(
        "\nPublished {} messages in {} bytes, average latency {:.1}us",
        metrics.messages_published, metrics.bytes_published, metrics.average_publish_latency_us
    );

    Ok(())
}
