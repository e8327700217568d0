//! Basic example of feeding turbine telemetry through the mock host

use chrono::{Duration, Utc};
use twinwatch_models::sim::{TelemetryGenerator, TelemetryProfile};
use twinwatch_models::{DeviceTelemetry, WindTurbineProcessor, WindTurbineTwin};
use twinwatch_mock::MockEnvironmentBuilder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let env = MockEnvironmentBuilder::new()
        .with_model::<WindTurbineTwin, DeviceTelemetry, _>(WindTurbineProcessor::default())
        .build();

    println!("=== TwinWatch Turbine Example ===\n");

    let mut gen = TelemetryGenerator::from_seed(7);
    let start = Utc::now();

    // A day of normal operation, spread over the trailing 24 hours.
    println!("Sending normal telemetry...");
    for _ in 0..48 {
        let msg = gen.device_message(TelemetryProfile::Normal, Duration::hours(24), start);
        env.send_at("windturbine", "turbine_1", &serde_json::to_vec(&msg)?, start)
            .await?;
    }

    // A sustained overheat: hot readings 15 seconds apart.
    println!("Sending a sustained overheat...");
    for i in 0..3 {
        let now = start + Duration::seconds(15 * i);
        let msg = gen.device_message(TelemetryProfile::HighTemperature, Duration::zero(), now);
        env.send_at("windturbine", "turbine_1", &serde_json::to_vec(&msg)?, now)
            .await?;
    }

    let twin: WindTurbineTwin = env
        .instance_state("windturbine", "turbine_1")?
        .expect("instance exists");

    println!("\nTwin state:");
    println!("  Last temperature: {:.1} C", twin.last_temperature);
    println!("  Last RPM: {:.1}", twin.last_rpm);
    println!("  Avg messages/hour: {:.2}", twin.avg_messages_per_hour);
    println!("  Avg RPM/hour: {:.2}", twin.avg_rpm_per_hour);
    println!("  Avg temperature/hour: {:.2}", twin.avg_temperature_per_hour);

    println!("\nIncidents:");
    for incident in &twin.incidents {
        println!(
            "  [{}] {:?} {:?} at {:.1}",
            incident.timestamp, incident.kind, incident.phase, incident.metric_value
        );
    }

    let alerts = env.received("windturbine", "turbine_1");
    println!("\nAlerts delivered to the data source: {}", alerts.len());
    for alert in &alerts {
        println!("  {}", String::from_utf8_lossy(alert));
    }

    Ok(())
}
