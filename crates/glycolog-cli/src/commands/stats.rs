use glycolog_core::{daily_averages, GlycemiaLog, Summary};
use serde_json::json;

use super::store_client;

pub async fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut log = GlycemiaLog::new(store_client()?);
    let readings = log.refresh().await?;
    let summary = Summary::from_readings(readings);
    let days = daily_averages(readings);

    if json {
        let out = json!({ "summary": summary, "daily": days });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("readings: {}", summary.count);
    if summary.unreadable > 0 {
        println!("unreadable values: {}", summary.unreadable);
    }
    if let (Some(avg), Some(min), Some(max)) = (summary.average, summary.min, summary.max) {
        println!("average:  {avg:.1} mg/dL (min {min}, max {max})");
    }
    if let Some(pct) = summary.in_range_pct {
        println!(
            "in range: {pct:.0}% (low {}, normal {}, high {})",
            summary.low, summary.normal, summary.high
        );
    }
    for day in days {
        println!("  {}  {:>6.1} mg/dL  ({} readings)", day.day, day.average, day.count);
    }
    Ok(())
}
