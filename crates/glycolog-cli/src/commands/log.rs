use std::io::{BufRead, Write};

use clap::Subcommand;
use glycolog_core::{GlycemiaLog, Reading, ReadingTime, ReadingValue};

use super::store_client;

#[derive(Subcommand)]
pub enum LogAction {
    /// List readings from the store
    List {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Record a reading (mg/dL, a decimal comma is accepted)
    Add {
        value: String,
        /// Free-text note
        #[arg(short, long, default_value = "")]
        note: String,
    },
    /// Delete a reading
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn run(action: LogAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut log = GlycemiaLog::new(store_client()?);

    match action {
        LogAction::List { json } => {
            log.refresh().await?;
            if log.skipped() > 0 {
                eprintln!("warning: {} listing item(s) without an id were skipped", log.skipped());
            }
            let readings = log.readings();
            if json {
                println!("{}", serde_json::to_string_pretty(readings)?);
            } else if readings.is_empty() {
                println!("no readings");
            } else {
                for r in readings {
                    println!("{}", format_reading(r));
                }
            }
        }
        LogAction::Add { value, note } => {
            let receipt = log.submit(&value, &note).await?;
            println!("recorded {} mg/dL", receipt.value);
            if let Some(err) = receipt.refresh_error {
                eprintln!("warning: could not reload readings: {err}");
            }
        }
        LogAction::Delete { id, yes } => {
            log.refresh().await?;
            let pending = log.propose_delete(&id)?;
            if yes || confirm(&format!("Delete reading {id}?"))? {
                log.confirm_delete(pending).await?;
                println!("deleted {id}");
            } else {
                pending.cancel();
                println!("cancelled");
            }
        }
    }
    Ok(())
}

fn format_reading(r: &Reading) -> String {
    let date = match &r.timestamp {
        ReadingTime::Valid { at } => at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        ReadingTime::Invalid { .. } => "invalid date".to_string(),
    };
    let (value, severity) = match (&r.value, r.severity()) {
        (ReadingValue::Valid { mg_dl }, Some(severity)) => (mg_dl.to_string(), severity.as_str()),
        _ => ("?".to_string(), "-"),
    };
    let mut line = format!("{:<24} {:>6} mg/dL  {:<6}  {}", r.id, value, severity, date);
    if let Some(note) = &r.note {
        line.push_str("  ");
        line.push_str(note);
    }
    line
}

fn confirm(prompt: &str) -> std::io::Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_dates_are_labelled() {
        let r = Reading {
            id: "r1".into(),
            value: ReadingValue::Valid { mg_dl: 65.0 },
            note: Some("avant sport".into()),
            timestamp: ReadingTime::Invalid { raw: "??".into() },
        };
        let line = format_reading(&r);
        assert!(line.contains("invalid date"));
        assert!(line.contains("low"));
        assert!(line.ends_with("avant sport"));
    }

    #[test]
    fn unreadable_values_are_marked() {
        let r = Reading {
            id: "r2".into(),
            value: ReadingValue::Invalid {
                raw: "beaucoup".into(),
            },
            note: None,
            timestamp: ReadingTime::Invalid { raw: String::new() },
        };
        let line = format_reading(&r);
        assert!(line.contains("     ? mg/dL  -"));
    }
}
