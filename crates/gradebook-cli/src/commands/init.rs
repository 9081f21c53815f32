//! The `gradebook init` command.

use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;

use gradebook_core::exchange::{save_records, EvaluationRecord};
use gradebook_core::Evaluation;

const SAMPLE_PATH: &str = "data/sample-evaluations.json";

pub fn execute() -> Result<()> {
    if Path::new("gradebook.toml").exists() {
        println!("gradebook.toml already exists, skipping.");
    } else {
        std::fs::write("gradebook.toml", SAMPLE_CONFIG)?;
        println!("Created gradebook.toml");
    }

    let sample_path = Path::new(SAMPLE_PATH);
    if sample_path.exists() {
        println!("{SAMPLE_PATH} already exists, skipping.");
    } else {
        let records: Vec<EvaluationRecord> =
            sample_evaluations()?.iter().map(EvaluationRecord::from).collect();
        save_records(sample_path, &records)?;
        println!("Created {SAMPLE_PATH}");
    }

    println!("\nNext steps:");
    println!("  1. Edit gradebook.toml to choose the database location");
    println!("  2. Run: gradebook import --file {SAMPLE_PATH}");
    println!("  3. Run: gradebook list");

    Ok(())
}

fn sample_evaluations() -> Result<Vec<Evaluation>> {
    let date = |month, day| {
        NaiveDate::from_ymd_opt(2025, month, day)
            .ok_or_else(|| anyhow::anyhow!("invalid sample date 2025-{month}-{day}"))
    };

    Ok(vec![
        Evaluation::exam("Matematicas Basicas", date(6, 15)?, 85.5, 60, 20)?,
        Evaluation::assignment(
            "Ensayo Literatura",
            date(6, 20)?,
            92.0,
            10,
            "La importancia del realismo mágico",
        )?,
        Evaluation::presentation("Proyecto Final", date(6, 25)?, 78.0, 30, 50)?,
        Evaluation::exam("Contabilidad Avanzada", date(7, 1)?, 95.0, 90, 30)?,
    ])
}

const SAMPLE_CONFIG: &str = r#"# gradebook configuration

# SQLite database file. ${VAR} references are expanded.
# GRADEBOOK_DATABASE and --database override this.
database = "./gradebook.db"

# Where `gradebook report` writes HTML files.
report_dir = "./gradebook-reports"
"#;
