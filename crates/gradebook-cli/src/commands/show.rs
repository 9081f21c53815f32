//! The `gradebook show` command.

use anyhow::{Context, Result};

use gradebook_core::EvaluationDetails;

use super::{Session, StoreArgs};

pub fn execute(store: &StoreArgs, name: String) -> Result<()> {
    let session = Session::open(store)?;
    let evaluation = session
        .repo
        .find_by_name(&name)
        .with_context(|| format!("evaluation '{name}' not found"))?;

    println!("Name:       {}", evaluation.name());
    println!("Kind:       {}", evaluation.kind());
    println!("Date:       {}", evaluation.date());
    println!("Base score: {:.1}", evaluation.base_score());
    match evaluation.details() {
        EvaluationDetails::Exam {
            duration_minutes,
            num_questions,
        } => {
            println!("Duration:   {duration_minutes} min");
            println!("Questions:  {num_questions}");
        }
        EvaluationDetails::Assignment { page_count, topic } => {
            println!("Pages:      {page_count}");
            println!("Topic:      {topic}");
        }
        EvaluationDetails::Presentation {
            duration_minutes,
            audience_size,
        } => {
            println!("Duration:   {duration_minutes} min");
            println!("Audience:   {audience_size}");
        }
    }
    println!("Grade:      {:.1}", evaluation.compute_grade());
    Ok(())
}
