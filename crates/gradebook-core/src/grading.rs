//! Grading policy: one formula per evaluation kind.
//!
//! Grades are derived, never stored. The exam formula divides by the
//! duration in hours, which construction guarantees is at least 15 minutes.

use crate::model::{Evaluation, EvaluationDetails};

/// Compute the grade for a set of kind-specific details and a base score.
pub fn grade_for(base_score: f64, details: &EvaluationDetails) -> f64 {
    match details {
        EvaluationDetails::Exam {
            duration_minutes,
            num_questions,
        } => {
            let hours = f64::from(*duration_minutes) / 60.0;
            (base_score * f64::from(*num_questions) / 100.0) / hours
        }
        EvaluationDetails::Assignment { page_count, .. } => {
            base_score * (1.0 + f64::from(*page_count) / 100.0)
        }
        EvaluationDetails::Presentation { audience_size, .. } => {
            base_score * (1.0 + f64::from(*audience_size) / 200.0)
        }
    }
}

impl Evaluation {
    /// The derived grade for this evaluation.
    pub fn compute_grade(&self) -> f64 {
        grade_for(self.base_score(), self.details())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn exam_grade() {
        let exam = Evaluation::exam("M1", date(), 85.5, 60, 20).unwrap();
        let grade = exam.compute_grade();
        assert!(approx(grade, 17.1), "expected 17.1, got {grade}");
    }

    #[test]
    fn exam_grade_scales_with_duration() {
        // 90 minutes = 1.5 hours
        let exam = Evaluation::exam("Accounting", date(), 95.0, 90, 30).unwrap();
        assert!(approx(exam.compute_grade(), 95.0 * 30.0 / 100.0 / 1.5));
    }

    #[test]
    fn assignment_grade() {
        let essay = Evaluation::assignment("E1", date(), 92.0, 10, "X").unwrap();
        let grade = essay.compute_grade();
        assert!(approx(grade, 101.2), "expected 101.2, got {grade}");
    }

    #[test]
    fn presentation_grade() {
        let talk = Evaluation::presentation("Final", date(), 78.0, 30, 50).unwrap();
        assert!(approx(talk.compute_grade(), 97.5));
    }

    #[test]
    fn grade_is_deterministic() {
        let exam = Evaluation::exam("Repeat", date(), 73.25, 45, 17).unwrap();
        let first = exam.compute_grade();
        for _ in 0..10 {
            assert_eq!(exam.compute_grade().to_bits(), first.to_bits());
        }
    }

    #[test]
    fn zero_score_grades_zero() {
        let exam = Evaluation::exam("Blank", date(), 0.0, 15, 1).unwrap();
        assert_eq!(exam.compute_grade(), 0.0);
    }
}
