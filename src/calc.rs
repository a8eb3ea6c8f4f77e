use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-component maxima for a MARKS subject. The annual column on the
/// statement is the written paper plus the internal assessment.
pub const UNIT1_MAX: f64 = 25.0;
pub const UNIT2_MAX: f64 = 25.0;
pub const TERM_MAX: f64 = 50.0;
pub const ANNUAL_MAX: f64 = 80.0;
pub const INTERNAL_MAX: f64 = 20.0;

/// Statement columns: each subject is out of 100, pass mark 35.
pub const SUBJECT_MAX: f64 = 100.0;
pub const SUBJECT_MIN: f64 = 35.0;

/// Pass threshold on the overall percentage.
pub const PASS_PERCENT: f64 = 35.0;

/// Grades a teacher may enter for a GRADE subject (EVS / PE).
/// AA marks an absent candidate, E exempted, H handicapped.
pub const GRADE_CODES: [&str; 7] = ["A", "B", "C", "D", "E", "H", "AA"];

/// Half-up integer rounding as the report template rounds:
/// `(x + 0.5).floor()`. Marks are never negative.
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Round to two decimals, half-up. Used for percentage display.
pub fn round_2dp(x: f64) -> f64 {
    (100.0 * x + 0.5).floor() / 100.0
}

/// Raw component scores for one subject. Absent fields were simply never
/// entered; the backend stores them as null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectMarks {
    pub unit1: Option<f64>,
    pub unit2: Option<f64>,
    pub term: Option<f64>,
    pub annual: Option<f64>,
    pub internal: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsError {
    pub field: &'static str,
    pub value: f64,
    pub max: f64,
}

impl fmt::Display for BoundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} must be between 0 and {}, got {}",
            self.field, self.max, self.value
        )
    }
}

impl SubjectMarks {
    /// Check every present field against its fixed maximum.
    pub fn validate(&self) -> Result<(), BoundsError> {
        let checks: [(&'static str, Option<f64>, f64); 5] = [
            ("unit1", self.unit1, UNIT1_MAX),
            ("unit2", self.unit2, UNIT2_MAX),
            ("term", self.term, TERM_MAX),
            ("annual", self.annual, ANNUAL_MAX),
            ("internal", self.internal, INTERNAL_MAX),
        ];
        for (field, value, max) in checks {
            if let Some(v) = value {
                if !(0.0..=max).contains(&v) {
                    return Err(BoundsError {
                        field,
                        value: v,
                        max,
                    });
                }
            }
        }
        Ok(())
    }

    /// Annual column = written annual + internal. Blank when neither part
    /// was entered.
    pub fn annual_total(&self) -> Option<f64> {
        if self.annual.is_none() && self.internal.is_none() {
            return None;
        }
        Some(self.annual.unwrap_or(0.0) + self.internal.unwrap_or(0.0))
    }
}

/// One subject line of a consolidated result, as served by the backend.
/// `avg` is computed server-side; this crate only displays and rounds it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectResult {
    pub code: String,
    #[serde(default)]
    pub mark: Option<SubjectMarks>,
    #[serde(default)]
    pub avg: Option<f64>,
    #[serde(default)]
    pub grace: Option<f64>,
    #[serde(rename = "final", default)]
    pub final_mark: Option<f64>,
    #[serde(default)]
    pub grade: Option<String>,
}

/// A student's consolidated result row. Fetched read-only per view and
/// never persisted here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentResult {
    pub roll_no: String,
    pub name: String,
    #[serde(default)]
    pub division: String,
    #[serde(default)]
    pub subjects: Vec<SubjectResult>,
    #[serde(default)]
    pub final_total: Option<f64>,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub overall_grade: Option<String>,
    /// Letter grade for the percentage. Derived on fetch when the backend
    /// leaves it out, so views never recompute the band table.
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub total_grace: Option<f64>,
}

/// Letter grade for an overall percentage. Boundaries take the higher
/// grade: exactly 75 is A+, exactly 35 is C.
pub fn grade_for_percentage(p: f64) -> &'static str {
    if p >= 75.0 {
        "A+"
    } else if p >= 60.0 {
        "A"
    } else if p >= 50.0 {
        "B"
    } else if p >= 35.0 {
        "C"
    } else {
        "F"
    }
}

pub fn is_pass(percentage: f64) -> bool {
    percentage >= PASS_PERCENT
}

/// Rounded average for display. A zero average renders blank, so a
/// legitimately earned zero is indistinguishable from "no data" here.
/// Long-standing template behaviour; kept as-is.
pub fn display_average(avg: Option<f64>) -> Option<i64> {
    let rounded = round_half_up(avg?) as i64;
    if rounded > 0 {
        Some(rounded)
    } else {
        None
    }
}

/// Grace is shown only when something was actually granted.
pub fn display_grace(grace: Option<f64>) -> Option<f64> {
    match grace {
        Some(g) if g > 0.0 => Some(g),
        _ => None,
    }
}

/// Maximum obtainable total across the numeric subjects.
pub fn total_max(numeric_subject_count: usize) -> i64 {
    (numeric_subject_count as i64) * (SUBJECT_MAX as i64)
}

/// Presentation rollup: sum of subject averages plus total grace, rounded
/// once for display. Never written back.
pub fn total_obtained(numeric_subjects: &[SubjectResult], total_grace: Option<f64>) -> i64 {
    let sum: f64 = numeric_subjects
        .iter()
        .map(|s| s.avg.unwrap_or(0.0))
        .sum::<f64>()
        + total_grace.unwrap_or(0.0);
    round_half_up(sum) as i64
}

/// Overall percentage for a grace-adjusted total over `n` 100-mark
/// subjects.
pub fn percentage(final_total: f64, numeric_subject_count: usize) -> f64 {
    if numeric_subject_count == 0 {
        return 0.0;
    }
    round_2dp(100.0 * final_total / total_max(numeric_subject_count) as f64)
}

pub fn is_valid_grade_code(grade: &str) -> bool {
    GRADE_CODES.iter().any(|g| g.eq_ignore_ascii_case(grade))
}
