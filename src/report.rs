use crate::calc::{self, StudentResult};
use crate::subjects;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Static text of the printable statement: header, signatories and the
/// grading key. Editable via a JSON file; defaults match the college's
/// current layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfig {
    pub school_name: String,
    pub school_address: String,
    pub report_title: String,
    pub exam_held_in: String,
    pub index_no: String,
    pub udise_no: String,
    pub logo_url: String,
    pub signatories: Vec<String>,
    pub grading_info: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            school_name: "SIES JUNIOR COLLEGE OF COMMERCE".to_string(),
            school_address: "SRI CHANDRASEKARENDRA SARASWATHI VIDYAPURAM, PLOT I-C, SECTOR V, NERUL, NAVI MUMBAI 400706".to_string(),
            report_title: "STATEMENT OF MARKS - XI STANDARD".to_string(),
            exam_held_in: "MARCH 2025".to_string(),
            index_no: "J16.15.017".to_string(),
            udise_no: "27211007406".to_string(),
            logo_url: "/images/sies.jpeg".to_string(),
            signatories: vec![
                "CLASS TEACHER".to_string(),
                "VICE PRINCIPAL".to_string(),
                "PRINCIPAL".to_string(),
            ],
            grading_info: vec![
                "GRADES OF EE: Grade A - 30 TO 50 , Grade B : 23 to 29 , Grade C : 18 to 22 , Grade D : less than equal to 17  AA :ABSENT / FEMALE".to_string(),
                "GRADES OF PE : Grade A - 60% & ABOVE, Grade B – 45% to 59%, Grade C – 35% to 44% Grade D – 34% & BELOW Grade E – EXEMPTED, Grade H - Handicapped".to_string(),
                "GRADE I WITH DISTINCTION- 75% and ABOVE, GRADE I - 60% to 74.99%, GRADE II - 45% to 59.50%, PASS CLASS - 35% to 44.99%, PROMOTED -- PASSED WITH CONDONATION".to_string(),
            ],
        }
    }
}

impl ReportConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read report config {}", path.display()))?;
        let cfg = serde_json::from_str(&raw)
            .with_context(|| format!("parse report config {}", path.display()))?;
        Ok(cfg)
    }
}

/// One numeric subject line of the statement. Component maxima are fixed
/// by the template (25/50/25/100; average out of 100, minimum 35).
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatementRow {
    pub code: String,
    pub subject: String,
    pub unit1: Option<f64>,
    pub term: Option<f64>,
    pub unit2: Option<f64>,
    pub annual_total: Option<f64>,
    pub avg: Option<i64>,
    pub grace: Option<f64>,
}

/// A graded subject renders as name plus letter only.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GradeRow {
    pub code: String,
    pub subject: String,
    pub grade: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    pub school_name: String,
    pub school_address: String,
    pub report_title: String,
    pub exam_held_in: String,
    pub index_no: String,
    pub udise_no: String,
    pub logo_url: String,
    pub roll_no: String,
    pub name: String,
    pub division: String,
    pub result_label: String,
    pub rows: Vec<StatementRow>,
    pub grade_rows: Vec<GradeRow>,
    pub total_max: i64,
    pub total_obtained: i64,
    pub percentage: Option<f64>,
    pub signatories: Vec<String>,
    pub grading_info: Vec<String>,
}

/// PASS/FAIL when the backend supplied no overall grade.
fn result_label(result: &StudentResult) -> String {
    if let Some(g) = &result.overall_grade {
        return g.clone();
    }
    match result.percentage {
        Some(p) if calc::is_pass(p) => "PASS".to_string(),
        Some(_) => "FAIL".to_string(),
        None => String::new(),
    }
}

/// Assemble the printable statement model for one student.
pub fn build_statement(config: &ReportConfig, result: &StudentResult) -> Statement {
    let (numeric, graded) = subjects::split_and_order(&result.subjects);

    let rows = numeric
        .iter()
        .map(|s| {
            let mark = s.mark.unwrap_or_default();
            StatementRow {
                code: s.code.clone(),
                subject: subjects::display_name(&s.code).to_string(),
                unit1: mark.unit1,
                term: mark.term,
                unit2: mark.unit2,
                annual_total: mark.annual_total(),
                avg: calc::display_average(s.avg),
                grace: calc::display_grace(s.grace),
            }
        })
        .collect::<Vec<_>>();

    let grade_rows = graded
        .iter()
        .map(|s| GradeRow {
            code: s.code.clone(),
            subject: subjects::display_name(&s.code).to_string(),
            grade: s.grade.clone(),
        })
        .collect::<Vec<_>>();

    Statement {
        school_name: config.school_name.clone(),
        school_address: config.school_address.clone(),
        report_title: config.report_title.clone(),
        exam_held_in: config.exam_held_in.clone(),
        index_no: config.index_no.clone(),
        udise_no: config.udise_no.clone(),
        logo_url: config.logo_url.clone(),
        roll_no: result.roll_no.clone(),
        name: result.name.clone(),
        division: result.division.clone(),
        result_label: result_label(result),
        total_max: calc::total_max(numeric.len()),
        total_obtained: calc::total_obtained(&numeric, result.total_grace),
        percentage: result.percentage,
        rows,
        grade_rows,
        signatories: config.signatories.clone(),
        grading_info: config.grading_info.clone(),
    }
}
