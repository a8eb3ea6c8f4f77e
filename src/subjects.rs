use crate::calc::SubjectResult;
use std::cmp::Ordering;

/// Display priority for numeric subjects on the statement. Codes not in
/// this list sort after every listed one, otherwise input order is kept.
pub const NUMERIC_ORDER: [&str; 11] = [
    "ENG", "HINDI", "IT", "MARATHI", "FRENCH", "GERMAN", "ECO", "BK", "OC", "SP", "MATHS",
];

/// GRADE subjects, in display order: environmental education before
/// physical education.
pub const GRADE_SUBJECTS: [&str; 2] = ["EVS", "PE"];

pub fn is_grade_subject(code: &str) -> bool {
    GRADE_SUBJECTS.contains(&code)
}

/// Human-readable subject name; unknown codes fall back to the raw code.
pub fn display_name(code: &str) -> &str {
    match code {
        "ENG" => "English",
        "HINDI" => "Hindi",
        "IT" => "Information Technology",
        "ECO" => "Economics",
        "BK" => "Book Keeping and Accountancy",
        "OC" => "Organisation of Commerce and Management",
        "SP" => "Secretarial Practice",
        "MATHS" => "Mathematics",
        "EVS" => "Environment Education & Water Security",
        "PE" => "Physical Education",
        other => other,
    }
}

fn order_rank(code: &str) -> usize {
    NUMERIC_ORDER
        .iter()
        .position(|c| *c == code)
        .unwrap_or(NUMERIC_ORDER.len())
}

/// Split a result's subjects into ordered numeric and graded lists.
pub fn split_and_order(subjects: &[SubjectResult]) -> (Vec<SubjectResult>, Vec<SubjectResult>) {
    let mut numeric: Vec<SubjectResult> = Vec::new();
    let mut graded: Vec<SubjectResult> = Vec::new();
    for s in subjects {
        if is_grade_subject(&s.code) {
            graded.push(s.clone());
        } else {
            numeric.push(s.clone());
        }
    }
    numeric.sort_by_key(|s| order_rank(&s.code));
    graded.sort_by_key(|s| {
        GRADE_SUBJECTS
            .iter()
            .position(|c| *c == s.code)
            .unwrap_or(GRADE_SUBJECTS.len())
    });
    (numeric, graded)
}

fn first_number(s: &str) -> Option<u64> {
    let digits: String = s
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Natural roll-number ordering: compare the first digit run numerically
/// when both sides have one, otherwise case-insensitively as strings.
pub fn compare_rolls(a: &str, b: &str) -> Ordering {
    match (first_number(a), first_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        _ => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::SubjectResult;

    fn subj(code: &str) -> SubjectResult {
        SubjectResult {
            code: code.to_string(),
            ..SubjectResult::default()
        }
    }

    #[test]
    fn unknown_codes_sort_last() {
        let input = vec![subj("XYZ"), subj("MATHS"), subj("ENG")];
        let (numeric, graded) = split_and_order(&input);
        let codes: Vec<&str> = numeric.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["ENG", "MATHS", "XYZ"]);
        assert!(graded.is_empty());
    }

    #[test]
    fn ordering_is_stable_for_ties() {
        let input = vec![subj("AAA"), subj("BBB"), subj("ENG")];
        let (numeric, _) = split_and_order(&input);
        let codes: Vec<&str> = numeric.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["ENG", "AAA", "BBB"]);
    }

    #[test]
    fn evs_displays_before_pe() {
        let input = vec![subj("PE"), subj("ENG"), subj("EVS")];
        let (numeric, graded) = split_and_order(&input);
        assert_eq!(numeric.len(), 1);
        let codes: Vec<&str> = graded.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["EVS", "PE"]);
    }

    #[test]
    fn display_names_fall_back_to_code() {
        assert_eq!(display_name("ENG"), "English");
        assert_eq!(display_name("OC"), "Organisation of Commerce and Management");
        assert_eq!(display_name("XYZ"), "XYZ");
    }

    #[test]
    fn roll_ordering_is_natural() {
        let mut rolls = vec!["10", "2", "1"];
        rolls.sort_by(|a, b| compare_rolls(a, b));
        assert_eq!(rolls, vec!["1", "2", "10"]);

        let mut rolls = vec!["B12", "A3"];
        rolls.sort_by(|a, b| compare_rolls(a, b));
        assert_eq!(rolls, vec!["A3", "B12"]);

        // No digits on one side: plain case-insensitive compare.
        let mut rolls = vec!["beta", "Alpha"];
        rolls.sort_by(|a, b| compare_rolls(a, b));
        assert_eq!(rolls, vec!["Alpha", "beta"]);
    }
}
