//! Fuzzy matching of recognized text against the expected certificate
//! fields.
//!
//! Token-overlap matching tolerates OCR noise (character substitutions,
//! dropped punctuation) far better than exact string comparison, at the cost
//! of false positives on partial overlap. That bias toward recall is
//! deliberate: matching is an auxiliary signal, not the sole gate.

use tracing::debug;

use crate::config::VerificationConfig;
use crate::types::{CheckResult, ExpectedFields, MatchDetail};

/// Number of independent sub-matches, each worth an equal share.
const SUB_CHECKS: usize = 5;

/// Check five independent sub-matches of the expected fields against the
/// normalized OCR text. Each miss appends a human-readable difference.
pub fn match_fields(
    extracted_text: &str,
    expected: &ExpectedFields,
    config: &VerificationConfig,
) -> CheckResult<MatchDetail> {
    let text = normalize(extracted_text);
    let mut differences = Vec::new();
    let mut matched = 0usize;

    // 1. Certificate ID: exact case-insensitive substring.
    if text.contains(&expected.certificate_id.to_lowercase()) {
        matched += 1;
    } else {
        differences.push(format!(
            "Certificate ID not found: {}",
            expected.certificate_id
        ));
    }

    // 2. Holder name: enough of the name tokens must appear.
    if token_ratio(&text, &expected.holder_name, 0) >= config.name_token_ratio {
        matched += 1;
    } else {
        differences.push(format!("Holder name mismatch: {}", expected.holder_name));
    }

    // 3. Course name: only tokens longer than the minimum count as matches,
    // but the ratio denominator stays the full token count.
    if token_ratio(&text, &expected.course_name, config.long_token_min_len)
        >= config.long_token_ratio
    {
        matched += 1;
    } else {
        differences.push(format!("Course name mismatch: {}", expected.course_name));
    }

    // 4. Institution: same rule as the course name.
    if token_ratio(&text, &expected.institution, config.long_token_min_len)
        >= config.long_token_ratio
    {
        matched += 1;
    } else {
        differences.push(format!("Institution mismatch: {}", expected.institution));
    }

    // 5. Issue date: the four-digit year is enough — full dates rarely
    // survive OCR in a predictable format.
    let year = expected.issue_date.format("%Y").to_string();
    if text.contains(&year) {
        matched += 1;
    } else {
        differences.push(format!("Issue date not found: {}", expected.issue_date));
    }

    let match_score = matched as f32 / SUB_CHECKS as f32;
    debug!(matched, match_score, "Field matching scored");

    CheckResult::new(
        match_score >= config.match_pass_cutoff,
        match_score,
        MatchDetail { differences },
    )
}

/// Lowercase and collapse all whitespace runs to single spaces.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fraction of the expected value's tokens that appear in the text.
/// Tokens of length `min_len` or shorter never count as matches, but still
/// count toward the denominator.
fn token_ratio(text: &str, expected_value: &str, min_len: usize) -> f32 {
    let tokens: Vec<&str> = expected_value.split_whitespace().collect();
    if tokens.is_empty() {
        return 0.0;
    }

    let matches = tokens
        .iter()
        .filter(|t| t.len() > min_len && text.contains(&t.to_lowercase()))
        .count();

    matches as f32 / tokens.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn expected() -> ExpectedFields {
        ExpectedFields {
            certificate_id: "CERT-2024-0042".to_string(),
            holder_name: "Jane Ann Doe".to_string(),
            course_name: "Advanced Distributed Systems".to_string(),
            institution: "Northfield Technical University".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
        }
    }

    #[test]
    fn full_match_scores_one() {
        let cfg = VerificationConfig::default();
        let text = "This certifies that Jane Ann Doe completed Advanced \
                    Distributed Systems at Northfield Technical University \
                    on 15 June 2024. ID: cert-2024-0042";
        let result = match_fields(text, &expected(), &cfg);
        assert!(result.passed);
        assert!((result.score - 1.0).abs() < 1e-6);
        assert!(result.detail.differences.is_empty());
    }

    #[test]
    fn empty_text_scores_zero_with_all_differences() {
        let cfg = VerificationConfig::default();
        let result = match_fields("", &expected(), &cfg);
        assert!(!result.passed);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.detail.differences.len(), 5);
    }

    #[test]
    fn three_of_five_passes_the_cutoff() {
        let cfg = VerificationConfig::default();
        // ID + name + year, no course/institution words.
        let text = "cert-2024-0042 jane ann doe 2024";
        let result = match_fields(text, &expected(), &cfg);
        assert!((result.score - 0.6).abs() < 1e-6);
        assert!(result.passed);
        assert_eq!(result.detail.differences.len(), 2);
    }

    #[test]
    fn name_match_tolerates_one_missing_token() {
        let cfg = VerificationConfig::default();
        // 2 of 3 name tokens = 0.667 < 0.7 -> fails.
        let text = "jane doe";
        let result = match_fields(text, &expected(), &cfg);
        assert!(result
            .detail
            .differences
            .iter()
            .any(|d| d.contains("Holder name")));
    }

    #[test]
    fn short_tokens_never_match_course_words() {
        let cfg = VerificationConfig::default();
        let fields = ExpectedFields {
            course_name: "Web Dev for All".to_string(),
            ..expected()
        };
        // Every token is <= 3 chars; nothing can count as a course match.
        let text = "web dev for all";
        let result = match_fields(text, &fields, &cfg);
        assert!(result
            .detail
            .differences
            .iter()
            .any(|d| d.contains("Course name")));
    }

    #[test]
    fn matching_is_case_insensitive_on_id() {
        let cfg = VerificationConfig::default();
        let text = "CERT-2024-0042";
        let result = match_fields(text, &expected(), &cfg);
        assert!(!result
            .detail
            .differences
            .iter()
            .any(|d| d.contains("Certificate ID")));
    }

    #[test]
    fn adding_matching_text_never_decreases_score() {
        let cfg = VerificationConfig::default();
        let fields = expected();
        let fragments = [
            "cert-2024-0042",
            "jane ann doe",
            "advanced distributed systems",
            "northfield technical university",
            "2024",
        ];

        let mut text = String::new();
        let mut last_score = match_fields(&text, &fields, &cfg).score;
        for fragment in fragments {
            text.push(' ');
            text.push_str(fragment);
            let score = match_fields(&text, &fields, &cfg).score;
            assert!(
                score >= last_score,
                "score decreased from {last_score} to {score} after adding {fragment:?}"
            );
            last_score = score;
        }
        assert!((last_score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn whitespace_runs_collapse_before_matching() {
        let cfg = VerificationConfig::default();
        let text = "jane\t ann\n\n doe   cert-2024-0042";
        let result = match_fields(text, &expected(), &cfg);
        assert!(!result
            .detail
            .differences
            .iter()
            .any(|d| d.contains("Holder name")));
    }
}
