//! Parsing of model replies: the line-oriented VERDICT/SUMMARY/ANALYSIS
//! block for food analysis, and the strict JSON meal array.

use crate::models::{AnalysisResult, Meal, Verdict};

const DEFAULT_SUMMARY: &str = "Analysis complete. See the details below.";

// Three independent extractions over the raw reply. Each falls back to a
// default when its marker is missing. Only the verdict token is matched
// case-insensitively; the analysis body passes through untouched since it
// is rendered as markdown-like text downstream.
pub fn parse_analysis(raw: &str) -> AnalysisResult {
    AnalysisResult {
        verdict: extract_verdict(raw),
        summary: extract_summary(raw),
        analysis: extract_analysis(raw),
    }
}

fn extract_verdict(raw: &str) -> Verdict {
    let Some(idx) = raw.find("VERDICT:") else {
        return Verdict::Caution;
    };
    let rest = &raw[idx + "VERDICT:".len()..];
    let token = rest.lines().next().unwrap_or("").trim().to_ascii_lowercase();

    for (name, verdict) in [
        ("safe", Verdict::Safe),
        ("caution", Verdict::Caution),
        ("avoid", Verdict::Avoid),
    ] {
        if token.starts_with(name) {
            return verdict;
        }
    }
    Verdict::Caution
}

fn extract_summary(raw: &str) -> String {
    let Some(idx) = raw.find("SUMMARY:") else {
        return DEFAULT_SUMMARY.to_string();
    };
    let rest = &raw[idx + "SUMMARY:".len()..];

    // ends at the first blank line or the ANALYSIS marker, whichever is first
    let mut end = rest.len();
    if let Some(blank) = rest.find("\n\n") {
        end = end.min(blank);
    }
    if let Some(marker) = rest.find("ANALYSIS:") {
        end = end.min(marker);
    }

    let summary = rest[..end].trim();
    if summary.is_empty() {
        DEFAULT_SUMMARY.to_string()
    } else {
        summary.to_string()
    }
}

fn extract_analysis(raw: &str) -> String {
    match raw.find("ANALYSIS:") {
        Some(idx) => raw[idx + "ANALYSIS:".len()..].trim().to_string(),
        None => raw.trim().to_string(),
    }
}

// The meal reply must be one strict JSON array of meal objects. A markdown
// code fence around it is unwrapped first; any parse failure propagates
// whole, with no partial recovery.
pub fn parse_meals(raw: &str) -> Result<Vec<Meal>, serde_json::Error> {
    serde_json::from_str(strip_code_fence(raw))
}

fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    // drop the info string (```json) through the first newline
    let inner = match inner.find('\n') {
        Some(pos) => &inner[pos + 1..],
        None => inner,
    };
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_all_three_sections_trimmed() {
        let raw = "VERDICT: avoid\nSUMMARY:  High potassium content. \nANALYSIS:\n### Risks\n- potassium\n";
        let result = parse_analysis(raw);
        assert_eq!(result.verdict, Verdict::Avoid);
        assert_eq!(result.summary, "High potassium content.");
        assert_eq!(result.analysis, "### Risks\n- potassium");
    }

    #[test]
    fn missing_verdict_defaults_to_caution() {
        let result = parse_analysis("SUMMARY: fine\nANALYSIS: body");
        assert_eq!(result.verdict, Verdict::Caution);
    }

    #[test]
    fn verdict_token_is_case_insensitive() {
        assert_eq!(parse_analysis("VERDICT: AVOID").verdict, Verdict::Avoid);
        assert_eq!(parse_analysis("VERDICT: Safe").verdict, Verdict::Safe);
        assert_eq!(parse_analysis("VERDICT:caution").verdict, Verdict::Caution);
    }

    #[test]
    fn verdict_tolerates_trailing_punctuation() {
        assert_eq!(parse_analysis("VERDICT: safe.").verdict, Verdict::Safe);
    }

    #[test]
    fn unrecognized_verdict_token_defaults_to_caution() {
        assert_eq!(parse_analysis("VERDICT: maybe").verdict, Verdict::Caution);
    }

    #[test]
    fn missing_summary_uses_the_default() {
        let result = parse_analysis("VERDICT: safe\nANALYSIS: body");
        assert_eq!(result.summary, DEFAULT_SUMMARY);
    }

    #[test]
    fn summary_stops_at_the_first_blank_line() {
        let raw = "SUMMARY: Short and safe.\n\nLonger commentary the model added.";
        assert_eq!(parse_analysis(raw).summary, "Short and safe.");
    }

    #[test]
    fn missing_analysis_falls_back_to_the_full_reply() {
        let raw = "VERDICT: caution\nSUMMARY: something";
        assert_eq!(parse_analysis(raw).analysis, raw.trim());
    }

    #[test]
    fn meal_array_parses_bare() {
        let raw = r#"[{"name":"Oatmeal","description":"Warm oats","ingredients":["oats","milk"],"tips":"Use low-fat milk"}]"#;
        let meals = parse_meals(raw).unwrap();
        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0].name, "Oatmeal");
        assert_eq!(meals[0].ingredients, vec!["oats", "milk"]);
    }

    #[test]
    fn meal_array_parses_inside_a_code_fence() {
        let raw = "```json\n[{\"name\":\"Rice bowl\",\"description\":\"d\",\"ingredients\":[\"rice\"],\"tips\":\"t\"}]\n```";
        let meals = parse_meals(raw).unwrap();
        assert_eq!(meals[0].name, "Rice bowl");
    }

    #[test]
    fn meal_parse_failure_is_not_recovered() {
        assert!(parse_meals("Sure! Here are some meals you could try.").is_err());
        assert!(parse_meals(r#"{"name":"not an array"}"#).is_err());
    }
}
