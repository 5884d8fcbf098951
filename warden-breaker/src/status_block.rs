//! Parses the strategy's structured completion block (spec §4.E, §4.F).
//! `STATUS`/`EXIT_SIGNAL`/`FILES_MODIFIED`/`PR_READY`/`CLARIFICATION_NEEDED`/
//! `CLARIFICATION_QUESTIONS`/`WORK_SUMMARY` fields are SHOULD, not MUST: a
//! strategy that omits the block entirely is handled by the keyword fallback
//! at strictly lower confidence.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopStatus {
    InProgress,
    Complete,
    NeedsClarification,
    Blocked,
}

impl LoopStatus {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in-progress" | "in_progress" => Some(Self::InProgress),
            "complete" => Some(Self::Complete),
            "needs-clarification" | "needs_clarification" => Some(Self::NeedsClarification),
            "blocked" => Some(Self::Blocked),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusBlock {
    pub status: Option<LoopStatus>,
    pub exit_signal: Option<String>,
    pub files_modified: u32,
    pub pr_ready: bool,
    pub clarification_needed: bool,
    pub clarification_questions: Vec<String>,
    pub work_summary: Option<String>,
}

/// Distinguishes a structured-block parse from the keyword heuristic fallback
/// (spec §4.E: "in its absence, falls back to keyword heuristics with
/// strictly lower confidence").
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParseConfidence {
    Heuristic,
    Structured,
}

static FIELD_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*([A-Z_]+)\s*:\s*(.*?)\s*$").unwrap());

fn parse_structured(text: &str) -> Option<StatusBlock> {
    let mut block = StatusBlock::default();
    let mut saw_any = false;

    for cap in FIELD_LINE.captures_iter(text) {
        let field = &cap[1];
        let value = cap[2].trim();
        match field {
            "STATUS" => {
                block.status = LoopStatus::parse(value);
                saw_any |= block.status.is_some();
            }
            "EXIT_SIGNAL" => {
                if !value.is_empty() {
                    block.exit_signal = Some(value.to_string());
                    saw_any = true;
                }
            }
            "FILES_MODIFIED" => {
                if let Ok(n) = value.parse::<u32>() {
                    block.files_modified = n;
                    saw_any = true;
                }
            }
            "PR_READY" => {
                block.pr_ready = value.eq_ignore_ascii_case("true");
                saw_any = true;
            }
            "CLARIFICATION_NEEDED" => {
                block.clarification_needed = value.eq_ignore_ascii_case("true");
                saw_any = true;
            }
            "CLARIFICATION_QUESTIONS" => {
                block.clarification_questions = value
                    .split('|')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
                saw_any = true;
            }
            "WORK_SUMMARY" => {
                if !value.is_empty() {
                    block.work_summary = Some(value.to_string());
                    saw_any = true;
                }
            }
            _ => {}
        }
    }

    saw_any.then_some(block)
}

/// Keyword heuristic used when the strategy emits no structured block.
/// Strictly lower confidence: a coarse scan of the free-text summary.
fn parse_heuristic(text: &str) -> StatusBlock {
    let lower = text.to_ascii_lowercase();
    let needs_clarification = lower.contains("need clarification")
        || lower.contains("could you clarify")
        || lower.contains("which approach would you prefer");
    let pr_ready = lower.contains("pull request") && lower.contains("ready");
    let complete = pr_ready || lower.contains("task complete") || lower.contains("all done");

    StatusBlock {
        status: Some(if needs_clarification {
            LoopStatus::NeedsClarification
        } else if complete {
            LoopStatus::Complete
        } else {
            LoopStatus::InProgress
        }),
        exit_signal: None,
        files_modified: 0,
        pr_ready,
        clarification_needed: needs_clarification,
        clarification_questions: Vec::new(),
        work_summary: None,
    }
}

/// Parses a strategy's raw turn output into a `StatusBlock`, preferring the
/// structured form and falling back to heuristics (spec §4.E).
pub fn parse_status(text: &str) -> (StatusBlock, ParseConfidence) {
    match parse_structured(text) {
        Some(block) => (block, ParseConfidence::Structured),
        None => (parse_heuristic(text), ParseConfidence::Heuristic),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: a well-formed structured block parses every field at
    /// `Structured` confidence.
    #[test]
    fn parses_structured_block() {
        let text = "\
STATUS: complete
EXIT_SIGNAL: done
FILES_MODIFIED: 3
PR_READY: true
CLARIFICATION_NEEDED: false
WORK_SUMMARY: added the health endpoint
";
        let (block, confidence) = parse_status(text);
        assert_eq!(confidence, ParseConfidence::Structured);
        assert_eq!(block.status, Some(LoopStatus::Complete));
        assert_eq!(block.files_modified, 3);
        assert!(block.pr_ready);
        assert!(!block.clarification_needed);
        assert_eq!(block.work_summary.as_deref(), Some("added the health endpoint"));
    }

    /// **Scenario**: clarification questions are split on `|`.
    #[test]
    fn splits_clarification_questions() {
        let text = "STATUS: needs-clarification\nCLARIFICATION_QUESTIONS: use REST or gRPC? | which repo?\n";
        let (block, _) = parse_status(text);
        assert_eq!(
            block.clarification_questions,
            vec!["use REST or gRPC?".to_string(), "which repo?".to_string()]
        );
    }

    /// **Scenario**: free text with no structured fields falls back to the
    /// keyword heuristic at strictly lower confidence.
    #[test]
    fn falls_back_to_heuristic_without_structured_block() {
        let (block, confidence) = parse_status("I opened the pull request, it is ready for review.");
        assert_eq!(confidence, ParseConfidence::Heuristic);
        assert!(block.pr_ready);
        assert_eq!(block.status, Some(LoopStatus::Complete));
    }

    #[test]
    fn heuristic_detects_clarification_language() {
        let (block, confidence) =
            parse_status("Could you clarify which auth provider to target?");
        assert_eq!(confidence, ParseConfidence::Heuristic);
        assert_eq!(block.status, Some(LoopStatus::NeedsClarification));
    }
}
