//! Step descriptors and free-text step extraction.
//!
//! Extraction is a pure function from planning text to an ordered list of
//! step descriptors, kept separate from execution so it can be tested on
//! its own.

use serde::{Deserialize, Serialize};

/// Cap on the number of steps extracted from one planning artifact.
pub const MAX_EXTRACTED_STEPS: usize = 10;

/// Cleaned step text at or below this many characters is discarded.
const MIN_STEP_CHARS: usize = 10;

/// Leading words that mark a line as an ordered instruction.
const ORDINAL_PREFIXES: [&str; 8] =
    ["first", "second", "third", "fourth", "fifth", "then", "next", "finally"];

/// One unit of work to execute: a name, an optional pre-assigned agent, and
/// the input payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDescriptor {
    /// Step name, unique within one workflow.
    pub name: String,
    /// Agent to invoke. `None` routes the step at execution time.
    pub agent_id: Option<String>,
    /// Input payload passed to the agent.
    pub input: String,
    /// When true, this step failing halts the remaining steps.
    pub required: bool,
}

impl StepDescriptor {
    /// Creates an unassigned, optional step.
    #[must_use]
    pub fn new(name: impl Into<String>, input: impl Into<String>) -> Self {
        Self { name: name.into(), agent_id: None, input: input.into(), required: false }
    }

    /// Creates a step pre-assigned to an agent.
    #[must_use]
    pub fn assigned(
        name: impl Into<String>,
        agent_id: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            agent_id: Some(agent_id.into()),
            input: input.into(),
            required: false,
        }
    }

    /// Marks whether this step's failure halts the workflow.
    #[must_use]
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// Extracts ordered steps from free planning text.
///
/// A line counts as a step when it starts with a digit or list bullet,
/// carries an ordinal lead-in ("first", "then", "finally"), or mentions
/// "step". List markers and "step N" prefixes are stripped, very short
/// fragments are dropped, and at most [`MAX_EXTRACTED_STEPS`] steps are
/// returned in source order. Text with no step lines yields an empty list;
/// the caller decides the fallback.
#[must_use]
pub fn extract_steps(text: &str) -> Vec<StepDescriptor> {
    let mut steps = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || !is_step_line(line) {
            continue;
        }
        let cleaned = clean_step_line(line);
        if cleaned.chars().count() > MIN_STEP_CHARS {
            steps.push(StepDescriptor::new(format!("step_{}", steps.len() + 1), cleaned));
            if steps.len() == MAX_EXTRACTED_STEPS {
                break;
            }
        }
    }
    steps
}

fn is_step_line(line: &str) -> bool {
    let Some(first) = line.chars().next() else {
        return false;
    };
    if first.is_ascii_digit() || matches!(first, '-' | '*' | '•') {
        return true;
    }
    let lower = line.to_lowercase();
    if lower.contains("step") {
        return true;
    }
    ORDINAL_PREFIXES.iter().any(|prefix| {
        lower
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with([' ', ',', ':']))
    })
}

/// Strips list bullets, "1." style numbering, and "step N" markers.
fn clean_step_line(line: &str) -> &str {
    let mut rest = line.trim();

    if let Some(stripped) = rest.strip_prefix(['-', '*', '•']) {
        rest = stripped.trim_start();
    }

    // "1." / "2)" / "3:" numbering; bare digit runs stay part of the text.
    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        if let Some(after) = rest[digits..].strip_prefix(['.', ')', ':']) {
            rest = after.trim_start();
        }
    }

    if rest.get(..4).is_some_and(|lead| lead.eq_ignore_ascii_case("step")) {
        let tail = rest[4..].trim_start();
        let digits = tail.chars().take_while(char::is_ascii_digit).count();
        if digits > 0 {
            rest = tail[digits..].trim_start_matches(['.', ')', ':']).trim_start();
        }
    }

    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_lines_extracted_in_order() {
        let text = "1. Gather the requirements from stakeholders\n\
                    2. Draft the implementation schedule\n\
                    3. Review the schedule with the team";
        let steps = extract_steps(text);

        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].name, "step_1");
        assert_eq!(steps[0].input, "Gather the requirements from stakeholders");
        assert_eq!(steps[1].input, "Draft the implementation schedule");
        assert_eq!(steps[2].input, "Review the schedule with the team");
        assert!(steps.iter().all(|step| step.agent_id.is_none() && !step.required));
    }

    #[test]
    fn test_bulleted_lines_extracted() {
        let text = "- Collect baseline metrics for the service\n\
                    * Define the rollout milestones clearly\n\
                    • Schedule the retrospective meeting";
        let steps = extract_steps(text);

        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].input, "Collect baseline metrics for the service");
        assert_eq!(steps[1].input, "Define the rollout milestones clearly");
        assert_eq!(steps[2].input, "Schedule the retrospective meeting");
    }

    #[test]
    fn test_step_prefix_stripped() {
        let steps = extract_steps("Step 1: Gather requirements from the users");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].input, "Gather requirements from the users");
    }

    #[test]
    fn test_ordinal_lines_kept_verbatim() {
        let text = "First, interview the support team\n\
                    Then consolidate the findings into a report\n\
                    Finally present the report to leadership";
        let steps = extract_steps(text);

        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].input, "First, interview the support team");
        assert_eq!(steps[2].input, "Finally present the report to leadership");
    }

    #[test]
    fn test_short_fragments_dropped() {
        let steps = extract_steps("- do it\n- Write the deployment runbook");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].input, "Write the deployment runbook");
    }

    #[test]
    fn test_extraction_caps_step_count() {
        let text = (1..=15)
            .map(|i| format!("{i}. Carry out planned activity number {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let steps = extract_steps(&text);

        assert_eq!(steps.len(), MAX_EXTRACTED_STEPS);
        assert_eq!(steps[9].name, "step_10");
    }

    #[test]
    fn test_plain_prose_yields_no_steps() {
        let text = "The project should be finished before winter.\n\
                    Everyone agrees the budget is tight.";
        assert!(extract_steps(text).is_empty());
    }

    #[test]
    fn test_bare_digit_run_kept_whole() {
        let steps = extract_steps("10,000 requests per second must be sustained");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].input, "10,000 requests per second must be sustained");
    }

    #[test]
    fn test_ordinal_prefix_requires_word_boundary() {
        // "nextgen" must not read as the ordinal "next".
        assert!(extract_steps("nextgen platforms are interesting to watch").is_empty());
    }

    #[test]
    fn test_descriptor_builders() {
        let step = StepDescriptor::assigned("plan", "action_planner", "Draft the plan")
            .with_required(true);
        assert_eq!(step.agent_id.as_deref(), Some("action_planner"));
        assert!(step.required);
    }
}
