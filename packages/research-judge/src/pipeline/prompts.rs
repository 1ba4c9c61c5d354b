//! LLM prompts for the judgment capabilities.

use sha2::{Digest, Sha256};

use crate::traits::ai::SynthesisRequest;
use crate::types::evidence::Evidence;

/// Prompt for classifying one evidence item's stance.
pub const CLASSIFY_PROMPT: &str = r#"Analyze the following research evidence regarding the question: {question}

Evidence title: {title}
Evidence content: {content}
Evidence key findings: {key_findings}

Determine whether this evidence supports or refutes the claim, and with what confidence.
Explain your reasoning with key points and any limitations.

Output JSON:
{
    "supports_claim": true | false,
    "confidence": 0.0 to 1.0,
    "key_points": ["point the evidence makes"],
    "limitations": ["weakness of the evidence"]
}"#;

/// Prompt for identifying conflicts across analyses.
pub const CONFLICTS_PROMPT: &str = r#"Identify conflicts in the following evidence analyses for the question: {question}

Analyses:
{analyses}

List any contradictions or inconsistencies between different pieces of evidence.
Refer to analyses by number. Return an empty list when there are none.

Output JSON:
{
    "conflicts": ["Analysis 1 and Analysis 3 disagree on ..."]
}"#;

/// Prompt for synthesizing the final verdict.
pub const SYNTHESIZE_PROMPT: &str = r#"You are an objective research judge tasked with making a decision on: {question}
Research domain: {domain}

Based ONLY on the evidence provided, form a judgment.
If the evidence is inconclusive or contradictory, state so in your verdict.
Your reasoning should cite specific pieces of evidence and their strengths or limitations.
Be fair and balanced in your assessment.

SUPPORTING EVIDENCE:
{supporting}

OPPOSING EVIDENCE:
{opposing}

CONFLICTS BETWEEN SOURCES:
{conflicts}

Output JSON:
{
    "verdict": "supported" | "refuted" | "inconclusive",
    "confidence": 0.0 to 1.0,
    "reasoning": "explanation citing evidence by number",
    "limitations": ["limitation of the evidence base"],
    "recommendation": "optional advice for the reader, or null"
}"#;

/// Hash of all prompt templates, for cache invalidation.
pub fn prompts_hash() -> String {
    let mut hasher = Sha256::new();
    for prompt in [CLASSIFY_PROMPT, CONFLICTS_PROMPT, SYNTHESIZE_PROMPT] {
        hasher.update(prompt.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Format the classify prompt for one evidence item.
pub fn format_classify_prompt(question: &str, evidence: &Evidence) -> String {
    CLASSIFY_PROMPT
        .replace("{question}", question)
        .replace("{title}", &evidence.source.title)
        .replace("{content}", &evidence.content)
        .replace("{key_findings}", &evidence.key_findings.join("; "))
}

/// Format the conflicts prompt.
pub fn format_conflicts_prompt(question: &str, serialized_analyses: &str) -> String {
    CONFLICTS_PROMPT
        .replace("{question}", question)
        .replace("{analyses}", serialized_analyses)
}

/// Format the synthesis prompt.
pub fn format_synthesize_prompt(request: &SynthesisRequest<'_>) -> String {
    let conflicts = if request.conflicts.is_empty() {
        "None identified".to_string()
    } else {
        request
            .conflicts
            .iter()
            .map(|c| format!("- {}", c))
            .collect::<Vec<_>>()
            .join("\n")
    };

    SYNTHESIZE_PROMPT
        .replace("{question}", request.question)
        .replace("{domain}", request.domain)
        .replace("{supporting}", &format_evidence_list(request.supporting))
        .replace("{opposing}", &format_evidence_list(request.opposing))
        .replace("{conflicts}", &conflicts)
}

fn format_evidence_list(evidence: &[Evidence]) -> String {
    if evidence.is_empty() {
        return "None".to_string();
    }

    evidence
        .iter()
        .enumerate()
        .map(|(i, e)| {
            format!(
                "{}. {} ({}) [relevance {:.2}]\n   {}\n   Key findings: {}",
                i + 1,
                e.source.title,
                e.source.published_date,
                e.relevance_score,
                e.content,
                e.key_findings.join("; ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::relevance::candidate_to_evidence;
    use crate::traits::connector::RawCandidate;

    #[test]
    fn test_prompt_hash_is_consistent() {
        let hash1 = prompts_hash();
        let hash2 = prompts_hash();
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_classify_prompt_fills_fields() {
        let evidence = candidate_to_evidence(
            RawCandidate::new("Coffee cohort", "https://x").with_abstract("Drinkers had lower risk."),
            0.9,
            "test",
        );
        let prompt = format_classify_prompt("Does coffee help?", &evidence);

        assert!(prompt.contains("question: Does coffee help?"));
        assert!(prompt.contains("Evidence title: Coffee cohort"));
        assert!(prompt.contains("Drinkers had lower risk."));
        assert!(!prompt.contains("{title}"));
    }

    #[test]
    fn test_synthesize_prompt_marks_empty_sections() {
        let request = SynthesisRequest {
            question: "q",
            domain: "general",
            supporting: &[],
            opposing: &[],
            conflicts: &[],
        };
        let prompt = format_synthesize_prompt(&request);

        assert!(prompt.contains("SUPPORTING EVIDENCE:\nNone"));
        assert!(prompt.contains("None identified"));
    }
}
