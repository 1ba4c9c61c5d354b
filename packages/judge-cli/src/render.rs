//! Terminal rendering of a judgment.

use colored::Colorize;
use research_judge::{Evidence, Judgment};

pub fn print_judgment(judgment: &Judgment) {
    println!();
    println!("{}", "===== JUDGMENT =====".bright_cyan().bold());
    println!("Question: {}", judgment.question);
    println!("Verdict: {}", verdict_label(&judgment.verdict));
    println!("Confidence: {:.2}", judgment.confidence);

    if judgment.used_synthetic_evidence() {
        println!(
            "{}",
            "⚠ No source answered. This verdict is based on synthetic placeholder evidence."
                .bright_yellow()
        );
    }

    section("REASONING");
    println!("{}", judgment.reasoning);

    section("SUPPORTING EVIDENCE");
    print_evidence(&judgment.supporting_evidence);

    section("OPPOSING EVIDENCE");
    print_evidence(&judgment.opposing_evidence);

    section("LIMITATIONS");
    if judgment.limitations.is_empty() {
        println!("{}", "None reported".dimmed());
    }
    for limitation in &judgment.limitations {
        println!("• {}", limitation);
    }

    if let Some(recommendation) = &judgment.recommendation {
        section("RECOMMENDATION");
        println!("{}", recommendation);
    }
}

fn section(title: &str) {
    println!();
    println!("{}", format!("===== {} =====", title).bright_cyan().bold());
}

fn verdict_label(verdict: &str) -> colored::ColoredString {
    let lower = verdict.to_lowercase();
    if lower.contains("inconclusive") {
        verdict.bright_yellow().bold()
    } else if lower.contains("refuted") || lower.contains("not supported") {
        verdict.bright_red().bold()
    } else if lower.contains("supported") {
        verdict.bright_green().bold()
    } else {
        verdict.bold()
    }
}

fn print_evidence(items: &[Evidence]) {
    if items.is_empty() {
        println!("{}", "None".dimmed());
        return;
    }

    for (i, evidence) in items.iter().enumerate() {
        println!(
            "{}. {} ({})",
            i + 1,
            evidence.source.title.bold(),
            evidence.source.published_date
        );
        println!("   Relevance: {:.2}", evidence.relevance_score);
        if let Some(publication) = &evidence.source.publication {
            println!("   Source: {}", publication);
        }
        println!("   Key findings: {}", evidence.key_findings.join(", "));
    }
}
