use colored::*;
use std::time::Duration;

use crate::models::{ChatReply, Project, Task};
use crate::scenarios::{ScenarioReport, Verdict};

#[derive(Debug)]
pub struct StepResult {
    pub step: String,
    pub passed: bool,
    pub message: Option<String>,
    pub duration: Duration,
}

pub fn print_phase(title: &str) {
    println!("\n{}", format!("=== {} ===", title).bright_white().bold());
}

pub fn print_progress(message: &str) {
    println!("{} {}", "→".blue(), message);
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn print_failure(message: &str) {
    println!("{} {}", "✗".red(), message);
}

pub fn print_projects(projects: &[Project]) {
    print_success(&format!("Projects found: {}", projects.len()));
    for project in projects {
        println!("   - ID: {}, Name: {}", project.id, project.name);
    }
}

pub fn print_tasks(tasks: &[Task]) {
    print_success(&format!("Tasks found: {}", tasks.len()));
    for task in tasks {
        println!(
            "   - ID: {}, Title: {}, Status: {}",
            task.id,
            task.title,
            format!("{:?}", task.status).dimmed()
        );
    }
}

pub fn print_chat_reply(label: &str, reply: &ChatReply) {
    print_success(&format!("{}: {}...", label, reply.preview(100)));
}

pub fn verdict_line(verdict: Verdict, direct_created: bool) -> &'static str {
    match verdict {
        Verdict::Success if direct_created => "SUCCESS: both direct creation and AI chat created tasks",
        Verdict::Success => "SUCCESS: new tasks were created",
        Verdict::DirectOnly => "FAILURE: direct creation worked, but the AI chat did not",
        Verdict::Neither => "FAILURE: neither direct creation nor the AI chat worked",
    }
}

pub fn settle_note(settled: bool) -> Option<&'static str> {
    if settled {
        None
    } else {
        Some("Task list was still changing when polling stopped")
    }
}

pub fn print_analysis(report: &ScenarioReport) {
    print_phase("ANALYSIS");

    let before = report.tasks_before.len();
    let after = report.tasks_after.len();
    println!("Tasks before: {}", before);
    println!("Tasks after: {}", after);
    println!("Difference: {}", after as i64 - before as i64);

    if let Some(note) = settle_note(report.settled) {
        println!("{}", note.yellow());
    }

    if !report.new_tasks.is_empty() {
        println!("New tasks ({}):", report.new_tasks.len());
        for task in &report.new_tasks {
            println!("   - {}", task.title);
        }
    }

    let line = verdict_line(report.verdict, report.direct_task.is_some());
    if report.verdict.passed() {
        println!("\n{}", line.bright_green().bold());
    } else {
        println!("\n{}", line.bright_red().bold());
    }
}

/// Passed and failed step counts.
pub fn tally(results: &[StepResult]) -> (usize, usize) {
    let passed = results.iter().filter(|r| r.passed).count();
    (passed, results.len() - passed)
}

pub fn print_test_summary(results: &[StepResult]) {
    println!("\n{}", "=== STEP SUMMARY ===".bright_white().bold());

    let (passed, failed) = tally(results);

    for result in results {
        let status = if result.passed {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };

        println!("[{}] {} ({:?})", status, result.step, result.duration);

        if let Some(msg) = &result.message {
            println!("      {}", msg.dimmed());
        }
    }

    println!(
        "\n{}: {} passed, {} failed",
        "Results".bold(),
        passed.to_string().green(),
        failed.to_string().red()
    );
}
