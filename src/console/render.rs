use chrono::Local;
use colored::*;
use serde_json::Value;

use crate::agents::Persona;
use crate::client::ClientError;

/// Title shown above one persona's section.
fn section_title(persona: Persona) -> &'static str {
    match persona {
        Persona::Therapist => "🤝 Therapist's Support",
        Persona::Closure => "✉️  Closure Guidance",
        Persona::Routine => "📅 7-Day Recovery Plan",
        Persona::Honesty => "💪 Honest Feedback",
    }
}

/// What one section's slot in the response amounts to after inspection.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum SectionView<'a> {
    Content { failed: bool, text: &'a str },
    Missing,
}

/// Inspect one slot of the `data` mapping without trusting its shape. A
/// missing key or a malformed nested field is isolated to this section.
pub(crate) fn classify_section(section: Option<&Value>) -> SectionView<'_> {
    match section.and_then(|s| s.get("data")).and_then(|d| d.as_str()) {
        Some(text) => SectionView::Content {
            failed: section
                .and_then(|s| s.get("status"))
                .and_then(|v| v.as_str())
                == Some("failure"),
            text,
        },
        None => SectionView::Missing,
    }
}

pub fn display_welcome() {
    println!(
        "{}",
        "💔 Breakup Recovery Assistant".bright_blue().bold()
    );
    println!(
        "{}",
        "Share your feelings, get support, and receive personalized guidance to help you through this difficult time."
            .blue()
    );
    println!(
        "{}",
        "Your input is sent to four support agents; each section below is rendered independently.".blue()
    );
    println!("{}", "Type '/quit' or '/exit' to stop.\n".blue());
}

pub fn display_loading() {
    println!(
        "{}",
        "🔄 Analyzing your feelings and preparing support...".blue().italic()
    );
}

pub fn display_sections(data: &Value) {
    println!(
        "\n{}",
        format!(
            "📋 Support sections (generated at {})",
            Local::now().format("%H:%M:%S")
        )
        .bright_green()
        .bold()
    );
    for persona in Persona::ALL {
        display_section(
            section_title(persona),
            classify_section(data.get(persona.key())),
        );
    }
    println!(
        "{}",
        "Remember: healing takes time. Be patient with yourself.\n".bright_white()
    );
}

fn display_section(title: &str, view: SectionView<'_>) {
    println!("\n{}", title.bright_green().bold());
    println!(
        "{}",
        "┌─────────────────────────────────────────────────────────────".green()
    );
    match view {
        SectionView::Content { failed, text } => {
            if failed {
                println!(
                    "{} {}",
                    "│ ⚠️ Status:".yellow(),
                    "failure".bright_yellow().bold()
                );
            }
            for line in text.lines() {
                println!("│   {}", line.white());
            }
        }
        SectionView::Missing => {
            println!(
                "{} {}",
                "│ ⚠️".yellow(),
                format!("No data available for {}", title).bright_yellow()
            );
        }
    }
    println!(
        "{}",
        "└─────────────────────────────────────────────────────────────".green()
    );
}

pub fn display_validation_error(message: &str) {
    println!("{} {}\n", "❌".bright_red(), message.red());
}

/// Display a ClientError with appropriate styling and context
pub fn display_client_error(error: &ClientError) {
    match error {
        ClientError::Timeout => {
            println!("{}", format!("⏰ {}", error).bright_yellow().bold());
            println!(
                "{}",
                "💡 Tip: The analysis covers four agent calls and can take a while under load.".yellow()
            );
        }
        ClientError::Connection => {
            println!("{}", format!("🌐 {}", error).bright_red().bold());
            println!(
                "{}",
                "💡 Tip: Check that the API server is running and reachable.".red()
            );
        }
        ClientError::Status { status, .. } => {
            println!("{}", format!("❌ {}", error).bright_red().bold());
            if *status == 404 {
                println!(
                    "{}",
                    "💡 Tip: Check the API URL; the analyze endpoint lives at /analyze/.".red()
                );
            }
        }
        ClientError::InvalidJson { .. } => {
            println!("{}", format!("⚠️ {}", error).bright_magenta().bold());
            println!(
                "{}",
                "💡 Tip: The server response was unexpected. Try again.".magenta()
            );
        }
        ClientError::Api { .. } => {
            println!("{}", format!("❌ {}", error).bright_red().bold());
            println!(
                "{}",
                "💡 Tip: Check the server's configuration and logs.".red()
            );
        }
        ClientError::MissingData => {
            println!("{}", format!("⚠️ {}", error).bright_yellow().bold());
        }
        ClientError::Request { .. } => {
            println!("{}", format!("❌ {}", error).bright_red().bold());
        }
    }
    println!();
}

pub fn display_goodbye() {
    println!("{}", "👋 Take care of yourself!".bright_yellow().bold());
}
