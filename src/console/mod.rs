use std::path::PathBuf;

use anyhow::Result;
use colored::*;
use tokio::select;

use crate::client::{ApiClient, load_attachment};
use crate::types::ImageAttachment;

mod input;
mod render;

/// Interactive console client for the aggregator service.
pub struct Console {
    client: ApiClient,
}

impl Console {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Run the main console loop (interactive mode)
    pub async fn run(&self) -> Result<()> {
        render::display_welcome();
        println!(
            "{}",
            format!("ℹ️  Posting to {}\n", self.client.api_url()).blue()
        );

        loop {
            select! {
                // Handle Ctrl+C gracefully
                _ = tokio::signal::ctrl_c() => {
                    render::display_goodbye();
                    break;
                }
                line = input::prompt_user("💬 How are you feeling? ") => {
                    let user_text = match line {
                        Ok(text) => text,
                        Err(e) => {
                            println!("Error reading input: {}", e);
                            continue;
                        }
                    };

                    if input::is_quit_command(&user_text) {
                        render::display_goodbye();
                        break;
                    }

                    // Local validation: no network call for blank input
                    let Some(user_text) = validate_user_text(&user_text) else {
                        render::display_validation_error("Please share how you're feeling");
                        continue;
                    };

                    let images = self.collect_images().await?;
                    render::display_loading();

                    // Allow the request to be cancelled by Ctrl+C
                    select! {
                        _ = tokio::signal::ctrl_c() => {
                            println!("\n⚠️ Request cancelled by user");
                            render::display_goodbye();
                            break;
                        }
                        result = self.client.analyze(user_text, &images) => {
                            match result {
                                Ok(data) => render::display_sections(&data),
                                Err(e) => render::display_client_error(&e),
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Prompt for optional image paths; unreadable files are warned about
    /// and skipped, never fatal.
    async fn collect_images(&self) -> Result<Vec<ImageAttachment>> {
        let raw = input::prompt_user(
            "🖼  Image paths (optional, comma separated, Enter to skip): ",
        )
        .await?;

        let mut images = Vec::new();
        for path in parse_image_paths(&raw) {
            match load_attachment(&path).await {
                Ok(attachment) => images.push(attachment),
                Err(e) => println!(
                    "{}",
                    format!("⚠️ Could not process file {}: {}", path.display(), e)
                        .bright_yellow()
                ),
            }
        }
        Ok(images)
    }
}

/// Submission is blocked before any network call when the text is empty
/// or whitespace-only.
fn validate_user_text(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn parse_image_paths(raw: &str) -> Vec<PathBuf> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_image_paths_splits_and_trims() {
        let paths = parse_image_paths(" a.png , b.jpg ;; ");
        assert_eq!(paths, vec![PathBuf::from("a.png"), PathBuf::from("b.jpg")]);
    }

    #[test]
    fn parse_image_paths_handles_empty_input() {
        assert!(parse_image_paths("").is_empty());
        assert!(parse_image_paths("  ").is_empty());
    }

    #[test]
    fn blank_text_is_rejected_before_submission() {
        assert_eq!(validate_user_text(""), None);
        assert_eq!(validate_user_text("   "), None);
        assert_eq!(validate_user_text(" I feel hurt "), Some("I feel hurt"));
    }
}
