use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, stdin, stdout};

/// Print a prompt and read one line from stdin, trimmed.
pub async fn prompt_user(prompt_text: &str) -> Result<String> {
    let mut out = stdout();
    out.write_all(prompt_text.as_bytes()).await?;
    out.flush().await?;

    let mut line = String::new();
    let mut reader = BufReader::new(stdin());
    reader.read_line(&mut line).await?;
    Ok(line.trim().to_string())
}

/// Check if the input is a quit command
pub fn is_quit_command(input_text: &str) -> bool {
    matches!(
        input_text.trim().to_lowercase().as_str(),
        "/quit" | "/exit"
    )
}
