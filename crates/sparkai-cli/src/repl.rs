//! Line-based interactive session on stdin.

use std::io::Write;

use sparkai::{ChatClient, Conversation, SparkError};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::ask;

const PROMPT: &str = "> ";

enum Command<'a> {
    Exit,
    Clear,
    Ask(&'a str),
    Skip,
}

fn parse(line: &str) -> Command<'_> {
    match line.trim() {
        "" => Command::Skip,
        "/exit" | "/quit" => Command::Exit,
        "/clear" => Command::Clear,
        text => Command::Ask(text),
    }
}

/// Read prompts until EOF or `/exit`. A failed call is reported and the
/// session continues.
pub(crate) async fn run(
    client: &dyn ChatClient,
    conversation: &mut Conversation,
    stream: bool,
) -> Result<(), SparkError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        show_prompt()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse(&line) {
            Command::Exit => break,
            Command::Skip => continue,
            Command::Clear => {
                conversation.clear();
                eprintln!("(history cleared)");
            }
            Command::Ask(text) => {
                if let Err(e) = ask(client, conversation, text, stream).await {
                    eprintln!("error: {e}");
                }
            }
        }
    }
    Ok(())
}

fn show_prompt() -> Result<(), SparkError> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(PROMPT.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
