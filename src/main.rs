//! Command-line front end for the chat sidebar.
//!
//! Usage: `chat-sidebar [list|show <id>|delete <id> [--yes]|new]`

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use chat_sidebar::sidebar::{
    DeleteOutcome, SidebarConfig, SidebarContext, SwitchOutcome, ThreadId, ThreadListController,
};
use chat_sidebar::start_sidebar;

const USAGE: &str = "usage: chat-sidebar [list|show <id>|delete <id> [--yes]|new]";

enum Command {
    List,
    Show(ThreadId),
    Delete { thread_id: ThreadId, assume_yes: bool },
    New,
}

fn parse_args(args: &[String]) -> Result<Command> {
    let mut positional = args.iter().filter(|a| !a.starts_with('-'));
    let assume_yes = args.iter().any(|a| a == "--yes" || a == "-y");

    let command = match positional.next().map(String::as_str) {
        None | Some("list") => Command::List,
        Some("new") => Command::New,
        Some("show") => Command::Show(thread_arg(positional.next())?),
        Some("delete") => Command::Delete {
            thread_id: thread_arg(positional.next())?,
            assume_yes,
        },
        Some(other) => bail!("unknown command `{other}`\n{USAGE}"),
    };
    Ok(command)
}

fn thread_arg(arg: Option<&String>) -> Result<ThreadId> {
    let id = ThreadId::from(arg.context(USAGE)?.as_str());
    if id.is_blank() {
        bail!("thread id must not be blank");
    }
    Ok(id)
}

/// Whether the next line of `input` is a yes.
fn answer_is_yes(input: &mut impl BufRead) -> bool {
    let mut answer = String::new();
    if input.read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Ask on stderr, read one line from stdin.
fn ask(message: &str) -> bool {
    eprint!("{message} [y/N] ");
    let _ = io::stderr().flush();
    answer_is_yes(&mut io::stdin().lock())
}

/// Run a blocking prompt off the async workers.
async fn confirm_blocking<F>(prompt: F) -> Result<bool>
where
    F: FnOnce() -> bool + Send + 'static,
{
    tokio::task::spawn_blocking(prompt)
        .await
        .context("confirmation prompt failed")
}

async fn run(command: Command) -> Result<()> {
    let config = SidebarConfig::from_env().context("invalid sidebar configuration")?;
    let context = Arc::new(SidebarContext::new());
    let controller = ThreadListController::from_config(&config, Arc::clone(&context))
        .context("failed to build thread list controller")?;

    match command {
        Command::List => {
            controller.refresh().await.context("could not load threads")?;
            let threads = context.threads().await;
            if threads.is_empty() {
                println!("No conversations yet.");
            }
            for thread in threads {
                println!(
                    "{}  {:<31}  {}",
                    thread.timestamp.format("%Y-%m-%d %H:%M"),
                    thread.title,
                    thread.thread_id
                );
            }
        }
        Command::Show(thread_id) => {
            match controller.change_thread(thread_id.clone()).await? {
                SwitchOutcome::Loaded(count) => println!("{thread_id}: {count} messages"),
                SwitchOutcome::Stale => return Ok(()),
            }
            for record in context.prev_chats().await {
                if let Some(message) = &record.message {
                    println!("> {message}");
                }
                if let Some(response) = &record.response {
                    println!("< {response}");
                }
            }
        }
        Command::Delete {
            thread_id,
            assume_yes,
        } => {
            // Load the list first so the prompt can show the title.
            if let Err(e) = controller.refresh().await {
                tracing::warn!("Could not load titles before delete: {e}");
            }
            let confirmed = if assume_yes {
                true
            } else {
                let label = context
                    .threads()
                    .await
                    .into_iter()
                    .find(|t| t.thread_id == thread_id)
                    .map_or_else(|| thread_id.to_string(), |t| t.title);
                let message = format!("Delete \"{label}\"? This cannot be undone.");
                confirm_blocking(move || ask(&message)).await?
            };
            let outcome = controller
                .delete_thread(thread_id, &move |_: &str| confirmed)
                .await?;
            match outcome {
                DeleteOutcome::Cancelled => println!("Cancelled."),
                DeleteOutcome::Deleted { .. } => println!("Deleted."),
            }
        }
        Command::New => {
            let thread_id = controller.create_new_chat().await;
            println!("{thread_id}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    start_sidebar::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    match run(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_args() {
        assert!(matches!(parse_args(&args(&[])), Ok(Command::List)));
        assert!(matches!(parse_args(&args(&["new"])), Ok(Command::New)));
        assert!(matches!(
            parse_args(&args(&["show", "t1"])),
            Ok(Command::Show(id)) if id.as_str() == "t1"
        ));
        assert!(matches!(
            parse_args(&args(&["delete", "-y", "t1"])),
            Ok(Command::Delete { thread_id, assume_yes: true }) if thread_id.as_str() == "t1"
        ));
        assert!(parse_args(&args(&["delete"])).is_err());
        assert!(parse_args(&args(&["rename", "t1"])).is_err());
    }

    #[test]
    fn test_answer_is_yes() {
        assert!(answer_is_yes(&mut Cursor::new("y\n")));
        assert!(answer_is_yes(&mut Cursor::new(" YES \n")));
        assert!(!answer_is_yes(&mut Cursor::new("n\n")));
        assert!(!answer_is_yes(&mut Cursor::new("")));
    }

    #[tokio::test]
    async fn test_prompt_runs_on_blocking_thread() {
        let caller = std::thread::current().id();
        let confirmed = confirm_blocking(move || {
            std::thread::current().id() != caller && answer_is_yes(&mut Cursor::new("yes\n"))
        })
        .await
        .unwrap();
        assert!(confirmed);
    }
}
