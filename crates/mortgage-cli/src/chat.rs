use anyhow::Result;
use colored::*;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use mortgage_core::{ApiError, ChatClient, Conversation};

pub async fn chat_interactive(
    client: &mut ChatClient,
    conversation: &mut Conversation,
) -> Result<()> {
    println!("\n{}", "💬 Mortgage Assistant".bold().blue());
    println!(
        "{}",
        "Ask about rates, payments, or your application. /clear resets, /quit exits.".dimmed()
    );

    loop {
        let input: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()?;

        match input.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                conversation.clear();
                println!("{}", "Conversation cleared".dimmed());
                continue;
            }
            message => conversation.push_user(message),
        }

        let mut outcome = client.send_message(conversation.to_request()).await;
        loop {
            let err = match outcome {
                Ok(response) => {
                    conversation.record_reply(&response);
                    println!("{} {}\n", "Assistant:".bold().green(), response.output_text);
                    break;
                }
                Err(err) => err,
            };

            report_failure(conversation, &err);
            if !err.is_retryable() || !confirm_retry()? {
                break;
            }

            match client.retry().await {
                Some(next) => outcome = next,
                None => break,
            }
        }
    }

    Ok(())
}

fn report_failure(conversation: &mut Conversation, err: &ApiError) {
    if conversation.record_failure(err) {
        if let Some(apology) = conversation.messages().last() {
            println!("{} {}\n", "Assistant:".bold().green(), apology.content);
        }
    } else {
        println!("{}: {}", "Connection problem".red(), err);
    }

    if let Some(correlation_id) = &err.correlation_id {
        println!("{}", format!("Reference: {}", correlation_id).dimmed());
    }
}

fn confirm_retry() -> Result<bool> {
    let retry = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Retry the last message?")
        .default(true)
        .interact()?;
    Ok(retry)
}
