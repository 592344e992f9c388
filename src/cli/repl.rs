use std::error::Error;
use std::sync::Arc;
use log::info;
use tokio::io::{ AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader };

use crate::cli::ChatArgs;
use crate::config::persona::resolve_persona;
use crate::conversation::{ ChatSession, HttpRelayTransport, SessionOptions };
use crate::models::chat::{ ChatMessage, Role };

const QUIT_COMMAND: &str = "/quit";

pub fn format_message(message: &ChatMessage) -> String {
    let speaker = match message.role {
        Role::User => "You",
        Role::Assistant => "AI",
        Role::System => "System",
    };
    format!("{}: {}", speaker, message.content)
}

pub async fn run_chat(args: ChatArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let persona = resolve_persona(args.persona_path.as_deref())?;
    let transport = HttpRelayTransport::new(args.relay_url.as_deref())?;
    match transport.endpoint() {
        Some(url) => info!("Chatting through relay at {}", url),
        None => info!("No relay URL configured; messages will fail until one is set"),
    }

    let options = SessionOptions {
        model: args.chat_model.clone(),
        max_tokens: args.max_tokens,
        temperature: args.temperature,
    };
    let mut session = ChatSession::new(persona, options, Arc::new(transport));

    let mut stdout = tokio::io::stdout();
    print_messages(&mut stdout, &[session.greeting()]).await?;

    let stdin = BufReader::new(tokio::io::stdin());
    chat_loop(&mut session, stdin, &mut stdout).await?;

    info!("Chat session {} ended", session.id());
    Ok(())
}

/// Submits each input line until `/quit` or end of input, writing the replies to `out`.
pub async fn chat_loop<R, W>(session: &mut ChatSession, input: R, out: &mut W) -> std::io::Result<()>
    where R: AsyncBufRead + Unpin, W: AsyncWrite + Unpin
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == QUIT_COMMAND {
            break;
        }
        let rendered = session.submit(&line).await;
        // The user already sees their own line on the terminal.
        let replies: Vec<ChatMessage> = rendered
            .into_iter()
            .filter(|m| m.role != Role::User)
            .collect();
        print_messages(out, &replies).await?;
    }
    Ok(())
}

async fn print_messages<W: AsyncWrite + Unpin>(
    out: &mut W,
    messages: &[ChatMessage]
) -> std::io::Result<()> {
    for message in messages {
        out.write_all(format!("{}\n", format_message(message)).as_bytes()).await?;
    }
    out.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::persona::PersonaConfig;

    fn offline_session() -> ChatSession {
        let transport = HttpRelayTransport::new(None).unwrap();
        ChatSession::new(PersonaConfig::default(), SessionOptions::default(), Arc::new(transport))
    }

    #[test]
    fn messages_are_prefixed_by_speaker() {
        assert_eq!(format_message(&ChatMessage::user("Hi")), "You: Hi");
        assert_eq!(format_message(&ChatMessage::assistant("Hello!")), "AI: Hello!");
    }

    #[tokio::test]
    async fn print_writes_one_line_per_message() {
        let mut out: Vec<u8> = Vec::new();
        print_messages(&mut out, &[ChatMessage::assistant("a"), ChatMessage::assistant("b")]).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "AI: a\nAI: b\n");
    }

    #[tokio::test]
    async fn quit_stops_reading_further_lines() {
        let mut session = offline_session();
        let mut out: Vec<u8> = Vec::new();

        chat_loop(&mut session, "Hi\n  /quit \nmy name is Alex\n".as_bytes(), &mut out).await.unwrap();

        let fallback = PersonaConfig::default().fallback_reply;
        assert_eq!(String::from_utf8(out).unwrap(), format!("AI: {}\n", fallback));
        assert_eq!(session.context().question_count(), 1);
        assert_eq!(session.context().user_name(), None);
    }

    #[tokio::test]
    async fn loop_ends_at_end_of_input_and_skips_blank_lines() {
        let mut session = offline_session();
        let mut out: Vec<u8> = Vec::new();

        chat_loop(&mut session, "\n   \nmy name is Alex".as_bytes(), &mut out).await.unwrap();

        let output = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "AI: Nice to meet you, Alex! How can I help today?");
        assert_eq!(session.context().user_name(), Some("Alex"));
    }
}
