pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod models;
pub mod server;

use cli::{ Args, ChatArgs, Command, RelayArgs };
use log::info;
use server::Server;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    match args.command {
        Command::Serve(relay_args) => serve(relay_args).await,
        Command::Chat(chat_args) => chat(chat_args).await,
    }
}

async fn serve(args: RelayArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Relay Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Upstream URL: {}", args.upstream_url);
    info!("Chat Model: {}", args.chat_model);
    info!("Default Max Tokens: {}", args.default_max_tokens);
    info!("Credential Set: {}", !args.openai_api_key.trim().is_empty());
    info!("Echo Request Headers: {}", args.echo_request_headers);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("---------------------------");

    let server = Server::new(args)?;
    server.run().await
}

async fn chat(args: ChatArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Chat Configuration ---");
    info!("Relay URL: {}", args.relay_url.as_deref().unwrap_or("(not set)"));
    info!("Chat Model: {}", args.chat_model);
    info!("Max Tokens: {}", args.max_tokens);
    info!("Persona Path: {}", args.persona_path.as_deref().unwrap_or("(built-in)"));
    info!("--------------------------");

    cli::repl::run_chat(args).await
}
