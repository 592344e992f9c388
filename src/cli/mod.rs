pub mod repl;

use clap::{ Args as ClapArgs, Parser, Subcommand };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the relay that forwards chat requests upstream with the server-held key
    Serve(RelayArgs),
    /// Chat with the assistant from the terminal through a running relay
    Chat(ChatArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RelayArgs {
    /// Host address and port for the relay to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:8787")]
    pub server_addr: String,

    /// Secret credential attached to every upstream request as a bearer token.
    #[arg(long, env = "OPENAI_API_KEY", default_value = "", hide_env_values = true)]
    pub openai_api_key: String,

    /// Upstream chat-completion endpoint.
    #[arg(long, env = "UPSTREAM_URL", default_value = "https://api.openai.com/v1/chat/completions")]
    pub upstream_url: String,

    /// Model forced onto every upstream request.
    #[arg(long, env = "CHAT_MODEL", default_value = "gpt-4o")]
    pub chat_model: String,

    /// max_tokens used when the caller does not send one.
    #[arg(long, env = "RELAY_DEFAULT_MAX_TOKENS", default_value = "300")]
    pub default_max_tokens: u64,

    /// Echo caller header values in empty-body diagnostics. Debug only: this leaks
    /// whatever the caller sent, including forwarded credentials.
    #[arg(long, env = "RELAY_ECHO_HEADERS", default_value = "false")]
    pub echo_request_headers: bool,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ChatArgs {
    /// URL of the relay (e.g., https://my-relay.example.com/)
    #[arg(long, env = "RELAY_URL")]
    pub relay_url: Option<String>,

    /// Model name sent with each request.
    #[arg(long, env = "CHAT_MODEL", default_value = "gpt-4o")]
    pub chat_model: String,

    #[arg(long, env = "CHAT_MAX_TOKENS", default_value = "500")]
    pub max_tokens: u32,

    #[arg(long, env = "CHAT_TEMPERATURE", default_value = "0.7")]
    pub temperature: f32,

    /// Path to a JSON persona file overriding the built-in prompt and canned replies.
    #[arg(long, env = "PERSONA_PATH")]
    pub persona_path: Option<String>,
}
