pub mod relay;

use crate::cli::RelayArgs;
use std::error::Error;
use std::net::SocketAddr;
use log::{ info, warn, error };

pub use relay::{ build_router, RelayConfig };

pub struct Server {
    addr: String,
    config: RelayConfig,
    args: RelayArgs,
}

impl Server {
    pub fn new(args: RelayArgs) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let config = RelayConfig::from_args(&args)?;

        if config.echo_request_headers {
            warn!("Relay will echo caller header values in empty-body diagnostics.");
        }

        Ok(Self { addr: args.server_addr.clone(), config, args })
    }

    pub async fn run(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        let app = build_router(self.config);

        if self.args.enable_tls {
            let (cert_path, key_path) = match (&self.args.tls_cert_path, &self.args.tls_key_path) {
                (Some(cert), Some(key)) => (cert, key),
                (Some(_), None) | (None, Some(_)) => {
                    error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                    return Err("Missing TLS certificate or key path".into());
                }
                (None, None) => {
                    error!("--enable-tls was set but no certificate/key paths provided.");
                    return Err("TLS enabled without cert/key".into());
                }
            };

            info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);
            // Both ring and aws-lc may be linked; pick one explicitly.
            let _ = rustls::crypto::ring::default_provider().install_default();
            let tls_config = axum_server::tls_rustls::RustlsConfig
                ::from_pem_file(cert_path, key_path).await?;

            info!("Relay listening on: https://{}", addr);
            axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
        } else {
            let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                error!("Failed to bind relay to {}: {}. Try a different port.", addr, e);
                e
            })?;
            info!("Relay listening on: http://{}", addr);
            axum::serve(listener, app.into_make_service()).await?;
        }

        Ok(())
    }
}
