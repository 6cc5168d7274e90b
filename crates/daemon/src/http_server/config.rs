use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct Config {
    /// Address for the HTTP server to listen on
    pub listen_addr: SocketAddr,
    /// Level request traces are emitted at
    pub log_level: tracing::Level,
}
