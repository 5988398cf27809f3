use std::net::SocketAddr;

use serde::Deserialize;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod web;

#[derive(Debug, Clone, Deserialize)]
struct Configuration {
    #[serde(default = "default_listen")]
    listen: SocketAddr,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

#[tokio::main]
async fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let path = std::env::var("CONFIG_FILE").unwrap_or("config.yaml".to_string());
    let config: Configuration = match std::fs::File::open(&path) {
        Ok(config_file) => serde_yaml::from_reader(config_file)
            .unwrap_or_else(|err| panic!("Unable to parse the configuration file {}: {}", &path, err)),
        Err(_) => Configuration::default(),
    };
    debug!(config=?config);

    let chart_client = chart_client::ChartClient::new().expect("Unable to create chart client");

    web::run_web_app(chart_client, config.listen)
        .await
        .expect("Web server exited");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_configuration_uses_defaults() {
        let config: Configuration = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.listen, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn listen_address_is_configurable() {
        let config: Configuration = serde_yaml::from_str("listen: 127.0.0.1:8080").unwrap();
        assert_eq!(config.listen, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
    }
}
