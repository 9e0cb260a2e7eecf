#![allow(dead_code)]

use std::time::Duration;

use figment::{
    providers::{Format, Yaml},
    Figment,
};
use scigateway::config::{Config, ConfigV1};
use scigateway::state::{GatewayState, GatewayStore};

pub fn config_from_yaml(yaml: &str) -> ConfigV1 {
    let config: Config = Figment::new()
        .merge(Yaml::string(yaml))
        .extract()
        .expect("failed to parse test config");
    match config {
        Config::ConfigV1(c) => c,
    }
}

pub fn jwt_settings(auth_url: &str) -> ConfigV1 {
    config_from_yaml(&format!(
        r#"
version: "1.0.0"
auth_provider: jwt
auth_url: {auth_url}
logging:
  level: debug
  format: console
"#
    ))
}

/// Polls the store until `condition` holds, for up to a second.
pub async fn wait_for<F>(store: &GatewayStore, condition: F) -> GatewayState
where
    F: Fn(&GatewayState) -> bool,
{
    for _ in 0..100 {
        let state = store.state().expect("state lock poisoned");
        if condition(&state) {
            return state;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within a second");
}
