use llm_relay::config::{
    CommonConfig, GenerationConfig, RelayConfig, SecurityConfig, UpstreamConfig,
};
use llm_relay::services::providers::TextProvider;
use llm_relay::startup::Application;
use std::sync::Arc;

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

pub fn test_config() -> RelayConfig {
    RelayConfig {
        common: CommonConfig { port: 0 },
        upstream: UpstreamConfig {
            api_key: "test-api-key".to_string(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            http_referer: None,
            system_prompt: None,
            timeout_secs: 5,
        },
        generation: GenerationConfig {
            default_model: "gpt-3.5-turbo".to_string(),
            default_max_tokens: 1000,
            max_tokens_limit: 4000,
            default_temperature: 0.7,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
    }
}

impl TestApp {
    pub async fn spawn(provider: Arc<dyn TextProvider>) -> Self {
        Self::spawn_with_config(test_config(), provider).await
    }

    pub async fn spawn_with_config(config: RelayConfig, provider: Arc<dyn TextProvider>) -> Self {
        let app = Application::build_with_provider(config, provider)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint.
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp { address, port }
    }
}
