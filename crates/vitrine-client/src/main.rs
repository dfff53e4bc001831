use vitrine_client::config::ClientConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vitrine_client::init_tracing();
    vitrine_client::run(ClientConfig::from_env()).await
}
