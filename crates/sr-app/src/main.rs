mod backend;
mod config;
mod db;
mod error;
mod pipeline;
mod render_client;
mod storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let conf = config::AppConfig::load()?;
    backend::serve(conf).await?;

    Ok(())
}
