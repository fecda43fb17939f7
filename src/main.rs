use std::sync::Arc;

use anyhow::Context;
use semsearch::{
    CachedEmbedding, DatasetSchema, LocalVectorStore, OpenAiEmbedding, SearchPipeline,
    ServiceConfig, XlsxDataset, run_server,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServiceConfig::from_env().context("invalid configuration")?;

    let provider = CachedEmbedding::new(
        OpenAiEmbedding::from_env()
            .context("embedding provider setup failed")?
            .with_model(config.model.clone())
            .with_dimensions(config.dimensions),
    );
    let store = LocalVectorStore::open(&config.data_dir).context("cannot open vector store")?;
    let dataset = XlsxDataset::new(
        &config.dataset_path,
        DatasetSchema {
            id_column: config.id_column.clone(),
            indexed_fields: config.indexed_fields.clone(),
        },
    );

    let pipeline = SearchPipeline::builder()
        .config(config)
        .provider(Arc::new(provider))
        .store(Arc::new(store))
        .dataset(Arc::new(dataset))
        .build()?;

    run_server(Arc::new(pipeline)).await?;
    Ok(())
}
