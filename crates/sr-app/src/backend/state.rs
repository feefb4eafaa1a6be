use crate::config::AppConfig;
use crate::db::ProjectDatabase;
use crate::pipeline::Pipeline;
use crate::render_client::RenderPodClient;
use crate::storage::HttpObjectStore;

pub struct AppState {
    pub pipeline: Pipeline,
}

impl AppState {
    pub async fn new(conf: &AppConfig) -> anyhow::Result<Self> {
        let render = RenderPodClient::new(conf.render_api_url.clone(), conf.render_api_token.clone());
        let store = HttpObjectStore::new(
            conf.storage_api_url.clone(),
            conf.storage_public_url.clone(),
            conf.storage_bucket.clone(),
            conf.storage_token.clone(),
        );
        let db = ProjectDatabase::new(conf.db_path.clone(), conf.projects_table.clone()).await?;

        Ok(Self {
            pipeline: Pipeline::new(
                Box::new(render),
                Box::new(store),
                Box::new(db),
                conf.defaults.clone(),
            ),
        })
    }
}
