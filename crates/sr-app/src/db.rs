pub mod project;

use std::path::PathBuf;

use async_trait::async_trait;
use log::info;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

use crate::db::project::{Project, ProjectRecord};
use crate::error::AppError;

const SYSTEM: &str = "metadata store";

#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Upsert the record keyed by project name. Last write wins; there is no
    /// optimistic concurrency control.
    async fn upsert_project(&self, project: Project) -> Result<(), AppError>;
}

/// Embedded SurrealDB (RocksDB backend) holding one record per project.
#[derive(Debug, Clone)]
pub struct ProjectDatabase {
    db: Surreal<Db>,
    table: String,
}

impl ProjectDatabase {
    pub async fn new(db_path: PathBuf, table: String) -> anyhow::Result<Self> {
        info!("Setting up project database at {}", db_path.display());

        std::fs::create_dir_all(&db_path)?;

        let db = Surreal::new::<RocksDb>(db_path).await?;
        db.use_ns("speedrender").use_db("projects").await?;

        Ok(Self { db, table })
    }
}

#[async_trait]
impl MetadataStore for ProjectDatabase {
    async fn upsert_project(&self, project: Project) -> Result<(), AppError> {
        let _: Option<ProjectRecord> = self
            .db
            .upsert((self.table.as_str(), project.project_name.clone()))
            .content(project)
            .await
            .map_err(|e| AppError::upstream(SYSTEM, e.to_string()))?;

        Ok(())
    }
}
