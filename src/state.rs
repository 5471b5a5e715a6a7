use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::media::{FsMediaStore, MediaStore};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub media: Arc<dyn MediaStore>,
}

impl AppState {
    /// State with uploads kept on disk under the configured uploads path.
    pub fn new(db: DbPool, config: Config) -> Self {
        let media = Arc::new(FsMediaStore::new(config.uploads_path()));
        Self { db, config, media }
    }
}
