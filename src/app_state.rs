use crate::{config::Config, store::Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::new(&config.database.url).await?;
        store.init().await?;
        Ok(Self { store, config })
    }
}
