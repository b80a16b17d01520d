use anyhow::Result;

use super::initdb::init_database;
use super::serve;
use crate::config::initialize_app_state_with_url;

/// Apply pending migrations, then serve on the same database. The single
/// command a container entrypoint needs.
pub async fn migrate_and_serve(database_url: &str, bind_address: &str) -> Result<()> {
    init_database(database_url).await?;
    let state = initialize_app_state_with_url(database_url).await?;
    serve::run(state, bind_address).await
}
