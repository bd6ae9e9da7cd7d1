use diesel::r2d2::PoolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Could not get connection from pool: {0}")]
    Pool(#[from] PoolError),
    #[error("Query failed: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("Could not build connection pool: {0}")]
    PoolBuild(String),
    #[error("Group {0} already exists")]
    GroupExists(String),
}
