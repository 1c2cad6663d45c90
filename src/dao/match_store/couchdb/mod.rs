mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::CouchDaoError;
pub use store::CouchMatchStore;

use crate::dao::storage::StorageError;

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        match err {
            CouchDaoError::DecodeResponse { .. } => StorageError::corrupt(err.to_string(), err),
            _ => StorageError::unavailable(err.to_string(), err),
        }
    }
}
