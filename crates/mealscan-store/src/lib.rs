//! mealscan-store
//!
//! [`RecordStore`] implementations: a LanceDB table and an in-memory map.
//! [`open_store`] never fails; an unreachable store means the pipeline runs
//! disconnected and saves are reported as unavailable.
use tracing::{info, warn};

use mealscan_core::config::{expand_path, StoreBackend, StoreSettings};
use mealscan_core::traits::RecordStore;

pub mod lance;
pub mod memory;
pub mod schema;
pub mod table;

pub use lance::LanceRecordStore;
pub use memory::MemoryRecordStore;

pub async fn open_store(settings: &StoreSettings) -> Option<Box<dyn RecordStore>> {
    match settings.backend {
        StoreBackend::None => {
            info!("record store disabled");
            None
        }
        StoreBackend::Memory => Some(Box::new(MemoryRecordStore::new())),
        StoreBackend::Lance => {
            let uri = expand_path(&settings.uri);
            match LanceRecordStore::open(&uri.to_string_lossy(), &settings.table).await {
                Ok(store) => Some(Box::new(store)),
                Err(e) => {
                    warn!(uri = %uri.display(), error = %e, "record store unavailable, running disconnected");
                    None
                }
            }
        }
    }
}
