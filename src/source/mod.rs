// * Record Loader: upstream payload, mapping layer and record sources

pub mod loader;
pub mod mapping;
pub mod upstream;

pub use loader::{
    load_records, map_users, FileRecordSource, HttpRecordSource, RecordSource, SourceError,
    SourceFuture, StaticRecordSource,
};
pub use mapping::CustomerMapper;
pub use upstream::{PayloadError, UpstreamPayload, UpstreamUser, ValidUser};
