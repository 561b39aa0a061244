pub mod snapshot_parser;
pub mod snapshot_serializer;

pub use snapshot_parser::{CodecError, SnapshotDocument, parse_document, parse_snapshot};
pub use snapshot_serializer::serialize_snapshot;
