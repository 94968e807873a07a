//! cw-extract - Source readers and the Bronze raw archive
//!
//! Readers pull every configured source table into memory with its native
//! column names; the archive persists each extract verbatim as an immutable
//! parquet snapshot and can replay a snapshot later.

pub mod archive;
pub mod error;
pub mod reader;
pub mod table;

pub use archive::{new_stamp, ArchiveManifest, ArchiveReader, ArchiveSummary, ArchiveWriter};
pub use error::{ExtractError, ExtractResult};
pub use reader::{ExtractOutput, SourceReader};
pub use table::RawTable;
