//! The compression engine: preset resolution, backend adapters, candidate
//! validation, per-request orchestration, and batch coordination.

pub mod backends;
pub mod batch;
pub mod exec;
pub mod orchestrator;
pub mod preset;
pub mod validator;

// Re-export commonly used items for convenience
pub use batch::{compress_batch, compress_batch_with_cancel};
pub use exec::CancelToken;
pub use orchestrator::{compress_one, compress_one_cancellable};
pub use preset::resolve;
pub use validator::{validate, RejectReason, Verdict};
