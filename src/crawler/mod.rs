//! Crawler module: the tick loop and everything it drives
//!
//! - `registry`: task types and storage dialects resolved from config keys
//! - `fetcher`: bounded-concurrency batch fetching
//! - `scheduler`: selects due work each tick and dispatches it
//! - `supervisor`: restarts the scheduler after a failure

mod fetcher;
mod registry;
mod scheduler;
mod supervisor;

pub use fetcher::{
    build_http_client, FetchJob, FetchOutcome, PageFetcher, ReqwestTransport, Transport,
    TransportError, TransportResponse, DEFAULT_CONCURRENCY_LIMIT,
};
pub use registry::{StorageDialect, TaskKind};
pub use scheduler::{TaskScheduler, TickReport};
pub use supervisor::{run_session, supervise};
