//! engine/mod.rs
//! Sessions, the worker-pool dispatcher and the stream facade built on it.

pub mod types;
pub mod parallelism;
pub mod session;
pub mod dispatcher;
pub mod stream;
mod worker;

pub use types::{Continuation, Job, JobKind, JobResult, Status};
pub use parallelism::ParallelismProfile;
pub use session::CodecSession;
pub use dispatcher::{Dispatcher, SessionHandle};
pub use stream::{CodecStream, EventSink, StreamEvent};
