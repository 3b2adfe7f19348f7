//! `quoteprint-export` — runs one billing document through the rendering
//! pipeline and hands the finished PDF to a sink.
//!
//! ## Components
//!
//! - `ExportOrchestrator`: the export state machine with its single in-flight guard
//! - `ExportConfig`: capture/output settings, overridable from the environment
//! - `DocumentSink`: where finished documents go (`FileSink`, `MemorySink`)
//! - `ExportNotice`: what the export view is told

pub mod config;
pub mod error;
pub mod naming;
pub mod notice;
pub mod orchestrator;
pub mod sink;
pub mod state;

pub use config::ExportConfig;
pub use error::{ExportError, FAILURE_MESSAGE, FailureKind};
pub use naming::output_file_name;
pub use notice::{ExportNotice, NoticeReceiver, NoticeSender};
pub use orchestrator::{ExportOrchestrator, ExportOutcome, ExportRequest, Transition};
pub use sink::{DocumentSink, EmittedFile, FileSink, MemorySink, SinkError};
pub use state::ExportState;
