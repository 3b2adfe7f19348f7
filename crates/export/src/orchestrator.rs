//! Export orchestration.
//!
//! One export at a time runs the chain stage -> capture -> paginate ->
//! assemble -> emit. The staged node is owned by the running export and is
//! released on every exit path, including when the export future is dropped
//! mid-capture.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{Span, debug, error, field, info, instrument, warn};

use quoteprint_core::ExportId;
use quoteprint_invoicing::{DocumentLayout, DocumentType, InvoiceDocument};
use quoteprint_render::{
    CaptureEngine, CaptureError, CaptureHints, DocumentAssembler, OffscreenRenderHost, Paginator,
    render_document,
};

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::naming::output_file_name;
use crate::notice::{ExportNotice, NoticeSender};
use crate::sink::{DocumentSink, EmittedFile};
use crate::state::ExportState;

/// Snapshot handed to one export. Later edits to the form do not affect it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub document: InvoiceDocument,
    pub document_type: DocumentType,
}

impl ExportRequest {
    pub fn new(document: InvoiceDocument, document_type: DocumentType) -> Self {
        Self {
            document,
            document_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub export_id: ExportId,
    pub file_name: String,
    pub page_count: usize,
    pub emitted: EmittedFile,
}

/// One recorded state change.
pub type Transition = (ExportState, ExportState);

#[derive(Debug, Default)]
struct Machine {
    state: ExportState,
    transitions: Vec<Transition>,
}

impl Machine {
    fn set(&mut self, next: ExportState) {
        let from = self.state;
        debug_assert!(from.can_transition_to(next), "{from} -> {next}");
        self.state = next;
        self.transitions.push((from, next));
        debug!(from = %from, to = %next, "export state changed");
    }
}

fn lock(machine: &Mutex<Machine>) -> MutexGuard<'_, Machine> {
    machine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single in-flight guard. Returns the machine to `Idle` when dropped.
struct InFlight<'a> {
    machine: &'a Mutex<Machine>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut machine = lock(self.machine);
        if machine.state != ExportState::Idle {
            machine.set(ExportState::Idle);
        }
    }
}

pub struct ExportOrchestrator<C, A, S> {
    host: OffscreenRenderHost,
    capture: C,
    assembler: A,
    sink: S,
    paginator: Paginator,
    config: ExportConfig,
    notices: NoticeSender,
    machine: Mutex<Machine>,
}

impl<C, A, S> ExportOrchestrator<C, A, S>
where
    C: CaptureEngine,
    A: DocumentAssembler,
    S: DocumentSink,
{
    pub fn new(capture: C, assembler: A, sink: S, config: ExportConfig) -> Self {
        Self {
            host: OffscreenRenderHost::new(),
            capture,
            assembler,
            sink,
            paginator: Paginator::new().with_background(config.background),
            config,
            notices: NoticeSender::disabled(),
            machine: Mutex::new(Machine::default()),
        }
    }

    pub fn with_host(mut self, host: OffscreenRenderHost) -> Self {
        self.host = host;
        self
    }

    pub fn with_notices(mut self, notices: NoticeSender) -> Self {
        self.notices = notices;
        self
    }

    pub fn host(&self) -> &OffscreenRenderHost {
        &self.host
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn state(&self) -> ExportState {
        lock(&self.machine).state
    }

    /// Every state change since construction, oldest first.
    pub fn transitions(&self) -> Vec<Transition> {
        lock(&self.machine).transitions.clone()
    }

    fn transition(&self, next: ExportState) {
        lock(&self.machine).set(next);
    }

    fn begin(&self) -> Result<InFlight<'_>, ExportError> {
        let mut machine = lock(&self.machine);
        if machine.state != ExportState::Idle {
            return Err(ExportError::Busy);
        }
        machine.set(ExportState::Staging);
        Ok(InFlight {
            machine: &self.machine,
        })
    }

    /// Run one export to completion.
    ///
    /// Rejected with [`ExportError::Busy`] while another export is in flight;
    /// the running export is unaffected and no notice is sent. Any other error
    /// moves the machine through `Failed` back to `Idle` and sends exactly one
    /// failure notice. Nothing reaches the sink unless assembly succeeded.
    #[instrument(
        skip_all,
        fields(
            export_id = tracing::field::Empty,
            document_type = ?request.document_type
        )
    )]
    pub async fn export(&self, request: ExportRequest) -> Result<ExportOutcome, ExportError> {
        let _in_flight = self.begin().inspect_err(|_| {
            warn!("export rejected, another export is in flight");
        })?;

        let export_id = ExportId::new();
        Span::current().record("export_id", field::display(export_id));
        info!("export started");
        self.notices.send(ExportNotice::Started { export_id });

        match self.run(export_id, &request).await {
            Ok(outcome) => {
                self.transition(ExportState::Done);
                info!(
                    file = %outcome.file_name,
                    pages = outcome.page_count,
                    "export finished"
                );
                self.notices.send(ExportNotice::Completed {
                    export_id,
                    file_name: outcome.file_name.clone(),
                    page_count: outcome.page_count,
                });
                Ok(outcome)
            }
            Err(e) => {
                self.transition(ExportState::Failed);
                error!(error = %e, "export failed");
                self.notices.send(ExportNotice::Failed {
                    export_id,
                    message: e.user_message().to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        export_id: ExportId,
        request: &ExportRequest,
    ) -> Result<ExportOutcome, ExportError> {
        let geometry = self.config.geometry;
        let layout = DocumentLayout::build(&request.document, request.document_type);
        let rendered = render_document(&layout);
        let staged = self.host.stage(&rendered, geometry)?;

        self.transition(ExportState::Capturing);
        let hints = CaptureHints {
            background: self.config.background,
            ..CaptureHints::for_page_width(staged.width_px(), self.config.capture_scale)
        };
        let timeout = self.config.capture_timeout;
        let bitmap = tokio::time::timeout(timeout, self.capture.rasterize(&staged, &hints))
            .await
            .map_err(|_| CaptureError::Timeout(timeout))??;
        let expected = hints.expected_bitmap_width();
        if bitmap.width() != expected {
            return Err(CaptureError::WidthMismatch {
                expected,
                actual: bitmap.width(),
            }
            .into());
        }

        self.transition(ExportState::Paginating);
        let pages = self
            .paginator
            .paginate(&bitmap, geometry.width_px(), geometry.height_px())?;
        drop(bitmap);
        debug!(pages = pages.len(), "capture paginated");

        self.transition(ExportState::Assembling);
        let assembled = self.assembler.assemble(&pages, geometry).await?;

        let file_name = output_file_name(
            request.document_type,
            &request.document.header.document_number,
        );
        let emitted = self.sink.emit(&file_name, assembled.bytes).await?;
        staged.release();

        Ok(ExportOutcome {
            export_id,
            file_name,
            page_count: assembled.page_count,
            emitted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::sink::{FileSink, MemorySink, SinkError};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use quoteprint_invoicing::{LineItem, PageGeometry};
    use quoteprint_render::{
        AssembledDocument, AssemblyError, Bitmap, BlockRasterizer, PageImage, PaginationError,
        PdfAssembler, StagedNode,
    };
    use ExportState::*;

    fn request(items: usize) -> ExportRequest {
        let today = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let mut doc = InvoiceDocument::new(today);
        doc.header.document_number = "INV-7".into();
        for i in 0..items {
            doc.push_item(LineItem::new(Some(today), format!("item {i}"), "2", "50.00"));
        }
        ExportRequest::new(doc, DocumentType::Invoice)
    }

    fn config() -> ExportConfig {
        ExportConfig::default().with_capture_scale(1)
    }

    struct NarrowEngine;

    #[async_trait]
    impl CaptureEngine for NarrowEngine {
        async fn rasterize(
            &self,
            node: &StagedNode,
            _hints: &CaptureHints,
        ) -> Result<Bitmap, CaptureError> {
            Ok(Bitmap::new(node.width_px() - 1, node.height_px()))
        }
    }

    /// Right width, no rows.
    struct FlatEngine;

    #[async_trait]
    impl CaptureEngine for FlatEngine {
        async fn rasterize(
            &self,
            _node: &StagedNode,
            hints: &CaptureHints,
        ) -> Result<Bitmap, CaptureError> {
            Ok(Bitmap::new(hints.expected_bitmap_width(), 0))
        }
    }

    struct FailingAssembler;

    #[async_trait]
    impl DocumentAssembler for FailingAssembler {
        async fn assemble(
            &self,
            _pages: &[PageImage],
            _geometry: PageGeometry,
        ) -> Result<AssembledDocument, AssemblyError> {
            Err(AssemblyError::Engine("disk full".into()))
        }
    }

    #[tokio::test]
    async fn successful_export_walks_every_state() {
        let orchestrator =
            ExportOrchestrator::new(BlockRasterizer::new(), PdfAssembler::new(), MemorySink::new(), config());
        let outcome = orchestrator.export(request(3)).await.unwrap();

        assert_eq!(outcome.file_name, "Invoice_INV-7.pdf");
        assert_eq!(outcome.page_count, 1);
        assert_eq!(
            orchestrator.transitions(),
            vec![
                (Idle, Staging),
                (Staging, Capturing),
                (Capturing, Paginating),
                (Paginating, Assembling),
                (Assembling, Done),
                (Done, Idle),
            ]
        );
        assert_eq!(orchestrator.host().stats().released, 1);
        assert_eq!(orchestrator.sink().len(), 1);
    }

    #[tokio::test]
    async fn width_mismatch_is_a_capture_failure() {
        let orchestrator =
            ExportOrchestrator::new(NarrowEngine, PdfAssembler::new(), MemorySink::new(), config());
        let err = orchestrator.export(request(1)).await.unwrap_err();

        assert!(matches!(
            err,
            ExportError::Capture(CaptureError::WidthMismatch { .. })
        ));
        assert_eq!(orchestrator.state(), Idle);
        assert!(orchestrator.transitions().contains(&(Capturing, Failed)));
        assert!(orchestrator.sink().is_empty());
        assert_eq!(orchestrator.host().stats().attached, 0);
    }

    #[tokio::test]
    async fn assembly_failure_emits_nothing_and_notifies_once() {
        let (notices, mut rx) = NoticeSender::channel();
        let orchestrator = ExportOrchestrator::new(
            BlockRasterizer::new(),
            FailingAssembler,
            MemorySink::new(),
            config(),
        )
        .with_notices(notices);

        let err = orchestrator.export(request(2)).await.unwrap_err();
        assert!(matches!(err, ExportError::Assembly(_)));
        assert!(orchestrator.sink().is_empty());
        assert_eq!(orchestrator.transitions().last(), Some(&(Failed, Idle)));

        assert!(matches!(rx.try_recv(), Ok(ExportNotice::Started { .. })));
        match rx.try_recv() {
            Ok(ExportNotice::Failed { message, .. }) => {
                assert_eq!(message, crate::error::FAILURE_MESSAGE)
            }
            other => panic!("expected failure notice, got {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn empty_capture_fails_while_paginating() {
        let (notices, mut rx) = NoticeSender::channel();
        let orchestrator =
            ExportOrchestrator::new(FlatEngine, PdfAssembler::new(), MemorySink::new(), config())
                .with_notices(notices);

        let err = orchestrator.export(request(1)).await.unwrap_err();
        assert!(matches!(
            err,
            ExportError::Pagination(PaginationError::EmptyBitmap { height: 0, .. })
        ));
        assert_eq!(err.kind(), Some(FailureKind::Pagination));
        assert_eq!(
            orchestrator.transitions(),
            vec![
                (Idle, Staging),
                (Staging, Capturing),
                (Capturing, Paginating),
                (Paginating, Failed),
                (Failed, Idle),
            ]
        );
        let stats = orchestrator.host().stats();
        assert_eq!((stats.staged, stats.released, stats.attached), (1, 1, 0));
        assert!(orchestrator.sink().is_empty());

        assert!(matches!(rx.try_recv(), Ok(ExportNotice::Started { .. })));
        assert!(matches!(rx.try_recv(), Ok(ExportNotice::Failed { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn sink_failure_counts_as_assembly_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir");
        let (notices, mut rx) = NoticeSender::channel();
        let orchestrator = ExportOrchestrator::new(
            BlockRasterizer::new(),
            PdfAssembler::new(),
            FileSink::new(&missing),
            config(),
        )
        .with_notices(notices);

        let err = orchestrator.export(request(2)).await.unwrap_err();
        assert!(matches!(err, ExportError::Sink(SinkError::Io(_))));
        assert_eq!(err.kind(), Some(FailureKind::Assembly));
        assert!(orchestrator.transitions().contains(&(Assembling, Failed)));
        assert_eq!(orchestrator.state(), Idle);
        assert_eq!(orchestrator.host().stats().released, 1);
        assert!(!missing.exists());

        assert!(matches!(rx.try_recv(), Ok(ExportNotice::Started { .. })));
        match rx.try_recv() {
            Ok(ExportNotice::Failed { message, .. }) => {
                assert_eq!(message, crate::error::FAILURE_MESSAGE)
            }
            other => panic!("expected failure notice, got {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn orchestrator_is_reusable_after_failure() {
        let orchestrator =
            ExportOrchestrator::new(BlockRasterizer::new(), FailingAssembler, MemorySink::new(), config());
        orchestrator.export(request(1)).await.unwrap_err();
        orchestrator.export(request(1)).await.unwrap_err();
        assert_eq!(orchestrator.host().stats().staged, 2);
        assert_eq!(orchestrator.host().stats().released, 2);
    }
}
