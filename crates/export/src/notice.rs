//! User-visible export notices.
//!
//! The export view listens on an unbounded channel. A closed or missing
//! receiver never affects the pipeline.

use tokio::sync::mpsc;

use quoteprint_core::ExportId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportNotice {
    Started {
        export_id: ExportId,
    },
    Completed {
        export_id: ExportId,
        file_name: String,
        page_count: usize,
    },
    /// The single failure alert of a failed export.
    Failed {
        export_id: ExportId,
        message: String,
    },
}

pub type NoticeReceiver = mpsc::UnboundedReceiver<ExportNotice>;

#[derive(Debug, Clone, Default)]
pub struct NoticeSender {
    tx: Option<mpsc::UnboundedSender<ExportNotice>>,
}

impl NoticeSender {
    /// Sender/receiver pair for one export view.
    pub fn channel() -> (Self, NoticeReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sender that drops every notice.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn send(&self, notice: ExportNotice) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(notice);
        }
    }
}
