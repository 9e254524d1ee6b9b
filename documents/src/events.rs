//! Document events for external indexing.

use crate::document::DocState;
use gavel_types::DocId;

/// Events emitted by the [`DocumentController`](crate::DocumentController).
#[derive(Clone, Debug)]
pub enum DocumentEvent {
    StateChanged {
        doc: DocId,
        from: DocState,
        to: DocState,
    },
    /// The `onDocumentEstablished` surface: every party signed in time.
    Established { doc: DocId },
    DealCleared { doc: DocId, deal: u16 },
    DealClosed { doc: DocId, deal: u16 },
    DealTerminated { doc: DocId, deal: u16 },
}
