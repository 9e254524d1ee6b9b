//! Proposal gate backed by the document controller.

use crate::targets::Shared;
use gavel_documents::{DealState, DocState, DocumentController};
use gavel_motions::ProposalGate;
use gavel_types::ContentsRef;

/// Blocks motions about a document until the document is established and
/// none of its open deals carry unresolved priority claims. Motions about
/// bundled actions pass through untouched.
pub struct DocumentGate {
    controller: Shared<DocumentController>,
}

impl DocumentGate {
    pub fn new(controller: Shared<DocumentController>) -> Self {
        Self { controller }
    }
}

impl ProposalGate for DocumentGate {
    fn is_blocked(&self, contents: &ContentsRef) -> bool {
        let ContentsRef::Document(doc) = contents else {
            return false;
        };
        let controller = self.controller.borrow();
        let Ok(document) = controller.document(doc) else {
            return true;
        };
        // Bound to a local so the iterator borrowing the controller guard is
        // dropped before the tail expression.
        let unresolved_claims = document
            .deals()
            .any(|deal| deal.state == DealState::Open && !deal.claims().is_empty());
        document.state != DocState::Established || unresolved_claims
    }
}
