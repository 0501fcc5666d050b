pub mod identity;
pub mod store;

use std::sync::Arc;

use docchat_llm::ResponseGenerator;
use docchat_pdf::TextExtractor;

pub use identity::{AuthenticatedUser, IdentityProvider, SupabaseIdentity};
pub use store::TurnStore;

/// Service handles shared by every request handler. Built once by the
/// process entry point and cloned into each request.
#[derive(Clone)]
pub struct Data {
    pub identity: Arc<dyn IdentityProvider>,
    pub turns: Arc<dyn TurnStore>,
    pub generator: ResponseGenerator,
    pub extractor: Arc<dyn TextExtractor>,
}
