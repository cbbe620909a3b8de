//! Entity structs for every persisted RTM row.
//!
//! Each entity maps to one table in the libSQL store (see `rtm-db` migrations).
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` for JSON
//! output and schema validation.

mod api_endpoint;
mod audit;
mod component;
mod implementation;
mod project;
mod requirement;
mod test_artifact;

pub use api_endpoint::ApiEndpoint;
pub use audit::AuditEntry;
pub use component::Component;
pub use implementation::ImplementationRecord;
pub use project::Project;
pub use requirement::Requirement;
pub use test_artifact::{CoverageLink, TestCase, TestFile};
