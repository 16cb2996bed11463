//! SurrealDB repository implementations.

mod organisation;

pub use organisation::SurrealOrganisationRepository;
