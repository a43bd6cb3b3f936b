//! Data Access
//!
//! The boundary between stores and the remote API. Requests go out
//! through a [`Transport`]; responses come back as domain values or a
//! single normalized [`AccessError`].
//!
//! ```text
//! DomainStore ──► DataAccess ──► Transport ──► HTTP
//!                     │
//!                     └── handle_error(status, body) ──► AccessError
//! ```

mod domain;
mod error;
mod http;
mod model;
mod transport;

pub use domain::{DataAccess, DomainDataAccess};
pub use error::{handle_error, AccessError};
pub use http::HttpTransport;
pub use model::{to_domain_entity, DomainApiResponse, DomainChanges, DomainEntity, NewDomainEntity};
pub use transport::{Method, Transport, TransportError, TransportRequest, TransportResponse};
