//! `sitecart-auth`: authentication/authorization boundary for staff dashboards.
//!
//! Decoupled from HTTP and storage: the API layer validates a bearer token
//! through [`JwtValidator`], then checks [`Permission`]s derived from roles.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, CommandAuthorization, Principal, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use permissions::Permission;
pub use principal::{PrincipalId, TenantMembership};
pub use roles::{Role, permissions_for_roles};
