//! Authentication: JWT verification, revocation, middleware

pub mod jwt;
pub mod middleware;
pub mod revocation;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{CurrentUserExt, require_auth, require_manager, require_staff};
pub use revocation::RevocationStore;
