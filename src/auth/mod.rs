//! Authentication Module
//! Mission: Credentials, bearer tokens and role-based access control

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod policy;

pub use jwt::{JwtHandler, TokenError};
pub use middleware::auth_middleware;
pub use models::{Claims, User, UserRole};
pub use password::PasswordHasher;
pub use policy::{authorize, Decision, Operation, ResourceKind, ScopeFilter};
