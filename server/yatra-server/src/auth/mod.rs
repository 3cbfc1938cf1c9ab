pub mod password;
pub mod rbac;
pub mod tokens;

pub use rbac::{permissions, RoleCode, UserType};
pub use tokens::{IssuedToken, TokenClaims, TokenService, TokenSubject};
