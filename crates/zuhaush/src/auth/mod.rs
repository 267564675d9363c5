//! Authentication: password hashing, JWT sessions per audience, one-time codes and the
//! request extractors that turn a bearer token into a principal.

pub mod otp;
pub mod password;
pub mod principal;
pub mod repository;
pub mod tokens;

#[cfg(test)]
mod tests;

pub use otp::{OtpDispatch, OtpPurpose, OtpService};
pub use password::{hash_password, verify_password};
pub use principal::{AdminPrincipal, AnyPrincipal, Authenticator, BuilderPrincipal, UserPrincipal};
pub use repository::{OtpThrottle, StoredToken, TokenRepository};
pub use tokens::{Audience, Claims, IssuedToken, TokenKind, TokenPair, TokenService};
