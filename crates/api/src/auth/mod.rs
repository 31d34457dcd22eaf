//! Bearer-token verification. Tokens are issued by the identity provider.

pub mod jwt;
