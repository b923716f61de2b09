pub mod admin;
pub mod auth;
pub mod blacklist;
pub mod email;
pub mod error;
pub mod guard;
pub mod jwt;
pub mod pg;
pub mod reset;
pub mod store;

pub use admin::AdminService;
pub use auth::AuthService;
pub use blacklist::{MemoryBlacklist, RedisBlacklist, TokenBlacklist};
pub use email::{EmailProvider, MockEmailService, SmtpEmailService};
pub use error::ServiceError;
pub use guard::{is_authorized_admin, is_reserved_admin_group_name};
pub use jwt::{AccessTokenClaims, JwtService, RefreshTokenClaims};
pub use pg::PgStore;
pub use reset::{decode_uid, encode_uid, ResetTokenGenerator};
pub use store::{seed_permissions, MemoryStore, Store};
