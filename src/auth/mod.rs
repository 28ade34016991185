//! Authentication Module
//! Mission: Stateless JWT auth with RBAC and brute-force lockout

pub mod api;
pub mod attempts;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod principal;
pub mod roles;
pub mod service;
pub mod user_store;

pub use api::AuthState;
pub use attempts::LoginAttemptTracker;
pub use jwt::TokenProvider;
pub use middleware::auth_middleware;
pub use principal::UserPrincipal;
pub use roles::Role;
pub use service::UserService;
pub use user_store::UserStore;
