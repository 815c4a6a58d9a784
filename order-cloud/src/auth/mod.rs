//! 租户连接的认证中间件

pub mod tenant_auth;

pub use tenant_auth::{TenantContext, tenant_auth_middleware};
