//! Route paths.

pub const GET_HEALTH: &str = "/health";
pub const POST_AUTH_REGISTER: &str = "/auth/register";
pub const POST_AUTH_LOGIN: &str = "/auth/login";
pub const POST_AUTH_REFRESH: &str = "/auth/refresh";
pub const POST_AUTH_LOGOUT_ALL: &str = "/auth/logout-all";
pub const POST_AUTH_CHANGE_PASSWORD: &str = "/auth/change-password";
pub const GET_ME: &str = "/me";
