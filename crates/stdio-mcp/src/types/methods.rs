//! Method names used on the wire.

pub const INITIALIZE: &str = "initialize";
pub const PING: &str = "ping";

pub const TOOLS_LIST: &str = "tools/list";
pub const TOOLS_CALL: &str = "tools/call";

pub const RESOURCES_LIST: &str = "resources/list";
pub const RESOURCES_TEMPLATES_LIST: &str = "resources/templates/list";
pub const RESOURCES_READ: &str = "resources/read";

pub const PROMPTS_LIST: &str = "prompts/list";
pub const PROMPTS_GET: &str = "prompts/get";

pub const NOTIFICATION_INITIALIZED: &str = "notifications/initialized";
/// Pre-release spelling some clients still send.
pub const NOTIFICATION_INITIALIZED_LEGACY: &str = "initialized";
pub const NOTIFICATION_CANCELLED: &str = "notifications/cancelled";

/// Whether `method` completes the handshake.
pub fn is_initialized_notification(method: &str) -> bool {
    method == NOTIFICATION_INITIALIZED || method == NOTIFICATION_INITIALIZED_LEGACY
}
