//! Service configuration.

use std::time::Duration;

use crate::widget::Theme;

/// Configuration for the flow service.
///
/// Per-flow policy (show mode, launch mode, transforms) lives on the
/// [`Flow`](crate::Flow) itself; this only covers what every flow shares.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use talkflow::FlowServiceConfig;
///
/// let config = FlowServiceConfig {
///     session_ttl: Some(Duration::from_secs(30 * 60)),
///     ..Default::default()
/// };
/// assert_eq!(config.skip_keyword, "/skip");
/// ```
#[derive(Debug, Clone)]
pub struct FlowServiceConfig {
    /// Every user-visible string.
    pub theme: Theme,

    /// Text that skips an optional field, storing absence.
    /// Default: `/skip`.
    pub skip_keyword: String,

    /// Idle time after which a session is treated as gone and deleted on
    /// next access. Default: `None` (sessions never expire).
    pub session_ttl: Option<Duration>,
}

impl Default for FlowServiceConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            skip_keyword: "/skip".into(),
            session_ttl: None,
        }
    }
}
