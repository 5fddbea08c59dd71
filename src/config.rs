//! Queue configuration

/// Default number of successful dequeues between reclamation flushes
pub const DEFAULT_FLUSH_INTERVAL: usize = 128;

/// Construction-time settings for an [`MsQueue`](crate::MsQueue)
///
/// # Examples
///
/// ```rust
/// use msqueue::{MsQueue, QueueConfig};
///
/// let config = QueueConfig::new()
///     .with_metrics(false)
///     .with_flush_interval(64);
/// let queue: MsQueue<u32> = MsQueue::with_config(config);
/// assert_eq!(queue.config().flush_interval(), 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    metrics_enabled: bool,
    flush_interval: usize,
}

impl QueueConfig {
    /// Default configuration: metrics on, flush every [`DEFAULT_FLUSH_INTERVAL`] dequeues
    pub const fn new() -> Self {
        Self {
            metrics_enabled: true,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }

    /// Enable or disable operation metrics at construction
    ///
    /// Metrics can still be toggled later through
    /// [`MetricsCollector::set_metrics_enabled`](crate::MetricsCollector::set_metrics_enabled).
    pub const fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    /// Flush reclamation state every `interval` successful dequeues
    ///
    /// Each flush is a quiescent-point hint to the reclamation scheme. `0` disables
    /// periodic flushing; retired nodes are then reclaimed only as the scheme sees fit.
    pub const fn with_flush_interval(mut self, interval: usize) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Whether metrics start enabled
    pub const fn metrics_enabled(&self) -> bool {
        self.metrics_enabled
    }

    /// Dequeues between flushes, `0` when disabled
    pub const fn flush_interval(&self) -> usize {
        self.flush_interval
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::new()
    }
}
