pub mod client_consts {
    //! Client Configuration Constants
    //!
    //! Timing and buffering constants for the authenticated client core,
    //! organized by functional area.

    use std::time::Duration;

    // =============================================================================
    // TRANSPORT CONFIGURATION
    // =============================================================================

    /// Time allowed to establish a TCP/TLS connection (seconds)
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Overall deadline for a single request/response exchange (seconds)
    ///
    /// This is the only deadline in the system; the pipeline does not impose
    /// a second one on top of it.
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// User-Agent string with client version
    pub const USER_AGENT: &str = concat!("afis-client/", env!("CARGO_PKG_VERSION"));

    pub const fn connect_timeout() -> Duration {
        Duration::from_secs(CONNECT_TIMEOUT_SECS)
    }

    pub const fn request_timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }

    // =============================================================================
    // NOTIFICATION CONFIGURATION
    // =============================================================================

    /// Cooldown window for "backend unreachable" notifications (milliseconds)
    ///
    /// No matter how many calls fail while the window is open, at most one
    /// offline event crosses the boundary to the UI.
    pub const OFFLINE_COOLDOWN_MS: u64 = 15_000;

    pub const fn offline_cooldown() -> Duration {
        Duration::from_millis(OFFLINE_COOLDOWN_MS)
    }

    // =============================================================================
    // EVENT CHANNEL CONFIGURATION
    // =============================================================================

    /// Buffer size of the boundary event channel consumed by the UI layer.
    pub const SESSION_EVENT_QUEUE_SIZE: usize = 32;
}
