//! Configuration for the permission resolver.

use std::time::Duration;

/// Configuration for the permission resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Maximum recursion depth during expression evaluation. Real schemas
    /// stay under 4; the bound exists as a hard termination guarantee.
    pub max_depth: u32,
    /// Deadline for a single check. Expiry surfaces as
    /// `DomainError::Timeout`, which the access layer treats as transient.
    pub timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: 16,
            timeout: Duration::from_secs(5),
        }
    }
}

impl ResolverConfig {
    /// Creates a new configuration with the specified max depth.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Creates a new configuration with the specified check deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
