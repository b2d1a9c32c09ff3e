//! Queue configuration, validation, and error types.
//!
//! [`QueueConfig`] is the builder-input for constructing a
//! [`CheckQueue`](crate::CheckQueue). [`validate()`](QueueConfig::validate)
//! checks structural invariants before any thread is spawned.

use std::error::Error;
use std::fmt;

// ── QueueConfig ────────────────────────────────────────────────────

/// Complete configuration for constructing a check queue.
#[derive(Clone, Debug)]
pub struct QueueConfig {
    /// Total participants, including the master thread. `None` =
    /// auto-detect (`available_parallelism`, clamped to
    /// `[1, participant_limit]`). `Some(1)` runs every check on the
    /// master inside `wait()`.
    pub participants: Option<usize>,
    /// Upper bound on `participants`. Default: 16.
    pub participant_limit: usize,
    /// Largest batch a participant claims at once. Default: 16.
    pub max_batch_size: usize,
    /// Staged checks accumulated by `add()` before they are published to
    /// the shared queue. Default: 100.
    pub flush_threshold: usize,
    /// Completion polls the master performs between `yield_now` calls
    /// while waiting for the round to end. Default: 64.
    pub spin_before_yield: u32,
    /// Prefix for worker thread names (`{prefix}-{n}`). Default: `"vouch-check"`.
    pub thread_name_prefix: String,
}

impl QueueConfig {
    /// Default participant limit.
    pub const DEFAULT_PARTICIPANT_LIMIT: usize = 16;

    /// Default maximum batch size.
    pub const DEFAULT_MAX_BATCH_SIZE: usize = 16;

    /// Default staging flush threshold.
    pub const DEFAULT_FLUSH_THRESHOLD: usize = 100;

    /// Create a config with an explicit participant count and defaults
    /// for everything else.
    pub fn with_participants(participants: usize) -> Self {
        Self {
            participants: Some(participants),
            ..Self::default()
        }
    }

    /// Resolve the actual participant count, applying auto-detection if
    /// `None`.
    ///
    /// Explicit values are returned unchanged; [`validate()`](Self::validate)
    /// rejects out-of-range ones.
    pub fn resolved_participants(&self) -> usize {
        match self.participants {
            Some(n) => n,
            None => {
                let cpus = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4);
                cpus.clamp(1, self.participant_limit.max(1))
            }
        }
    }

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Limit must admit at least the master.
        if self.participant_limit == 0 {
            return Err(ConfigError::ZeroParticipantLimit);
        }
        // 2. Participant count in [1, limit].
        let participants = self.resolved_participants();
        if participants == 0 {
            return Err(ConfigError::NoParticipants);
        }
        if participants > self.participant_limit {
            return Err(ConfigError::TooManyParticipants {
                requested: participants,
                limit: self.participant_limit,
            });
        }
        // 3. Participant ids are u32.
        if u32::try_from(participants).is_err() {
            return Err(ConfigError::TooManyParticipants {
                requested: participants,
                limit: u32::MAX as usize,
            });
        }
        // 4. Claims must make progress.
        if self.max_batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        // 5. Staging must flush.
        if self.flush_threshold == 0 {
            return Err(ConfigError::ZeroFlushThreshold);
        }
        Ok(())
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            participants: None,
            participant_limit: Self::DEFAULT_PARTICIPANT_LIMIT,
            max_batch_size: Self::DEFAULT_MAX_BATCH_SIZE,
            flush_threshold: Self::DEFAULT_FLUSH_THRESHOLD,
            spin_before_yield: 64,
            thread_name_prefix: "vouch-check".to_string(),
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while constructing a check queue.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Participant count resolved to zero.
    NoParticipants,
    /// More participants requested than the configured limit allows.
    TooManyParticipants {
        /// The requested participant count.
        requested: usize,
        /// The limit it exceeded.
        limit: usize,
    },
    /// `participant_limit` is zero.
    ZeroParticipantLimit,
    /// `max_batch_size` is zero.
    ZeroBatchSize,
    /// `flush_threshold` is zero.
    ZeroFlushThreshold,
    /// A worker thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of which thread failed and why.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoParticipants => write!(f, "participant count must be at least 1"),
            Self::TooManyParticipants { requested, limit } => {
                write!(f, "{requested} participants exceeds limit of {limit}")
            }
            Self::ZeroParticipantLimit => write!(f, "participant_limit must be at least 1"),
            Self::ZeroBatchSize => write!(f, "max_batch_size must be at least 1"),
            Self::ZeroFlushThreshold => write!(f, "flush_threshold must be at least 1"),
            Self::ThreadSpawnFailed { reason } => {
                write!(f, "thread spawn failed: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}
