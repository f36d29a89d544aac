/// Configuration serialization and deserialization.
pub mod config;

/// Box records.
pub mod boxes;

/// Box persistence.
pub mod store;

/// Extra variables for playbook runs.
pub mod vars;

/// Vault identities and password files.
pub mod vault;

/// Adapters around the playbook entry point.
pub mod ansible;

/// Ad-hoc provisioning plays.
pub mod provisioning;

/// Provider owning boxes, variables and runs.
pub mod provider;

/// Utility functions for common operations.
pub mod utils;

/// CLI interface and shell.
pub mod cli;

#[cfg(test)]
pub(crate) mod test_support;

/// Macro for retrying operations with exponential backoff
#[macro_export]
macro_rules! retry_operation {
    ($max_retry:expr, $operation:expr, $log_prefix:expr) => {
        $crate::retry_operation!($max_retry, $operation, $log_prefix, |_| true)
    };

    // Version where `$retryable` decides whether an error is worth another attempt
    ($max_retry:expr, $operation:expr, $log_prefix:expr, $retryable:expr) => {{
        let max_retry: u32 = $max_retry;
        let mut attempt: u32 = 0;

        loop {
            match $operation {
                Ok(res) => break Ok(res),
                Err(e) => {
                    if attempt < max_retry && ($retryable)(&e) {
                        log::warn!(
                            "{} failed (attempt {}/{}): {}, retrying in {}s...",
                            $log_prefix,
                            attempt + 1,
                            max_retry + 1,
                            e,
                            1u64 << attempt
                        );

                        // Exponential backoff: 1s, 2s, 4s, 8s...
                        let delay = std::time::Duration::from_millis(1000 * (1u64 << attempt));
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    } else {
                        if max_retry > 0 {
                            log::error!(
                                "{} failed after {} attempts: {}",
                                $log_prefix,
                                max_retry + 1,
                                e
                            );
                        }
                        break Err(e);
                    }
                }
            }
        }
    }};
}
