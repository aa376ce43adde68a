//! Property-test run profile read from the environment.
//!
//! Every property suite in the workspace reads its case count, fork mode
//! and repetition count through this module so CI can scale them in one
//! place.

use std::env;

/// Environment variable controlling proptest case counts.
pub const PROGTEST_CASES_ENV_KEY: &str = "PROGTEST_CASES";
/// Environment variable controlling proptest process forking.
pub const DENDRO_PBT_FORK_ENV_KEY: &str = "DENDRO_PBT_FORK";
/// Environment variable controlling how often concurrency properties
/// repeat a computation on the same input.
pub const DENDRO_PBT_CONCURRENCY_REPS_ENV_KEY: &str = "DENDRO_PBT_CONCURRENCY_REPS";

/// Runtime profile for property-test execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProptestRunProfile {
    cases: u32,
    fork: bool,
}

impl ProptestRunProfile {
    /// Loads a profile, falling back to the given defaults for unset or
    /// malformed variables.
    ///
    /// # Examples
    /// ```
    /// use dendro_test_support::ci::property_test_profile::ProptestRunProfile;
    ///
    /// let profile = ProptestRunProfile::load(64, false);
    /// assert!(profile.cases() > 0);
    /// ```
    #[must_use]
    pub fn load(default_cases: u32, default_fork: bool) -> Self {
        Self {
            cases: read_env_or_default(PROGTEST_CASES_ENV_KEY, default_cases, parse_positive),
            fork: read_env_or_default(DENDRO_PBT_FORK_ENV_KEY, default_fork, parse_bool),
        }
    }

    /// Number of cases to run per property.
    #[must_use]
    #[rustfmt::skip]
    pub const fn cases(&self) -> u32 { self.cases }

    /// Whether to run cases in forked subprocesses.
    #[must_use]
    #[rustfmt::skip]
    pub const fn fork(&self) -> bool { self.fork }
}

/// Reads the repetition count for concurrency properties, falling back to
/// `default` when unset or malformed.
#[must_use]
pub fn concurrency_repetitions(default: u32) -> u32 {
    read_env_or_default(DENDRO_PBT_CONCURRENCY_REPS_ENV_KEY, default, parse_positive)
}

fn read_env_or_default<T: Copy>(
    key: &'static str,
    default: T,
    parse: impl Fn(&str) -> Result<T, String>,
) -> T {
    let Ok(raw) = env::var(key) else {
        return default;
    };
    parse(&raw).unwrap_or_else(|reason| {
        tracing::warn!(
            env = key,
            raw = %raw,
            reason = %reason,
            "ignoring invalid property-test override",
        );
        default
    })
}

fn parse_positive(raw: &str) -> Result<u32, String> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err("must be greater than zero".to_owned()),
        Ok(value) => Ok(value),
        Err(error) => Err(format!("parse error: {error}")),
    }
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err("expected one of: true/false/1/0/yes/no/on/off".to_owned()),
    }
}
