include!(concat!(env!("OUT_DIR"), "/fund_env_allowlist.rs"));

/// Environment keys the binary understands, sorted.
pub fn env_allowlist() -> &'static [&'static str] {
    GENERATED_FUND_ENV_ALLOWLIST
}
