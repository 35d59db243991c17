/// Storage key constants to keep the persisted layout consistent across components.
/// Account-scoped keys are built with the helpers below so they are always lower-cased.

// Shared collections
pub const CATALOG_KEY: &str = "catalog_v4";
pub const ACCOUNTS_KEY: &str = "accounts_v3";
pub const ANALYTICS_KEY: &str = "analytics_v1";
pub const INBOX_KEY: &str = "inbox_v1";
pub const KNOWN_ACCOUNTS_KEY: &str = "known_accounts";

// Device-level state: the signed-in session and the last picked brand
pub const CURRENT_SESSION_KEY: &str = "current_session";
pub const PREFERRED_BRAND_KEY: &str = "preferred_brand";

// Per-account / per-item key prefixes
pub const WATCHLIST_PREFIX: &str = "watchlist_";
pub const CONTINUE_PREFIX: &str = "continue_";
pub const COMMENTS_PREFIX: &str = "comments_";

/// Additive score that puts any editorially trending item above every organic count.
pub const TRENDING_BOOST: u64 = 1_000_000;

pub const CONTINUE_WATCHING_CAP: usize = 10;
pub const KNOWN_ACCOUNTS_CAP: usize = 3;
pub const DEFAULT_TOP_LIMIT: usize = 10;
pub const DEFAULT_LEDGER_RETENTION: usize = 500;
pub const DEFAULT_LATENCY_MS: u64 = 300;

// Default root identity. Override or disable it in config.toml.
pub const ROOT_NAME: &str = "root";
pub const ROOT_EMAIL: &str = "root@catalog.local";
pub const ROOT_PASSWORD: &str = "change-me-root";

pub const UNKNOWN_ASSET: &str = "Unknown Asset";

pub fn watchlist_key(email: &str) -> String {
    format!("{}{}", WATCHLIST_PREFIX, email.trim().to_lowercase())
}

pub fn continue_key(email: &str) -> String {
    format!("{}{}", CONTINUE_PREFIX, email.trim().to_lowercase())
}

pub fn comments_key(item_id: &str) -> String {
    format!("{}{}", COMMENTS_PREFIX, item_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_keys_ignore_email_case() {
        assert_eq!(watchlist_key("Ann@X.com"), watchlist_key("ann@x.com"));
        assert_eq!(continue_key(" ANN@x.COM "), "continue_ann@x.com");
        assert_ne!(watchlist_key("ann@x.com"), continue_key("ann@x.com"));
    }
}
