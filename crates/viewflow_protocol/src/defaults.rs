//! Canonical default values shared by all list screens.

/// Default rows per page when a screen does not override it.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Quiet window for debounced free-text filter input, in milliseconds.
pub const DEBOUNCE_QUIET_MS: u64 = 300;

/// Reserved navigational keys. Filter fields may not use these names.
pub const NAV_KEY_PAGE: &str = "page";
pub const NAV_KEY_SORT: &str = "sort";
pub const NAV_KEY_VIEW: &str = "view";

/// All reserved navigational keys.
pub const RESERVED_NAV_KEYS: &[&str] = &[NAV_KEY_PAGE, NAV_KEY_SORT, NAV_KEY_VIEW];
