use tracing::{info, warn};

/// Locale used when the configured one has no translations
pub const FALLBACK_LOCALE: &str = "en";

/// Switch the interface language. Unknown locales fall back to English.
/// Returns the locale actually in use.
pub fn set_locale(locale: &str) -> &str {
    let available = rust_i18n::available_locales!();
    let chosen = if available.iter().any(|l| *l == locale) {
        locale
    } else {
        warn!(
            "No translations for locale '{}', using '{}'",
            locale, FALLBACK_LOCALE
        );
        FALLBACK_LOCALE
    };

    rust_i18n::set_locale(chosen);
    info!("Interface locale set to {}", chosen);
    chosen
}
