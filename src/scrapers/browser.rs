//! Headless-Chrome rendering for the JS-heavy sources. The browser is
//! launched, driven and dropped inside one call, so every exit path
//! (including timeouts) releases the underlying Chrome process.

use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions};

use super::ScrapeError;

/// Bounded wait per fallback selector before trying the next one.
const SELECTOR_WAIT: Duration = Duration::from_secs(5);

/// Navigate to `url`, wait for the first of `wait_selectors` to appear
/// (trying them in order, each with a bounded timeout), and return the
/// rendered document HTML.
///
/// `headless_chrome` is a blocking API, so the whole render runs on the
/// blocking pool.
pub async fn fetch_rendered(
    url: String,
    wait_selectors: &'static [&'static str],
) -> Result<String, ScrapeError> {
    tokio::task::spawn_blocking(move || render_page(&url, wait_selectors))
        .await
        .map_err(|e| ScrapeError::Browser(format!("render task failed: {e}")))?
}

fn render_page(url: &str, wait_selectors: &[&str]) -> Result<String, ScrapeError> {
    let options = LaunchOptions::default_builder()
        .headless(true)
        .sandbox(false)
        .build()
        .map_err(|e| ScrapeError::Browser(format!("launch options: {e}")))?;

    let browser =
        Browser::new(options).map_err(|e| ScrapeError::Browser(format!("launch failed: {e}")))?;
    let tab = browser
        .new_tab()
        .map_err(|e| ScrapeError::Browser(format!("tab failed: {e}")))?;

    tab.navigate_to(url)
        .and_then(|t| t.wait_until_navigated())
        .map_err(|e| ScrapeError::Browser(format!("navigation failed: {e}")))?;

    // Markup drifts; poll the fallback selectors in order and take the
    // first that shows up. Extraction still proceeds when none match so
    // a partial page yields a partial (possibly empty) result.
    let matched = wait_selectors
        .iter()
        .find(|sel| {
            tab.wait_for_element_with_custom_timeout(sel, SELECTOR_WAIT)
                .is_ok()
        })
        .copied();

    match matched {
        Some(selector) => tracing::debug!(selector, url, "content selector matched"),
        None => tracing::warn!(url, "no content selector matched, extracting anyway"),
    }

    tab.get_content()
        .map_err(|e| ScrapeError::Browser(format!("reading content failed: {e}")))
}
