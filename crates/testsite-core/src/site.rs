use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_REDIRECTS: usize = 5;

/// Whether anything answers HTTP at `url`.
///
/// Any response counts, including error statuses; only transport failures
/// (refused, DNS, timeout) and an empty URL report `false`.
pub fn is_running(url: &str) -> bool {
    if url.trim().is_empty() {
        return false;
    }
    let client = match reqwest::blocking::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!("failed to build http client: {e}");
            return false;
        }
    };
    match client.get(url).send() {
        Ok(resp) => {
            tracing::debug!(url, status = %resp.status(), "test site answered");
            true
        }
        Err(e) => {
            tracing::debug!(url, "test site unreachable: {e}");
            false
        }
    }
}
