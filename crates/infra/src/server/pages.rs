//! HTML pages served to the browser.

use chrono::{DateTime, Utc};

const STYLE: &str = "body{font-family:sans-serif;max-width:40em;margin:3em auto;color:#222}\
                     h1{font-size:1.4em}code{background:#f3f3f3;padding:0 .2em}";

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>{STYLE}</style></head><body>{body}</body></html>",
        title = escape(title),
    )
}

/// Listener status for `/`.
pub fn status(expires_at: Option<DateTime<Utc>>, login_url: &str) -> String {
    let body = match expires_at {
        Some(at) if at > Utc::now() => format!(
            "<h1>Authenticated</h1><p>Access token valid until <code>{}</code>.</p>",
            at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        Some(at) => format!(
            "<h1>Token expired</h1><p>Expired at <code>{}</code>; it will be refreshed on next \
             use.</p><p><a href=\"{}\">Log in again</a></p>",
            at.format("%Y-%m-%d %H:%M:%S UTC"),
            escape(login_url)
        ),
        None => format!(
            "<h1>Not authenticated</h1><p><a href=\"{}\">Log in</a></p>",
            escape(login_url)
        ),
    };
    page("Notebook authentication", &body)
}

/// Shown when the login needs no further navigation.
pub fn close_window() -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Logged in</title>\
         <style>{STYLE}</style></head><body onload=\"window.close()\">\
         <h1>Login complete</h1><p>You can close this window and return to the notebook.</p>\
         </body></html>"
    )
}

/// Error page with an optional detail line.
pub fn error(title: &str, detail: Option<&str>) -> String {
    let detail = detail.map(|d| format!("<p>{}</p>", escape(d))).unwrap_or_default();
    page(title, &format!("<h1>{}</h1>{detail}", escape(title)))
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
