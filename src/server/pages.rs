//! HTML pages served by the service

use crate::status::StatusEntry;
use html_escape::{encode_double_quoted_attribute, encode_text};

/// Seconds between automatic refreshes of the status page
pub const REFRESH_SECS: u32 = 5;

/// Number of status messages shown on the status page
pub const STATUS_TAIL: usize = 30;

/// Number of preview images shown on the status page
pub const PREVIEW_COUNT: usize = 5;

/// Renders the crawl form
///
/// # Arguments
///
/// * `default_excludes` - Prefilled content of the exclude tags field
/// * `default_max` - Prefilled maximum number of images
pub fn index_page(default_excludes: &[String], default_max: u32) -> String {
    let excludes = encode_text(&default_excludes.join(", ")).into_owned();

    format!(
        r#"<!DOCTYPE html>
<html>
    <head><meta charset="utf-8"><title>pixiv crawler</title></head>
    <body>
        <h2>pixiv illustration crawler</h2>
        <form method="post" action="/">
            <label>Tags to search (comma separated):<br><input type="text" name="tags" size="60" required></label><br><br>
            <label>Tags to exclude (comma separated):<br><textarea name="exclude_tags" rows="2" cols="60">{excludes}</textarea></label><br><br>
            <label>Maximum downloads: <input type="number" name="max_items" value="{default_max}" min="1"></label><br><br>
            <label>Pool multiplier (optional): <input type="number" name="multiplier" min="1"></label><br><br>
            <label>pixiv ID: <input type="text" name="username"></label><br>
            <label>pixiv password: <input type="password" name="password"></label><br><br>
            <button type="submit">Start crawl</button>
        </form>
    </body>
</html>
"#
    )
}

/// Renders the auto-refreshing status page of a run
///
/// # Arguments
///
/// * `run` - Run id, already validated as a safe path segment
/// * `entries` - Status messages to show, oldest first
/// * `previews` - File names of saved images to preview
/// * `has_archive` - Whether to link the zip download
/// * `running` - Whether the run can still be cancelled
pub fn status_page(
    run: &str,
    entries: &[StatusEntry],
    previews: &[String],
    has_archive: bool,
    running: bool,
) -> String {
    let run_attr = encode_double_quoted_attribute(run);

    let messages = entries
        .iter()
        .map(|entry| {
            format!(
                "{} {}",
                entry.timestamp.format("%H:%M:%S"),
                encode_text(&entry.message)
            )
        })
        .collect::<Vec<_>>()
        .join("<br>\n");

    let images = previews
        .iter()
        .map(|name| {
            format!(
                r#"<img src="/files/{}/{}" width="200" style="margin:5px">"#,
                run_attr,
                encode_double_quoted_attribute(name)
            )
        })
        .collect::<String>();

    let download_link = if has_archive {
        format!(r#"<br><a href="/download/{}">Download as ZIP</a>"#, run_attr)
    } else {
        String::new()
    };

    let cancel_form = if running {
        format!(
            r#"<form method="post" action="/status/{}/cancel"><button type="submit">Cancel crawl</button></form>"#,
            run_attr
        )
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html>
    <head><meta charset="utf-8"><title>Crawl status</title><meta http-equiv="refresh" content="{REFRESH_SECS}"></head>
    <body>
        <h2>Progress</h2>
        <div style="white-space: pre-line; font-family: monospace;">{messages}</div>
        {cancel_form}
        <hr>
        <h3>Preview (up to {PREVIEW_COUNT})</h3>
        <div>{images}</div>
        {download_link}
        <br><a href="/">Back</a>
    </body>
</html>
"#
    )
}
