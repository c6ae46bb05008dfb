use axum::extract::State;
use axum::http::{HeaderValue, header};
use axum::response::{Html, IntoResponse, Response};
use baltimare_shared::{INITIAL_USERS_ELEMENT_ID, Region, UpdateMode};

use crate::state::AppState;

const FALLBACK_SHELL: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=0.5" />
<link rel="icon" href="/favicon.png" />
<title>Leaderboard</title>
</head>
<body>
<div id="app"></div>
<noscript>this leaderboard needs javascript and webassembly</noscript>
</body>
</html>
"#;

/// Index page with the current user list embedded, so the first paint is never empty.
pub async fn index(State(state): State<AppState>) -> Response {
    state.observability.record_index_render();
    let users_json = {
        let snapshot = state.snapshot.read().await;
        snapshot.users_json.clone()
    };
    let users_json = String::from_utf8_lossy(users_json.as_ref());
    let template = state
        .index_template
        .as_deref()
        .map(String::as_str)
        .unwrap_or(FALLBACK_SHELL);

    let page = render_index(template, state.region, state.update_mode, &users_json);
    let mut response = Html(page).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

pub(crate) fn render_index(
    template: &str,
    region: Region,
    update_mode: UpdateMode,
    users_json: &str,
) -> String {
    let mut page = replace_title(template, region.title());
    let script = format!(
        r#"<script id="{INITIAL_USERS_ELEMENT_ID}" type="application/json" data-update-mode="{}" data-region="{}">{}</script>"#,
        update_mode.as_str(),
        region.key(),
        escape_script_json(users_json),
    );
    match page.rfind("</body>") {
        Some(pos) => page.insert_str(pos, &script),
        None => page.push_str(&script),
    }
    page
}

fn replace_title(template: &str, title: &str) -> String {
    let (Some(start), Some(end)) = (template.find("<title>"), template.find("</title>")) else {
        return template.to_string();
    };
    let start = start + "<title>".len();
    if end < start {
        return template.to_string();
    }
    format!("{}{}{}", &template[..start], title, &template[end..])
}

// JSON is inert inside a script tag except for sequences the HTML tokenizer
// still recognises there. Both replacements are valid JSON escapes.
fn escape_script_json(json: &str) -> String {
    json.replace("</", "<\\/").replace("<!--", "<\\u0021--")
}
