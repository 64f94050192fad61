//! The question page.
//!
//! Server-rendered: every submission re-renders the whole page with the
//! question kept in the input and the outcome shown below it.

use std::sync::Arc;

use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use crate::comms::state::{AskState, Display};

const STYLE: &str = r#"
    *, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }
    body {
      font-family: system-ui, -apple-system, sans-serif;
      background: #0f0f0f; color: #e0e0e0;
      max-width: 46rem; margin: 0 auto; padding: 3rem 1.5rem;
    }
    h1 { font-size: 2rem; margin-bottom: 1.5rem; }
    label { display: block; font-size: 0.9rem; color: #aaa; margin-bottom: 0.4rem; }
    input {
      width: 100%; padding: 0.6rem 0.8rem; font-size: 1rem;
      border: 1px solid #333; border-radius: 8px;
      background: #1a1a1a; color: #e0e0e0;
    }
    .answer, .error {
      margin-top: 1.5rem; padding: 1rem 1.2rem;
      border-radius: 8px; white-space: pre-wrap; line-height: 1.5;
    }
    .answer { background: #1a1a1a; border: 1px solid #333; }
    .error  { background: #2a1414; border: 1px solid #5a2a2a; color: #f0b0b0; }
"#;

#[derive(Deserialize, Default)]
pub(super) struct AskQuery {
    #[serde(default)]
    question: String,
}

/// GET / — render, answering `?question=` when present.
pub(super) async fn show(
    State(state): State<Arc<AskState>>,
    Query(query): Query<AskQuery>,
) -> Response {
    respond(&state, &query.question).await
}

/// POST / — form submission.
pub(super) async fn submit(
    State(state): State<Arc<AskState>>,
    Form(form): Form<AskQuery>,
) -> Response {
    respond(&state, &form.question).await
}

async fn respond(state: &AskState, question: &str) -> Response {
    let display = state.handle_input(question).await;
    let status = match display {
        Display::Error { timed_out: true, .. } => StatusCode::GATEWAY_TIMEOUT,
        Display::Error { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::OK,
    };
    (status, Html(render(state.title(), state.input_label(), question, &display))).into_response()
}

/// Full page markup for one interaction.
pub(super) fn render(title: &str, label: &str, question: &str, display: &Display) -> String {
    let output = match display {
        Display::Empty => String::new(),
        Display::Answer(text) => format!(
            r#"<div class="answer" id="answer">{}</div>"#,
            html_escape(text)
        ),
        // Upstream detail stays in the log and the JSON API.
        Display::Error { timed_out: true, .. } => {
            r#"<div class="error" id="error">The model took too long to answer. Please try again.</div>"#
                .to_string()
        }
        Display::Error { .. } => {
            r#"<div class="error" id="error">Something went wrong while answering.</div>"#.to_string()
        }
    };
    let title = html_escape(title);
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>{title}</title>
  <style>{STYLE}</style>
</head>
<body>
  <h1>{title}</h1>
  <form method="post" action="/">
    <label for="question">{label}</label>
    <input id="question" name="question" type="text" value="{value}" autocomplete="off" autofocus />
  </form>
  {output}
</body>
</html>
"#,
        label = html_escape(label),
        value = html_escape(question),
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
