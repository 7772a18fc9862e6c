use std::fmt::Write;

use crate::llm::{ CompletionParams, SupportedModel, MAX_TEMPERATURE, MIN_TEMPERATURE, TEMPERATURE_STEP };
use crate::models::chat::{ ChatMessage, Role };
use crate::models::notice::Notice;

const PAGE_TITLE: &str = "AI Chat Assistant";

const STYLE: &str = r#"
    * { box-sizing: border-box; }
    body { margin: 0; font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
           background: #f7f7f8; color: #1a1a2e; }
    .layout { display: flex; min-height: 100vh; }
    .sidebar { width: 280px; flex-shrink: 0; background: #1a1a2e; color: #ffffff; padding: 24px 20px; }
    .sidebar h2 { margin-top: 0; font-size: 1.3rem; }
    .sidebar hr { border: none; border-top: 1px solid #4a4a6a; margin: 16px 0; }
    .sidebar label { display: block; margin: 16px 0 6px; font-weight: 600; }
    .sidebar select { width: 100%; padding: 8px; background: #2d2d44; color: #ffffff;
                      border: 1px solid #4a4a6a; border-radius: 6px; }
    .sidebar input[type=range] { width: 100%; accent-color: #10A37F; }
    .sidebar .hint { font-size: 0.8rem; color: #b8b8d0; }
    .main { flex: 1; display: flex; flex-direction: column; max-width: 900px; margin: 0 auto; padding: 0 24px; }
    .main-header { text-align: center; padding: 20px; font-size: 2rem; font-weight: 600; }
    .chat-message { display: flex; gap: 12px; background: #ffffff; border: 1px solid #e5e5e5;
                    border-radius: 12px; margin-bottom: 1rem; padding: 1rem; }
    .chat-message.assistant { background: #f0faf7; }
    .chat-message .avatar { font-size: 1.4rem; line-height: 1.7; }
    .chat-message .content { white-space: pre-wrap; word-wrap: break-word; font-size: 1rem; line-height: 1.7; }
    .notice { border-radius: 8px; padding: 12px 16px; margin-bottom: 1rem; }
    .notice-info { background: #e8f4f0; border: 1px solid #10A37F; }
    .notice-warning { background: #fff8e1; border: 1px solid #f0b400; }
    .notice-error { background: #fdecea; border: 1px solid #d93025; }
    .notice pre { white-space: pre-wrap; margin: 8px 0 0; }
    .chat-input { display: flex; gap: 8px; position: sticky; bottom: 0; background: #f7f7f8; padding: 16px 0; }
    .chat-input textarea { flex: 1; resize: vertical; min-height: 48px; padding: 12px 16px; font-size: 1rem;
                           background: #ffffff; color: #1a1a2e; border: 2px solid #10A37F; border-radius: 0.75rem; }
    .chat-input textarea::placeholder { color: #6b7280; }
    button { background: #10A37F; color: #ffffff; border: none; border-radius: 0.5rem;
             padding: 0.5rem 1rem; font-weight: 600; cursor: pointer; }
    button:hover { background: #0d8a6a; }
    button:disabled { background: #8E8EA0; cursor: wait; }
    .sidebar button { width: 100%; }
    .spinner { display: none; color: #1a1a2e; margin-bottom: 1rem; }
    .spinner.active { display: block; }
    a { color: #10A37F; }
    footer { text-align: center; color: #8E8EA0; font-size: 0.8rem; border-top: 1px solid #e5e5e5;
             padding: 12px 0; margin-top: auto; }
"#;

const SCRIPT: &str = r#"
    (function () {
        var form = document.getElementById("chat-form");
        var slider = document.getElementById("temperature");
        var readout = document.getElementById("temperature-value");
        if (slider && readout) {
            slider.addEventListener("input", function () { readout.textContent = Number(slider.value).toFixed(1); });
        }
        if (!form) { return; }
        var prompt = form.querySelector("textarea");
        prompt.addEventListener("keydown", function (e) {
            if (e.key === "Enter" && !e.shiftKey) { e.preventDefault(); form.requestSubmit(); }
        });
        form.addEventListener("submit", function (e) {
            if (!prompt.value.trim()) { e.preventDefault(); return; }
            form.querySelector("button").disabled = true;
            document.getElementById("spinner").classList.add("active");
        });
        window.scrollTo(0, document.body.scrollHeight);
    })();
"#;

/// Everything the page needs for one render.
pub struct PageView<'a> {
    pub messages: &'a [ChatMessage],
    pub params: &'a CompletionParams,
    pub notice: Option<&'a Notice>,
    pub setup_error: Option<&'a str>,
    pub busy: bool,
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn avatar(role: Role) -> &'static str {
    match role {
        Role::User => "🧑‍💻",
        _ => "🤖",
    }
}

fn render_sidebar(out: &mut String, params: &CompletionParams) {
    out.push_str("<aside class=\"sidebar\"><h2>⚙️ Settings</h2><hr>");

    out.push_str("<label for=\"model\">🧠 Model</label>");
    out.push_str("<select id=\"model\" name=\"model\" form=\"chat-form\" title=\"Select the GPT model to use\">");
    for model in SupportedModel::ALL {
        let selected = if model == params.model { " selected" } else { "" };
        let _ = write!(out, "<option value=\"{0}\"{1}>{0}</option>", model.as_str(), selected);
    }
    out.push_str("</select>");

    let _ = write!(
        out,
        "<label for=\"temperature\">🌡️ Temperature: <span id=\"temperature-value\">{:.1}</span></label>\
         <input type=\"range\" id=\"temperature\" name=\"temperature\" form=\"chat-form\" \
         min=\"{:.1}\" max=\"{:.1}\" step=\"{:.1}\" value=\"{:.1}\">\
         <div class=\"hint\">Higher values make output more random, lower values more deterministic</div>",
        params.temperature,
        MIN_TEMPERATURE,
        MAX_TEMPERATURE,
        TEMPERATURE_STEP,
        params.temperature
    );

    out.push_str(
        "<hr><form method=\"post\" action=\"/clear\"><button type=\"submit\">🗑️ Clear Chat</button></form></aside>"
    );
}

fn render_notice(out: &mut String, notice: &Notice) {
    let _ = write!(
        out,
        "<div class=\"notice {}\" role=\"alert\">{}",
        notice.severity().css_class(),
        escape_html(&notice.headline())
    );
    if let Some(details) = notice.details() {
        let _ = write!(
            out,
            "<details><summary>Error Details</summary><pre>{}</pre></details>",
            escape_html(details)
        );
    }
    out.push_str("</div>");
}

fn render_message(out: &mut String, message: &ChatMessage) {
    let _ = write!(
        out,
        "<div class=\"chat-message {}\"><span class=\"avatar\">{}</span><div class=\"content\">{}</div></div>",
        message.role.as_str(),
        avatar(message.role),
        escape_html(&message.content)
    );
}

pub fn render_page(view: &PageView<'_>) -> String {
    let mut out = String::with_capacity(8 * 1024);
    out.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
    if view.busy {
        out.push_str("<meta http-equiv=\"refresh\" content=\"2\">");
    }
    let _ = write!(out, "<title>{}</title><style>{}</style></head><body>", PAGE_TITLE, STYLE);
    out.push_str("<div class=\"layout\">");

    render_sidebar(&mut out, view.params);

    out.push_str("<main class=\"main\">");
    let _ = write!(out, "<h1 class=\"main-header\">🤖 {}</h1>", PAGE_TITLE);

    if let Some(reason) = view.setup_error {
        let _ = write!(
            out,
            "<div class=\"notice notice-error\" role=\"alert\">Error configuring OpenAI API: {}</div>\
             <div class=\"notice notice-info\">Please check your API key and try again.</div>",
            escape_html(reason)
        );
    } else {
        out.push_str("<section class=\"messages\">");
        for message in view.messages {
            render_message(&mut out, message);
        }
        out.push_str("</section>");

        if let Some(notice) = view.notice {
            render_notice(&mut out, notice);
        }

        let spinner_class = if view.busy { "spinner active" } else { "spinner" };
        let _ = write!(out, "<div id=\"spinner\" class=\"{}\">Thinking...</div>", spinner_class);

        if !view.busy {
            out.push_str(
                "<form id=\"chat-form\" class=\"chat-input\" method=\"post\" action=\"/chat\">\
                 <textarea name=\"prompt\" placeholder=\"Send a message...\" autofocus></textarea>\
                 <button type=\"submit\">Send</button></form>"
            );
        }
    }

    out.push_str("<footer>Powered by OpenAI GPT • Built with Rust and axum</footer>");
    out.push_str("</main></div>");
    let _ = write!(out, "<script>{}</script></body></html>", SCRIPT);
    out
}
