//! Page states returned by the event handlers, and their HTML rendering.

use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;
use uuid::Uuid;

use crate::chat::{ChatMessage, Role};
use crate::survey::{field_name, TraitScores, DEFAULT_RATING, MAX_RATING, MIN_RATING, QUESTIONS};

pub const USER_BUBBLE_COLOR: &str = "#DCF8C6";
pub const OTHER_BUBBLE_COLOR: &str = "#E8E8E8";
pub const MISSING_PROFILE_MESSAGE: &str = "No profile found. Please take the test first.";
pub const SAVED_MESSAGE: &str = "Saved. You can now proceed to chat.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Login {
        warning: Option<String>,
    },
    Survey {
        username: String,
        /// Set from submission until the user moves on to the chat.
        result: Option<TraitScores>,
        completed: bool,
    },
    Chat {
        username: String,
        history: Vec<ChatMessage>,
    },
    MissingProfile {
        username: String,
    },
}

impl View {
    pub fn username(&self) -> Option<&str> {
        match self {
            View::Login { .. } => None,
            View::Survey { username, .. }
            | View::Chat { username, .. }
            | View::MissingProfile { username } => Some(username),
        }
    }

    pub fn render(&self, session_id: Uuid) -> String {
        let base = format!("/s/{}", session_id);
        let mut main = String::new();

        match self {
            View::Login { warning } => {
                main.push_str("<h1>Welcome</h1>");
                if let Some(warning) = warning {
                    let _ = write!(main, r#"<div class="warning">{}</div>"#, encode_text(warning));
                }
            }
            View::Survey { result: None, .. } => render_survey_form(&mut main, &base),
            View::Survey { result: Some(scores), completed, .. } => {
                main.push_str("<h1>Big Five Personality Test</h1>");
                main.push_str("<h2>Your Personality Results</h2><ul>");
                for (t, score) in scores.iter() {
                    let _ = write!(main, "<li>{}: {} / 100</li>", t.label(), score);
                }
                main.push_str("</ul>");
                let _ = write!(main, r#"<div class="success">{}</div>"#, SAVED_MESSAGE);
                if *completed {
                    let _ = write!(
                        main,
                        r#"<form method="post" action="{}/survey/continue"><button type="submit">Go to Chat</button></form>"#,
                        base
                    );
                }
            }
            View::Chat { username, history } => {
                let _ = write!(main, "<h1>Chatbot - {}</h1>", encode_text(username));
                for message in history {
                    render_bubble(&mut main, message);
                }
                let _ = write!(
                    main,
                    r#"<form method="post" action="{base}/chat" class="chat-input">
<input type="text" name="message" placeholder="Your message" autofocus>
<button type="submit">Send</button>
</form>
<form method="post" action="{base}/chat/clear"><button type="submit">Clear Chat</button></form>"#,
                    base = base
                );
            }
            View::MissingProfile { username } => {
                let _ = write!(main, "<h1>Chatbot - {}</h1>", encode_text(username));
                let _ = write!(main, r#"<div class="error">{}</div>"#, MISSING_PROFILE_MESSAGE);
            }
        }

        page(&render_sidebar(self.username(), &base), &main)
    }
}

fn render_sidebar(username: Option<&str>, base: &str) -> String {
    let mut sidebar = String::from("<h2>User Login</h2>");
    match username {
        Some(name) => {
            let _ = write!(sidebar, "<p><strong>Welcome, {}!</strong></p>", encode_text(name));
        }
        None => {
            let _ = write!(
                sidebar,
                r#"<form method="post" action="{}/login">
<label for="username">Enter your username</label>
<input type="text" id="username" name="username" autofocus>
<button type="submit">Continue</button>
</form>"#,
                base
            );
        }
    }
    sidebar
}

fn render_survey_form(main: &mut String, base: &str) {
    main.push_str("<h1>Big Five Personality Test</h1>");
    let _ = write!(main, r#"<form method="post" action="{}/survey">"#, base);
    main.push_str("<p>Rate 1 (Disagree) to 5 (Agree)</p>");
    for (index, question) in QUESTIONS.iter().enumerate() {
        let name = field_name(index);
        let _ = write!(
            main,
            r#"<div class="question"><label for="{name}">{statement}</label>
<input type="range" id="{name}" name="{name}" min="{min}" max="{max}" step="1" value="{default}"></div>"#,
            name = name,
            statement = encode_text(question.statement),
            min = MIN_RATING,
            max = MAX_RATING,
            default = DEFAULT_RATING,
        );
    }
    main.push_str(r#"<button type="submit">Submit</button></form>"#);
}

fn render_bubble(out: &mut String, message: &ChatMessage) {
    let color = match message.role {
        Role::User => USER_BUBBLE_COLOR,
        Role::Bot => OTHER_BUBBLE_COLOR,
    };
    let _ = write!(
        out,
        r#"<div class="message {role}" data-role="{role}"><span class="speaker">{label}</span>
<div class="bubble" style="background-color: {color};">{content}</div></div>"#,
        role = encode_double_quoted_attribute(message.role.as_stored()),
        label = message.role.label(),
        color = color,
        content = encode_text(&message.content),
    );
}

/// Plain page for failures that have no dedicated view.
pub fn render_error_page(title: &str, detail: &str, back: &str) -> String {
    let main = format!(
        r#"<h1>{}</h1><div class="error">{}</div><p><a href="{}">Back</a></p>"#,
        encode_text(title),
        encode_text(detail),
        encode_double_quoted_attribute(back),
    );
    page("", &main)
}

fn page(sidebar: &str, main: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Persona Chat</title>
<style>
body {{ margin: 0; display: flex; font-family: sans-serif; }}
aside {{ width: 16rem; min-height: 100vh; padding: 1rem; background: #f0f2f6; }}
main {{ flex: 1; padding: 1rem 2rem; max-width: 48rem; }}
.bubble {{ color: black; padding: 10px; border-radius: 10px; max-width: 90%; word-wrap: break-word; white-space: pre-wrap; }}
.message {{ margin: 0.5rem 0; }}
.speaker {{ font-size: 0.8rem; color: #555; }}
.warning {{ background: #fffce7; padding: 0.75rem; border-radius: 6px; }}
.success {{ background: #e8f9ee; padding: 0.75rem; border-radius: 6px; }}
.error {{ background: #ffebee; padding: 0.75rem; border-radius: 6px; }}
.question {{ margin: 0.75rem 0; display: flex; flex-direction: column; }}
</style>
</head>
<body>
<aside>{}</aside>
<main>{}</main>
</body>
</html>
"#,
        sidebar, main
    )
}
