//! Server-rendered trip planner page

use axum::{Form, Router, extract::State, response::Html, routing::get};
use chrono::{Days, Local, NaiveDate};
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::api::AppState;
use crate::models::{DateRange, TripPlan};
use crate::{Result, VacaigentError};

const PAGE: &str = include_str!("page.html");
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Submitted form fields; dates stay strings so a bad value renders as an
/// error on the page instead of a rejection
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerForm {
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub interests: String,
}

impl PlannerForm {
    /// Empty form starting `today` and ending six days later
    pub fn with_defaults(today: NaiveDate) -> Self {
        let end = today.checked_add_days(Days::new(6)).unwrap_or(today);
        Self {
            origin: String::new(),
            destination: String::new(),
            start_date: today.format(DATE_FORMAT).to_string(),
            end_date: end.format(DATE_FORMAT).to_string(),
            interests: String::new(),
        }
    }

    pub fn to_plan(&self) -> Result<TripPlan> {
        let parse = |label: &str, value: &str| {
            NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
                VacaigentError::validation(format!("Invalid {label} date '{value}'"))
            })
        };

        Ok(TripPlan {
            origin: self.origin.trim().to_string(),
            destination: self.destination.trim().to_string(),
            dates: DateRange::new(
                parse("start", &self.start_date)?,
                parse("end", &self.end_date)?,
            )?,
            interests: self.interests.trim().to_string(),
        })
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/planner", get(show_form).post(submit_form))
}

async fn show_form() -> Html<String> {
    let form = PlannerForm::with_defaults(Local::now().date_naive());
    Html(render_page(&form_html(&form)))
}

async fn submit_form(State(state): State<AppState>, Form(form): Form<PlannerForm>) -> Html<String> {
    let (log, result) = run_planner(&state, &form).await;

    let mut content = form_html(&form);
    if !log.is_empty() {
        content.push_str("<details open><summary>🤖 Agents at work</summary><ul>");
        for line in &log {
            content.push_str(&format!("<li>{}</li>", escape_html(line)));
        }
        content.push_str("</ul></details>");
    }

    match result {
        Ok(itinerary) => {
            content.push_str("<section class=\"itinerary\"><h2>🌍 Here's your Dream Trip Plan</h2>");
            content.push_str(&render_markdown(&itinerary));
            content.push_str("</section>");
            content.push_str("<div class=\"notice success\">🌟 Trip plan generated successfully!</div>");
        }
        Err(e) => {
            content.push_str(&format!(
                "<div class=\"notice error\">❌ Could not generate trip plan. Please check API keys or try again.\n{}</div>",
                escape_html(&e.to_string())
            ));
        }
    }

    Html(render_page(&content))
}

async fn run_planner(state: &AppState, form: &PlannerForm) -> (Vec<String>, Result<String>) {
    let trip = match state
        .settings
        .require_keys()
        .and_then(|_| form.to_plan())
    {
        Ok(trip) => trip,
        Err(e) => return (Vec::new(), Err(e)),
    };

    info!(
        "Planner form submitted for {} ({}) with {}",
        trip.destination,
        trip.dates,
        state.ui_planner.name()
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let result = state.ui_planner.plan(&trip, Some(&tx)).await;
    drop(tx);

    let mut log = Vec::new();
    while let Some(event) = rx.recv().await {
        log.push(event.to_string());
    }

    if let Err(e) = &result {
        warn!("Planner form run failed: {}", e);
    }
    (log, result.map(|output| output.to_string()))
}

fn render_page(content: &str) -> String {
    PAGE.replacen("{{content}}", content, 1)
}

fn form_html(form: &PlannerForm) -> String {
    format!(
        r#"<form method="post" action="/planner">
  <label>📍 Where are you currently located?
    <input name="origin" placeholder="Kuala Lumpur, Malaysia" value="{origin}" required>
  </label>
  <label>🌆 Destination (City &amp; Country)
    <input name="destination" placeholder="Rome, Italy" value="{destination}" required>
  </label>
  <div class="dates">
    <label>📅 Start Date <input type="date" name="start_date" value="{start}" required></label>
    <label>🏁 End Date <input type="date" name="end_date" value="{end}" required></label>
  </div>
  <label>🎯 High-level interests or trip details
    <textarea name="interests" rows="4" placeholder="Visiting Paris for 7 days. We love swimming, hiking, local food and art museums." required>{interests}</textarea>
  </label>
  <button type="submit">✨ Generate My Trip Plan</button>
</form>"#,
        origin = escape_html(&form.origin),
        destination = escape_html(&form.destination),
        start = escape_html(&form.start_date),
        end = escape_html(&form.end_date),
        interests = escape_html(&form.interests),
    )
}

const SAFE_SCHEMES: [&str; 3] = ["http://", "https://", "mailto:"];

/// Links and images may only point at web pages, mail addresses or anchors
fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let lower = url.trim().to_ascii_lowercase();
    if lower.starts_with('#') || SAFE_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        url
    } else {
        CowStr::Borrowed("#")
    }
}

/// Markdown to HTML; raw HTML in the model output is shown as text and
/// link targets outside [`SAFE_SCHEMES`] are dropped
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut output = String::new();
    html::push_html(&mut output, parser);
    output
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_form_spans_a_week() {
        let today = NaiveDate::from_ymd_opt(2025, 12, 29).unwrap();
        let form = PlannerForm::with_defaults(today);
        assert_eq!(form.start_date, "2025-12-29");
        assert_eq!(form.end_date, "2026-01-04");
    }

    #[test]
    fn test_form_to_plan_validates_dates() {
        let mut form = PlannerForm::with_defaults(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        form.origin = " Bangalore ".into();
        form.destination = "Krabi".into();
        form.interests = "beaches".into();

        let plan = form.to_plan().unwrap();
        assert_eq!(plan.origin, "Bangalore");
        assert_eq!(plan.dates.to_string(), "2025-06-01 to 2025-06-07");

        form.end_date = "2025-06-01".into();
        assert_eq!(
            form.to_plan().unwrap_err().to_string(),
            "End date must be after start date"
        );

        form.start_date = "June 1st".into();
        assert!(form.to_plan().unwrap_err().to_string().contains("Invalid start date"));
    }

    #[test]
    fn test_markdown_renders_and_neutralizes_html() {
        let html = render_markdown("# Day 1\n\n**Beach** day\n\n<script>alert(1)</script>\n");
        assert!(html.contains("<h1>Day 1</h1>"));
        assert!(html.contains("<strong>Beach</strong>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_markdown_drops_script_link_targets() {
        let html =
            render_markdown("[click me](javascript:alert(document.cookie)) ![x](JavaScript:alert(1))");
        assert!(!html.to_ascii_lowercase().contains("script:"));
        assert!(html.contains("<a href=\"#\">click me</a>"));
    }

    #[test]
    fn test_markdown_keeps_web_and_mail_links() {
        let html = render_markdown(
            "[Krabi](https://krabi.example/guide) [mail](mailto:a@b.example) [top](#day-1)",
        );
        assert!(html.contains("href=\"https://krabi.example/guide\""));
        assert!(html.contains("href=\"mailto:a@b.example\""));
        assert!(html.contains("href=\"#day-1\""));
    }

    #[test]
    fn test_form_html_escapes_values() {
        let mut form = PlannerForm::with_defaults(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        form.origin = "\"><b>x</b>".into();
        let html = form_html(&form);
        assert!(html.contains("value=\"&quot;&gt;&lt;b&gt;x&lt;/b&gt;\""));
        assert!(render_page(&html).contains("<form method=\"post\""));
    }
}
