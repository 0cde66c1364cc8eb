//! Product feedback read model and the HTML fragments pushed over the live
//! channel.

use chrono::{DateTime, Utc};
use serde::Serialize;

use storefront_core::{FeedbackId, ProductId, UserId};

const DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Input for a feedback entry about to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedback {
    pub product_id: ProductId,
    pub author_id: UserId,
    pub liked_text: String,
    pub disliked_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackAuthor {
    pub first_name: String,
    pub last_name: String,
}

impl FeedbackAuthor {
    /// `"Иван П."`: first name plus last-name initial.
    pub fn display_name(&self) -> String {
        match self.last_name.chars().next() {
            Some(initial) => format!("{} {initial}.", self.first_name),
            None => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub id: FeedbackId,
    pub product_id: ProductId,
    pub author_id: UserId,
    pub author: FeedbackAuthor,
    pub liked_text: String,
    pub disliked_text: String,
    pub admin_comment: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Feedback {
    pub fn formatted_date(&self) -> String {
        self.updated_at.format(DATE_FORMAT).to_string()
    }

    pub fn view(&self) -> FeedbackView {
        FeedbackView {
            id: self.id,
            user_name: self.author.display_name(),
            feedback_date: self.formatted_date(),
            liked_text: self.liked_text.clone(),
            disliked_text: self.disliked_text.clone(),
            admin_comment: self.admin_comment.clone(),
        }
    }
}

/// Feedback as listed on the product page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackView {
    pub id: FeedbackId,
    pub user_name: String,
    pub feedback_date: String,
    pub liked_text: String,
    pub disliked_text: String,
    pub admin_comment: Option<String>,
}

/// The two renderings of one feedback entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackFragments {
    pub user_html: String,
    pub admin_html: String,
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_body(feedback: &Feedback) -> String {
    format!(
        concat!(
            r#"<div class="feedback__header">"#,
            r#"<span class="feedback__author">{author}</span>"#,
            r#"<span class="feedback__date">{date}</span>"#,
            r#"</div>"#,
            r#"<div class="feedback__section"><h4>Понравилось</h4><p>{liked}</p></div>"#,
            r#"<div class="feedback__section"><h4>Не понравилось</h4><p>{disliked}</p></div>"#,
        ),
        author = escape_html(&feedback.author.display_name()),
        date = feedback.formatted_date(),
        liked = escape_html(&feedback.liked_text),
        disliked = escape_html(&feedback.disliked_text),
    )
}

fn render_comment(feedback: &Feedback) -> String {
    match &feedback.admin_comment {
        Some(comment) => format!(
            r#"<div class="feedback__admin-comment"><h4>Ответ магазина</h4><p>{}</p></div>"#,
            escape_html(comment)
        ),
        None => r#"<div class="feedback__admin-comment" hidden></div>"#.to_string(),
    }
}

/// Render the plain and the admin-annotated fragment for `feedback`.
pub fn render_fragments(feedback: &Feedback) -> FeedbackFragments {
    let id = feedback.id;
    let body = render_body(feedback);
    let comment = render_comment(feedback);

    let user_html = format!(r#"<div class="feedback" id="feedback-{id}">{body}{comment}</div>"#);
    let admin_html = format!(
        concat!(
            r#"<div class="feedback feedback--admin" id="feedback-{id}">{body}{comment}"#,
            r#"<form class="feedback__admin-controls" data-feedback-id="{id}">"#,
            r#"<textarea name="admin_comment" placeholder="Комментарий администратора"></textarea>"#,
            r#"<button type="button" data-operation="update">Ответить</button>"#,
            r#"<button type="button" data-operation="delete">Удалить отзыв</button>"#,
            r#"</form></div>"#,
        ),
        id = id,
        body = body,
        comment = comment,
    );

    FeedbackFragments {
        user_html,
        admin_html,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample() -> Feedback {
        Feedback {
            id: FeedbackId::new(12),
            product_id: ProductId::new(3),
            author_id: UserId::new(1),
            author: FeedbackAuthor {
                first_name: "Новый".into(),
                last_name: "Пользователь".into(),
            },
            liked_text: "Быстрая доставка".into(),
            disliked_text: "<script>alert(1)</script>".into(),
            admin_comment: None,
            updated_at: Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 0).unwrap(),
        }
    }

    #[test]
    fn author_is_first_name_and_initial() {
        assert_eq!(sample().author.display_name(), "Новый П.");
        let nameless = FeedbackAuthor {
            first_name: "Ян".into(),
            last_name: String::new(),
        };
        assert_eq!(nameless.display_name(), "Ян");
    }

    #[test]
    fn view_formats_date() {
        let view = sample().view();
        assert_eq!(view.feedback_date, "07.03.2024 09:05");
        assert_eq!(view.user_name, "Новый П.");
    }

    #[test]
    fn fragments_differ_by_admin_controls() {
        let f = render_fragments(&sample());
        assert_ne!(f.user_html, f.admin_html);
        assert!(f.admin_html.contains(r#"data-operation="delete""#));
        assert!(!f.user_html.contains("data-operation"));
        assert!(f.user_html.contains(r#"id="feedback-12""#));
        assert!(f.user_html.contains("Новый П."));
    }

    #[test]
    fn user_text_is_escaped() {
        let f = render_fragments(&sample());
        assert!(!f.user_html.contains("<script>"));
        assert!(f.user_html.contains("&lt;script&gt;"));
    }

    #[test]
    fn existing_comment_is_rendered() {
        let mut feedback = sample();
        feedback.admin_comment = Some("Спасибо!".into());
        let f = render_fragments(&feedback);
        assert!(f.user_html.contains("Спасибо!"));
        assert!(!f.user_html.contains("hidden"));
    }
}
