//! Form inputs and their cleaning rules.
//!
//! Inputs hold the raw submitted strings so an invalid form can be rendered
//! back exactly as typed. `clean` turns them into typed drafts or a map of
//! field errors. Checks that need the database (category exists, username is
//! free) happen in the service layer and add to the same error map.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Comment, Post, User};

pub const TITLE_MAX_LEN: usize = 256;
pub const NAME_MAX_LEN: usize = 150;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice.";

/// Usernames that collide with literal segments under `/profile/`.
pub const RESERVED_USERNAMES: &[&str] = &["edit"];

/// Field name -> messages, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

fn required<'a>(errors: &mut FieldErrors, field: &str, value: &'a str) -> &'a str {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
    }
    value
}

fn max_len(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!("Ensure this value has at most {max} characters (it has {len})."),
        );
    }
}

fn checkbox(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("on" | "true" | "1" | "yes")
    )
}

/// Parse a submitted date-time. Naive values are taken as UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M").to_string()
}

fn optional_uuid(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<Uuid> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, INVALID_CHOICE);
            None
        }
    }
}

/// Submitted post form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostInput {
    pub title: String,
    pub body: String,
    pub publish_at: String,
    pub category: String,
    pub location: String,
    pub is_published: Option<String>,
}

/// Cleaned post form.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub body: String,
    pub publish_at: DateTime<Utc>,
    pub category_id: Uuid,
    pub location_id: Option<Uuid>,
    pub is_published: bool,
}

impl PostInput {
    /// Prefill from an existing post.
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            body: post.body.clone(),
            publish_at: format_datetime(post.publish_at),
            category: post.category_id.map(|id| id.to_string()).unwrap_or_default(),
            location: post.location_id.map(|id| id.to_string()).unwrap_or_default(),
            is_published: post.is_published.then(|| "on".to_string()),
        }
    }

    pub fn clean(&self) -> Result<PostDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = required(&mut errors, "title", &self.title).to_string();
        max_len(&mut errors, "title", &title, TITLE_MAX_LEN);
        let body = required(&mut errors, "body", &self.body).to_string();

        let publish_at = match required(&mut errors, "publish_at", &self.publish_at) {
            "" => None,
            raw => {
                let parsed = parse_datetime(raw);
                if parsed.is_none() {
                    errors.add("publish_at", "Enter a valid date/time.");
                }
                parsed
            }
        };

        let category_id = match required(&mut errors, "category", &self.category) {
            "" => None,
            raw => optional_uuid(&mut errors, "category", raw),
        };
        let location_id = optional_uuid(&mut errors, "location", &self.location);

        match (publish_at, category_id) {
            (Some(publish_at), Some(category_id)) if errors.is_empty() => Ok(PostDraft {
                title,
                body,
                publish_at,
                category_id,
                location_id,
                is_published: checkbox(self.is_published.as_deref()),
            }),
            _ => Err(errors),
        }
    }
}

/// Submitted comment form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentInput {
    pub body: String,
}

/// Cleaned comment form.
#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub body: String,
}

impl CommentInput {
    pub fn from_comment(comment: &Comment) -> Self {
        Self {
            body: comment.body.clone(),
        }
    }

    pub fn clean(&self) -> Result<CommentDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        let body = required(&mut errors, "body", &self.body).to_string();
        errors.into_result(|| CommentDraft { body })
    }
}

/// Submitted profile form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileInput {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Cleaned profile form.
#[derive(Debug, Clone)]
pub struct ProfileDraft {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl ProfileInput {
    pub fn from_user(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }

    pub fn clean(&self) -> Result<ProfileDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let username = required(&mut errors, "username", &self.username).to_string();
        max_len(&mut errors, "username", &username, NAME_MAX_LEN);
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
        if RESERVED_USERNAMES.contains(&username.as_str()) {
            errors.add("username", "This username is reserved.");
        }

        let first_name = self.first_name.trim().to_string();
        max_len(&mut errors, "first_name", &first_name, NAME_MAX_LEN);
        let last_name = self.last_name.trim().to_string();
        max_len(&mut errors, "last_name", &last_name, NAME_MAX_LEN);

        let email = self.email.trim().to_string();
        if !email.is_empty() && !is_email(&email) {
            errors.add("email", "Enter a valid email address.");
        }

        errors.into_result(|| ProfileDraft {
            username,
            first_name,
            last_name,
            email,
        })
    }
}

/// Loose address check: one `@` with something on both sides and a dotted domain.
pub fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_input() -> PostInput {
        PostInput {
            title: "Hello".to_string(),
            body: "World".to_string(),
            publish_at: "2024-05-01T10:30".to_string(),
            category: Uuid::new_v4().to_string(),
            location: String::new(),
            is_published: Some("on".to_string()),
        }
    }

    #[test]
    fn test_clean_valid_post() {
        let draft = post_input().clean().unwrap();
        assert_eq!(draft.title, "Hello");
        assert!(draft.is_published);
        assert!(draft.location_id.is_none());
        assert_eq!(format_datetime(draft.publish_at), "2024-05-01T10:30");
    }

    #[test]
    fn test_clean_reports_every_bad_field() {
        let input = PostInput {
            title: "x".repeat(TITLE_MAX_LEN + 1),
            body: "   ".to_string(),
            publish_at: "yesterday".to_string(),
            category: String::new(),
            location: "not-a-uuid".to_string(),
            is_published: None,
        };
        let errors = input.clean().unwrap_err();

        assert!(errors.get("title").is_some());
        assert_eq!(errors.get("body").unwrap(), [REQUIRED.to_string()]);
        assert!(errors.get("publish_at").is_some());
        assert_eq!(errors.get("category").unwrap(), [REQUIRED.to_string()]);
        assert_eq!(errors.get("location").unwrap(), [INVALID_CHOICE.to_string()]);
    }

    #[test]
    fn test_unchecked_checkbox_is_false() {
        let mut input = post_input();
        input.is_published = None;
        assert!(!input.clean().unwrap().is_published);
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert!(parse_datetime("2024-01-02T03:04:05Z").is_some());
        assert!(parse_datetime("2024-01-02T03:04:05+02:00").is_some());
        assert!(parse_datetime("2024-01-02 03:04").is_some());
        assert!(parse_datetime("02/01/2024").is_none());
    }

    #[test]
    fn test_comment_requires_body() {
        assert!(CommentInput::default().clean().is_err());
        let draft = CommentInput {
            body: "  nice post ".to_string(),
        }
        .clean()
        .unwrap();
        assert_eq!(draft.body, "nice post");
    }

    #[test]
    fn test_profile_username_charset() {
        let mut input = ProfileInput {
            username: "jane.doe+blog".to_string(),
            email: "jane@example.com".to_string(),
            ..Default::default()
        };
        assert!(input.clean().is_ok());

        input.username = "jane doe".to_string();
        input.email = "jane@".to_string();
        let errors = input.clean().unwrap_err();
        assert!(errors.get("username").is_some());
        assert!(errors.get("email").is_some());
    }

    #[test]
    fn test_profile_username_cannot_shadow_edit_route() {
        let input = ProfileInput {
            username: "edit".to_string(),
            ..Default::default()
        };
        let errors = input.clean().unwrap_err();
        assert_eq!(
            errors.get("username").unwrap(),
            ["This username is reserved.".to_string()]
        );

        let input = ProfileInput {
            username: "editor".to_string(),
            ..Default::default()
        };
        assert!(input.clean().is_ok());
    }
}
