//! crates/call_desk_core/src/notification.rs
//!
//! Staff notifications: the three kinds the relay accepts, their payloads and
//! the HTML templates they render to.

use serde::Deserialize;
use std::str::FromStr;

use crate::domain::{Message, Task, TaskCategory};

const SUBJECT_TASK_CREATED: &str = "✨ Nueva Tarea Pendiente - IA Prejudicial";
const SUBJECT_TASK_COMPLETED: &str = "✅ Tarea Completada - IA Prejudicial";
const SUBJECT_FEEDBACK_CREATED: &str = "💬 Nuevo Feedback del Equipo - IA Prejudicial";

const MC2_COLOR: &str = "#10b981";
const TELVIA_COLOR: &str = "#3b82f6";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    TaskCreated,
    TaskCompleted,
    FeedbackCreated,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::TaskCreated => "task_created",
            NotificationKind::TaskCompleted => "task_completed",
            NotificationKind::FeedbackCreated => "feedback_created",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification type is required")]
    MissingKind,
    #[error("Invalid notification type")]
    UnknownKind(String),
}

impl FromStr for NotificationKind {
    type Err = NotificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task_created" => Ok(NotificationKind::TaskCreated),
            "task_completed" => Ok(NotificationKind::TaskCompleted),
            "feedback_created" => Ok(NotificationKind::FeedbackCreated),
            other => Err(NotificationError::UnknownKind(other.to_string())),
        }
    }
}

/// Payload of the task notifications. Missing fields render as empty text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TaskNotice {
    pub text: String,
    pub category: Option<String>,
}

/// Payload of the feedback notification.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedbackNotice {
    pub text: String,
    pub author_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    TaskCreated(TaskNotice),
    TaskCompleted(TaskNotice),
    FeedbackCreated(FeedbackNotice),
}

/// Subject and body of a notification email.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

impl Notification {
    /// Builds a notification from the relay's `type` and `data` fields.
    ///
    /// A `data` value of the wrong shape is treated like an empty payload.
    pub fn parse(kind: Option<&str>, data: Option<serde_json::Value>) -> Result<Self, NotificationError> {
        let kind = match kind {
            Some(k) if !k.is_empty() => k.parse::<NotificationKind>()?,
            _ => return Err(NotificationError::MissingKind),
        };
        let data = data.unwrap_or(serde_json::Value::Null);
        Ok(match kind {
            NotificationKind::TaskCreated => {
                Notification::TaskCreated(serde_json::from_value(data).unwrap_or_default())
            }
            NotificationKind::TaskCompleted => {
                Notification::TaskCompleted(serde_json::from_value(data).unwrap_or_default())
            }
            NotificationKind::FeedbackCreated => {
                Notification::FeedbackCreated(serde_json::from_value(data).unwrap_or_default())
            }
        })
    }

    pub fn task_created(task: &Task) -> Self {
        Notification::TaskCreated(TaskNotice::from(task))
    }

    pub fn task_completed(task: &Task) -> Self {
        Notification::TaskCompleted(TaskNotice::from(task))
    }

    pub fn feedback_created(message: &Message) -> Self {
        Notification::FeedbackCreated(FeedbackNotice {
            text: message.text.clone(),
            author_name: message.author_name.clone(),
        })
    }

    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::TaskCreated(_) => NotificationKind::TaskCreated,
            Notification::TaskCompleted(_) => NotificationKind::TaskCompleted,
            Notification::FeedbackCreated(_) => NotificationKind::FeedbackCreated,
        }
    }

    /// Renders the email. `app_url` is the dashboard link in the button and footer.
    pub fn render(&self, app_url: &str) -> RenderedEmail {
        let (subject, content) = match self {
            Notification::TaskCreated(notice) => (SUBJECT_TASK_CREATED, task_created_content(notice)),
            Notification::TaskCompleted(notice) => {
                (SUBJECT_TASK_COMPLETED, task_completed_content(notice))
            }
            Notification::FeedbackCreated(notice) => {
                (SUBJECT_FEEDBACK_CREATED, feedback_content(notice))
            }
        };
        RenderedEmail {
            subject: subject.to_string(),
            html: wrap(&content, app_url),
        }
    }
}

impl From<&Task> for TaskNotice {
    fn from(task: &Task) -> Self {
        Self {
            text: task.text.clone(),
            category: Some(task.category.as_str().to_string()),
        }
    }
}

/// Label and accent colour of a category. Anything but `mc2` is shown as Telvia.
fn category_style(category: Option<&str>) -> (&'static str, &'static str) {
    match category.and_then(|c| c.parse::<TaskCategory>().ok()) {
        Some(TaskCategory::Mc2) => (TaskCategory::Mc2.label(), MC2_COLOR),
        _ => (TaskCategory::Telvia.label(), TELVIA_COLOR),
    }
}

/// Escapes text for interpolation into HTML element content and attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn task_created_content(notice: &TaskNotice) -> String {
    let (label, color) = category_style(notice.category.as_deref());
    format!(
        r#"<div style="text-align: center; margin-bottom: 30px;">
    <div style="display: inline-block; background-color: #f0fdf4; padding: 16px; border-radius: 50%; margin-bottom: 20px;"><span style="font-size: 48px;">📋</span></div>
    <h2 style="margin: 0 0 10px 0; color: #1f2937; font-size: 24px; font-weight: 600;">Nueva Tarea Pendiente</h2>
    <p style="margin: 0; color: #6b7280; font-size: 16px;">Se ha creado una nueva tarea que requiere atención</p>
</div>
<div style="background-color: #f9fafb; border-left: 4px solid {color}; padding: 20px; margin: 20px 0; border-radius: 6px;">
    <p style="margin: 0 0 8px 0; color: #6b7280; font-size: 12px; text-transform: uppercase; letter-spacing: 0.5px; font-weight: 600;">Categoría: <span style="color: {color};">{label}</span></p>
    <p style="margin: 0; color: #1f2937; font-size: 16px; line-height: 1.6;">{text}</p>
</div>
<p style="margin: 20px 0 0 0; color: #6b7280; font-size: 14px; text-align: center;">Accede al dashboard para gestionar esta tarea</p>"#,
        color = color,
        label = label,
        text = escape_html(&notice.text),
    )
}

fn task_completed_content(notice: &TaskNotice) -> String {
    let (label, color) = category_style(notice.category.as_deref());
    format!(
        r#"<div style="text-align: center; margin-bottom: 30px;">
    <div style="display: inline-block; background-color: #f0fdf4; padding: 16px; border-radius: 50%; margin-bottom: 20px;"><span style="font-size: 48px;">✅</span></div>
    <h2 style="margin: 0 0 10px 0; color: #1f2937; font-size: 24px; font-weight: 600;">Tarea Completada</h2>
    <p style="margin: 0; color: #6b7280; font-size: 16px;">Una tarea ha sido marcada como completada</p>
</div>
<div style="background-color: #f0fdf4; border-left: 4px solid {done}; padding: 20px; margin: 20px 0; border-radius: 6px;">
    <p style="margin: 0 0 8px 0; color: #6b7280; font-size: 12px; text-transform: uppercase; letter-spacing: 0.5px; font-weight: 600;">Categoría: <span style="color: {color};">{label}</span></p>
    <p style="margin: 0; color: #1f2937; font-size: 16px; line-height: 1.6;">{text}</p>
</div>
<p style="margin: 20px 0 0 0; color: #6b7280; font-size: 14px; text-align: center;">¡Excelente trabajo! Esta tarea ha sido finalizada.</p>"#,
        done = MC2_COLOR,
        color = color,
        label = label,
        text = escape_html(&notice.text),
    )
}

fn feedback_content(notice: &FeedbackNotice) -> String {
    let author = notice
        .author_name
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(escape_html);
    let author_line = author
        .as_deref()
        .map(|a| {
            format!(
                r#"<p style="margin: 0 0 12px 0; color: #6366f1; font-size: 14px; font-weight: 600;">{a}</p>"#
            )
        })
        .unwrap_or_default();
    format!(
        r#"<div style="text-align: center; margin-bottom: 30px;">
    <div style="display: inline-block; background-color: #eff6ff; padding: 16px; border-radius: 50%; margin-bottom: 20px;"><span style="font-size: 48px;">💬</span></div>
    <h2 style="margin: 0 0 10px 0; color: #1f2937; font-size: 24px; font-weight: 600;">Nuevo Feedback del Equipo</h2>
    <p style="margin: 0; color: #6b7280; font-size: 16px;">{who} ha dejado un nuevo mensaje</p>
</div>
<div style="background-color: #f9fafb; border-left: 4px solid #6366f1; padding: 20px; margin: 20px 0; border-radius: 6px;">
    {author_line}
    <p style="margin: 0; color: #1f2937; font-size: 16px; line-height: 1.6;">{text}</p>
</div>
<p style="margin: 20px 0 0 0; color: #6b7280; font-size: 14px; text-align: center;">Accede al dashboard para ver todos los mensajes y responder</p>"#,
        who = author.as_deref().unwrap_or("Un miembro del equipo"),
        author_line = author_line,
        text = escape_html(&notice.text),
    )
}

fn wrap(content: &str, app_url: &str) -> String {
    let app_url = escape_html(app_url);
    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Notificación - IA Prejudicial</title>
</head>
<body style="margin: 0; padding: 0; font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background-color: #f4f7fa;">
<table role="presentation" style="width: 100%; border-collapse: collapse;">
<tr><td align="center" style="padding: 40px 0;">
<table role="presentation" style="width: 600px; max-width: 100%; background-color: #ffffff; border-radius: 12px; overflow: hidden;">
    <tr><td style="background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); padding: 40px 30px; text-align: center;">
        <h1 style="margin: 0; color: #ffffff; font-size: 28px; font-weight: 600;">🤖 IA Prejudicial</h1>
        <p style="margin: 10px 0 0 0; color: rgba(255, 255, 255, 0.9); font-size: 14px;">Sistema de Gestión Legal MC2</p>
    </td></tr>
    <tr><td style="padding: 40px 30px;">
{content}
    </td></tr>
    <tr><td style="padding: 0 30px 40px 30px; text-align: center;">
        <a href="{app_url}" style="display: inline-block; padding: 14px 32px; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: #ffffff; text-decoration: none; border-radius: 8px; font-weight: 600; font-size: 16px;">Ir al Dashboard</a>
    </td></tr>
    <tr><td style="background-color: #f8f9fb; padding: 20px 30px; text-align: center; border-top: 1px solid #e5e7eb;">
        <p style="margin: 0; color: #6b7280; font-size: 13px;">Este es un mensaje automático de la IA Prejudicial<br><a href="{app_url}" style="color: #667eea; text-decoration: none;">MC2 Legal Dashboard</a></p>
    </td></tr>
</table>
</td></tr>
</table>
</body>
</html>"#
    )
}
