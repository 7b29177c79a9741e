//! Transactional email templates for the quote workflow.
//!
//! Templates form a closed set ([`EmailTemplateKind`]); identifiers coming
//! from the admin panel are parsed into it and anything else is rejected with
//! [`TemplateError::UnknownTemplate`]. Branding and the descriptor list live
//! in a [`TemplateCatalog`] built once at startup.

use std::fmt;
use std::str::FromStr;

use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::{Deserialize, Serialize};

use crate::config::BrandingConfig;
use crate::model::quote::{Budget, ProjectType, QuoteRequest, QuoteStatus, Timeline};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Unknown email template: {0}")]
    UnknownTemplate(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmailTemplateKind {
    #[serde(rename = "quote-confirmation")]
    QuoteConfirmation,
    #[serde(rename = "new-quote-alert")]
    NewQuoteAlert,
    #[serde(rename = "quote-status-update")]
    QuoteStatusUpdate,
    #[serde(rename = "proposal-sent")]
    ProposalSent,
}

impl EmailTemplateKind {
    pub const ALL: [EmailTemplateKind; 4] = [
        EmailTemplateKind::QuoteConfirmation,
        EmailTemplateKind::NewQuoteAlert,
        EmailTemplateKind::QuoteStatusUpdate,
        EmailTemplateKind::ProposalSent,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            EmailTemplateKind::QuoteConfirmation => "quote-confirmation",
            EmailTemplateKind::NewQuoteAlert => "new-quote-alert",
            EmailTemplateKind::QuoteStatusUpdate => "quote-status-update",
            EmailTemplateKind::ProposalSent => "proposal-sent",
        }
    }

    fn descriptor(&self) -> TemplateDescriptor {
        let (name, description, audience) = match self {
            EmailTemplateKind::QuoteConfirmation => (
                "Quote confirmation",
                "Sent to the client right after a quote request is submitted.",
                TemplateAudience::Client,
            ),
            EmailTemplateKind::NewQuoteAlert => (
                "New quote alert",
                "Sent to the site owner whenever a new quote request arrives.",
                TemplateAudience::Admin,
            ),
            EmailTemplateKind::QuoteStatusUpdate => (
                "Status update",
                "Tells the client their request moved to a new status.",
                TemplateAudience::Client,
            ),
            EmailTemplateKind::ProposalSent => (
                "Proposal sent",
                "Announces that a proposal with an estimate is on its way.",
                TemplateAudience::Client,
            ),
        };
        TemplateDescriptor {
            id: *self,
            name: name.to_string(),
            description: description.to_string(),
            audience,
        }
    }
}

impl fmt::Display for EmailTemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for EmailTemplateKind {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim();
        EmailTemplateKind::ALL
            .into_iter()
            .find(|kind| kind.id() == id)
            .ok_or_else(|| TemplateError::UnknownTemplate(id.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateAudience {
    Client,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    pub id: EmailTemplateKind,
    pub name: String,
    pub description: String,
    pub audience: TemplateAudience,
}

/// Values interpolated into a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateData {
    pub client_name: String,
    pub client_email: String,
    pub company: Option<String>,
    pub project_type: String,
    pub budget: String,
    pub timeline: String,
    pub features: Vec<String>,
    pub description: String,
    pub status: String,
    pub quote_id: String,
    pub estimated_value: Option<f64>,
    pub message: Option<String>,
}

/// Partial [`TemplateData`]; every present field replaces the base value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateDataOverride {
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub company: Option<String>,
    pub project_type: Option<String>,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub features: Option<Vec<String>>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub quote_id: Option<String>,
    pub estimated_value: Option<f64>,
    pub message: Option<String>,
}

impl TemplateData {
    /// Fixed sample record used for admin previews.
    pub fn sample() -> Self {
        TemplateData {
            client_name: "Jane Doe".to_string(),
            client_email: "jane.doe@example.com".to_string(),
            company: Some("Acme Studio".to_string()),
            project_type: project_type_label(ProjectType::WebApp).to_string(),
            budget: budget_label(Budget::From5kTo15k).to_string(),
            timeline: timeline_label(Timeline::OneToTwo).to_string(),
            features: vec![
                "User authentication".to_string(),
                "Admin dashboard".to_string(),
                "Payment integration".to_string(),
            ],
            description: "A customer portal where clients can book sessions, pay online and track their orders."
                .to_string(),
            status: status_label(QuoteStatus::Pending).to_string(),
            quote_id: "000000000000000000000000".to_string(),
            estimated_value: Some(12500.0),
            message: None,
        }
    }

    pub fn from_quote(quote: &QuoteRequest) -> Self {
        TemplateData {
            client_name: quote.name.clone(),
            client_email: quote.email.clone(),
            company: quote.company.clone(),
            project_type: project_type_label(quote.project_type).to_string(),
            budget: budget_label(quote.budget).to_string(),
            timeline: timeline_label(quote.timeline).to_string(),
            features: quote.features.clone(),
            description: quote.description.clone(),
            status: status_label(quote.status).to_string(),
            quote_id: quote.id.map(|id| id.to_hex()).unwrap_or_default(),
            estimated_value: quote.estimated_value,
            message: None,
        }
    }

    /// Base record with the override applied field by field; the override wins.
    pub fn merged(self, custom: TemplateDataOverride) -> Self {
        TemplateData {
            client_name: custom.client_name.unwrap_or(self.client_name),
            client_email: custom.client_email.unwrap_or(self.client_email),
            company: custom.company.or(self.company),
            project_type: custom.project_type.unwrap_or(self.project_type),
            budget: custom.budget.unwrap_or(self.budget),
            timeline: custom.timeline.unwrap_or(self.timeline),
            features: custom.features.unwrap_or(self.features),
            description: custom.description.unwrap_or(self.description),
            status: custom.status.unwrap_or(self.status),
            quote_id: custom.quote_id.unwrap_or(self.quote_id),
            estimated_value: custom.estimated_value.or(self.estimated_value),
            message: custom.message.or(self.message),
        }
    }
}

pub fn project_type_label(project_type: ProjectType) -> &'static str {
    match project_type {
        ProjectType::WebApp => "Web Application",
        ProjectType::MobileApp => "Mobile Application",
        ProjectType::ECommerce => "E-commerce Store",
        ProjectType::Saas => "SaaS Platform",
        ProjectType::ApiIntegration => "API / Integration",
        ProjectType::UiUxDesign => "UI/UX Design",
        ProjectType::Other => "Other",
    }
}

pub fn budget_label(budget: Budget) -> &'static str {
    match budget {
        Budget::Under5k => "Under $5,000",
        Budget::From5kTo15k => "$5,000 - $15,000",
        Budget::From15kTo50k => "$15,000 - $50,000",
        Budget::Over50k => "$50,000+",
    }
}

pub fn timeline_label(timeline: Timeline) -> &'static str {
    match timeline {
        Timeline::Asap => "As soon as possible",
        Timeline::OneToTwo => "1-2 months",
        Timeline::ThreeToSix => "3-6 months",
        Timeline::Flexible => "Flexible",
    }
}

pub fn status_label(status: QuoteStatus) -> &'static str {
    match status {
        QuoteStatus::Pending => "Pending review",
        QuoteStatus::Contacted => "Contacted",
        QuoteStatus::InProgress => "In progress",
        QuoteStatus::ProposalSent => "Proposal sent",
        QuoteStatus::Completed => "Completed",
        QuoteStatus::Rejected => "Declined",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Branding plus the list of available templates.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateCatalog {
    pub branding: BrandingConfig,
    pub templates: Vec<TemplateDescriptor>,
}

impl TemplateCatalog {
    pub fn new(branding: BrandingConfig) -> Self {
        TemplateCatalog {
            branding,
            templates: EmailTemplateKind::ALL.iter().map(|kind| kind.descriptor()).collect(),
        }
    }

    pub fn descriptors(&self) -> &[TemplateDescriptor] {
        &self.templates
    }

    /// Renders the sample record, optionally overridden, for template `id`.
    pub fn preview(&self, id: &str, custom: Option<TemplateDataOverride>) -> Result<RenderedEmail, TemplateError> {
        let kind: EmailTemplateKind = id.parse()?;
        let data = TemplateData::sample().merged(custom.unwrap_or_default());
        Ok(self.render(kind, &data))
    }

    pub fn render(&self, kind: EmailTemplateKind, data: &TemplateData) -> RenderedEmail {
        match kind {
            EmailTemplateKind::QuoteConfirmation => self.quote_confirmation(data),
            EmailTemplateKind::NewQuoteAlert => self.new_quote_alert(data),
            EmailTemplateKind::QuoteStatusUpdate => self.status_update(data),
            EmailTemplateKind::ProposalSent => self.proposal_sent(data),
        }
    }

    fn quote_confirmation(&self, data: &TemplateData) -> RenderedEmail {
        let site = &self.branding.site_name;
        let subject = format!("We received your quote request - {}", site);
        let body = format!(
            r#"<p>Hi {name},</p>
<p>Thanks for reaching out! Your request for a <strong>{project}</strong> has been received and I'll get back to you within 24-48 hours.</p>
{summary}
<p>If anything changes in the meantime, just reply to {contact}.</p>"#,
            name = encode_text(&data.client_name),
            project = encode_text(&data.project_type),
            summary = self.summary_table(data),
            contact = encode_text(&self.branding.contact_email),
        );
        let text = format!(
            "Hi {name},\n\nThanks for reaching out! Your request for a {project} has been received and I'll get back to you within 24-48 hours.\n\n{summary}\nIf anything changes in the meantime, just reply to {contact}.\n\n{signature}\n",
            name = data.client_name,
            project = data.project_type,
            summary = summary_text(data),
            contact = self.branding.contact_email,
            signature = self.branding.signature,
        );
        RenderedEmail { html: self.layout(&subject, &body), subject, text }
    }

    fn new_quote_alert(&self, data: &TemplateData) -> RenderedEmail {
        let subject = format!("New quote request from {} ({})", data.client_name, data.project_type);
        let admin_link = format!("{}/admin/marketplace/quotes/{}", self.branding.site_url, data.quote_id);
        let body = format!(
            r#"<p>A new quote request just came in.</p>
{summary}
<p><strong>Description</strong></p>
<p>{description}</p>
<p><a href="{link}">Open in admin panel</a></p>"#,
            summary = self.summary_table(data),
            description = encode_text(&data.description),
            link = encode_double_quoted_attribute(&admin_link),
        );
        let text = format!(
            "A new quote request just came in.\n\n{summary}\nDescription:\n{description}\n\nOpen in admin panel: {link}\n",
            summary = summary_text(data),
            description = data.description,
            link = admin_link,
        );
        RenderedEmail { html: self.layout(&subject, &body), subject, text }
    }

    fn status_update(&self, data: &TemplateData) -> RenderedEmail {
        let subject = format!("Update on your quote request: {}", data.status);
        let note_html = data
            .message
            .as_deref()
            .map(|m| format!("<p>{}</p>", encode_text(m)))
            .unwrap_or_default();
        let body = format!(
            r#"<p>Hi {name},</p>
<p>Your <strong>{project}</strong> request is now marked as <strong>{status}</strong>.</p>
{note}"#,
            name = encode_text(&data.client_name),
            project = encode_text(&data.project_type),
            status = encode_text(&data.status),
            note = note_html,
        );
        let note_text = data.message.as_deref().map(|m| format!("{}\n\n", m)).unwrap_or_default();
        let text = format!(
            "Hi {name},\n\nYour {project} request is now marked as {status}.\n\n{note}{signature}\n",
            name = data.client_name,
            project = data.project_type,
            status = data.status,
            note = note_text,
            signature = self.branding.signature,
        );
        RenderedEmail { html: self.layout(&subject, &body), subject, text }
    }

    fn proposal_sent(&self, data: &TemplateData) -> RenderedEmail {
        let subject = format!("Your project proposal from {}", self.branding.site_name);
        let estimate = data.estimated_value.map(format_usd);
        let estimate_html = estimate
            .as_deref()
            .map(|v| format!("<p>Estimated investment: <strong>{}</strong></p>", encode_text(v)))
            .unwrap_or_default();
        let body = format!(
            r#"<p>Hi {name},</p>
<p>The proposal for your <strong>{project}</strong> is ready and on its way to {email}.</p>
{estimate}
<p>Happy to walk through it on a call whenever suits you.</p>"#,
            name = encode_text(&data.client_name),
            project = encode_text(&data.project_type),
            email = encode_text(&data.client_email),
            estimate = estimate_html,
        );
        let estimate_text = estimate.map(|v| format!("Estimated investment: {}\n\n", v)).unwrap_or_default();
        let text = format!(
            "Hi {name},\n\nThe proposal for your {project} is ready and on its way to {email}.\n\n{estimate}Happy to walk through it on a call whenever suits you.\n\n{signature}\n",
            name = data.client_name,
            project = data.project_type,
            email = data.client_email,
            estimate = estimate_text,
            signature = self.branding.signature,
        );
        RenderedEmail { html: self.layout(&subject, &body), subject, text }
    }

    fn summary_table(&self, data: &TemplateData) -> String {
        let mut rows = vec![
            ("Name", data.client_name.clone()),
            ("Email", data.client_email.clone()),
        ];
        if let Some(company) = &data.company {
            rows.push(("Company", company.clone()));
        }
        rows.push(("Project type", data.project_type.clone()));
        rows.push(("Budget", data.budget.clone()));
        rows.push(("Timeline", data.timeline.clone()));
        if !data.features.is_empty() {
            rows.push(("Features", data.features.join(", ")));
        }
        let rows: String = rows
            .into_iter()
            .map(|(label, value)| format!("<tr><td><strong>{}</strong></td><td>{}</td></tr>\n", label, encode_text(&value)))
            .collect();
        format!("<table cellpadding=\"6\">\n{}</table>", rows)
    }

    fn layout(&self, title: &str, body: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>{title}</title></head>
<body style="font-family: Arial, sans-serif; color: #333; max-width: 600px; margin: 0 auto;">
<h2>{site}</h2>
{body}
<p>{signature}</p>
<hr>
<p style="font-size: 12px; color: #777;"><a href="{href}">{url}</a></p>
</body>
</html>"#,
            title = encode_text(title),
            site = encode_text(&self.branding.site_name),
            body = body,
            signature = encode_text(&self.branding.signature),
            href = encode_double_quoted_attribute(&self.branding.site_url),
            url = encode_text(&self.branding.site_url),
        )
    }
}

fn summary_text(data: &TemplateData) -> String {
    let mut text = format!("Name: {}\nEmail: {}\n", data.client_name, data.client_email);
    if let Some(company) = &data.company {
        text.push_str(&format!("Company: {}\n", company));
    }
    text.push_str(&format!(
        "Project type: {}\nBudget: {}\nTimeline: {}\n",
        data.project_type, data.budget, data.timeline
    ));
    if !data.features.is_empty() {
        text.push_str(&format!("Features: {}\n", data.features.join(", ")));
    }
    text
}

fn format_usd(value: f64) -> String {
    let whole = value.round().max(0.0) as u64;
    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${}", grouped)
}
