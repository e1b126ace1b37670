//! SMTP settings

use serde::Deserialize;

/// Settings for the SMTP relay and the sender identity
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// When false, notices are logged instead of sent
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    /// Product name shown in the email header and footer
    pub brand_name: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "smtp.example.com".to_string(),
            port: 587,
            user: String::new(),
            password: String::new(),
            from_email: "no-reply@example.com".to_string(),
            from_name: "Meraki Invoicing".to_string(),
            brand_name: "Meraki Invoicing".to_string(),
        }
    }
}

impl SmtpConfig {
    /// The `From` header value, `Name <address>`
    pub fn sender(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }
}
