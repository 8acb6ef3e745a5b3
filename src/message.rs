//! Email request and response types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Selector value meaning "let the fallback strategy choose".
pub const AUTO: &str = "auto";

/// One address or a list of addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recipients {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for Recipients {
    fn from(address: &str) -> Self {
        Recipients::One(address.to_string())
    }
}

impl From<String> for Recipients {
    fn from(address: String) -> Self {
        Recipients::One(address)
    }
}

impl From<Vec<String>> for Recipients {
    fn from(addresses: Vec<String>) -> Self {
        Recipients::Many(addresses)
    }
}

impl From<Vec<&str>> for Recipients {
    fn from(addresses: Vec<&str>) -> Self {
        Recipients::Many(addresses.into_iter().map(String::from).collect())
    }
}

/// Flatten recipients into a list, preserving order and duplicates.
pub fn normalize_recipients(value: &Recipients) -> Vec<String> {
    match value {
        Recipients::One(address) => vec![address.clone()],
        Recipients::Many(addresses) => addresses.clone(),
    }
}

/// Which provider(s) a request may be sent through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProviderSelection {
    /// Walk every registered provider through the fallback strategy.
    #[default]
    Auto,
    /// Use exactly the provider registered under this name.
    Named(String),
}

impl fmt::Display for ProviderSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderSelection::Auto => write!(f, "{}", AUTO),
            ProviderSelection::Named(name) => write!(f, "{}", name),
        }
    }
}

impl From<&str> for ProviderSelection {
    fn from(s: &str) -> Self {
        if s == AUTO {
            ProviderSelection::Auto
        } else {
            ProviderSelection::Named(s.to_string())
        }
    }
}

impl From<String> for ProviderSelection {
    fn from(s: String) -> Self {
        if s == AUTO {
            ProviderSelection::Auto
        } else {
            ProviderSelection::Named(s)
        }
    }
}

impl From<ProviderSelection> for String {
    fn from(selection: ProviderSelection) -> Self {
        selection.to_string()
    }
}

impl FromStr for ProviderSelection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.into())
    }
}

/// An outbound email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailRequest {
    pub to: Recipients,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Sender override; providers fall back to their configured address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc: Option<Recipients>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bcc: Option<Recipients>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub provider: ProviderSelection,
}

impl EmailRequest {
    /// Create a request with automatic provider selection.
    pub fn new(to: impl Into<Recipients>, subject: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            html: None,
            text: None,
            from: None,
            cc: None,
            bcc: None,
            headers: BTreeMap::new(),
            metadata: BTreeMap::new(),
            provider: ProviderSelection::Auto,
        }
    }

    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn sender(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn cc(mut self, cc: impl Into<Recipients>) -> Self {
        self.cc = Some(cc.into());
        self
    }

    pub fn bcc(mut self, bcc: impl Into<Recipients>) -> Self {
        self.bcc = Some(bcc.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn provider(mut self, provider: impl Into<ProviderSelection>) -> Self {
        self.provider = provider.into();
        self
    }

    /// The `to` recipients as a list.
    pub fn recipients(&self) -> Vec<String> {
        normalize_recipients(&self.to)
    }
}

/// Result of a successful send.
///
/// `accepted` and `rejected` partition the normalized recipients, and
/// `accepted` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailResponse {
    pub provider: String,
    pub message_id: String,
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
}
