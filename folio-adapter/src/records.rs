//! Typed records decoded from portfolio documents.

use core::fmt;
use core::str::FromStr;

use folio::{Document, Keyed};
use serde::{Deserialize, Deserializer, Serialize};

/// Lifecycle of a startup.
///
/// Stored values outside the known set are kept verbatim in [`ProjectStatus::Other`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectStatus {
    Active,
    Pending,
    Beta,
    Acquired,
    Completed,
    #[serde(untagged)]
    Other(String),
}

impl ProjectStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "Active",
            Self::Pending => "Pending",
            Self::Beta => "Beta",
            Self::Acquired => "Acquired",
            Self::Completed => "Completed",
            Self::Other(other) => other,
        }
    }

    /// Maps known labels to their variant and anything else to [`ProjectStatus::Other`].
    pub fn from_label(label: &str) -> Self {
        label
            .parse()
            .unwrap_or_else(|UnknownStatus(other)| Self::Other(other))
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown project status {0:?}")]
pub struct UnknownStatus(pub String);

/// Strict parse: only the known labels are accepted.
impl FromStr for ProjectStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Active" => Ok(Self::Active),
            "Pending" => Ok(Self::Pending),
            "Beta" => Ok(Self::Beta),
            "Acquired" => Ok(Self::Acquired),
            "Completed" => Ok(Self::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Blank strings are how the admin form stores "no status".
fn blank_status<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ProjectStatus>, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(label) => {
            let status = ProjectStatus::from_label(label);
            if let ProjectStatus::Other(_other) = &status {
                fwarn!(status = %_other, "unrecognised project status kept as-is");
            }
            Ok(Some(status))
        }
    }
}

/// A showcased project or startup.
///
/// Startups are projects that carry a [`ProjectStatus`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stack: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, alias = "previewURL")]
    pub preview_url: Option<String>,
    #[serde(default, alias = "githubURL")]
    pub github_url: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(
        default,
        deserialize_with = "blank_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<ProjectStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

impl Project {
    pub fn is_startup(&self) -> bool {
        self.status.is_some()
    }
}

/// Decodes every keyed document that parses as a [`Project`], skipping the rest.
pub fn decode_projects(items: &[Keyed<Document>]) -> Vec<Keyed<Project>> {
    items
        .iter()
        .filter_map(|item| match item.decode::<Project>() {
            Ok(project) => Some(project),
            Err(_err) => {
                fwarn!(id = %item.id, error = %_err, "skipping undecodable project");
                None
            }
        })
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub name: String,
    pub href: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlocks {
    #[serde(default)]
    pub mail: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(flatten)]
    pub other: Document,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBlocks {
    #[serde(default)]
    pub profile: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub text_blocks: TextBlocks,
    #[serde(default)]
    pub description_blocks: serde_json::Value,
    #[serde(default)]
    pub achievement_blocks: serde_json::Value,
    #[serde(default)]
    pub skill_blocks: serde_json::Value,
    #[serde(default)]
    pub image_blocks: ImageBlocks,
}

/// The site owner's profile, as stored in the `user` collection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "userInfo", default)]
    pub info: UserInfo,
    #[serde(default)]
    pub social_blocks: Vec<SocialLink>,
}

/// What the contact and footer sections show.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactInfo {
    pub mail: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub socials: Vec<SocialLink>,
}

impl UserProfile {
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        Self::deserialize(serde_json::Value::Object(doc.clone()))
    }

    /// The profile of the first `user` document, if there is one and it decodes.
    pub fn first(docs: &[Document]) -> Option<Self> {
        Self::from_document(docs.first()?).ok()
    }

    pub fn profile_image(&self) -> Option<&str> {
        self.info.image_blocks.profile.as_deref()
    }

    pub fn contact(&self) -> ContactInfo {
        let text = &self.info.text_blocks;
        ContactInfo {
            mail: text.mail.clone(),
            phone: text.phone.clone(),
            location: text.location.clone(),
            socials: self.social_blocks.clone(),
        }
    }
}
