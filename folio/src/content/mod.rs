//! Portfolio content model.
//!
//! A [`Snapshot`] is the complete set of content rendered by the public site: the profile,
//! skills, projects, contact details, CV settings, and the decorative stats, highlights and
//! journey sections. Snapshots are persisted whole (remote store and local cache) and always
//! serialised with camelCase keys, so the same JSON shape is used on the wire, in the cache
//! file and in the database columns.
//!
//! - [`defaults`]: seed content used when nothing has been persisted yet
//! - [`merge`]: overlays a persisted document onto the defaults, field by field
//! - [`validation`]: input checks applied at the API boundary before a mutation

pub mod defaults;
pub mod merge;
pub mod validation;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub profile: Profile,
    pub skills: Vec<Skill>,
    pub projects: Vec<Project>,
    pub contact: ContactInfo,
    pub cv: Cv,
    pub stats: Vec<Stat>,
    pub highlights: Vec<Highlight>,
    pub journey: Vec<JourneyStep>,
}

impl Default for Snapshot {
    fn default() -> Self {
        defaults::seed()
    }
}

/// Hero and about-section content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub title: String,
    pub tagline: String,
    pub bio: String,
    pub location: String,
    /// URL of the profile picture (object storage URL, relative path or inline data URL)
    pub profile_image: String,
    /// Short skill labels shown next to the hero
    pub skills: Vec<String>,
    pub tags: Vec<ProfileTag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileTag {
    pub text: String,
    pub gradient_start: String,
    pub gradient_end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: String,
    pub name: String,
    /// Proficiency, 0 to 100
    pub level: i32,
    pub icon: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub technologies: Vec<String>,
    pub demo_url: String,
    pub code_url: String,
    pub featured: bool,
    pub category: String,
    pub stats: ProjectStats,
}

/// Display-only counters shown on a project card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub stars: u32,
    pub views: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub email: String,
    pub phone: String,
    pub location: String,
    pub github: String,
    pub linkedin: String,
    pub github_username: String,
    pub linkedin_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cv {
    /// Metadata of the uploaded file, if one has been uploaded
    pub file: Option<StoredFile>,
    /// Resolved download URL; empty when no CV is available
    pub url: String,
    pub button_text: String,
    pub show_in_hero: bool,
    pub show_in_contact: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Stat {
    pub value: String,
    pub label: String,
    /// Icon name, e.g. `trophy`
    pub icon: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub icon: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JourneyStep {
    pub phase: String,
    pub description: String,
    pub icon: String,
}

/// Partial update of the profile. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub title: Option<String>,
    pub tagline: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub profile_image: Option<String>,
    pub skills: Option<Vec<String>>,
    pub tags: Option<Vec<ProfileTag>>,
}

impl ProfilePatch {
    pub fn apply(self, profile: &mut Profile) {
        if let Some(name) = self.name {
            profile.name = name;
        }
        if let Some(title) = self.title {
            profile.title = title;
        }
        if let Some(tagline) = self.tagline {
            profile.tagline = tagline;
        }
        if let Some(bio) = self.bio {
            profile.bio = bio;
        }
        if let Some(location) = self.location {
            profile.location = location;
        }
        if let Some(profile_image) = self.profile_image {
            profile.profile_image = profile_image;
        }
        if let Some(skills) = self.skills {
            profile.skills = skills;
        }
        if let Some(tags) = self.tags {
            profile.tags = tags;
        }
    }
}

/// Partial update of the contact details.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactPatch {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub github_username: Option<String>,
    pub linkedin_name: Option<String>,
}

impl ContactPatch {
    pub fn apply(self, contact: &mut ContactInfo) {
        if let Some(email) = self.email {
            contact.email = email;
        }
        if let Some(phone) = self.phone {
            contact.phone = phone;
        }
        if let Some(location) = self.location {
            contact.location = location;
        }
        if let Some(github) = self.github {
            contact.github = github;
        }
        if let Some(linkedin) = self.linkedin {
            contact.linkedin = linkedin;
        }
        if let Some(github_username) = self.github_username {
            contact.github_username = github_username;
        }
        if let Some(linkedin_name) = self.linkedin_name {
            contact.linkedin_name = linkedin_name;
        }
    }
}

/// Partial update of the CV settings.
///
/// `file` is doubly optional: absent leaves the stored handle alone, `null` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CvPatch {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<StoredFile>)]
    pub file: Option<Option<StoredFile>>,
    pub url: Option<String>,
    pub button_text: Option<String>,
    pub show_in_hero: Option<bool>,
    pub show_in_contact: Option<bool>,
}

impl CvPatch {
    pub fn apply(self, cv: &mut Cv) {
        if let Some(file) = self.file {
            cv.file = file;
        }
        if let Some(url) = self.url {
            cv.url = url;
        }
        if let Some(button_text) = self.button_text {
            cv.button_text = button_text;
        }
        if let Some(show_in_hero) = self.show_in_hero {
            cv.show_in_hero = show_in_hero;
        }
        if let Some(show_in_contact) = self.show_in_contact {
            cv.show_in_contact = show_in_contact;
        }
    }
}

mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T: Serialize, S: Serializer>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T: Deserialize<'de>, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Option<T>>, D::Error> {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_uses_camel_case_keys() {
        let value = serde_json::to_value(Snapshot::default()).unwrap();
        assert!(value["profile"].get("profileImage").is_some());
        assert!(value["projects"][0].get("demoUrl").is_some());
        assert!(value["cv"].get("showInHero").is_some());
        assert!(value["contact"].get("githubUsername").is_some());
    }

    #[test]
    fn test_profile_patch_only_touches_supplied_fields() {
        let mut profile = Snapshot::default().profile;
        let original = profile.clone();

        let patch: ProfilePatch = serde_json::from_value(json!({ "title": "Backend Engineer" })).unwrap();
        patch.apply(&mut profile);

        assert_eq!(profile.title, "Backend Engineer");
        assert_eq!(profile.name, original.name);
        assert_eq!(profile.skills, original.skills);
    }

    #[test]
    fn test_cv_patch_distinguishes_absent_and_null_file() {
        let mut cv = Snapshot::default().cv;
        cv.file = Some(StoredFile {
            name: "resume.pdf".into(),
            mime_type: "application/pdf".into(),
            size: 1024,
        });

        let absent: CvPatch = serde_json::from_value(json!({ "buttonText": "Get CV" })).unwrap();
        absent.apply(&mut cv);
        assert_eq!(cv.button_text, "Get CV");
        assert!(cv.file.is_some());

        let cleared: CvPatch = serde_json::from_value(json!({ "file": null })).unwrap();
        cleared.apply(&mut cv);
        assert!(cv.file.is_none());
    }
}
