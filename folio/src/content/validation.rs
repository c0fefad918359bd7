//! Checks applied to admin edits before they reach the store.

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use super::{ContactPatch, CvPatch, ProfilePatch, Project, Skill};
use crate::errors::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: String },

    #[error("{field} must be between 0 and 100, got {value}")]
    LevelOutOfRange { field: String, value: i32 },

    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: String, value: String },

    #[error("duplicate id '{id}' in {list}")]
    DuplicateId { list: String, id: String },

    #[error("{field} is not a valid email address")]
    InvalidEmail { field: String },
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::BadRequest { message: err.to_string() }
    }
}

pub type Result<T = ()> = std::result::Result<T, ValidationError>;

pub fn validate_skills(skills: &[Skill]) -> Result {
    let mut seen = HashSet::new();
    for (i, skill) in skills.iter().enumerate() {
        non_empty(&format!("skills[{i}].id"), &skill.id)?;
        non_empty(&format!("skills[{i}].name"), &skill.name)?;
        if !(0..=100).contains(&skill.level) {
            return Err(ValidationError::LevelOutOfRange {
                field: format!("skills[{i}].level"),
                value: skill.level,
            });
        }
        if !seen.insert(skill.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                list: "skills".into(),
                id: skill.id.clone(),
            });
        }
    }
    Ok(())
}

pub fn validate_projects(projects: &[Project]) -> Result {
    let mut seen = HashSet::new();
    for (i, project) in projects.iter().enumerate() {
        non_empty(&format!("projects[{i}].id"), &project.id)?;
        non_empty(&format!("projects[{i}].title"), &project.title)?;
        optional_url(&format!("projects[{i}].demoUrl"), &project.demo_url)?;
        optional_url(&format!("projects[{i}].codeUrl"), &project.code_url)?;
        if !seen.insert(project.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                list: "projects".into(),
                id: project.id.clone(),
            });
        }
    }
    Ok(())
}

pub fn validate_profile_patch(patch: &ProfilePatch) -> Result {
    if let Some(name) = &patch.name {
        non_empty("profile.name", name)?;
    }
    if let Some(title) = &patch.title {
        non_empty("profile.title", title)?;
    }
    Ok(())
}

pub fn validate_contact_patch(patch: &ContactPatch) -> Result {
    if let Some(email) = &patch.email
        && !email.is_empty()
        && !looks_like_email(email)
    {
        return Err(ValidationError::InvalidEmail {
            field: "contact.email".into(),
        });
    }
    if let Some(github) = &patch.github {
        optional_url("contact.github", github)?;
    }
    if let Some(linkedin) = &patch.linkedin {
        optional_url("contact.linkedin", linkedin)?;
    }
    Ok(())
}

/// `url` may be an absolute URL, a site-relative path or an inline `data:` URL.
pub fn validate_cv_patch(patch: &CvPatch) -> Result {
    if let Some(button_text) = &patch.button_text {
        non_empty("cv.buttonText", button_text)?;
    }
    if let Some(url) = &patch.url
        && !url.is_empty()
        && !url.starts_with('/')
    {
        optional_url("cv.url", url)?;
    }
    Ok(())
}

pub fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'),
        None => false,
    }
}

fn non_empty(field: &str, value: &str) -> Result {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field: field.into() });
    }
    Ok(())
}

fn optional_url(field: &str, value: &str) -> Result {
    if value.is_empty() {
        return Ok(());
    }
    Url::parse(value).map(|_| ()).map_err(|_| ValidationError::InvalidUrl {
        field: field.into(),
        value: value.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::defaults;

    #[test]
    fn test_skill_level_bounds() {
        let mut skills = defaults::skills();
        skills[0].level = 100;
        skills[1].level = 0;
        assert!(validate_skills(&skills).is_ok());

        skills[2].level = 101;
        assert_eq!(
            validate_skills(&skills),
            Err(ValidationError::LevelOutOfRange {
                field: "skills[2].level".into(),
                value: 101
            })
        );

        skills[2].level = -1;
        assert!(validate_skills(&skills).is_err());
    }

    #[test]
    fn test_duplicate_skill_ids_rejected() {
        let mut skills = defaults::skills();
        skills[3].id = skills[0].id.clone();
        assert!(matches!(validate_skills(&skills), Err(ValidationError::DuplicateId { .. })));
    }

    #[test]
    fn test_project_urls() {
        let mut projects = defaults::projects();
        projects[0].demo_url = String::new();
        assert!(validate_projects(&projects).is_ok());

        projects[1].code_url = "github.com/nope".into();
        let err = validate_projects(&projects).unwrap_err();
        assert!(err.to_string().contains("projects[1].codeUrl"));
    }

    #[test]
    fn test_contact_patch() {
        let ok = ContactPatch {
            email: Some("me@example.com".into()),
            github: Some("https://github.com/me".into()),
            ..Default::default()
        };
        assert!(validate_contact_patch(&ok).is_ok());

        let bad_email = ContactPatch {
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        assert!(validate_contact_patch(&bad_email).is_err());

        let bad_url = ContactPatch {
            linkedin: Some("linkedin/me".into()),
            ..Default::default()
        };
        assert!(validate_contact_patch(&bad_url).is_err());
    }

    #[test]
    fn test_cv_patch_accepts_relative_and_data_urls() {
        for url in ["", "/files/resume.pdf", "https://cdn.example.com/cv.pdf", "data:application/pdf;base64,JVBERi0="] {
            let patch = CvPatch {
                url: Some(url.into()),
                ..Default::default()
            };
            assert!(validate_cv_patch(&patch).is_ok(), "{url} should be accepted");
        }

        let blank_label = CvPatch {
            button_text: Some("  ".into()),
            ..Default::default()
        };
        assert!(validate_cv_patch(&blank_label).is_err());
    }

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("visitor@example.org"));
        assert!(!looks_like_email("@example.org"));
        assert!(!looks_like_email("visitor@localhost"));
        assert!(!looks_like_email("visitor@.org"));
    }
}
