//! New-team form validation

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::entity::{CreateTeamRequest, Team};

/// Maximum length for team names and display names
pub const MAX_TEAM_NAME_LENGTH: usize = 128;

/// Characters a URL-friendly name may not contain
static SPECIAL_CHARACTERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\s!@#$%^&*()+=\[\]{};':"\\|,.<>/?`~]"#).unwrap());

/// Check whether a name can be used as a URL path segment
pub fn is_url_friendly_name(name: &str) -> bool {
    !SPECIAL_CHARACTERS.is_match(name)
}

/// Form field a validation message is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TeamFormField {
    Name,
    DisplayName,
}

/// Field-scoped validation messages; empty means the candidate is submittable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<TeamFormField, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: TeamFormField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: TeamFormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TeamFormField, &String)> {
        self.0.iter()
    }
}

/// Validator for new-team candidates
///
/// Each field reports at most one message, the first rule it breaks. Fields
/// are checked independently so all offending fields are reported together.
#[derive(Debug, Clone, Copy)]
pub struct TeamFormValidator {
    name_predicate: fn(&str) -> bool,
}

impl Default for TeamFormValidator {
    fn default() -> Self {
        Self {
            name_predicate: is_url_friendly_name,
        }
    }
}

impl TeamFormValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the URL-friendly name grammar
    pub fn with_name_predicate(mut self, predicate: fn(&str) -> bool) -> Self {
        self.name_predicate = predicate;
        self
    }

    /// Validate a candidate against the teams currently known
    pub fn validate(&self, candidate: &CreateTeamRequest, existing: &[Team]) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        if let Some(message) = self.name_error(&candidate.name, existing) {
            errors.insert(TeamFormField::Name, message);
        }

        if let Some(message) = display_name_error(&candidate.display_name) {
            errors.insert(TeamFormField::DisplayName, message);
        }

        errors
    }

    fn name_error(&self, name: &str, existing: &[Team]) -> Option<&'static str> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Some("Name is required");
        }

        let lowered = name.to_lowercase();
        if existing.iter().any(|team| team.name.to_lowercase() == lowered) {
            return Some("Name already exists");
        }

        if name.chars().count() > MAX_TEAM_NAME_LENGTH {
            return Some("Name size must be between 1 and 128");
        }

        if !(self.name_predicate)(trimmed) {
            return Some("Special characters are not allowed");
        }

        None
    }
}

fn display_name_error(display_name: &str) -> Option<&'static str> {
    if display_name.trim().is_empty() {
        return Some("Display name is required");
    }

    if display_name.chars().count() > MAX_TEAM_NAME_LENGTH {
        return Some("Display name size must be between 1 and 128");
    }

    None
}

/// Validation lifecycle of the new-team form
///
/// Nothing is reported until the first submit attempt or a forced
/// validation; from then on every change re-validates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "errors", rename_all = "snake_case")]
pub enum FormState {
    #[default]
    Pristine,
    Touched(ValidationErrors),
}

impl FormState {
    /// Re-validate on a field change; pristine forms stay silent
    pub fn on_change(
        &mut self,
        validator: &TeamFormValidator,
        candidate: &CreateTeamRequest,
        existing: &[Team],
    ) -> ValidationErrors {
        match self {
            Self::Pristine => ValidationErrors::new(),
            Self::Touched(_) => self.force_validate(validator, candidate, existing),
        }
    }

    /// Validate regardless of state and mark the form touched
    pub fn force_validate(
        &mut self,
        validator: &TeamFormValidator,
        candidate: &CreateTeamRequest,
        existing: &[Team],
    ) -> ValidationErrors {
        let errors = validator.validate(candidate, existing);
        *self = Self::Touched(errors.clone());
        errors
    }

    pub fn errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Pristine => None,
            Self::Touched(errors) => Some(errors),
        }
    }

    pub fn is_touched(&self) -> bool {
        matches!(self, Self::Touched(_))
    }

    pub fn reset(&mut self) {
        *self = Self::Pristine;
    }
}
