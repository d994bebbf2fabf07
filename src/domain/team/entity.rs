//! Team entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{
    validate_team_description, validate_team_idea, validate_team_name, TeamValidationError,
};

/// Team identifier (random UUID v4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamId(Uuid);

impl TeamId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its textual form
    pub fn parse(value: &str) -> Result<Self, TeamValidationError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| TeamValidationError::InvalidId(value.to_string()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for TeamId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl TryFrom<String> for TeamId {
    type Error = TeamValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TeamId> for String {
    fn from(id: TeamId) -> Self {
        id.0.to_string()
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Flat persisted form of a team
#[derive(Debug, Clone)]
pub struct TeamRecord {
    pub id: TeamId,
    pub name: String,
    pub description: String,
    pub idea: String,
    pub token: String,
    pub valid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Hackathon team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    id: TeamId,
    /// Unique display name
    name: String,
    description: String,
    idea: String,
    /// Join token, only ever shown to members
    #[serde(skip_serializing)]
    token: String,
    /// At least one member paid the caution
    valid: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Team {
    /// Create a new team after validating its fields
    pub fn new(
        id: TeamId,
        name: impl Into<String>,
        description: impl Into<String>,
        idea: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, TeamValidationError> {
        let name = name.into();
        let description = description.into();
        let idea = idea.into();
        validate_team_name(&name)?;
        validate_team_description(&description)?;
        validate_team_idea(&idea)?;
        let now = Utc::now();

        Ok(Self {
            id,
            name,
            description,
            idea,
            token: token.into(),
            valid: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuild a team from its persisted form
    pub fn restore(record: TeamRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            idea: record.idea,
            token: record.token,
            valid: record.valid,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    pub fn with_valid(mut self, valid: bool) -> Self {
        self.valid = valid;
        self
    }

    // Getters

    pub fn id(&self) -> TeamId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn idea(&self) -> &str {
        &self.idea
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn to_record(&self) -> TeamRecord {
        TeamRecord {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            idea: self.idea.clone(),
            token: self.token.clone(),
            valid: self.valid,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    // Mutators

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), TeamValidationError> {
        let name = name.into();
        validate_team_name(&name)?;
        self.name = name;
        self.touch();
        Ok(())
    }

    pub fn set_description(
        &mut self,
        description: impl Into<String>,
    ) -> Result<(), TeamValidationError> {
        let description = description.into();
        validate_team_description(&description)?;
        self.description = description;
        self.touch();
        Ok(())
    }

    pub fn set_idea(&mut self, idea: impl Into<String>) -> Result<(), TeamValidationError> {
        let idea = idea.into();
        validate_team_idea(&idea)?;
        self.idea = idea;
        self.touch();
        Ok(())
    }

    pub fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_team(name: &str) -> Team {
        Team::new(TeamId::generate(), name, "A team", "An idea", "join-token").unwrap()
    }

    #[test]
    fn test_team_id_parse() {
        let id = TeamId::generate();
        assert_eq!(TeamId::parse(&id.to_string()).unwrap(), id);
        assert!(TeamId::parse("rockets").is_err());
    }

    #[test]
    fn test_team_id_serde() {
        let id = TeamId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));

        let back: TeamId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<TeamId>("\"x\"").is_err());
    }

    #[test]
    fn test_team_creation() {
        let team = create_test_team("Rockets");

        assert_eq!(team.name(), "Rockets");
        assert_eq!(team.description(), "A team");
        assert_eq!(team.idea(), "An idea");
        assert_eq!(team.token(), "join-token");
        assert!(!team.is_valid());
    }

    #[test]
    fn test_team_creation_validates() {
        assert!(Team::new(TeamId::generate(), "ab", "", "", "t").is_err());
        assert!(Team::new(TeamId::generate(), "Rockets", "d".repeat(1025), "", "t").is_err());
    }

    #[test]
    fn test_team_update_fields() {
        let mut team = create_test_team("Rockets");

        team.set_name("Comets").unwrap();
        team.set_idea("New idea").unwrap();
        assert_eq!(team.name(), "Comets");
        assert_eq!(team.idea(), "New idea");

        assert!(team.set_name("x").is_err());
        assert_eq!(team.name(), "Comets");
    }

    #[test]
    fn test_token_not_serialized() {
        let team = create_test_team("Rockets");
        let json = serde_json::to_string(&team).unwrap();
        assert!(!json.contains("join-token"));
    }
}
