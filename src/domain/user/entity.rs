//! User entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::UserValidationError;
use crate::domain::team::TeamId;

/// User identifier (random UUID v4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its textual form
    pub fn parse(value: &str) -> Result<Self, UserValidationError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId(value.to_string()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for UserId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0.to_string()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a user stands with respect to teams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipState {
    NoTeam,
    Member(TeamId),
    Owner(TeamId),
}

impl MembershipState {
    pub fn team_id(&self) -> Option<TeamId> {
        match self {
            Self::NoTeam => None,
            Self::Member(id) | Self::Owner(id) => Some(*id),
        }
    }
}

/// Editable profile fields, shared by registration and profile updates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub comment: Option<String>,
}

/// Flat persisted form of a user, used by storage backends to rebuild entities
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub comment: Option<String>,
    pub cv: Option<String>,
    pub paid_caution: bool,
    pub is_admin: bool,
    pub is_team_owner: bool,
    pub team_id: Option<TeamId>,
    pub vote_id: Option<TeamId>,
    pub image_agreement: bool,
    pub subscribe_formation: bool,
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registered hackathon participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    /// Normalized (trimmed, lower-cased) email address
    email: String,
    /// Argon2 password hash - never exposed in serialization
    #[serde(skip_serializing)]
    password_hash: String,
    first_name: String,
    last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    /// Stored CV file name
    #[serde(skip_serializing_if = "Option::is_none")]
    cv: Option<String>,
    paid_caution: bool,
    is_admin: bool,
    is_team_owner: bool,
    team_id: Option<TeamId>,
    /// Team this user voted for
    vote_id: Option<TeamId>,
    image_agreement: bool,
    subscribe_formation: bool,
    /// SHA-256 of the currently valid refresh token
    #[serde(skip_serializing)]
    refresh_token_hash: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with no team, no caution and no admin rights
    pub fn new(
        id: UserId,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        profile: UserProfile,
    ) -> Self {
        let now = Utc::now();

        Self {
            id,
            email: email.into(),
            password_hash: password_hash.into(),
            first_name: profile.first_name,
            last_name: profile.last_name,
            github: profile.github,
            linkedin: profile.linkedin,
            comment: profile.comment,
            cv: None,
            paid_caution: false,
            is_admin: false,
            is_team_owner: false,
            team_id: None,
            vote_id: None,
            image_agreement: false,
            subscribe_formation: false,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a user from its persisted form
    pub fn restore(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            password_hash: record.password_hash,
            first_name: record.first_name,
            last_name: record.last_name,
            github: record.github,
            linkedin: record.linkedin,
            comment: record.comment,
            cv: record.cv,
            paid_caution: record.paid_caution,
            is_admin: record.is_admin,
            is_team_owner: record.is_team_owner,
            team_id: record.team_id,
            vote_id: record.vote_id,
            image_agreement: record.image_agreement,
            subscribe_formation: record.subscribe_formation,
            refresh_token_hash: record.refresh_token_hash,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    pub fn with_consents(mut self, image_agreement: bool, subscribe_formation: bool) -> Self {
        self.image_agreement = image_agreement;
        self.subscribe_formation = subscribe_formation;
        self
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    // Getters

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn github(&self) -> Option<&str> {
        self.github.as_deref()
    }

    pub fn linkedin(&self) -> Option<&str> {
        self.linkedin.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn cv(&self) -> Option<&str> {
        self.cv.as_deref()
    }

    pub fn paid_caution(&self) -> bool {
        self.paid_caution
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn is_team_owner(&self) -> bool {
        self.is_team_owner
    }

    pub fn team_id(&self) -> Option<TeamId> {
        self.team_id
    }

    pub fn vote_id(&self) -> Option<TeamId> {
        self.vote_id
    }

    pub fn image_agreement(&self) -> bool {
        self.image_agreement
    }

    pub fn subscribe_formation(&self) -> bool {
        self.subscribe_formation
    }

    pub fn refresh_token_hash(&self) -> Option<&str> {
        self.refresh_token_hash.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Current team membership state
    pub fn membership(&self) -> MembershipState {
        match (self.team_id, self.is_team_owner) {
            (None, _) => MembershipState::NoTeam,
            (Some(team_id), true) => MembershipState::Owner(team_id),
            (Some(team_id), false) => MembershipState::Member(team_id),
        }
    }

    pub fn is_member_of(&self, team_id: TeamId) -> bool {
        self.team_id == Some(team_id)
    }

    pub fn owns(&self, team_id: TeamId) -> bool {
        self.is_team_owner && self.is_member_of(team_id)
    }

    /// Flatten into the persisted form
    pub fn to_record(&self) -> UserRecord {
        UserRecord {
            id: self.id,
            email: self.email.clone(),
            password_hash: self.password_hash.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            github: self.github.clone(),
            linkedin: self.linkedin.clone(),
            comment: self.comment.clone(),
            cv: self.cv.clone(),
            paid_caution: self.paid_caution,
            is_admin: self.is_admin,
            is_team_owner: self.is_team_owner,
            team_id: self.team_id,
            vote_id: self.vote_id,
            image_agreement: self.image_agreement,
            subscribe_formation: self.subscribe_formation,
            refresh_token_hash: self.refresh_token_hash.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    // Mutators

    /// Replace the editable profile fields
    pub fn set_profile(&mut self, profile: UserProfile) {
        self.first_name = profile.first_name;
        self.last_name = profile.last_name;
        self.github = profile.github;
        self.linkedin = profile.linkedin;
        self.comment = profile.comment;
        self.touch();
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            github: self.github.clone(),
            linkedin: self.linkedin.clone(),
            comment: self.comment.clone(),
        }
    }

    pub fn set_password_hash(&mut self, password_hash: impl Into<String>) {
        self.password_hash = password_hash.into();
        self.touch();
    }

    pub fn set_refresh_token_hash(&mut self, hash: Option<String>) {
        self.refresh_token_hash = hash;
        self.touch();
    }

    pub fn set_paid_caution(&mut self, paid: bool) {
        self.paid_caution = paid;
        self.touch();
    }

    pub fn set_cv(&mut self, file_name: Option<String>) {
        self.cv = file_name;
        self.touch();
    }

    /// Put the user in a team, as owner or plain member
    pub fn join_team(&mut self, team_id: TeamId, owner: bool) {
        self.team_id = Some(team_id);
        self.is_team_owner = owner;
        if self.vote_id == Some(team_id) {
            self.vote_id = None;
        }
        self.touch();
    }

    /// Remove the user from whatever team they belong to
    pub fn leave_team(&mut self) {
        self.team_id = None;
        self.is_team_owner = false;
        self.touch();
    }

    pub fn set_team_owner(&mut self, owner: bool) {
        self.is_team_owner = owner && self.team_id.is_some();
        self.touch();
    }

    pub fn set_vote(&mut self, team_id: Option<TeamId>) {
        self.vote_id = team_id;
        self.touch();
    }

    /// Take team, ownership and vote from `stored`; those columns are only
    /// written by the membership store
    pub fn keep_membership_of(&mut self, stored: &User) {
        self.team_id = stored.team_id;
        self.is_team_owner = stored.is_team_owner;
        self.vote_id = stored.vote_id;
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_user(email: &str) -> User {
        User::new(
            UserId::generate(),
            email,
            "hashed_password",
            UserProfile {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_user_id_parse() {
        let id = UserId::generate();
        let parsed = UserId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);

        assert!(matches!(
            UserId::parse("not-a-uuid"),
            Err(UserValidationError::InvalidId(_))
        ));
    }

    #[test]
    fn test_user_creation() {
        let user = create_test_user("ada@example.com");

        assert_eq!(user.email(), "ada@example.com");
        assert_eq!(user.full_name(), "Ada Lovelace");
        assert!(!user.paid_caution());
        assert!(!user.is_admin());
        assert_eq!(user.membership(), MembershipState::NoTeam);
        assert!(user.vote_id().is_none());
    }

    #[test]
    fn test_membership_states() {
        let mut user = create_test_user("ada@example.com");
        let team = TeamId::generate();

        user.join_team(team, false);
        assert_eq!(user.membership(), MembershipState::Member(team));
        assert!(user.is_member_of(team));
        assert!(!user.owns(team));

        user.set_team_owner(true);
        assert_eq!(user.membership(), MembershipState::Owner(team));

        user.leave_team();
        assert_eq!(user.membership(), MembershipState::NoTeam);
        assert!(!user.is_team_owner());
    }

    #[test]
    fn test_owner_flag_requires_team() {
        let mut user = create_test_user("ada@example.com");
        user.set_team_owner(true);
        assert!(!user.is_team_owner());
    }

    #[test]
    fn test_joining_voted_team_drops_vote() {
        let mut user = create_test_user("ada@example.com");
        let team = TeamId::generate();

        user.set_vote(Some(team));
        user.join_team(team, false);
        assert!(user.vote_id().is_none());
    }

    #[test]
    fn test_record_round_trip_keeps_state() {
        let mut user = create_test_user("ada@example.com");
        user.set_paid_caution(true);
        user.join_team(TeamId::generate(), true);

        let restored = User::restore(user.to_record());
        assert_eq!(restored.id(), user.id());
        assert_eq!(restored.membership(), user.membership());
        assert!(restored.paid_caution());
    }

    #[test]
    fn test_set_password_touches() {
        let mut user = create_test_user("ada@example.com");
        let original_updated = user.updated_at();

        std::thread::sleep(std::time::Duration::from_millis(10));

        user.set_password_hash("new_hash");
        assert_eq!(user.password_hash(), "new_hash");
        assert!(user.updated_at() > original_updated);
    }

    #[test]
    fn test_serialization_excludes_secrets() {
        let mut user = create_test_user("ada@example.com");
        user.set_refresh_token_hash(Some("refresh-digest".to_string()));

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("hashed_password"));
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("refresh-digest"));
    }
}
