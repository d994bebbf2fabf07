//! User service for profile, caution, CV and account management

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::membership::{MembershipMutator, TeamLookup};
use crate::domain::notification::{AnnouncementReport, Audience, Notifier};
use crate::domain::user::{
    normalize_email, validate_password, validate_profile, CvStorage, User, UserId, UserProfile,
    UserRepository,
};
use crate::domain::DomainError;

use super::password::PasswordHasher;

const PDF_MAGIC: &[u8] = b"%PDF";
const MAX_SUBJECT_LENGTH: usize = 256;

/// Request for updating profile fields.
///
/// Absent fields are left unchanged; an empty link or comment clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub comment: Option<String>,
}

/// Request for updating a user's password
#[derive(Debug, Clone)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// User service for account management
pub struct UserService {
    users: Arc<dyn UserRepository>,
    membership: Arc<dyn MembershipMutator>,
    teams: Arc<dyn TeamLookup>,
    hasher: Arc<dyn PasswordHasher>,
    cv_storage: Arc<dyn CvStorage>,
    notifier: Arc<dyn Notifier>,
    max_cv_bytes: usize,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService")
            .field("cv_storage", &self.cv_storage)
            .field("max_cv_bytes", &self.max_cv_bytes)
            .finish_non_exhaustive()
    }
}

fn clearable(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        membership: Arc<dyn MembershipMutator>,
        teams: Arc<dyn TeamLookup>,
        hasher: Arc<dyn PasswordHasher>,
        cv_storage: Arc<dyn CvStorage>,
        notifier: Arc<dyn Notifier>,
        max_cv_bytes: usize,
    ) -> Self {
        Self {
            users,
            membership,
            teams,
            hasher,
            cv_storage,
            notifier,
            max_cv_bytes,
        }
    }

    /// Get a user by ID
    pub async fn get(&self, id: UserId) -> Result<User, DomainError> {
        self.users
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", id)))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        self.users.get_by_email(&normalize_email(email)).await
    }

    /// List all users, oldest registration first
    pub async fn list(&self) -> Result<Vec<User>, DomainError> {
        self.users.list().await
    }

    pub async fn count(&self) -> Result<usize, DomainError> {
        self.users.count().await
    }

    pub async fn update_profile(
        &self,
        id: UserId,
        request: UpdateProfileRequest,
    ) -> Result<User, DomainError> {
        let mut user = self.get(id).await?;
        let current = user.profile();

        let profile = UserProfile {
            first_name: request
                .first_name
                .map(|name| name.trim().to_string())
                .unwrap_or(current.first_name),
            last_name: request
                .last_name
                .map(|name| name.trim().to_string())
                .unwrap_or(current.last_name),
            github: request.github.map_or(current.github, clearable),
            linkedin: request.linkedin.map_or(current.linkedin, clearable),
            comment: request.comment.map_or(current.comment, clearable),
        };
        validate_profile(&profile)?;

        user.set_profile(profile);
        let user = self.users.update(&user).await?;

        info!(user_id = %id, "Profile updated");
        Ok(user)
    }

    /// Record whether the user paid the caution and refresh their team's validity
    pub async fn set_caution_status(&self, id: UserId, paid: bool) -> Result<User, DomainError> {
        let mut user = self.get(id).await?;
        user.set_paid_caution(paid);
        let user = self.users.update(&user).await?;

        info!(user_id = %id, paid, "Caution status changed");

        if let Some(team_id) = user.team_id() {
            self.teams.refresh_validity(team_id).await?;
        }

        Ok(user)
    }

    /// Give an existing account admin rights; used by the `promote-admin` command
    pub async fn grant_admin(&self, email: &str) -> Result<User, DomainError> {
        let user = self
            .get_by_email(email)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("No user with email '{}'", email)))?;

        if user.is_admin() {
            return Ok(user);
        }

        let user = self.users.update(&user.with_admin(true)).await?;
        info!(user_id = %user.id(), "Admin rights granted");
        Ok(user)
    }

    /// Delete an account.
    ///
    /// Admin accounts and owners with teammates cannot be deleted. An owner
    /// alone in their team takes the team with them.
    pub async fn delete(&self, id: UserId) -> Result<(), DomainError> {
        let user = self.get(id).await?;

        if user.is_admin() {
            return Err(DomainError::state_violation(
                "cannot delete an admin account",
            ));
        }

        let mut former_team = None;
        if let Some(team_id) = user.team_id() {
            let members = self.users.list_by_team(team_id).await?;
            let alone = members.iter().all(|m| m.id() == id);

            if alone {
                self.membership.dissolve_team(team_id).await?;
                info!(team_id = %team_id, user_id = %id, "Team dissolved with its last member");
            } else if user.is_team_owner() {
                return Err(DomainError::state_violation(
                    "owner cannot abandon teammates",
                ));
            } else {
                former_team = Some(team_id);
            }
        }

        if !self.users.delete(id).await? {
            return Err(DomainError::not_found(format!("User '{}' not found", id)));
        }

        if let Some(team_id) = former_team {
            self.teams.refresh_validity(team_id).await?;
        }

        if let Some(cv) = user.cv() {
            if let Err(e) = self.cv_storage.remove(cv).await {
                warn!(user_id = %id, error = %e, "Failed to remove CV of deleted user");
            }
        }

        info!(user_id = %id, "User deleted");
        Ok(())
    }

    /// Change the password after checking the current one; open sessions are revoked
    pub async fn change_password(
        &self,
        id: UserId,
        request: ChangePasswordRequest,
    ) -> Result<User, DomainError> {
        let mut user = self.get(id).await?;

        if !self.hasher.verify(&request.current_password, user.password_hash()) {
            return Err(DomainError::validation("Current password is incorrect"));
        }

        validate_password(&request.new_password)?;

        let new_hash = self.hasher.hash(&request.new_password)?;
        user.set_password_hash(new_hash);
        user.set_refresh_token_hash(None);

        let user = self.users.update(&user).await?;
        info!(user_id = %id, "Password changed");
        Ok(user)
    }

    /// Store an uploaded PDF as the user's CV, replacing any previous one
    pub async fn attach_cv(
        &self,
        id: UserId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<User, DomainError> {
        if !file_name.to_ascii_lowercase().ends_with(".pdf") {
            return Err(DomainError::validation("CV must be a .pdf file"));
        }
        if !bytes.starts_with(PDF_MAGIC) {
            return Err(DomainError::validation("CV is not a PDF document"));
        }
        if bytes.len() > self.max_cv_bytes {
            return Err(DomainError::validation(format!(
                "CV exceeds maximum size of {} bytes",
                self.max_cv_bytes
            )));
        }

        let mut user = self.get(id).await?;
        let previous = user.cv().map(str::to_string);

        let stored_name = format!("{}.pdf", Uuid::new_v4());
        self.cv_storage.store(&stored_name, bytes).await?;

        user.set_cv(Some(stored_name));
        let user = self.users.update(&user).await?;

        if let Some(previous) = previous {
            if let Err(e) = self.cv_storage.remove(&previous).await {
                warn!(user_id = %id, error = %e, "Failed to remove replaced CV");
            }
        }

        info!(user_id = %id, size = bytes.len(), "CV uploaded");
        Ok(user)
    }

    pub async fn read_cv(&self, id: UserId) -> Result<Vec<u8>, DomainError> {
        let user = self.get(id).await?;
        let file_name = user
            .cv()
            .ok_or_else(|| DomainError::not_found("user has no CV"))?;

        self.cv_storage
            .load(file_name)
            .await?
            .ok_or_else(|| DomainError::not_found("CV file is missing"))
    }

    /// Mail every user of the audience; each address is attempted separately
    pub async fn announce(
        &self,
        subject: &str,
        body: &str,
        audience: Audience,
    ) -> Result<AnnouncementReport, DomainError> {
        let subject = subject.trim();
        if subject.is_empty() || subject.chars().count() > MAX_SUBJECT_LENGTH {
            return Err(DomainError::validation(format!(
                "Subject must be between 1 and {} characters",
                MAX_SUBJECT_LENGTH
            )));
        }
        if body.trim().is_empty() {
            return Err(DomainError::validation("Body cannot be empty"));
        }

        let emails: Vec<String> = self
            .users
            .list()
            .await?
            .into_iter()
            .filter(|u| match audience {
                Audience::All => true,
                Audience::Formation => u.subscribe_formation(),
            })
            .map(|u| u.email().to_string())
            .collect();

        let report = self
            .notifier
            .send_announcement(subject, body, &emails)
            .await?;

        info!(
            audience = ?audience,
            recipients = report.recipients,
            delivered = report.delivered,
            failed = report.failed,
            "Announcement sent"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::MockNotifier;
    use crate::domain::team::TeamRepository;
    use crate::domain::user::MembershipState;
    use crate::infrastructure::membership::InMemoryMembershipStore;
    use crate::infrastructure::storage::InMemoryDatabase;
    use crate::infrastructure::team::{
        CreateTeamRequest, InMemoryTeamRepository, TeamRules, TeamService,
    };
    use crate::infrastructure::user::{Argon2Hasher, InMemoryCvStorage, InMemoryUserRepository};

    struct Harness {
        service: UserService,
        teams: Arc<TeamService>,
        team_repo: Arc<InMemoryTeamRepository>,
        users: Arc<InMemoryUserRepository>,
        hasher: Arc<Argon2Hasher>,
    }

    impl Harness {
        fn with_notifier(notifier: MockNotifier) -> Self {
            let db = InMemoryDatabase::new();
            let users = Arc::new(InMemoryUserRepository::new(db.clone()));
            let team_repo = Arc::new(InMemoryTeamRepository::new(db.clone()));
            let membership = Arc::new(InMemoryMembershipStore::new(db));
            let hasher = Arc::new(Argon2Hasher::new());

            let teams = Arc::new(TeamService::new(
                team_repo.clone(),
                users.clone(),
                membership.clone(),
                Arc::new(MockNotifier::new()),
                TeamRules::default(),
            ));

            let service = UserService::new(
                users.clone(),
                membership,
                teams.clone(),
                hasher.clone(),
                Arc::new(InMemoryCvStorage::new()),
                Arc::new(notifier),
                1024,
            );

            Self {
                service,
                teams,
                team_repo,
                users,
                hasher,
            }
        }

        fn new() -> Self {
            Self::with_notifier(MockNotifier::new())
        }

        async fn user(&self, first_name: &str) -> UserId {
            let user = User::new(
                UserId::generate(),
                format!("{}@example.com", first_name.to_lowercase()),
                self.hasher.hash("password123").unwrap(),
                UserProfile {
                    first_name: first_name.to_string(),
                    last_name: "Tester".to_string(),
                    ..Default::default()
                },
            );
            std::thread::sleep(std::time::Duration::from_millis(2));
            self.users.create(user).await.unwrap().id()
        }

        async fn team(&self, owner: UserId, name: &str) -> crate::domain::team::Team {
            self.teams
                .create(
                    owner,
                    CreateTeamRequest {
                        name: name.to_string(),
                        ..Default::default()
                    },
                )
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_update_profile() {
        let h = Harness::new();
        let id = h.user("Ada").await;

        let user = h
            .service
            .update_profile(
                id,
                UpdateProfileRequest {
                    last_name: Some("Lovelace".to_string()),
                    github: Some("https://github.com/ada".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(user.first_name(), "Ada");
        assert_eq!(user.last_name(), "Lovelace");
        assert_eq!(user.github(), Some("https://github.com/ada"));

        let cleared = h
            .service
            .update_profile(
                id,
                UpdateProfileRequest {
                    github: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.github(), None);
    }

    #[tokio::test]
    async fn test_grant_admin() {
        let h = Harness::new();
        let id = h.user("Grace").await;

        let user = h.service.grant_admin("  GRACE@example.com ").await.unwrap();
        assert_eq!(user.id(), id);
        assert!(h.service.get(id).await.unwrap().is_admin());

        let missing = h.service.grant_admin("nobody@example.com").await;
        assert!(matches!(missing, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_profile_validates() {
        let h = Harness::new();
        let id = h.user("Ada").await;

        let result = h
            .service
            .update_profile(
                id,
                UpdateProfileRequest {
                    first_name: Some("X1".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_caution_refreshes_team_validity() {
        let h = Harness::new();
        let alice = h.user("Alice").await;
        let team = h.team(alice, "Rockets").await;
        assert!(!team.is_valid());

        h.service.set_caution_status(alice, true).await.unwrap();
        assert!(h.team_repo.get(team.id()).await.unwrap().unwrap().is_valid());

        h.service.set_caution_status(alice, false).await.unwrap();
        assert!(!h.team_repo.get(team.id()).await.unwrap().unwrap().is_valid());
    }

    #[tokio::test]
    async fn test_caution_without_team() {
        let h = Harness::new();
        let alice = h.user("Alice").await;

        let user = h.service.set_caution_status(alice, true).await.unwrap();
        assert!(user.paid_caution());
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let h = Harness::new();
        let alice = h.user("Alice").await;
        let bob = h.user("Bob").await;
        let team = h.team(alice, "Rockets").await;
        h.teams.join(bob, team.token()).await.unwrap();
        h.service.set_caution_status(bob, true).await.unwrap();

        // Owner with a teammate
        let owner = h.service.delete(alice).await;
        assert!(matches!(owner, Err(DomainError::StateViolation { .. })));

        // Member: team stays and loses validity
        h.service.delete(bob).await.unwrap();
        assert!(!h.team_repo.get(team.id()).await.unwrap().unwrap().is_valid());

        // Owner now alone: team goes too
        h.service.delete(alice).await.unwrap();
        assert!(h.team_repo.get(team.id()).await.unwrap().is_none());
        assert_eq!(h.service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_admin_rejected() {
        let h = Harness::new();
        let admin = User::new(
            UserId::generate(),
            "root@example.com",
            "hash",
            UserProfile::default(),
        )
        .with_admin(true);
        let admin = h.users.create(admin).await.unwrap();

        let result = h.service.delete(admin.id()).await;
        assert!(matches!(result, Err(DomainError::StateViolation { .. })));
    }

    #[tokio::test]
    async fn test_change_password() {
        let h = Harness::new();
        let id = h.user("Ada").await;

        let wrong = h
            .service
            .change_password(
                id,
                ChangePasswordRequest {
                    current_password: "nope".to_string(),
                    new_password: "new_password".to_string(),
                },
            )
            .await;
        assert!(matches!(wrong, Err(DomainError::Validation { .. })));

        let user = h
            .service
            .change_password(
                id,
                ChangePasswordRequest {
                    current_password: "password123".to_string(),
                    new_password: "new_password".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(h.hasher.verify("new_password", user.password_hash()));
        assert!(user.refresh_token_hash().is_none());
    }

    #[tokio::test]
    async fn test_cv_upload_and_replace() {
        let h = Harness::new();
        let id = h.user("Ada").await;

        let first = h
            .service
            .attach_cv(id, "resume.PDF", b"%PDF-1.4 first")
            .await
            .unwrap();
        let first_name = first.cv().unwrap().to_string();
        assert!(first_name.ends_with(".pdf"));

        let second = h
            .service
            .attach_cv(id, "resume.pdf", b"%PDF-1.4 second")
            .await
            .unwrap();
        assert_ne!(second.cv().unwrap(), first_name);

        assert_eq!(h.service.read_cv(id).await.unwrap(), b"%PDF-1.4 second");
    }

    #[tokio::test]
    async fn test_cv_rejections() {
        let h = Harness::new();
        let id = h.user("Ada").await;

        let wrong_ext = h.service.attach_cv(id, "resume.docx", b"%PDF").await;
        assert!(matches!(wrong_ext, Err(DomainError::Validation { .. })));

        let wrong_magic = h.service.attach_cv(id, "resume.pdf", b"PK\x03\x04").await;
        assert!(matches!(wrong_magic, Err(DomainError::Validation { .. })));

        let mut big = b"%PDF".to_vec();
        big.resize(2048, b'x');
        let too_big = h.service.attach_cv(id, "resume.pdf", &big).await;
        assert!(matches!(too_big, Err(DomainError::Validation { .. })));

        let missing = h.service.read_cv(id).await;
        assert!(matches!(missing, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_announce_to_formation_audience() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send_announcement()
            .withf(|subject, _, emails| {
                subject == "Workshop" && emails.len() == 1 && emails[0] == "bob@example.com"
            })
            .times(1)
            .returning(|_, _, emails| {
                let mut report = AnnouncementReport::default();
                for _ in emails {
                    report.record(true);
                }
                Ok(report)
            });
        let h = Harness::with_notifier(notifier);
        h.user("Alice").await;
        let bob = User::new(
            UserId::generate(),
            "bob@example.com",
            "hash",
            UserProfile::default(),
        )
        .with_consents(true, true);
        h.users.create(bob).await.unwrap();

        let report = h
            .service
            .announce("Workshop", "Tomorrow at 10", Audience::Formation)
            .await
            .unwrap();

        assert_eq!(report.recipients, 1);
        assert_eq!(report.delivered, 1);
    }

    #[tokio::test]
    async fn test_announce_requires_subject() {
        let h = Harness::new();

        let result = h.service.announce("  ", "body", Audience::All).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_get_by_email_normalizes() {
        let h = Harness::new();
        let id = h.user("Ada").await;

        let found = h.service.get_by_email(" ADA@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id()), Some(id));
        assert_eq!(
            h.service.get(id).await.unwrap().membership(),
            MembershipState::NoTeam
        );
    }
}
