//! Application state for shared services

use std::sync::Arc;

use crate::domain::notification::{AnnouncementReport, Audience};
use crate::domain::team::{Team, TeamId};
use crate::domain::user::{User, UserId};
use crate::domain::DomainError;
use crate::infrastructure::auth::{AuthService, JwtClaims, RegisterRequest, TokenPair};
use crate::infrastructure::team::{
    CreateTeamRequest, LeaveOutcome, TeamService, TeamWithMembers, UpdateTeamRequest,
};
use crate::infrastructure::user::{ChangePasswordRequest, UpdateProfileRequest, UserService};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServiceTrait>,
    pub user_service: Arc<dyn UserServiceTrait>,
    pub team_service: Arc<dyn TeamServiceTrait>,
    /// Largest accepted CV upload, also used as the multipart body limit
    pub max_cv_bytes: usize,
}

/// Trait for authentication operations
#[async_trait::async_trait]
pub trait AuthServiceTrait: Send + Sync {
    async fn register(&self, request: RegisterRequest) -> Result<User, DomainError>;
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, DomainError>;
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, DomainError>;
    async fn logout(&self, user_id: UserId) -> Result<(), DomainError>;
    /// Validate a bearer access token
    fn authenticate(&self, access_token: &str) -> Result<JwtClaims, DomainError>;
    async fn request_password_reset(&self, email: &str) -> Result<(), DomainError>;
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), DomainError>;
}

/// Trait for user account operations
#[async_trait::async_trait]
pub trait UserServiceTrait: Send + Sync {
    async fn get(&self, id: UserId) -> Result<User, DomainError>;
    async fn list(&self) -> Result<Vec<User>, DomainError>;
    async fn count(&self) -> Result<usize, DomainError>;
    async fn update_profile(
        &self,
        id: UserId,
        request: UpdateProfileRequest,
    ) -> Result<User, DomainError>;
    async fn change_password(
        &self,
        id: UserId,
        request: ChangePasswordRequest,
    ) -> Result<User, DomainError>;
    async fn set_caution_status(&self, id: UserId, paid: bool) -> Result<User, DomainError>;
    async fn delete(&self, id: UserId) -> Result<(), DomainError>;
    async fn attach_cv(
        &self,
        id: UserId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<User, DomainError>;
    async fn read_cv(&self, id: UserId) -> Result<Vec<u8>, DomainError>;
    async fn announce(
        &self,
        subject: &str,
        body: &str,
        audience: Audience,
    ) -> Result<AnnouncementReport, DomainError>;
}

/// Trait for team operations
#[async_trait::async_trait]
pub trait TeamServiceTrait: Send + Sync {
    async fn create(&self, actor: UserId, request: CreateTeamRequest)
        -> Result<Team, DomainError>;
    async fn join(&self, actor: UserId, token: &str) -> Result<Team, DomainError>;
    async fn invite(&self, actor: UserId, email: &str) -> Result<(), DomainError>;
    async fn vote(&self, actor: UserId, target: TeamId) -> Result<User, DomainError>;
    async fn leave(&self, actor: UserId) -> Result<LeaveOutcome, DomainError>;
    async fn force_leave(
        &self,
        actor: UserId,
        target: UserId,
    ) -> Result<LeaveOutcome, DomainError>;
    async fn transfer_ownership(&self, actor: UserId, new_owner: UserId)
        -> Result<(), DomainError>;
    async fn update(
        &self,
        actor: UserId,
        team_id: TeamId,
        request: UpdateTeamRequest,
    ) -> Result<Team, DomainError>;
    async fn delete(&self, actor: UserId, team_id: TeamId) -> Result<(), DomainError>;
    async fn get_with_members(&self, team_id: TeamId) -> Result<TeamWithMembers, DomainError>;
    async fn own_team(&self, actor: UserId) -> Result<TeamWithMembers, DomainError>;
    async fn list_with_members(&self) -> Result<Vec<TeamWithMembers>, DomainError>;
}

// Implement traits for the actual services

#[async_trait::async_trait]
impl AuthServiceTrait for AuthService {
    async fn register(&self, request: RegisterRequest) -> Result<User, DomainError> {
        AuthService::register(self, request).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, DomainError> {
        AuthService::login(self, email, password).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, DomainError> {
        AuthService::refresh(self, refresh_token).await
    }

    async fn logout(&self, user_id: UserId) -> Result<(), DomainError> {
        AuthService::logout(self, user_id).await
    }

    fn authenticate(&self, access_token: &str) -> Result<JwtClaims, DomainError> {
        AuthService::authenticate(self, access_token)
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), DomainError> {
        AuthService::request_password_reset(self, email).await
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), DomainError> {
        AuthService::reset_password(self, token, new_password).await
    }
}

#[async_trait::async_trait]
impl UserServiceTrait for UserService {
    async fn get(&self, id: UserId) -> Result<User, DomainError> {
        UserService::get(self, id).await
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        UserService::list(self).await
    }

    async fn count(&self) -> Result<usize, DomainError> {
        UserService::count(self).await
    }

    async fn update_profile(
        &self,
        id: UserId,
        request: UpdateProfileRequest,
    ) -> Result<User, DomainError> {
        UserService::update_profile(self, id, request).await
    }

    async fn change_password(
        &self,
        id: UserId,
        request: ChangePasswordRequest,
    ) -> Result<User, DomainError> {
        UserService::change_password(self, id, request).await
    }

    async fn set_caution_status(&self, id: UserId, paid: bool) -> Result<User, DomainError> {
        UserService::set_caution_status(self, id, paid).await
    }

    async fn delete(&self, id: UserId) -> Result<(), DomainError> {
        UserService::delete(self, id).await
    }

    async fn attach_cv(
        &self,
        id: UserId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<User, DomainError> {
        UserService::attach_cv(self, id, file_name, bytes).await
    }

    async fn read_cv(&self, id: UserId) -> Result<Vec<u8>, DomainError> {
        UserService::read_cv(self, id).await
    }

    async fn announce(
        &self,
        subject: &str,
        body: &str,
        audience: Audience,
    ) -> Result<AnnouncementReport, DomainError> {
        UserService::announce(self, subject, body, audience).await
    }
}

#[async_trait::async_trait]
impl TeamServiceTrait for TeamService {
    async fn create(
        &self,
        actor: UserId,
        request: CreateTeamRequest,
    ) -> Result<Team, DomainError> {
        TeamService::create(self, actor, request).await
    }

    async fn join(&self, actor: UserId, token: &str) -> Result<Team, DomainError> {
        TeamService::join(self, actor, token).await
    }

    async fn invite(&self, actor: UserId, email: &str) -> Result<(), DomainError> {
        TeamService::invite(self, actor, email).await
    }

    async fn vote(&self, actor: UserId, target: TeamId) -> Result<User, DomainError> {
        TeamService::vote(self, actor, target).await
    }

    async fn leave(&self, actor: UserId) -> Result<LeaveOutcome, DomainError> {
        TeamService::leave(self, actor).await
    }

    async fn force_leave(
        &self,
        actor: UserId,
        target: UserId,
    ) -> Result<LeaveOutcome, DomainError> {
        TeamService::force_leave(self, actor, target).await
    }

    async fn transfer_ownership(
        &self,
        actor: UserId,
        new_owner: UserId,
    ) -> Result<(), DomainError> {
        TeamService::transfer_ownership(self, actor, new_owner).await
    }

    async fn update(
        &self,
        actor: UserId,
        team_id: TeamId,
        request: UpdateTeamRequest,
    ) -> Result<Team, DomainError> {
        TeamService::update(self, actor, team_id, request).await
    }

    async fn delete(&self, actor: UserId, team_id: TeamId) -> Result<(), DomainError> {
        TeamService::delete(self, actor, team_id).await
    }

    async fn get_with_members(&self, team_id: TeamId) -> Result<TeamWithMembers, DomainError> {
        TeamService::get_with_members(self, team_id).await
    }

    async fn own_team(&self, actor: UserId) -> Result<TeamWithMembers, DomainError> {
        TeamService::own_team(self, actor).await
    }

    async fn list_with_members(&self) -> Result<Vec<TeamWithMembers>, DomainError> {
        TeamService::list_with_members(self).await
    }
}
