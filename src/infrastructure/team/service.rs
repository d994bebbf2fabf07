//! Team service: membership and validity state machine

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::membership::{MembershipMutator, OwnerLeavePolicy, TeamLookup};
use crate::domain::notification::Notifier;
use crate::domain::team::{
    validate_invitations, validate_team_description, validate_team_idea, validate_team_name,
    Team, TeamId, TeamRepository,
};
use crate::domain::user::{normalize_email, validate_email, User, UserId, UserRepository};
use crate::domain::DomainError;
use crate::infrastructure::observability::record_team_transition;

use super::token::generate_join_token;

const TOKEN_ATTEMPTS: usize = 5;

/// Request for creating a new team
#[derive(Debug, Clone, Default)]
pub struct CreateTeamRequest {
    pub name: String,
    pub description: String,
    pub idea: String,
    /// Addresses to invite right after creation
    pub invitations: Vec<String>,
}

/// Request for updating a team; absent fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub idea: Option<String>,
}

/// A team with its current members, oldest registration first
#[derive(Debug, Clone)]
pub struct TeamWithMembers {
    pub team: Team,
    pub members: Vec<User>,
}

/// Result of a member leaving (or being removed from) a team
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The member left; the team remains with recomputed validity
    Left { team_id: TeamId, valid: bool },
    /// The member was the last one and the team was deleted
    Dissolved { team_id: TeamId },
}

/// Team rules that come from configuration
#[derive(Debug, Clone, Copy)]
pub struct TeamRules {
    pub max_members: usize,
    pub owner_leave_policy: OwnerLeavePolicy,
}

impl Default for TeamRules {
    fn default() -> Self {
        Self {
            max_members: 5,
            owner_leave_policy: OwnerLeavePolicy::Reject,
        }
    }
}

/// Team service for team formation, invitations and votes
pub struct TeamService {
    teams: Arc<dyn TeamRepository>,
    users: Arc<dyn UserRepository>,
    membership: Arc<dyn MembershipMutator>,
    notifier: Arc<dyn Notifier>,
    rules: TeamRules,
}

impl std::fmt::Debug for TeamService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamService")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

fn user_not_found(id: UserId) -> DomainError {
    DomainError::not_found(format!("User '{}' not found", id))
}

fn team_not_found(id: TeamId) -> DomainError {
    DomainError::not_found(format!("Team '{}' not found", id))
}

impl TeamService {
    pub fn new(
        teams: Arc<dyn TeamRepository>,
        users: Arc<dyn UserRepository>,
        membership: Arc<dyn MembershipMutator>,
        notifier: Arc<dyn Notifier>,
        rules: TeamRules,
    ) -> Self {
        Self {
            teams,
            users,
            membership,
            notifier,
            rules,
        }
    }

    async fn load_user(&self, id: UserId) -> Result<User, DomainError> {
        self.users.get(id).await?.ok_or_else(|| user_not_found(id))
    }

    /// Create a team owned by `actor` and send the optional invitations
    pub async fn create(
        &self,
        actor: UserId,
        request: CreateTeamRequest,
    ) -> Result<Team, DomainError> {
        let name = request.name.trim().to_string();
        validate_team_name(&name)?;
        validate_team_description(&request.description)?;
        validate_team_idea(&request.idea)?;

        let invitations: Vec<String> = request
            .invitations
            .iter()
            .map(|email| normalize_email(email))
            .collect();
        validate_invitations(&invitations)?;

        let user = self.load_user(actor).await?;
        if user.team_id().is_some() {
            return Err(DomainError::state_violation("user already has a team"));
        }

        if self.teams.name_exists(&name).await? {
            return Err(DomainError::conflict(format!(
                "Team name '{}' is already taken",
                name
            )));
        }

        let token = self.unused_token().await?;
        let team = Team::new(TeamId::generate(), name, request.description, request.idea, token)?
            .with_valid(user.paid_caution());

        let team = self
            .membership
            .create_team_with_owner(team, user.id())
            .await?;

        record_team_transition("create");
        info!(team_id = %team.id(), owner = %user.id(), name = %team.name(), "Team created");

        for email in &invitations {
            if let Err(e) = self.notifier.send_invitation(&team, email).await {
                warn!(team_id = %team.id(), email = %email, error = %e, "Failed to send team invitation");
            }
        }

        Ok(team)
    }

    /// Draw join tokens until one is not used by any team
    async fn unused_token(&self) -> Result<String, DomainError> {
        for attempt in 1..=TOKEN_ATTEMPTS {
            let token = generate_join_token();
            if self.teams.get_by_token(&token).await?.is_none() {
                return Ok(token);
            }
            debug!(attempt, "Join token collision, retrying");
        }

        Err(DomainError::internal(
            "could not generate a unique team token",
        ))
    }

    /// Join the team identified by `token`
    pub async fn join(&self, actor: UserId, token: &str) -> Result<Team, DomainError> {
        let user = self.load_user(actor).await?;
        if user.team_id().is_some() {
            return Err(DomainError::state_violation("user already has a team"));
        }

        let team = self
            .teams
            .get_by_token(token)
            .await?
            .ok_or_else(|| DomainError::state_violation("invalid team token"))?;

        let members = self.users.list_by_team(team.id()).await?;
        if members.len() >= self.rules.max_members {
            return Err(DomainError::state_violation("team is full"));
        }

        self.membership.assign_member(team.id(), user.id()).await?;
        let valid = self.update_validity(team.id()).await?;

        record_team_transition("join");
        info!(team_id = %team.id(), user_id = %user.id(), "User joined team");

        Ok(team.with_valid(valid))
    }

    /// Send the caller's team join token to `email`
    pub async fn invite(&self, actor: UserId, email: &str) -> Result<(), DomainError> {
        let email = normalize_email(email);
        validate_email(&email)?;

        let user = self.load_user(actor).await?;
        let team_id = user
            .team_id()
            .ok_or_else(|| DomainError::state_violation("user has no team"))?;
        let team = self
            .teams
            .get(team_id)
            .await?
            .ok_or_else(|| team_not_found(team_id))?;

        self.notifier.send_invitation(&team, &email).await?;

        info!(team_id = %team_id, invited_by = %user.id(), "Team invitation sent");
        Ok(())
    }

    /// Vote for another valid team; a new vote replaces the previous one
    pub async fn vote(&self, actor: UserId, target: TeamId) -> Result<User, DomainError> {
        let user = self.load_user(actor).await?;
        let own_team = user
            .team_id()
            .ok_or_else(|| DomainError::state_violation("user has no team"))?;

        if own_team == target {
            return Err(DomainError::state_violation(
                "cannot vote for your own team",
            ));
        }

        let team = self
            .teams
            .get(target)
            .await?
            .ok_or_else(|| team_not_found(target))?;

        if !team.is_valid() {
            return Err(DomainError::state_violation(
                "cannot vote for an invalid team",
            ));
        }

        let user = self.membership.record_vote(user.id(), Some(target)).await?;

        record_team_transition("vote");
        info!(user_id = %user.id(), team_id = %target, "Vote recorded");

        Ok(user)
    }

    /// Leave the caller's team
    pub async fn leave(&self, actor: UserId) -> Result<LeaveOutcome, DomainError> {
        let user = self.load_user(actor).await?;
        self.remove_member(&user, self.rules.owner_leave_policy).await
    }

    /// Remove `target` from their team.
    ///
    /// Admins may remove anyone; team owners may remove their teammates. An
    /// owner removed by an admin hands the team to the oldest teammate.
    pub async fn force_leave(
        &self,
        actor: UserId,
        target: UserId,
    ) -> Result<LeaveOutcome, DomainError> {
        if actor == target {
            return self.leave(actor).await;
        }

        let actor = self.load_user(actor).await?;
        let target = self.load_user(target).await?;

        let allowed = actor.is_admin()
            || target
                .team_id()
                .is_some_and(|team_id| actor.owns(team_id));

        if !allowed {
            return Err(DomainError::forbidden(
                "only the team owner or an admin can remove a member",
            ));
        }

        let policy = if actor.is_admin() {
            OwnerLeavePolicy::PromoteOldestMember
        } else {
            self.rules.owner_leave_policy
        };

        let outcome = self.remove_member(&target, policy).await?;
        info!(actor = %actor.id(), target = %target.id(), "Member removed from team");
        Ok(outcome)
    }

    async fn remove_member(
        &self,
        user: &User,
        policy: OwnerLeavePolicy,
    ) -> Result<LeaveOutcome, DomainError> {
        let team_id = user
            .team_id()
            .ok_or_else(|| DomainError::state_violation("user has no team"))?;

        let members = self.users.list_by_team(team_id).await?;
        let others: Vec<&User> = members.iter().filter(|m| m.id() != user.id()).collect();

        if others.is_empty() {
            self.membership.dissolve_team(team_id).await?;

            record_team_transition("dissolve");
            info!(team_id = %team_id, user_id = %user.id(), "Last member left, team dissolved");
            return Ok(LeaveOutcome::Dissolved { team_id });
        }

        if user.is_team_owner() {
            match policy {
                OwnerLeavePolicy::Reject => {
                    return Err(DomainError::state_violation(
                        "owner cannot abandon teammates",
                    ));
                }
                OwnerLeavePolicy::PromoteOldestMember => {
                    let successor = others[0];
                    self.membership
                        .transfer_ownership(user.id(), successor.id())
                        .await?;
                    info!(team_id = %team_id, new_owner = %successor.id(), "Ownership handed over");
                }
            }
        }

        self.membership.release_member(user.id()).await?;
        let valid = self.update_validity(team_id).await?;

        record_team_transition("leave");
        info!(team_id = %team_id, user_id = %user.id(), valid, "User left team");

        Ok(LeaveOutcome::Left { team_id, valid })
    }

    /// Hand team ownership to another member of the caller's team
    pub async fn transfer_ownership(
        &self,
        actor: UserId,
        new_owner: UserId,
    ) -> Result<(), DomainError> {
        let owner = self.load_user(actor).await?;
        if !owner.is_team_owner() {
            return Err(DomainError::forbidden(
                "only the team owner can transfer ownership",
            ));
        }
        if actor == new_owner {
            return Err(DomainError::state_violation("user already owns the team"));
        }

        // Surfaces a 404 for unknown users before the store checks membership
        self.load_user(new_owner).await?;
        self.membership.transfer_ownership(actor, new_owner).await?;

        record_team_transition("transfer_ownership");
        info!(from = %actor, to = %new_owner, "Team ownership transferred");
        Ok(())
    }

    /// Recompute whether any member paid the caution and persist it if changed
    pub async fn update_validity(&self, team_id: TeamId) -> Result<bool, DomainError> {
        let team = self
            .teams
            .get(team_id)
            .await?
            .ok_or_else(|| team_not_found(team_id))?;

        let members = self.users.list_by_team(team_id).await?;
        let valid = members.iter().any(User::paid_caution);

        if team.is_valid() != valid {
            self.teams.set_validity(team_id, valid).await?;
            info!(team_id = %team_id, valid, "Team validity changed");
        }

        Ok(valid)
    }

    async fn authorize_team_admin(
        &self,
        actor: UserId,
        team_id: TeamId,
    ) -> Result<(User, Team), DomainError> {
        let user = self.load_user(actor).await?;
        let team = self
            .teams
            .get(team_id)
            .await?
            .ok_or_else(|| team_not_found(team_id))?;

        if !(user.is_admin() || user.owns(team_id)) {
            return Err(DomainError::forbidden(
                "only the team owner or an admin can modify this team",
            ));
        }

        Ok((user, team))
    }

    /// Edit name, description or idea (owner or admin)
    pub async fn update(
        &self,
        actor: UserId,
        team_id: TeamId,
        request: UpdateTeamRequest,
    ) -> Result<Team, DomainError> {
        let (_, mut team) = self.authorize_team_admin(actor, team_id).await?;

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name != team.name() {
                validate_team_name(&name)?;
                if self.teams.name_exists(&name).await? {
                    return Err(DomainError::conflict(format!(
                        "Team name '{}' is already taken",
                        name
                    )));
                }
                team.set_name(name)?;
            }
        }

        if let Some(description) = request.description {
            team.set_description(description)?;
        }

        if let Some(idea) = request.idea {
            team.set_idea(idea)?;
        }

        let team = self.teams.update(&team).await?;
        info!(team_id = %team_id, actor = %actor, "Team updated");
        Ok(team)
    }

    /// Delete a team, releasing its members and dropping votes for it
    pub async fn delete(&self, actor: UserId, team_id: TeamId) -> Result<(), DomainError> {
        self.authorize_team_admin(actor, team_id).await?;
        self.membership.dissolve_team(team_id).await?;

        record_team_transition("delete");
        info!(team_id = %team_id, actor = %actor, "Team deleted");
        Ok(())
    }

    /// Get a team by ID
    pub async fn get(&self, team_id: TeamId) -> Result<Team, DomainError> {
        self.teams
            .get(team_id)
            .await?
            .ok_or_else(|| team_not_found(team_id))
    }

    pub async fn get_with_members(&self, team_id: TeamId) -> Result<TeamWithMembers, DomainError> {
        let team = self.get(team_id).await?;
        let members = self.users.list_by_team(team_id).await?;
        Ok(TeamWithMembers { team, members })
    }

    /// The caller's own team
    pub async fn own_team(&self, actor: UserId) -> Result<TeamWithMembers, DomainError> {
        let user = self.load_user(actor).await?;
        let team_id = user
            .team_id()
            .ok_or_else(|| DomainError::not_found("user has no team"))?;
        self.get_with_members(team_id).await
    }

    /// Every team with its members
    pub async fn list_with_members(&self) -> Result<Vec<TeamWithMembers>, DomainError> {
        let teams = self.teams.list().await?;
        let users = self.users.list().await?;

        Ok(teams
            .into_iter()
            .map(|team| {
                let members = users
                    .iter()
                    .filter(|u| u.is_member_of(team.id()))
                    .cloned()
                    .collect();
                TeamWithMembers { team, members }
            })
            .collect())
    }
}

#[async_trait]
impl TeamLookup for TeamService {
    async fn find_team(&self, team_id: TeamId) -> Result<Option<Team>, DomainError> {
        self.teams.get(team_id).await
    }

    async fn refresh_validity(&self, team_id: TeamId) -> Result<bool, DomainError> {
        self.update_validity(team_id).await
    }
}
