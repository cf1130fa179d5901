//! Team management
//!
//! Single-endpoint wrappers plus the two multi-step operations the team page
//! performs. Adding a member (create, then assign connections) and editing a
//! member (role, then connections) each touch two endpoints; when the second
//! step fails the first one is undone so the account is never left half
//! updated.

use serde::{Deserialize, Serialize};
use swiftbot_shared::{SharedError, TeamMember, UserId, UserRole};
use tracing::{error, info, warn};

use crate::error::{ClientError, ClientResult};
use crate::http::{Ack, ApiClient};

pub(crate) const TEAM: &str = "/api/account/team";

/// Invitation for a new team member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMember {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: UserRole,
    /// Initial password; when absent the backend emails a reset link
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl NewMember {
    fn validate(&self) -> Result<(), SharedError> {
        if !self.email.contains('@') {
            return Err(SharedError::Validation(format!(
                "Invalid email address: {}",
                self.email
            )));
        }
        check_assignable(self.role)
    }
}

fn check_assignable(role: UserRole) -> Result<(), SharedError> {
    if role.is_assignable() {
        Ok(())
    } else {
        Err(SharedError::Validation(format!(
            "The {} role cannot be assigned to a team member",
            role
        )))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MembersBody {
    Wrapped { members: Vec<TeamMember> },
    Bare(Vec<TeamMember>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MemberBody {
    Wrapped { member: TeamMember },
    Bare(TeamMember),
}

#[derive(Debug, Serialize)]
struct RoleUpdate {
    role: UserRole,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MemberConnections {
    #[serde(default, alias = "connectionIds")]
    connection_ids: Vec<String>,
}

#[derive(Clone)]
pub struct TeamService {
    api: ApiClient,
}

impl TeamService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn member_path(user_id: UserId) -> String {
        format!("{}/{}", TEAM, user_id)
    }

    fn connections_path(user_id: UserId) -> String {
        format!("{}/{}/connections", TEAM, user_id)
    }

    pub async fn list_members(&self) -> ClientResult<Vec<TeamMember>> {
        let body: MembersBody = self.api.get(TEAM).await?;
        Ok(match body {
            MembersBody::Wrapped { members } => members,
            MembersBody::Bare(members) => members,
        })
    }

    pub async fn create_member(&self, member: &NewMember) -> ClientResult<TeamMember> {
        member.validate()?;
        let body: MemberBody = self.api.post(TEAM, member).await?;
        let created = match body {
            MemberBody::Wrapped { member } => member,
            MemberBody::Bare(member) => member,
        };
        info!(user_id = %created.user_id, role = %created.role, "Team member created");
        Ok(created)
    }

    pub async fn remove_member(&self, user_id: UserId) -> ClientResult<()> {
        let _: Ack = self.api.delete(&Self::member_path(user_id)).await?;
        info!(user_id = %user_id, "Team member removed");
        Ok(())
    }

    pub async fn update_role(&self, user_id: UserId, role: UserRole) -> ClientResult<()> {
        check_assignable(role)?;
        let _: Ack = self
            .api
            .patch(&Self::member_path(user_id), &RoleUpdate { role })
            .await?;
        info!(user_id = %user_id, role = %role, "Team member role updated");
        Ok(())
    }

    /// Ids of the connections a member may use
    pub async fn member_connections(&self, user_id: UserId) -> ClientResult<Vec<String>> {
        let body: MemberConnections = self.api.get(&Self::connections_path(user_id)).await?;
        Ok(body.connection_ids)
    }

    pub async fn set_member_connections(
        &self,
        user_id: UserId,
        connection_ids: &[String],
    ) -> ClientResult<()> {
        let body = MemberConnections {
            connection_ids: connection_ids.to_vec(),
        };
        let _: Ack = self
            .api
            .patch(&Self::connections_path(user_id), &body)
            .await?;
        Ok(())
    }

    /// Create a member and give them access to `connection_ids`.
    ///
    /// If the assignment fails the member is deleted again and
    /// [`ClientError::MemberRolledBack`] is returned.
    pub async fn add_member(
        &self,
        member: &NewMember,
        connection_ids: &[String],
    ) -> ClientResult<TeamMember> {
        let created = self.create_member(member).await?;

        if connection_ids.is_empty() {
            return Ok(created);
        }

        let user_id = created.user_id;
        let err = match self.set_member_connections(user_id, connection_ids).await {
            Ok(()) => return Ok(created),
            Err(e) => e,
        };

        warn!(
            user_id = %user_id,
            error = %err,
            "Connection assignment failed for new member, removing member"
        );

        match self.remove_member(user_id).await {
            Ok(()) => Err(ClientError::MemberRolledBack {
                user_id,
                source: Box::new(err),
            }),
            Err(compensation) => {
                error!(
                    user_id = %user_id,
                    error = %err,
                    compensation_error = %compensation,
                    "Failed to remove member after connection assignment failure"
                );
                Err(ClientError::CompensationFailed {
                    operation: "Add member",
                    user_id,
                    source: Box::new(err),
                    compensation: Box::new(compensation),
                })
            }
        }
    }

    /// Change a member's role and connections.
    ///
    /// The role is written first; if the connection update then fails the
    /// previous role is written back and [`ClientError::RoleRestored`] is
    /// returned.
    pub async fn edit_member(
        &self,
        member: &TeamMember,
        role: UserRole,
        connection_ids: &[String],
    ) -> ClientResult<()> {
        let user_id = member.user_id;
        let previous_role = member.role;
        let role_changed = previous_role != role;

        if role_changed {
            self.update_role(user_id, role).await?;
        }

        let err = match self.set_member_connections(user_id, connection_ids).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        if !role_changed {
            return Err(err);
        }

        warn!(
            user_id = %user_id,
            error = %err,
            previous_role = %previous_role,
            "Connection update failed, restoring previous role"
        );

        match self.update_role(user_id, previous_role).await {
            Ok(()) => Err(ClientError::RoleRestored {
                user_id,
                restored_role: previous_role,
                source: Box::new(err),
            }),
            Err(compensation) => {
                error!(
                    user_id = %user_id,
                    error = %err,
                    compensation_error = %compensation,
                    "Failed to restore member role after connection update failure"
                );
                Err(ClientError::CompensationFailed {
                    operation: "Edit member",
                    user_id,
                    source: Box::new(err),
                    compensation: Box::new(compensation),
                })
            }
        }
    }
}
