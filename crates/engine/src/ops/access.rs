use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};

use crate::{
    EngineError, ResultEngine, group_memberships, group_memberships::MemberRole, groups, users,
};

use super::Engine;

impl Engine {
    pub(super) async fn find_group_by_id(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
    ) -> ResultEngine<Option<groups::Model>> {
        groups::Entity::find_by_id(group_id.to_string())
            .one(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn group_membership_role(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        user_id: i64,
    ) -> ResultEngine<Option<MemberRole>> {
        let row =
            group_memberships::Entity::find_by_id((group_id.to_string(), user_id))
                .one(db)
                .await?;
        row.as_ref()
            .map(|m| MemberRole::try_from(m.role.as_str()))
            .transpose()
    }

    /// Requires `user_id` to be a member of the group.
    ///
    /// Non-members get `KeyNotFound` rather than `Forbidden`, so the API
    /// does not leak which group ids exist.
    pub(super) async fn require_group_member(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        user_id: i64,
    ) -> ResultEngine<groups::Model> {
        let model = self
            .find_group_by_id(db, group_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))?;
        if self
            .group_membership_role(db, group_id, user_id)
            .await?
            .is_none()
        {
            return Err(EngineError::KeyNotFound("group not exists".to_string()));
        }
        Ok(model)
    }

    /// Requires `user_id` to be an owner of the group (roster management).
    pub(super) async fn require_group_owner(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        user_id: i64,
    ) -> ResultEngine<groups::Model> {
        let model = self.require_group_member(db, group_id, user_id).await?;
        let role = self
            .group_membership_role(db, group_id, user_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))?;
        if !role.can_manage_members() {
            return Err(EngineError::Forbidden(
                "only group owners can manage members".to_string(),
            ));
        }
        Ok(model)
    }

    pub(super) async fn require_user_exists(
        &self,
        db: &DatabaseTransaction,
        user_id: i64,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    /// Group roster as `(user, role)` pairs, ordered by user id so roster
    /// order (split remainders, balance output) is deterministic.
    pub(super) async fn group_roster(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
    ) -> ResultEngine<Vec<(users::Model, MemberRole)>> {
        let memberships: Vec<group_memberships::Model> = group_memberships::Entity::find()
            .filter(group_memberships::Column::GroupId.eq(group_id.to_string()))
            .order_by_asc(group_memberships::Column::UserId)
            .all(db)
            .await?;

        let mut roster = Vec::with_capacity(memberships.len());
        for membership in memberships {
            let user = self.require_user_exists(db, membership.user_id).await?;
            let role = MemberRole::try_from(membership.role.as_str())?;
            roster.push((user, role));
        }
        Ok(roster)
    }

    /// Ensures `member_id` belongs to the group roster.
    pub(super) async fn require_member_of_group(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        member_id: i64,
    ) -> ResultEngine<()> {
        if self
            .group_membership_role(db, group_id, member_id)
            .await?
            .is_none()
        {
            return Err(EngineError::InvalidInput(format!(
                "user {member_id} is not a member of the group"
            )));
        }
        Ok(())
    }
}
