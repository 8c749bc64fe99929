use sea_orm::{ActiveValue, QueryFilter, prelude::*};

use crate::{
    Currency, EngineError, Group, ResultEngine, group_memberships,
    group_memberships::MemberRole, groups, users,
};

use super::{Engine, normalize_required_name};

impl Engine {
    /// Creates a new group; the creator becomes its first owner member.
    pub async fn new_group(
        &self,
        name: &str,
        currency: Currency,
        user_id: i64,
    ) -> ResultEngine<String> {
        let name = normalize_required_name(name, "group")?;
        self.with_tx(|engine, db_tx| {
            Box::pin(async move {
                engine.require_user_exists(db_tx, user_id).await?;

                let group = Group::new(name, currency, user_id);
                let group_id = group.id.clone();
                groups::ActiveModel::from(&group).insert(db_tx).await?;

                let owner = group_memberships::ActiveModel {
                    group_id: ActiveValue::Set(group_id.clone()),
                    user_id: ActiveValue::Set(user_id),
                    role: ActiveValue::Set(MemberRole::Owner.as_str().to_string()),
                };
                owner.insert(db_tx).await?;

                Ok(group_id)
            })
        })
        .await
    }

    /// Returns a group the user is a member of.
    pub async fn group(&self, group_id: &str, user_id: i64) -> ResultEngine<Group> {
        let group_id = group_id.to_string();
        self.with_tx(|engine, db_tx| {
            Box::pin(async move {
                let model = engine
                    .require_group_member(db_tx, group_id.as_str(), user_id)
                    .await?;
                Group::try_from(model)
            })
        })
        .await
    }

    /// Lists the groups the user belongs to.
    pub async fn list_groups(&self, user_id: i64) -> ResultEngine<Vec<Group>> {
        self.with_tx(|_engine, db_tx| {
            Box::pin(async move {
                let memberships: Vec<group_memberships::Model> =
                    group_memberships::Entity::find()
                        .filter(group_memberships::Column::UserId.eq(user_id))
                        .all(db_tx)
                        .await?;

                let mut out = Vec::with_capacity(memberships.len());
                for membership in memberships {
                    let model = groups::Entity::find_by_id(membership.group_id.clone())
                        .one(db_tx)
                        .await?
                        .ok_or_else(|| {
                            EngineError::KeyNotFound("group not exists".to_string())
                        })?;
                    out.push(Group::try_from(model)?);
                }
                Ok(out)
            })
        })
        .await
    }

    /// Adds or updates a group member (owner-only).
    pub async fn upsert_group_member(
        &self,
        group_id: &str,
        member_user_id: i64,
        role: &str,
        user_id: i64,
    ) -> ResultEngine<()> {
        let group_id = group_id.to_string();
        let role = role.to_string();
        self.with_tx(|engine, db_tx| {
            Box::pin(async move {
                let group = engine
                    .require_group_owner(db_tx, group_id.as_str(), user_id)
                    .await?;
                engine.require_user_exists(db_tx, member_user_id).await?;

                let role = MemberRole::try_from(role.as_str())?;
                if member_user_id == group.created_by && role != MemberRole::Owner {
                    return Err(EngineError::InvalidInput(
                        "cannot demote the group creator".to_string(),
                    ));
                }

                let active = group_memberships::ActiveModel {
                    group_id: ActiveValue::Set(group_id.clone()),
                    user_id: ActiveValue::Set(member_user_id),
                    role: ActiveValue::Set(role.as_str().to_string()),
                };

                // Upsert: insert if missing, otherwise update the role.
                match group_memberships::Entity::find_by_id((group_id.clone(), member_user_id))
                    .one(db_tx)
                    .await?
                {
                    Some(_) => {
                        active.update(db_tx).await?;
                    }
                    None => {
                        active.insert(db_tx).await?;
                    }
                }

                Ok(())
            })
        })
        .await
    }

    /// Removes a group member (owner-only).
    ///
    /// Members with a non-zero net balance stay until they are settled;
    /// removing them would orphan their share of the ledger.
    pub async fn remove_group_member(
        &self,
        group_id: &str,
        member_user_id: i64,
        user_id: i64,
    ) -> ResultEngine<()> {
        let group_id = group_id.to_string();
        self.with_tx(|engine, db_tx| {
            Box::pin(async move {
                let group = engine
                    .require_group_owner(db_tx, group_id.as_str(), user_id)
                    .await?;
                if member_user_id == group.created_by {
                    return Err(EngineError::InvalidInput(
                        "cannot remove the group creator".to_string(),
                    ));
                }

                let sheet = engine.balance_sheet(db_tx, group_id.as_str()).await?;
                let unsettled = sheet
                    .positions
                    .iter()
                    .any(|p| p.balance.member_id == member_user_id && !p.balance.amount.is_zero());
                if unsettled {
                    return Err(EngineError::InvalidInput(
                        "member still has an unsettled balance".to_string(),
                    ));
                }

                group_memberships::Entity::delete_by_id((group_id.clone(), member_user_id))
                    .exec(db_tx)
                    .await?;

                Ok(())
            })
        })
        .await
    }

    /// Lists group members with their roles (any member may look).
    pub async fn list_group_members(
        &self,
        group_id: &str,
        user_id: i64,
    ) -> ResultEngine<Vec<(users::Model, MemberRole)>> {
        let group_id = group_id.to_string();
        self.with_tx(|engine, db_tx| {
            Box::pin(async move {
                engine
                    .require_group_member(db_tx, group_id.as_str(), user_id)
                    .await?;
                engine.group_roster(db_tx, group_id.as_str()).await
            })
        })
        .await
    }
}
