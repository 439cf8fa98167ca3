//! Couple repository.
//!
//! Every request is scoped to the caller's couple; this is where that scope
//! is resolved.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    Set,
};
use serde::Serialize;
use tandem_core::settlement::Partners;
use tandem_shared::types::{CoupleId, UserId};

use crate::entities::couples;

/// A couple with its two partners in user1/user2 order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Couple {
    /// Couple identifier.
    pub id: CoupleId,
    /// The two partners.
    pub partners: Partners,
    /// Optional display name.
    pub name: Option<String>,
}

impl Couple {
    /// Returns the partner of `user_id`, if `user_id` is in this couple.
    #[must_use]
    pub fn partner_of(&self, user_id: UserId) -> Option<UserId> {
        if user_id == self.partners.user1_id {
            Some(self.partners.user2_id)
        } else if user_id == self.partners.user2_id {
            Some(self.partners.user1_id)
        } else {
            None
        }
    }
}

impl From<couples::Model> for Couple {
    fn from(model: couples::Model) -> Self {
        Self {
            id: CoupleId::from_uuid(model.id),
            partners: Partners::new(
                UserId::from_uuid(model.user1_id),
                UserId::from_uuid(model.user2_id),
            ),
            name: model.name,
        }
    }
}

/// Couple repository.
#[derive(Debug, Clone)]
pub struct CoupleRepository {
    db: Arc<DatabaseConnection>,
}

impl CoupleRepository {
    /// Creates a new couple repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finds the couple a user belongs to, on either side.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_user(&self, user_id: UserId) -> Result<Option<Couple>, DbErr> {
        let user_id = user_id.into_inner();
        let couple = couples::Entity::find()
            .filter(
                Condition::any()
                    .add(couples::Column::User1Id.eq(user_id))
                    .add(couples::Column::User2Id.eq(user_id)),
            )
            .one(self.db.as_ref())
            .await?;

        Ok(couple.map(Couple::from))
    }

    /// Pairs two users into a couple.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, e.g. when either user is
    /// already part of a couple.
    pub async fn create(
        &self,
        user1_id: UserId,
        user2_id: UserId,
        name: Option<String>,
    ) -> Result<Couple, DbErr> {
        let now = chrono::Utc::now().into();
        let couple = couples::ActiveModel {
            id: Set(CoupleId::new().into_inner()),
            user1_id: Set(user1_id.into_inner()),
            user2_id: Set(user2_id.into_inner()),
            name: Set(name),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = couple.insert(self.db.as_ref()).await?;
        Ok(model.into())
    }
}
