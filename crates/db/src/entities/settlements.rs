//! `SeaORM` Entity for settlements table.

use super::sea_orm_active_enums::{SettlementDirection, SettlementStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "settlements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub couple_id: Uuid,
    pub period_start: Date,
    pub period_end: Date,
    #[sea_orm(column_type = "Decimal(Some((16, 0)))")]
    pub user1_paid_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 0)))")]
    pub user2_paid_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 0)))")]
    pub user1_should_pay: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 0)))")]
    pub user2_should_pay: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 0)))")]
    pub settlement_amount: Decimal,
    pub direction: SettlementDirection,
    pub status: SettlementStatus,
    pub created_by: Uuid,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub cancelled_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::couples::Entity",
        from = "Column::CoupleId",
        to = "super::couples::Column::Id"
    )]
    Couples,
    #[sea_orm(has_many = "super::settlement_expenses::Entity")]
    SettlementExpenses,
}

impl Related<super::couples::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Couples.def()
    }
}

impl Related<super::settlement_expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SettlementExpenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
