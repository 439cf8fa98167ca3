//! `SeaORM` Entity for expenses table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub couple_id: Uuid,
    pub payer_id: Uuid,
    pub category_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((14, 0)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 4)))")]
    pub split_ratio: Decimal,
    pub description: String,
    pub expense_date: Date,
    pub settled: bool,
    pub created_by: Uuid,
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
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_delete = "SetNull"
    )]
    Categories,
    #[sea_orm(has_one = "super::settlement_expenses::Entity")]
    SettlementExpenses,
}

impl Related<super::couples::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Couples.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::settlement_expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SettlementExpenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
