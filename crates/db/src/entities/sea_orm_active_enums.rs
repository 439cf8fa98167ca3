//! Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "settlement_status")]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "settlement_direction"
)]
#[serde(rename_all = "snake_case")]
pub enum SettlementDirection {
    #[sea_orm(string_value = "user1_pays_user2")]
    User1PaysUser2,
    #[sea_orm(string_value = "user2_pays_user1")]
    User2PaysUser1,
    #[sea_orm(string_value = "none")]
    #[serde(rename = "none")]
    NoTransfer,
}
