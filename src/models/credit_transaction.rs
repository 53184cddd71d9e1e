use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub transaction_type: String,
    pub amount: i64,
    pub balance_after: i64,
    pub campaign_id: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Purchase,
    Usage,
    Refund,
    Bonus,
    Adjustment,
}

impl TransactionType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "purchase" => Some(TransactionType::Purchase),
            "usage" => Some(TransactionType::Usage),
            "refund" => Some(TransactionType::Refund),
            "bonus" => Some(TransactionType::Bonus),
            "adjustment" => Some(TransactionType::Adjustment),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Purchase => write!(f, "purchase"),
            TransactionType::Usage => write!(f, "usage"),
            TransactionType::Refund => write!(f, "refund"),
            TransactionType::Bonus => write!(f, "bonus"),
            TransactionType::Adjustment => write!(f, "adjustment"),
        }
    }
}
