use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::models::User;
use crate::database::store::Table;
use crate::database::tx::Document;
use crate::types::Id;

/// Cafeteria coupon bought with points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: Id<Coupon>,
    pub title: String,
    pub description: String,
    pub cost: i64,
    /// Remaining stock
    pub available: i64,
    pub category: String,
    #[serde(default)]
    pub allergies: Vec<String>,
    pub emoji: String,
    pub created_by: Id<User>,
}

impl Document for Coupon {
    const TABLE: Table = Table::Coupons;

    fn id(&self) -> Id<Self> {
        self.id
    }
}

/// Append-only redemption log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponRedemption {
    pub id: Id<CouponRedemption>,
    pub user_id: Id<User>,
    pub coupon_id: Id<Coupon>,
    /// Price paid at redemption time
    pub cost: i64,
    pub redeemed_at: DateTime<Utc>,
}

impl Document for CouponRedemption {
    const TABLE: Table = Table::CouponRedemptions;

    fn id(&self) -> Id<Self> {
        self.id
    }
}
