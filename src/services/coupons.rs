use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Db, DomainError};
use crate::auth::{require_teacher, require_user, AuthContext};
use crate::database::models::{Coupon, CouponRedemption, User};
use crate::database::Filter;
use crate::types::Id;

#[derive(Debug, Clone, Deserialize)]
pub struct CouponInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub cost: i64,
    pub available: i64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub emoji: String,
}

impl CouponInput {
    fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::invalid("title must not be empty"));
        }
        if self.cost < 0 {
            return Err(DomainError::invalid("cost must not be negative"));
        }
        if self.available < 0 {
            return Err(DomainError::invalid("available must not be negative"));
        }
        Ok(())
    }

    fn apply(self, coupon: &mut Coupon) {
        coupon.title = self.title.trim().to_string();
        coupon.description = self.description;
        coupon.cost = self.cost;
        coupon.available = self.available;
        coupon.category = self.category;
        coupon.allergies = self.allergies;
        coupon.emoji = self.emoji;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RedemptionReceipt {
    pub redemption: CouponRedemption,
    pub remaining_points: i64,
    pub remaining_available: i64,
}

/// Take the coupon's cost from the user and one unit of stock from the coupon.
///
/// Points are checked before stock; on failure neither side changes.
pub fn charge(user: &mut User, coupon: &mut Coupon) -> Result<(), DomainError> {
    if user.current_points < coupon.cost {
        return Err(DomainError::InsufficientPoints {
            needed: coupon.cost,
            available: user.current_points,
        });
    }
    if coupon.available <= 0 {
        return Err(DomainError::CouponUnavailable);
    }

    user.current_points -= coupon.cost;
    coupon.available -= 1;
    Ok(())
}

#[derive(Clone)]
pub struct CouponService {
    db: Db,
}

impl CouponService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<Coupon>, DomainError> {
        let mut tx = self.db.begin().await?;
        Ok(tx.find(Filter::all()).await?)
    }

    pub async fn create(&self, auth: &AuthContext, input: CouponInput) -> Result<Coupon, DomainError> {
        input.validate()?;

        self.db
            .retry("create_coupon", || async {
                let mut tx = self.db.begin().await?;
                let teacher = require_teacher(&mut tx, auth).await?;

                let mut coupon = Coupon {
                    id: Id::new(),
                    title: String::new(),
                    description: String::new(),
                    cost: 0,
                    available: 0,
                    category: String::new(),
                    allergies: Vec::new(),
                    emoji: String::new(),
                    created_by: teacher.id,
                };
                input.clone().apply(&mut coupon);
                tx.insert(&coupon).await?;
                tx.commit().await?;

                info!("{} created coupon {} ({})", teacher.id, coupon.id, coupon.title);
                Ok(coupon)
            })
            .await
    }

    pub async fn update(&self, auth: &AuthContext, id: Id<Coupon>, input: CouponInput) -> Result<Coupon, DomainError> {
        input.validate()?;

        self.db
            .retry("update_coupon", || async {
                let mut tx = self.db.begin().await?;
                require_teacher(&mut tx, auth).await?;

                let mut coupon = tx.get(id).await?.ok_or(DomainError::NotFound("coupon"))?;
                input.clone().apply(&mut coupon);
                tx.save(&coupon).await?;
                tx.commit().await?;
                Ok(coupon)
            })
            .await
    }

    pub async fn delete(&self, auth: &AuthContext, id: Id<Coupon>) -> Result<(), DomainError> {
        self.db
            .retry("delete_coupon", || async {
                let mut tx = self.db.begin().await?;
                require_teacher(&mut tx, auth).await?;

                if !tx.delete(id).await? {
                    return Err(DomainError::NotFound("coupon"));
                }
                tx.commit().await?;
                Ok(())
            })
            .await
    }

    /// Spend points on a coupon. Balance, stock and the redemption log change
    /// together or not at all.
    pub async fn redeem(&self, auth: &AuthContext, id: Id<Coupon>) -> Result<RedemptionReceipt, DomainError> {
        self.db
            .retry("redeem_coupon", || async {
                let mut tx = self.db.begin().await?;
                let mut user = require_user(&mut tx, auth).await?;
                let mut coupon = tx.get(id).await?.ok_or(DomainError::NotFound("coupon"))?;

                charge(&mut user, &mut coupon)?;

                let redemption = CouponRedemption {
                    id: Id::new(),
                    user_id: user.id,
                    coupon_id: coupon.id,
                    cost: coupon.cost,
                    redeemed_at: Utc::now(),
                };
                tx.save(&user).await?;
                tx.save(&coupon).await?;
                tx.insert(&redemption).await?;
                tx.commit().await?;

                info!("{} redeemed coupon {} for {} points", user.id, coupon.id, coupon.cost);
                Ok(RedemptionReceipt {
                    redemption,
                    remaining_points: user.current_points,
                    remaining_available: coupon.available,
                })
            })
            .await
    }

    /// The caller's redemptions, newest first
    pub async fn my_redemptions(&self, auth: &AuthContext) -> Result<Vec<CouponRedemption>, DomainError> {
        let mut tx = self.db.begin().await?;
        let user = require_user(&mut tx, auth).await?;

        let mut redemptions: Vec<CouponRedemption> = tx.find(Filter::eq("user_id", user.id)).await?;
        redemptions.sort_by(|a, b| b.redeemed_at.cmp(&a.redeemed_at));
        Ok(redemptions)
    }
}
