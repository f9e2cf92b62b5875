use axum::{extract::State, Extension};

use crate::auth::AuthContext;
use crate::database::models::{Coupon, CouponRedemption};
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson, ValidatedPath};
use crate::services::coupons::{CouponInput, RedemptionReceipt};
use crate::state::AppState;
use crate::types::Id;

/// GET /api/coupons
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Coupon>> {
    let coupons = state.services.coupons.list().await?;
    Ok(ApiResponse::success(coupons))
}

/// POST /api/coupons - teacher only
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(input): ValidatedJson<CouponInput>,
) -> ApiResult<Coupon> {
    let coupon = state.services.coupons.create(&auth, input).await?;
    Ok(ApiResponse::created(coupon))
}

/// PUT /api/coupons/:id - teacher only
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(id): ValidatedPath<Id<Coupon>>,
    ValidatedJson(input): ValidatedJson<CouponInput>,
) -> ApiResult<Coupon> {
    let coupon = state.services.coupons.update(&auth, id, input).await?;
    Ok(ApiResponse::success(coupon))
}

/// DELETE /api/coupons/:id - teacher only
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(id): ValidatedPath<Id<Coupon>>,
) -> ApiResult<()> {
    state.services.coupons.delete(&auth, id).await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/coupons/:id/redeem - spend points on a coupon
pub async fn redeem(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(id): ValidatedPath<Id<Coupon>>,
) -> ApiResult<RedemptionReceipt> {
    let receipt = state.services.coupons.redeem(&auth, id).await?;
    Ok(ApiResponse::created(receipt))
}

/// GET /api/coupons/redemptions
pub async fn my_redemptions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Vec<CouponRedemption>> {
    let redemptions = state.services.coupons.my_redemptions(&auth).await?;
    Ok(ApiResponse::success(redemptions))
}
