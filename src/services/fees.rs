//! Visit fee split between the platform and the seller

use crate::error::{AppError, AppResult};

/// Basis points in 100%
const BPS_DENOMINATOR: i128 = 10_000;

/// Platform share of a visit fee, in basis points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePolicy {
    platform_fee_bps: u32,
}

/// Split of a visit fee. `platform_fee + seller_payout == total` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    pub total: i64,
    pub platform_fee: i64,
    pub seller_payout: i64,
}

impl FeePolicy {
    pub fn new(platform_fee_bps: u32) -> AppResult<Self> {
        if i128::from(platform_fee_bps) > BPS_DENOMINATOR {
            return Err(AppError::Internal(format!(
                "platform_fee_bps must be between 0 and 10000, got {}",
                platform_fee_bps
            )));
        }
        Ok(Self { platform_fee_bps })
    }

    pub fn platform_fee_bps(&self) -> u32 {
        self.platform_fee_bps
    }

    /// Platform share rounded half up, remainder to the seller
    pub fn split(&self, total: i64) -> AppResult<FeeSplit> {
        if total < 0 {
            return Err(AppError::Validation(format!(
                "Visit fee cannot be negative: {}",
                total
            )));
        }
        let scaled = i128::from(total) * i128::from(self.platform_fee_bps);
        let platform = (scaled + BPS_DENOMINATOR / 2) / BPS_DENOMINATOR;
        // platform <= total since bps <= 10000
        let platform_fee = platform as i64;
        Ok(FeeSplit {
            total,
            platform_fee,
            seller_payout: total - platform_fee,
        })
    }
}
