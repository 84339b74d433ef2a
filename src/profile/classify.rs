use crate::profile::BusinessSize;

const MICRO_MAX_TURNOVER: f64 = 2_000_000.0;
const SMALL_MAX_TURNOVER: f64 = 10_000_000.0;
const MEDIUM_MAX_TURNOVER: f64 = 50_000_000.0;

/// EU-style size class from headcount and annual turnover.
///
/// A turnover of zero means "unknown"; the classification then falls back to
/// headcount bands alone (0-10 micro, 11-50 small, 51-250 medium).
pub fn classify_business_size(employee_count: u32, annual_turnover: f64) -> BusinessSize {
    if annual_turnover.is_nan() || annual_turnover <= 0.0 {
        return match employee_count {
            0..=10 => BusinessSize::Micro,
            11..=50 => BusinessSize::Small,
            51..=250 => BusinessSize::Medium,
            _ => BusinessSize::Large,
        };
    }

    if employee_count < 10 && annual_turnover <= MICRO_MAX_TURNOVER {
        BusinessSize::Micro
    } else if employee_count < 50 && annual_turnover <= SMALL_MAX_TURNOVER {
        BusinessSize::Small
    } else if employee_count < 250 && annual_turnover <= MEDIUM_MAX_TURNOVER {
        BusinessSize::Medium
    } else {
        BusinessSize::Large
    }
}
