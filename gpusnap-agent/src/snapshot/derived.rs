pub const MAX_FAN_PERCENT: u32 = 100;
pub const MAX_FAN_RPM: u32 = 9999;

pub fn fan_speed_percentage(raw: u32) -> u32 {
    raw.min(MAX_FAN_PERCENT)
}

pub fn fan_rpm(raw: u32) -> u32 {
    raw.min(MAX_FAN_RPM)
}

/// Milliwatts to whole watts, truncating.
pub fn power_draw_watts(power_draw_mw: u32) -> u32 {
    power_draw_mw / 1000
}

/// Percentage of the power limit currently drawn, or `None` when the limit
/// is reported as zero.
pub fn power_util(power_draw_mw: u32, power_draw_max_mw: u32) -> Option<u64> {
    (u64::from(power_draw_mw) * 100).checked_div(u64::from(power_draw_max_mw))
}
