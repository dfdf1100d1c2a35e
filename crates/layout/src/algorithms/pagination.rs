/// Tolerance for floating point accumulation when comparing heights.
pub const EPSILON: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakAnalysis {
    pub should_break: bool,
    pub remaining_height: f32,
}

/// Centralized logic to check if a child fits in the remaining space.
///
/// * `cursor_y`: The current Y position relative to the top of the body area.
/// * `child_height`: The required height for the child.
/// * `body_height`: The height of the body area.
pub fn check_child_fit(cursor_y: f32, child_height: f32, body_height: f32) -> BreakAnalysis {
    let available = (body_height - cursor_y).max(0.0);
    BreakAnalysis {
        should_break: child_height > available + EPSILON,
        remaining_height: available,
    }
}

/// Space between two stacked blocks. Adjacent spacing collapses to the larger
/// of the two, and nothing is inserted at the top of a page.
pub fn collapsed_spacing(previous_after: Option<f32>, next_before: f32) -> f32 {
    match previous_after {
        Some(after) => after.max(next_before),
        None => 0.0,
    }
}
