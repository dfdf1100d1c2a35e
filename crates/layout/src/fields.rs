//! Dynamic field resolution.

use crate::LayoutError;
use chrono::NaiveDateTime;
use quire_idf::DynamicField;
use std::fmt::Write;

/// Values that are fixed for one generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldContext {
    /// The timestamp every `Date` field renders.
    pub generated_at: NaiveDateTime,
}

impl FieldContext {
    pub fn at(generated_at: NaiveDateTime) -> Self {
        Self { generated_at }
    }

    /// Uses the local wall clock.
    pub fn now() -> Self {
        Self::at(chrono::Local::now().naive_local())
    }
}

impl Default for FieldContext {
    fn default() -> Self {
        Self::now()
    }
}

/// Page-dependent values as known at a particular point of a pass.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldValues<'a> {
    pub context: &'a FieldContext,
    /// The page being laid out, when already known.
    pub page_number: Option<usize>,
    /// The total page count, or the previous pass's count while measuring.
    pub total_pages: Option<usize>,
}

impl<'a> FieldValues<'a> {
    pub fn provisional(context: &'a FieldContext, total_hint: Option<usize>) -> Self {
        Self {
            context,
            page_number: None,
            total_pages: total_hint,
        }
    }

    pub fn on_page(self, page_number: usize, total_pages: usize) -> Self {
        Self {
            page_number: Some(page_number),
            total_pages: Some(total_pages),
            ..self
        }
    }

    /// The text a field shows. Unknown page values print as `?` in place of
    /// each digit of the best estimate.
    pub fn text(&self, field: &DynamicField) -> Result<String, LayoutError> {
        match field {
            DynamicField::Date { format } => format_date(&self.context.generated_at, format),
            DynamicField::PageNumber => Ok(match self.page_number {
                Some(n) => n.to_string(),
                // A page number never exceeds the total, so the total's width is an upper bound.
                None => placeholder_digits(self.total_pages),
            }),
            DynamicField::PageCount => Ok(match self.total_pages {
                Some(n) => n.to_string(),
                None => placeholder_digits(None),
            }),
        }
    }
}

fn placeholder_digits(estimate: Option<usize>) -> String {
    let digits = estimate.map(|n| n.to_string().len()).unwrap_or(1);
    "?".repeat(digits)
}

/// Formats a timestamp with a `strftime` pattern, rejecting invalid patterns
/// instead of panicking.
pub fn format_date(at: &NaiveDateTime, pattern: &str) -> Result<String, LayoutError> {
    let mut out = String::new();
    write!(out, "{}", at.format(pattern))
        .map_err(|_| LayoutError::InvalidFieldFormat(pattern.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn context() -> FieldContext {
        FieldContext::at(
            NaiveDate::from_ymd_opt(2024, 3, 9)
                .unwrap()
                .and_hms_opt(14, 5, 7)
                .unwrap(),
        )
    }

    #[test]
    fn dates_use_strftime_patterns() {
        let ctx = context();
        let values = FieldValues::provisional(&ctx, None);
        let text = values
            .text(&DynamicField::date("%Y-%m-%d %H:%M:%S"))
            .unwrap();
        assert_eq!(text, "2024-03-09 14:05:07");
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let ctx = context();
        let err = format_date(&ctx.generated_at, "%Q").unwrap_err();
        assert!(matches!(err, LayoutError::InvalidFieldFormat(p) if p == "%Q"));
    }

    #[test]
    fn page_values_before_pagination_are_placeholders() {
        let ctx = context();
        let values = FieldValues::provisional(&ctx, Some(12));
        assert_eq!(values.text(&DynamicField::PageNumber).unwrap(), "??");
        assert_eq!(values.text(&DynamicField::PageCount).unwrap(), "12");

        let dry = FieldValues::provisional(&ctx, None);
        assert_eq!(dry.text(&DynamicField::PageCount).unwrap(), "?");
    }

    #[test]
    fn page_values_on_a_page_are_exact() {
        let ctx = context();
        let values = FieldValues::provisional(&ctx, None).on_page(3, 7);
        assert_eq!(values.text(&DynamicField::PageNumber).unwrap(), "3");
        assert_eq!(values.text(&DynamicField::PageCount).unwrap(), "7");
    }
}
