use crate::LayoutError;
use crate::fields::FieldValues;
use crate::fonts::SharedFontLibrary;
use quire_style::StyleRegistry;

/// Where a [`crate::paginator::Paginator`] is in its pass over a document.
///
/// `Measuring` and `PageBroken` alternate while content flows; `Paginated` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaginatorState {
    Unpaginated,
    Measuring,
    PageBroken,
    Paginated,
}

impl PaginatorState {
    pub fn can_transition_to(self, next: PaginatorState) -> bool {
        use PaginatorState::*;
        matches!(
            (self, next),
            (Unpaginated, Measuring)
                | (Measuring, PageBroken)
                | (PageBroken, Measuring)
                | (Measuring, Paginated)
        )
    }

    pub fn transition(self, next: PaginatorState) -> Result<PaginatorState, LayoutError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(LayoutError::StateTransition {
                from: self,
                to: next,
            })
        }
    }
}

/// Read-only environment shared by every node during one layout pass.
#[derive(Clone, Copy)]
pub(crate) struct LayoutEnvironment<'a> {
    pub styles: &'a StyleRegistry,
    pub fonts: &'a SharedFontLibrary,
    pub fields: FieldValues<'a>,
}

impl<'a> LayoutEnvironment<'a> {
    /// The same environment with page values known.
    pub fn on_page(self, page_number: usize, total_pages: usize) -> Self {
        Self {
            fields: self.fields.on_page(page_number, total_pages),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PaginatorState::*;
    use super::*;

    #[test]
    fn flowing_alternates_between_measuring_and_broken() {
        let state = Unpaginated.transition(Measuring).unwrap();
        let state = state.transition(PageBroken).unwrap();
        let state = state.transition(Measuring).unwrap();
        assert_eq!(state.transition(Paginated).unwrap(), Paginated);
    }

    #[test]
    fn paginated_is_terminal() {
        for next in [Unpaginated, Measuring, PageBroken, Paginated] {
            let err = Paginated.transition(next).unwrap_err();
            assert_eq!(
                err,
                LayoutError::StateTransition {
                    from: Paginated,
                    to: next
                }
            );
        }
    }

    #[test]
    fn cannot_skip_measuring() {
        assert!(!Unpaginated.can_transition_to(Paginated));
        assert!(!Unpaginated.can_transition_to(PageBroken));
        assert!(!PageBroken.can_transition_to(Paginated));
    }
}
