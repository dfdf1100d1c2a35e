#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    /// Upper bound on layout passes spent settling page-count fields.
    ///
    /// The first pass measures with a placeholder total; each further pass
    /// uses the previous pass's count. Layout stops as soon as two passes
    /// agree, so documents without page fields never need more than two.
    ///
    /// Defaults to `4`. Values below `2` are treated as `2`.
    pub max_passes: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { max_passes: 4 }
    }
}

impl LayoutConfig {
    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = passes;
        self
    }

    pub(crate) fn pass_limit(&self) -> usize {
        self.max_passes.max(2)
    }
}
