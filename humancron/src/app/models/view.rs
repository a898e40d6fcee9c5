//! Application view routing

/// Application view/route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Selector,  // workflow list with fuzzy filter
    Execution, // step-by-step view of the active run
}
