use tour::NodeId;

/// Visited nodes, most recent last.
///
/// Pushed on every committed forward transition; popped only when a back
/// transition commits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStack {
    entries: Vec<NodeId>,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: NodeId) {
        self.entries.push(node);
    }

    pub fn pop(&mut self) -> Option<NodeId> {
        self.entries.pop()
    }

    pub fn peek(&self) -> Option<&NodeId> {
        self.entries.last()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.entries.iter()
    }
}
