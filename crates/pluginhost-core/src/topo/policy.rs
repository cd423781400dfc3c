use super::Node;

/// How to order nodes that have no dependency relationship between them.
pub enum TiePolicy<T> {
    /// Deterministic but otherwise unspecified — currently insertion order.
    Natural,
    /// Ordered by the node's own value.
    ByValue,
    /// Insertion order.
    Fifo,
    /// Reverse insertion order.
    Lifo,
    /// Ascending stripe, then insertion order within a stripe.
    StripedFifo(Box<dyn Fn(&T) -> i64>),
    /// Ascending stripe, then reverse insertion order within a stripe.
    StripedLifo(Box<dyn Fn(&T) -> i64>),
}

impl<T: Clone + Ord> TiePolicy<T> {
    /// Picks one handle out of `ready` (all of which are valid choices —
    /// none depends on another that is still remaining).
    pub(super) fn pick(&self, ready: &[usize], nodes: &[Node<T>]) -> usize {
        let best = match self {
            TiePolicy::Natural | TiePolicy::Fifo => {
                ready.iter().min_by_key(|&&h| nodes[h].insertion_order)
            }
            TiePolicy::Lifo => ready.iter().max_by_key(|&&h| nodes[h].insertion_order),
            TiePolicy::ByValue => ready.iter().min_by(|&&a, &&b| nodes[a].value.cmp(&nodes[b].value)),
            TiePolicy::StripedFifo(stripe) => ready.iter().min_by_key(|&&h| {
                (stripe(&nodes[h].value), nodes[h].insertion_order as i64)
            }),
            TiePolicy::StripedLifo(stripe) => ready.iter().min_by_key(|&&h| {
                (stripe(&nodes[h].value), -(nodes[h].insertion_order as i64))
            }),
        };
        *best.expect("ready set is never empty when pick is called")
    }
}
