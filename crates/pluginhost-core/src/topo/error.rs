#[derive(Debug, thiserror::Error)]
pub enum TopoError {
    #[error("cycle detected among nodes: {}", .cycle.join(", "))]
    CycleDetected { cycle: Vec<String> },
}
