use crate::producer::Producer;

/// A node in an immutable pipeline plan.
///
/// `compile` is the only operation ever performed on a node from outside the plan module, so it
/// stands in for the separate double-dispatch visitor a dynamically-typed port would need: each
/// node implements its own compile step directly, resolved through the trait object's vtable at
/// the call site.
pub trait PlanNode<T>: Send + Sync {
    /// Realize this node (and transitively its upstream) as a fresh pull-based [`Producer`].
    /// Calling this twice on the same node produces two independent runs.
    fn compile(&self) -> Box<dyn Producer<T>>;

    /// Render this node, and its upstream, as an indented tree for `Stream::explain`.
    fn explain(&self, depth: usize, colored: bool) -> String;
}
