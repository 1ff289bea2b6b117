/// Router Module Index
///
/// Page routes split by the access they require. The edge middleware sits in
/// front of all of them; the role gate additionally wraps each role subtree.

/// Routes open to everyone (landing, sign-in, sign-up, health).
pub mod public;

/// Shared portal pages and the session API. Require a session token at the edge.
pub mod authenticated;

/// Role-specific dashboard subtrees, each behind its own role gate.
pub mod dashboards;
