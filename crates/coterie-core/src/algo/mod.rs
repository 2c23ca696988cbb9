//! Algorithms over the frozen co-occurrence graph.

/// Connected components (the parallelisation boundary for clique search).
pub mod components;

/// Maximal clique enumeration (Bron–Kerbosch with pivoting).
pub mod cliques;

/// Almost-clique expansion.
pub mod almost;
