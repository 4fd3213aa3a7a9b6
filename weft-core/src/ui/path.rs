//! Node Addressing
//!
//! Every node in a rendered tree has a deterministic address: the sequence of
//! zero-based sibling indices from the root, written as a dot-separated
//! string (`0.2.1`). Paths are recomputed on every render pass, so they are
//! only meaningful relative to one tree snapshot. Elements carrying an
//! explicit identifier are addressed by that identifier instead, which stays
//! stable across renders.

use std::fmt;

use smallvec::SmallVec;

/// The positional address of a node inside one tree snapshot.
///
/// The root of a tree is always `0`; the path of the `i`-th child of a node
/// at path `p` is `p.i`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path(SmallVec<[usize; 8]>);

impl Path {
    /// The address of a tree's root node.
    pub fn root() -> Self {
        Self(SmallVec::from_slice(&[0]))
    }

    /// The address of the child at `index` under this path.
    ///
    /// Returns a new path; the receiver is unchanged.
    pub fn child(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(index);
        Self(segments)
    }

    /// Number of segments in the path (the root has depth 1).
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_renders_as_zero() {
        assert_eq!(Path::root().to_string(), "0");
    }

    #[test]
    fn child_paths_are_dot_separated() {
        let path = Path::root().child(2).child(1);
        assert_eq!(path.to_string(), "0.2.1");
        assert_eq!(path.depth(), 3);
    }

    #[test]
    fn child_does_not_mutate_parent() {
        let parent = Path::root().child(4);
        let _child = parent.child(0);
        assert_eq!(parent.to_string(), "0.4");
    }
}
