use orb_core::Keypoint;
use crate::node::{Bounds, QuadNode};

/// Quadtree over one level's keypoints, holding only indices into the borrowed slice.
///
/// `leaves` always partitions `0..keypoints.len()`.
#[derive(Debug, Clone)]
pub struct QuadTree<'a> {
    keypoints: &'a [Keypoint],
    leaves: Vec<QuadNode>,
}

impl<'a> QuadTree<'a> {
    /// Root spans `[0, width) x [0, height)` and owns every keypoint
    pub fn new(keypoints: &'a [Keypoint], width: usize, height: usize) -> Self {
        let leaves = if keypoints.is_empty() {
            Vec::new()
        } else {
            let root = Bounds::new(0, 0, width as i32, height as i32);
            vec![QuadNode::new(root, (0..keypoints.len()).collect())]
        };
        Self { keypoints, leaves }
    }

    pub fn leaves(&self) -> &[QuadNode] {
        &self.leaves
    }

    pub fn splittable_count(&self) -> usize {
        self.leaves.iter().filter(|n| n.is_splittable()).count()
    }

    /// Split leaves until there are at least `quota` of them or none can split
    pub fn grow(&mut self, quota: usize) {
        let mut passes = 0usize;
        loop {
            if self.leaves.len() >= quota {
                break;
            }
            let splittable = self.splittable_count();
            if splittable == 0 {
                log::debug!(
                    "quadtree: out of splittable leaves at {} of {} after {} passes",
                    self.leaves.len(), quota, passes
                );
                break;
            }

            passes += 1;
            if self.leaves.len() + 3 * splittable < quota {
                self.split_all();
            } else if self.split_largest_first(quota) {
                break;
            }
        }
    }

    /// One split of every splittable leaf
    fn split_all(&mut self) {
        let mut next = Vec::with_capacity(self.leaves.len() * 4);
        for node in self.leaves.drain(..) {
            if node.is_splittable() {
                next.extend(node.split(self.keypoints));
            } else {
                next.push(node);
            }
        }
        self.leaves = next;
    }

    /// Visits leaves from most to least populated, splitting each splittable one, and
    /// returns `true` as soon as the leaf count reaches `quota`.
    fn split_largest_first(&mut self, quota: usize) -> bool {
        // stable, so equal-sized leaves keep their current order
        let mut pending: Vec<QuadNode> = std::mem::take(&mut self.leaves);
        pending.sort_by(|a, b| b.len().cmp(&a.len()));

        let mut done: Vec<QuadNode> = Vec::with_capacity(pending.len() + 3);
        let mut remaining = pending.into_iter();
        let mut total = remaining.len();

        for node in remaining.by_ref() {
            if node.is_splittable() {
                let children = node.split(self.keypoints);
                total = total + children.len() - 1;
                done.extend(children);
            } else {
                done.push(node);
            }

            if total >= quota {
                break;
            }
        }

        done.extend(remaining);
        self.leaves = done;
        self.leaves.len() >= quota
    }

    /// Strongest keypoint of every leaf, in leaf order
    pub fn representatives(&self) -> Vec<Keypoint> {
        self.leaves
            .iter()
            .filter_map(|leaf| leaf.strongest(self.keypoints))
            .map(|i| self.keypoints[i])
            .collect()
    }
}
