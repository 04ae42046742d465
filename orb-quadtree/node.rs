use orb_core::Keypoint;

/// Integer box `[min_x, max_x) x [min_y, max_y)` with its split point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_x: i32,
    pub min_y: i32,
    pub mid_x: i32,
    pub mid_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Bounds {
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            mid_x: (min_x + max_x) / 2,
            mid_y: (min_y + max_y) / 2,
            max_x,
            max_y,
        }
    }

    /// Quadrants in the order top-left, top-right, bottom-left, bottom-right
    pub fn quadrants(&self) -> [Bounds; 4] {
        [
            Bounds::new(self.min_x, self.min_y, self.mid_x, self.mid_y),
            Bounds::new(self.mid_x, self.min_y, self.max_x, self.mid_y),
            Bounds::new(self.min_x, self.mid_y, self.mid_x, self.max_y),
            Bounds::new(self.mid_x, self.mid_y, self.max_x, self.max_y),
        ]
    }

    /// Quadrant index for a point; each axis is split half-open at the midpoint
    #[inline]
    pub fn quadrant_of(&self, x: f32, y: f32) -> usize {
        let right = x >= self.mid_x as f32;
        let bottom = y >= self.mid_y as f32;
        (bottom as usize) << 1 | right as usize
    }

    /// False once neither axis can shrink any further
    pub fn can_subdivide(&self) -> bool {
        self.max_x - self.min_x >= 2 || self.max_y - self.min_y >= 2
    }
}

/// Region of the distribution tree owning a subset of one level's keypoints by index
#[derive(Debug, Clone, PartialEq)]
pub struct QuadNode {
    pub bounds: Bounds,
    pub indices: Vec<usize>,
    pub locked: bool,
}

impl QuadNode {
    pub fn new(bounds: Bounds, indices: Vec<usize>) -> Self {
        let locked = indices.len() == 1;
        Self { bounds, indices, locked }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Unlocked, owns at least two keypoints, and its box still has room to split
    pub fn is_splittable(&self) -> bool {
        !self.locked && self.indices.len() >= 2 && self.bounds.can_subdivide()
    }

    /// Distribute this node's keypoints over its quadrants, dropping empty ones
    pub fn split(&self, keypoints: &[Keypoint]) -> Vec<QuadNode> {
        let quadrants = self.bounds.quadrants();
        let mut buckets: [Vec<usize>; 4] = Default::default();
        for &i in &self.indices {
            let kp = &keypoints[i];
            buckets[self.bounds.quadrant_of(kp.x, kp.y)].push(i);
        }

        quadrants
            .into_iter()
            .zip(buckets)
            .filter(|(_, indices)| !indices.is_empty())
            .map(|(bounds, indices)| QuadNode::new(bounds, indices))
            .collect()
    }

    /// Index of the strongest keypoint; the first one wins ties
    pub fn strongest(&self, keypoints: &[Keypoint]) -> Option<usize> {
        let mut best: Option<usize> = None;
        for &i in &self.indices {
            match best {
                Some(b) if keypoints[i].response <= keypoints[b].response => {}
                _ => best = Some(i),
            }
        }
        best
    }
}
