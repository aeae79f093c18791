/// Closed distance span `[min, max]` along a ray, such as the entry and
/// exit of a solid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    pub const EMPTY: Interval = Interval {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };

    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.max < self.min
    }

    pub fn contains(&self, t: f32) -> bool {
        self.min <= t && t <= self.max
    }

    /// True if `other` lies entirely inside this span. Shared boundaries
    /// count as covered.
    pub fn covers(&self, other: &Interval) -> bool {
        self.min <= other.min && other.max <= self.max
    }

    /// True if the spans share no interior points. Touching boundaries
    /// count as disjoint.
    pub fn is_disjoint(&self, other: &Interval) -> bool {
        self.max <= other.min || other.max <= self.min
    }

    /// Overlap of two spans, empty when they are apart.
    pub fn intersection(&self, other: &Interval) -> Interval {
        Interval::new(self.min.max(other.min), self.max.min(other.max))
    }
}
