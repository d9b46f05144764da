//! Axis-aligned bounding box derived from vertex positions.

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// Empty box ready for [`grow`](Self::grow): min at +inf, max at -inf.
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    pub fn grow(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// True once at least one point has been grown in.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grow_and_center() {
        let mut bb = BoundingBox::empty();
        assert!(!bb.is_valid());

        bb.grow(Vec3::new(-1.0, 0.0, 2.0));
        bb.grow(Vec3::new(3.0, -2.0, 4.0));

        assert!(bb.is_valid());
        assert_eq!(bb.min, Vec3::new(-1.0, -2.0, 2.0));
        assert_eq!(bb.max, Vec3::new(3.0, 0.0, 4.0));
        assert_eq!(bb.center(), Vec3::new(1.0, -1.0, 3.0));
        assert_eq!(bb.extent(), Vec3::new(4.0, 2.0, 2.0));
        assert!(bb.contains(Vec3::new(0.0, -1.0, 3.0)));
        assert!(!bb.contains(Vec3::new(0.0, 1.0, 3.0)));
    }
}
