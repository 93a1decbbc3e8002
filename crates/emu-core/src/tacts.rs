//! The fundamental unit of time for a CPU core.

/// A count of CPU clock tacts (T-states).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tacts(pub u64);

impl Tacts {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl core::ops::Add for Tacts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl core::ops::AddAssign for Tacts {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl core::ops::AddAssign<u32> for Tacts {
    fn add_assign(&mut self, rhs: u32) {
        self.0 = self.0.wrapping_add(u64::from(rhs));
    }
}

/// Elapsed tacts between two readings; saturates at zero.
impl core::ops::Sub for Tacts {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_u32_accumulates() {
        let mut t = Tacts::new(10);
        t += 13u32;
        assert_eq!(t.get(), 23);
    }

    #[test]
    fn sub_saturates() {
        assert_eq!(Tacts::new(3) - Tacts::new(5), Tacts::ZERO);
        assert_eq!(Tacts::new(19) - Tacts::new(4), Tacts::new(15));
    }
}
