//! Symbol-resolution flags.
//!
//! RTLD-style bit flags controlling binding eagerness and symbol visibility.
//! Translated to the platform's native constants at the loader boundary;
//! the Windows back end accepts and ignores them (LoadLibrary has no
//! equivalent).

use std::ops::BitOr;

/// Binding and visibility flags for [`super::PlatformLoader::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolFlags(u8);

impl SymbolFlags {
    /// Resolve symbols only on first use.
    pub const LAZY: Self = Self(0b0001);
    /// Resolve every symbol at load time.
    pub const NOW: Self = Self(0b0010);
    /// Symbols are not made available to subsequently loaded libraries.
    pub const LOCAL: Self = Self(0b0100);
    /// Symbols join the global scope.
    pub const GLOBAL: Self = Self(0b1000);

    /// Exactly one binding mode must be set.
    const BINDING_MASK: u8 = 0b0011;
    /// At most one visibility mode.
    const VISIBILITY_MASK: u8 = 0b1100;

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if the combination is a valid open mode.
    pub const fn is_valid(self) -> bool {
        let binding = self.0 & Self::BINDING_MASK;
        let visibility = self.0 & Self::VISIBILITY_MASK;
        (binding == Self::LAZY.0 || binding == Self::NOW.0)
            && visibility != Self::VISIBILITY_MASK
    }
}

impl Default for SymbolFlags {
    /// Platform-appropriate default: resolve on first use, local visibility.
    fn default() -> Self {
        Self::LAZY.union(Self::LOCAL)
    }
}

impl BitOr for SymbolFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_lazy_local() {
        let flags = SymbolFlags::default();
        assert!(flags.contains(SymbolFlags::LAZY));
        assert!(flags.contains(SymbolFlags::LOCAL));
        assert!(!flags.contains(SymbolFlags::NOW));
        assert!(!flags.contains(SymbolFlags::GLOBAL));
    }

    #[test]
    fn test_valid_flags() {
        assert!(SymbolFlags::LAZY.is_valid());
        assert!(SymbolFlags::NOW.is_valid());
        assert!((SymbolFlags::LAZY | SymbolFlags::GLOBAL).is_valid());
        assert!((SymbolFlags::NOW | SymbolFlags::LOCAL).is_valid());
        assert!(!SymbolFlags(0).is_valid());
        assert!(!(SymbolFlags::LAZY | SymbolFlags::NOW).is_valid());
        assert!(!(SymbolFlags::LAZY | SymbolFlags::LOCAL | SymbolFlags::GLOBAL).is_valid());
    }

    #[test]
    fn test_union_is_commutative() {
        assert_eq!(
            SymbolFlags::NOW | SymbolFlags::GLOBAL,
            SymbolFlags::GLOBAL | SymbolFlags::NOW
        );
    }
}
