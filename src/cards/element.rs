//! Elements and the sages bound to them.

use serde::{Deserialize, Serialize};

/// One of the four elements. Every sage, and therefore every decklist,
/// belongs to exactly one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Element {
    Fire,
    Water,
    Earth,
    Air,
}

impl Element {
    pub const ALL: [Element; 4] = [Element::Fire, Element::Water, Element::Earth, Element::Air];
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A player's leader. Choosing a sage fixes the player's element and
/// decklist for the rest of the match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sage {
    Pyra,
    Maris,
    Terran,
    Zephyr,
}

impl Sage {
    pub const ALL: [Sage; 4] = [Sage::Pyra, Sage::Maris, Sage::Terran, Sage::Zephyr];

    #[must_use]
    pub const fn element(self) -> Element {
        match self {
            Sage::Pyra => Element::Fire,
            Sage::Maris => Element::Water,
            Sage::Terran => Element::Earth,
            Sage::Zephyr => Element::Air,
        }
    }

    /// The sage bound to `element`.
    #[must_use]
    pub const fn for_element(element: Element) -> Self {
        match element {
            Element::Fire => Sage::Pyra,
            Element::Water => Sage::Maris,
            Element::Earth => Sage::Terran,
            Element::Air => Sage::Zephyr,
        }
    }
}

impl std::fmt::Display for Sage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sage_element_binding_is_bijective() {
        for sage in Sage::ALL {
            assert_eq!(Sage::for_element(sage.element()), sage);
        }
        for element in Element::ALL {
            assert_eq!(Sage::for_element(element).element(), element);
        }
    }
}
