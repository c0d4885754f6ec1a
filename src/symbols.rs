//! Symbol tables: the ten stems, the twelve branches, the five elements and
//! every fixed relation between them.
//!
//! Everything here is pure data over closed enums. Relations that follow an
//! arithmetic pattern on the branch order (clash, harm, combination) are
//! computed from indices; the irregular ones (trines, punishments, vaults)
//! are spelled out as tables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One of the five element categories, in generation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Wood = 0,
    Fire = 1,
    Earth = 2,
    Metal = 3,
    Water = 4,
}

impl Element {
    pub const ALL: [Element; 5] = [
        Element::Wood,
        Element::Fire,
        Element::Earth,
        Element::Metal,
        Element::Water,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(i: usize) -> Element {
        Self::ALL[i % 5]
    }

    /// wood → fire → earth → metal → water → wood.
    #[inline]
    pub fn generates(self) -> Element {
        Self::from_index(self.index() + 1)
    }

    #[inline]
    pub fn generated_by(self) -> Element {
        Self::from_index(self.index() + 4)
    }

    /// wood → earth → water → fire → metal → wood.
    #[inline]
    pub fn destroys(self) -> Element {
        Self::from_index(self.index() + 2)
    }

    #[inline]
    pub fn destroyed_by(self) -> Element {
        Self::from_index(self.index() + 3)
    }

    pub fn label(self) -> &'static str {
        match self {
            Element::Wood => "wood",
            Element::Fire => "fire",
            Element::Earth => "earth",
            Element::Metal => "metal",
            Element::Water => "water",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Yang,
    Yin,
}

impl Polarity {
    #[inline]
    fn from_parity(i: usize) -> Polarity {
        if i % 2 == 0 { Polarity::Yang } else { Polarity::Yin }
    }
}

/* ──────────────────────────────────────────────────────────────────────────
Stems
────────────────────────────────────────────────────────────────────────── */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stem {
    Jia = 0,
    Yi = 1,
    Bing = 2,
    Ding = 3,
    Wu = 4,
    Ji = 5,
    Geng = 6,
    Xin = 7,
    Ren = 8,
    Gui = 9,
}

const STEM_NAMES: [(&str, &str); 10] = [
    ("jia", "甲"),
    ("yi", "乙"),
    ("bing", "丙"),
    ("ding", "丁"),
    ("wu", "戊"),
    ("ji", "己"),
    ("geng", "庚"),
    ("xin", "辛"),
    ("ren", "壬"),
    ("gui", "癸"),
];

impl Stem {
    pub const ALL: [Stem; 10] = [
        Stem::Jia,
        Stem::Yi,
        Stem::Bing,
        Stem::Ding,
        Stem::Wu,
        Stem::Ji,
        Stem::Geng,
        Stem::Xin,
        Stem::Ren,
        Stem::Gui,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(i: usize) -> Stem {
        Self::ALL[i % 10]
    }

    #[inline]
    pub fn element(self) -> Element {
        Element::from_index(self.index() / 2)
    }

    #[inline]
    pub fn polarity(self) -> Polarity {
        Polarity::from_parity(self.index())
    }

    pub fn name(self) -> &'static str {
        STEM_NAMES[self.index()].0
    }

    /// Five-combination partner and the element the pair transforms into.
    ///
    /// Pairs are five apart: jia-ji earth, yi-geng metal, bing-xin water,
    /// ding-ren wood, wu-gui fire.
    pub fn five_combination(self, other: Stem) -> Option<Element> {
        let (a, b) = (self.index(), other.index());
        if a.abs_diff(b) != 5 {
            return None;
        }
        const TARGETS: [Element; 5] = [
            Element::Earth,
            Element::Metal,
            Element::Water,
            Element::Wood,
            Element::Fire,
        ];
        Some(TARGETS[a.min(b)])
    }
}

impl fmt::Display for Stem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stem {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        STEM_NAMES
            .iter()
            .position(|(py, hz)| t.eq_ignore_ascii_case(py) || t == *hz)
            .map(Stem::from_index)
            .ok_or_else(|| Error::UnknownSymbol(s.to_string()))
    }
}

/* ──────────────────────────────────────────────────────────────────────────
Branches
────────────────────────────────────────────────────────────────────────── */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    Zi = 0,
    Chou = 1,
    Yin = 2,
    Mao = 3,
    Chen = 4,
    Si = 5,
    Wu = 6,
    Wei = 7,
    Shen = 8,
    You = 9,
    Xu = 10,
    Hai = 11,
}

const BRANCH_NAMES: [(&str, &str); 12] = [
    ("zi", "子"),
    ("chou", "丑"),
    ("yin", "寅"),
    ("mao", "卯"),
    ("chen", "辰"),
    ("si", "巳"),
    ("wu", "午"),
    ("wei", "未"),
    ("shen", "申"),
    ("you", "酉"),
    ("xu", "戌"),
    ("hai", "亥"),
];

const BRANCH_ELEMENTS: [Element; 12] = [
    Element::Water,
    Element::Earth,
    Element::Wood,
    Element::Wood,
    Element::Earth,
    Element::Fire,
    Element::Fire,
    Element::Earth,
    Element::Metal,
    Element::Metal,
    Element::Earth,
    Element::Water,
];

/// Hidden stems with their core-composition weights (each row sums to 1.0).
const HIDDEN: [&[(Stem, f64)]; 12] = [
    &[(Stem::Gui, 1.0)],
    &[(Stem::Ji, 0.6), (Stem::Gui, 0.3), (Stem::Xin, 0.1)],
    &[(Stem::Jia, 0.6), (Stem::Bing, 0.3), (Stem::Wu, 0.1)],
    &[(Stem::Yi, 1.0)],
    &[(Stem::Wu, 0.6), (Stem::Yi, 0.3), (Stem::Gui, 0.1)],
    &[(Stem::Bing, 0.6), (Stem::Wu, 0.3), (Stem::Geng, 0.1)],
    &[(Stem::Ding, 0.7), (Stem::Ji, 0.3)],
    &[(Stem::Ji, 0.6), (Stem::Ding, 0.3), (Stem::Yi, 0.1)],
    &[(Stem::Geng, 0.6), (Stem::Ren, 0.3), (Stem::Wu, 0.1)],
    &[(Stem::Xin, 1.0)],
    &[(Stem::Wu, 0.6), (Stem::Xin, 0.3), (Stem::Ding, 0.1)],
    &[(Stem::Ren, 0.7), (Stem::Jia, 0.3)],
];

impl Branch {
    pub const ALL: [Branch; 12] = [
        Branch::Zi,
        Branch::Chou,
        Branch::Yin,
        Branch::Mao,
        Branch::Chen,
        Branch::Si,
        Branch::Wu,
        Branch::Wei,
        Branch::Shen,
        Branch::You,
        Branch::Xu,
        Branch::Hai,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(i: usize) -> Branch {
        Self::ALL[i % 12]
    }

    #[inline]
    pub fn element(self) -> Element {
        BRANCH_ELEMENTS[self.index()]
    }

    #[inline]
    pub fn polarity(self) -> Polarity {
        Polarity::from_parity(self.index())
    }

    pub fn name(self) -> &'static str {
        BRANCH_NAMES[self.index()].0
    }

    /// Hidden stems in order of weight.
    pub fn hidden(self) -> &'static [(Stem, f64)] {
        HIDDEN[self.index()]
    }

    /// Whether `element` appears among the hidden stems.
    pub fn hides(self, element: Element) -> bool {
        self.hidden().iter().any(|(s, _)| s.element() == element)
    }

    /// Opposite branch on the twelve-wheel.
    #[inline]
    pub fn clash_partner(self) -> Branch {
        Self::from_index(self.index() + 6)
    }

    #[inline]
    pub fn clashes(self, other: Branch) -> bool {
        self.clash_partner() == other
    }

    /// Six-harm pairs sum to 7 (mod 12) on the branch order.
    #[inline]
    pub fn harms(self, other: Branch) -> bool {
        (self.index() + other.index()) % 12 == 7
    }

    /// Six-combination pairs sum to 1 (mod 12); returns the combined element.
    pub fn six_combination(self, other: Branch) -> Option<Element> {
        if (self.index() + other.index()) % 12 != 1 {
            return None;
        }
        let low = self.index().min(other.index());
        Some(match low {
            0 => Element::Earth, // zi-chou
            2 => Element::Wood,  // yin-hai
            3 => Element::Fire,  // mao-xu
            4 => Element::Metal, // chen-you
            5 => Element::Water, // si-shen
            _ => Element::Fire,  // wu-wei
        })
    }

    /// Trine group this branch belongs to.
    pub fn trine(self) -> &'static TrineGroup {
        // every branch sits in exactly one group
        TRINES
            .iter()
            .find(|g| g.members.contains(&self))
            .unwrap_or(&TRINES[0])
    }

    #[inline]
    pub fn is_cardinal(self) -> bool {
        matches!(self, Branch::Zi | Branch::Wu | Branch::Mao | Branch::You)
    }

    /// Half-trine: two distinct members of one group, at least one cardinal.
    pub fn half_trine(self, other: Branch) -> Option<Element> {
        if self == other {
            return None;
        }
        let g = self.trine();
        if g.members.contains(&other) && (self.is_cardinal() || other.is_cardinal()) {
            Some(g.element)
        } else {
            None
        }
    }

    /// Two distinct branches drawn from the same punishment group.
    pub fn punishes(self, other: Branch) -> bool {
        self != other
            && PUNISHMENTS
                .iter()
                .any(|g| g.members.contains(&self) && g.members.contains(&other))
    }

    #[inline]
    pub fn self_punishing(self) -> bool {
        SELF_PUNISHMENT.contains(&self)
    }

    /// Element stored in this branch when it acts as a vault.
    pub fn vault_element(self) -> Option<Element> {
        match self {
            Branch::Chen => Some(Element::Water),
            Branch::Xu => Some(Element::Fire),
            Branch::Chou => Some(Element::Metal),
            Branch::Wei => Some(Element::Wood),
            _ => None,
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Branch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        BRANCH_NAMES
            .iter()
            .position(|(py, hz)| t.eq_ignore_ascii_case(py) || t == *hz)
            .map(Branch::from_index)
            .ok_or_else(|| Error::UnknownSymbol(s.to_string()))
    }
}

/* ──────────────────────────────────────────────────────────────────────────
Group tables
────────────────────────────────────────────────────────────────────────── */

#[derive(Clone, Copy, Debug)]
pub struct TrineGroup {
    pub members: [Branch; 3],
    pub cardinal: Branch,
    pub element: Element,
}

pub const TRINES: [TrineGroup; 4] = [
    TrineGroup {
        members: [Branch::Shen, Branch::Zi, Branch::Chen],
        cardinal: Branch::Zi,
        element: Element::Water,
    },
    TrineGroup {
        members: [Branch::Hai, Branch::Mao, Branch::Wei],
        cardinal: Branch::Mao,
        element: Element::Wood,
    },
    TrineGroup {
        members: [Branch::Yin, Branch::Wu, Branch::Xu],
        cardinal: Branch::Wu,
        element: Element::Fire,
    },
    TrineGroup {
        members: [Branch::Si, Branch::You, Branch::Chou],
        cardinal: Branch::You,
        element: Element::Metal,
    },
];

#[derive(Clone, Copy, Debug)]
pub struct PunishmentGroup {
    pub key: &'static str,
    pub members: &'static [Branch],
    /// The group's completion is a terminal "collapse" verdict.
    pub terminal: bool,
}

/// Ordered by decreasing severity.
pub const PUNISHMENTS: [PunishmentGroup; 3] = [
    PunishmentGroup {
        key: "chou-xu-wei",
        members: &[Branch::Chou, Branch::Xu, Branch::Wei],
        terminal: true,
    },
    PunishmentGroup {
        key: "yin-si-shen",
        members: &[Branch::Yin, Branch::Si, Branch::Shen],
        terminal: false,
    },
    PunishmentGroup {
        key: "zi-mao",
        members: &[Branch::Zi, Branch::Mao],
        terminal: false,
    },
];

pub const SELF_PUNISHMENT: [Branch; 4] = [Branch::Chen, Branch::Wu, Branch::You, Branch::Hai];
