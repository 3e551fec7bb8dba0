//! The closed sets of instrument tags used in templates and jobs.

use std::collections::BTreeSet;

use itertools::Itertools;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// Receiver configurations of the array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString)]
pub enum AntennaSet {
    #[strum(serialize = "LBA_INNER")]
    LbaInner,

    #[strum(serialize = "LBA_OUTER")]
    LbaOuter,

    #[strum(serialize = "LBA_SPARSE_EVEN")]
    LbaSparseEven,

    #[strum(serialize = "LBA_SPARSE_ODD")]
    LbaSparseOdd,

    #[strum(serialize = "LBA_X")]
    LbaX,

    #[strum(serialize = "LBA_Y")]
    LbaY,

    #[strum(serialize = "HBA_ZERO")]
    HbaZero,

    #[strum(serialize = "HBA_ONE")]
    HbaOne,

    #[strum(serialize = "HBA_DUAL")]
    HbaDual,

    #[strum(serialize = "HBA_JOINED")]
    HbaJoined,

    #[strum(serialize = "HBA_DUAL_INNER")]
    HbaDualInner,
}

/// The two antenna technologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum AntennaFamily {
    #[strum(serialize = "LBA")]
    Lba,

    #[strum(serialize = "HBA")]
    Hba,
}

impl AntennaSet {
    pub fn family(self) -> AntennaFamily {
        match self {
            AntennaSet::LbaInner
            | AntennaSet::LbaOuter
            | AntennaSet::LbaSparseEven
            | AntennaSet::LbaSparseOdd
            | AntennaSet::LbaX
            | AntennaSet::LbaY => AntennaFamily::Lba,
            _ => AntennaFamily::Hba,
        }
    }

    /// The name MoM uses, e.g. "HBA Dual Inner" for `HBA_DUAL_INNER`.
    pub fn mom_name(self) -> String {
        let mac_name = self.to_string();
        let mut words = mac_name.split('_');
        let mut name = words.next().unwrap_or_default().to_string();
        for word in words {
            name.push(' ');
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                name.push(first);
                name.extend(chars.map(|c| c.to_ascii_lowercase()));
            }
        }
        name
    }
}

/// Receiver frequency regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString)]
pub enum FrequencyBand {
    #[strum(serialize = "LBA_LOW")]
    LbaLow,

    #[strum(serialize = "LBA_HIGH")]
    LbaHigh,

    #[strum(serialize = "HBA_LOW")]
    HbaLow,

    #[strum(serialize = "HBA_MID")]
    HbaMid,

    #[strum(serialize = "HBA_HIGH")]
    HbaHigh,
}

impl FrequencyBand {
    pub fn mom_filter(self) -> &'static str {
        match self {
            FrequencyBand::LbaLow => "10-90 MHz",
            FrequencyBand::LbaHigh => "30-90 MHz",
            FrequencyBand::HbaLow => "110-190 MHz",
            FrequencyBand::HbaMid => "170-230 MHz",
            FrequencyBand::HbaHigh => "210-250 MHz",
        }
    }
}

/// Sampling clock frequencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString)]
pub enum Clock {
    #[strum(serialize = "160")]
    Mhz160,

    #[strum(serialize = "200")]
    Mhz200,
}

impl Clock {
    pub fn mhz(self) -> u32 {
        match self {
            Clock::Mhz160 => 160,
            Clock::Mhz200 => 200,
        }
    }
}

/// Bits per beamformed sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString)]
pub enum BitMode {
    #[strum(serialize = "4")]
    Four,

    #[strum(serialize = "8")]
    Eight,

    #[strum(serialize = "16")]
    Sixteen,
}

impl BitMode {
    pub fn bits(self) -> u32 {
        match self {
            BitMode::Four => 4,
            BitMode::Eight => 8,
            BitMode::Sixteen => 16,
        }
    }
}

/// Data products an observation can produce. The derived ordering is the
/// order in which they are applied to the backend and appear in names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString)]
pub enum DataProduct {
    /// Correlated visibilities.
    #[strum(serialize = "XC")]
    Xc,

    /// Correlated visibilities with a 5x5 grid of station beams.
    #[strum(serialize = "BM")]
    Bm,

    /// Rings of tied-array beams formed on the superterp.
    #[strum(serialize = "TR")]
    Tr,

    /// Fly's eye.
    #[strum(serialize = "FE")]
    Fe,

    #[strum(serialize = "CS")]
    Cs,

    #[strum(serialize = "CS_I")]
    CsI,

    #[strum(serialize = "CS_IQUV")]
    CsIquv,

    /// Complex voltages.
    #[strum(serialize = "CV")]
    Cv,

    #[strum(serialize = "IS")]
    Is,

    #[strum(serialize = "IS_I")]
    IsI,

    #[strum(serialize = "IS_IQUV")]
    IsIquv,
}

impl DataProduct {
    /// What a job-level request for this product enables.
    pub fn expand(self) -> &'static [DataProduct] {
        use DataProduct::*;
        match self {
            Xc => &[Xc, Bm],
            Fe => &[Fe, Tr],
            Cs => &[Cs, CsI, CsIquv, Cv],
            Is => &[Is, IsI, IsIquv],
            Bm => &[Bm],
            Tr => &[Tr],
            CsI => &[CsI],
            CsIquv => &[CsIquv],
            Cv => &[Cv],
            IsI => &[IsI],
            IsIquv => &[IsIquv],
        }
    }

    /// Products that need coherently summed stations, i.e. core only.
    pub fn is_coherent(self) -> bool {
        matches!(
            self,
            DataProduct::Cs | DataProduct::CsI | DataProduct::CsIquv | DataProduct::Cv
        )
    }

    /// Products aimed at pulsars rather than calibrators.
    pub fn is_pulsar(self) -> bool {
        matches!(
            self,
            DataProduct::Fe
                | DataProduct::Cs
                | DataProduct::CsI
                | DataProduct::CsIquv
                | DataProduct::Is
                | DataProduct::IsI
                | DataProduct::IsIquv
                | DataProduct::Tr
        )
    }
}

/// Expand job-level product requests into the set entries are matched
/// against.
pub fn expand_products<'a, I: IntoIterator<Item = &'a DataProduct>>(
    requested: I,
) -> BTreeSet<DataProduct> {
    requested
        .into_iter()
        .flat_map(|p| p.expand().iter().copied())
        .collect()
}

/// Lifecycle status of an emitted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum Status {
    #[strum(serialize = "opened")]
    Opened,

    #[strum(serialize = "approved")]
    Approved,
}

/// Channel counts a subband may be split into.
pub const VALID_CHANNELS_PER_SUBBAND: [u32; 12] =
    [1, 2, 4, 8, 16, 32, 64, 128, 256, 512, 1024, 2048];

lazy_static::lazy_static! {
    pub static ref ANTENNA_SETS_COMMA_SEPARATED: String = AntennaSet::iter().join(", ");

    pub static ref FREQUENCY_BANDS_COMMA_SEPARATED: String = FrequencyBand::iter().join(", ");

    pub static ref CLOCKS_COMMA_SEPARATED: String = Clock::iter().join(", ");

    pub static ref BIT_MODES_COMMA_SEPARATED: String = BitMode::iter().join(", ");

    pub static ref DATA_PRODUCTS_COMMA_SEPARATED: String = DataProduct::iter().join(", ");

    pub static ref CHANNELS_COMMA_SEPARATED: String = VALID_CHANNELS_PER_SUBBAND.iter().join(", ");
}
