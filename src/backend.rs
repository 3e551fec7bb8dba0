//! Correlator and beamformer settings of an observation, and how requested
//! data products compose into them.

use log::debug;

use crate::{
    constants::{
        FE_LBA_DURATION_SECONDS, PULSAR_DOWNSAMPLING, TAB_RINGS, TAB_RING_SIZE, TR_DOWNSAMPLING,
    },
    tags::{AntennaFamily, DataProduct},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StokesMode {
    /// Stations summed with phase (tied-array beams).
    Coherent,

    /// Station powers summed.
    Incoherent,
}

/// Stokes data settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Stokes {
    pub mode: StokesMode,

    /// "I", "IQUV" or "XXYY".
    pub polarizations: &'static str,

    pub downsampling_steps: u32,
    pub collapsed_channels: u32,
    pub subbands_per_file: u32,
}

impl Stokes {
    fn new(
        mode: StokesMode,
        polarizations: &'static str,
        downsampling_steps: u32,
        collapsed_channels: u32,
    ) -> Stokes {
        Stokes {
            mode,
            polarizations,
            downsampling_steps,
            collapsed_channels,
            subbands_per_file: 512,
        }
    }

    /// "CS" or "IS"; MoM suffixes the Stokes element names with this.
    pub fn suffix(&self) -> &'static str {
        match self.mode {
            StokesMode::Coherent => "CS",
            StokesMode::Incoherent => "IS",
        }
    }
}

/// Tied-array beam (TAB) settings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TiedArrayBeams {
    /// Keep every station's data stream separate.
    pub flyseye: bool,

    /// Explicit TAB directions as (l, m) offsets from the pointing centre.
    pub beam_offsets: Vec<(f64, f64)>,

    /// Alternatively, tile the station beam with this many rings of TABs...
    pub nr_tab_rings: u32,

    /// ...this far apart \[radians\].
    pub tab_ring_size: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendProcessing {
    pub integration_time_seconds: f64,
    pub correlated_data: bool,
    pub channels_per_subband: u32,
    pub coherent_stokes: Option<Stokes>,
    pub incoherent_stokes: Option<Stokes>,
    pub tied_array_beams: Option<TiedArrayBeams>,
    pub enable_superterp: bool,
}

impl BackendProcessing {
    /// Anything other than plain visibilities needs a beam observation.
    pub fn needs_beam_observation(&self) -> bool {
        self.coherent_stokes.is_some() || self.incoherent_stokes.is_some()
    }

    pub fn instrument_name(&self) -> &'static str {
        if self.needs_beam_observation() {
            "Beam Observation"
        } else {
            "Interferometer"
        }
    }
}

/// Accumulates the backend settings for an observation one data product at
/// a time.
///
/// Products must be applied in [`DataProduct`] order (TR, FE, CS, CS_I,
/// CS_IQUV, CV, IS, IS_I, IS_IQUV); a later Stokes setting of the same kind
/// replaces an earlier one, while a later tied-array setting only moves the
/// beam of the existing one.
#[derive(Debug, Clone)]
pub struct BackendBuilder {
    backend: BackendProcessing,
    duration_override_seconds: Option<f64>,
}

impl BackendBuilder {
    pub fn new(channels_per_subband: u32, integration_time_seconds: f64) -> BackendBuilder {
        BackendBuilder {
            backend: BackendProcessing {
                integration_time_seconds,
                correlated_data: false,
                channels_per_subband,
                coherent_stokes: None,
                incoherent_stokes: None,
                tied_array_beams: None,
                enable_superterp: false,
            },
            duration_override_seconds: None,
        }
    }

    /// Set the tied-array beams, or if there are some already, only move
    /// their beam directions.
    pub fn merge_tied_array_beams(&mut self, tabs: TiedArrayBeams) {
        match self.backend.tied_array_beams.as_mut() {
            Some(existing) => existing.beam_offsets = tabs.beam_offsets,
            None => self.backend.tied_array_beams = Some(tabs),
        }
    }

    fn single_central_tab() -> TiedArrayBeams {
        TiedArrayBeams {
            beam_offsets: vec![(0.0, 0.0)],
            ..Default::default()
        }
    }

    pub fn apply(&mut self, product: DataProduct, family: AntennaFamily) {
        use StokesMode::*;

        let channels = self.backend.channels_per_subband;
        match product {
            DataProduct::Xc | DataProduct::Bm => self.backend.correlated_data = true,

            DataProduct::Tr => {
                self.backend.coherent_stokes = Some(Stokes::new(Coherent, "I", TR_DOWNSAMPLING, channels));
                self.merge_tied_array_beams(TiedArrayBeams {
                    nr_tab_rings: TAB_RINGS,
                    tab_ring_size: TAB_RING_SIZE,
                    ..Default::default()
                });
                self.backend.enable_superterp = true;
            }

            DataProduct::Fe => {
                self.backend.coherent_stokes =
                    Some(Stokes::new(Coherent, "I", PULSAR_DOWNSAMPLING, channels));
                self.merge_tied_array_beams(TiedArrayBeams {
                    flyseye: true,
                    ..Default::default()
                });
                if family == AntennaFamily::Lba {
                    self.duration_override_seconds = Some(FE_LBA_DURATION_SECONDS);
                }
            }

            DataProduct::Cs | DataProduct::CsI => {
                self.backend.coherent_stokes =
                    Some(Stokes::new(Coherent, "I", PULSAR_DOWNSAMPLING, channels));
                self.merge_tied_array_beams(Self::single_central_tab());
            }

            DataProduct::CsIquv => {
                self.backend.coherent_stokes =
                    Some(Stokes::new(Coherent, "IQUV", PULSAR_DOWNSAMPLING, channels));
                self.merge_tied_array_beams(Self::single_central_tab());
            }

            DataProduct::Cv => {
                self.backend.coherent_stokes = Some(Stokes::new(Coherent, "XXYY", 1, 1));
                self.merge_tied_array_beams(Self::single_central_tab());
            }

            DataProduct::Is | DataProduct::IsI => {
                self.backend.incoherent_stokes =
                    Some(Stokes::new(Incoherent, "I", PULSAR_DOWNSAMPLING, channels));
            }

            DataProduct::IsIquv => {
                self.backend.incoherent_stokes =
                    Some(Stokes::new(Incoherent, "IQUV", PULSAR_DOWNSAMPLING, channels));
            }
        }
        debug!("Applied {product} to backend");
    }

    /// Set when a product forces a fixed observation length.
    pub fn duration_override_seconds(&self) -> Option<f64> {
        self.duration_override_seconds
    }

    pub fn build(self) -> BackendProcessing {
        self.backend
    }
}

/// Build the backend for a set of products, returning it along with any
/// forced duration.
pub fn backend_for_products<'a, I: IntoIterator<Item = &'a DataProduct>>(
    products: I,
    family: AntennaFamily,
    channels_per_subband: u32,
    integration_time_seconds: f64,
) -> (BackendProcessing, Option<f64>) {
    let mut products: Vec<DataProduct> = products.into_iter().copied().collect();
    products.sort_unstable();
    let mut builder = BackendBuilder::new(channels_per_subband, integration_time_seconds);
    for product in products {
        builder.apply(product, family);
    }
    let duration_override = builder.duration_override_seconds();
    (builder.build(), duration_override)
}

#[cfg(test)]
mod tests {
    use super::*;
    use DataProduct::*;

    #[test]
    fn correlated_only_for_xc_and_bm() {
        let (b, _) = backend_for_products(&[Xc], AntennaFamily::Hba, 64, 2.0);
        assert!(b.correlated_data);
        assert!(!b.needs_beam_observation());
        assert_eq!(b.instrument_name(), "Interferometer");

        let (b, _) = backend_for_products(&[Bm], AntennaFamily::Hba, 64, 2.0);
        assert!(b.correlated_data);

        let (b, _) = backend_for_products(&[IsI], AntennaFamily::Hba, 64, 2.0);
        assert!(!b.correlated_data);
        assert_eq!(b.instrument_name(), "Beam Observation");
    }

    #[test]
    fn fe_with_lba_is_forced_to_ten_minutes() {
        let (b, dur) = backend_for_products(&[Fe], AntennaFamily::Lba, 16, 2.0);
        assert_eq!(dur, Some(600.0));
        let tabs = b.tied_array_beams.unwrap();
        assert!(tabs.flyseye);
        assert_eq!(b.coherent_stokes.unwrap().downsampling_steps, 128);

        let (_, dur) = backend_for_products(&[Fe], AntennaFamily::Hba, 16, 2.0);
        assert_eq!(dur, None);
    }

    #[test]
    fn tr_builds_rings() {
        let (b, _) = backend_for_products(&[Tr], AntennaFamily::Hba, 16, 2.0);
        let tabs = b.tied_array_beams.unwrap();
        assert_eq!(tabs.nr_tab_rings, 5);
        assert!(tabs.beam_offsets.is_empty());
        assert_eq!(b.coherent_stokes.unwrap().downsampling_steps, 16);
        assert!(b.enable_superterp);
    }

    #[test]
    fn cs_after_fe_moves_the_beam_but_keeps_flyseye() {
        // Given out of order on purpose.
        let (b, _) = backend_for_products(&[Cs, Fe], AntennaFamily::Hba, 16, 2.0);
        let tabs = b.tied_array_beams.unwrap();
        assert!(tabs.flyseye);
        assert_eq!(tabs.beam_offsets, vec![(0.0, 0.0)]);
    }

    #[test]
    fn cs_after_tr_keeps_the_rings() {
        let (b, _) = backend_for_products(&[Tr, CsIquv], AntennaFamily::Hba, 16, 2.0);
        let tabs = b.tied_array_beams.unwrap();
        assert_eq!(tabs.nr_tab_rings, 5);
        assert_eq!(tabs.beam_offsets, vec![(0.0, 0.0)]);
        assert_eq!(b.coherent_stokes.unwrap().polarizations, "IQUV");
    }

    #[test]
    fn complex_voltages() {
        let (b, _) = backend_for_products(&[Cv], AntennaFamily::Lba, 1, 2.0);
        let cs = b.coherent_stokes.unwrap();
        assert_eq!(cs.polarizations, "XXYY");
        assert_eq!(cs.downsampling_steps, 1);
        assert_eq!(cs.collapsed_channels, 1);
        assert_eq!(cs.suffix(), "CS");
    }

    #[test]
    fn coherent_and_incoherent_together() {
        let (b, _) = backend_for_products(&[CsI, IsIquv], AntennaFamily::Hba, 16, 2.0);
        assert_eq!(b.coherent_stokes.unwrap().polarizations, "I");
        let is = b.incoherent_stokes.unwrap();
        assert_eq!(is.polarizations, "IQUV");
        assert_eq!(is.suffix(), "IS");
        assert!(b.tied_array_beams.is_some());
    }
}
