//! The line grammar of custom observation sequences.
//!
//! ```text
//! # antenna  band    subbands  chans clock bits products...  [pipeline]
//! LBA_OUTER  LBA_LOW 12..499   64    200   8    XC BM        NDPPP 16 2 64 10 demix_always=CygA,CasA
//! HBA_DUAL   HBA_LOW 77..320   16    200   16   TR
//! ```

use std::{collections::BTreeSet, str::FromStr};

use crate::{
    error::PlanError,
    subbands::parse_subbands,
    tags::*,
    template::{PipelineDescriptor, PipelineKind, ScheduleTemplateEntry},
};

/// Fields before the data products.
const NUM_FIXED_FIELDS: usize = 6;

const DEMIX_ALWAYS_KEY: &str = "demix_always";
const DEMIX_IF_NEEDED_KEY: &str = "demix_if_needed";

/// A single-line parse failure; the caller adds the line number.
type LineResult<T> = Result<T, String>;

fn parse_tag<T: FromStr>(value: &str, field: &str, valid: &str) -> LineResult<T> {
    value
        .parse()
        .map_err(|_| format!("'{value}' is not a valid {field}; choose one of: {valid}"))
}

fn parse_channels(value: &str) -> LineResult<u32> {
    value
        .parse::<u32>()
        .ok()
        .filter(|c| VALID_CHANNELS_PER_SUBBAND.contains(c))
        .ok_or_else(|| {
            format!(
                "'{value}' is not a valid channels per subband; choose one of: {}",
                *CHANNELS_COMMA_SEPARATED
            )
        })
}

fn parse_step(value: &str, what: &str) -> LineResult<u32> {
    value
        .parse()
        .map_err(|_| format!("NDPPP {what} '{value}' is not a whole number"))
}

fn parse_source_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Everything after the `NDPPP` keyword.
fn parse_ndppp(tokens: &[&str]) -> LineResult<PipelineDescriptor> {
    let num_steps = tokens.iter().take_while(|t| !t.contains('=')).count();
    let (steps, options) = tokens.split_at(num_steps);
    let mut pipeline = match steps {
        [freq, time] => PipelineDescriptor::ndppp(
            parse_step(freq, "averaging frequency step")?,
            parse_step(time, "averaging time step")?,
        ),
        [freq, time, demix_freq, demix_time] => PipelineDescriptor::ndppp(
            parse_step(freq, "averaging frequency step")?,
            parse_step(time, "averaging time step")?,
        )
        .with_demix_window(
            parse_step(demix_freq, "demixing frequency step")?,
            parse_step(demix_time, "demixing time step")?,
        ),
        _ => {
            return Err(format!(
                "NDPPP takes 2 or 4 step sizes (avg_freq avg_time [demix_freq demix_time]), got {num_steps}"
            ))
        }
    };

    for option in options {
        match option.split_once('=') {
            Some((DEMIX_ALWAYS_KEY, sources)) => {
                pipeline.demix_always = Some(parse_source_list(sources))
            }
            Some((DEMIX_IF_NEEDED_KEY, sources)) => {
                pipeline.demix_if_needed = Some(parse_source_list(sources))
            }
            _ => {
                return Err(format!(
                    "unrecognised NDPPP option '{option}'; expected {DEMIX_ALWAYS_KEY}=... or {DEMIX_IF_NEEDED_KEY}=..."
                ))
            }
        }
    }
    pipeline.validate()?;
    Ok(pipeline)
}

/// Parse the fields of one non-empty line.
fn parse_fields(fields: &[&str]) -> LineResult<ScheduleTemplateEntry> {
    if fields.len() <= NUM_FIXED_FIELDS {
        return Err(format!(
            "expected at least {} fields (antenna set, band, subbands, channels, clock, bit mode, products...), got {}",
            NUM_FIXED_FIELDS + 1,
            fields.len()
        ));
    }

    let antenna_set: AntennaSet =
        parse_tag(fields[0], "antenna set", &ANTENNA_SETS_COMMA_SEPARATED)?;
    let band: FrequencyBand = parse_tag(fields[1], "frequency band", &FREQUENCY_BANDS_COMMA_SEPARATED)?;
    let subbands = fields[2];
    parse_subbands(subbands).map_err(|e| e.to_string())?;
    let channels_per_subband = parse_channels(fields[3])?;
    let clock: Clock = parse_tag(fields[4], "clock", &CLOCKS_COMMA_SEPARATED)?;
    let bit_mode: BitMode = parse_tag(fields[5], "bit mode", &BIT_MODES_COMMA_SEPARATED)?;

    let mut products = BTreeSet::new();
    let mut pipeline = None;
    let rest = &fields[NUM_FIXED_FIELDS..];
    for (i, &token) in rest.iter().enumerate() {
        if let Ok(product) = token.parse::<DataProduct>() {
            products.insert(product);
        } else if token == PipelineKind::NDPPP_KEYWORD {
            pipeline = Some(parse_ndppp(&rest[i + 1..])?);
            break;
        } else {
            return Err(format!(
                "'{token}' is not a valid data product; choose one of: {}, or start a pipeline with {}",
                *DATA_PRODUCTS_COMMA_SEPARATED,
                PipelineKind::NDPPP_KEYWORD
            ));
        }
    }
    if products.is_empty() {
        return Err("no data products given".to_string());
    }

    Ok(ScheduleTemplateEntry {
        antenna_set,
        band,
        subbands: subbands.to_string(),
        channels_per_subband,
        clock,
        bit_mode,
        products,
        pipeline,
    })
}

/// Parse a custom sequence. Blank lines are skipped and `#` starts a
/// comment. The first bad line aborts parsing.
pub fn parse_sequence(text: &str) -> Result<Vec<ScheduleTemplateEntry>, PlanError> {
    let mut entries = vec![];
    for (i, line) in text.lines().enumerate() {
        let content = match line.split_once('#') {
            Some((before, _)) => before,
            None => line,
        };
        let fields: Vec<&str> = content.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        let entry = parse_fields(&fields)
            .map_err(|msg| PlanError::MalformedSchedule { line: i + 1, msg })?;
        entries.push(entry);
    }
    Ok(entries)
}
