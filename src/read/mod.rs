//! Reading custom observation sequences.

mod sequence;

pub use sequence::parse_sequence;

use std::path::Path;

use log::debug;

use crate::{error::PlanError, template::ScheduleTemplateEntry};

/// Read and parse a custom sequence file.
pub fn read_sequence_file<P: AsRef<Path>>(path: P) -> Result<Vec<ScheduleTemplateEntry>, PlanError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|err| PlanError::Io {
        file: path.to_path_buf(),
        err,
    })?;
    let entries = parse_sequence(&text)?;
    debug!("Read {} entries from {}", entries.len(), path.display());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::tags::DataProduct;

    #[test]
    fn reads_a_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# commissioning").unwrap();
        writeln!(file, "HBA_DUAL HBA_LOW 77..320 16 200 16 TR").unwrap();
        writeln!(file, "LBA_OUTER LBA_LOW 12..499 64 200 8 XC BM NDPPP 16 2").unwrap();
        file.flush().unwrap();

        let entries = read_sequence_file(file.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].products.contains(&DataProduct::Tr));
        assert!(entries[1].pipeline.is_some());
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.txt");
        match read_sequence_file(&path) {
            Err(PlanError::Io { file, .. }) => assert_eq!(file, path),
            other => panic!("expected an IO error, got {other:?}"),
        }
    }

    #[test]
    fn errors_carry_line_numbers() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "HBA_DUAL HBA_LOW 77..320 16 200 16 TR").unwrap();
        writeln!(file, "HBA_DUAL HBA_LOW 77..320 16 200 16").unwrap();
        file.flush().unwrap();
        assert!(matches!(
            read_sequence_file(file.path()),
            Err(PlanError::MalformedSchedule { line: 2, .. })
        ));
    }
}
