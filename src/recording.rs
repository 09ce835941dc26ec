//! Loads a raw digitized IF recording into a `Buff`, per the IF data file
//! layout defined in spec.md §6. File I/O itself is outside the core's
//! scope; this module is the thin external collaborator that produces the
//! core's input.

use std::fmt;
use std::fs::File;
use std::io::Read as _;
use std::path::Path;
use std::str::FromStr;

use bytesize::ByteSize;
use colored::Colorize;

use crate::buffer::{Buff, SampleMode};
use crate::error::{GnssCoreError, Result};

/// Raw IF sample layout: one signed byte per sample (I-sampling), or
/// interleaved signed bytes `I0 Q0 I1 Q1 ...` (IQ-sampling).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IQFileType {
    IOnly,
    IQ,
}

impl FromStr for IQFileType {
    type Err = GnssCoreError;
    fn from_str(input: &str) -> Result<Self> {
        match input {
            "i8" => Ok(IQFileType::IOnly),
            "iq8" => Ok(IQFileType::IQ),
            other => Err(GnssCoreError::UnsupportedSampleFormat(other.to_string())),
        }
    }
}

impl fmt::Display for IQFileType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IQFileType::IOnly => write!(f, "i8"),
            IQFileType::IQ => write!(f, "iq8"),
        }
    }
}

impl From<IQFileType> for SampleMode {
    fn from(file_type: IQFileType) -> Self {
        match file_type {
            IQFileType::IOnly => SampleMode::IOnly,
            IQFileType::IQ => SampleMode::IQ,
        }
    }
}

/// Reads an entire raw IF recording from `path` and packs it into a
/// `Buff`. `fs`/`file_type` are reported for progress logging only.
pub fn load_recording(path: &Path, fs: f64, file_type: IQFileType) -> Result<Buff> {
    let mut file = File::open(path)?;
    let file_size = file.metadata()?.len();

    let mut raw_u8 = Vec::with_capacity(file_size as usize);
    file.read_to_end(&mut raw_u8)?;
    let raw: Vec<i8> = raw_u8.drain(..).map(|b| b as i8).collect();

    let bytes_per_sample = match file_type {
        IQFileType::IOnly => 1,
        IQFileType::IQ => 2,
    };
    let duration_sec = raw.len() as f64 / fs / bytes_per_sample as f64;

    log::info!(
        "{}: {} -- {file_type} fs={} duration={:.1}s",
        path.display().to_string().green(),
        ByteSize::b(file_size).to_string_as(false).bold(),
        fs,
        duration_sec,
    );

    Ok(Buff::from_raw(&raw, file_type.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_file_types() {
        assert_eq!("i8".parse::<IQFileType>().unwrap(), IQFileType::IOnly);
        assert_eq!("iq8".parse::<IQFileType>().unwrap(), IQFileType::IQ);
        assert!("wav".parse::<IQFileType>().is_err());
    }
}
