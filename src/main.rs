use std::path::PathBuf;
use std::time::Instant;

use colored::Colorize;
use rayon::prelude::*;
use structopt::StructOpt;

use gnss_sdr_core::buffer::Buff;
use gnss_sdr_core::code::{CodeTable, L1CA_CODE_PERIOD_SEC};
use gnss_sdr_core::error::Result;
use gnss_sdr_core::mixer::init_mixer_lut;
use gnss_sdr_core::peak::{corr_max, fine_dop};
use gnss_sdr_core::recording::{load_recording, IQFileType};
use gnss_sdr_core::search::{dop_bins, search_code, PowerGrid};

#[derive(StructOpt)]
#[structopt(name = "gnss-acquire", about = "GNSS L1CA acquisition over an IF recording")]
struct Options {
    #[structopt(short = "f", long, help = "raw IF recording path")]
    file: PathBuf,

    #[structopt(short = "t", long, default_value = "i8", help = "i8 or iq8")]
    iq_file_type: IQFileType,

    #[structopt(long, default_value = "4000000", help = "sampling frequency (Hz)")]
    sample_rate: f64,

    #[structopt(long, default_value = "0", help = "intermediate frequency (Hz)")]
    fi: f64,

    #[structopt(long, default_value = "", help = "comma-separated PRN list, empty = all 32")]
    prns: String,

    #[structopt(long, default_value = "5000", help = "Doppler search half-width (Hz)")]
    max_doppler_hz: f32,

    #[structopt(long, default_value = "1", help = "coherent integration length in code periods")]
    num_periods: usize,

    #[structopt(short = "v", long, help = "verbose logging")]
    verbose: bool,
}

struct AcqResult {
    prn: u8,
    cn0_db_hz: f64,
    code_offset: usize,
    doppler_hz: f32,
    fine_doppler_hz: f32,
}

const SNR_THRESHOLD_DB_HZ: f64 = 25.0;

fn parse_prn_list(prns: &str) -> Vec<u8> {
    if prns.is_empty() {
        (1..=32).collect()
    } else {
        prns.split(',')
            .map(|s| s.trim().parse().expect("invalid PRN"))
            .collect()
    }
}

fn acquire_one(
    buff: &Buff,
    fs: f64,
    fi: f64,
    max_doppler_hz: f32,
    num_periods: usize,
    prn: u8,
) -> Result<AcqResult> {
    let n = (fs * L1CA_CODE_PERIOD_SEC) as usize;
    let mut codes = CodeTable::new();
    let entry = codes.get(prn, n)?;

    let fds = dop_bins(L1CA_CODE_PERIOD_SEC, 0.0, max_doppler_hz);
    let mut grid = PowerGrid::zeros(fds.len(), n);

    for period in 0..num_periods {
        search_code(&entry.spectrum, buff, period * n, n, fs, fi, &fds, &mut grid);
    }

    let (cn0_db_hz, ix_doppler, ix_code) = corr_max(&grid, n, fds.len(), L1CA_CODE_PERIOD_SEC);
    let doppler_hz = fds[ix_doppler];
    let fine_doppler_hz = fine_dop(&grid, &fds, ix_doppler, ix_code);

    Ok(AcqResult {
        prn,
        cn0_db_hz,
        code_offset: ix_code,
        doppler_hz,
        fine_doppler_hz,
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let opt = Options::from_args();

    init_mixer_lut();

    log::info!(
        "{}: fs={} fi={} max_doppler={}Hz num_periods={}",
        opt.file.display().to_string().green(),
        opt.sample_rate,
        opt.fi,
        opt.max_doppler_hz,
        opt.num_periods,
    );

    let buff = load_recording(&opt.file, opt.sample_rate, opt.iq_file_type)?;
    let prns = parse_prn_list(&opt.prns);

    let ts = Instant::now();
    let results: Vec<AcqResult> = prns
        .par_iter()
        .filter_map(
            |&prn| match acquire_one(&buff, opt.sample_rate, opt.fi, opt.max_doppler_hz, opt.num_periods, prn) {
                Ok(r) => Some(r),
                Err(err) => {
                    log::error!("prn {prn}: acquisition error: {err}");
                    None
                }
            },
        )
        .collect();

    for r in &results {
        let locked = r.cn0_db_hz >= SNR_THRESHOLD_DB_HZ;
        let label = format!("{:2}", r.prn).yellow();
        let cn0_text = format!("{:.1}", r.cn0_db_hz);
        let cn0_text = if locked { cn0_text.green() } else { cn0_text.normal() };
        log::info!(
            "sat {label}: cn0={cn0_text} code_offset={} doppler={:.0}Hz fine_doppler={:.1}Hz",
            r.code_offset,
            r.doppler_hz,
            r.fine_doppler_hz,
        );
        if opt.verbose && locked {
            log::info!("  -- acquired");
        }
    }

    log::info!("duration: {} ms", ts.elapsed().as_millis());
    Ok(())
}
