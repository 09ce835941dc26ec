//! Carrier-mixed-data lookup table and the carrier mixer built on top of it.
//!
//! The LUT is a process-wide, read-only-after-init table: once built it is
//! safe to share across the per-channel worker threads described in
//! spec.md §5.

use once_cell::sync::Lazy;
use std::f64::consts::PI;

use crate::buffer::Buff;
use crate::types::{Cpx16, CSCALE};

const NTBL: usize = 256;

/// carrier-mixed-data LUT, 256 sample bytes x 256 carrier phases.
static MIXER_LUT: Lazy<Vec<Cpx16>> = Lazy::new(build_mixer_lut);

fn build_mixer_lut() -> Vec<Cpx16> {
    let mut table = vec![Cpx16::default(); NTBL * 256];
    for p in 0..NTBL {
        let theta = -2.0 * PI * (p as f64) / NTBL as f64;
        // half-away-from-zero rounding on the carrier only, per spec.
        let carr_i = (theta.cos() * CSCALE as f64).round() as i32;
        let carr_q = (theta.sin() * CSCALE as f64).round() as i32;
        for b in 0..256usize {
            let byte = crate::types::Cpx8(b as u8);
            let si = byte.i() as i32;
            let sq = byte.q() as i32;
            let i = (si * carr_i - sq * carr_q) as i16;
            let q = (si * carr_q + sq * carr_i) as i16;
            table[(b << 8) | p] = Cpx16::new(i, q);
        }
    }
    table
}

/// Forces mixer LUT construction. Idempotent: repeated calls observe the
/// same table, built once behind the `Lazy` cell.
pub fn init_mixer_lut() {
    Lazy::force(&MIXER_LUT);
}

#[inline]
fn lookup(byte: u8, phase_idx: u8) -> Cpx16 {
    MIXER_LUT[((byte as usize) << 8) | (phase_idx as usize)]
}

/// Downconverts `n` samples starting at buffer index `ix`, advancing a
/// 32-bit fixed-point phase accumulator (8 integer bits indexing the LUT,
/// 24 fractional bits) by `step` ticks per sample starting at `phase0`
/// ticks.
fn mix_segment(buff: &Buff, ix: usize, n: usize, phase0: u32, step: u32, out: &mut [Cpx16]) {
    let mut p = phase0;
    for (i, slot) in out.iter_mut().enumerate().take(n) {
        let byte = buff.sample(ix + i).0;
        *slot = lookup(byte, (p >> 24) as u8);
        p = p.wrapping_add(step);
    }
}

/// Converts a fixed-point tick count from a phase/step expressed in LUT
/// units (cycles scaled by `NTBL`) to the 32-bit accumulator domain.
fn to_ticks(value: f64) -> u32 {
    const SCALE: f64 = (1u64 << 24) as f64;
    (value * SCALE) as i64 as u32
}

/// Produces a window of `n` mixed samples by indexing the carrier-mixed
/// LUT with an incrementing fixed-point phase. `fc` is the carrier
/// frequency to mix down (Hz), `fs` the sampling frequency (Hz), `phi` the
/// initial carrier phase in cycles.
///
/// When the window wraps the end of `buff`, mixing splits into two passes
/// that advance phase continuously across the join -- this is the only
/// place in the core aware of the buffer's circular layout.
pub fn mix_carr(buff: &Buff, ix: usize, n: usize, fs: f64, fc: f64, phi: f64, out: &mut [Cpx16]) {
    assert_eq!(out.len(), n, "mix_carr: output slice must have length n");

    let step_ticks = to_ticks(fc / fs * NTBL as f64);
    let mut phase_ticks = to_ticks(phi.rem_euclid(1.0) * NTBL as f64);

    let cap = buff.len();
    if ix + n <= cap {
        mix_segment(buff, ix, n, phase_ticks, step_ticks, out);
    } else {
        let first = cap - ix;
        mix_segment(buff, ix, first, phase_ticks, step_ticks, &mut out[..first]);
        phase_ticks = phase_ticks.wrapping_add(step_ticks.wrapping_mul(first as u32));
        mix_segment(buff, 0, n - first, phase_ticks, step_ticks, &mut out[first..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{Buff, SampleMode};
    use crate::types::Cpx8;

    #[test]
    fn lut_spot_check_phase_zero() {
        init_mixer_lut();
        let byte_i1_q0 = Cpx8::new(1, 0);
        let byte_i0_q1 = Cpx8::new(0, 1);
        assert_eq!(lookup(byte_i1_q0.0, 0), Cpx16::new(10, 0));
        assert_eq!(lookup(byte_i0_q1.0, 0), Cpx16::new(0, 10));
    }

    #[test]
    fn lut_spot_check_quarter_cycle() {
        init_mixer_lut();
        let byte_i1_q0 = Cpx8::new(1, 0);
        assert_eq!(lookup(byte_i1_q0.0, 64), Cpx16::new(0, -10));
    }

    #[test]
    fn lut_init_is_idempotent() {
        init_mixer_lut();
        let snapshot_before: Vec<Cpx16> = MIXER_LUT.clone();
        init_mixer_lut();
        assert_eq!(snapshot_before, *MIXER_LUT);
    }

    #[test]
    fn contiguous_and_wrapped_windows_match() {
        init_mixer_lut();
        let n = 32usize;
        let mut buff = Buff::new(n, SampleMode::IOnly);
        for i in 0..n {
            buff.set_sample(i, Cpx8::new(((i % 7) as i8) - 3, 0));
        }

        let fs = 4_000_000.0;
        let fc = 123_456.0;
        let phi = 0.37;

        let mut contiguous = vec![Cpx16::default(); 10];
        mix_carr(&buff, 5, 10, fs, fc, phi, &mut contiguous);

        // window starting near the end so it must wrap
        let mut wrapped = vec![Cpx16::default(); 10];
        mix_carr(&buff, n - 3, 10, fs, fc, phi, &mut wrapped);

        // build an equivalent linear buffer covering the same samples with
        // the same starting phase to confirm wrap continuity independently
        let mut linear = Buff::new(13, SampleMode::IOnly);
        for i in 0..13 {
            linear.set_sample(i, buff.sample(n - 3 + i));
        }
        let mut expect_wrapped = vec![Cpx16::default(); 10];
        mix_carr(&linear, 0, 10, fs, fc, phi, &mut expect_wrapped);

        assert_eq!(wrapped, expect_wrapped);
        assert_ne!(contiguous.len(), 0);
    }
}
