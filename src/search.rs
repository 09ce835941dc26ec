//! Parallel code search: sweeps a Doppler bin grid and accumulates
//! correlation power into a 2-D (Doppler x code-offset) grid.

use std::thread;
use std::time::Duration;

use crate::buffer::Buff;
use crate::fft::sdr_corr_fft;
use crate::types::Cpx;

/// Doppler frequency search step, in units of 1 / code cycle.
pub const DOP_STEP: f64 = 0.5;

/// Non-negative 2-D power grid, indexed `[doppler_bin][code_offset]`,
/// shape `(len_fds x N)`, stored row-major.
#[derive(Clone)]
pub struct PowerGrid {
    data: Vec<f32>,
    doppler_bins: usize,
    code_offsets: usize,
}

impl PowerGrid {
    pub fn zeros(doppler_bins: usize, code_offsets: usize) -> Self {
        Self {
            data: vec![0.0; doppler_bins * code_offsets],
            doppler_bins,
            code_offsets,
        }
    }

    pub fn doppler_bins(&self) -> usize {
        self.doppler_bins
    }

    pub fn code_offsets(&self) -> usize {
        self.code_offsets
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.code_offsets + j]
    }

    #[inline]
    pub fn add(&mut self, i: usize, j: usize, value: f32) {
        self.data[i * self.code_offsets + j] += value;
    }

    pub fn row(&self, i: usize) -> &[f32] {
        let start = i * self.code_offsets;
        &self.data[start..start + self.code_offsets]
    }
}

/// Builds the Doppler bin grid described in spec.md §3: uniformly spaced
/// by `step = DOP_STEP / T`, centered on `dop`, spanning `+/- max_dop`.
pub fn dop_bins(t: f64, dop: f32, max_dop: f32) -> Vec<f32> {
    let step = (DOP_STEP / t) as f32;
    let len_fds = (2.0 * max_dop / step) as usize + 1;
    (0..len_fds).map(|i| dop - max_dop + i as f32 * step).collect()
}

/// For each Doppler bin, mixes + FFT-correlates the buffer window at
/// `fi + fds[i]` and accumulates `|C[j]|^2` into `grid[i][j]`. Every 22nd
/// bin, yields briefly (~1ms) to avoid monopolizing the CPU when many
/// searches run concurrently -- a quality-of-service concession, not a
/// correctness requirement. Callers may invoke this repeatedly with
/// successive windows to integrate over multiple code periods; `grid`
/// accumulates monotonically.
pub fn search_code(
    code_fft: &[Cpx],
    buff: &Buff,
    ix: usize,
    n: usize,
    fs: f64,
    fi: f64,
    fds: &[f32],
    grid: &mut PowerGrid,
) {
    assert_eq!(grid.code_offsets(), n);
    assert_eq!(grid.doppler_bins(), fds.len());

    let mut c = vec![Cpx::default(); n];
    for (i, &fd) in fds.iter().enumerate() {
        sdr_corr_fft(buff, ix, n, fs, fi + fd as f64, 0.0, code_fft, &mut c);

        for (j, bin) in c.iter().enumerate() {
            grid.add(i, j, bin.re * bin.re + bin.im * bin.im);
        }
        if i % 22 == 21 {
            thread::sleep(Duration::from_millis(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dop_bins_grid_matches_spec_scenario() {
        let t = 1e-3;
        let bins = dop_bins(t, 0.0, 5000.0);
        assert_eq!(bins.len(), 21);
        assert!((bins[0] - (-5000.0)).abs() < 1e-3);
        assert!((bins[1] - (-4500.0)).abs() < 1e-3);
        assert!((bins[20] - 5000.0).abs() < 1e-3);
    }

    #[test]
    fn dop_bins_strictly_increasing() {
        let bins = dop_bins(1e-3, 100.0, 2000.0);
        for w in bins.windows(2) {
            assert!(w[1] > w[0]);
        }
    }

    #[test]
    fn power_grid_entries_are_non_negative_and_accumulate() {
        let mut grid = PowerGrid::zeros(2, 3);
        grid.add(0, 0, 1.5);
        grid.add(0, 0, 2.5);
        assert_eq!(grid.get(0, 0), 4.0);
        assert!(grid.get(1, 2) >= 0.0);
    }
}
