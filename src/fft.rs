//! FFT plan cache and the frequency-domain correlator built on it.
//!
//! `rustfft` stands in for the external FFT facility spec.md §6 describes:
//! a single-precision complex-to-complex 1-D transform, forward and
//! inverse, re-entrant once a plan is built. There is no wisdom-file
//! concept in `rustfft`, so plan construction is always "cold" -- the
//! cache still exists to bound the number of distinct transform lengths
//! and to amortize planning cost across repeated `corr_fft` calls for the
//! same N.

use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use rustfft::{Fft, FftPlanner};

use crate::buffer::Buff;
use crate::error::{GnssCoreError, Result};
use crate::mixer::mix_carr;
use crate::types::{Cpx, Cpx16, CSCALE};

/// Maximum number of distinct transform lengths the cache will hold.
pub const MAX_PLANS: usize = 32;

type PlanPair = (Arc<dyn Fft<f32>>, Arc<dyn Fft<f32>>);

/// Bounded, mutex-serialized store of forward/inverse plan pairs keyed by
/// transform length. Entries are created on first request and never
/// evicted for the process lifetime; after retrieval, plan execution is
/// lock-free provided each execution supplies its own input/output
/// buffers (the rustfft re-entrancy contract).
pub struct PlanCache {
    slots: Mutex<Vec<(usize, PlanPair)>>,
}

impl PlanCache {
    fn new() -> Self {
        Self {
            slots: Mutex::new(Vec::with_capacity(MAX_PLANS)),
        }
    }

    /// Returns the (forward, inverse) plan pair for transform length `n`,
    /// constructing and memoizing it on first request. Fails with
    /// `PlanCacheFull` once `MAX_PLANS` distinct lengths are cached and a
    /// new length is requested.
    pub fn get(&self, n: usize) -> Result<PlanPair> {
        let mut slots = self.slots.lock().unwrap();
        if let Some((_, pair)) = slots.iter().find(|(len, _)| *len == n) {
            return Ok(pair.clone());
        }
        if slots.len() >= MAX_PLANS {
            return Err(GnssCoreError::PlanCacheFull(slots.len()));
        }
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(n);
        let inverse = planner.plan_fft_inverse(n);
        slots.push((n, (forward.clone(), inverse.clone())));
        Ok((forward, inverse))
    }
}

static PLAN_CACHE: Lazy<PlanCache> = Lazy::new(PlanCache::new);

/// Transforms a window of mixed samples to DFT of the code, elementwise
/// complex-multiplies by a precomputed code spectrum, and inverse-
/// transforms, yielding the same per-sample average-correlation magnitude
/// scaling as `corr_std`.
///
/// If the plan cache is full for an unrequested transform length, this is
/// a no-op: `out` is left unmodified and the condition is logged, per
/// spec.md §7's soft-degradation policy for `ResourceExhausted`.
pub fn corr_fft(iq: &[Cpx16], code_fft: &[Cpx], out: &mut [Cpx]) {
    let n = iq.len();
    assert_eq!(code_fft.len(), n, "corr_fft: code spectrum length mismatch");
    assert_eq!(out.len(), n, "corr_fft: output length mismatch");

    let (forward, inverse) = match PLAN_CACHE.get(n) {
        Ok(pair) => pair,
        Err(err) => {
            log::error!("{err}; corr_fft is a no-op for N={n}");
            return;
        }
    };

    let mut buf: Vec<Cpx> = iq
        .iter()
        .map(|s| Cpx::new(s.i as f32 / CSCALE, s.q as f32 / CSCALE))
        .collect();
    forward.process(&mut buf);

    let scale = 1.0 / (n as f32 * n as f32);
    for (sample, code_bin) in buf.iter_mut().zip(code_fft.iter()) {
        *sample = *sample * *code_bin * scale;
    }
    inverse.process(&mut buf);

    out.copy_from_slice(&buf);
}

/// Mixes a buffer window down to baseband and runs the FFT correlator
/// against it, mirroring `sdr_corr_std`'s composition of mixer and
/// correlator for the frequency-domain path.
pub fn sdr_corr_fft(
    buff: &Buff,
    ix: usize,
    n: usize,
    fs: f64,
    fc: f64,
    phi: f64,
    code_fft: &[Cpx],
    out: &mut [Cpx],
) {
    let mut iq = vec![Cpx16::default(); n];
    mix_carr(buff, ix, n, fs, fc, phi, &mut iq);
    corr_fft(&iq, code_fft, out);
}

/// Computes the conjugated, zero-padded DFT of a ternary code replica,
/// using the same plan cache `corr_fft` draws from. The conjugation turns
/// `corr_fft`'s plain elementwise multiply into a circular *correlation*
/// rather than a circular convolution -- without it the recovered code
/// offset comes back as `N - offset` instead of `offset`.
pub fn code_spectrum(code: &[Cpx16], n: usize) -> Result<Vec<Cpx>> {
    assert!(code.len() <= n, "code_spectrum: code longer than transform length");
    let (forward, _) = PLAN_CACHE.get(n)?;
    let mut buf: Vec<Cpx> = code.iter().map(|c| Cpx::new(c.i as f32, c.q as f32)).collect();
    buf.resize(n, Cpx::default());
    forward.process(&mut buf);
    for bin in buf.iter_mut() {
        *bin = bin.conj();
    }
    Ok(buf)
}
