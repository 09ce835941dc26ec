//! Time-domain correlation: the dot-product kernel and the standard
//! (multi-tap) correlator built on it.

use crate::buffer::Buff;
use crate::mixer::mix_carr;
use crate::types::{Cpx, Cpx16, CSCALE};

/// Complex inner product of a mixed-sample window with a ternary code
/// replica, scaled by `scale / CSCALE`. Real and imaginary channels are
/// accumulated independently (I*I and Q*Q only) -- valid because the code
/// is real-valued, so the cross terms are zero.
///
/// Because `code[i].i, code[i].q` are drawn from `{-1, 0, 1}`, each term is
/// a conditional negate; this reference accumulates in `i64` to stay exact
/// regardless of window length, mirroring the periodic 16-bit-lane flush
/// the vectorized kernel uses to avoid overflow.
pub fn dot(iq: &[Cpx16], code: &[Cpx16], scale: f32) -> Cpx {
    assert_eq!(iq.len(), code.len(), "dot: window/code length mismatch");

    let mut sum_i: i64 = 0;
    let mut sum_q: i64 = 0;
    for (a, b) in iq.iter().zip(code.iter()) {
        sum_i += i64::from(a.i) * i64::from(b.i);
        sum_q += i64::from(a.q) * i64::from(b.q);
    }
    let k = scale / CSCALE;
    Cpx::new(sum_i as f32 * k, sum_q as f32 * k)
}

/// Evaluates the dot-product kernel at multiple code-offset taps. For
/// `pos[i] > 0` correlates `iq[pos..]` against `code[..n-pos]`; for
/// `pos[i] < 0` correlates `iq[..n+pos]` against `code[-pos..]`; for
/// `pos[i] == 0` correlates the full length. Each tap is scaled by the
/// reciprocal of its overlap length.
pub fn corr_std(iq: &[Cpx16], code: &[Cpx16], pos: &[i32], out: &mut [Cpx]) {
    let n = iq.len() as i32;
    assert_eq!(code.len() as i32, n, "corr_std: code length must equal N");
    assert_eq!(pos.len(), out.len());

    for (&p, slot) in pos.iter().zip(out.iter_mut()) {
        assert!(p.abs() < n, "corr_std: tap out of range");
        *slot = if p > 0 {
            let m = (n - p) as usize;
            dot(&iq[p as usize..], &code[..m], 1.0 / m as f32)
        } else if p < 0 {
            let m = (n + p) as usize;
            dot(&iq[..m], &code[(-p) as usize..], 1.0 / m as f32)
        } else {
            dot(iq, code, 1.0 / n as f32)
        };
    }
}

/// Mixes a buffer window down to baseband and runs the standard correlator
/// against it. The mixed-sample scratch is allocated here and lives only
/// for the call.
pub fn sdr_corr_std(
    buff: &Buff,
    ix: usize,
    n: usize,
    fs: f64,
    fc: f64,
    phi: f64,
    code: &[Cpx16],
    pos: &[i32],
    out: &mut [Cpx],
) {
    let mut iq = vec![Cpx16::default(); n];
    mix_carr(buff, ix, n, fs, fc, phi, &mut iq);
    corr_std(&iq, code, pos, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn self_code(n: usize) -> Vec<Cpx16> {
        (0..n)
            .map(|i| {
                let chip = if i % 2 == 0 { 1 } else { -1 };
                Cpx16::new(chip, 0)
            })
            .collect()
    }

    #[test]
    fn self_correlation_peaks_near_one() {
        let n = 1023usize;
        let code = self_code(n);
        // IQ == code * CSCALE reproduces the self-correlation sanity check
        // from spec.md: corr_std at pos=0 should return close to (1, 0).
        let iq: Vec<Cpx16> = code
            .iter()
            .map(|c| Cpx16::new(c.i * CSCALE as i16, c.q * CSCALE as i16))
            .collect();

        let mut out = vec![Cpx::default(); 1];
        corr_std(&iq, &code, &[0], &mut out);
        assert!((out[0].re - 1.0).abs() < 1e-3, "re={}", out[0].re);
        assert!(out[0].im.abs() < 1e-3, "im={}", out[0].im);
    }

    #[test]
    fn taps_use_the_correct_overlap_scale() {
        let n = 8usize;
        let code: Vec<Cpx16> = (0..n).map(|i| Cpx16::new(if i % 2 == 0 { 1 } else { -1 }, 0)).collect();
        let iq = code.clone();

        let mut out = vec![Cpx::default(); 3];
        corr_std(&iq, &code, &[0, 2, -2], &mut out);

        // pos = 0: full overlap, perfect match -> magnitude CSCALE/CSCALE-normalized to 1
        assert!((out[0].re - 1.0).abs() < 1e-5);
    }

    #[test]
    #[should_panic]
    fn tap_out_of_range_panics() {
        let n = 4usize;
        let iq = vec![Cpx16::default(); n];
        let code = vec![Cpx16::default(); n];
        let mut out = vec![Cpx::default(); 1];
        corr_std(&iq, &code, &[4], &mut out);
    }
}
