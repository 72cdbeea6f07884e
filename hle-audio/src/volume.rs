//! Fixed-point volume scaling
//!
//! `adjust_volume(sample, vol)` computes `clamp16((sample * vol) >> 16)`.
//! Channel volumes are stored with unity at `0x8000` and doubled by the caller
//! before scaling, so unity gain reaches this function as `1 << 16`.
//!
//! On ARMv6+ the same result comes from a single `smulwb` + `ssat` pair; the
//! portable version is the reference both are tested against.

/// Gain value (after doubling) that leaves samples unchanged
pub const UNITY_GAIN: i32 = 1 << 16;

/// Saturate a wide accumulator to the signed 16-bit range
#[inline]
pub fn clamp_s16(value: i32) -> i16 {
    value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// Reference implementation of the volume primitive
///
/// Valid for any `vol` in `0..=0x1FFFE` (a doubled 16-bit channel volume).
#[inline]
pub fn adjust_volume_portable(sample: i16, vol: i32) -> i16 {
    let scaled = (i64::from(sample) * i64::from(vol)) >> 16;
    scaled.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
}

#[cfg(all(target_arch = "arm", target_feature = "v6"))]
mod arm {
    /// `smulwb` takes the top 32 bits of the 48-bit product of a word and a
    /// signed halfword, `ssat` saturates to 16 bits.
    #[inline]
    pub fn adjust_volume_dsp(sample: i16, vol: i32) -> i16 {
        let result: i32;
        // SAFETY: register-only arithmetic, no memory or stack access.
        unsafe {
            core::arch::asm!(
                "smulwb {r}, {vol}, {s}",
                "ssat {r}, #16, {r}",
                r = out(reg) result,
                vol = in(reg) vol,
                s = in(reg) i32::from(sample),
                options(pure, nomem, nostack),
            );
        }
        result as i16
    }
}

/// Scale a sample by a doubled channel volume with 16-bit saturation
#[inline]
pub fn adjust_volume(sample: i16, vol: i32) -> i16 {
    #[cfg(all(target_arch = "arm", target_feature = "v6"))]
    {
        arm::adjust_volume_dsp(sample, vol)
    }
    #[cfg(not(all(target_arch = "arm", target_feature = "v6")))]
    {
        adjust_volume_portable(sample, vol)
    }
}
