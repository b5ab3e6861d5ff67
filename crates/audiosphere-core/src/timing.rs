use crate::constants::MAX_FRAME_DT_SEC;

/// Bound a frame step after a stall; NaN and negative steps become zero.
#[inline]
pub fn clamp_frame_dt(dt: f32) -> f32 {
    if dt.is_nan() {
        return 0.0;
    }
    dt.clamp(0.0, MAX_FRAME_DT_SEC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dt_is_sanitized() {
        assert_eq!(clamp_frame_dt(f32::NAN), 0.0);
        assert_eq!(clamp_frame_dt(-1.0), 0.0);
        assert_eq!(clamp_frame_dt(3.0), MAX_FRAME_DT_SEC);
        assert_eq!(clamp_frame_dt(f32::INFINITY), MAX_FRAME_DT_SEC);
        assert_eq!(clamp_frame_dt(0.016), 0.016);
    }
}
