use anyhow::Result;

pub fn check_detection(confidence_threshold: f32, max_dimension: u32) -> Result<()> {
    anyhow::ensure!(
        (0.0..1.0).contains(&confidence_threshold),
        "detection.confidence_threshold should be 0..1 (got {})",
        confidence_threshold
    );
    anyhow::ensure!(max_dimension >= 32, "detection.max_dimension too small");
    Ok(())
}

pub fn check_crop(padding: f64) -> Result<()> {
    anyhow::ensure!(padding.is_finite() && padding >= 0.0, "crop.padding must be >= 0");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass() {
        check_detection(0.4, 640).unwrap();
        check_crop(10.0).unwrap();
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(check_detection(1.0, 640).is_err());
        assert!(check_detection(-0.1, 640).is_err());
        assert!(check_detection(0.4, 16).is_err());
        assert!(check_crop(-1.0).is_err());
        assert!(check_crop(f64::NAN).is_err());
    }
}
